use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Speaker {
    A,
    B,
}

impl fmt::Display for Speaker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Speaker::A => write!(f, "A"),
            Speaker::B => write!(f, "B"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Turn {
    pub speaker: Speaker,
    pub content: String,
}

/// Splits a transcript into speaker turns.
///
/// A turn is a line starting with `A` or `B` followed by an ASCII `:` or a
/// full-width `：`. Every other line is dropped.
pub fn parse_conversation(transcript: &str) -> Vec<Turn> {
    transcript.lines().filter_map(parse_turn).collect()
}

fn parse_turn(line: &str) -> Option<Turn> {
    let line = line.trim();
    let (speaker, rest) = [(Speaker::A, "A"), (Speaker::B, "B")]
        .into_iter()
        .find_map(|(speaker, marker)| line.strip_prefix(marker).map(|rest| (speaker, rest)))?;
    let content = rest.strip_prefix(':').or_else(|| rest.strip_prefix('：'))?;

    Some(Turn {
        speaker,
        content: content.trim().to_string(),
    })
}
