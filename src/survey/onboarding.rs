//! Consent, participant id, instructions and the comprehension quiz.
//!
//! The flow is a linear wizard. Values entered on a page survive going back
//! and forth; only `next` is gated.

use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Page {
    Consent,
    ParticipantId,
    Introduction,
    Choices,
    ComprehensionQuiz,
}

impl Page {
    pub const ALL: [Page; 5] = [
        Page::Consent,
        Page::ParticipantId,
        Page::Introduction,
        Page::Choices,
        Page::ComprehensionQuiz,
    ];
}

/// Why `next` was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gate {
    ConsentRequired,
    ParticipantIdRequired,
    QuizIncomplete,
    QuizIncorrect,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    Moved(Page),
    Blocked(Gate),
    Completed { participant_id: String },
}

/// Correct quiz answers, one per question in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnswerKey(Vec<String>);

impl AnswerKey {
    pub fn new(answers: Vec<String>) -> Self {
        Self(answers)
    }

    pub fn check(&self, answers: &BTreeMap<usize, String>) -> Result<(), Gate> {
        if (0..self.0.len()).any(|question| !answers.contains_key(&question)) {
            return Err(Gate::QuizIncomplete);
        }
        let all_correct = self
            .0
            .iter()
            .enumerate()
            .all(|(question, correct)| answers.get(&question) == Some(correct));
        if all_correct {
            Ok(())
        } else {
            Err(Gate::QuizIncorrect)
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Onboarding {
    page: usize,
    consent: bool,
    participant_id: String,
    quiz_answers: BTreeMap<usize, String>,
    quiz_error: bool,
}

impl Onboarding {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn page(&self) -> Page {
        Page::ALL[self.page]
    }

    /// One-based page number and page count.
    pub fn progress(&self) -> (usize, usize) {
        (self.page + 1, Page::ALL.len())
    }

    pub fn consent(&self) -> bool {
        self.consent
    }

    pub fn set_consent(&mut self, consent: bool) {
        self.consent = consent;
    }

    pub fn participant_id(&self) -> &str {
        &self.participant_id
    }

    pub fn set_participant_id(&mut self, participant_id: &str) {
        self.participant_id = participant_id.trim().to_string();
    }

    pub fn quiz_answer(&self, question: usize) -> Option<&str> {
        self.quiz_answers.get(&question).map(String::as_str)
    }

    pub fn answer_quiz(&mut self, question: usize, value: impl Into<String>) {
        self.quiz_answers.insert(question, value.into());
    }

    pub fn shows_quiz_error(&self) -> bool {
        self.quiz_error
    }

    /// The gate blocking the current page, if any.
    pub fn gate(&self, key: &AnswerKey) -> Option<Gate> {
        match self.page() {
            Page::Consent if !self.consent => Some(Gate::ConsentRequired),
            Page::ParticipantId if self.participant_id.is_empty() => {
                Some(Gate::ParticipantIdRequired)
            }
            Page::ComprehensionQuiz => key.check(&self.quiz_answers).err(),
            _ => None,
        }
    }

    pub fn next(&mut self, key: &AnswerKey) -> Step {
        if let Some(gate) = self.gate(key) {
            if matches!(gate, Gate::QuizIncomplete | Gate::QuizIncorrect) {
                self.quiz_error = true;
            }
            return Step::Blocked(gate);
        }

        self.quiz_error = false;
        if self.page + 1 == Page::ALL.len() {
            return Step::Completed {
                participant_id: self.participant_id.clone(),
            };
        }
        self.page += 1;
        Step::Moved(self.page())
    }

    /// Goes back one page; `None` on the first page.
    pub fn prev(&mut self) -> Option<Page> {
        if self.page == 0 {
            return None;
        }
        self.page -= 1;
        Some(self.page())
    }
}
