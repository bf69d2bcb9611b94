use std::fmt;

use log::{debug, error, info};

use super::{Phase, QuestionItem, ResponseRecord};
use crate::error::SurveyError;
use crate::store::{DocumentStore, ToDocument};

/// One participant's pass through the questionnaire.
///
/// The session is built from the shuffled sequence while the participant is
/// still onboarding and starts accepting answers once `begin` is called.
#[derive(Debug, Clone)]
pub struct ParticipantSession {
    participant_id: String,
    collection: String,
    sequence: Vec<QuestionItem>,
    position: usize,
    phase: Phase,
    responses: Vec<ResponseRecord>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubmitOutcome {
    pub phase: Phase,
    /// False when the store rejected the write; the session advanced anyway.
    pub persisted: bool,
}

impl ParticipantSession {
    pub fn new(sequence: Vec<QuestionItem>) -> Self {
        Self {
            participant_id: String::new(),
            collection: String::new(),
            sequence,
            position: 0,
            phase: Phase::Onboarding,
            responses: Vec::new(),
        }
    }

    /// Leaves onboarding. An empty sequence goes straight to demographics.
    pub fn begin(&mut self, participant_id: String, collection: String) -> Result<Phase, SurveyError> {
        if self.phase != Phase::Onboarding {
            return Err(SurveyError::AlreadyStarted);
        }
        self.participant_id = participant_id;
        self.collection = collection;
        self.phase = if self.sequence.is_empty() {
            Phase::Demographics
        } else {
            Phase::Active
        };
        info!(
            "{}: questionnaire started with {} items, writing to {}",
            self.participant_id,
            self.sequence.len(),
            self.collection
        );
        Ok(self.phase)
    }

    pub fn participant_id(&self) -> &str {
        &self.participant_id
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    pub fn len(&self) -> usize {
        self.sequence.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sequence.is_empty()
    }

    pub fn position(&self) -> usize {
        self.position
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn responses(&self) -> &[ResponseRecord] {
        &self.responses
    }

    /// The item awaiting an answer while the questionnaire is active.
    pub fn current(&self) -> Option<&QuestionItem> {
        match self.phase {
            Phase::Active => self.sequence.get(self.position),
            _ => None,
        }
    }

    /// Records `value` for the current item and moves on.
    ///
    /// The response is appended to the participant's collection. A failed
    /// write is logged and does not hold the participant back.
    pub async fn submit_choice(
        &mut self,
        value: &str,
        store: &dyn DocumentStore,
    ) -> Result<SubmitOutcome, SurveyError> {
        let record = match self.current() {
            Some(item) => ResponseRecord::new(item, value),
            None => return Err(SurveyError::NotActive),
        };

        let persisted = match store.append(&self.collection, record.to_document()).await {
            Ok(()) => {
                debug!("{}: recorded \"{}\" for item {}", self.participant_id, value, self.position + 1);
                true
            }
            Err(err) => {
                error!(
                    "{}: failed to store response for item {}: {}",
                    self.participant_id,
                    self.position + 1,
                    err
                );
                false
            }
        };

        self.responses.push(record);
        self.position += 1;
        if self.position == self.sequence.len() {
            self.phase = Phase::Demographics;
            info!(
                "{} finished the questionnaire ({} items)",
                self.participant_id,
                self.sequence.len()
            );
        }

        Ok(SubmitOutcome {
            phase: self.phase,
            persisted,
        })
    }

    pub fn attention_summary(&self) -> AttentionSummary {
        let mut summary = AttentionSummary::default();
        for (item, response) in self.sequence.iter().zip(&self.responses) {
            if let Some(correct) = &item.correct_answer {
                summary.answered += 1;
                if &response.response == correct {
                    summary.passed += 1;
                }
            }
        }
        summary
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AttentionSummary {
    pub answered: usize,
    pub passed: usize,
}

impl fmt::Display for AttentionSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{} attention checks passed", self.passed, self.answered)
    }
}
