pub mod conversation;
pub mod dataset;
pub mod demographics;
pub mod onboarding;
pub mod sequence;
pub mod session;

use chrono::{DateTime, Utc};

use crate::store::{Document, ToDocument};

/// One item of the questionnaire, either built from a dataset row or an attention check.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct QuestionItem {
    pub prompt_text: String,
    pub statement_text: String,
    pub note: String,
    pub is_attention_check: bool,
    pub correct_answer: Option<String>,
}

impl QuestionItem {
    pub fn new(prompt_text: String, statement_text: String, note: String) -> Self {
        Self {
            prompt_text,
            statement_text,
            note,
            is_attention_check: false,
            correct_answer: None,
        }
    }

    pub fn attention_check(
        prompt_text: String,
        statement_text: String,
        note: String,
        correct_answer: String,
    ) -> Self {
        Self {
            prompt_text,
            statement_text,
            note,
            is_attention_check: true,
            correct_answer: Some(correct_answer),
        }
    }
}

/// A button shown to the participant: `label` is displayed, `value` is recorded.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ChoiceOption {
    pub label: String,
    pub value: String,
}

impl ChoiceOption {
    pub fn new(label: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            value: value.into(),
        }
    }
}

/// A single judgment, persisted as soon as it is made.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseRecord {
    pub question: String,
    pub statement: String,
    pub response: String,
    pub timestamp: DateTime<Utc>,
}

impl ResponseRecord {
    pub fn new(item: &QuestionItem, response: &str) -> Self {
        Self {
            question: item.prompt_text.clone(),
            statement: item.statement_text.clone(),
            response: response.to_string(),
            timestamp: Utc::now(),
        }
    }
}

impl ToDocument for ResponseRecord {
    fn to_document(&self) -> Document {
        let mut doc = Document::new();
        doc.insert("question".to_string(), self.question.as_str().into());
        doc.insert("statement".to_string(), self.statement.as_str().into());
        doc.insert("response".to_string(), self.response.as_str().into());
        doc.insert("timestamp".to_string(), self.timestamp.into());
        doc
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Onboarding,
    Active,
    Demographics,
}
