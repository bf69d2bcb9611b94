//! Study configuration: everything that differs between deployed variants
//! of the survey (sentiment, sarcasm, stance, ...).

pub mod presets;

use std::collections::BTreeMap;

use rand::seq::SliceRandom;
use rand::Rng;

use crate::error::ConfigError;
use crate::survey::dataset::RawRecord;
use crate::survey::onboarding::AnswerKey;
use crate::survey::sequence::SequenceBuilder;
use crate::survey::{ChoiceOption, QuestionItem};

pub const DEFAULT_BUNDLE_COLLECTION: &str = "surveys";

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct StudyConfig {
    pub name: String,
    /// Prefix of every per-participant collection, e.g. `Full-SIMS-ch`.
    pub tag: String,
    /// URL or path of the CSV dataset.
    pub dataset: String,
    #[serde(default)]
    pub locale: Locale,
    #[serde(default)]
    pub columns: DatasetColumns,
    /// Prompt shown for every dataset row; `{source}` and `{label}` are substituted.
    pub prompt_template: String,
    pub attention_checks: Vec<AttentionCheck>,
    pub attention_options: Vec<ChoiceOption>,
    pub choices: ChoiceSet,
    /// Per-participant collection name; `{tag}`, `{set}` and `{participant}` are substituted.
    pub collection_template: String,
    #[serde(default = "default_bundle_collection")]
    pub bundle_collection: String,
    pub instructions: Instructions,
    pub quiz: Vec<QuizQuestion>,
    pub quiz_options: Vec<ChoiceOption>,
    #[serde(default = "default_true")]
    pub collect_race_ethnicity: bool,
}

fn default_bundle_collection() -> String {
    DEFAULT_BUNDLE_COLLECTION.to_string()
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    #[default]
    En,
    Zh,
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct DatasetColumns {
    pub source: String,
    pub conversation: String,
    pub label: String,
    pub note: String,
}

impl Default for DatasetColumns {
    fn default() -> Self {
        Self {
            source: "original_data".to_string(),
            conversation: "conversation".to_string(),
            label: "label_type".to_string(),
            note: "note".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct AttentionCheck {
    pub prompt: String,
    pub statement: String,
    #[serde(default)]
    pub note: String,
    /// Recorded value of the expected answer.
    pub correct_answer: String,
}

impl AttentionCheck {
    pub fn to_item(&self) -> QuestionItem {
        QuestionItem::attention_check(
            self.prompt.clone(),
            self.statement.clone(),
            self.note.clone(),
            self.correct_answer.clone(),
        )
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChoiceOrder {
    /// Options appear in the configured order, used to counterbalance
    /// presentation order across dataset sets.
    #[default]
    Fixed,
    /// Options are shuffled for every item.
    Shuffled,
}

/// Answer options for dataset items.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ChoiceSet {
    pub options: Vec<ChoiceOption>,
    /// Dataset file name to option order, overriding `options`.
    #[serde(default)]
    pub per_dataset: BTreeMap<String, Vec<ChoiceOption>>,
    #[serde(default)]
    pub order: ChoiceOrder,
}

impl ChoiceSet {
    pub fn for_dataset(&self, dataset: &str) -> &[ChoiceOption] {
        self.per_dataset
            .get(dataset)
            .map_or(self.options.as_slice(), Vec::as_slice)
    }

    pub fn present<R: Rng + ?Sized>(&self, dataset: &str, rng: &mut R) -> Vec<ChoiceOption> {
        let mut options = self.for_dataset(dataset).to_vec();
        if self.order == ChoiceOrder::Shuffled {
            options.shuffle(rng);
        }
        options
    }
}

/// Text of the onboarding pages.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Instructions {
    pub consent: String,
    pub participant_id: String,
    pub introduction: String,
    pub choices: String,
    pub quiz_intro: String,
    pub quiz_error: String,
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct QuizQuestion {
    pub text: String,
    /// Value of the correct `quiz_options` entry.
    pub correct: String,
}

impl StudyConfig {
    pub fn from_json_file(path: &str) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|error| ConfigError::StudyFile {
            path: path.to_string(),
            error,
        })?;
        Ok(serde_json::from_str(&raw)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.collection_template.contains("{set}") && self.set_number().is_none() {
            return Err(ConfigError::MissingSetNumber {
                template: self.collection_template.clone(),
                dataset: self.dataset.clone(),
            });
        }
        if self.choices.for_dataset(self.dataset_name()).is_empty() {
            return Err(ConfigError::NoChoices(self.dataset.clone()));
        }
        Ok(())
    }

    /// File name of the dataset, e.g. `set_3.csv` for `data/set_3.csv`.
    pub fn dataset_name(&self) -> &str {
        dataset_name(&self.dataset)
    }

    pub fn set_number(&self) -> Option<&str> {
        set_number(self.dataset_name())
    }

    pub fn collection_name(&self, participant_id: &str) -> String {
        collection_name(
            &self.collection_template,
            &self.tag,
            self.set_number().unwrap_or_default(),
            participant_id,
        )
    }

    pub fn answer_key(&self) -> AnswerKey {
        AnswerKey::new(self.quiz.iter().map(|q| q.correct.clone()).collect())
    }

    pub fn attention_items(&self) -> Vec<QuestionItem> {
        self.attention_checks.iter().map(AttentionCheck::to_item).collect()
    }

    pub fn build_sequence<R: Rng + ?Sized>(
        &self,
        records: &[RawRecord],
        rng: &mut R,
    ) -> Vec<QuestionItem> {
        SequenceBuilder::new(&self.prompt_template, &self.columns).build(
            records,
            &self.attention_items(),
            rng,
        )
    }

    /// Options offered for `item`, in presentation order.
    pub fn options_for<R: Rng + ?Sized>(
        &self,
        item: &QuestionItem,
        rng: &mut R,
    ) -> Vec<ChoiceOption> {
        if item.is_attention_check {
            self.attention_options.clone()
        } else {
            self.choices.present(self.dataset_name(), rng)
        }
    }

    /// Finds the option whose label the participant pressed.
    pub fn option_for_label(&self, item: &QuestionItem, label: &str) -> Option<&ChoiceOption> {
        let options = if item.is_attention_check {
            self.attention_options.as_slice()
        } else {
            self.choices.for_dataset(self.dataset_name())
        };
        let label = label.trim();
        options.iter().find(|option| option.label == label)
    }
}

/// File name of a dataset path or URL, ignoring any query or fragment.
pub fn dataset_name(source: &str) -> &str {
    let path = source.split(['?', '#']).next().unwrap_or(source);
    path.rsplit('/').next().unwrap_or(path)
}

/// `set_3.csv` -> `3`
pub fn set_number(dataset_name: &str) -> Option<&str> {
    let number = dataset_name.strip_prefix("set_")?.strip_suffix(".csv")?;
    if !number.is_empty() && number.bytes().all(|b| b.is_ascii_digit()) {
        Some(number)
    } else {
        None
    }
}

pub fn collection_name(template: &str, tag: &str, set: &str, participant_id: &str) -> String {
    template
        .replace("{tag}", tag)
        .replace("{set}", set)
        .replace("{participant}", participant_id)
}
