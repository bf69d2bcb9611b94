//! Runtime configuration read from the environment (and `.env`).

use log::{info, warn};

use crate::error::ConfigError;
use crate::store::firestore::DEFAULT_BASE_URL;
use crate::study::{presets, StudyConfig};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FirestoreSettings {
    pub project_id: String,
    pub api_key: Option<String>,
    pub auth_token: Option<String>,
    pub base_url: String,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub telegram_token: String,
    pub study: StudyConfig,
    /// `None` runs the survey against an in-memory store.
    pub firestore: Option<FirestoreSettings>,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds the configuration from `lookup`; empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| {
            lookup(name)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let telegram_token = var("TELOXIDE_TOKEN").ok_or(ConfigError::MissingVar("TELOXIDE_TOKEN"))?;

        let mut study = match var("SURVEY_STUDY_FILE") {
            Some(path) => {
                info!("Loading study from {}", path);
                StudyConfig::from_json_file(&path)?
            }
            None => {
                let name = var("SURVEY_STUDY").unwrap_or_else(|| presets::DEFAULT_STUDY.to_string());
                presets::by_name(&name).ok_or_else(|| {
                    warn!("available studies: {}", presets::NAMES.join(", "));
                    ConfigError::UnknownStudy(name.clone())
                })?
            }
        };
        if let Some(dataset) = var("SURVEY_DATASET") {
            study.dataset = dataset;
        }
        study.validate()?;

        let firestore = match var("FIRESTORE_PROJECT_ID") {
            Some(project_id) => Some(FirestoreSettings {
                project_id,
                api_key: var("FIRESTORE_API_KEY"),
                auth_token: var("FIRESTORE_AUTH_TOKEN"),
                base_url: var("FIRESTORE_BASE_URL").unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            }),
            None => {
                warn!("FIRESTORE_PROJECT_ID is not set, responses will only be kept in memory");
                None
            }
        };

        Ok(Self {
            telegram_token,
            study,
            firestore,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> Result<AppConfig, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn token_is_required() {
        assert!(matches!(
            config(&[]),
            Err(ConfigError::MissingVar("TELOXIDE_TOKEN"))
        ));
        assert!(matches!(
            config(&[("TELOXIDE_TOKEN", "  ")]),
            Err(ConfigError::MissingVar("TELOXIDE_TOKEN"))
        ));
    }

    #[test]
    fn defaults_to_sentiment_study_without_firestore() {
        let config = config(&[("TELOXIDE_TOKEN", "123:abc")]).unwrap();
        assert_eq!(config.telegram_token, "123:abc");
        assert_eq!(config.study.name, presets::DEFAULT_STUDY);
        assert_eq!(config.firestore, None);
    }

    #[test]
    fn preset_and_dataset_can_be_chosen() {
        let config = config(&[
            ("TELOXIDE_TOKEN", "t"),
            ("SURVEY_STUDY", "sims-ch"),
            ("SURVEY_DATASET", "https://example.org/set_3.csv"),
        ])
        .unwrap();
        assert_eq!(config.study.tag, "Full-SIMS-ch");
        assert_eq!(config.study.collection_name("P123"), "Full-SIMS-ch-3-P123");
    }

    #[test]
    fn unknown_preset_is_rejected() {
        assert!(matches!(
            config(&[("TELOXIDE_TOKEN", "t"), ("SURVEY_STUDY", "nope")]),
            Err(ConfigError::UnknownStudy(name)) if name == "nope"
        ));
    }

    #[test]
    fn dataset_override_is_validated() {
        assert!(matches!(
            config(&[
                ("TELOXIDE_TOKEN", "t"),
                ("SURVEY_DATASET", "data/interactive.csv"),
            ]),
            Err(ConfigError::MissingSetNumber { .. })
        ));
    }

    #[test]
    fn missing_study_file_is_reported() {
        assert!(matches!(
            config(&[
                ("TELOXIDE_TOKEN", "t"),
                ("SURVEY_STUDY_FILE", "/nonexistent/study.json"),
            ]),
            Err(ConfigError::StudyFile { .. })
        ));
    }

    #[test]
    fn study_file_overrides_preset() {
        let path = std::env::temp_dir().join(format!("survey-study-{}.json", std::process::id()));
        let study = presets::isarcasm();
        std::fs::write(&path, serde_json::to_string(&study).unwrap()).unwrap();

        let config = config(&[
            ("TELOXIDE_TOKEN", "t"),
            ("SURVEY_STUDY", "sims-ch"),
            ("SURVEY_STUDY_FILE", path.to_str().unwrap()),
        ])
        .unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(config.study.tag, study.tag);
    }

    #[test]
    fn firestore_settings_from_env() {
        let config = config(&[
            ("TELOXIDE_TOKEN", "t"),
            ("FIRESTORE_PROJECT_ID", "human-eval"),
            ("FIRESTORE_API_KEY", "k"),
            ("FIRESTORE_AUTH_TOKEN", ""),
        ])
        .unwrap();
        assert_eq!(
            config.firestore,
            Some(FirestoreSettings {
                project_id: "human-eval".to_string(),
                api_key: Some("k".to_string()),
                auth_token: None,
                base_url: DEFAULT_BASE_URL.to_string(),
            })
        );
    }
}
