use thiserror::Error;

/// Failure to fetch or parse a study dataset.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to fetch dataset {url}: {error}")]
    Fetch {
        url: String,
        #[source]
        error: reqwest::Error,
    },

    #[error("dataset {url} returned HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("failed to read dataset {path}: {error}")]
    Io {
        path: String,
        #[source]
        error: std::io::Error,
    },

    #[error("failed to parse dataset: {0}")]
    Parse(#[from] csv::Error),
}

/// Failure to append a document to the store. Callers log it and move on.
#[derive(Debug, Error)]
pub enum WriteError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("document store rejected write to {collection} (HTTP {status}): {body}")]
    Rejected {
        collection: String,
        status: u16,
        body: String,
    },

    #[error("invalid document store endpoint: {0}")]
    Endpoint(String),
}

/// A form field the participant filled in wrongly.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FieldError {
    #[error("Please enter your age as a whole number.")]
    AgeNotANumber,

    #[error("Age must be between {min} and {max}.")]
    AgeOutOfRange { min: u8, max: u8 },

    #[error("\"{input}\" is not one of the {field} options, please use the buttons.")]
    UnknownOption { field: &'static str, input: String },

    #[error("{0} is required.")]
    Missing(&'static str),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} is not set")]
    MissingVar(&'static str),

    #[error("unknown study preset \"{0}\"")]
    UnknownStudy(String),

    #[error("failed to read study file {path}: {error}")]
    StudyFile {
        path: String,
        #[source]
        error: std::io::Error,
    },

    #[error("invalid study file: {0}")]
    StudyJson(#[from] serde_json::Error),

    #[error("collection template \"{template}\" needs a set number but dataset {dataset} has none")]
    MissingSetNumber { template: String, dataset: String },

    #[error("no choice options configured for dataset {0}")]
    NoChoices(String),
}

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum SurveyError {
    #[error("questionnaire is not accepting answers")]
    NotActive,

    #[error("questionnaire has already started")]
    AlreadyStarted,
}
