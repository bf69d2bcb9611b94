//! Append-only document storage for survey results.

pub mod firestore;

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;

use crate::error::WriteError;

pub use firestore::FirestoreStore;

/// A stored document: field name to typed value.
pub type Document = BTreeMap<String, Value>;

#[derive(Debug, Clone, PartialEq, serde::Serialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Bool(bool),
    Integer(i64),
    String(String),
    Timestamp(DateTime<Utc>),
    Array(Vec<Value>),
    Map(Document),
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Integer(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(value: DateTime<Utc>) -> Self {
        Value::Timestamp(value)
    }
}

impl From<Document> for Value {
    fn from(value: Document) -> Self {
        Value::Map(value)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Value::Null, Into::into)
    }
}

pub trait ToDocument {
    fn to_document(&self) -> Document;
}

/// The only operation the survey needs from a database.
#[async_trait::async_trait]
pub trait DocumentStore: Send + Sync {
    async fn append(&self, collection: &str, document: Document) -> Result<(), WriteError>;
}

/// Keeps every appended document in memory. Used for dry runs without a database.
#[derive(Debug, Default)]
pub struct MemoryStore {
    documents: Mutex<Vec<(String, Document)>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    pub fn documents(&self) -> Vec<(String, Document)> {
        self.documents.lock().clone()
    }

    #[cfg(test)]
    pub fn collection(&self, name: &str) -> Vec<Document> {
        self.documents
            .lock()
            .iter()
            .filter(|(collection, _)| collection == name)
            .map(|(_, document)| document.clone())
            .collect()
    }
}

#[async_trait::async_trait]
impl DocumentStore for MemoryStore {
    async fn append(&self, collection: &str, document: Document) -> Result<(), WriteError> {
        log::debug!("appending document to {} (in memory)", collection);
        self.documents.lock().push((collection.to_string(), document));
        Ok(())
    }
}

#[cfg(test)]
pub(crate) struct FailingStore;

#[cfg(test)]
#[async_trait::async_trait]
impl DocumentStore for FailingStore {
    async fn append(&self, collection: &str, _document: Document) -> Result<(), WriteError> {
        Err(WriteError::Rejected {
            collection: collection.to_string(),
            status: 503,
            body: "unavailable".to_string(),
        })
    }
}
