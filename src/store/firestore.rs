//! Cloud Firestore client speaking the REST API.
//!
//! Only document creation is used: each call POSTs to
//! `/v1/projects/{project}/databases/(default)/documents/{collection}` and
//! lets Firestore assign the document id.

use chrono::SecondsFormat;
use reqwest::{Client, Url};
use serde_json::{json, Map};

use super::{Document, DocumentStore, Value};
use crate::config::FirestoreSettings;
use crate::error::WriteError;

pub const DEFAULT_BASE_URL: &str = "https://firestore.googleapis.com";

pub struct FirestoreStore {
    client: Client,
    settings: FirestoreSettings,
}

impl FirestoreStore {
    pub fn new(client: Client, settings: FirestoreSettings) -> Self {
        Self { client, settings }
    }

    fn documents_url(&self, collection: &str) -> Result<Url, WriteError> {
        let mut url = Url::parse(&self.settings.base_url)
            .map_err(|e| WriteError::Endpoint(format!("{}: {}", self.settings.base_url, e)))?;
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|_| WriteError::Endpoint(self.settings.base_url.clone()))?;
            segments.pop_if_empty().extend([
                "v1",
                "projects",
                self.settings.project_id.as_str(),
                "databases",
                "(default)",
                "documents",
                collection,
            ]);
        }
        if let Some(key) = &self.settings.api_key {
            url.query_pairs_mut().append_pair("key", key);
        }
        Ok(url)
    }
}

#[async_trait::async_trait]
impl DocumentStore for FirestoreStore {
    async fn append(&self, collection: &str, document: Document) -> Result<(), WriteError> {
        let url = self.documents_url(collection)?;
        let body = json!({ "fields": encode_fields(&document) });

        let mut request = self.client.post(url).json(&body);
        if let Some(token) = &self.settings.auth_token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(WriteError::Rejected {
                collection: collection.to_string(),
                status: status.as_u16(),
                body,
            });
        }

        log::debug!("stored document in {}", collection);
        Ok(())
    }
}

fn encode_fields(document: &Document) -> serde_json::Value {
    let fields: Map<String, serde_json::Value> = document
        .iter()
        .map(|(name, value)| (name.clone(), encode_value(value)))
        .collect();
    serde_json::Value::Object(fields)
}

/// Firestore wraps every value in an object naming its type.
pub fn encode_value(value: &Value) -> serde_json::Value {
    match value {
        Value::Null => json!({ "nullValue": null }),
        Value::Bool(b) => json!({ "booleanValue": b }),
        // int64 travels as a decimal string
        Value::Integer(i) => json!({ "integerValue": i.to_string() }),
        Value::String(s) => json!({ "stringValue": s }),
        Value::Timestamp(ts) => {
            json!({ "timestampValue": ts.to_rfc3339_opts(SecondsFormat::Micros, true) })
        }
        Value::Array(values) => {
            let values: Vec<_> = values.iter().map(encode_value).collect();
            json!({ "arrayValue": { "values": values } })
        }
        Value::Map(document) => json!({ "mapValue": { "fields": encode_fields(document) } }),
    }
}
