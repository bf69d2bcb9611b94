use std::collections::HashMap;

use log::info;
use reqwest::Client;

use crate::error::LoadError;

/// One dataset row, keyed by column header.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawRecord(HashMap<String, String>);

impl RawRecord {
    pub fn get(&self, column: &str) -> Option<&str> {
        self.0.get(column).map(String::as_str)
    }
}

impl FromIterator<(String, String)> for RawRecord {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

pub struct DatasetLoader {
    client: Client,
}

impl DatasetLoader {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Loads a dataset from an `http(s)://` URL or a local path.
    pub async fn load(&self, source: &str) -> Result<Vec<RawRecord>, LoadError> {
        let data = if source.starts_with("http://") || source.starts_with("https://") {
            self.fetch(source).await?
        } else {
            tokio::fs::read(source).await.map_err(|error| LoadError::Io {
                path: source.to_string(),
                error,
            })?
        };

        let records = parse_records(&data)?;
        info!("loaded {} rows from {}", records.len(), source);
        Ok(records)
    }

    async fn fetch(&self, url: &str) -> Result<Vec<u8>, LoadError> {
        let fetch_error = |error: reqwest::Error| LoadError::Fetch {
            url: url.to_string(),
            error,
        };

        let response = self.client.get(url).send().await.map_err(fetch_error)?;
        let status = response.status();
        if !status.is_success() {
            return Err(LoadError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response.bytes().await.map_err(fetch_error)?;
        Ok(body.to_vec())
    }
}

/// Parses CSV with a header row. Short rows simply lack their trailing columns.
pub fn parse_records(data: &[u8]) -> Result<Vec<RawRecord>, LoadError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(data);
    let headers = reader.headers()?.clone();

    let mut records = Vec::new();
    for row in reader.records() {
        let row = row?;
        records.push(
            headers
                .iter()
                .zip(row.iter())
                .map(|(column, value)| (column.to_string(), value.to_string()))
                .collect(),
        );
    }
    Ok(records)
}
