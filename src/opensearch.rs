use crate::{record::LogRecord, store::{DocumentStore, StoreError}};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

/// OpenSearch store that writes each batch through the HTTP bulk API.
#[derive(Clone)]
pub struct OpenSearchStore {
    client: Client,
    /// Base URL of the OpenSearch cluster, e.g. "http://localhost:9200".
    base_url: String,
    /// Target index name.
    index: String,
}

impl OpenSearchStore {
    pub fn new(base_url: String, index: String) -> Self {
        OpenSearchStore {
            client: Client::new(),
            base_url,
            index,
        }
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/{}/_bulk",
            self.base_url.trim_end_matches('/'),
            urlencoding::encode(&self.index)
        )
    }

    /// Bulk body with one `index` action per record. The index lives in
    /// the URL so each action line is empty.
    fn bulk_body(records: &[LogRecord]) -> Result<String, StoreError> {
        let mut body = String::new();
        for record in records {
            body.push_str("{\"index\":{}}\n");
            body.push_str(&serde_json::to_string(record)?);
            body.push('\n');
        }
        Ok(body)
    }
}

#[derive(Deserialize)]
struct BulkResponse {
    errors: bool,
    #[serde(default)]
    items: Vec<serde_json::Value>,
}

#[async_trait]
impl DocumentStore for OpenSearchStore {
    async fn insert_many(&self, records: &[LogRecord]) -> Result<usize, StoreError> {
        let body = Self::bulk_body(records)?;

        let resp = self
            .client
            .post(self.endpoint())
            .header("Content-Type", "application/x-ndjson")
            .body(body)
            .send()
            .await
            .map_err(|e| StoreError::Connect(e.to_string()))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_else(|_| "<no body>".to_string());
            return Err(StoreError::Insert(format!(
                "OpenSearch bulk insert failed with status {}: {}",
                status, text
            )));
        }

        // A 200 can still carry per-item failures.
        let parsed: BulkResponse = resp
            .json()
            .await
            .map_err(|e| StoreError::Insert(format!("unreadable bulk response: {}", e)))?;
        if parsed.errors {
            return Err(StoreError::Rejected(format!(
                "OpenSearch reported item errors in a batch of {}",
                records.len()
            )));
        }
        Ok(parsed.items.len())
    }

    async fn ping(&self) -> Result<(), StoreError> {
        let resp = self
            .client
            .get(self.base_url.trim_end_matches('/'))
            .send()
            .await
            .map_err(|e| StoreError::Connect(e.to_string()))?;
        if resp.status().is_success() {
            Ok(())
        } else {
            Err(StoreError::Connect(format!(
                "OpenSearch ping failed with status {}",
                resp.status()
            )))
        }
    }

    fn describe(&self) -> String {
        format!("opensearch:{}/{}", self.base_url, self.index)
    }
}
