//! reqwest-backed collector client

use super::service::RemoteLogService;
use super::wire::{ApiReply, BatchRequest, BatchSummary};
use crate::error::{TrackerError, TrackerResult};
use crate::model::{LogRecord, NotebookInfo};
use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, warn};

/// JSON-over-HTTP client for the collector
#[derive(Debug, Clone)]
pub struct HttpLogService {
    http_client: Client,
    base_url: String,
}

impl HttpLogService {
    /// Create a client rooted at `base_url` (e.g. `http://localhost:8888/cb-server`)
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> TrackerResult<Self> {
        let http_client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| TrackerError::config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http_client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// Turn a collector response into its `data`, or the matching error
    async fn decode<T: DeserializeOwned>(response: Response) -> TrackerResult<Option<T>> {
        let status = response.status();
        let url = response.url().to_string();
        let body = response.text().await?;
        let reply = serde_json::from_str::<ApiReply<T>>(&body);

        if !status.is_success() {
            warn!(status = status.as_u16(), url = %url, "collector returned error status");
            return Err(match reply {
                Ok(reply) => reply.into_error(Some(status.as_u16())),
                Err(_) => TrackerError::rejected(Some(status.as_u16()), None, body_or_status(&body, status)),
            });
        }

        let reply = reply.map_err(|e| TrackerError::Transport {
            message: format!("Undecodable collector reply: {}", e),
            url: Some(url),
        })?;

        if !reply.success {
            return Err(reply.into_error(None));
        }
        Ok(reply.data)
    }
}

fn body_or_status(body: &str, status: reqwest::StatusCode) -> String {
    if body.trim().is_empty() {
        status.to_string()
    } else {
        body.trim().to_string()
    }
}

#[async_trait]
impl RemoteLogService for HttpLogService {
    async fn post_log(&self, record: &LogRecord) -> TrackerResult<()> {
        let url = self.endpoint("logs");
        debug!(kind = record.info.kind(), url = %url, "posting single log");

        let response = self.http_client.post(&url).json(record).send().await?;
        Self::decode::<Value>(response).await.map(|_| ())
    }

    async fn post_batch(&self, items: &[LogRecord]) -> TrackerResult<BatchSummary> {
        let url = self.endpoint("logs/batch");
        debug!(batch_size = items.len(), url = %url, "posting log batch");

        let response = self
            .http_client
            .post(&url)
            .json(&BatchRequest { items })
            .send()
            .await?;

        // Collectors that omit per-item detail accepted everything
        Ok(Self::decode::<BatchSummary>(response)
            .await?
            .unwrap_or_else(|| BatchSummary::all_ok(items.len())))
    }

    async fn create_notebook(&self, notebook: &NotebookInfo) -> TrackerResult<()> {
        let url = self.endpoint("notebooks");
        debug!(notebook_id = %notebook.notebook_id, url = %url, "creating notebook");

        let response = self.http_client.post(&url).json(notebook).send().await?;
        Self::decode::<Value>(response).await.map(|_| ())
    }

    async fn fetch_logs(&self, net_id: &str, course_id: &str) -> TrackerResult<Vec<LogRecord>> {
        let url = self.endpoint("logs");
        debug!(net_id, course_id, url = %url, "fetching logs");

        let response = self
            .http_client
            .get(&url)
            .query(&[("net_id", net_id), ("course_id", course_id)])
            .send()
            .await?;

        let raw: Vec<Value> = Self::decode(response).await?.unwrap_or_default();
        let total = raw.len();
        let records: Vec<LogRecord> = raw
            .into_iter()
            .filter_map(|value| match serde_json::from_value(value) {
                Ok(record) => Some(record),
                Err(e) => {
                    warn!(error = %e, "skipping unrecognised log record");
                    None
                }
            })
            .collect();

        debug!(fetched = records.len(), skipped = total - records.len(), "logs fetched");
        Ok(records)
    }
}
