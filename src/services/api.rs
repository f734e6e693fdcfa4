// SPDX-License-Identifier: MIT

//! REST client for the learner and analytics backends.
//!
//! Handles:
//! - Learner record fetch/create/update
//! - Single and bulk activity-log uploads
//! - Assessment requests
//!
//! All methods surface failures as `ServiceError`; the orchestration layers
//! decide whether to retry later or give up for the session.

use reqwest::Url;
use serde::de::DeserializeOwned;
use serde::Serialize;
use uuid::Uuid;

use crate::config::Config;
use crate::error::{Result, ServiceError};
use crate::models::{ActivityLogEntry, Assessment, LearnerRecord};

/// Backend API client.
#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    learner_url: String,
    analytics_url: String,
}

impl ApiClient {
    pub fn new(config: &Config) -> Self {
        Self {
            http: reqwest::Client::new(),
            learner_url: config.learner_url(),
            analytics_url: config.analytics_url(),
        }
    }

    // ─── Learner Records ─────────────────────────────────────────

    /// Fetch the remote learner record by id.
    ///
    /// Any non-2xx response is reported as `NotFound` so the caller can fall
    /// back to creating the record.
    pub async fn get_learner(&self, id: Uuid) -> Result<LearnerRecord> {
        let url = self.parse_url(&format!("{}/{}", self.learner_url, id))?;

        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| ServiceError::RequestFailed(e.to_string()))?;

        if !response.status().is_success() {
            return Err(ServiceError::NotFound(format!(
                "learner {} (HTTP {})",
                id,
                response.status()
            )));
        }

        Self::decode_json(response).await
    }

    /// Create the remote learner record from the full local record.
    pub async fn create_learner(&self, record: &LearnerRecord) -> Result<LearnerRecord> {
        let url = self.parse_url(&self.learner_url)?;
        self.send_json(self.http.post(url), record).await
    }

    /// Push a full-record update.
    pub async fn update_learner(&self, record: &LearnerRecord) -> Result<LearnerRecord> {
        let url = self.parse_url(&self.learner_url)?;
        self.send_json(self.http.put(url), record).await
    }

    // ─── Activity Logs ───────────────────────────────────────────

    /// Upload a single ledger entry; the server echoes the accepted entry.
    pub async fn log_activity(&self, entry: &ActivityLogEntry) -> Result<ActivityLogEntry> {
        let url = self.parse_url(&self.analytics_url)?;
        self.send_json(self.http.post(url), entry).await
    }

    /// Upload a batch; the response lists the entries the server accepted.
    pub async fn bulk_log_activities(
        &self,
        entries: &[ActivityLogEntry],
    ) -> Result<Vec<ActivityLogEntry>> {
        let url = self.parse_url(&format!("{}/bulk", self.analytics_url))?;
        self.send_json(self.http.post(url), &entries).await
    }

    /// Submit shape/sound entries and get the computed assessment back.
    pub async fn fetch_assessment(&self, entries: &[ActivityLogEntry]) -> Result<Assessment> {
        let url = self.parse_url(&format!("{}/assessment", self.analytics_url))?;
        self.send_json(self.http.post(url), &entries).await
    }

    // ─── Helpers ─────────────────────────────────────────────────

    fn parse_url(&self, raw: &str) -> Result<Url> {
        Url::parse(raw).map_err(|e| ServiceError::UrlConstruction(format!("{}: {}", raw, e)))
    }

    /// Send a JSON body and decode a JSON response.
    async fn send_json<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
        body: &B,
    ) -> Result<T> {
        let payload = encode_body(body)?;
        let response = request
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(payload)
            .send()
            .await
            .map_err(|e| ServiceError::RequestFailed(e.to_string()))?;

        if !response.status().is_success() {
            return Err(ServiceError::RequestFailed(format!(
                "HTTP {}",
                response.status()
            )));
        }

        Self::decode_json(response).await
    }

    async fn decode_json<T: DeserializeOwned>(response: reqwest::Response) -> Result<T> {
        let body = response
            .text()
            .await
            .map_err(|_| ServiceError::ResponseInitialization)?;

        serde_json::from_str(&body).map_err(|e| {
            tracing::warn!(error = %e, body = %truncate(&body), "failed to decode response");
            ServiceError::Decoding(e.to_string())
        })
    }
}

fn encode_body<B: Serialize + ?Sized>(body: &B) -> Result<Vec<u8>> {
    serde_json::to_vec(body).map_err(ServiceError::Encoding)
}

/// Cap logged response bodies at 256 bytes.
fn truncate(body: &str) -> &str {
    if body.len() <= 256 {
        return body;
    }
    let mut end = 256;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    &body[..end]
}
