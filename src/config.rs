// SPDX-License-Identifier: MIT

//! Application configuration loaded from environment variables.
//!
//! The configuration is loaded once at startup and handed to `LearnerKit`;
//! nothing re-reads the environment after that.

use std::env;
use std::time::Duration;

/// Configuration for the learner and analytics backends.
#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the backend, e.g. `https://api.example.com`
    pub server_url: String,
    /// Learner collection name (app variant), path segment after `/learner/`
    pub learner_collection: String,
    /// Activity-log collection name, path segment after `/analytics/`
    pub activity_collection: String,
    /// App build version stamped onto new records and ledger entries
    pub build_version: Option<String>,
    /// Minimum interval between remote learner-update attempts
    pub update_cooldown: Duration,
    /// Hard cap on entries per bulk upload
    pub max_batch_size: usize,
    /// Default minimum batch size for opportunistic bulk uploads
    pub min_batch_size: usize,
}

impl Default for Config {
    /// Default config for testing only.
    fn default() -> Self {
        Self {
            server_url: "http://localhost:9".to_string(),
            learner_collection: "test_learners".to_string(),
            activity_collection: "test_activities".to_string(),
            build_version: Some("0".to_string()),
            update_cooldown: Duration::from_secs(60),
            max_batch_size: 500,
            min_batch_size: 100,
        }
        .normalized()
    }
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// `LEARNER_SERVER_URL` is required; everything else has a default.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        Ok(Self {
            server_url: env::var("LEARNER_SERVER_URL")
                .map_err(|_| ConfigError::Missing("LEARNER_SERVER_URL"))?,
            learner_collection: env::var("LEARNER_COLLECTION")
                .unwrap_or_else(|_| "learners".to_string()),
            activity_collection: env::var("ACTIVITY_COLLECTION")
                .unwrap_or_else(|_| "activity_logs".to_string()),
            build_version: env::var("APP_BUILD_VERSION").ok(),
            update_cooldown: Duration::from_secs(
                env::var("LEARNER_UPDATE_COOLDOWN_SECS")
                    .unwrap_or_else(|_| "60".to_string())
                    .parse()
                    .unwrap_or(60),
            ),
            max_batch_size: env::var("ACTIVITY_MAX_BATCH")
                .unwrap_or_else(|_| "500".to_string())
                .parse()
                .unwrap_or(500),
            min_batch_size: env::var("ACTIVITY_MIN_BATCH")
                .unwrap_or_else(|_| "100".to_string())
                .parse()
                .unwrap_or(100),
        }
        .normalized())
    }

    /// URL of the learner collection: `{base}/learner/{collection}`.
    pub fn learner_url(&self) -> String {
        format!("{}/learner/{}", self.server_url, self.learner_collection)
    }

    /// URL of the analytics collection: `{base}/analytics/{collection}`.
    pub fn analytics_url(&self) -> String {
        format!("{}/analytics/{}", self.server_url, self.activity_collection)
    }

    fn normalized(mut self) -> Self {
        while self.server_url.ends_with('/') {
            self.server_url.pop();
        }
        self
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),
}
