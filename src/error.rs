// SPDX-License-Identifier: MIT

//! Service error types shared by the learner and activity subsystems.
//!
//! Every variant is recoverable: orchestration entry points (`reconcile`,
//! batch sync, fire-and-forget uploads) catch and log these instead of
//! propagating them further. Nothing here ever reaches the end user.

/// Error type for storage and remote-facing operations.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("input data is missing or invalid")]
    MissingInput,

    #[error("required token is missing")]
    MissingToken,

    #[error("failed to construct request URL: {0}")]
    UrlConstruction(String),

    #[error("failed to encode request body: {0}")]
    Encoding(#[source] serde_json::Error),

    #[error("failed to read the response")]
    ResponseInitialization,

    #[error("network request failed: {0}")]
    RequestFailed(String),

    #[error("failed to decode response body: {0}")]
    Decoding(String),

    #[error("remote record not found: {0}")]
    NotFound(String),

    #[error("internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

/// Result type alias for service operations.
pub type Result<T> = std::result::Result<T, ServiceError>;
