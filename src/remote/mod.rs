//! Clients for upstream HTTP APIs.
//!
//! Each upstream is a trait held behind `Arc<dyn _>` in application state,
//! so tests swap in recording mocks without touching the network.

pub mod graph;
pub mod openai;

pub use graph::{GraphApi, GraphClient};
pub use openai::{OpenAiApi, OpenAiClient};

use crate::error::{RemoteService, ServiceError};

/// Failure from a single upstream call, before it is classified against the
/// caller's intent. A 404 is an error to most callers but a signal to the
/// vector-store reconciler, so the distinction must survive the client layer.
#[derive(Debug, thiserror::Error)]
pub enum RemoteApiError {
    #[error("upstream returned {status}: {message}")]
    Status { status: u16, message: String },

    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
}

impl RemoteApiError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, RemoteApiError::Status { status: 404, .. })
    }

    /// Classify as a fatal service error attributed to `service`.
    pub fn into_service_error(self, service: RemoteService) -> ServiceError {
        match self {
            RemoteApiError::Status { status, message } => {
                ServiceError::remote(service, status, message)
            }
            RemoteApiError::Transport(e) => ServiceError::dependency(service, e.to_string()),
        }
    }
}

pub type RemoteResult<T> = Result<T, RemoteApiError>;

/// Pull a human-readable message out of an upstream error body, falling back
/// to the raw text. OpenAI nests it under `error.message`, Graph under
/// `error.message` as well.
pub(crate) fn extract_error_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| {
            v.get("error")
                .and_then(|e| e.get("message"))
                .and_then(|m| m.as_str())
                .map(|s| s.to_string())
        })
        .unwrap_or_else(|| {
            let trimmed = body.trim();
            if trimmed.is_empty() {
                "no error body".to_string()
            } else {
                trimmed.chars().take(500).collect()
            }
        })
}
