//! Shared error handling utilities.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;
use tracing::{error, warn};
use utoipa::ToSchema;

use crate::DbPool;

/// JSON error envelope returned on every failed request.
#[derive(Debug, Serialize, ToSchema)]
pub struct ApiError {
    pub error: String,
    pub code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ApiError {
    pub fn new(error: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            code: code.into(),
            details: None,
        }
    }
}

/// Which upstream service a remote failure came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoteService {
    OpenAi,
    Graph,
}

impl RemoteService {
    pub fn as_str(&self) -> &'static str {
        match self {
            RemoteService::OpenAi => "openai",
            RemoteService::Graph => "graph",
        }
    }
}

impl std::fmt::Display for RemoteService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Failure classes for the whole service. Handlers and core logic return
/// this; the `IntoResponse` impl maps each class to a status and envelope.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Resource missing or owned by a different tenant. The two cases are
    /// deliberately indistinguishable in the response.
    #[error("{0} not found")]
    NotFound(&'static str),

    /// An upstream API answered with a failure status.
    #[error("{service} request failed with status {status}: {message}")]
    RemoteApi {
        service: RemoteService,
        status: u16,
        message: String,
    },

    /// An upstream dependency could not be reached or a required side
    /// effect on it failed.
    #[error("{service} unavailable: {message}")]
    Dependency {
        service: RemoteService,
        message: String,
    },

    #[error("{0}")]
    Validation(String),

    #[error("unauthorized: {0}")]
    Unauthorized(&'static str),

    /// Request conflicts with current state (duplicate email, number
    /// already assigned, plan limit reached).
    #[error("{message}")]
    Conflict { code: &'static str, message: String },

    #[error("database error")]
    Database(#[from] diesel::result::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

impl ServiceError {
    pub fn remote(service: RemoteService, status: u16, message: impl Into<String>) -> Self {
        Self::RemoteApi {
            service,
            status,
            message: message.into(),
        }
    }

    pub fn dependency(service: RemoteService, message: impl Into<String>) -> Self {
        Self::Dependency {
            service,
            message: message.into(),
        }
    }

    pub fn conflict(code: &'static str, message: impl Into<String>) -> Self {
        Self::Conflict {
            code,
            message: message.into(),
        }
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            ServiceError::NotFound(what) => (
                StatusCode::NOT_FOUND,
                ApiError::new(format!("{what} not found"), "NOT_FOUND"),
            ),
            ServiceError::RemoteApi {
                service,
                status,
                message,
            } => {
                warn!(service = %service, status, %message, "Upstream API error");
                let mut body = ApiError::new(
                    format!("{service} request failed"),
                    "REMOTE_API_ERROR",
                );
                body.details = Some(serde_json::json!({
                    "service": service.as_str(),
                    "status": status,
                }));
                (StatusCode::BAD_GATEWAY, body)
            }
            ServiceError::Dependency { service, message } => {
                error!(service = %service, %message, "Upstream dependency failure");
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    ApiError::new(format!("{service} unavailable"), "DEPENDENCY_UNAVAILABLE"),
                )
            }
            ServiceError::Validation(message) => (
                StatusCode::BAD_REQUEST,
                ApiError::new(message, "VALIDATION_ERROR"),
            ),
            ServiceError::Unauthorized(message) => (
                StatusCode::UNAUTHORIZED,
                ApiError::new(message, "UNAUTHORIZED"),
            ),
            ServiceError::Conflict { code, message } => {
                (StatusCode::CONFLICT, ApiError::new(message, code))
            }
            ServiceError::Database(e) => {
                error!(error = %e, "Database error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ApiError::new("Database error", "DB_ERROR"),
                )
            }
            ServiceError::Internal(message) => {
                error!(%message, "Internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ApiError::new("Internal server error", "INTERNAL_ERROR"),
                )
            }
        };

        (status, Json(body)).into_response()
    }
}

pub type ApiResult<T> = Result<T, ServiceError>;

pub type DbConn =
    diesel::r2d2::PooledConnection<diesel::r2d2::ConnectionManager<diesel::PgConnection>>;

pub fn get_db_conn(pool: &DbPool) -> Result<DbConn, ServiceError> {
    pool.get().map_err(|e| {
        error!(error = %e, "Database connection error");
        ServiceError::Internal("database connection error".to_string())
    })
}
