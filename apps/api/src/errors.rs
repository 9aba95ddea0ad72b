use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::agent_client::AgentError;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
///
/// Extraction gaps never show up here: the normalizer absorbs them.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    Validation(String),

    #[error("Upstream generation service returned {status}")]
    Upstream { status: u16, body: String },

    #[error("Could not reach the generation service: {0}")]
    Unreachable(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<AgentError> for AppError {
    fn from(err: AgentError) -> Self {
        match err {
            AgentError::Api { status, body } => AppError::Upstream { status, body },
            AgentError::Http(e) => AppError::Unreachable(e.to_string()),
        }
    }
}

/// The failure half of the `{ ok, ... }` envelope every endpoint answers with.
#[derive(Debug, Serialize)]
struct ErrorBody {
    ok: bool,
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error, details) = match &self {
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, msg.clone(), None),
            AppError::Upstream { status, body } => {
                tracing::error!("Upstream error (status {status}): {body}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    self.to_string(),
                    Some(body.clone()),
                )
            }
            AppError::Unreachable(msg) => {
                tracing::error!("Upstream unreachable: {msg}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Could not reach the generation service".to_string(),
                    Some(msg.clone()),
                )
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "An internal server error occurred".to_string(),
                    Some(e.to_string()),
                )
            }
        };

        let body = Json(ErrorBody {
            ok: false,
            error,
            details,
        });

        (status, body).into_response()
    }
}
