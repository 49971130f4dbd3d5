//! Error types for bb-coach
//!
//! Two layers:
//! - `CoachError` / `AnalysisFailure`: domain errors raised by intake, the
//!   analysis pipeline and the store
//! - `ApiError`: HTTP mapping with a JSON `{ "error": { code, message } }` body

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::json;
use thiserror::Error;

/// Why a single vision call failed
///
/// Recorded inline on the step, aggregate or release section that issued the
/// call. Never retried automatically.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AnalysisFailure {
    /// Connection refused, DNS failure, timeout, TLS error
    #[error("Transport error: {message}")]
    Transport { message: String },

    /// Non-2xx status from the vision API
    #[error("Vision API returned HTTP {status}: {body}")]
    HttpStatus { status: u16, body: String },

    /// 2xx response without usable content
    #[error("Malformed response: {message}")]
    MalformedResponse { message: String },
}

impl AnalysisFailure {
    pub fn transport(message: impl Into<String>) -> Self {
        AnalysisFailure::Transport {
            message: message.into(),
        }
    }

    pub fn malformed(message: impl Into<String>) -> Self {
        AnalysisFailure::MalformedResponse {
            message: message.into(),
        }
    }

    /// Short machine-readable kind
    pub fn kind(&self) -> &'static str {
        match self {
            AnalysisFailure::Transport { .. } => "transport",
            AnalysisFailure::HttpStatus { .. } => "http_status",
            AnalysisFailure::MalformedResponse { .. } => "malformed_response",
        }
    }
}

/// Domain errors
#[derive(Debug, Error)]
pub enum CoachError {
    /// Uploaded file is not an image; the rest of a batch still imports
    #[error("{file_name} is not an image: {reason}")]
    InvalidMediaType { file_name: String, reason: String },

    /// No vision API key stored; no call was attempted
    #[error("No vision API key configured. Set one on the Settings page first.")]
    MissingCredential,

    /// Some steps in range have no image; no call was attempted
    #[error("Upload images for all steps before analyzing (missing steps: {})", format_steps(.missing))]
    IncompleteApproach { missing: Vec<usize> },

    /// A vision call failed
    #[error("Analysis failed: {0}")]
    AnalysisFailed(#[from] AnalysisFailure),

    /// A stored collection failed its shape check
    #[error("Stored value '{key}' is corrupted: {reason}")]
    InvalidPersistedState { key: String, reason: String },

    /// Request value out of its domain
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Unknown id or index
    #[error("Not found: {0}")]
    NotFound(String),

    /// Another run already owns the resource
    #[error("Busy: {0}")]
    Busy(String),

    /// bb-common error (database, config, io)
    #[error(transparent)]
    Common(#[from] bb_common::Error),
}

fn format_steps(missing: &[usize]) -> String {
    missing
        .iter()
        .map(|i| (i + 1).to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

impl From<sqlx::Error> for CoachError {
    fn from(err: sqlx::Error) -> Self {
        CoachError::Common(bb_common::Error::Database(err))
    }
}

/// Result type for domain operations
pub type CoachResult<T> = Result<T, CoachError>;

/// API error type
#[derive(Debug, Error)]
pub enum ApiError {
    /// Resource not found (404)
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// Invalid request (400)
    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// Conflict (409), e.g. an approach analysis is already running
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Internal server error (500)
    #[error("Internal server error: {0}")]
    Internal(String),

    /// Domain error
    #[error(transparent)]
    Coach(#[from] CoachError),

    /// bb-common error
    #[error("Common error: {0}")]
    Common(#[from] bb_common::Error),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code, message) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, "CONFLICT", msg),
            ApiError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR", msg),
            ApiError::Coach(err) => {
                let (status, code) = match &err {
                    CoachError::InvalidMediaType { .. } => {
                        (StatusCode::BAD_REQUEST, "INVALID_MEDIA_TYPE")
                    }
                    CoachError::MissingCredential => {
                        (StatusCode::BAD_REQUEST, "MISSING_CREDENTIAL")
                    }
                    CoachError::IncompleteApproach { .. } => {
                        (StatusCode::BAD_REQUEST, "INCOMPLETE_APPROACH")
                    }
                    CoachError::AnalysisFailed(_) => (StatusCode::BAD_GATEWAY, "ANALYSIS_FAILED"),
                    CoachError::InvalidInput(_) => (StatusCode::BAD_REQUEST, "INVALID_INPUT"),
                    CoachError::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
                    CoachError::Busy(_) => (StatusCode::CONFLICT, "CONFLICT"),
                    CoachError::InvalidPersistedState { .. } | CoachError::Common(_) => {
                        (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR")
                    }
                };
                (status, code, err.to_string())
            }
            ApiError::Common(ref err) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "COMMON_ERROR",
                err.to_string(),
            ),
        };

        let body = Json(json!({
            "error": {
                "code": error_code,
                "message": message,
            }
        }));

        (status, body).into_response()
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;
