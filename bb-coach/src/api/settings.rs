//! Settings API endpoints
//!
//! Vision API key and scoring context. The key itself is never returned.

use crate::services::api_key_validator::{ApiKeyValidator, ValidationReport};
use crate::{ApiResult, AppState};
use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tracing::info;

/// Request payload for setting the vision API key
#[derive(Debug, Deserialize)]
pub struct SetApiKeyRequest {
    pub api_key: String,
}

/// Response payload for API key configuration
#[derive(Debug, Serialize)]
pub struct SetApiKeyResponse {
    pub success: bool,
    pub message: String,
}

/// Whether a key is configured, and where it comes from
#[derive(Debug, Serialize)]
pub struct ApiKeyStatus {
    pub configured: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<&'static str>,
}

/// Optional key to test instead of the stored one
#[derive(Debug, Default, Deserialize)]
pub struct TestApiKeyRequest {
    #[serde(default)]
    pub api_key: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ScoringContextBody {
    pub scoring_context: String,
}

/// GET /api/settings/api_key
pub async fn get_api_key_status(State(state): State<AppState>) -> ApiResult<Json<ApiKeyStatus>> {
    let source = state.store.credential_source().await?;
    Ok(Json(ApiKeyStatus {
        configured: source.is_some(),
        source: source.map(|s| s.as_str()),
    }))
}

/// POST /api/settings/api_key
///
/// **Request:** `{"api_key": "gsk_..."}`
///
/// Blank keys are rejected with 400. The database write is authoritative; the
/// TOML copy is best-effort.
pub async fn set_api_key(
    State(state): State<AppState>,
    Json(payload): Json<SetApiKeyRequest>,
) -> ApiResult<Json<SetApiKeyResponse>> {
    state.store.set_credential(&payload.api_key).await?;
    info!("Vision API key configured via Web UI");

    Ok(Json(SetApiKeyResponse {
        success: true,
        message: "API key saved".to_string(),
    }))
}

/// POST /api/settings/api_key/test
///
/// Tests `api_key` from the body when given, the stored key otherwise.
pub async fn test_api_key(
    State(state): State<AppState>,
    payload: Option<Json<TestApiKeyRequest>>,
) -> ApiResult<Json<ValidationReport>> {
    let validator = ApiKeyValidator::new(state.vision.clone());
    let explicit = payload.and_then(|Json(body)| body.api_key);

    let report = match explicit {
        Some(key) => validator.validate_key(&key).await,
        None => validator.validate_stored_key(&state.store).await?,
    };
    Ok(Json(report))
}

/// GET /api/settings/scoring_context
pub async fn get_scoring_context(
    State(state): State<AppState>,
) -> ApiResult<Json<ScoringContextBody>> {
    Ok(Json(ScoringContextBody {
        scoring_context: state.store.scoring_context().await?,
    }))
}

/// PUT /api/settings/scoring_context
pub async fn set_scoring_context(
    State(state): State<AppState>,
    Json(payload): Json<ScoringContextBody>,
) -> ApiResult<Json<ScoringContextBody>> {
    state.store.set_scoring_context(&payload.scoring_context).await?;
    Ok(Json(payload))
}

/// Build settings routes
pub fn settings_routes() -> Router<AppState> {
    Router::new()
        .route("/api/settings/api_key", get(get_api_key_status).post(set_api_key))
        .route("/api/settings/api_key/test", post(test_api_key))
        .route(
            "/api/settings/scoring_context",
            get(get_scoring_context).put(set_scoring_context),
        )
}
