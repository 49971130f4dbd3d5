//! Vision API key validation
//!
//! Checks a key with one minimal text-only completion request before the
//! user relies on it for analysis.

use serde::Serialize;
use std::sync::Arc;

use crate::error::{AnalysisFailure, CoachResult};
use crate::services::prompts::{KEY_CHECK_INSTRUCTION, KEY_CHECK_MAX_TOKENS};
use crate::services::vision_client::{Credential, VisionBackend, VisionRequest, VisionTask};
use crate::store::LocalStore;

/// API key validation outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationResult {
    /// The service accepted the key
    Valid,
    /// Rejected, or the check itself failed
    Invalid,
    /// No key configured
    Missing,
}

/// Validation outcome with a user-facing explanation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    pub result: ValidationResult,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl ValidationReport {
    fn new(result: ValidationResult, detail: Option<String>) -> Self {
        Self { result, detail }
    }
}

/// API Key Validator
pub struct ApiKeyValidator {
    backend: Arc<dyn VisionBackend>,
}

impl ApiKeyValidator {
    pub fn new(backend: Arc<dyn VisionBackend>) -> Self {
        Self { backend }
    }

    /// Validate the key the store currently resolves
    pub async fn validate_stored_key(&self, store: &LocalStore) -> CoachResult<ValidationReport> {
        match store.credential().await? {
            None => {
                tracing::debug!("Vision API key is not configured");
                Ok(ValidationReport::new(ValidationResult::Missing, None))
            }
            Some(credential) => Ok(self.validate_credential(&credential).await),
        }
    }

    /// Validate an explicit key
    pub async fn validate_key(&self, key: &str) -> ValidationReport {
        match Credential::new(key) {
            Some(credential) => self.validate_credential(&credential).await,
            None => ValidationReport::new(ValidationResult::Missing, None),
        }
    }

    async fn validate_credential(&self, credential: &Credential) -> ValidationReport {
        let request = VisionRequest {
            task: VisionTask::KeyCheck,
            instruction: KEY_CHECK_INSTRUCTION.to_string(),
            image_data_url: None,
            max_tokens: Some(KEY_CHECK_MAX_TOKENS),
        };

        match self.backend.complete(credential, &request).await {
            Ok(_) => {
                tracing::info!(backend = self.backend.name(), "Vision API key is valid");
                ValidationReport::new(ValidationResult::Valid, None)
            }
            Err(AnalysisFailure::HttpStatus { status, .. }) if status == 401 || status == 403 => {
                tracing::warn!(status_code = status, "Vision API key was rejected");
                ValidationReport::new(
                    ValidationResult::Invalid,
                    Some(format!("The vision service rejected the key (HTTP {})", status)),
                )
            }
            Err(failure) => {
                // Other failures say nothing definite about the key
                tracing::warn!(kind = failure.kind(), "Vision API key check failed: {}", failure);
                ValidationReport::new(ValidationResult::Invalid, Some(failure.to_string()))
            }
        }
    }
}
