//! Ball release analysis
//!
//! Single-image analysis of the frame assigned the release role. Follows the
//! same preconditions as per-step analysis.

use serde_json::{Map, Value};

use crate::error::{AnalysisFailure, CoachError};
use crate::models::analysis::score_from_value;
use crate::models::{Frame, ReleaseAnalysis, ReleaseMetrics};
use crate::services::prompts::RELEASE_INSTRUCTION;
use crate::services::vision_client::{
    CompletionContent, Credential, VisionBackend, VisionRequest, VisionTask,
};

/// Analyze the release frame
///
/// `Ok(None)` when no release frame is assigned.
pub async fn analyze_release(
    backend: &dyn VisionBackend,
    frame: Option<&Frame>,
    credential: Option<&Credential>,
) -> Result<Option<ReleaseAnalysis>, CoachError> {
    let credential = credential.ok_or(CoachError::MissingCredential)?;
    let Some(frame) = frame else {
        tracing::debug!("No release frame assigned, skipping analysis");
        return Ok(None);
    };

    let request = VisionRequest {
        task: VisionTask::Release,
        instruction: RELEASE_INSTRUCTION.to_string(),
        image_data_url: Some(frame.data_url()),
        max_tokens: None,
    };

    let content = backend.complete(credential, &request).await.map_err(|failure| {
        tracing::warn!(kind = failure.kind(), "Release analysis failed: {}", failure);
        failure
    })?;
    let analysis = parse_release(content)?;

    tracing::info!(
        overall_score = ?analysis.metrics.as_ref().and_then(|m| m.overall_score),
        "Release analysis completed"
    );
    Ok(Some(analysis))
}

/// Interpret release content
///
/// JSON (object or text) fills the named fields; anything else becomes the
/// overall text with no metrics.
pub fn parse_release(content: CompletionContent) -> Result<ReleaseAnalysis, AnalysisFailure> {
    match content {
        CompletionContent::Structured(Value::Object(map)) => Ok(release_from_object(&map)),
        CompletionContent::Structured(other) => Err(AnalysisFailure::malformed(format!(
            "release content is not an object: {}",
            other
        ))),
        CompletionContent::Text(text) => {
            let trimmed = text.trim();
            if trimmed.is_empty() {
                return Err(AnalysisFailure::malformed("release response is empty"));
            }
            let unfenced = trimmed
                .strip_prefix("```json")
                .or_else(|| trimmed.strip_prefix("```"))
                .and_then(|body| body.trim_end().strip_suffix("```"))
                .unwrap_or(trimmed)
                .trim();
            match serde_json::from_str::<Value>(unfenced) {
                Ok(Value::Object(map)) => Ok(release_from_object(&map)),
                _ => Ok(ReleaseAnalysis {
                    overall: Some(trimmed.to_string()),
                    ..ReleaseAnalysis::default()
                }),
            }
        }
    }
}

fn text_field(map: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter()
        .find_map(|key| map.get(*key).and_then(Value::as_str))
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

fn score_field(map: &Map<String, Value>, keys: &[&str]) -> Option<i64> {
    keys.iter().find_map(|key| map.get(*key).and_then(score_from_value))
}

fn release_from_object(map: &Map<String, Value>) -> ReleaseAnalysis {
    let metrics = map.get("metrics").and_then(Value::as_object).map(|m| ReleaseMetrics {
        wrist_position_score: score_field(m, &["wristPositionScore", "wrist_position_score"]),
        finger_position_score: score_field(m, &["fingerPositionScore", "finger_position_score"]),
        release_angle_score: score_field(m, &["releaseAngleScore", "release_angle_score"]),
        overall_score: score_field(m, &["overallScore", "overall_score"]),
    });

    ReleaseAnalysis {
        overall: text_field(map, &["overall", "summary"]),
        wrist_position: text_field(map, &["wristPosition", "wrist_position"]),
        finger_position: text_field(map, &["fingerPosition", "finger_position"]),
        release_angle: text_field(map, &["releaseAngle", "release_angle"]),
        metrics: metrics.filter(|m| !m.is_empty()),
    }
}
