//! Analysis results
//!
//! Scores are stored as the vision service reported them. Nothing here clamps
//! them to 0-100; treat them as untrusted display data.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Feedback for one approach step
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepAnalysis {
    pub step_index: usize,
    pub raw_text: String,
}

/// Overall approach assessment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateAnalysis {
    pub overall_text: String,
    /// Metric name -> score, verbatim
    pub subscores: BTreeMap<String, i64>,
}

/// Release scores
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReleaseMetrics {
    pub wrist_position_score: Option<i64>,
    pub finger_position_score: Option<i64>,
    pub release_angle_score: Option<i64>,
    pub overall_score: Option<i64>,
}

impl ReleaseMetrics {
    pub fn is_empty(&self) -> bool {
        self.wrist_position_score.is_none()
            && self.finger_position_score.is_none()
            && self.release_angle_score.is_none()
            && self.overall_score.is_none()
    }
}

/// Ball release assessment
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReleaseAnalysis {
    pub overall: Option<String>,
    pub wrist_position: Option<String>,
    pub finger_position: Option<String>,
    pub release_angle: Option<String>,
    pub metrics: Option<ReleaseMetrics>,
}

/// Read a score from a loosely typed JSON value
///
/// Accepts integers, floats (rounded) and numeric strings such as "83" or "83/100".
pub fn score_from_value(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f.round() as i64)),
        Value::String(s) => {
            let head = s.split('/').next().unwrap_or_default().trim();
            head.parse::<i64>().ok().or_else(|| {
                head.parse::<f64>()
                    .ok()
                    .filter(|f| f.is_finite())
                    .map(|f| f.round() as i64)
            })
        }
        _ => None,
    }
}
