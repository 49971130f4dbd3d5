//! Whole-approach analysis pipeline
//!
//! Runs per-step analysis for every step in ascending order, one request at a
//! time, then issues exactly one aggregate request built from whatever the
//! steps produced. Progress is reported through an `AnalysisSink` so the
//! owner of the step board can apply results as they settle.
//!
//! Preconditions are checked before any request is sent:
//! 1. a credential is present (`MissingCredential`)
//! 2. every step in range has an image (`IncompleteApproach`)
//!
//! A failed step does not stop the run. A failed aggregate does not undo the
//! step results already reported.

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use uuid::Uuid;

use crate::error::{AnalysisFailure, CoachError};
use crate::models::analysis::score_from_value;
use crate::models::{AggregateAnalysis, Frame, StepAnalysis};
use crate::services::prompts;
use crate::services::step_analyzer::invoke_step;
use crate::services::vision_client::{
    CompletionContent, Credential, VisionBackend, VisionRequest, VisionTask,
};

/// One stage of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineStage {
    /// Credential and completeness checks; sends nothing
    Validate,
    /// Per-step request for the given step index
    Step(usize),
    /// The single aggregate request
    Aggregate,
}

impl PipelineStage {
    /// Stage order for `step_count` steps
    pub fn plan(step_count: usize) -> Vec<PipelineStage> {
        std::iter::once(PipelineStage::Validate)
            .chain((0..step_count).map(PipelineStage::Step))
            .chain(std::iter::once(PipelineStage::Aggregate))
            .collect()
    }
}

/// Settled result of one step within a run
#[derive(Debug, Clone)]
pub struct StepOutcome {
    pub step_index: usize,
    /// Frame the request was made for
    pub frame_id: Uuid,
    pub result: Result<StepAnalysis, AnalysisFailure>,
}

/// Everything a run produced
#[derive(Debug, Clone)]
pub struct ApproachReport {
    pub steps: Vec<StepOutcome>,
    pub aggregate: Result<AggregateAnalysis, AnalysisFailure>,
}

impl ApproachReport {
    pub fn failed_steps(&self) -> usize {
        self.steps.iter().filter(|s| s.result.is_err()).count()
    }
}

/// Receives pipeline progress
#[async_trait]
pub trait AnalysisSink: Send + Sync {
    /// A step request is about to be sent
    async fn step_started(&self, step_index: usize, frame: &Frame);

    /// A step request settled
    async fn step_settled(&self, outcome: &StepOutcome);

    /// The aggregate request is about to be sent
    async fn aggregate_started(&self);

    /// The aggregate request settled
    async fn aggregate_settled(&self, result: &Result<AggregateAnalysis, AnalysisFailure>);
}

/// Sink that ignores progress
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopSink;

#[async_trait]
impl AnalysisSink for NoopSink {
    async fn step_started(&self, _step_index: usize, _frame: &Frame) {}
    async fn step_settled(&self, _outcome: &StepOutcome) {}
    async fn aggregate_started(&self) {}
    async fn aggregate_settled(&self, _result: &Result<AggregateAnalysis, AnalysisFailure>) {}
}

/// Check that a run may start without sending anything
pub fn check_preconditions(
    frames: &[Option<Frame>],
    credential: Option<&Credential>,
) -> Result<(), CoachError> {
    if credential.is_none() {
        return Err(CoachError::MissingCredential);
    }

    let missing: Vec<usize> = frames
        .iter()
        .enumerate()
        .filter(|(_, f)| f.is_none())
        .map(|(i, _)| i)
        .collect();
    if !missing.is_empty() {
        return Err(CoachError::IncompleteApproach { missing });
    }

    Ok(())
}

/// Analyze every step, then the approach as a whole
///
/// `frames[i]` is the image bound to step `i`. Returns `Err` only for failed
/// preconditions; request failures are reported inside the `ApproachReport`.
pub async fn analyze_all(
    backend: &dyn VisionBackend,
    frames: &[Option<Frame>],
    credential: Option<&Credential>,
    scoring_context: &str,
    sink: &dyn AnalysisSink,
) -> Result<ApproachReport, CoachError> {
    let step_count = frames.len();
    let mut credential_checked = None;
    let mut steps = Vec::with_capacity(step_count);
    let mut aggregate = Err(AnalysisFailure::malformed("aggregate stage did not run"));

    for stage in PipelineStage::plan(step_count) {
        tracing::debug!(?stage, "Approach pipeline stage");
        match stage {
            PipelineStage::Validate => {
                check_preconditions(frames, credential)?;
                credential_checked = credential;
                tracing::info!(step_count, backend = backend.name(), "Starting approach analysis");
            }
            PipelineStage::Step(step_index) => {
                let (Some(credential), Some(Some(frame))) =
                    (credential_checked, frames.get(step_index))
                else {
                    continue;
                };

                sink.step_started(step_index, frame).await;
                let result = invoke_step(backend, credential, step_index, step_count, frame).await;
                let outcome = StepOutcome {
                    step_index,
                    frame_id: frame.id,
                    result,
                };
                sink.step_settled(&outcome).await;
                steps.push(outcome);
            }
            PipelineStage::Aggregate => {
                let credential = credential_checked.ok_or(CoachError::MissingCredential)?;
                aggregate = run_aggregate(backend, credential, &steps, scoring_context, sink).await;
            }
        }
    }

    let report = ApproachReport { steps, aggregate };
    tracing::info!(
        step_count,
        failed_steps = report.failed_steps(),
        aggregate_ok = report.aggregate.is_ok(),
        "Approach analysis finished"
    );
    Ok(report)
}

async fn run_aggregate(
    backend: &dyn VisionBackend,
    credential: &Credential,
    steps: &[StepOutcome],
    scoring_context: &str,
    sink: &dyn AnalysisSink,
) -> Result<AggregateAnalysis, AnalysisFailure> {
    let settled: Vec<Option<&StepAnalysis>> =
        steps.iter().map(|s| s.result.as_ref().ok()).collect();
    let request = VisionRequest {
        task: VisionTask::Aggregate,
        instruction: prompts::aggregate_instruction(&settled, scoring_context),
        image_data_url: None,
        max_tokens: None,
    };

    sink.aggregate_started().await;
    let aggregate = match backend.complete(credential, &request).await {
        Ok(content) => parse_aggregate(content),
        Err(failure) => Err(failure),
    };

    match &aggregate {
        Ok(analysis) => tracing::info!(
            subscores = analysis.subscores.len(),
            "Aggregate analysis completed"
        ),
        Err(failure) => {
            tracing::warn!(kind = failure.kind(), "Aggregate analysis failed: {}", failure)
        }
    }
    sink.aggregate_settled(&aggregate).await;
    aggregate
}

static PROSE_SCORE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)^[\s•\-\*]*([A-Za-z][A-Za-z ]*?)(?:\s+[Ss]core)?\s*:\s*(\d{1,3})\s*/\s*100")
        .expect("static regex is valid")
});

/// Interpret aggregate content
///
/// Tried in order: a JSON object, JSON text (optionally inside a ``` fence),
/// then prose with `Name: NN/100` lines.
pub fn parse_aggregate(content: CompletionContent) -> Result<AggregateAnalysis, AnalysisFailure> {
    match content {
        CompletionContent::Structured(Value::Object(map)) => aggregate_from_object(&map),
        CompletionContent::Structured(other) => Err(AnalysisFailure::malformed(format!(
            "aggregate content is not an object: {}",
            other
        ))),
        CompletionContent::Text(text) => {
            if let Ok(Value::Object(map)) = serde_json::from_str::<Value>(strip_code_fence(&text)) {
                return aggregate_from_object(&map);
            }
            aggregate_from_prose(&text)
        }
    }
}

fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Skip an info string such as "json"
    let body = rest.split_once('\n').map(|(_, body)| body).unwrap_or(rest);
    body.trim_end().strip_suffix("```").unwrap_or(body).trim()
}

fn aggregate_from_object(map: &Map<String, Value>) -> Result<AggregateAnalysis, AnalysisFailure> {
    let overall_text = ["overall", "overallText", "overall_text", "summary"]
        .iter()
        .find_map(|key| map.get(*key).and_then(Value::as_str))
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| AnalysisFailure::malformed("aggregate response has no overall text"))?
        .to_string();

    let subscores = ["subscores", "scores", "metrics"]
        .iter()
        .find_map(|key| map.get(*key).and_then(Value::as_object))
        .map(|scores| {
            scores
                .iter()
                .filter_map(|(name, value)| score_from_value(value).map(|s| (name.clone(), s)))
                .collect()
        })
        .unwrap_or_default();

    Ok(AggregateAnalysis {
        overall_text,
        subscores,
    })
}

fn aggregate_from_prose(text: &str) -> Result<AggregateAnalysis, AnalysisFailure> {
    let overall_text = text.trim();
    if overall_text.is_empty() {
        return Err(AnalysisFailure::malformed("aggregate response is empty"));
    }

    let mut subscores = BTreeMap::new();
    for caps in PROSE_SCORE.captures_iter(overall_text) {
        let name = camel_case(&caps[1]);
        if let Ok(score) = caps[2].parse::<i64>() {
            subscores.entry(name).or_insert(score);
        }
    }

    Ok(AggregateAnalysis {
        overall_text: overall_text.to_string(),
        subscores,
    })
}

/// "Arm Swing" -> "armSwing"
fn camel_case(label: &str) -> String {
    let mut out = String::new();
    for (i, word) in label.split_whitespace().enumerate() {
        let lower = word.to_lowercase();
        if i == 0 {
            out.push_str(&lower);
        } else {
            let mut chars = lower.chars();
            if let Some(first) = chars.next() {
                out.extend(first.to_uppercase());
                out.push_str(chars.as_str());
            }
        }
    }
    out
}
