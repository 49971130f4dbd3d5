//! Coaching session state
//!
//! In-memory state of one coaching session: the imported image sequence and
//! scrub position, the assignment map, the step board, the active step, and
//! the aggregate and release results. Nothing here is persisted.
//!
//! Assignments are projected onto step slots reactively: every mutation of
//! the assignment map or the step count calls `reconcile`, which binds only
//! the slots whose resolved frame actually changed.
//!
//! Analysis results are applied last-write-wins, guarded by the frame id the
//! request was made for. A result for a frame that is no longer bound is
//! dropped.

use async_trait::async_trait;
use bb_common::events::{CoachEvent, EventBus};
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::{AnalysisFailure, CoachError, CoachResult};
use crate::models::{
    AggregateAnalysis, AssignmentMap, Frame, FrameSummary, ReleaseAnalysis, Role, StepAnalysis,
    StepBoard, StepState,
};
use crate::services::approach_orchestrator::{check_preconditions, AnalysisSink, StepOutcome};
use crate::services::image_intake::IntakeReport;
use crate::services::vision_client::Credential;

/// Aggregate result of the last full run
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum AggregateState {
    #[default]
    NotRun,
    Running,
    Completed {
        analysis: AggregateAnalysis,
    },
    Failed {
        error: AnalysisFailure,
    },
}

/// Release analysis result
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ReleaseStatus {
    #[default]
    NotRun,
    Running,
    Completed {
        analysis: ReleaseAnalysis,
    },
    Failed {
        error: AnalysisFailure,
    },
}

#[derive(Debug, Clone, Default)]
struct ReleaseState {
    frame_index: Option<usize>,
    frame: Option<Frame>,
    status: ReleaseStatus,
}

/// One coaching session
pub struct CoachSession {
    events: EventBus,
    sequence: Vec<Frame>,
    current_frame_index: usize,
    assignments: AssignmentMap,
    board: StepBoard,
    active_step: usize,
    aggregate: AggregateState,
    release: ReleaseState,
    approach_running: bool,
}

impl CoachSession {
    pub fn new(events: EventBus) -> Self {
        Self {
            events,
            sequence: Vec::new(),
            current_frame_index: 0,
            assignments: AssignmentMap::new(),
            board: StepBoard::default(),
            active_step: 0,
            aggregate: AggregateState::NotRun,
            release: ReleaseState::default(),
            approach_running: false,
        }
    }

    fn emit(&self, event: CoachEvent) {
        self.events.emit_lossy(event);
    }

    fn emit_step_state(&self, step_index: usize) {
        if let Some(slot) = self.board.slot(step_index) {
            self.emit(CoachEvent::StepStateChanged {
                step_index,
                state: slot.state().as_str().to_string(),
                timestamp: chrono::Utc::now(),
            });
        }
    }

    pub fn board(&self) -> &StepBoard {
        &self.board
    }

    pub fn assignments(&self) -> &AssignmentMap {
        &self.assignments
    }

    pub fn sequence(&self) -> &[Frame] {
        &self.sequence
    }

    pub fn current_frame_index(&self) -> usize {
        self.current_frame_index
    }

    pub fn active_step(&self) -> usize {
        self.active_step
    }

    pub fn aggregate(&self) -> &AggregateState {
        &self.aggregate
    }

    pub fn is_approach_running(&self) -> bool {
        self.approach_running
    }

    // ------------------------------------------------------------------
    // Sequence and assignments
    // ------------------------------------------------------------------

    /// Replace the sequence with a new batch
    ///
    /// Resets the scrub position and drops every assignment.
    pub fn import_sequence(&mut self, report: &IntakeReport) {
        self.sequence = report.frames.clone();
        self.current_frame_index = 0;
        self.assignments.clear();

        tracing::info!(
            frame_count = self.sequence.len(),
            rejected = report.rejected.len(),
            "Sequence imported, assignments cleared"
        );
        self.emit(CoachEvent::SequenceImported {
            frame_count: self.sequence.len(),
            rejected_count: report.rejected.len(),
            timestamp: chrono::Utc::now(),
        });
        self.reconcile();
    }

    /// Move the scrub position, clamped to the sequence
    pub fn set_cursor(&mut self, frame_index: usize) -> usize {
        self.current_frame_index = frame_index.min(self.sequence.len().saturating_sub(1));
        self.current_frame_index
    }

    /// Assign a sequence frame (default: the scrubbed one) to a role
    ///
    /// Returns the assigned frame index, or `None` when the sequence is empty.
    pub fn assign_frame(
        &mut self,
        frame_index: Option<usize>,
        role: Role,
    ) -> CoachResult<Option<usize>> {
        if self.sequence.is_empty() {
            tracing::warn!(role = role.as_str(), "No sequence imported, nothing to assign");
            return Ok(None);
        }

        let frame_index = frame_index.unwrap_or(self.current_frame_index);
        let frame = self.sequence.get(frame_index).cloned().ok_or_else(|| {
            CoachError::NotFound(format!(
                "frame {} (sequence has {} frames)",
                frame_index,
                self.sequence.len()
            ))
        })?;

        let replaced = self.assignments.assign(frame_index, role, Some(frame));
        tracing::info!(
            frame_index,
            role = role.as_str(),
            replaced = replaced.is_some(),
            "Frame assigned"
        );
        self.emit(CoachEvent::AssignmentChanged {
            frame_index,
            role: role.as_str().to_string(),
            timestamp: chrono::Utc::now(),
        });

        self.reconcile();
        Ok(Some(frame_index))
    }

    /// Project assignments onto step slots and the release binding
    ///
    /// Returns the step indices whose image changed. Running it twice with
    /// unchanged inputs changes nothing the second time. Slots are only ever
    /// bound here, never cleared.
    pub fn reconcile(&mut self) -> Vec<usize> {
        let resolved = self.assignments.resolve(Role::ApproachStep, self.board.step_count());

        let mut changed = Vec::new();
        for (step_index, frame) in resolved {
            if matches!(self.board.set_image(step_index, Some(frame)), Ok(true)) {
                changed.push(step_index);
            }
        }
        for &step_index in &changed {
            tracing::debug!(step_index, "Step image bound from assignment");
            self.emit_step_state(step_index);
        }

        let release = self
            .assignments
            .release_frame()
            .map(|(index, frame)| (index, frame.clone()));
        let release_id = release.as_ref().map(|(_, frame)| frame.id);
        if release_id != self.release.frame.as_ref().map(|f| f.id) {
            let frame_index = release.as_ref().map(|(index, _)| *index);
            self.release = ReleaseState {
                frame_index,
                frame: release.map(|(_, frame)| frame),
                status: ReleaseStatus::NotRun,
            };
            tracing::debug!(?frame_index, "Release frame changed");
            self.emit(CoachEvent::ReleaseFrameChanged {
                frame_index,
                timestamp: chrono::Utc::now(),
            });
        }

        changed
    }

    // ------------------------------------------------------------------
    // Step board
    // ------------------------------------------------------------------

    pub fn set_step_count(&mut self, step_count: usize) -> CoachResult<()> {
        self.board.resize(step_count)?;
        self.active_step = self.active_step.min(step_count.saturating_sub(1));

        tracing::info!(step_count, "Step count changed");
        self.emit(CoachEvent::StepCountChanged {
            step_count,
            timestamp: chrono::Utc::now(),
        });
        self.reconcile();
        Ok(())
    }

    /// Bind or clear a step image directly (single-file upload or removal)
    pub fn set_step_image(&mut self, step_index: usize, image: Option<Frame>) -> CoachResult<bool> {
        let changed = self.board.set_image(step_index, image)?;
        if changed {
            self.emit_step_state(step_index);
        }
        Ok(changed)
    }

    /// Bind bulk-distributed images; returns how many slots were filled
    pub fn bulk_place(&mut self, placed: BTreeMap<usize, Frame>) -> CoachResult<usize> {
        let filled = placed.len();
        for (step_index, frame) in placed {
            self.set_step_image(step_index, Some(frame))?;
        }
        if filled > 0 {
            self.active_step = 0;
        }
        Ok(filled)
    }

    pub fn set_active_step(&mut self, step_index: usize) -> CoachResult<()> {
        if step_index >= self.board.step_count() {
            return Err(CoachError::NotFound(format!(
                "step {} (approach has {} steps)",
                step_index,
                self.board.step_count()
            )));
        }
        self.active_step = step_index;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Analysis
    // ------------------------------------------------------------------

    /// Start single-step analysis; `None` when the step has no image
    pub fn begin_step(&mut self, step_index: usize) -> CoachResult<Option<Frame>> {
        let frame = self.board.begin_analysis(step_index)?;
        if frame.is_some() {
            self.emit_step_state(step_index);
        }
        Ok(frame)
    }

    /// Mark a step as analyzing if it is still bound to `frame_id`
    pub fn begin_step_of(&mut self, step_index: usize, frame_id: Uuid) -> bool {
        let started = self.board.begin_analysis_of(step_index, frame_id);
        if started {
            self.emit_step_state(step_index);
        }
        started
    }

    /// Apply a settled step result; `false` when it was superseded
    pub fn apply_step_outcome(
        &mut self,
        step_index: usize,
        frame_id: Uuid,
        result: Result<StepAnalysis, AnalysisFailure>,
    ) -> bool {
        let outcome = result.map(|a| a.raw_text).map_err(|e| e.to_string());
        let applied = self.board.record_outcome(step_index, frame_id, outcome);
        if applied {
            self.emit_step_state(step_index);
        } else {
            tracing::debug!(step_index, %frame_id, "Discarding superseded step result");
        }
        applied
    }

    /// Claim the approach run and snapshot the bound frames
    ///
    /// Fails with `Busy` while another run is in flight and with
    /// `IncompleteApproach` when a step has no image.
    pub fn begin_approach(&mut self, credential: &Credential) -> CoachResult<Vec<Option<Frame>>> {
        if self.approach_running {
            return Err(CoachError::Busy("an approach analysis is already running".to_string()));
        }

        let frames = self.board.frame_snapshot();
        check_preconditions(&frames, Some(credential))?;

        self.approach_running = true;
        self.aggregate = AggregateState::Running;
        self.emit(CoachEvent::ApproachAnalysisStarted {
            step_count: frames.len(),
            timestamp: chrono::Utc::now(),
        });
        Ok(frames)
    }

    /// Release the approach run
    pub fn finish_approach(&mut self) {
        self.approach_running = false;
        if self.aggregate == AggregateState::Running {
            self.aggregate = AggregateState::NotRun;
        }
    }

    pub fn apply_aggregate(&mut self, result: Result<AggregateAnalysis, AnalysisFailure>) {
        match result {
            Ok(analysis) => {
                self.emit(CoachEvent::AggregateAnalysisCompleted {
                    subscores: analysis.subscores.clone(),
                    timestamp: chrono::Utc::now(),
                });
                self.aggregate = AggregateState::Completed { analysis };
            }
            Err(error) => {
                self.emit(CoachEvent::AggregateAnalysisFailed {
                    error: error.to_string(),
                    timestamp: chrono::Utc::now(),
                });
                self.aggregate = AggregateState::Failed { error };
            }
        }
    }

    pub fn release_frame(&self) -> Option<&Frame> {
        self.release.frame.as_ref()
    }

    /// Start release analysis; `None` when no release frame is assigned
    pub fn begin_release(&mut self) -> Option<Frame> {
        let frame = self.release.frame.clone()?;
        self.release.status = ReleaseStatus::Running;
        Some(frame)
    }

    /// Apply a settled release result; `false` when the binding changed meanwhile
    pub fn apply_release_outcome(
        &mut self,
        frame_id: Uuid,
        result: Result<ReleaseAnalysis, AnalysisFailure>,
    ) -> bool {
        let still_bound = self.release.frame.as_ref().map(|f| f.id) == Some(frame_id);
        if !still_bound || self.release.status != ReleaseStatus::Running {
            tracing::debug!(%frame_id, "Discarding superseded release result");
            return false;
        }

        match result {
            Ok(analysis) => {
                self.emit(CoachEvent::ReleaseAnalysisCompleted {
                    overall_score: analysis.metrics.as_ref().and_then(|m| m.overall_score),
                    timestamp: chrono::Utc::now(),
                });
                self.release.status = ReleaseStatus::Completed { analysis };
            }
            Err(error) => {
                self.emit(CoachEvent::ReleaseAnalysisFailed {
                    error: error.to_string(),
                    timestamp: chrono::Utc::now(),
                });
                self.release.status = ReleaseStatus::Failed { error };
            }
        }
        true
    }

    /// Reset a release run that never reached the vision service
    pub fn abort_release(&mut self, frame_id: Uuid) {
        let still_bound = self.release.frame.as_ref().map(|f| f.id) == Some(frame_id);
        if still_bound && self.release.status == ReleaseStatus::Running {
            self.release.status = ReleaseStatus::NotRun;
        }
    }

    /// Find a frame held anywhere in the session
    pub fn frame_by_id(&self, id: Uuid) -> Option<Frame> {
        self.sequence
            .iter()
            .chain(self.board.slots().iter().filter_map(|s| s.image()))
            .chain(self.release.frame.iter())
            .find(|f| f.id == id)
            .cloned()
    }

    // ------------------------------------------------------------------
    // Views
    // ------------------------------------------------------------------

    pub fn sequence_view(&self) -> SequenceView {
        SequenceView {
            frames: self.sequence.iter().map(Frame::summary).collect(),
            current_frame_index: self.current_frame_index,
            assignments: self
                .assignments
                .iter()
                .map(|a| AssignmentView {
                    frame_index: a.frame_index,
                    role: a.role,
                    frame: a.bound_frame.as_ref().map(Frame::summary),
                })
                .collect(),
        }
    }

    pub fn approach_view(&self) -> ApproachView {
        ApproachView {
            step_count: self.board.step_count(),
            active_step: self.active_step,
            running: self.approach_running,
            steps: self
                .board
                .slots()
                .iter()
                .map(|slot| StepView {
                    step_index: slot.step_index,
                    state: slot.state(),
                    image: slot.image().map(Frame::summary),
                    result_text: slot.result_text().map(str::to_string),
                    error: slot.error().map(str::to_string),
                })
                .collect(),
            aggregate: self.aggregate.clone(),
        }
    }

    pub fn release_view(&self) -> ReleaseView {
        ReleaseView {
            frame_index: self.release.frame_index,
            frame: self.release.frame.as_ref().map(Frame::summary),
            result: self.release.status.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AssignmentView {
    pub frame_index: usize,
    pub role: Role,
    pub frame: Option<FrameSummary>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SequenceView {
    pub frames: Vec<FrameSummary>,
    pub current_frame_index: usize,
    pub assignments: Vec<AssignmentView>,
}

#[derive(Debug, Clone, Serialize)]
pub struct StepView {
    pub step_index: usize,
    pub state: StepState,
    pub image: Option<FrameSummary>,
    pub result_text: Option<String>,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ApproachView {
    pub step_count: usize,
    pub active_step: usize,
    pub running: bool,
    pub steps: Vec<StepView>,
    pub aggregate: AggregateState,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReleaseView {
    pub frame_index: Option<usize>,
    pub frame: Option<FrameSummary>,
    pub result: ReleaseStatus,
}

/// Applies pipeline progress to a shared session
///
/// Takes the write lock once per event and never across a request.
pub struct SessionSink {
    session: Arc<RwLock<CoachSession>>,
}

impl SessionSink {
    pub fn new(session: Arc<RwLock<CoachSession>>) -> Self {
        Self { session }
    }
}

#[async_trait]
impl AnalysisSink for SessionSink {
    async fn step_started(&self, step_index: usize, frame: &Frame) {
        let mut session = self.session.write().await;
        if !session.begin_step_of(step_index, frame.id) {
            tracing::debug!(step_index, "Step image changed before its request was sent");
        }
    }

    async fn step_settled(&self, outcome: &StepOutcome) {
        let mut session = self.session.write().await;
        session.apply_step_outcome(outcome.step_index, outcome.frame_id, outcome.result.clone());
    }

    async fn aggregate_started(&self) {
        tracing::debug!("Requesting aggregate analysis");
    }

    async fn aggregate_settled(&self, result: &Result<AggregateAnalysis, AnalysisFailure>) {
        let mut session = self.session.write().await;
        session.apply_aggregate(result.clone());
    }
}
