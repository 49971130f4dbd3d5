//! Event types for the BowlBetter event system
//!
//! Provides the `CoachEvent` enum and the broadcast `EventBus` used to push
//! session changes to connected UIs over SSE.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tokio::sync::broadcast;

type Timestamp = chrono::DateTime<chrono::Utc>;

/// Coaching session events
///
/// Events are broadcast via EventBus and serialized for SSE transmission.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum CoachEvent {
    /// A new image sequence replaced the previous one
    SequenceImported {
        /// Frames accepted into the sequence
        frame_count: usize,
        /// Files rejected as non-images
        rejected_count: usize,
        timestamp: Timestamp,
    },

    /// A sequence frame was (re)assigned to a role
    AssignmentChanged {
        frame_index: usize,
        /// "approach_step" or "release_frame"
        role: String,
        timestamp: Timestamp,
    },

    /// Number of approach steps changed
    StepCountChanged {
        step_count: usize,
        timestamp: Timestamp,
    },

    /// A step slot changed state (image bound, cleared, analysis started or settled)
    StepStateChanged {
        step_index: usize,
        /// Snake-case state name ("empty", "image_present", ...)
        state: String,
        timestamp: Timestamp,
    },

    /// Full approach analysis started
    ApproachAnalysisStarted {
        step_count: usize,
        timestamp: Timestamp,
    },

    /// Aggregate analysis finished
    AggregateAnalysisCompleted {
        /// Named subscores as reported by the vision service
        subscores: BTreeMap<String, i64>,
        timestamp: Timestamp,
    },

    /// Aggregate analysis failed (per-step results are kept)
    AggregateAnalysisFailed {
        error: String,
        timestamp: Timestamp,
    },

    /// The frame bound to release analysis changed
    ReleaseFrameChanged {
        /// Sequence index of the bound frame, None when unbound
        frame_index: Option<usize>,
        timestamp: Timestamp,
    },

    /// Release analysis finished
    ReleaseAnalysisCompleted {
        overall_score: Option<i64>,
        timestamp: Timestamp,
    },

    /// Release analysis failed
    ReleaseAnalysisFailed {
        error: String,
        timestamp: Timestamp,
    },
}

impl CoachEvent {
    /// SSE event name (matches the serde tag)
    pub fn event_type(&self) -> &'static str {
        match self {
            CoachEvent::SequenceImported { .. } => "SequenceImported",
            CoachEvent::AssignmentChanged { .. } => "AssignmentChanged",
            CoachEvent::StepCountChanged { .. } => "StepCountChanged",
            CoachEvent::StepStateChanged { .. } => "StepStateChanged",
            CoachEvent::ApproachAnalysisStarted { .. } => "ApproachAnalysisStarted",
            CoachEvent::AggregateAnalysisCompleted { .. } => "AggregateAnalysisCompleted",
            CoachEvent::AggregateAnalysisFailed { .. } => "AggregateAnalysisFailed",
            CoachEvent::ReleaseFrameChanged { .. } => "ReleaseFrameChanged",
            CoachEvent::ReleaseAnalysisCompleted { .. } => "ReleaseAnalysisCompleted",
            CoachEvent::ReleaseAnalysisFailed { .. } => "ReleaseAnalysisFailed",
        }
    }
}

/// Broadcast channel for coaching events
///
/// Slow subscribers lose the oldest events once `capacity` is exceeded.
#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<CoachEvent>,
    capacity: usize,
}

impl EventBus {
    /// Creates a new EventBus with specified channel capacity
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx, capacity }
    }

    /// Subscribe to all future events
    ///
    /// Events emitted before subscription are not received.
    pub fn subscribe(&self) -> broadcast::Receiver<CoachEvent> {
        self.tx.subscribe()
    }

    /// Emit an event to all subscribers
    ///
    /// Returns `Err` if no subscribers are listening.
    #[allow(clippy::result_large_err)]
    pub fn emit(
        &self,
        event: CoachEvent,
    ) -> Result<usize, broadcast::error::SendError<CoachEvent>> {
        self.tx.send(event)
    }

    /// Emit an event, ignoring if no subscribers are listening
    pub fn emit_lossy(&self, event: CoachEvent) {
        let _ = self.tx.send(event);
    }

    /// Get the current number of active subscribers
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    /// Get the configured channel capacity
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
