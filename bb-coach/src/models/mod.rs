//! Data models for bb-coach
//!
//! - Frames and the sequence assignment map
//! - Approach step slots and their analysis state machine
//! - Analysis results
//! - Persisted tournament and equipment records

pub mod analysis;
pub mod assignment;
pub mod frame;
pub mod records;
pub mod step_slot;

pub use analysis::{AggregateAnalysis, ReleaseAnalysis, ReleaseMetrics, StepAnalysis};
pub use assignment::{Assignment, AssignmentMap, Role};
pub use frame::{Frame, FrameSummary};
pub use records::{Ball, NewBall, NewGame, TournamentGame};
pub use step_slot::{
    StepBoard, StepSlot, StepState, DEFAULT_STEP_COUNT, MAX_STEP_COUNT, MIN_STEP_COUNT,
};
