//! Service modules for the coaching workflow
//!
//! - Image intake and the vision API client
//! - Per-step, whole-approach and release analysis
//! - Free-form coaching questions
//! - Tournament score tracking and ball inventory

pub mod api_key_validator;
pub mod approach_orchestrator;
pub mod coach_questions;
pub mod hardware_inventory;
pub mod image_intake;
pub mod prompts;
pub mod release_analyzer;
pub mod score_tracker;
pub mod step_analyzer;
pub mod vision_client;

pub use api_key_validator::{ApiKeyValidator, ValidationReport, ValidationResult};
pub use approach_orchestrator::{
    analyze_all, AnalysisSink, ApproachReport, NoopSink, PipelineStage, StepOutcome,
};
pub use coach_questions::{ask, CoachAnswer};
pub use hardware_inventory::Inventory;
pub use image_intake::{bulk_distribute, import_batch, import_single, IntakeReport, UploadedFile};
pub use release_analyzer::analyze_release;
pub use score_tracker::{GameStats, ScoreTracker, SortDirection, SortField};
pub use step_analyzer::analyze_step;
pub use vision_client::{
    CompletionContent, Credential, DemoVisionBackend, GroqVisionClient, VisionBackend,
    VisionRequest, VisionTask,
};
