//! HTTP API handlers for bb-coach
//!
//! JSON REST endpoints for the coaching session, free-form questions,
//! settings and record collections, an SSE event stream, and the single-page UI.

pub mod approach;
pub mod ask;
pub mod frames;
pub mod health;
pub mod inventory;
pub mod release;
pub mod sequence;
pub mod settings;
pub mod sse;
pub mod tournament;
pub mod ui;
mod upload;

pub use approach::approach_routes;
pub use ask::ask_routes;
pub use frames::frame_routes;
pub use health::health_routes;
pub use inventory::inventory_routes;
pub use release::release_routes;
pub use sequence::sequence_routes;
pub use settings::settings_routes;
pub use sse::event_stream;
pub use tournament::tournament_routes;
pub use ui::ui_routes;
