//! # BowlBetter Common Library
//!
//! Shared code for the BowlBetter services:
//! - Error type
//! - Bootstrap configuration (TOML) and root folder resolution
//! - Database initialization (settings table)
//! - Event types and EventBus
//! - SSE utilities

pub mod config;
pub mod db;
pub mod error;
pub mod events;
pub mod sse;

pub use error::{Error, Result};
