//! Persisted tournament and equipment records
//!
//! Stored as JSON arrays in the settings table. `is_well_formed` is the shape
//! check applied on load: one bad record invalidates the whole collection.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Highest possible ten-pin score
pub const PERFECT_GAME: u16 = 300;

/// Default ball weight in pounds
pub const DEFAULT_BALL_WEIGHT: u8 = 15;

/// Selectable ball weights in pounds
pub const BALL_WEIGHT_RANGE: std::ops::RangeInclusive<u8> = 6..=16;

/// Shape check for a persisted record
pub trait PersistedRecord {
    fn is_well_formed(&self) -> bool;
}

/// One tournament game
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TournamentGame {
    pub id: Uuid,
    pub score: u16,
    pub date: NaiveDate,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub notes: String,
}

impl PersistedRecord for TournamentGame {
    fn is_well_formed(&self) -> bool {
        self.score <= PERFECT_GAME
    }
}

/// Request payload for a new game
#[derive(Debug, Clone, Deserialize)]
pub struct NewGame {
    pub score: i64,
    /// Defaults to today
    #[serde(default)]
    pub date: Option<NaiveDate>,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub notes: String,
}

/// One bowling ball in the inventory
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ball {
    pub id: Uuid,
    pub name: String,
    pub weight: u8,
    #[serde(default)]
    pub cover_stock: String,
    #[serde(default)]
    pub layout: String,
    #[serde(default)]
    pub notes: String,
}

impl PersistedRecord for Ball {
    fn is_well_formed(&self) -> bool {
        !self.name.trim().is_empty()
    }
}

/// Request payload for a new ball
#[derive(Debug, Clone, Deserialize)]
pub struct NewBall {
    pub name: String,
    #[serde(default)]
    pub weight: Option<u8>,
    #[serde(default)]
    pub cover_stock: String,
    #[serde(default)]
    pub layout: String,
    #[serde(default)]
    pub notes: String,
}
