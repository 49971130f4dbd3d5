//! Tournament score tracking
//!
//! CRUD over the `tournament_games` collection plus statistics, sorting and
//! CSV export.

use chrono::{Local, NaiveDate};
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::db::settings::TOURNAMENT_GAMES;
use crate::error::{CoachError, CoachResult};
use crate::models::records::PERFECT_GAME;
use crate::models::{NewGame, TournamentGame};
use crate::store::LocalStore;

/// Tournament tips shown one at a time
pub const TIPS: [&str; 10] = [
    "Focus on your breathing to stay calm during tournament play.",
    "Keep your pre-shot routine consistent for every frame.",
    "Stay hydrated throughout tournament play for better focus.",
    "Adjust your targeting based on lane conditions after practice.",
    "Make small adjustments - move only 1-2 boards at a time.",
    "Pay attention to how your ball reacts as the lane conditions change.",
    "Keep track of which balls work best on different lane conditions.",
    "Focus on spare shooting in practice - strikes will come in competition.",
    "Stay positive and focus on your next shot, not your last one.",
    "Watch how other bowlers' balls are reacting on your pair.",
];

/// A random tip
pub fn tip_of_the_day() -> &'static str {
    TIPS.choose(&mut rand::thread_rng()).copied().unwrap_or(TIPS[0])
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortField {
    #[default]
    Date,
    Score,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    #[default]
    Desc,
}

/// Summary over all recorded games; all zero when there are none
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct GameStats {
    pub average: u16,
    pub highest: u16,
    pub lowest: u16,
    pub count: usize,
}

pub fn compute_stats(games: &[TournamentGame]) -> GameStats {
    if games.is_empty() {
        return GameStats::default();
    }

    let sum: u32 = games.iter().map(|g| u32::from(g.score)).sum();
    let average = (f64::from(sum) / games.len() as f64).round() as u16;

    GameStats {
        average,
        highest: games.iter().map(|g| g.score).max().unwrap_or(0),
        lowest: games.iter().map(|g| g.score).min().unwrap_or(0),
        count: games.len(),
    }
}

/// Stable sort in place
pub fn sort_games(games: &mut [TournamentGame], field: SortField, direction: SortDirection) {
    games.sort_by(|a, b| {
        let ordering = match field {
            SortField::Date => a.date.cmp(&b.date),
            SortField::Score => a.score.cmp(&b.score),
        };
        match direction {
            SortDirection::Asc => ordering,
            SortDirection::Desc => ordering.reverse(),
        }
    });
}

fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

/// CSV with a `Date,Score,Location,Notes` header, one row per game
pub fn export_csv(games: &[TournamentGame]) -> String {
    let mut csv = String::from("Date,Score,Location,Notes\r\n");
    for game in games {
        csv.push_str(&format!(
            "{},{},{},{}\r\n",
            game.date.format("%Y-%m-%d"),
            game.score,
            csv_field(&game.location),
            csv_field(&game.notes)
        ));
    }
    csv
}

/// Check a new game and turn it into a record
pub fn validate_new_game(new_game: NewGame, today: NaiveDate) -> CoachResult<TournamentGame> {
    if !(0..=i64::from(PERFECT_GAME)).contains(&new_game.score) {
        return Err(CoachError::InvalidInput(format!(
            "score must be between 0 and {}, got {}",
            PERFECT_GAME, new_game.score
        )));
    }

    Ok(TournamentGame {
        id: Uuid::new_v4(),
        score: new_game.score as u16,
        date: new_game.date.unwrap_or(today),
        location: new_game.location.trim().to_string(),
        notes: new_game.notes.trim().to_string(),
    })
}

/// Tournament games backed by the local store
#[derive(Clone)]
pub struct ScoreTracker {
    store: LocalStore,
}

impl ScoreTracker {
    pub fn new(store: LocalStore) -> Self {
        Self { store }
    }

    pub async fn list(
        &self,
        field: SortField,
        direction: SortDirection,
    ) -> CoachResult<Vec<TournamentGame>> {
        let mut games = self.store.load_collection::<TournamentGame>(TOURNAMENT_GAMES).await?;
        sort_games(&mut games, field, direction);
        Ok(games)
    }

    pub async fn add(&self, new_game: NewGame) -> CoachResult<TournamentGame> {
        let game = validate_new_game(new_game, Local::now().date_naive())?;

        let mut games = self.store.load_collection::<TournamentGame>(TOURNAMENT_GAMES).await?;
        games.push(game.clone());
        self.store.save_collection(TOURNAMENT_GAMES, &games).await?;

        tracing::info!(game_id = %game.id, score = game.score, "Tournament game recorded");
        Ok(game)
    }

    pub async fn delete(&self, id: Uuid) -> CoachResult<()> {
        let mut games = self.store.load_collection::<TournamentGame>(TOURNAMENT_GAMES).await?;
        let before = games.len();
        games.retain(|g| g.id != id);
        if games.len() == before {
            return Err(CoachError::NotFound(format!("tournament game {}", id)));
        }

        self.store.save_collection(TOURNAMENT_GAMES, &games).await?;
        tracing::info!(game_id = %id, "Tournament game deleted");
        Ok(())
    }

    pub async fn stats(&self) -> CoachResult<GameStats> {
        let games = self.store.load_collection::<TournamentGame>(TOURNAMENT_GAMES).await?;
        Ok(compute_stats(&games))
    }

    /// CSV of all games in the default (newest first) order
    pub async fn export_csv(&self) -> CoachResult<String> {
        let games = self.list(SortField::default(), SortDirection::default()).await?;
        Ok(export_csv(&games))
    }
}
