//! Bowling ball inventory
//!
//! CRUD over the `equipment_balls` collection.

use uuid::Uuid;

use crate::db::settings::EQUIPMENT_BALLS;
use crate::error::{CoachError, CoachResult};
use crate::models::records::{BALL_WEIGHT_RANGE, DEFAULT_BALL_WEIGHT};
use crate::models::{Ball, NewBall};
use crate::store::LocalStore;

/// Check a new ball and turn it into a record
pub fn validate_new_ball(new_ball: NewBall) -> CoachResult<Ball> {
    let name = new_ball.name.trim();
    if name.is_empty() {
        return Err(CoachError::InvalidInput("ball name is required".to_string()));
    }

    let weight = new_ball.weight.unwrap_or(DEFAULT_BALL_WEIGHT);
    if !BALL_WEIGHT_RANGE.contains(&weight) {
        return Err(CoachError::InvalidInput(format!(
            "ball weight must be {}-{} lbs, got {}",
            BALL_WEIGHT_RANGE.start(),
            BALL_WEIGHT_RANGE.end(),
            weight
        )));
    }

    Ok(Ball {
        id: Uuid::new_v4(),
        name: name.to_string(),
        weight,
        cover_stock: new_ball.cover_stock.trim().to_string(),
        layout: new_ball.layout.trim().to_string(),
        notes: new_ball.notes.trim().to_string(),
    })
}

/// Ball inventory backed by the local store
#[derive(Clone)]
pub struct Inventory {
    store: LocalStore,
}

impl Inventory {
    pub fn new(store: LocalStore) -> Self {
        Self { store }
    }

    /// Balls in insertion order
    pub async fn list(&self) -> CoachResult<Vec<Ball>> {
        self.store.load_collection::<Ball>(EQUIPMENT_BALLS).await
    }

    pub async fn add(&self, new_ball: NewBall) -> CoachResult<Ball> {
        let ball = validate_new_ball(new_ball)?;

        let mut balls = self.list().await?;
        balls.push(ball.clone());
        self.store.save_collection(EQUIPMENT_BALLS, &balls).await?;

        tracing::info!(ball_id = %ball.id, name = %ball.name, weight = ball.weight, "Ball added");
        Ok(ball)
    }

    pub async fn delete(&self, id: Uuid) -> CoachResult<()> {
        let mut balls = self.list().await?;
        let before = balls.len();
        balls.retain(|b| b.id != id);
        if balls.len() == before {
            return Err(CoachError::NotFound(format!("ball {}", id)));
        }

        self.store.save_collection(EQUIPMENT_BALLS, &balls).await?;
        tracing::info!(ball_id = %id, "Ball deleted");
        Ok(())
    }
}
