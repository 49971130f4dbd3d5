//! Ball inventory endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get},
    Json, Router,
};
use uuid::Uuid;

use crate::error::ApiResult;
use crate::models::{Ball, NewBall};
use crate::services::hardware_inventory::Inventory;
use crate::AppState;

/// GET /api/inventory/balls
pub async fn list_balls(State(state): State<AppState>) -> ApiResult<Json<Vec<Ball>>> {
    Ok(Json(Inventory::new(state.store.clone()).list().await?))
}

/// POST /api/inventory/balls
pub async fn add_ball(
    State(state): State<AppState>,
    Json(new_ball): Json<NewBall>,
) -> ApiResult<(StatusCode, Json<Ball>)> {
    let ball = Inventory::new(state.store.clone()).add(new_ball).await?;
    Ok((StatusCode::CREATED, Json(ball)))
}

/// DELETE /api/inventory/balls/:id
pub async fn delete_ball(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    Inventory::new(state.store.clone()).delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Build inventory routes
pub fn inventory_routes() -> Router<AppState> {
    Router::new()
        .route("/api/inventory/balls", get(list_balls).post(add_ball))
        .route("/api/inventory/balls/:id", delete(delete_ball))
}
