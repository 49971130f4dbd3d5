//! Tournament score endpoints

use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::IntoResponse,
    routing::{delete, get},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ApiResult;
use crate::models::{NewGame, TournamentGame};
use crate::services::score_tracker::{self, GameStats, ScoreTracker, SortDirection, SortField};
use crate::AppState;

/// GET /api/tournament/games query
#[derive(Debug, Default, Deserialize)]
pub struct ListGamesQuery {
    #[serde(default)]
    pub sort: SortField,
    #[serde(default)]
    pub direction: SortDirection,
}

#[derive(Debug, Serialize)]
pub struct TipResponse {
    pub tip: &'static str,
}

/// GET /api/tournament/games
pub async fn list_games(
    State(state): State<AppState>,
    Query(query): Query<ListGamesQuery>,
) -> ApiResult<Json<Vec<TournamentGame>>> {
    let games = ScoreTracker::new(state.store.clone())
        .list(query.sort, query.direction)
        .await?;
    Ok(Json(games))
}

/// POST /api/tournament/games
pub async fn add_game(
    State(state): State<AppState>,
    Json(new_game): Json<NewGame>,
) -> ApiResult<(StatusCode, Json<TournamentGame>)> {
    let game = ScoreTracker::new(state.store.clone()).add(new_game).await?;
    Ok((StatusCode::CREATED, Json(game)))
}

/// DELETE /api/tournament/games/:id
pub async fn delete_game(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    ScoreTracker::new(state.store.clone()).delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/tournament/stats
pub async fn get_stats(State(state): State<AppState>) -> ApiResult<Json<GameStats>> {
    Ok(Json(ScoreTracker::new(state.store.clone()).stats().await?))
}

/// GET /api/tournament/export.csv
pub async fn export_csv(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    let csv = ScoreTracker::new(state.store.clone()).export_csv().await?;
    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8"),
            (header::CONTENT_DISPOSITION, "attachment; filename=\"bowling_scores.csv\""),
        ],
        csv,
    ))
}

/// GET /api/tournament/tip
pub async fn get_tip() -> Json<TipResponse> {
    Json(TipResponse {
        tip: score_tracker::tip_of_the_day(),
    })
}

/// Build tournament routes
pub fn tournament_routes() -> Router<AppState> {
    Router::new()
        .route("/api/tournament/games", get(list_games).post(add_game))
        .route("/api/tournament/games/:id", delete(delete_game))
        .route("/api/tournament/stats", get(get_stats))
        .route("/api/tournament/export.csv", get(export_csv))
        .route("/api/tournament/tip", get(get_tip))
}
