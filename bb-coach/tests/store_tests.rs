//! Local store persistence tests

mod helpers;

use bb_coach::db::settings::{get_raw_setting, set_raw_setting, EQUIPMENT_BALLS, TOURNAMENT_GAMES};
use bb_coach::models::{Ball, NewBall, NewGame, TournamentGame};
use bb_coach::services::hardware_inventory::Inventory;
use bb_coach::services::prompts::DEFAULT_SCORING_CONTEXT;
use bb_coach::services::score_tracker::{ScoreTracker, SortDirection, SortField};
use bb_coach::store::LocalStore;
use bb_common::config::TomlConfig;
use helpers::test_pool;

async fn store() -> LocalStore {
    LocalStore::new(test_pool().await, TomlConfig::default(), None)
}

#[tokio::test]
async fn test_corrupted_collection_is_removed() {
    let store = store().await;
    set_raw_setting(store.db(), TOURNAMENT_GAMES, "{not json").await.unwrap();

    let games: Vec<TournamentGame> = store.load_collection(TOURNAMENT_GAMES).await.unwrap();
    assert!(games.is_empty());
    assert!(get_raw_setting(store.db(), TOURNAMENT_GAMES).await.unwrap().is_none());
}

#[tokio::test]
async fn test_collection_failing_shape_check_is_removed() {
    let store = store().await;
    let raw = r#"[{"id": "0f8fad5b-d9cb-469f-a165-70867728950e", "name": "", "weight": 14}]"#;
    set_raw_setting(store.db(), EQUIPMENT_BALLS, raw).await.unwrap();

    let balls: Vec<Ball> = store.load_collection(EQUIPMENT_BALLS).await.unwrap();
    assert!(balls.is_empty());
    assert!(get_raw_setting(store.db(), EQUIPMENT_BALLS).await.unwrap().is_none());
}

#[tokio::test]
async fn test_collections_persist_across_store_handles() {
    let pool = test_pool().await;
    let first = LocalStore::new(pool.clone(), TomlConfig::default(), None);

    ScoreTracker::new(first.clone())
        .add(NewGame {
            score: 212,
            date: None,
            location: "Sunset Lanes".to_string(),
            notes: String::new(),
        })
        .await
        .unwrap();
    Inventory::new(first)
        .add(NewBall {
            name: "Hammer".to_string(),
            weight: Some(14),
            cover_stock: String::new(),
            layout: String::new(),
            notes: String::new(),
        })
        .await
        .unwrap();

    let second = LocalStore::new(pool, TomlConfig::default(), None);
    let games = ScoreTracker::new(second.clone())
        .list(SortField::Date, SortDirection::Desc)
        .await
        .unwrap();
    assert_eq!(games.len(), 1);
    assert_eq!(games[0].location, "Sunset Lanes");

    let balls = Inventory::new(second).list().await.unwrap();
    assert_eq!(balls[0].weight, 14);
}

#[tokio::test]
async fn test_scoring_context_default_and_override() {
    let store = store().await;
    assert_eq!(store.scoring_context().await.unwrap(), DEFAULT_SCORING_CONTEXT);

    store.set_scoring_context("Tempo matters most.").await.unwrap();
    assert_eq!(store.scoring_context().await.unwrap(), "Tempo matters most.");
}

#[tokio::test]
async fn test_blank_credential_rejected() {
    let store = store().await;
    assert!(store.set_credential("  ").await.is_err());
}
