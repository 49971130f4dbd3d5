//! Local settings store
//!
//! Process-wide persisted state: the vision credential, the scoring context
//! and the record collections. Loaded from SQLite on demand and written
//! through on every change.

use bb_common::config::TomlConfig;
use serde::de::DeserializeOwned;
use serde::Serialize;
use sqlx::SqlitePool;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use crate::config::{self, KeySource};
use crate::db::settings;
use crate::error::{CoachError, CoachResult};
use crate::models::records::PersistedRecord;
use crate::services::prompts::DEFAULT_SCORING_CONTEXT;
use crate::services::vision_client::Credential;

/// Handle to persisted settings
#[derive(Clone)]
pub struct LocalStore {
    db: SqlitePool,
    toml_config: Arc<TomlConfig>,
    /// TOML file receiving best-effort credential write-back
    toml_path: Option<PathBuf>,
}

impl LocalStore {
    pub fn new(db: SqlitePool, toml_config: TomlConfig, toml_path: Option<PathBuf>) -> Self {
        Self {
            db,
            toml_config: Arc::new(toml_config),
            toml_path,
        }
    }

    pub fn db(&self) -> &SqlitePool {
        &self.db
    }

    pub fn toml_config(&self) -> &TomlConfig {
        &self.toml_config
    }

    /// Currently effective credential (Database → ENV → TOML)
    pub async fn credential(&self) -> CoachResult<Option<Credential>> {
        let resolved = config::resolve_vision_api_key(&self.db, &self.toml_config).await?;
        Ok(resolved.and_then(|(key, _)| Credential::new(key)))
    }

    /// Where the effective credential comes from
    pub async fn credential_source(&self) -> CoachResult<Option<KeySource>> {
        let resolved = config::resolve_vision_api_key(&self.db, &self.toml_config).await?;
        Ok(resolved.map(|(_, source)| source))
    }

    /// Store a new credential
    ///
    /// The database write must succeed; the TOML copy is best-effort.
    pub async fn set_credential(&self, key: &str) -> CoachResult<()> {
        let Some(credential) = Credential::new(key) else {
            return Err(CoachError::InvalidInput("API key cannot be empty".to_string()));
        };

        settings::set_vision_api_key(&self.db, credential.expose().to_string()).await?;
        tracing::info!(key_len = credential.expose().len(), "Vision API key updated");

        if let Some(path) = &self.toml_path {
            let mut values = HashMap::new();
            values.insert("vision_api_key".to_string(), credential.expose().to_string());
            if let Err(e) = config::sync_settings_to_toml(values, path).await {
                tracing::warn!("TOML sync failed (database write succeeded): {}", e);
            }
        }
        Ok(())
    }

    /// Scoring guidance for the aggregate call, default text if never set
    pub async fn scoring_context(&self) -> CoachResult<String> {
        Ok(settings::get_scoring_context(&self.db)
            .await?
            .unwrap_or_else(|| DEFAULT_SCORING_CONTEXT.to_string()))
    }

    pub async fn set_scoring_context(&self, text: &str) -> CoachResult<()> {
        settings::set_scoring_context(&self.db, text.to_string()).await?;
        tracing::debug!(chars = text.len(), "Scoring context updated");
        Ok(())
    }

    /// Load a record collection
    ///
    /// A stored value that does not decode, or holds a record failing its
    /// shape check, is logged, removed, and read as empty.
    pub async fn load_collection<T>(&self, key: &str) -> CoachResult<Vec<T>>
    where
        T: DeserializeOwned + PersistedRecord,
    {
        let Some(raw) = settings::get_raw_setting(&self.db, key).await? else {
            return Ok(Vec::new());
        };

        match decode_collection::<T>(key, &raw) {
            Ok(items) => Ok(items),
            Err(err) => {
                tracing::warn!("Discarding stored collection: {}", err);
                settings::delete_setting(&self.db, key).await?;
                Ok(Vec::new())
            }
        }
    }

    /// Replace a record collection
    pub async fn save_collection<T: Serialize>(&self, key: &str, items: &[T]) -> CoachResult<()> {
        let json = serde_json::to_string(items)
            .map_err(|e| CoachError::InvalidInput(format!("cannot encode {}: {}", key, e)))?;
        settings::set_raw_setting(&self.db, key, &json).await?;
        tracing::debug!(key, count = items.len(), "Collection saved");
        Ok(())
    }
}

fn decode_collection<T>(key: &str, raw: &str) -> CoachResult<Vec<T>>
where
    T: DeserializeOwned + PersistedRecord,
{
    let invalid = |reason: String| CoachError::InvalidPersistedState {
        key: key.to_string(),
        reason,
    };

    let items: Vec<T> = serde_json::from_str(raw).map_err(|e| invalid(e.to_string()))?;
    if let Some(position) = items.iter().position(|item| !item.is_well_formed()) {
        return Err(invalid(format!("record {} failed its shape check", position)));
    }
    Ok(items)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Ball;

    #[test]
    fn test_decode_collection_rejects_non_array() {
        let err = decode_collection::<Ball>("equipment_balls", r#"{"name": "x"}"#).unwrap_err();
        assert!(matches!(
            err,
            CoachError::InvalidPersistedState { ref key, .. } if key == "equipment_balls"
        ));
    }

    #[test]
    fn test_decode_collection_rejects_bad_record() {
        let raw = r#"[{"id": "9b2f4c3e-4a59-4d2b-8f57-1c3e1b0f6a11", "name": "  ", "weight": 15}]"#;
        assert!(decode_collection::<Ball>("equipment_balls", raw).is_err());
    }

    #[test]
    fn test_decode_collection_accepts_valid_records() {
        let raw = r#"[{"id": "9b2f4c3e-4a59-4d2b-8f57-1c3e1b0f6a11", "name": "Phaze", "weight": 15}]"#;
        let balls = decode_collection::<Ball>("equipment_balls", raw).unwrap();
        assert_eq!(balls[0].name, "Phaze");
        assert_eq!(balls[0].cover_stock, "");
    }
}
