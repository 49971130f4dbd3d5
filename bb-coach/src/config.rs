//! Configuration resolution for bb-coach
//!
//! Vision API key resolution with Database → ENV → TOML priority, plus
//! best-effort write-back of settings to the TOML file.

use bb_common::config::TomlConfig;
use bb_common::{Error, Result};
use sqlx::{Pool, Sqlite};
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, info, warn};

/// Environment variable holding the vision API key
pub const API_KEY_ENV_VAR: &str = "BOWLBETTER_API_KEY";

/// Where a resolved key came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeySource {
    Database,
    Environment,
    Toml,
}

impl KeySource {
    pub fn as_str(&self) -> &'static str {
        match self {
            KeySource::Database => "database",
            KeySource::Environment => "environment",
            KeySource::Toml => "TOML",
        }
    }
}

/// Resolve vision API key from 3-tier configuration
///
/// **Priority:** Database → ENV → TOML. `None` means no source holds a
/// non-blank key.
pub async fn resolve_vision_api_key(
    db: &Pool<Sqlite>,
    toml_config: &TomlConfig,
) -> Result<Option<(String, KeySource)>> {
    let db_key = crate::db::settings::get_vision_api_key(db)
        .await?
        .filter(|k| is_valid_key(k));
    let env_key = std::env::var(API_KEY_ENV_VAR).ok().filter(|k| is_valid_key(k));
    let toml_key = toml_config.vision_api_key.clone().filter(|k| is_valid_key(k));

    let sources: Vec<&str> = [
        db_key.as_ref().map(|_| KeySource::Database),
        env_key.as_ref().map(|_| KeySource::Environment),
        toml_key.as_ref().map(|_| KeySource::Toml),
    ]
    .iter()
    .flatten()
    .map(KeySource::as_str)
    .collect();

    // Warn if multiple sources (potential misconfiguration)
    if sources.len() > 1 {
        warn!(
            "Vision API key found in multiple sources: {}. Using {} (highest priority).",
            sources.join(", "),
            sources[0]
        );
    }

    let resolved = db_key
        .map(|k| (k, KeySource::Database))
        .or_else(|| env_key.map(|k| (k, KeySource::Environment)))
        .or_else(|| toml_key.map(|k| (k, KeySource::Toml)));

    match &resolved {
        Some((_, source)) => debug!("Vision API key loaded from {}", source.as_str()),
        None => debug!("Vision API key not configured"),
    }

    Ok(resolved)
}

/// Validate API key (non-empty, non-whitespace)
pub fn is_valid_key(key: &str) -> bool {
    !key.trim().is_empty()
}

/// Sync settings from database to TOML file
///
/// HashMap keys: "vision_api_key". TOML write failures are logged and
/// swallowed since the database is authoritative.
pub async fn sync_settings_to_toml(
    settings: HashMap<String, String>,
    toml_path: &Path,
) -> Result<()> {
    let mut config = if toml_path.exists() {
        let content = std::fs::read_to_string(toml_path)
            .map_err(|e| Error::Config(format!("Read TOML failed: {}", e)))?;
        toml::from_str(&content).map_err(|e| Error::Config(format!("Parse TOML failed: {}", e)))?
    } else {
        TomlConfig::default()
    };

    if let Some(key) = settings.get("vision_api_key") {
        config.vision_api_key = Some(key.clone());
    }

    match bb_common::config::write_toml_config(&config, toml_path) {
        Ok(()) => {
            info!("Settings synced to TOML: {}", toml_path.display());
            Ok(())
        }
        Err(e) => {
            warn!("TOML write failed (database write succeeded): {}", e);
            Ok(())
        }
    }
}
