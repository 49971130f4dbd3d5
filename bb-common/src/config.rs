//! Bootstrap configuration and root folder resolution
//!
//! Two tiers of configuration:
//! 1. **TOML bootstrap**: root folder, port, logging, vision endpoint (static, read at startup)
//! 2. **Database runtime**: credential and scoring context in the `settings` table
//!
//! Root folder priority order:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable
//! 3. TOML config file
//! 4. OS-dependent compiled default (fallback)

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Application directory name under the OS config/data folders
pub const APP_DIR_NAME: &str = "bowlbetter";

/// Database file name inside the root folder
pub const DATABASE_FILE_NAME: &str = "bowlbetter.db";

/// Default vision completion endpoint
pub const DEFAULT_VISION_ENDPOINT: &str = "https://api.groq.com/openai/v1/chat/completions";

/// Default vision-capable model
pub const DEFAULT_VISION_MODEL: &str = "meta-llama/llama-4-scout-17b-16e-instruct";

/// Bootstrap configuration loaded from TOML file
///
/// Application must restart to pick up changes to the TOML file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TomlConfig {
    /// Root folder holding the database (optional)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub root_folder: Option<PathBuf>,

    /// HTTP server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Serve canned analysis results instead of calling the vision API
    #[serde(default)]
    pub demo_mode: bool,

    /// Vision API key (lowest-priority credential source)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vision_api_key: Option<String>,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Vision completion API settings
    #[serde(default)]
    pub vision: VisionConfig,
}

impl Default for TomlConfig {
    fn default() -> Self {
        Self {
            root_folder: None,
            port: default_port(),
            logging: LoggingConfig::default(),
            vision: VisionConfig::default(),
            demo_mode: false,
            vision_api_key: None,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

/// Vision completion API settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VisionConfig {
    /// Chat completions URL
    #[serde(default = "default_vision_endpoint")]
    pub endpoint: String,

    /// Model identifier sent with every request
    #[serde(default = "default_vision_model")]
    pub model: String,

    /// Upper bound on completion tokens for analysis calls
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Transport timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for VisionConfig {
    fn default() -> Self {
        Self {
            endpoint: default_vision_endpoint(),
            model: default_vision_model(),
            max_tokens: default_max_tokens(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_port() -> u16 {
    5730
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_vision_endpoint() -> String {
    DEFAULT_VISION_ENDPOINT.to_string()
}

fn default_vision_model() -> String {
    DEFAULT_VISION_MODEL.to_string()
}

fn default_max_tokens() -> u32 {
    1024
}

fn default_timeout_secs() -> u64 {
    60
}

/// Default TOML path: `<config dir>/bowlbetter/<module>.toml`
pub fn default_config_path(module_name: &str) -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR_NAME)
        .join(format!("{}.toml", module_name))
}

/// Load bootstrap configuration
///
/// A missing file yields defaults. A present but unparseable file is an error.
pub fn load_toml_config(path: &Path) -> Result<TomlConfig> {
    if !path.exists() {
        debug!("No TOML config at {}, using defaults", path.display());
        return Ok(TomlConfig::default());
    }

    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("Read TOML failed: {}", e)))?;

    toml::from_str(&content).map_err(|e| Error::Config(format!("Parse TOML failed: {}", e)))
}

/// Write TOML config atomically (temp file + rename)
///
/// On Unix the file is restricted to 0600 since it may hold the API key.
pub fn write_toml_config(config: &TomlConfig, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let content = toml::to_string_pretty(config)
        .map_err(|e| Error::Config(format!("Serialize TOML failed: {}", e)))?;

    let mut temp_name = path.as_os_str().to_owned();
    temp_name.push(".tmp");
    let temp_path = PathBuf::from(temp_name);

    std::fs::write(&temp_path, content)?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(&temp_path, std::fs::Permissions::from_mode(0o600))?;
    }

    if let Err(e) = std::fs::rename(&temp_path, path) {
        let _ = std::fs::remove_file(&temp_path);
        return Err(Error::Io(e));
    }

    Ok(())
}

/// Report whether a TOML file is readable by group or others
///
/// Always `false` on non-Unix platforms.
pub fn check_toml_permissions_loose(path: &Path) -> Result<bool> {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let mode = std::fs::metadata(path)?.permissions().mode();
        Ok(mode & 0o077 != 0)
    }

    #[cfg(not(unix))]
    {
        let _ = path;
        Ok(false)
    }
}

/// Resolve the root folder following the priority order in the module docs
pub fn resolve_root_folder(
    cli_arg: Option<&Path>,
    env_var_name: &str,
    toml_config: &TomlConfig,
) -> PathBuf {
    // Priority 1: Command-line argument
    if let Some(path) = cli_arg {
        return path.to_path_buf();
    }

    // Priority 2: Environment variable
    if let Ok(path) = std::env::var(env_var_name) {
        if !path.trim().is_empty() {
            return PathBuf::from(path);
        }
        warn!("{} is set but empty, ignoring", env_var_name);
    }

    // Priority 3: TOML config file
    if let Some(path) = &toml_config.root_folder {
        return path.clone();
    }

    // Priority 4: OS-dependent compiled default
    get_default_root_folder()
}

/// Get OS-dependent default root folder path
fn get_default_root_folder() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join(APP_DIR_NAME))
        .unwrap_or_else(|| PathBuf::from("./bowlbetter_data"))
}

/// Database path inside a root folder
pub fn database_path(root_folder: &Path) -> PathBuf {
    root_folder.join(DATABASE_FILE_NAME)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_yields_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let config = load_toml_config(&temp_dir.path().join("absent.toml")).unwrap();

        assert_eq!(config.port, 5730);
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.vision.endpoint, DEFAULT_VISION_ENDPOINT);
        assert_eq!(config.vision.model, DEFAULT_VISION_MODEL);
        assert!(!config.demo_mode);
        assert!(config.vision_api_key.is_none());
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("bb-coach.toml");
        let content = "port = 6000\ndemo_mode = true\n[vision]\nmodel = \"other\"\n";
        std::fs::write(&path, content).unwrap();

        let config = load_toml_config(&path).unwrap();

        assert_eq!(config.port, 6000);
        assert!(config.demo_mode);
        assert_eq!(config.vision.model, "other");
        assert_eq!(config.vision.endpoint, DEFAULT_VISION_ENDPOINT);
        assert_eq!(config.vision.timeout_secs, 60);
    }

    #[test]
    fn test_malformed_file_is_config_error() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("bad.toml");
        std::fs::write(&path, "port = \"not a number\"").unwrap();

        assert!(matches!(load_toml_config(&path), Err(Error::Config(_))));
    }

    #[test]
    #[serial]
    fn test_root_folder_priority() {
        std::env::set_var("BB_TEST_ROOT", "/from/env");
        let toml_config = TomlConfig {
            root_folder: Some(PathBuf::from("/from/toml")),
            ..TomlConfig::default()
        };

        let cli = PathBuf::from("/from/cli");
        assert_eq!(
            resolve_root_folder(Some(&cli), "BB_TEST_ROOT", &toml_config),
            cli
        );
        assert_eq!(
            resolve_root_folder(None, "BB_TEST_ROOT", &toml_config),
            PathBuf::from("/from/env")
        );

        std::env::remove_var("BB_TEST_ROOT");
        assert_eq!(
            resolve_root_folder(None, "BB_TEST_ROOT", &toml_config),
            PathBuf::from("/from/toml")
        );
        assert!(resolve_root_folder(None, "BB_TEST_ROOT", &TomlConfig::default())
            .ends_with(APP_DIR_NAME)
            || resolve_root_folder(None, "BB_TEST_ROOT", &TomlConfig::default())
                .ends_with("bowlbetter_data"));
    }
}
