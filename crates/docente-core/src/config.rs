use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use dirs::config_dir;
use reqwest::Url;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::dashboard::ActiveTab;

const CONFIG_DIR_NAME: &str = "docente-portal";
const CONFIG_FILE_NAME: &str = "config.toml";
const CURRENT_SCHEMA_VERSION: u32 = 1;
pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:5000";
pub const DEFAULT_TOKEN_KEY: &str = "sb-auth-token";
pub const DEFAULT_DOCENTE_ID_KEY: &str = "docenteId";
pub const BASE_URL_ENV: &str = "DOCENTE_PORTAL_URL";

/// Result returned by [`load_config`], capturing the source and any non-fatal issues.
#[derive(Debug, Clone)]
pub struct ConfigLoadResult {
    pub config: FileConfig,
    pub warnings: Vec<String>,
    pub source: ConfigSource,
}

/// Indicates where the configuration was loaded from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigSource {
    /// No persisted configuration was found or usable; defaults were synthesized.
    Default,
    /// Configuration was read from `config.toml`.
    File,
}

/// Errors that can occur when persisting configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML serialization error: {0}")]
    Ser(#[from] toml::ser::Error),
    #[error("invalid backend URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },
}

/// Disk-backed configuration schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileConfig {
    #[serde(default = "FileConfig::schema_version")]
    pub schema_version: u32,
    #[serde(default)]
    pub backend: BackendPreferences,
    #[serde(default)]
    pub session: SessionPreferences,
    #[serde(default)]
    pub ui: UiPreferences,
}

impl Default for FileConfig {
    fn default() -> Self {
        Self {
            schema_version: CURRENT_SCHEMA_VERSION,
            backend: BackendPreferences::default(),
            session: SessionPreferences::default(),
            ui: UiPreferences::default(),
        }
    }
}

impl FileConfig {
    const fn schema_version() -> u32 {
        CURRENT_SCHEMA_VERSION
    }
}

/// Where the portal backend lives.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackendPreferences {
    #[serde(default = "BackendPreferences::default_base_url")]
    pub base_url: String,
    /// Unset means requests may wait indefinitely.
    #[serde(default)]
    pub request_timeout_secs: Option<u64>,
}

impl Default for BackendPreferences {
    fn default() -> Self {
        Self {
            base_url: Self::default_base_url(),
            request_timeout_secs: None,
        }
    }
}

impl BackendPreferences {
    fn default_base_url() -> String {
        DEFAULT_BASE_URL.to_string()
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
    }

    pub fn set_base_url(&mut self, url: &str) -> Result<(), ConfigError> {
        self.base_url = normalize_base_url(url)?;
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum SessionBackend {
    #[default]
    File,
    Keyring,
}

/// Keys under which the login flow leaves its data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionPreferences {
    #[serde(default)]
    pub store: SessionBackend,
    #[serde(default = "SessionPreferences::default_token_key")]
    pub token_key: String,
    #[serde(default = "SessionPreferences::default_docente_id_key")]
    pub docente_id_key: String,
}

impl Default for SessionPreferences {
    fn default() -> Self {
        Self {
            store: SessionBackend::default(),
            token_key: Self::default_token_key(),
            docente_id_key: Self::default_docente_id_key(),
        }
    }
}

impl SessionPreferences {
    fn default_token_key() -> String {
        DEFAULT_TOKEN_KEY.to_string()
    }

    fn default_docente_id_key() -> String {
        DEFAULT_DOCENTE_ID_KEY.to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct UiPreferences {
    #[serde(default)]
    pub default_tab: ActiveTab,
}

/// Path to the configuration directory.
pub fn config_directory() -> PathBuf {
    config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(CONFIG_DIR_NAME)
}

/// Path to `config.toml`.
pub fn config_path() -> PathBuf {
    config_directory().join(CONFIG_FILE_NAME)
}

/// Load the configuration, falling back to defaults on any problem.
pub fn load_config() -> ConfigLoadResult {
    let mut result = load_config_from(&config_path());
    apply_env_overrides(&mut result.config, &mut result.warnings);
    result
}

/// Load from an explicit path; environment overrides are not applied.
pub fn load_config_from(path: &Path) -> ConfigLoadResult {
    let mut warnings = Vec::new();

    if path.exists() {
        match fs::read_to_string(path) {
            Ok(raw) => match toml::from_str::<FileConfig>(&raw) {
                Ok(cfg) => {
                    let (cfg, mut sanitize_warnings) = sanitize_config(cfg);
                    warnings.append(&mut sanitize_warnings);
                    return ConfigLoadResult {
                        config: cfg,
                        warnings,
                        source: ConfigSource::File,
                    };
                }
                Err(err) => {
                    warnings.push(format!(
                        "Failed to parse {} as TOML: {}. Falling back to defaults.",
                        path.display(),
                        err
                    ));
                }
            },
            Err(err) => {
                warnings.push(format!(
                    "Failed to read {}: {}. Falling back to defaults.",
                    path.display(),
                    err
                ));
            }
        }
    }

    ConfigLoadResult {
        config: FileConfig::default(),
        warnings,
        source: ConfigSource::Default,
    }
}

/// Persist the configuration to disk.
pub fn save_config(config: &FileConfig) -> Result<(), ConfigError> {
    save_config_to(&config_path(), config)
}

pub fn save_config_to(path: &Path, config: &FileConfig) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let serialized = toml::to_string_pretty(config)?;
    fs::write(path, serialized)?;
    Ok(())
}

/// `DOCENTE_PORTAL_URL` replaces the configured backend URL.
pub fn apply_env_overrides(config: &mut FileConfig, warnings: &mut Vec<String>) {
    let Ok(raw) = env::var(BASE_URL_ENV) else {
        return;
    };
    if raw.trim().is_empty() {
        return;
    }
    if let Err(err) = config.backend.set_base_url(&raw) {
        warnings.push(format!("Ignoring {BASE_URL_ENV}: {err}"));
    }
}

/// Trim, check scheme and strip the trailing slash.
pub fn normalize_base_url(raw: &str) -> Result<String, ConfigError> {
    let trimmed = raw.trim().trim_end_matches('/');
    let parsed = Url::parse(trimmed).map_err(|err| ConfigError::InvalidUrl {
        url: raw.to_string(),
        reason: err.to_string(),
    })?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(ConfigError::InvalidUrl {
            url: raw.to_string(),
            reason: format!("unsupported scheme '{}'", parsed.scheme()),
        });
    }
    Ok(trimmed.to_string())
}

fn sanitize_config(mut config: FileConfig) -> (FileConfig, Vec<String>) {
    let mut warnings = Vec::new();

    if config.schema_version != CURRENT_SCHEMA_VERSION {
        warnings.push(format!(
            "Unknown schema_version {}; treating as {}.",
            config.schema_version, CURRENT_SCHEMA_VERSION
        ));
        config.schema_version = CURRENT_SCHEMA_VERSION;
    }

    match normalize_base_url(&config.backend.base_url) {
        Ok(url) => config.backend.base_url = url,
        Err(err) => {
            warnings.push(format!("{err}. Using {DEFAULT_BASE_URL}."));
            config.backend.base_url = DEFAULT_BASE_URL.to_string();
        }
    }

    if config.session.token_key.trim().is_empty() {
        warnings.push(format!(
            "session.token_key was empty; using '{DEFAULT_TOKEN_KEY}'."
        ));
        config.session.token_key = DEFAULT_TOKEN_KEY.to_string();
    }
    if config.session.docente_id_key.trim().is_empty() {
        warnings.push(format!(
            "session.docente_id_key was empty; using '{DEFAULT_DOCENTE_ID_KEY}'."
        ));
        config.session.docente_id_key = DEFAULT_DOCENTE_ID_KEY.to_string();
    }

    (config, warnings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn missing_file_yields_defaults_without_warnings() {
        let dir = tempdir().unwrap();
        let load = load_config_from(&dir.path().join(CONFIG_FILE_NAME));
        assert_eq!(load.source, ConfigSource::Default);
        assert!(load.warnings.is_empty());
        assert_eq!(load.config, FileConfig::default());
    }

    #[test]
    fn save_then_load_preserves_settings() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("sub").join(CONFIG_FILE_NAME);
        let mut config = FileConfig::default();
        config.backend.set_base_url("https://rh.example.edu/").unwrap();
        config.backend.request_timeout_secs = Some(20);
        config.session.store = SessionBackend::Keyring;
        config.ui.default_tab = ActiveTab::Profile;
        save_config_to(&path, &config).unwrap();

        let load = load_config_from(&path);
        assert_eq!(load.source, ConfigSource::File);
        assert_eq!(load.config.backend.base_url, "https://rh.example.edu");
        assert_eq!(load.config.backend.request_timeout(), Some(Duration::from_secs(20)));
        assert_eq!(load.config, config);
    }

    #[test]
    fn sanitize_repairs_bad_values() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        fs::write(
            &path,
            "schema_version = 9\n[backend]\nbase_url = \"ftp://nope\"\n[session]\ntoken_key = \"  \"\n",
        )
        .unwrap();

        let load = load_config_from(&path);
        assert_eq!(load.config.schema_version, CURRENT_SCHEMA_VERSION);
        assert_eq!(load.config.backend.base_url, DEFAULT_BASE_URL);
        assert_eq!(load.config.session.token_key, DEFAULT_TOKEN_KEY);
        assert_eq!(load.warnings.len(), 3);
    }

    #[test]
    fn unparsable_toml_falls_back_with_warning() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        fs::write(&path, "[backend\nbase_url = ").unwrap();
        let load = load_config_from(&path);
        assert_eq!(load.source, ConfigSource::Default);
        assert!(load.warnings[0].contains("Failed to parse"));
    }

    #[test]
    fn zero_timeout_means_none() {
        let prefs = BackendPreferences {
            request_timeout_secs: Some(0),
            ..BackendPreferences::default()
        };
        assert!(prefs.request_timeout().is_none());
    }
}
