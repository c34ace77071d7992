//! Configuration management for coursehub.
//!
//! Loads configuration from ${COURSEHUB_HOME}/config.toml with sensible defaults.

use std::fs;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Environment variable that overrides `api.base_url`.
pub const API_URL_ENV: &str = "COURSEHUB_API_URL";

/// Environment variable that overrides `log.level`.
pub const LOG_ENV: &str = "COURSEHUB_LOG";

/// Returns the default config template with comments.
///
/// Embedded from default_config.toml at compile time.
fn default_config_template() -> &'static str {
    include_str!("../default_config.toml")
}

/// Recursively merges items from source table into target table.
fn merge_items(target: &mut toml_edit::Table, source: &toml_edit::Table) {
    use toml_edit::Item;

    for (key, value) in source.iter() {
        match value {
            Item::Value(v) => {
                target[key] = Item::Value(v.clone());
            }
            Item::Table(src_table) => {
                if let Some(Item::Table(target_table)) = target.get_mut(key) {
                    merge_items(target_table, src_table);
                } else {
                    target[key] = Item::Table(src_table.clone());
                }
            }
            Item::ArrayOfTables(src_arr) => {
                target[key] = Item::ArrayOfTables(src_arr.clone());
            }
            Item::None => {}
        }
    }
}

pub mod paths {
    //! Path resolution for coursehub configuration and session files.
    //!
    //! COURSEHUB_HOME resolution order:
    //! 1. COURSEHUB_HOME environment variable (if set)
    //! 2. ~/.config/coursehub (default)

    use std::path::PathBuf;

    /// Returns the coursehub home directory.
    pub fn coursehub_home() -> PathBuf {
        if let Ok(home) = std::env::var("COURSEHUB_HOME") {
            return PathBuf::from(home);
        }

        dirs::home_dir().map_or_else(
            || PathBuf::from(".coursehub"),
            |h| h.join(".config").join("coursehub"),
        )
    }

    /// Returns the path to the config.toml file.
    pub fn config_path() -> PathBuf {
        coursehub_home().join("config.toml")
    }

    /// Returns the path to the persisted session tokens.
    pub fn session_path() -> PathBuf {
        coursehub_home().join("session.json")
    }
}

/// API connection settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Base URL of the platform API (endpoint paths are appended to it)
    pub base_url: String,
    /// Token refresh endpoint; `<base_url>/token/refresh/` when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh_url: Option<String>,
    /// Per-request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: Config::DEFAULT_BASE_URL.to_string(),
            refresh_url: None,
            timeout_secs: Config::DEFAULT_TIMEOUT_SECS,
        }
    }
}

/// Logging settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// `EnvFilter` directive
    pub level: String,
    /// Optional log file; stderr when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
            file: None,
        }
    }
}

/// Main configuration structure.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api: ApiConfig,
    pub log: LogConfig,
}

impl Config {
    pub const DEFAULT_BASE_URL: &'static str = "http://localhost:8000/api";
    pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

    /// Loads configuration from the default path.
    ///
    /// # Errors
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load() -> Result<Self> {
        Self::load_from(&paths::config_path())
    }

    /// Loads configuration from a specific path.
    /// Returns defaults if file doesn't exist.
    ///
    /// # Errors
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let contents = fs::read_to_string(path)
                .with_context(|| format!("Failed to read config from {}", path.display()))?;
            toml::from_str(&contents)
                .with_context(|| format!("Failed to parse config from {}", path.display()))
        } else {
            Ok(Config::default())
        }
    }

    /// Resolves the API base URL with precedence: env > config > default.
    ///
    /// The returned URL never ends with a slash so endpoint paths can be
    /// appended verbatim.
    ///
    /// # Errors
    /// Returns an error if the chosen URL is not a valid URL.
    pub fn base_url(&self) -> Result<String> {
        let env_url = std::env::var(API_URL_ENV).ok();
        let candidates = [env_url.as_deref(), Some(self.api.base_url.as_str())];

        let chosen = candidates
            .into_iter()
            .flatten()
            .map(str::trim)
            .find(|url| !url.is_empty())
            .unwrap_or(Self::DEFAULT_BASE_URL);

        url::Url::parse(chosen).with_context(|| format!("Invalid API base URL: {chosen}"))?;
        Ok(chosen.trim_end_matches('/').to_string())
    }

    /// Resolves the token refresh endpoint.
    ///
    /// # Errors
    /// Returns an error if a configured URL is not a valid URL.
    pub fn refresh_url(&self) -> Result<String> {
        match self.api.refresh_url.as_deref().map(str::trim) {
            Some(url) if !url.is_empty() => {
                url::Url::parse(url).with_context(|| format!("Invalid refresh URL: {url}"))?;
                Ok(url.to_string())
            }
            _ => Ok(format!("{}/token/refresh/", self.base_url()?)),
        }
    }

    /// Log filter directive with precedence: env > config > "warn".
    pub fn log_filter(&self) -> String {
        std::env::var(LOG_ENV)
            .ok()
            .into_iter()
            .chain(std::iter::once(self.log.level.clone()))
            .map(|level| level.trim().to_string())
            .find(|level| !level.is_empty())
            .unwrap_or_else(|| "warn".to_string())
    }

    /// Request timeout as a `Duration`.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.api.timeout_secs.max(1))
    }

    /// Creates a config file with the default template.
    ///
    /// # Errors
    /// Returns an error if the file already exists or cannot be written.
    pub fn init(path: &Path) -> Result<()> {
        if path.exists() {
            anyhow::bail!("Config file already exists at {}", path.display());
        }

        Self::write_config(path, default_config_template())
    }

    /// Generates a fresh config TOML from Rust defaults.
    ///
    /// Uses the embedded template for structure/comments and merges
    /// generated values from `Config::default()` into it.
    ///
    /// # Errors
    /// Returns an error if the template or generated values fail to parse.
    pub fn generate() -> Result<String> {
        use toml_edit::DocumentMut;

        let generated_toml = toml::to_string(&Config::default())
            .context("Failed to serialize default config to TOML")?;

        let mut doc: DocumentMut = default_config_template()
            .parse()
            .context("Failed to parse default config template")?;
        let generated_doc: DocumentMut = generated_toml
            .parse()
            .context("Failed to parse generated config")?;

        merge_items(doc.as_table_mut(), generated_doc.as_table());

        Ok(doc.to_string())
    }

    /// Writes config content to a file, creating parent directories as needed.
    /// Uses atomic write (temp file + rename) to prevent corruption.
    fn write_config(path: &Path, content: &str) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {}", parent.display()))?;
        }

        let tmp_path = path.with_extension("toml.tmp");
        fs::write(&tmp_path, content)
            .with_context(|| format!("Failed to write config to {}", tmp_path.display()))?;
        fs::rename(&tmp_path, path).with_context(|| {
            format!(
                "Failed to rename {} to {}",
                tmp_path.display(),
                path.display()
            )
        })?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::tempdir;

    use super::*;

    #[test]
    fn test_load_missing_file_returns_defaults() {
        let dir = tempdir().unwrap();
        let config = Config::load_from(&dir.path().join("nonexistent.toml")).unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.api.timeout_secs, 30);
    }

    #[test]
    fn test_load_partial_config_merges_defaults() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("config.toml");
        fs::write(&config_path, "[api]\ntimeout_secs = 5\n").unwrap();

        let config = Config::load_from(&config_path).unwrap();
        assert_eq!(config.api.timeout_secs, 5);
        assert_eq!(config.api.base_url, Config::DEFAULT_BASE_URL);
        assert_eq!(config.log.level, "warn");
    }

    #[test]
    fn test_load_rejects_malformed_toml() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("config.toml");
        fs::write(&config_path, "[api\n").unwrap();

        let err = Config::load_from(&config_path).unwrap_err();
        assert!(format!("{err:#}").contains("Failed to parse config"));
    }

    #[test]
    fn test_init_creates_config_with_defaults() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("subdir").join("config.toml");

        Config::init(&config_path).unwrap();

        let contents = fs::read_to_string(&config_path).unwrap();
        assert!(contents.contains("base_url = \"http://localhost:8000/api\""));
        assert!(contents.contains("# refresh_url ="));
        let parsed = Config::load_from(&config_path).unwrap();
        assert_eq!(parsed, Config::default());
    }

    #[test]
    fn test_init_fails_if_exists() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("config.toml");
        fs::write(&config_path, "").unwrap();

        assert!(Config::init(&config_path).is_err());
    }

    #[test]
    fn test_generate_keeps_template_comments() {
        let generated = Config::generate().unwrap();
        assert!(generated.contains("# coursehub configuration"));
        assert!(generated.contains("timeout_secs = 30"));
    }

    #[test]
    fn test_refresh_url_defaults_to_base() {
        let mut config = Config::default();
        config.api.base_url = "http://example.test/api/".to_string();
        if std::env::var(API_URL_ENV).is_err() {
            assert_eq!(
                config.refresh_url().unwrap(),
                "http://example.test/api/token/refresh/"
            );
        }

        config.api.refresh_url = Some("http://auth.example.test/refresh/".to_string());
        assert_eq!(
            config.refresh_url().unwrap(),
            "http://auth.example.test/refresh/"
        );
    }

    #[test]
    fn test_log_filter_from_config() {
        if std::env::var(LOG_ENV).is_ok() {
            return;
        }
        let mut config = Config::default();
        assert_eq!(config.log_filter(), "warn");

        config.log.level = " coursehub_core=debug ".to_string();
        assert_eq!(config.log_filter(), "coursehub_core=debug");

        config.log.level = String::new();
        assert_eq!(config.log_filter(), "warn");
    }

    #[test]
    fn test_timeout_never_zero() {
        let mut config = Config::default();
        config.api.timeout_secs = 0;
        assert_eq!(config.timeout(), Duration::from_secs(1));
    }
}
