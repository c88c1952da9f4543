//! Service configuration
//!
//! Supports loading config from:
//! - Environment variables
//! - An explicit `--config` file, else `./code-quality.toml`,
//!   else `~/.config/code-quality/config.toml`
//!
//! Every key is optional; accessors fall back to built-in defaults.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// File name looked up in the working directory
pub const LOCAL_CONFIG_FILE: &str = "code-quality.toml";

#[derive(Debug, Default, Clone, Deserialize, Serialize)]
pub struct ServiceConfig {
    #[serde(default)]
    pub server: ServerSettings,
    #[serde(default)]
    pub store: StoreSettings,
    #[serde(default)]
    pub analysis: AnalysisSettings,
}

#[derive(Debug, Default, Clone, Deserialize, Serialize)]
pub struct ServerSettings {
    /// Listen address (default: 0.0.0.0:8000)
    pub bind: Option<String>,

    /// The one frontend origin allowed by CORS (default: http://localhost:5173)
    pub allowed_origin: Option<String>,

    /// Upload size limit in bytes (default: 5 MiB)
    pub max_upload_bytes: Option<usize>,

    /// Required file name suffix for uploads (default: .py)
    pub source_extension: Option<String>,
}

#[derive(Debug, Default, Clone, Deserialize, Serialize)]
pub struct StoreSettings {
    /// Whether results are persisted at all (default: true)
    pub enabled: Option<bool>,

    /// MongoDB connection string (default: mongodb://localhost:27017)
    pub uri: Option<String>,

    /// Database name (default: code_quality)
    pub database: Option<String>,

    /// Collection name (default: reports)
    pub collection: Option<String>,

    /// Server selection / connect timeout in seconds (default: 5)
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Clone, Deserialize, Serialize)]
pub struct AnalysisSettings {
    /// Command prefix for pylint (default: ["pylint"])
    pub pylint_command: Option<Vec<String>>,

    /// Command prefix for radon (default: ["radon"])
    pub radon_command: Option<Vec<String>>,

    /// Per-tool timeout in seconds (default: 60)
    pub timeout_secs: Option<u64>,

    /// Substitute example findings when pylint reports nothing (default: true)
    pub placeholder_findings: Option<bool>,

    /// Extra pylint checks to enable
    pub pylint_enable: Option<Vec<String>>,

    /// Pylint checks to disable
    pub pylint_disable: Option<Vec<String>>,
}

impl ServerSettings {
    pub fn bind(&self) -> &str {
        self.bind.as_deref().unwrap_or("0.0.0.0:8000")
    }

    pub fn allowed_origin(&self) -> &str {
        self.allowed_origin
            .as_deref()
            .unwrap_or("http://localhost:5173")
    }

    pub fn max_upload_bytes(&self) -> usize {
        self.max_upload_bytes.unwrap_or(5 * 1024 * 1024)
    }

    pub fn source_extension(&self) -> &str {
        self.source_extension.as_deref().unwrap_or(".py")
    }

    fn merge(&mut self, other: ServerSettings) {
        if other.bind.is_some() {
            self.bind = other.bind;
        }
        if other.allowed_origin.is_some() {
            self.allowed_origin = other.allowed_origin;
        }
        if other.max_upload_bytes.is_some() {
            self.max_upload_bytes = other.max_upload_bytes;
        }
        if other.source_extension.is_some() {
            self.source_extension = other.source_extension;
        }
    }
}

impl StoreSettings {
    pub fn enabled(&self) -> bool {
        self.enabled.unwrap_or(true)
    }

    pub fn uri(&self) -> &str {
        self.uri.as_deref().unwrap_or("mongodb://localhost:27017")
    }

    pub fn database(&self) -> &str {
        self.database.as_deref().unwrap_or("code_quality")
    }

    pub fn collection(&self) -> &str {
        self.collection.as_deref().unwrap_or("reports")
    }

    pub fn timeout_secs(&self) -> u64 {
        self.timeout_secs.unwrap_or(5)
    }

    fn merge(&mut self, other: StoreSettings) {
        if other.enabled.is_some() {
            self.enabled = other.enabled;
        }
        if other.uri.is_some() {
            self.uri = other.uri;
        }
        if other.database.is_some() {
            self.database = other.database;
        }
        if other.collection.is_some() {
            self.collection = other.collection;
        }
        if other.timeout_secs.is_some() {
            self.timeout_secs = other.timeout_secs;
        }
    }
}

impl AnalysisSettings {
    pub fn pylint_command(&self) -> Vec<String> {
        self.pylint_command
            .clone()
            .filter(|c| !c.is_empty())
            .unwrap_or_else(|| vec!["pylint".to_string()])
    }

    pub fn radon_command(&self) -> Vec<String> {
        self.radon_command
            .clone()
            .filter(|c| !c.is_empty())
            .unwrap_or_else(|| vec!["radon".to_string()])
    }

    pub fn timeout_secs(&self) -> u64 {
        self.timeout_secs.unwrap_or(60)
    }

    pub fn placeholder_findings(&self) -> bool {
        self.placeholder_findings.unwrap_or(true)
    }

    fn merge(&mut self, other: AnalysisSettings) {
        if other.pylint_command.is_some() {
            self.pylint_command = other.pylint_command;
        }
        if other.radon_command.is_some() {
            self.radon_command = other.radon_command;
        }
        if other.timeout_secs.is_some() {
            self.timeout_secs = other.timeout_secs;
        }
        if other.placeholder_findings.is_some() {
            self.placeholder_findings = other.placeholder_findings;
        }
        if other.pylint_enable.is_some() {
            self.pylint_enable = other.pylint_enable;
        }
        if other.pylint_disable.is_some() {
            self.pylint_disable = other.pylint_disable;
        }
    }
}

impl ServiceConfig {
    /// Load config from all sources, with priority:
    /// 1. Environment variables (highest)
    /// 2. `explicit` file if given (must exist and parse), otherwise the
    ///    first of `./code-quality.toml` and the user config file
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let mut config = ServiceConfig::default();

        match explicit {
            Some(path) => config.merge(Self::from_file(path)?),
            None => {
                let discovered = [Some(PathBuf::from(LOCAL_CONFIG_FILE)), Self::user_config_path()]
                    .into_iter()
                    .flatten()
                    .find(|p| p.is_file());
                if let Some(path) = discovered {
                    match Self::from_file(&path) {
                        Ok(file_config) => config.merge(file_config),
                        Err(e) => warn!("Ignoring config file: {:#}", e),
                    }
                }
            }
        }

        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Parse a single TOML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let config = toml::from_str(&content)
            .with_context(|| format!("failed to parse {}", path.display()))?;
        debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Get the user config file path
    pub fn user_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("code-quality").join("config.toml"))
    }

    /// Merge another config into this one (other takes priority)
    fn merge(&mut self, other: ServiceConfig) {
        self.server.merge(other.server);
        self.store.merge(other.store);
        self.analysis.merge(other.analysis);
    }

    /// Environment variables override everything
    fn apply_env(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(bind) = var("CODE_QUALITY_BIND") {
            self.server.bind = Some(bind);
        }
        if let Some(origin) = var("CODE_QUALITY_ALLOWED_ORIGIN") {
            self.server.allowed_origin = Some(origin);
        }
        if let Some(uri) = var("CODE_QUALITY_MONGO_URI") {
            self.store.uri = Some(uri);
        }
        if let Some(enabled) = var("CODE_QUALITY_STORE_ENABLED") {
            match enabled.trim().to_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => self.store.enabled = Some(true),
                "0" | "false" | "no" | "off" => self.store.enabled = Some(false),
                other => warn!("Ignoring CODE_QUALITY_STORE_ENABLED={}", other),
            }
        }
    }

    /// Write a commented example config to `path` unless one exists
    pub fn init_config(path: &Path) -> Result<bool> {
        if path.exists() {
            return Ok(false);
        }
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let example = r#"# Code quality service configuration

[server]
# bind = "0.0.0.0:8000"
# allowed_origin = "http://localhost:5173"
# max_upload_bytes = 5242880
# source_extension = ".py"

[store]
# enabled = true
# uri = "mongodb://localhost:27017"
# database = "code_quality"
# collection = "reports"
# timeout_secs = 5

[analysis]
# pylint_command = ["pylint"]          # or ["python3", "-m", "pylint"]
# radon_command = ["radon"]
# timeout_secs = 60
# placeholder_findings = true
# pylint_enable = ["missing-function-docstring", "unused-variable", "unused-import", "invalid-name"]
# pylint_disable = ["missing-module-docstring", "too-few-public-methods"]
"#;
        std::fs::write(path, example)
            .with_context(|| format!("failed to write {}", path.display()))?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_default_config() {
        let config = ServiceConfig::default();
        assert_eq!(config.server.bind(), "0.0.0.0:8000");
        assert_eq!(config.server.allowed_origin(), "http://localhost:5173");
        assert_eq!(config.server.source_extension(), ".py");
        assert_eq!(config.server.max_upload_bytes(), 5 * 1024 * 1024);
        assert!(config.store.enabled());
        assert_eq!(config.store.uri(), "mongodb://localhost:27017");
        assert_eq!(config.store.database(), "code_quality");
        assert_eq!(config.store.collection(), "reports");
        assert_eq!(config.analysis.pylint_command(), vec!["pylint"]);
        assert_eq!(config.analysis.radon_command(), vec!["radon"]);
        assert_eq!(config.analysis.timeout_secs(), 60);
        assert!(config.analysis.placeholder_findings());
    }

    #[test]
    fn test_toml_parsing() {
        let toml_str = r#"
[server]
bind = "127.0.0.1:9000"

[store]
enabled = false
collection = "runs"

[analysis]
pylint_command = ["python3", "-m", "pylint"]
placeholder_findings = false
"#;
        let config: ServiceConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.server.bind(), "127.0.0.1:9000");
        assert!(!config.store.enabled());
        assert_eq!(config.store.collection(), "runs");
        assert_eq!(config.store.database(), "code_quality");
        assert_eq!(
            config.analysis.pylint_command(),
            vec!["python3", "-m", "pylint"]
        );
        assert!(!config.analysis.placeholder_findings());
    }

    #[test]
    fn test_toml_parsing_minimal() {
        let config: ServiceConfig = toml::from_str("").unwrap();
        assert_eq!(config.server.bind(), "0.0.0.0:8000");
    }

    #[test]
    fn test_empty_command_falls_back() {
        let config: ServiceConfig = toml::from_str("[analysis]\nradon_command = []").unwrap();
        assert_eq!(config.analysis.radon_command(), vec!["radon"]);
    }

    #[test]
    fn test_invalid_toml_is_rejected() {
        let result = toml::from_str::<ServiceConfig>("this is [[ not valid toml {{{}}}");
        assert!(result.is_err());
    }

    #[test]
    fn test_merge_overrides_set_fields_only() {
        let mut base: ServiceConfig =
            toml::from_str("[server]\nbind = \"a:1\"\nallowed_origin = \"http://x\"").unwrap();
        let other: ServiceConfig = toml::from_str("[server]\nbind = \"b:2\"").unwrap();
        base.merge(other);
        assert_eq!(base.server.bind(), "b:2");
        assert_eq!(base.server.allowed_origin(), "http://x");
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            ("CODE_QUALITY_BIND", "127.0.0.1:1234"),
            ("CODE_QUALITY_MONGO_URI", "mongodb://db:27017"),
            ("CODE_QUALITY_STORE_ENABLED", "off"),
        ]
        .into_iter()
        .collect();
        let mut config = ServiceConfig::default();
        config.apply_env(|k| env.get(k).map(|v| v.to_string()));
        assert_eq!(config.server.bind(), "127.0.0.1:1234");
        assert_eq!(config.store.uri(), "mongodb://db:27017");
        assert!(!config.store.enabled());
        assert_eq!(config.server.allowed_origin(), "http://localhost:5173");
    }

    #[test]
    fn test_explicit_file_must_exist() {
        let dir = tempfile::tempdir().unwrap();
        assert!(ServiceConfig::load(Some(&dir.path().join("missing.toml"))).is_err());
    }

    #[test]
    fn test_init_writes_parseable_example() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("code-quality.toml");
        assert!(ServiceConfig::init_config(&path).unwrap());
        assert!(!ServiceConfig::init_config(&path).unwrap());

        let config = ServiceConfig::from_file(&path).unwrap();
        assert_eq!(config.server.bind(), "0.0.0.0:8000");
    }

    #[test]
    fn test_user_config_path_returns_some() {
        if let Some(p) = ServiceConfig::user_config_path() {
            assert!(p.ends_with("code-quality/config.toml"));
        }
    }
}
