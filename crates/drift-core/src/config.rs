//! Application configuration
//!
//! Configuration is loaded from:
//! 1. Default values
//! 2. Config file (~/.config/drift/config.toml)
//! 3. Environment variables (DRIFT_* prefix)
//!
//! Environment variables take precedence over config file values.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::sync::CoordinatorConfig;

/// Environment variable prefix
const ENV_PREFIX: &str = "DRIFT";

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// URL of the agent script to install
    #[serde(default = "default_agent_script")]
    pub agent_script: String,

    /// Scope (path prefix) the agent controls
    #[serde(default = "default_agent_scope")]
    pub agent_scope: String,

    /// Name of the sync task re-registered when connectivity returns
    #[serde(default = "default_sync_tag")]
    pub sync_tag: String,

    /// Whether offline sync is enabled
    #[serde(default = "default_sync_enabled")]
    pub sync_enabled: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            agent_script: default_agent_script(),
            agent_scope: default_agent_scope(),
            sync_tag: default_sync_tag(),
            sync_enabled: default_sync_enabled(),
        }
    }
}

impl Config {
    /// Load configuration from the default location and environment
    ///
    /// Order of precedence (highest to lowest):
    /// 1. Environment variables (DRIFT_AGENT_SCRIPT, DRIFT_AGENT_SCOPE,
    ///    DRIFT_SYNC_TAG, DRIFT_SYNC_ENABLED)
    /// 2. Config file (~/.config/drift/config.toml or DRIFT_CONFIG)
    /// 3. Default values
    pub fn load() -> Result<Self> {
        Self::load_from_path(&Self::config_file_path())
    }

    /// Load configuration from a specific path
    ///
    /// Environment variables are still applied as overrides. If the file
    /// doesn't exist, defaults are used.
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let mut config = if path.exists() {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file: {:?}", path))?;
            toml::from_str(&content)
                .with_context(|| format!("Failed to parse config file: {:?}", path))?
        } else {
            Self::default()
        };

        config.apply_env_overrides();
        Ok(config)
    }

    /// Load configuration from a TOML string (useful for testing)
    pub fn load_from_str(toml_content: &str) -> Result<Self> {
        let mut config: Config =
            toml::from_str(toml_content).context("Failed to parse config TOML")?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Apply environment variable overrides
    fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var(format!("{}_AGENT_SCRIPT", ENV_PREFIX)) {
            self.agent_script = val;
        }

        if let Ok(val) = std::env::var(format!("{}_AGENT_SCOPE", ENV_PREFIX)) {
            self.agent_scope = val;
        }

        if let Ok(val) = std::env::var(format!("{}_SYNC_TAG", ENV_PREFIX)) {
            self.sync_tag = val;
        }

        if let Ok(val) = std::env::var(format!("{}_SYNC_ENABLED", ENV_PREFIX)) {
            self.sync_enabled = val.eq_ignore_ascii_case("true") || val == "1";
        }
    }

    /// Save configuration to the default location
    pub fn save(&self) -> Result<()> {
        self.save_to_path(&Self::config_file_path())
    }

    /// Save configuration to a specific path
    pub fn save_to_path(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory: {:?}", parent))?;
        }

        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {:?}", path))?;
        Ok(())
    }

    /// Get the config file path
    ///
    /// Can be overridden with the DRIFT_CONFIG environment variable
    pub fn config_file_path() -> PathBuf {
        if let Ok(path) = std::env::var(format!("{}_CONFIG", ENV_PREFIX)) {
            return PathBuf::from(path);
        }

        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("drift")
            .join("config.toml")
    }

    /// Coordinator settings derived from this configuration
    pub fn coordinator_config(&self) -> CoordinatorConfig {
        CoordinatorConfig {
            script_url: self.agent_script.clone(),
            scope: self.agent_scope.clone(),
            sync_tag: self.sync_tag.clone(),
        }
    }
}

fn default_agent_script() -> String {
    "/service-worker.js".to_string()
}

fn default_agent_scope() -> String {
    "/".to_string()
}

fn default_sync_tag() -> String {
    "flush-pending".to_string()
}

fn default_sync_enabled() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::sync::Mutex;

    // Mutex to serialize tests that touch environment variables
    static ENV_MUTEX: Mutex<()> = Mutex::new(());

    /// Guard that locks env access and saves/restores env vars
    struct EnvGuard<'a> {
        _lock: std::sync::MutexGuard<'a, ()>,
        saved: Vec<(String, Option<String>)>,
    }

    impl<'a> EnvGuard<'a> {
        fn new(vars: &[&str]) -> Self {
            let lock = ENV_MUTEX.lock().unwrap();
            let saved = vars
                .iter()
                .map(|&name| (name.to_string(), env::var(name).ok()))
                .collect();
            for name in vars {
                env::remove_var(name);
            }
            Self { _lock: lock, saved }
        }
    }

    impl Drop for EnvGuard<'_> {
        fn drop(&mut self) {
            for (name, value) in &self.saved {
                match value {
                    Some(v) => env::set_var(name, v),
                    None => env::remove_var(name),
                }
            }
        }
    }

    const ENV_VARS: &[&str] = &[
        "DRIFT_AGENT_SCRIPT",
        "DRIFT_AGENT_SCOPE",
        "DRIFT_SYNC_TAG",
        "DRIFT_SYNC_ENABLED",
    ];

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.agent_script, "/service-worker.js");
        assert_eq!(config.agent_scope, "/");
        assert_eq!(config.sync_tag, "flush-pending");
        assert!(config.sync_enabled);
    }

    #[test]
    fn test_load_from_str() {
        let _guard = EnvGuard::new(ENV_VARS);

        let config = Config::load_from_str(
            r#"
            agent_script = "/worker.js"
            sync_enabled = false
            "#,
        )
        .unwrap();

        assert_eq!(config.agent_script, "/worker.js");
        assert!(!config.sync_enabled);
        // Unspecified fields fall back to defaults
        assert_eq!(config.agent_scope, "/");
    }

    #[test]
    fn test_env_override_agent_script() {
        let _guard = EnvGuard::new(ENV_VARS);

        let mut config = Config::default();
        env::set_var("DRIFT_AGENT_SCRIPT", "/custom-agent.js");
        config.apply_env_overrides();

        assert_eq!(config.agent_script, "/custom-agent.js");
    }

    #[test]
    fn test_env_override_sync_enabled() {
        let _guard = EnvGuard::new(ENV_VARS);

        let mut config = Config::default();

        env::set_var("DRIFT_SYNC_ENABLED", "false");
        config.apply_env_overrides();
        assert!(!config.sync_enabled);

        env::set_var("DRIFT_SYNC_ENABLED", "1");
        config.apply_env_overrides();
        assert!(config.sync_enabled);
    }

    #[test]
    fn test_save_and_reload() {
        let _guard = EnvGuard::new(ENV_VARS);

        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("config.toml");

        let mut config = Config::default();
        config.sync_tag = "retry-queue".to_string();
        config.save_to_path(&path).unwrap();

        let reloaded = Config::load_from_path(&path).unwrap();
        assert_eq!(reloaded.sync_tag, "retry-queue");
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let _guard = EnvGuard::new(ENV_VARS);

        let config = Config::load_from_path(Path::new("/nonexistent/config.toml")).unwrap();
        assert_eq!(config.agent_script, "/service-worker.js");
    }

    #[test]
    fn test_coordinator_config_conversion() {
        let config = Config::default();
        let coordinator = config.coordinator_config();

        assert_eq!(coordinator.script_url, config.agent_script);
        assert_eq!(coordinator.scope, config.agent_scope);
        assert_eq!(coordinator.sync_tag, config.sync_tag);
    }
}
