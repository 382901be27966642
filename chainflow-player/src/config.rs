//! Player configuration.
//!
//! Configuration is loaded in the following order (later overrides earlier):
//! 1. Default values
//! 2. YAML config file (if specified via CHAINFLOW_CONFIG or --config)
//! 3. Environment variables

use chainflow_core::{Catalog, CoreError, Terminal, Timing};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Player configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Playback timing.
    pub timing: TimingConfig,
    /// Scenario catalog source.
    pub catalog: CatalogConfig,
    /// Player behavior.
    pub player: PlayerConfig,
}

impl Config {
    /// Loads configuration from CHAINFLOW_CONFIG (if set), then applies
    /// environment variable overrides.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_with(std::env::var("CHAINFLOW_CONFIG").ok().map(PathBuf::from))
    }

    /// Loads configuration from `path` (if any), then applies environment
    /// variable overrides.
    pub fn load_with(path: Option<PathBuf>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => Self::from_file(&path)?,
            None => Self::default(),
        };
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Loads configuration from a YAML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::IoError(path.to_path_buf(), e))?;
        let config: Config = serde_yaml::from_str(&content)
            .map_err(|e| ConfigError::ParseError(path.to_path_buf(), e.to_string()))?;
        Ok(config)
    }

    /// Saves configuration to a YAML file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let content = serde_yaml::to_string(self)
            .map_err(|e| ConfigError::ParseError(path.to_path_buf(), e.to_string()))?;
        std::fs::write(path, content).map_err(|e| ConfigError::IoError(path.to_path_buf(), e))?;
        Ok(())
    }

    fn apply_env_overrides(&mut self) {
        self.apply_overrides(|name| std::env::var(name).ok());
    }

    /// Applies overrides from a variable lookup.
    pub fn apply_overrides(&mut self, var: impl Fn(&str) -> Option<String>) {
        self.timing.apply_overrides(&var);
        self.catalog.apply_overrides(&var);
        self.player.apply_overrides(&var);
    }

    /// Validates configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.timing.step_interval_ms == 0 {
            return Err(ConfigError::ValidationError(
                "timing.step_interval_ms must be greater than zero".to_string(),
            ));
        }
        if self.player.channel_capacity == 0 {
            return Err(ConfigError::ValidationError(
                "player.channel_capacity must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

/// Behavior after the last step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TerminalPolicy {
    /// Stay on the final step.
    Park,
    /// Reset to the base graph after `settle_delay_ms`.
    #[default]
    Settle,
}

/// Playback timing configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    /// Delay before step 0 in milliseconds.
    pub start_delay_ms: u64,
    /// Gap between steps in milliseconds.
    pub step_interval_ms: u64,
    /// Terminal behavior.
    pub terminal: TerminalPolicy,
    /// Delay before resetting, used with `terminal: settle`.
    pub settle_delay_ms: u64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            start_delay_ms: 200,
            step_interval_ms: 700,
            terminal: TerminalPolicy::Settle,
            settle_delay_ms: 1000,
        }
    }
}

impl TimingConfig {
    fn apply_overrides(&mut self, var: &impl Fn(&str) -> Option<String>) {
        if let Some(ms) = var("CHAINFLOW_START_DELAY_MS").and_then(|v| v.parse().ok()) {
            self.start_delay_ms = ms;
        }

        if let Some(ms) = var("CHAINFLOW_STEP_INTERVAL_MS").and_then(|v| v.parse().ok()) {
            self.step_interval_ms = ms;
        }

        if let Some(policy) = var("CHAINFLOW_TERMINAL") {
            self.terminal = match policy.to_lowercase().as_str() {
                "park" => TerminalPolicy::Park,
                _ => TerminalPolicy::Settle,
            };
        }

        if let Some(ms) = var("CHAINFLOW_SETTLE_DELAY_MS").and_then(|v| v.parse().ok()) {
            self.settle_delay_ms = ms;
        }
    }

    /// Returns the playback timing.
    pub fn to_timing(&self) -> Timing {
        let terminal = match self.terminal {
            TerminalPolicy::Park => Terminal::Park,
            TerminalPolicy::Settle => Terminal::Settle {
                delay: Duration::from_millis(self.settle_delay_ms),
            },
        };
        Timing {
            start_delay: Duration::from_millis(self.start_delay_ms),
            step_interval: Duration::from_millis(self.step_interval_ms),
            terminal,
        }
    }
}

/// Scenario catalog configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    /// Catalog document (YAML or JSON). The built-in catalog is used when unset.
    pub path: Option<PathBuf>,
}

impl CatalogConfig {
    fn apply_overrides(&mut self, var: &impl Fn(&str) -> Option<String>) {
        if let Some(path) = var("CHAINFLOW_CATALOG") {
            if !path.is_empty() {
                self.path = Some(PathBuf::from(path));
            }
        }
    }

    /// Loads the configured catalog.
    pub fn load(&self) -> Result<Catalog, CoreError> {
        match &self.path {
            Some(path) => Catalog::from_file(path),
            None => Ok(Catalog::builtin()),
        }
    }
}

/// Player behavior configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    /// Scenario played on startup (none = empty canvas).
    pub default_scenario: Option<String>,
    /// Frame channel capacity per subscriber.
    pub channel_capacity: usize,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            default_scenario: Some("mint".to_string()),
            channel_capacity: 64,
        }
    }
}

impl PlayerConfig {
    fn apply_overrides(&mut self, var: &impl Fn(&str) -> Option<String>) {
        if let Some(key) = var("CHAINFLOW_DEFAULT_SCENARIO") {
            self.default_scenario = if key.is_empty() || key == "none" {
                None
            } else {
                Some(key)
            };
        }

        if let Some(n) = var("CHAINFLOW_CHANNEL_CAPACITY").and_then(|v| v.parse().ok()) {
            self.channel_capacity = n;
        }
    }
}

/// Configuration error.
#[derive(Debug)]
pub enum ConfigError {
    IoError(PathBuf, std::io::Error),
    ParseError(PathBuf, String),
    ValidationError(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::IoError(path, e) => {
                write!(f, "failed to read config file '{}': {}", path.display(), e)
            }
            ConfigError::ParseError(path, e) => {
                write!(f, "failed to parse config file '{}': {}", path.display(), e)
            }
            ConfigError::ValidationError(msg) => {
                write!(f, "configuration validation failed: {}", msg)
            }
        }
    }
}

impl std::error::Error for ConfigError {}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name: &str| vars.get(name).cloned()
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.timing.step_interval_ms, 700);
        assert_eq!(config.timing.terminal, TerminalPolicy::Settle);
        assert_eq!(config.player.default_scenario.as_deref(), Some("mint"));
        assert!(config.catalog.path.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_to_timing() {
        let timing = TimingConfig::default().to_timing();
        assert_eq!(timing, Timing::staggered());

        let parked = TimingConfig {
            start_delay_ms: 0,
            step_interval_ms: 4000,
            terminal: TerminalPolicy::Park,
            settle_delay_ms: 1000,
        };
        assert_eq!(
            parked.to_timing(),
            Timing::fixed(Duration::from_millis(4000))
        );
    }

    #[test]
    fn test_env_overrides() {
        let mut config = Config::default();
        config.apply_overrides(lookup(&[
            ("CHAINFLOW_STEP_INTERVAL_MS", "4000"),
            ("CHAINFLOW_TERMINAL", "park"),
            ("CHAINFLOW_DEFAULT_SCENARIO", "none"),
            ("CHAINFLOW_CATALOG", "/tmp/catalog.yaml"),
            ("CHAINFLOW_CHANNEL_CAPACITY", "not-a-number"),
        ]));

        assert_eq!(config.timing.step_interval_ms, 4000);
        assert_eq!(config.timing.terminal, TerminalPolicy::Park);
        assert!(config.player.default_scenario.is_none());
        assert_eq!(
            config.catalog.path,
            Some(PathBuf::from("/tmp/catalog.yaml"))
        );
        assert_eq!(config.player.channel_capacity, 64);
    }

    #[test]
    fn test_validation() {
        let mut config = Config::default();
        config.timing.step_interval_ms = 0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::ValidationError(_))
        ));
    }

    #[test]
    fn test_yaml_partial() {
        let yaml = "timing:\n  terminal: park\n  step_interval_ms: 4000\n";
        let config: Config = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.timing.terminal, TerminalPolicy::Park);
        assert_eq!(config.timing.start_delay_ms, 200);
        assert_eq!(config.player.channel_capacity, 64);
    }

    #[test]
    fn test_save_and_load_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("chainflow.yaml");

        let mut config = Config::default();
        config.timing.settle_delay_ms = 2500;
        config.save(&path).unwrap();

        let loaded = Config::from_file(&path).unwrap();
        assert_eq!(loaded.timing.settle_delay_ms, 2500);

        let missing = Config::from_file(dir.path().join("missing.yaml"));
        assert!(matches!(missing, Err(ConfigError::IoError(..))));
    }

    #[test]
    fn test_catalog_config_builtin() {
        let catalog = CatalogConfig::default().load().unwrap();
        assert_eq!(catalog.len(), 5);
    }
}
