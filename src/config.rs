//! Application configuration.
//!
//! The configuration is loaded from a JSON file, either the path given with
//! `--config <path>` or `$XDG_CONFIG_HOME/dynadesk/config.json`.  Every
//! section is optional, so a minimal `{}` file is valid.
//!
//! # Example
//!
//! ```json
//! {
//!   "desktops": { "minimum": 2, "label": "Dynamic" },
//!   "backend": "auto",
//!   "log_level": "info"
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// Top-level configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Desktop count policy.
    pub desktops: DesktopConfig,

    /// Which host backend to drive.
    pub backend: BackendChoice,

    /// Default `env_logger` filter, used when `RUST_LOG` is not set.
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            desktops: DesktopConfig::default(),
            backend: BackendChoice::Auto,
            log_level: "info".into(),
        }
    }
}

/// Desktop count policy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DesktopConfig {
    /// Never drop below this many desktops.  Default: `2`.
    pub minimum: usize,
    /// Name given to desktops created by dynadesk.  Default: `"Dynamic"`.
    pub label: String,
}

impl Default for DesktopConfig {
    fn default() -> Self {
        Self {
            minimum: 2,
            label: "Dynamic".into(),
        }
    }
}

/// Backend selection.  `Auto` probes the environment at startup.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendChoice {
    #[default]
    Auto,
    Hyprland,
    Ewmh,
}

impl fmt::Display for BackendChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendChoice::Auto => write!(f, "auto"),
            BackendChoice::Hyprland => write!(f, "hyprland"),
            BackendChoice::Ewmh => write!(f, "ewmh"),
        }
    }
}

impl Config {
    /// Load configuration from a JSON file at `path`.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError(format!("failed to read {}: {}", path.display(), e)))?;
        let config: Self = serde_json::from_str(&contents)
            .map_err(|e| ConfigError(format!("failed to parse {}: {}", path.display(), e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings the controller cannot honour.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.desktops.minimum < 1 {
            return Err(ConfigError("desktops.minimum must be at least 1".into()));
        }
        Ok(())
    }
}

/// Error from loading or parsing a configuration file.
#[derive(Debug, thiserror::Error)]
#[error("config error: {0}")]
pub struct ConfigError(String);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserialize_full_config() {
        let json = r#"{
            "desktops": { "minimum": 3, "label": "Extra" },
            "backend": "ewmh",
            "log_level": "debug"
        }"#;
        let cfg: Config = serde_json::from_str(json).unwrap();
        assert_eq!(cfg.desktops.minimum, 3);
        assert_eq!(cfg.desktops.label, "Extra");
        assert_eq!(cfg.backend, BackendChoice::Ewmh);
        assert_eq!(cfg.log_level, "debug");
    }

    #[test]
    fn deserialize_empty_uses_defaults() {
        let cfg: Config = serde_json::from_str("{}").unwrap();
        assert_eq!(cfg.desktops, DesktopConfig::default());
        assert_eq!(cfg.desktops.minimum, 2);
        assert_eq!(cfg.desktops.label, "Dynamic");
        assert_eq!(cfg.backend, BackendChoice::Auto);
        assert_eq!(cfg.log_level, "info");
    }

    #[test]
    fn deserialize_partial_desktops() {
        let cfg: Config = serde_json::from_str(r#"{ "desktops": { "minimum": 4 } }"#).unwrap();
        assert_eq!(cfg.desktops.minimum, 4);
        assert_eq!(cfg.desktops.label, "Dynamic");
    }

    #[test]
    fn unknown_backend_is_rejected() {
        let result = serde_json::from_str::<Config>(r#"{ "backend": "kwin" }"#);
        assert!(result.is_err());
    }

    #[test]
    fn unknown_top_level_keys_ignored() {
        let json = r#"{ "desktops": {}, "future_section": { "key": 42 } }"#;
        let _cfg: Config = serde_json::from_str(json).unwrap();
    }

    #[test]
    fn zero_minimum_fails_validation() {
        let cfg: Config = serde_json::from_str(r#"{ "desktops": { "minimum": 0 } }"#).unwrap();
        assert!(cfg.validate().is_err());
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn load_reports_missing_file() {
        let path = std::env::temp_dir().join(format!("dynadesk-missing-{}.json", std::process::id()));
        let err = Config::load(&path).unwrap_err();
        assert!(err.to_string().contains("failed to read"));
    }

    #[test]
    fn load_reads_file_from_disk() {
        let path = std::env::temp_dir().join(format!("dynadesk-config-{}.json", std::process::id()));
        std::fs::write(&path, r#"{ "desktops": { "minimum": 3 }, "backend": "hyprland" }"#).unwrap();
        let cfg = Config::load(&path).unwrap();
        assert_eq!(cfg.desktops.minimum, 3);
        assert_eq!(cfg.backend, BackendChoice::Hyprland);
        let _ = std::fs::remove_file(&path);
    }
}
