//! Configuration for the agent.

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

use hostpulse_common::{LoggingConfig, load_config};

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error(transparent)]
    Load(#[from] hostpulse_common::Error),
    #[error("Validation error: {0}")]
    Validation(String),
}

/// Complete agent configuration.
///
/// The agent name and destination are CLI arguments, not config; the file
/// only tunes collection and display behavior.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AgentConfig {
    /// What to print on the operator console.
    #[serde(default)]
    pub display: DisplayConfig,

    /// Collection settings.
    #[serde(default)]
    pub collect: CollectConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Console display flags.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DisplayConfig {
    /// Render the full snapshot each cycle (default: true).
    #[serde(default = "default_true")]
    pub snapshot: bool,

    /// Include the per-process table in the render (default: false).
    #[serde(default)]
    pub processes: bool,

    /// Echo the encoded wire payload (default: false).
    #[serde(default)]
    pub payload: bool,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            snapshot: true,
            processes: false,
            payload: false,
        }
    }
}

/// Collection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectConfig {
    /// Include the full per-process list in the transmitted record
    /// (default: false). The list grows with the host's process count and
    /// can push the payload past the practical UDP datagram size, so it is
    /// opt-in.
    #[serde(default)]
    pub process_list: bool,

    /// CPU load sampling window in milliseconds (default: 500). The
    /// collector blocks for two such windows per cycle, which bounds the
    /// loop period from below.
    #[serde(default = "default_sample_window_ms")]
    pub sample_window_ms: u64,

    /// Mount point whose total/free space is reported (default: "/").
    #[serde(default = "default_reference_mount")]
    pub reference_mount: String,
}

impl Default for CollectConfig {
    fn default() -> Self {
        Self {
            process_list: false,
            sample_window_ms: default_sample_window_ms(),
            reference_mount: default_reference_mount(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_sample_window_ms() -> u64 {
    500
}

fn default_reference_mount() -> String {
    "/".to_string()
}

impl AgentConfig {
    /// Load configuration from a JSON5 file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let config: AgentConfig = load_config(path)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.collect.sample_window_ms == 0 {
            return Err(ConfigError::Validation(
                "collect.sample_window_ms must be > 0".to_string(),
            ));
        }
        if self.collect.reference_mount.is_empty() {
            return Err(ConfigError::Validation(
                "collect.reference_mount must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hostpulse_common::parse_config;

    #[test]
    fn test_parse_minimal_config() {
        let config: AgentConfig = parse_config("{}").unwrap();
        config.validate().unwrap();

        assert!(config.display.snapshot);
        assert!(!config.display.processes);
        assert!(!config.display.payload);
        assert!(!config.collect.process_list);
        assert_eq!(config.collect.sample_window_ms, 500);
        assert_eq!(config.collect.reference_mount, "/");
    }

    #[test]
    fn test_parse_full_config() {
        let json = r#"{
            display: {
                snapshot: false,
                processes: true,
                payload: true,
            },
            collect: {
                process_list: true,
                sample_window_ms: 250,
                reference_mount: "/home",
            },
            logging: {
                level: "debug",
            },
        }"#;

        let config: AgentConfig = parse_config(json).unwrap();
        config.validate().unwrap();

        assert!(!config.display.snapshot);
        assert!(config.display.processes);
        assert!(config.collect.process_list);
        assert_eq!(config.collect.sample_window_ms, 250);
        assert_eq!(config.collect.reference_mount, "/home");
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn test_validate_zero_sample_window() {
        let config: AgentConfig = parse_config("{ collect: { sample_window_ms: 0 } }").unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_empty_reference_mount() {
        let config: AgentConfig = parse_config(r#"{ collect: { reference_mount: "" } }"#).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_from_file() {
        let path = std::env::temp_dir().join("hostpulse-agent-config-test.json5");
        std::fs::write(&path, "{ collect: { sample_window_ms: 250 } }").unwrap();

        let config = AgentConfig::load(&path).unwrap();
        assert_eq!(config.collect.sample_window_ms, 250);

        std::fs::remove_file(&path).unwrap();
        assert!(matches!(
            AgentConfig::load(&path),
            Err(ConfigError::Load(_))
        ));
    }
}
