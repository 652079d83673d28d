//! Engine configuration, loadable from TOML.
//!
//! Every field has a default, so a file only needs the values it changes:
//!
//! ```toml
//! port_name = "/dev/ttyUSB0"
//! poll_interval_ms = 250
//! ```

use crate::constants::*;
use crate::error::{MountError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Serial and timing settings of the mount engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MountConfig {
    /// Serial device the mount is attached to
    pub port_name: String,

    /// Serial line speed, 8N1 framing
    pub baud_rate: u32,

    /// Serial read timeout
    pub timeout_ms: u64,

    /// Sleep between receive polls
    pub poll_interval_ms: u64,

    /// Capacity of the receive ring buffer
    pub receive_buffer_capacity: usize,

    /// Squared delta above which motion counts as slewing
    pub track_slew_threshold: f32,

    /// Repeat rate for hold-direction motion
    pub commands_per_second: u16,

    /// How long a host should wait for the first report before warning
    pub watchdog_timeout_ms: u64,
}

impl MountConfig {
    /// Parse a TOML document
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content)
            .map_err(|e| MountError::Config(format!("failed to parse config: {}", e)))
    }

    /// Load configuration from a TOML file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&content)
    }

    /// Serialize to a TOML document
    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self)
            .map_err(|e| MountError::Config(format!("failed to serialize config: {}", e)))
    }

    /// Sleep between receive polls as a `Duration`
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Host watchdog timeout as a `Duration`
    pub fn watchdog_timeout(&self) -> Duration {
        Duration::from_millis(self.watchdog_timeout_ms)
    }
}

impl Default for MountConfig {
    fn default() -> Self {
        Self {
            port_name: "/dev/ttyUSB0".to_string(),
            baud_rate: BAUD_RATE,
            timeout_ms: TIMEOUT_MS,
            poll_interval_ms: POLL_INTERVAL_MS,
            receive_buffer_capacity: RECEIVE_BUFFER_CAPACITY,
            track_slew_threshold: TRACK_SLEW_THRESHOLD,
            commands_per_second: COMMANDS_PER_SECOND,
            watchdog_timeout_ms: WATCHDOG_TIMEOUT_MS,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_file_keeps_defaults() {
        let config = MountConfig::from_toml_str(
            r#"
            port_name = "/dev/ttyACM0"
            poll_interval_ms = 250
            "#,
        )
        .unwrap();

        assert_eq!(config.port_name, "/dev/ttyACM0");
        assert_eq!(config.poll_interval(), Duration::from_millis(250));
        assert_eq!(config.baud_rate, 9600);
        assert_eq!(config.receive_buffer_capacity, 256);
        assert_eq!(config.track_slew_threshold, 0.0045);
    }

    #[test]
    fn test_round_trip_through_toml() {
        let mut config = MountConfig::default();
        config.commands_per_second = 4;
        let text = config.to_toml_string().unwrap();
        assert_eq!(MountConfig::from_toml_str(&text).unwrap(), config);
    }

    #[test]
    fn test_invalid_toml_is_config_error() {
        let err = MountConfig::from_toml_str("baud_rate = \"fast\"").unwrap_err();
        assert!(matches!(err, MountError::Config(_)));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = MountConfig::load_from_file("/nonexistent/exos2.toml").unwrap_err();
        assert!(matches!(err, MountError::Io(_)));
    }
}
