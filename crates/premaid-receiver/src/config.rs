//! Receiver configuration.
//!
//! Loaded from YAML; every field is optional and falls back to its default.
//!
//! ```yaml
//! bridge_path: ./PreMaidSerialBridge.exe
//! port: COM3
//! poll_interval_secs: 0.2
//! continuous: true
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use premaid_protocol::{Joint, ServoId};
use serde::{Deserialize, Serialize};

use crate::error::{ReceiverError, ReceiverResult};
use crate::scheduler::{DEFAULT_MAX_CATCHUP, DEFAULT_POLL_INTERVAL};

/// Configuration for the receiver and its bridge link.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ReceiverConfig {
    /// Serial bridge executable.
    pub bridge_path: Option<PathBuf>,
    /// Serial port to open through the bridge (e.g. `COM3`, `/dev/ttyUSB0`).
    pub port: Option<String>,
    /// Seconds between continuous-mode requests.
    pub poll_interval_secs: f64,
    /// Milliseconds between poll loop ticks.
    pub tick_interval_ms: u64,
    /// Most requests a single tick may issue after a stall.
    pub max_catchup_requests: u32,
    /// Start in continuous mode.
    pub continuous: bool,
    /// Track only fitted joints instead of all 32 identifier slots.
    pub track_joints_only: bool,
    /// Release torque on every servo before disconnecting.
    pub stop_servos_on_exit: bool,
}

impl Default for ReceiverConfig {
    fn default() -> Self {
        ReceiverConfig {
            bridge_path: None,
            port: None,
            poll_interval_secs: 0.2,
            tick_interval_ms: 16,
            max_catchup_requests: DEFAULT_MAX_CATCHUP,
            continuous: false,
            track_joints_only: false,
            stop_servos_on_exit: true,
        }
    }
}

impl ReceiverConfig {
    /// Parse a YAML document.
    pub fn from_yaml_str(yaml: &str) -> ReceiverResult<Self> {
        let config: ReceiverConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a YAML file.
    pub fn load(path: &Path) -> ReceiverResult<Self> {
        let yaml = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&yaml)
    }

    /// Reject values the scheduler cannot run with.
    pub fn validate(&self) -> ReceiverResult<()> {
        let interval = Duration::try_from_secs_f64(self.poll_interval_secs).map_err(|e| {
            ReceiverError::InvalidConfig(format!(
                "poll_interval_secs {}: {}",
                self.poll_interval_secs, e
            ))
        })?;
        if interval.is_zero() {
            return Err(ReceiverError::InvalidConfig(format!(
                "poll_interval_secs must be positive, got {}",
                self.poll_interval_secs
            )));
        }
        if self.tick_interval_ms == 0 {
            return Err(ReceiverError::InvalidConfig(
                "tick_interval_ms must be at least 1".to_string(),
            ));
        }
        if self.max_catchup_requests == 0 {
            return Err(ReceiverError::InvalidConfig(
                "max_catchup_requests must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Set the bridge executable.
    pub fn with_bridge_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.bridge_path = Some(path.into());
        self
    }

    /// Set the serial port.
    pub fn with_port(mut self, port: impl Into<String>) -> Self {
        self.port = Some(port.into());
        self
    }

    /// Set the continuous-mode poll interval.
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval_secs = interval.as_secs_f64();
        self
    }

    /// Start in continuous mode.
    pub fn with_continuous(mut self, continuous: bool) -> Self {
        self.continuous = continuous;
        self
    }

    /// Continuous-mode poll interval.
    ///
    /// Falls back to [`DEFAULT_POLL_INTERVAL`] when the field holds a value
    /// [`validate`](Self::validate) would reject as unrepresentable.
    pub fn poll_interval(&self) -> Duration {
        Duration::try_from_secs_f64(self.poll_interval_secs).unwrap_or(DEFAULT_POLL_INTERVAL)
    }

    /// Poll loop tick interval.
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    /// Identifiers the store should track.
    pub fn tracked_ids(&self) -> Vec<ServoId> {
        if self.track_joints_only {
            Joint::ALL.iter().map(|joint| joint.id()).collect()
        } else {
            ServoId::all().collect()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ReceiverConfig::default();
        assert_eq!(config.poll_interval(), Duration::from_millis(200));
        assert_eq!(config.tick_interval(), Duration::from_millis(16));
        assert!(!config.continuous);
        assert!(config.stop_servos_on_exit);
        assert_eq!(config.tracked_ids().len(), 32);
    }

    #[test]
    fn test_parse_partial_yaml() {
        let config = ReceiverConfig::from_yaml_str(
            "port: COM3\ncontinuous: true\ntrack_joints_only: true\n",
        )
        .unwrap();
        assert_eq!(config.port.as_deref(), Some("COM3"));
        assert!(config.continuous);
        assert_eq!(config.tracked_ids().len(), 25);
        assert_eq!(config.poll_interval_secs, 0.2);
    }

    #[test]
    fn test_unknown_field_rejected() {
        let err = ReceiverConfig::from_yaml_str("baud: 115200\n").unwrap_err();
        assert!(matches!(err, ReceiverError::Config(_)));
    }

    #[test]
    fn test_invalid_interval_rejected() {
        let err = ReceiverConfig::from_yaml_str("poll_interval_secs: 0\n").unwrap_err();
        assert!(matches!(err, ReceiverError::InvalidConfig(_)));
    }

    #[test]
    fn test_oversized_interval_rejected() {
        let err = ReceiverConfig::from_yaml_str("poll_interval_secs: 1.0e30\n").unwrap_err();
        assert!(matches!(err, ReceiverError::InvalidConfig(_)));

        let err = ReceiverConfig::from_yaml_str("poll_interval_secs: -0.5\n").unwrap_err();
        assert!(matches!(err, ReceiverError::InvalidConfig(_)));
    }

    #[test]
    fn test_unvalidated_interval_does_not_panic() {
        let config = ReceiverConfig {
            poll_interval_secs: f64::INFINITY,
            ..ReceiverConfig::default()
        };
        assert!(config.validate().is_err());
        assert_eq!(config.poll_interval(), DEFAULT_POLL_INTERVAL);
    }

    #[test]
    fn test_builder() {
        let config = ReceiverConfig::default()
            .with_bridge_path("bridge")
            .with_port("/dev/ttyUSB0")
            .with_poll_interval(Duration::from_millis(500))
            .with_continuous(true);
        assert_eq!(config.bridge_path, Some(PathBuf::from("bridge")));
        assert_eq!(config.poll_interval(), Duration::from_millis(500));
        assert!(config.validate().is_ok());
    }
}
