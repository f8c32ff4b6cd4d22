//! # Configuration Module
//!
//! Handles loading and validating configuration from TOML files.
//!
//! Every field has a default, and so does every section, so an empty file is a
//! valid configuration.

use serde::de::Error;
use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::time::Duration;

use crate::error::{BridgeError, Result};

/// Main configuration structure
#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub link: LinkConfig,
    #[serde(default)]
    pub controller: ControllerConfig,
    #[serde(default)]
    pub pipeline: PipelineConfig,
    #[serde(default)]
    pub safety: SafetyConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Datagram link to the flight controller's network bridge
#[derive(Debug, Deserialize, Clone)]
pub struct LinkConfig {
    #[serde(default = "default_remote_host")]
    pub remote_host: String,

    #[serde(default = "default_remote_port")]
    pub remote_port: u16,

    #[serde(default = "default_local_port")]
    pub local_port: u16,

    #[serde(default = "default_recv_buffer_size")]
    pub recv_buffer_size: usize,
}

/// Gamepad device and input shaping
#[derive(Debug, Deserialize, Clone)]
pub struct ControllerConfig {
    #[serde(default = "default_device_path")]
    pub device_path: String,

    /// Raw absolute value of full stick deflection
    #[serde(default = "default_stick_range")]
    pub stick_range: i32,

    /// Raw value of a fully pressed trigger
    #[serde(default = "default_trigger_range")]
    pub trigger_range: i32,

    #[serde(default = "default_deadzone")]
    pub deadzone: f32,

    #[serde(default = "default_curve_exponent")]
    pub curve_exponent: f32,

    #[serde(default = "default_stick_smoothing")]
    pub stick_smoothing: f32,

    #[serde(default = "default_trigger_smoothing")]
    pub trigger_smoothing: f32,

    #[serde(default = "default_reconnect_interval_ms")]
    pub reconnect_interval_ms: u64,
}

/// Tick and emission timing
#[derive(Debug, Deserialize, Clone)]
pub struct PipelineConfig {
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,

    #[serde(default = "default_min_command_interval_ms")]
    pub min_command_interval_ms: u64,

    #[serde(default = "default_change_threshold")]
    pub change_threshold: f32,

    #[serde(default = "default_stats_interval_ms")]
    pub stats_interval_ms: u64,
}

/// Safety configuration
#[derive(Debug, Deserialize, Clone)]
pub struct SafetyConfig {
    #[serde(default = "default_safe_mode_default")]
    pub safe_mode_default: bool,

    #[serde(default = "default_hover_preset_cm")]
    pub hover_preset_cm: i32,
}

/// Logging configuration
#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default)]
    pub file_enabled: bool,

    #[serde(default = "default_log_dir")]
    pub log_dir: String,
}

// Default value functions
fn default_remote_host() -> String { "192.168.4.1".to_string() }
fn default_remote_port() -> u16 { 14550 }
fn default_local_port() -> u16 { 14551 }
fn default_recv_buffer_size() -> usize { 1024 }

fn default_device_path() -> String { "/dev/input/event0".to_string() }
fn default_stick_range() -> i32 { 32767 }
fn default_trigger_range() -> i32 { 1023 }
fn default_deadzone() -> f32 { 0.05 }
fn default_curve_exponent() -> f32 { 1.2 }
fn default_stick_smoothing() -> f32 { 0.4 }
fn default_trigger_smoothing() -> f32 { 0.3 }
fn default_reconnect_interval_ms() -> u64 { 1000 }

fn default_tick_interval_ms() -> u64 { 16 }
fn default_min_command_interval_ms() -> u64 { 33 }
fn default_change_threshold() -> f32 { 0.015 }
fn default_stats_interval_ms() -> u64 { 1000 }

fn default_safe_mode_default() -> bool { true }
fn default_hover_preset_cm() -> i32 { 50 }

fn default_log_level() -> String { "info".to_string() }
fn default_log_dir() -> String { "./logs".to_string() }

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            remote_host: default_remote_host(),
            remote_port: default_remote_port(),
            local_port: default_local_port(),
            recv_buffer_size: default_recv_buffer_size(),
        }
    }
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            device_path: default_device_path(),
            stick_range: default_stick_range(),
            trigger_range: default_trigger_range(),
            deadzone: default_deadzone(),
            curve_exponent: default_curve_exponent(),
            stick_smoothing: default_stick_smoothing(),
            trigger_smoothing: default_trigger_smoothing(),
            reconnect_interval_ms: default_reconnect_interval_ms(),
        }
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: default_tick_interval_ms(),
            min_command_interval_ms: default_min_command_interval_ms(),
            change_threshold: default_change_threshold(),
            stats_interval_ms: default_stats_interval_ms(),
        }
    }
}

impl Default for SafetyConfig {
    fn default() -> Self {
        Self {
            safe_mode_default: default_safe_mode_default(),
            hover_preset_cm: default_hover_preset_cm(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file_enabled: false,
            log_dir: default_log_dir(),
        }
    }
}

impl LinkConfig {
    /// `host:port` of the remote endpoint
    #[must_use]
    pub fn remote_addr(&self) -> String {
        format!("{}:{}", self.remote_host, self.remote_port)
    }
}

impl PipelineConfig {
    #[must_use]
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    #[must_use]
    pub fn min_command_interval(&self) -> Duration {
        Duration::from_millis(self.min_command_interval_ms)
    }

    #[must_use]
    pub fn stats_interval(&self) -> Duration {
        Duration::from_millis(self.stats_interval_ms)
    }
}

fn invalid(msg: impl std::fmt::Display) -> BridgeError {
    BridgeError::Config(toml::de::Error::custom(msg))
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the configuration file
    ///
    /// # Returns
    ///
    /// * `Result<Config>` - Loaded and validated configuration
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - File cannot be read
    /// - TOML parsing fails
    /// - Validation fails
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use skynet_bridge::config::Config;
    ///
    /// let config = Config::load("config/default.toml")?;
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values
    ///
    /// # Errors
    ///
    /// Returns `BridgeError::Config` naming the first out-of-range value
    pub fn validate(&self) -> Result<()> {
        // Link
        if self.link.remote_host.is_empty() {
            return Err(invalid("remote_host cannot be empty"));
        }

        if self.link.remote_port == 0 {
            return Err(invalid("remote_port must be greater than 0"));
        }

        if self.link.recv_buffer_size < 64 || self.link.recv_buffer_size > 65535 {
            return Err(invalid("recv_buffer_size must be between 64 and 65535"));
        }

        // Controller
        if self.controller.device_path.is_empty() {
            return Err(invalid("controller device_path cannot be empty"));
        }

        if self.controller.stick_range <= 0 || self.controller.trigger_range <= 0 {
            return Err(invalid("stick_range and trigger_range must be greater than 0"));
        }

        if !(0.0..=0.5).contains(&self.controller.deadzone) {
            return Err(invalid("deadzone must be between 0.0 and 0.5"));
        }

        if !(0.1..=5.0).contains(&self.controller.curve_exponent) {
            return Err(invalid("curve_exponent must be between 0.1 and 5.0"));
        }

        for (name, value) in [
            ("stick_smoothing", self.controller.stick_smoothing),
            ("trigger_smoothing", self.controller.trigger_smoothing),
        ] {
            if value <= 0.0 || value > 1.0 {
                return Err(invalid(format!("{} must be in (0.0, 1.0]", name)));
            }
        }

        if self.controller.reconnect_interval_ms == 0 || self.controller.reconnect_interval_ms > 60000 {
            return Err(invalid("reconnect_interval_ms must be between 1 and 60000"));
        }

        // Pipeline timing
        if self.pipeline.tick_interval_ms == 0 || self.pipeline.tick_interval_ms > 1000 {
            return Err(invalid("tick_interval_ms must be between 1 and 1000"));
        }

        if self.pipeline.min_command_interval_ms > 10000 {
            return Err(invalid("min_command_interval_ms must be at most 10000"));
        }

        if !(0.0..1.0).contains(&self.pipeline.change_threshold) {
            return Err(invalid("change_threshold must be between 0.0 and 1.0"));
        }

        if self.pipeline.stats_interval_ms == 0 || self.pipeline.stats_interval_ms > 60000 {
            return Err(invalid("stats_interval_ms must be between 1 and 60000"));
        }

        // Safety
        if !(0..=500).contains(&self.safety.hover_preset_cm) {
            return Err(invalid("hover_preset_cm must be between 0 and 500"));
        }

        // Logging
        if !["trace", "debug", "info", "warn", "error"].contains(&self.logging.level.as_str()) {
            return Err(invalid("log level must be one of: trace, debug, info, warn, error"));
        }

        if self.logging.file_enabled && self.logging.log_dir.is_empty() {
            return Err(invalid("log_dir cannot be empty when file logging is enabled"));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.link.remote_addr(), "192.168.4.1:14550");
        assert_eq!(config.link.local_port, 14551);
        assert!(config.safety.safe_mode_default);
    }

    #[test]
    fn test_empty_file_uses_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert!(config.validate().is_ok());
        assert_eq!(config.pipeline.tick_interval_ms, 16);
        assert_eq!(config.pipeline.min_command_interval_ms, 33);
        assert_eq!(config.safety.hover_preset_cm, 50);
    }

    #[test]
    fn test_partial_section() {
        let toml_content = r#"
[link]
remote_host = "10.0.0.2"

[safety]
safe_mode_default = false
"#;
        let config: Config = toml::from_str(toml_content).unwrap();
        assert_eq!(config.link.remote_host, "10.0.0.2");
        assert_eq!(config.link.remote_port, 14550);
        assert!(!config.safety.safe_mode_default);
        assert_eq!(config.safety.hover_preset_cm, 50);
    }

    #[test]
    fn test_load_config_from_file() {
        use std::io::Write;
        use tempfile::NamedTempFile;

        let toml_content = r#"
[link]
remote_host = "192.168.4.1"
remote_port = 14550
local_port = 14551

[controller]
device_path = "/dev/input/event5"
deadzone = 0.08
curve_exponent = 1.5

[pipeline]
tick_interval_ms = 20

[logging]
level = "debug"
"#;

        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(toml_content.as_bytes()).unwrap();
        temp_file.flush().unwrap();

        let config = Config::load(temp_file.path()).unwrap();
        assert_eq!(config.controller.device_path, "/dev/input/event5");
        assert!((config.controller.deadzone - 0.08).abs() < 1e-6);
        assert_eq!(config.pipeline.tick_interval(), Duration::from_millis(20));
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn test_load_rejects_invalid_values() {
        use std::io::Write;
        use tempfile::NamedTempFile;

        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file
            .write_all(b"[controller]\ndeadzone = 0.9\n")
            .unwrap();
        temp_file.flush().unwrap();

        let result = Config::load(temp_file.path());
        assert!(matches!(result, Err(BridgeError::Config(_))));
    }

    #[test]
    fn test_load_missing_file() {
        let result = Config::load("/nonexistent/skynet.toml");
        assert!(matches!(result, Err(BridgeError::Io(_))));
    }

    #[test]
    fn test_load_malformed_toml() {
        use std::io::Write;
        use tempfile::NamedTempFile;

        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(b"[link\nremote_port = ").unwrap();
        temp_file.flush().unwrap();

        assert!(Config::load(temp_file.path()).is_err());
    }

    #[test]
    fn test_empty_remote_host() {
        let mut config = Config::default();
        config.link.remote_host = String::new();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_remote_port() {
        let mut config = Config::default();
        config.link.remote_port = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_recv_buffer_bounds() {
        let mut config = Config::default();
        config.link.recv_buffer_size = 16;
        assert!(config.validate().is_err());
        config.link.recv_buffer_size = 70000;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_deadzone() {
        let mut config = Config::default();
        config.controller.deadzone = 0.6;
        assert!(config.validate().is_err());
        config.controller.deadzone = -0.1;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_curve_exponent() {
        let mut config = Config::default();
        config.controller.curve_exponent = 0.0;
        assert!(config.validate().is_err());
        config.controller.curve_exponent = 6.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_smoothing() {
        let mut config = Config::default();
        config.controller.stick_smoothing = 0.0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.controller.trigger_smoothing = 1.5;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.controller.trigger_smoothing = 1.0;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_invalid_ranges() {
        let mut config = Config::default();
        config.controller.stick_range = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_tick_interval() {
        let mut config = Config::default();
        config.pipeline.tick_interval_ms = 0;
        assert!(config.validate().is_err());
        config.pipeline.tick_interval_ms = 1001;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_change_threshold() {
        let mut config = Config::default();
        config.pipeline.change_threshold = 1.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_hover_preset() {
        let mut config = Config::default();
        config.safety.hover_preset_cm = -1;
        assert!(config.validate().is_err());
        config.safety.hover_preset_cm = 501;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_log_level() {
        let mut config = Config::default();
        config.logging.level = "verbose".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_file_logging_requires_dir() {
        let mut config = Config::default();
        config.logging.file_enabled = true;
        config.logging.log_dir = String::new();
        assert!(config.validate().is_err());

        config.logging.file_enabled = false;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_default_functions() {
        assert_eq!(default_remote_host(), "192.168.4.1");
        assert_eq!(default_remote_port(), 14550);
        assert_eq!(default_local_port(), 14551);
        assert_eq!(default_stick_range(), 32767);
        assert_eq!(default_trigger_range(), 1023);
        assert_eq!(default_deadzone(), 0.05);
        assert_eq!(default_curve_exponent(), 1.2);
        assert_eq!(default_stick_smoothing(), 0.4);
        assert_eq!(default_trigger_smoothing(), 0.3);
        assert_eq!(default_tick_interval_ms(), 16);
        assert_eq!(default_min_command_interval_ms(), 33);
        assert_eq!(default_change_threshold(), 0.015);
        assert_eq!(default_stats_interval_ms(), 1000);
        assert_eq!(default_hover_preset_cm(), 50);
        assert_eq!(default_log_level(), "info");
    }
}
