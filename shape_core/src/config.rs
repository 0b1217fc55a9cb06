//! Startup configuration for a shape display
//!
//! Loaded once from TOML or YAML (chosen by file extension). Every field has
//! a default, so an empty file is a valid configuration.

use crate::backend::DisplayKind;
use crate::core::{PinConfig, Timestamp};
use crate::core::pin_config::{
    DEFAULT_DEAD_ZONE, DEFAULT_GAIN_I, DEFAULT_GAIN_P, DEFAULT_MAX_I, DEFAULT_MAX_SPEED,
};
use crate::error::{ShapeError, ShapeResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DEFAULT_CONFIG_FILE: &str = "shapedisplay.toml";
pub const DEFAULT_FRAME_RATE_HZ: f64 = 30.0;
pub const DEFAULT_APPLICATION: &str = "demo";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShapeConfig {
    pub error_policy: ErrorPolicy,
    pub display: DisplayConfig,
    pub tuning: TuningConfig,
    pub timing: TimingConfig,
    pub application: ApplicationConfig,
}

impl Default for ShapeConfig {
    fn default() -> Self {
        Self {
            error_policy: ErrorPolicy::Skip,
            display: DisplayConfig::default(),
            tuning: TuningConfig::default(),
            timing: TimingConfig::default(),
            application: ApplicationConfig::default(),
        }
    }
}

/// How the link to the boards is made
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransportKind {
    /// In-process firmware model, no hardware required
    Simulated,
    /// Serial ports to the board controllers
    Serial,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    /// inform | transform | cooperform
    pub kind: String,
    pub transport: TransportKind,
    pub ports: Vec<String>,
    pub baud_rate: u32,
    pub read_timeout_ms: u64,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            kind: DisplayKind::Inform.as_str().to_string(),
            transport: TransportKind::Simulated,
            ports: vec!["/dev/ttyUSB0".to_string()],
            baud_rate: 115_200,
            read_timeout_ms: 20,
        }
    }
}

/// Tuning applied to every pin at startup
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TuningConfig {
    pub gain_p: f64,
    pub gain_i: f64,
    pub max_i: u8,
    pub dead_zone: u8,
    pub max_speed: u16,
}

impl Default for TuningConfig {
    fn default() -> Self {
        Self {
            gain_p: DEFAULT_GAIN_P,
            gain_i: DEFAULT_GAIN_I,
            max_i: DEFAULT_MAX_I,
            dead_zone: DEFAULT_DEAD_ZONE,
            max_speed: DEFAULT_MAX_SPEED,
        }
    }
}

impl TuningConfig {
    pub fn to_pin_config(&self, time_of_update: Timestamp) -> PinConfig {
        PinConfig {
            gain_p: self.gain_p,
            gain_i: self.gain_i,
            max_i: self.max_i,
            dead_zone: self.dead_zone,
            max_speed: self.max_speed,
            time_of_update,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    pub frame_rate_hz: f64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            frame_rate_hz: DEFAULT_FRAME_RATE_HZ,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApplicationConfig {
    /// Registry key of the application that is current at startup
    pub default: String,
}

impl Default for ApplicationConfig {
    fn default() -> Self {
        Self {
            default: DEFAULT_APPLICATION.to_string(),
        }
    }
}

/// What the run loop does when sensor or actuator I/O fails during a tick
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorPolicy {
    /// Log the failure and keep ticking
    Skip,
    /// Stop the loop, shut down, and return the error
    Abort,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ConfigFormat {
    Toml,
    Yaml,
}

impl ConfigFormat {
    fn from_path(path: &Path) -> ShapeResult<Self> {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("toml") => Ok(ConfigFormat::Toml),
            Some("yaml") | Some("yml") => Ok(ConfigFormat::Yaml),
            _ => Err(ShapeError::config(format!(
                "Unsupported config file '{}': expected .toml, .yaml or .yml",
                path.display()
            ))),
        }
    }
}

impl ShapeConfig {
    /// Load and validate a configuration file
    pub fn load_from_disk(path: &Path) -> ShapeResult<Self> {
        let format = ConfigFormat::from_path(path)?;
        let text = std::fs::read_to_string(path)?;
        let config = match format {
            ConfigFormat::Toml => Self::from_toml_str(&text)?,
            ConfigFormat::Yaml => Self::from_yaml_str(&text)?,
        };
        config.validate()?;
        Ok(config)
    }

    /// Load `path` if given, else `shapedisplay.toml` in the working directory if present, else defaults
    pub fn discover(path: Option<&Path>) -> ShapeResult<Self> {
        if let Some(path) = path {
            return Self::load_from_disk(path);
        }
        let local = PathBuf::from(DEFAULT_CONFIG_FILE);
        if local.exists() {
            tracing::info!("Loading configuration from {}", local.display());
            return Self::load_from_disk(&local);
        }
        Ok(Self::default())
    }

    pub fn from_toml_str(text: &str) -> ShapeResult<Self> {
        Ok(toml::from_str(text)?)
    }

    pub fn from_yaml_str(text: &str) -> ShapeResult<Self> {
        Ok(serde_yaml::from_str(text)?)
    }

    pub fn to_toml_string(&self) -> ShapeResult<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn to_yaml_string(&self) -> ShapeResult<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    pub fn save_to_disk(&self, path: &Path) -> ShapeResult<()> {
        let text = match ConfigFormat::from_path(path)? {
            ConfigFormat::Toml => self.to_toml_string()?,
            ConfigFormat::Yaml => self.to_yaml_string()?,
        };

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        std::fs::write(path, text)?;
        Ok(())
    }

    /// The display variant, honoring the `SHAPE_DISPLAY` override
    pub fn display_kind(&self) -> ShapeResult<DisplayKind> {
        DisplayKind::resolve(&self.display.kind)
    }

    pub fn validate(&self) -> ShapeResult<()> {
        if !(self.timing.frame_rate_hz.is_finite() && self.timing.frame_rate_hz > 0.0) {
            return Err(ShapeError::config(format!(
                "timing.frame_rate_hz must be positive, got {}",
                self.timing.frame_rate_hz
            )));
        }
        if self.tuning.gain_p < 0.0 || self.tuning.gain_i < 0.0 {
            return Err(ShapeError::config("tuning gains must not be negative"));
        }
        if self.display.transport == TransportKind::Serial && self.display.ports.is_empty() {
            return Err(ShapeError::config(
                "display.ports must list at least one port for the serial transport",
            ));
        }
        if self.application.default.trim().is_empty() {
            return Err(ShapeError::config("application.default must not be empty"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_toml_uses_defaults() {
        let config = ShapeConfig::from_toml_str("").unwrap();
        assert_eq!(config, ShapeConfig::default());
        assert_eq!(config.timing.frame_rate_hz, 30.0);
        assert_eq!(config.application.default, "demo");
        assert_eq!(config.error_policy, ErrorPolicy::Skip);
    }

    #[test]
    fn test_partial_toml() {
        let config = ShapeConfig::from_toml_str(
            r#"
            error_policy = "abort"

            [display]
            kind = "transform"
            transport = "serial"
            ports = ["/dev/ttyACM0", "/dev/ttyACM1"]

            [tuning]
            gain_p = 2.0
            "#,
        )
        .unwrap();

        assert_eq!(config.display.kind, "transform");
        assert_eq!(config.display.transport, TransportKind::Serial);
        assert_eq!(config.display.ports.len(), 2);
        assert_eq!(config.tuning.gain_p, 2.0);
        assert_eq!(config.tuning.max_speed, DEFAULT_MAX_SPEED);
        assert_eq!(config.error_policy, ErrorPolicy::Abort);
    }

    #[test]
    fn test_yaml() {
        let config = ShapeConfig::from_yaml_str(
            "display:\n  kind: cooperform\ntiming:\n  frame_rate_hz: 60.0\n",
        )
        .unwrap();
        assert_eq!(config.display.kind, "cooperform");
        assert_eq!(config.timing.frame_rate_hz, 60.0);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = ShapeConfig::default();
        config.timing.frame_rate_hz = 0.0;
        assert!(matches!(config.validate(), Err(ShapeError::Config(_))));

        let mut config = ShapeConfig::default();
        config.display.transport = TransportKind::Serial;
        config.display.ports.clear();
        assert!(config.validate().is_err());

        let mut config = ShapeConfig::default();
        config.tuning.gain_i = -0.1;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_save_and_load_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("display.toml");

        let mut config = ShapeConfig::default();
        config.display.kind = "cooperform".to_string();
        config.tuning.dead_zone = 5;
        config.save_to_disk(&path).unwrap();

        let loaded = ShapeConfig::load_from_disk(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_unsupported_extension() {
        let err = ShapeConfig::load_from_disk(Path::new("display.ini")).unwrap_err();
        assert!(matches!(err, ShapeError::Config(_)));
    }

    #[test]
    fn test_tuning_to_pin_config() {
        let tuning = TuningConfig {
            gain_p: 1.0,
            ..Default::default()
        };
        let pin = tuning.to_pin_config(Timestamp::from_secs(2.0));
        assert_eq!(pin.gain_p, 1.0);
        assert_eq!(pin.dead_zone, DEFAULT_DEAD_ZONE);
        assert_eq!(pin.time_of_update, Timestamp::from_secs(2.0));
    }
}
