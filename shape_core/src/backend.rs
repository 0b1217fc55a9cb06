//! Actuator backend selection and contract
//!
//! Exactly one display variant drives the pins for the lifetime of the
//! process. Selection precedence:
//! 1. Command line (handled by the manager)
//! 2. Environment variable (`SHAPE_DISPLAY`)
//! 3. Configuration file (`display.kind`)
//!
//! An unrecognized value is fatal; there is no fallback display.

use crate::core::{GridSize, HeightField, PinConfig, PinConfigGrid};
use crate::error::{ShapeError, ShapeResult};
use std::env;
use std::fmt;

pub const DISPLAY_ENV_VAR: &str = "SHAPE_DISPLAY";

/// The closed set of supported shape displays
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DisplayKind {
    /// inFORM: 30x30 pins, heights read back from the boards
    Inform,
    /// TRANSFORM: three 16x24 modules side by side, no read-back
    Transform,
    /// Cooperform: 30x30 pins, checksummed packets with read-back
    Cooperform,
}

impl DisplayKind {
    pub const ALL: [DisplayKind; 3] = [
        DisplayKind::Inform,
        DisplayKind::Transform,
        DisplayKind::Cooperform,
    ];

    /// Resolve the display from `SHAPE_DISPLAY`, falling back to `configured`
    pub fn resolve(configured: &str) -> ShapeResult<Self> {
        match env::var(DISPLAY_ENV_VAR) {
            Ok(from_env) if !from_env.trim().is_empty() => from_env.parse(),
            _ => configured.parse(),
        }
    }

    pub const fn grid_size(&self) -> GridSize {
        match self {
            DisplayKind::Inform => GridSize::new(30, 30),
            DisplayKind::Transform => GridSize::new(48, 24),
            DisplayKind::Cooperform => GridSize::new(30, 30),
        }
    }

    pub const fn readback_supported(&self) -> bool {
        match self {
            DisplayKind::Inform => true,
            DisplayKind::Transform => false,
            DisplayKind::Cooperform => true,
        }
    }

    pub const fn as_str(&self) -> &'static str {
        match self {
            DisplayKind::Inform => "inform",
            DisplayKind::Transform => "transform",
            DisplayKind::Cooperform => "cooperform",
        }
    }

    pub const fn label(&self) -> &'static str {
        match self {
            DisplayKind::Inform => "inFORM",
            DisplayKind::Transform => "TRANSFORM",
            DisplayKind::Cooperform => "Cooperform",
        }
    }
}

impl fmt::Display for DisplayKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for DisplayKind {
    type Err = ShapeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "inform" => Ok(DisplayKind::Inform),
            "transform" => Ok(DisplayKind::Transform),
            "cooperform" => Ok(DisplayKind::Cooperform),
            _ => Err(ShapeError::UnknownDisplay(s.to_string())),
        }
    }
}

/// Hardware-specific link to the pins
///
/// `send_heights` is called every tick. `read_heights` may only be called
/// when `readback_supported()` is true. Tuning is applied globally once at
/// startup and afterwards only when the orchestrator detects a newer tuning.
pub trait ActuatorBackend: Send {
    fn display(&self) -> DisplayKind;

    fn grid_size(&self) -> GridSize {
        self.display().grid_size()
    }

    fn readback_supported(&self) -> bool;

    /// Transmit desired heights
    fn send_heights(&mut self, heights: &HeightField) -> ShapeResult<()>;

    /// Copy the most recently measured heights into `out`
    fn read_heights(&mut self, out: &mut HeightField) -> ShapeResult<()>;

    /// Apply one tuning record to every pin
    fn set_global_tuning(&mut self, config: &PinConfig) -> ShapeResult<()>;

    /// Replace all hardware-side tuning
    fn push_tuning(&mut self, configs: &PinConfigGrid) -> ShapeResult<()>;

    /// Stop hardware communication (called once at orchestrator shutdown)
    fn shutdown(&mut self) -> ShapeResult<()> {
        Ok(())
    }
}
