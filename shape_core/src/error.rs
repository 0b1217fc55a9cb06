//! Error types shared by every shape display crate

use crate::core::GridSize;
use std::time::Duration;
use thiserror::Error;

/// Result alias used throughout the shape display crates
pub type ShapeResult<T> = Result<T, ShapeError>;

#[derive(Debug, Error)]
pub enum ShapeError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Unknown shape display `{0}` (expected one of: inform, transform, cooperform)")]
    UnknownDisplay(String),

    #[error("Unknown application `{0}`")]
    UnknownApplication(String),

    #[error("Application `{0}` is already registered")]
    DuplicateApplication(String),

    #[error("Grid size mismatch: expected {expected}, got {actual}")]
    GridMismatch { expected: GridSize, actual: GridSize },

    #[error("Sensor unavailable: {0}")]
    SensorUnavailable(String),

    #[error("Actuator timed out after {0:?}")]
    ActuatorTimeout(Duration),

    #[error("Actuator protocol error: {0}")]
    ActuatorProtocol(String),

    #[error("Read-back is not supported by the {0} display")]
    ReadbackUnsupported(&'static str),

    #[error("Orchestrator has already shut down")]
    ShutDown,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ShapeError {
    pub fn config(msg: impl Into<String>) -> Self {
        ShapeError::Config(msg.into())
    }

    pub fn protocol(msg: impl Into<String>) -> Self {
        ShapeError::ActuatorProtocol(msg.into())
    }

    /// Errors raised by sensor or actuator I/O during a tick
    pub fn is_io_failure(&self) -> bool {
        matches!(
            self,
            ShapeError::SensorUnavailable(_)
                | ShapeError::ActuatorTimeout(_)
                | ShapeError::ActuatorProtocol(_)
                | ShapeError::Io(_)
        )
    }
}

impl From<serde_json::Error> for ShapeError {
    fn from(err: serde_json::Error) -> Self {
        ShapeError::Serialization(err.to_string())
    }
}

impl From<serde_yaml::Error> for ShapeError {
    fn from(err: serde_yaml::Error) -> Self {
        ShapeError::Serialization(err.to_string())
    }
}

impl From<toml::de::Error> for ShapeError {
    fn from(err: toml::de::Error) -> Self {
        ShapeError::Serialization(err.to_string())
    }
}

impl From<toml::ser::Error> for ShapeError {
    fn from(err: toml::ser::Error) -> Self {
        ShapeError::Serialization(err.to_string())
    }
}
