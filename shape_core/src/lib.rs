//! # Shape Core
//!
//! The runtime for pin-array shape displays: a grid of height-actuated pins
//! driven by closed-loop actuators and watched by a depth camera.
//!
//! This crate provides the building blocks shared by every display:
//!
//! - **Data model**: [`HeightField`], [`PinConfig`] and [`PinConfigGrid`] sized by a [`GridSize`]
//! - **Applications**: the [`Application`] trait and the name-keyed [`ApplicationRegistry`]
//! - **Backends**: the [`ActuatorBackend`] trait and the closed set of [`DisplayKind`]s
//! - **Sensors**: the [`SensorSource`] trait and [`DepthFrame`]
//! - **Scheduling**: the [`Orchestrator`] that runs the fixed-rate tick loop
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use shape_core::{Orchestrator, ShapeConfig};
//!
//! let config = ShapeConfig::default();
//! let mut orchestrator = Orchestrator::builder(config.display_kind()?.grid_size())
//!     .with_config(&config)
//!     .sensor(Box::new(camera))
//!     .backend(backend)
//!     .application("demo", Box::new(wave))
//!     .build()?;
//!
//! orchestrator.run()?; // shuts down backend then sensor on exit
//! ```

pub mod backend;
pub mod config;
pub mod core;
pub mod error;
pub mod scheduling;

// Re-export commonly used types for easy access
pub use backend::{ActuatorBackend, DisplayKind};
pub use config::{ErrorPolicy, ShapeConfig, TransportKind};
pub use core::{
    Application, ApplicationRegistry, Clock, DepthFrame, GraphicsBuffer, GridSize, HeightField,
    HeightFieldReader, InputEvent, Key, ManualClock, PinConfig, PinConfigGrid, SensorSource,
    SystemClock, Timestamp,
};
pub use error::{ShapeError, ShapeResult};
pub use scheduling::{Orchestrator, OrchestratorBuilder, StopHandle, TickReport};
