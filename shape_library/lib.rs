//! # Shape Library
//!
//! Concrete collaborators for the [`shape_core`] orchestrator.
//!
//! ## Structure
//!
//! ```text
//! shape_library/
//! ── algorithms/     # Pin control model (PI with anti-windup)
//! ── backends/       # inFORM, TRANSFORM and Cooperform backends, wire codec, transports, simulated firmware
//! ── applications/   # Bundled applications (demo wave, echo)
//! ── sensors/        # Synthetic depth camera
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use shape_core::{Orchestrator, ShapeConfig, SystemClock, Timestamp};
//! use shape_library::{create_backend, default_applications, SyntheticDepthCamera};
//!
//! let config = ShapeConfig::default();
//! let kind = config.display_kind()?;
//! let handle = create_backend(kind, &config.display, config.timing.frame_rate_hz)?;
//! let clock = Arc::new(SystemClock::new());
//!
//! let mut builder = Orchestrator::builder(kind.grid_size())
//!     .with_config(&config)
//!     .with_clock(clock.clone())
//!     .sensor(Box::new(SyntheticDepthCamera::new(0, config.timing.frame_rate_hz)))
//!     .backend(handle.backend);
//! let tuning = config.tuning.to_pin_config(Timestamp::ZERO);
//! for (name, app) in default_applications(clock, tuning) {
//!     builder = builder.application(name, app);
//! }
//! builder.build()?.run()?;
//! ```

pub mod algorithms;
pub mod applications;
pub mod backends;
pub mod sensors;

pub use applications::{default_applications, EchoApp, TunableWaveApp};
pub use backends::{
    backend_for, create_backend, BackendHandle, CooperformBackend, InformBackend,
    SimulatedFirmware, SimulatedTransport, TransformBackend, Transport,
};
pub use sensors::SyntheticDepthCamera;
