//! # Shape display scheduling
//!
//! One [`Orchestrator`] drives the display at a fixed frame rate. Each tick
//! runs to completion before the next begins:
//!
//! 1. advance the sensor
//! 2. pull measured heights (only if the backend supports read-back)
//! 3. advance the current application and pull its heights, plus its tuning if newer than the last push
//! 4. let the application draw its overlay
//! 5. send desired heights (every tick, paused or not)
//! 6. push tuning (only if it was found stale in step 3)
//!
//! ## Usage
//!
//! ```rust,ignore
//! use shape_core::Orchestrator;
//!
//! let mut orchestrator = Orchestrator::builder(grid)
//!     .sensor(sensor)
//!     .backend(backend)
//!     .application("demo", wave)
//!     .build()?;
//!
//! let stop = orchestrator.stop_handle(); // hand to a signal handler
//! orchestrator.run()?;
//! ```

pub mod frame_rate;
pub mod metrics;
pub mod orchestrator;

pub use frame_rate::FrameRateMeter;
pub use metrics::{OrchestratorMetrics, OrchestratorSnapshot};
pub use orchestrator::{Orchestrator, OrchestratorBuilder, StopHandle, TickReport};
