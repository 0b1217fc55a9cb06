//! # Core types and traits for shape displays
//!
//! - **Grid values**: `HeightField` and `PinConfigGrid`, both sized by one `GridSize`
//! - **Application**: behaviors that produce desired heights and tuning
//! - **SensorSource**: per-frame depth input
//! - **Clock**: the timebase used for tuning staleness
//! - **Input**: keys and other input events delivered to the orchestrator
//!
//! ## Application Lifecycle
//!
//! 1. **Construction** - created once at startup and registered by name
//! 2. **Binding** - receives a read-only view of measured heights when the display supports read-back
//! 3. **Execution** - `advance()` / `write_heights()` are called every unpaused tick
//! 4. **Teardown** - dropped with the orchestrator at process exit

pub mod application;
pub mod clock;
pub mod graphics;
pub mod grid;
pub mod input;
pub mod pin_config;
pub mod sensor;

pub use application::{Application, ApplicationRegistry};
pub use clock::{Clock, ManualClock, SystemClock, Timestamp};
pub use graphics::GraphicsBuffer;
pub use grid::{GridSize, HeightField, HeightFieldReader, SharedHeightField};
pub use input::{InputEvent, Key, ReservedAction, ReservedKeys};
pub use pin_config::{PinConfig, PinConfigGrid};
pub use sensor::{DepthFrame, SensorSource};
