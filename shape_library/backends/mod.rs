//! Hardware backends for the supported displays
//!
//! | Display    | Grid  | Pins/board | Read-back | Checksum | Heights  |
//! |------------|-------|-----------:|-----------|----------|----------|
//! | inFORM     | 30x30 | 6          | yes       | no       | direct   |
//! | TRANSFORM  | 48x24 | 8          | no        | XOR      | inverted |
//! | Cooperform | 30x30 | 6          | yes       | XOR      | direct   |
//!
//! Every backend talks to its boards through one or more [`Transport`]s:
//! serial ports on real hardware, or a [`SimulatedTransport`] backed by
//! [`SimulatedFirmware`] for development and tests.

pub mod board_link;
pub mod cooperform;
pub mod firmware;
pub mod inform;
pub mod protocol;
pub mod transform;
pub mod transport;

pub use board_link::BoardLink;
pub use cooperform::CooperformBackend;
pub use firmware::{FirmwareStats, SharedFirmware, SimulatedFirmware};
pub use inform::InformBackend;
pub use protocol::{ProtocolError, Term, WireFormat};
pub use transform::TransformBackend;
pub use transport::{SimulatedTransport, Transport};

#[cfg(feature = "serial-hardware")]
pub use transport::SerialTransport;

use shape_core::config::DisplayConfig;
use shape_core::{ActuatorBackend, DisplayKind, ShapeError, ShapeResult, TransportKind};
use std::time::Duration;
use tracing::info;

/// A constructed backend, plus the simulated boards behind it if any
pub struct BackendHandle {
    pub backend: Box<dyn ActuatorBackend>,
    pub firmware: Option<SharedFirmware>,
}

/// Build the backend for `kind` over the transport named in `config`
///
/// `frame_rate_hz` sets how far simulated pins move per frame.
pub fn create_backend(
    kind: DisplayKind,
    config: &DisplayConfig,
    frame_rate_hz: f64,
) -> ShapeResult<BackendHandle> {
    let read_timeout = Duration::from_millis(config.read_timeout_ms);

    let (transports, firmware) = match config.transport {
        TransportKind::Simulated => {
            let step_secs = if frame_rate_hz > 0.0 {
                1.0 / frame_rate_hz
            } else {
                0.0
            };
            let firmware = SimulatedFirmware::shared(WireFormat::for_display(kind), step_secs);
            let transport: Box<dyn Transport> =
                Box::new(SimulatedTransport::new(firmware.clone(), read_timeout));
            (vec![transport], Some(firmware))
        }
        TransportKind::Serial => (open_serial(config, read_timeout)?, None),
    };

    info!(
        "Selected {} backend over {} transport(s)",
        kind.label(),
        transports.len()
    );
    Ok(BackendHandle {
        backend: backend_for(kind, transports)?,
        firmware,
    })
}

/// Build the backend for `kind` over already opened transports
pub fn backend_for(
    kind: DisplayKind,
    transports: Vec<Box<dyn Transport>>,
) -> ShapeResult<Box<dyn ActuatorBackend>> {
    Ok(match kind {
        DisplayKind::Inform => Box::new(InformBackend::new(transports)?),
        DisplayKind::Transform => Box::new(TransformBackend::new(transports)?),
        DisplayKind::Cooperform => Box::new(CooperformBackend::new(transports)?),
    })
}

#[cfg(feature = "serial-hardware")]
fn open_serial(
    config: &DisplayConfig,
    read_timeout: Duration,
) -> ShapeResult<Vec<Box<dyn Transport>>> {
    if config.ports.is_empty() {
        return Err(ShapeError::config("no serial ports configured"));
    }
    config
        .ports
        .iter()
        .map(|path| {
            let transport = SerialTransport::open(path, config.baud_rate, read_timeout)?;
            Ok(Box::new(transport) as Box<dyn Transport>)
        })
        .collect()
}

#[cfg(not(feature = "serial-hardware"))]
fn open_serial(
    _config: &DisplayConfig,
    _read_timeout: Duration,
) -> ShapeResult<Vec<Box<dyn Transport>>> {
    Err(ShapeError::config(
        "serial transport requires the `serial-hardware` feature",
    ))
}
