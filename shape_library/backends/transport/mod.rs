//! Byte links between a backend and its boards

use super::firmware::SharedFirmware;
use shape_core::{ShapeError, ShapeResult};
use std::time::Duration;

/// A bidirectional byte stream to one or more boards
pub trait Transport: Send {
    /// Port path or other identifier, for logs
    fn name(&self) -> &str;

    fn write_all(&mut self, bytes: &[u8]) -> ShapeResult<()>;

    /// Fill `buf` completely or fail with `ActuatorTimeout`
    fn read_exact(&mut self, buf: &mut [u8]) -> ShapeResult<()>;

    fn close(&mut self) -> ShapeResult<()> {
        Ok(())
    }
}

/// In-process link to [`SimulatedFirmware`](super::firmware::SimulatedFirmware)
///
/// Bytes written are handed to the firmware immediately; reads drain the
/// firmware's reply queue. A read that cannot be satisfied fails the same
/// way a serial read timeout does.
pub struct SimulatedTransport {
    name: String,
    firmware: SharedFirmware,
    read_timeout: Duration,
    closed: bool,
}

impl SimulatedTransport {
    pub fn new(firmware: SharedFirmware, read_timeout: Duration) -> Self {
        let name = format!("sim:{}", firmware.lock().format().display);
        Self {
            name,
            firmware,
            read_timeout,
            closed: false,
        }
    }

    pub fn firmware(&self) -> &SharedFirmware {
        &self.firmware
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }
}

impl Transport for SimulatedTransport {
    fn name(&self) -> &str {
        &self.name
    }

    fn write_all(&mut self, bytes: &[u8]) -> ShapeResult<()> {
        if self.closed {
            return Err(ShapeError::ShutDown);
        }
        self.firmware.lock().receive(bytes);
        Ok(())
    }

    fn read_exact(&mut self, buf: &mut [u8]) -> ShapeResult<()> {
        if self.closed {
            return Err(ShapeError::ShutDown);
        }
        if self.firmware.lock().transmit(buf) {
            Ok(())
        } else {
            Err(ShapeError::ActuatorTimeout(self.read_timeout))
        }
    }

    fn close(&mut self) -> ShapeResult<()> {
        self.closed = true;
        Ok(())
    }
}

#[cfg(feature = "serial-hardware")]
pub use serial::SerialTransport;

#[cfg(feature = "serial-hardware")]
mod serial {
    use super::Transport;
    use shape_core::{ShapeError, ShapeResult};
    use std::io::{ErrorKind, Read, Write};
    use std::time::Duration;

    /// Serial port to a chain of board controllers
    pub struct SerialTransport {
        path: String,
        port: Option<Box<dyn serialport::SerialPort>>,
        read_timeout: Duration,
    }

    impl SerialTransport {
        pub fn open(path: &str, baud_rate: u32, read_timeout: Duration) -> ShapeResult<Self> {
            let port = serialport::new(path, baud_rate)
                .timeout(read_timeout)
                .open()
                .map_err(|err| {
                    ShapeError::Io(std::io::Error::new(
                        ErrorKind::NotFound,
                        format!("failed to open {}: {}", path, err),
                    ))
                })?;
            tracing::info!("Opened serial port {} @ {} baud", path, baud_rate);
            Ok(Self {
                path: path.to_string(),
                port: Some(port),
                read_timeout,
            })
        }

        fn port(&mut self) -> ShapeResult<&mut Box<dyn serialport::SerialPort>> {
            self.port.as_mut().ok_or(ShapeError::ShutDown)
        }
    }

    impl Transport for SerialTransport {
        fn name(&self) -> &str {
            &self.path
        }

        fn write_all(&mut self, bytes: &[u8]) -> ShapeResult<()> {
            let port = self.port()?;
            port.write_all(bytes)?;
            Ok(())
        }

        fn read_exact(&mut self, buf: &mut [u8]) -> ShapeResult<()> {
            let timeout = self.read_timeout;
            let port = self.port()?;
            match port.read_exact(buf) {
                Ok(()) => Ok(()),
                Err(err) if err.kind() == ErrorKind::TimedOut => {
                    Err(ShapeError::ActuatorTimeout(timeout))
                }
                Err(err) => Err(err.into()),
            }
        }

        fn close(&mut self) -> ShapeResult<()> {
            if let Some(mut port) = self.port.take() {
                port.flush()?;
                tracing::info!("Closed serial port {}", self.path);
            }
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::firmware::SimulatedFirmware;
    use crate::backends::protocol::{Term, WireFormat};
    use shape_core::{DisplayKind, HeightField};

    #[test]
    fn test_simulated_round_trip_and_timeout() {
        let format = WireFormat::for_display(DisplayKind::Inform);
        let firmware = SimulatedFirmware::shared(format, 1.0 / 30.0);
        let mut transport = SimulatedTransport::new(firmware, Duration::from_millis(20));
        assert_eq!(transport.name(), "sim:inform");

        let heights = HeightField::filled(format.grid, 100);
        let mut packet = Vec::new();
        format.encode_heights(&mut packet, Term::ExchangeHeights, 0, &heights);
        transport.write_all(&packet).unwrap();

        let mut reply = vec![0; format.packet_len()];
        transport.read_exact(&mut reply).unwrap();
        assert_eq!(reply[0], Term::HeightReply.id());
        assert_eq!(reply[1], 1);

        let err = transport.read_exact(&mut reply).unwrap_err();
        assert!(matches!(err, ShapeError::ActuatorTimeout(t) if t == Duration::from_millis(20)));
    }

    #[test]
    fn test_closed_transport_rejects_io() {
        let format = WireFormat::for_display(DisplayKind::Transform);
        let mut transport = SimulatedTransport::new(
            SimulatedFirmware::shared(format, 1.0 / 30.0),
            Duration::from_millis(5),
        );
        transport.close().unwrap();
        assert!(transport.is_closed());
        assert!(matches!(transport.write_all(&[1]), Err(ShapeError::ShutDown)));
    }
}
