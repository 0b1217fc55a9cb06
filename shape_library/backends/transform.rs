use super::board_link::BoardLink;
use super::protocol::WireFormat;
use super::transport::Transport;
use shape_core::{
    ActuatorBackend, DisplayKind, HeightField, PinConfig, PinConfigGrid, ShapeError, ShapeResult,
};

/// TRANSFORM: three 16x24 modules side by side, write-only
///
/// Heights travel inverted and every packet carries a checksum. The boards
/// never report positions, so the measured-height buffer stays untouched.
pub struct TransformBackend {
    link: BoardLink,
}

impl TransformBackend {
    pub const DISPLAY: DisplayKind = DisplayKind::Transform;

    pub fn new(transports: Vec<Box<dyn Transport>>) -> ShapeResult<Self> {
        let format = WireFormat::for_display(Self::DISPLAY);
        Ok(Self {
            link: BoardLink::new(format, transports, false)?,
        })
    }

    pub fn link(&self) -> &BoardLink {
        &self.link
    }
}

impl ActuatorBackend for TransformBackend {
    fn display(&self) -> DisplayKind {
        Self::DISPLAY
    }

    fn readback_supported(&self) -> bool {
        false
    }

    fn send_heights(&mut self, heights: &HeightField) -> ShapeResult<()> {
        self.link.send_heights(heights)
    }

    fn read_heights(&mut self, _out: &mut HeightField) -> ShapeResult<()> {
        Err(ShapeError::ReadbackUnsupported(Self::DISPLAY.label()))
    }

    fn set_global_tuning(&mut self, config: &PinConfig) -> ShapeResult<()> {
        self.link.set_global_tuning(config)
    }

    fn push_tuning(&mut self, configs: &PinConfigGrid) -> ShapeResult<()> {
        self.link.push_tuning(configs)
    }

    fn shutdown(&mut self) -> ShapeResult<()> {
        self.link.shutdown()
    }
}
