use super::board_link::BoardLink;
use super::protocol::WireFormat;
use super::transport::Transport;
use shape_core::{
    ActuatorBackend, DisplayKind, HeightField, PinConfig, PinConfigGrid, ShapeResult,
};

/// Cooperform: inFORM's 30x30 layout with checksummed packets
pub struct CooperformBackend {
    link: BoardLink,
}

impl CooperformBackend {
    pub const DISPLAY: DisplayKind = DisplayKind::Cooperform;

    pub fn new(transports: Vec<Box<dyn Transport>>) -> ShapeResult<Self> {
        let format = WireFormat::for_display(Self::DISPLAY);
        Ok(Self {
            link: BoardLink::new(format, transports, true)?,
        })
    }

    pub fn link(&self) -> &BoardLink {
        &self.link
    }
}

impl ActuatorBackend for CooperformBackend {
    fn display(&self) -> DisplayKind {
        Self::DISPLAY
    }

    fn readback_supported(&self) -> bool {
        true
    }

    fn send_heights(&mut self, heights: &HeightField) -> ShapeResult<()> {
        self.link.send_heights(heights)
    }

    fn read_heights(&mut self, out: &mut HeightField) -> ShapeResult<()> {
        self.link.read_heights(out)
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
