//! Depth sensing collaborator

use crate::error::ShapeResult;

pub const DEPTH_FRAME_WIDTH: usize = 640;
pub const DEPTH_FRAME_HEIGHT: usize = 480;

/// 8-bit depth image (0 = far / no reading, 255 = nearest)
#[derive(Debug, Clone)]
pub struct DepthFrame {
    width: usize,
    height: usize,
    frame_number: u64,
    pixels: Vec<u8>,
}

impl DepthFrame {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            frame_number: 0,
            pixels: vec![0; width * height],
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn frame_number(&self) -> u64 {
        self.frame_number
    }

    pub fn depth(&self, x: usize, y: usize) -> u8 {
        self.pixels[y * self.width + x]
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    /// Mutable pixels for the next frame; bumps the frame number
    pub fn begin_frame(&mut self) -> &mut [u8] {
        self.frame_number += 1;
        &mut self.pixels
    }
}

impl Default for DepthFrame {
    fn default() -> Self {
        Self::new(DEPTH_FRAME_WIDTH, DEPTH_FRAME_HEIGHT)
    }
}

/// Per-frame camera/depth input
pub trait SensorSource: Send {
    fn name(&self) -> &str;

    /// Acquire the next frame (may block until the camera delivers one)
    fn update(&mut self) -> ShapeResult<()>;

    /// The most recently acquired frame
    fn depth_frame(&self) -> &DepthFrame;

    /// Stop acquisition (called once at orchestrator shutdown)
    fn shutdown(&mut self) -> ShapeResult<()> {
        Ok(())
    }
}
