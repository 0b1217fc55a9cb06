use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use shape_core::{DepthFrame, SensorSource, ShapeResult};
use std::f64::consts::TAU;
use tracing::{debug, info};

/// Depth camera stand-in: one bright blob circling the frame, plus noise
///
/// Deterministic for a given seed. The frame buffer is allocated once.
pub struct SyntheticDepthCamera {
    frame: DepthFrame,
    rng: StdRng,
    /// Seconds of simulated time per frame
    frame_period: f64,
    time: f64,
    /// Orbit period of the blob, in seconds
    orbit_period: f64,
    blob_radius: f64,
    /// Largest noise value added to a pixel
    noise: u8,
}

impl SyntheticDepthCamera {
    pub fn new(seed: u64, frame_rate_hz: f64) -> Self {
        let frame_period = if frame_rate_hz > 0.0 {
            1.0 / frame_rate_hz
        } else {
            0.0
        };
        Self {
            frame: DepthFrame::default(),
            rng: StdRng::seed_from_u64(seed),
            frame_period,
            time: 0.0,
            orbit_period: 8.0,
            blob_radius: 60.0,
            noise: 6,
        }
    }

    pub fn with_noise(mut self, noise: u8) -> Self {
        self.noise = noise;
        self
    }

    /// Blob center in pixels at the current time
    pub fn blob_center(&self) -> (f64, f64) {
        let (width, height) = (self.frame.width() as f64, self.frame.height() as f64);
        let angle = TAU * self.time / self.orbit_period;
        let orbit = height * 0.3;
        (
            width / 2.0 + orbit * angle.cos(),
            height / 2.0 + orbit * angle.sin(),
        )
    }
}

impl SensorSource for SyntheticDepthCamera {
    fn name(&self) -> &str {
        "synthetic depth camera"
    }

    fn update(&mut self) -> ShapeResult<()> {
        let (cx, cy) = self.blob_center();
        let width = self.frame.width();
        let two_sigma_sq = 2.0 * self.blob_radius * self.blob_radius;
        let noise = self.noise;
        let rng = &mut self.rng;

        let pixels = self.frame.begin_frame();
        for (i, pixel) in pixels.iter_mut().enumerate() {
            let dx = (i % width) as f64 - cx;
            let dy = (i / width) as f64 - cy;
            let depth = 255.0 * (-(dx * dx + dy * dy) / two_sigma_sq).exp();
            let jitter = if noise > 0 { rng.gen_range(0..=noise) } else { 0 };
            *pixel = (depth as u8).saturating_add(jitter);
        }

        self.time += self.frame_period;
        if self.frame.frame_number() % 300 == 0 {
            debug!("Synthetic depth frame {}", self.frame.frame_number());
        }
        Ok(())
    }

    fn depth_frame(&self) -> &DepthFrame {
        &self.frame
    }

    fn shutdown(&mut self) -> ShapeResult<()> {
        info!(
            "Synthetic depth camera stopped after {} frames",
            self.frame.frame_number()
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shape_core::core::sensor::{DEPTH_FRAME_HEIGHT, DEPTH_FRAME_WIDTH};

    #[test]
    fn test_frame_counts_and_size() {
        let mut camera = SyntheticDepthCamera::new(7, 30.0);
        assert_eq!(camera.depth_frame().frame_number(), 0);
        camera.update().unwrap();
        camera.update().unwrap();
        let frame = camera.depth_frame();
        assert_eq!(frame.frame_number(), 2);
        assert_eq!(frame.width(), DEPTH_FRAME_WIDTH);
        assert_eq!(frame.height(), DEPTH_FRAME_HEIGHT);
        assert_eq!(frame.pixels().len(), 640 * 480);
    }

    #[test]
    fn test_same_seed_same_frames() {
        let mut a = SyntheticDepthCamera::new(42, 30.0);
        let mut b = SyntheticDepthCamera::new(42, 30.0);
        for _ in 0..3 {
            a.update().unwrap();
            b.update().unwrap();
        }
        assert_eq!(a.depth_frame().pixels(), b.depth_frame().pixels());
    }

    #[test]
    fn test_blob_is_brightest_near_center() {
        let mut camera = SyntheticDepthCamera::new(1, 30.0).with_noise(0);
        let (cx, cy) = camera.blob_center();
        camera.update().unwrap();
        let frame = camera.depth_frame();

        assert_eq!(frame.depth(cx.round() as usize, cy.round() as usize), 255);
        assert_eq!(frame.depth(0, 0), 0);
    }

    #[test]
    fn test_blob_moves() {
        let mut camera = SyntheticDepthCamera::new(1, 30.0);
        let start = camera.blob_center();
        camera.update().unwrap();
        assert_ne!(camera.blob_center(), start);
    }
}
