use shape_core::{
    Application, Clock, GraphicsBuffer, HeightField, HeightFieldReader, Key, PinConfig,
    PinConfigGrid, Timestamp,
};
use std::sync::Arc;

pub const MID_HEIGHT: u8 = 128;

/// Low-gain profile that lets the surface be pushed around by hand
pub const SOFT_TUNING: PinConfig = PinConfig {
    gain_p: 0.5,
    gain_i: 0.0,
    max_i: 0,
    dead_zone: 6,
    max_speed: 60,
    time_of_update: Timestamp::ZERO,
};

/// Holds whatever shape the pins are pressed into
///
/// With read-back bound, desired heights follow the measured heights through
/// a first-order filter, so a pin pushed by hand stays where it was left.
/// Without read-back the surface is flat at mid height. `k` toggles between
/// the configured tuning and a soft profile.
pub struct EchoApp {
    clock: Arc<dyn Clock>,
    actual: Option<HeightFieldReader>,
    echo: Vec<f64>,
    /// Filter rate in 1/s
    follow_rate: f64,
    soft: bool,
    stiff: PinConfig,
    tuning_changed: Timestamp,
}

impl EchoApp {
    pub const NAME: &'static str = "echo";

    pub fn new(clock: Arc<dyn Clock>, stiff: PinConfig) -> Self {
        Self {
            clock,
            actual: None,
            echo: Vec::new(),
            follow_rate: 4.0,
            soft: false,
            stiff,
            tuning_changed: Timestamp::ZERO,
        }
    }

    pub fn with_follow_rate(mut self, follow_rate: f64) -> Self {
        self.follow_rate = follow_rate.max(0.0);
        self
    }

    pub fn is_soft(&self) -> bool {
        self.soft
    }

    pub fn has_readback(&self) -> bool {
        self.actual.is_some()
    }

    fn tuning(&self) -> PinConfig {
        let profile = if self.soft { SOFT_TUNING } else { self.stiff };
        profile.stamped(self.tuning_changed)
    }
}

impl Application for EchoApp {
    fn display_name(&self) -> &str {
        "Echo"
    }

    fn instructions(&self) -> String {
        let mode = if self.soft { "soft" } else { "stiff" };
        let source = if self.actual.is_some() {
            "following measured heights"
        } else {
            "no read-back, holding flat"
        };
        format!("k toggle soft pins ({})\n{}", mode, source)
    }

    fn advance(&mut self, elapsed: f64) {
        let Some(actual) = &self.actual else {
            return;
        };
        let actual = actual.read();
        if self.echo.len() != actual.as_slice().len() {
            self.echo = vec![MID_HEIGHT as f64; actual.as_slice().len()];
        }

        let alpha = 1.0 - (-self.follow_rate * elapsed.max(0.0)).exp();
        for (echo, &measured) in self.echo.iter_mut().zip(actual.as_slice()) {
            *echo += (measured as f64 - *echo) * alpha;
        }
    }

    fn write_heights(&self, out: &mut HeightField) {
        if self.echo.len() != out.as_slice().len() {
            out.fill(MID_HEIGHT);
            return;
        }
        for (height, &echo) in out.as_mut_slice().iter_mut().zip(&self.echo) {
            *height = echo.round().clamp(0.0, 255.0) as u8;
        }
    }

    fn tuning_last_changed(&self) -> Timestamp {
        self.tuning_changed
    }

    fn write_tuning(&self, out: &mut PinConfigGrid) {
        out.fill(self.tuning());
    }

    fn draw_overlay(&self, surface: &mut GraphicsBuffer) {
        let color = if self.soft {
            [80, 220, 120, 255]
        } else {
            [220, 220, 220, 255]
        };
        let (width, height) = (surface.width(), surface.height());
        let border = 4;
        surface.fill_rect(0, 0, width, border, color);
        surface.fill_rect(0, height.saturating_sub(border), width, border, color);
        surface.fill_rect(0, 0, border, height, color);
        surface.fill_rect(width.saturating_sub(border), 0, border, height, color);
    }

    fn on_key(&mut self, key: Key) {
        if key == Key::Char('k') {
            self.soft = !self.soft;
            self.tuning_changed = self.clock.now();
        }
    }

    fn bind_readback(&mut self, actual: HeightFieldReader) {
        self.echo = vec![MID_HEIGHT as f64; actual.size().pin_count()];
        self.actual = Some(actual);
    }
}
