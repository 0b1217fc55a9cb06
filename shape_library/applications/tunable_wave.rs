use shape_core::{
    Application, Clock, GraphicsBuffer, HeightField, Key, PinConfig, PinConfigGrid, Timestamp,
};
use std::f64::consts::TAU;
use std::sync::Arc;

const FREQUENCY_RANGE: (f64, f64) = (0.05, 5.0);
const WAVELENGTH_RANGE: (f64, f64) = (2.0, 60.0);
const GAIN_P_STEP: f64 = 0.1;
// Largest gain the config packet can carry
const GAIN_P_MAX: f64 = 10.2;
const MAX_SPEED_STEP: u16 = 20;
const MAX_SPEED_RANGE: (u16, u16) = (20, 500);

/// A travelling sine wave with live-adjustable tuning
///
/// | Key     | Effect                 |
/// |---------|------------------------|
/// | `a`/`z` | frequency up/down      |
/// | `s`/`x` | wavelength up/down     |
/// | `d`/`c` | amplitude up/down      |
/// | `f`/`v` | proportional gain up/down |
/// | `g`/`b` | max speed up/down      |
pub struct TunableWaveApp {
    clock: Arc<dyn Clock>,
    phase: f64,
    /// Cycles per second
    frequency: f64,
    /// Pins per cycle
    wavelength: f64,
    /// Fraction of the full height range, 0..=1
    amplitude: f64,
    tuning: PinConfig,
    tuning_changed: Timestamp,
}

impl TunableWaveApp {
    pub const NAME: &'static str = "demo";

    /// `tuning` is the profile the display starts with; keys adjust it from there
    pub fn new(clock: Arc<dyn Clock>, tuning: PinConfig) -> Self {
        Self {
            clock,
            phase: 0.0,
            frequency: 0.5,
            wavelength: 12.0,
            amplitude: 0.8,
            tuning: tuning.stamped(Timestamp::ZERO),
            tuning_changed: Timestamp::ZERO,
        }
    }

    pub fn frequency(&self) -> f64 {
        self.frequency
    }

    pub fn wavelength(&self) -> f64 {
        self.wavelength
    }

    pub fn amplitude(&self) -> f64 {
        self.amplitude
    }

    pub fn tuning(&self) -> &PinConfig {
        &self.tuning
    }

    /// Height of column `x` at the current phase
    pub fn height_at(&self, x: f64) -> u8 {
        let angle = TAU * (x / self.wavelength - self.phase);
        let height = 127.5 + self.amplitude * 127.5 * angle.sin();
        height.round().clamp(0.0, 255.0) as u8
    }

    fn retune(&mut self, change: impl FnOnce(&mut PinConfig)) {
        let before = self.tuning;
        change(&mut self.tuning);
        if !self.tuning.same_tuning(&before) {
            self.tuning_changed = self.clock.now();
            self.tuning.time_of_update = self.tuning_changed;
        }
    }
}

impl Application for TunableWaveApp {
    fn display_name(&self) -> &str {
        "Tunable Wave"
    }

    fn instructions(&self) -> String {
        format!(
            "a/z frequency ({:.2} Hz)\n\
             s/x wavelength ({:.0} pins)\n\
             d/c amplitude ({:.0}%)\n\
             f/v gain_p ({:.1})\n\
             g/b max speed ({})",
            self.frequency,
            self.wavelength,
            self.amplitude * 100.0,
            self.tuning.gain_p,
            self.tuning.max_speed,
        )
    }

    fn advance(&mut self, elapsed: f64) {
        self.phase = (self.phase + self.frequency * elapsed).fract();
    }

    fn write_heights(&self, out: &mut HeightField) {
        let size = out.size();
        for y in 0..size.y {
            let row = out.row_mut(y);
            for (x, height) in row.iter_mut().enumerate() {
                *height = self.height_at(x as f64);
            }
        }
    }

    fn tuning_last_changed(&self) -> Timestamp {
        self.tuning_changed
    }

    fn write_tuning(&self, out: &mut PinConfigGrid) {
        out.fill(self.tuning);
    }

    fn draw_overlay(&self, surface: &mut GraphicsBuffer) {
        // Wave profile as vertical bars across the surface
        let width = surface.width();
        let height = surface.height();
        if width == 0 || height == 0 {
            return;
        }
        let columns = (self.wavelength * 2.0).ceil() as usize;
        let bar_width = (width / columns).max(1);
        for column in 0..columns {
            let bar = self.height_at(column as f64) as usize * height / 255;
            surface.fill_rect(
                column * bar_width,
                height - bar,
                bar_width,
                bar,
                [40, 160, 255, 255],
            );
        }
    }

    fn on_key(&mut self, key: Key) {
        let Key::Char(c) = key else {
            return;
        };
        match c {
            'a' => self.frequency = (self.frequency * 1.25).min(FREQUENCY_RANGE.1),
            'z' => self.frequency = (self.frequency / 1.25).max(FREQUENCY_RANGE.0),
            's' => self.wavelength = (self.wavelength + 1.0).min(WAVELENGTH_RANGE.1),
            'x' => self.wavelength = (self.wavelength - 1.0).max(WAVELENGTH_RANGE.0),
            'd' => self.amplitude = (self.amplitude + 0.05).min(1.0),
            'c' => self.amplitude = (self.amplitude - 0.05).max(0.0),
            'f' => self.retune(|t| t.gain_p = (t.gain_p + GAIN_P_STEP).min(GAIN_P_MAX)),
            'v' => self.retune(|t| t.gain_p = (t.gain_p - GAIN_P_STEP).max(0.0)),
            'g' => self.retune(|t| {
                t.max_speed = (t.max_speed + MAX_SPEED_STEP).min(MAX_SPEED_RANGE.1)
            }),
            'b' => self.retune(|t| {
                t.max_speed = t
                    .max_speed
                    .saturating_sub(MAX_SPEED_STEP)
                    .max(MAX_SPEED_RANGE.0)
            }),
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use shape_core::{GridSize, ManualClock};

    fn app() -> (TunableWaveApp, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new(0.0));
        (TunableWaveApp::new(clock.clone(), PinConfig::default()), clock)
    }

    #[test]
    fn test_wave_shape() {
        let (app, _) = app();
        let mut heights = HeightField::zeroed(GridSize::new(30, 30));
        app.write_heights(&mut heights);

        // sin(0) at column 0, crest a quarter wavelength later
        assert_eq!(heights.get(0, 0), 128);
        assert_eq!(heights.get(3, 0), 230);
        assert_eq!(heights.get(9, 0), 26);
        // Every row is the same
        assert_eq!(heights.row(0), heights.row(29));
    }

    #[test]
    fn test_advance_moves_wave() {
        let (mut app, _) = app();
        let before = app.height_at(0.0);
        app.advance(0.0);
        assert_eq!(app.height_at(0.0), before);

        // One full period at 0.5 Hz
        app.advance(2.0);
        assert_eq!(app.height_at(0.0), before);

        // A quarter period moves the crest a quarter wavelength along
        app.advance(0.5);
        assert_eq!(app.height_at(6.0), 230);
    }

    #[test]
    fn test_shape_keys_do_not_touch_tuning() {
        let (mut app, clock) = app();
        clock.set(2.0);
        for c in ['a', 's', 'd', 'z', 'x', 'c', 'q'] {
            app.on_key(Key::Char(c));
        }
        app.on_key(Key::Up);
        assert_eq!(app.tuning_last_changed(), Timestamp::ZERO);
        assert_relative_eq!(app.frequency(), 0.5, epsilon = 1e-12);
        assert_eq!(app.wavelength(), 12.0);
    }

    #[test]
    fn test_gain_key_stamps_tuning() {
        let (mut app, clock) = app();
        clock.set(4.5);
        app.on_key(Key::Char('f'));
        assert_eq!(app.tuning_last_changed(), Timestamp::from_secs(4.5));
        assert_relative_eq!(app.tuning().gain_p, 1.6);

        let mut grid = PinConfigGrid::uniform(GridSize::new(4, 4), PinConfig::default());
        app.write_tuning(&mut grid);
        assert_relative_eq!(grid.get(3, 3).gain_p, 1.6);
        assert_eq!(grid.get(0, 0).time_of_update, Timestamp::from_secs(4.5));
    }

    #[test]
    fn test_retune_starts_from_configured_tuning() {
        let clock = Arc::new(ManualClock::new(0.0));
        let configured = PinConfig {
            gain_p: 3.0,
            max_speed: 120,
            ..PinConfig::default()
        };
        let mut app = TunableWaveApp::new(clock.clone(), configured);
        assert_eq!(app.tuning_last_changed(), Timestamp::ZERO);
        assert!(app.instructions().contains("gain_p (3.0)"));

        clock.set(1.0);
        app.on_key(Key::Char('f'));
        assert_relative_eq!(app.tuning().gain_p, 3.1, epsilon = 1e-9);
        assert_eq!(app.tuning().max_speed, 120);

        app.on_key(Key::Char('b'));
        assert_eq!(app.tuning().max_speed, 100);
        assert_relative_eq!(app.tuning().gain_i, configured.gain_i);
    }

    #[test]
    fn test_speed_limits() {
        let (mut app, clock) = app();
        for _ in 0..50 {
            app.on_key(Key::Char('g'));
        }
        assert_eq!(app.tuning().max_speed, 500);

        clock.set(1.0);
        let stamped = app.tuning_last_changed();
        // Already at the limit: nothing changes, nothing is stamped
        app.on_key(Key::Char('g'));
        assert_eq!(app.tuning_last_changed(), stamped);

        for _ in 0..50 {
            app.on_key(Key::Char('b'));
        }
        assert_eq!(app.tuning().max_speed, 20);
        assert_eq!(app.tuning_last_changed(), Timestamp::from_secs(1.0));
    }

    #[test]
    fn test_overlay_draws_something() {
        let (app, _) = app();
        let mut surface = GraphicsBuffer::new(300, 300);
        app.draw_overlay(&mut surface);
        assert!(!surface.is_blank());
    }
}
