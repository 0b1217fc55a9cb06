use crate::core::Timestamp;

/// Smoothed frame rate measured from tick-to-tick intervals
///
/// Reports 0 until two ticks have been observed.
#[derive(Debug, Clone)]
pub struct FrameRateMeter {
    last_tick: Option<Timestamp>,
    rate_hz: f64,
    smoothing: f64,
}

impl Default for FrameRateMeter {
    fn default() -> Self {
        Self::new(0.1)
    }
}

impl FrameRateMeter {
    /// `smoothing` is the weight of the newest interval (0 < smoothing <= 1)
    pub fn new(smoothing: f64) -> Self {
        Self {
            last_tick: None,
            rate_hz: 0.0,
            smoothing: smoothing.clamp(f64::EPSILON, 1.0),
        }
    }

    /// Record a tick at `now` and return the updated rate
    pub fn sample(&mut self, now: Timestamp) -> f64 {
        if let Some(last) = self.last_tick {
            let interval = now.since(last);
            if interval > 0.0 {
                let instant_rate = 1.0 / interval;
                self.rate_hz = if self.rate_hz > 0.0 {
                    self.rate_hz * (1.0 - self.smoothing) + instant_rate * self.smoothing
                } else {
                    instant_rate
                };
            }
        }
        self.last_tick = Some(now);
        self.rate_hz
    }

    pub fn rate_hz(&self) -> f64 {
        self.rate_hz
    }

    /// Seconds per frame at the current rate, or 0 before the rate is known
    pub fn frame_interval(&self) -> f64 {
        if self.rate_hz > 0.0 {
            1.0 / self.rate_hz
        } else {
            0.0
        }
    }
}
