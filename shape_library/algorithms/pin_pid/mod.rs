//! Per-pin PI position controller
//!
//! Model of the control loop a board runs for each pin: the output is a
//! velocity in height units per second, limited by the pin's maximum speed.
//!
//! # Features
//!
//! - Proportional and integral terms
//! - Anti-windup (integral clamp)
//! - Error dead zone
//! - Speed limiting
//!
//! # Example
//!
//! ```rust
//! use shape_library::algorithms::pin_pid::PinPid;
//! use shape_core::PinConfig;
//!
//! let mut pid = PinPid::from_config(&PinConfig::default());
//! let mut position = 0.0;
//! for _ in 0..30 {
//!     position = pid.step(200.0, position, 1.0 / 30.0);
//! }
//! assert!(position > 0.0);
//! ```

use shape_core::PinConfig;

/// Lowest and highest reachable pin positions
pub const POSITION_MIN: f64 = 0.0;
pub const POSITION_MAX: f64 = 255.0;

/// PI controller for one pin
#[derive(Debug, Clone)]
pub struct PinPid {
    kp: f64,
    ki: f64,

    integral: f64,
    integral_limit: f64,

    dead_zone: f64,
    max_speed: f64,
}

impl PinPid {
    pub fn new(kp: f64, ki: f64) -> Self {
        Self {
            kp,
            ki,
            integral: 0.0,
            integral_limit: f64::INFINITY,
            dead_zone: 0.0,
            max_speed: f64::INFINITY,
        }
    }

    pub fn from_config(config: &PinConfig) -> Self {
        let mut pid = Self::new(config.gain_p, config.gain_i);
        pid.apply(config);
        pid
    }

    /// Replace gains and limits; the accumulated integral is clamped to the new limit
    pub fn apply(&mut self, config: &PinConfig) {
        self.kp = config.gain_p;
        self.ki = config.gain_i;
        self.integral_limit = config.max_i as f64;
        self.dead_zone = config.dead_zone as f64;
        self.max_speed = config.max_speed as f64;
        self.integral = self
            .integral
            .clamp(-self.integral_limit, self.integral_limit);
    }

    pub fn reset(&mut self) {
        self.integral = 0.0;
    }

    /// Velocity command for the given target and position
    pub fn compute(&mut self, target: f64, position: f64, dt: f64) -> f64 {
        let mut error = target - position;
        if error.abs() <= self.dead_zone {
            error = 0.0;
        }

        self.integral += error * dt;
        self.integral = self
            .integral
            .clamp(-self.integral_limit, self.integral_limit);

        let output = self.kp * error + self.ki * self.integral;
        output.clamp(-self.max_speed, self.max_speed)
    }

    /// Advance `position` toward `target` by one time step
    pub fn step(&mut self, target: f64, position: f64, dt: f64) -> f64 {
        if dt <= 0.0 {
            return position;
        }
        let velocity = self.compute(target, position, dt);
        (position + velocity * dt).clamp(POSITION_MIN, POSITION_MAX)
    }

    pub fn integral(&self) -> f64 {
        self.integral
    }

    pub fn gains(&self) -> (f64, f64) {
        (self.kp, self.ki)
    }

    pub fn max_speed(&self) -> f64 {
        self.max_speed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_proportional_only() {
        let mut pid = PinPid::new(2.0, 0.0);
        // 2.0 * 20.0
        assert_relative_eq!(pid.compute(100.0, 80.0, 0.01), 40.0);
    }

    #[test]
    fn test_speed_limit() {
        let config = PinConfig {
            gain_p: 10.0,
            max_speed: 50,
            ..PinConfig::default()
        };
        let mut pid = PinPid::from_config(&config);
        assert_eq!(pid.compute(255.0, 0.0, 0.01), 50.0);
        assert_eq!(pid.compute(0.0, 255.0, 0.01), -50.0);
    }

    #[test]
    fn test_dead_zone() {
        let config = PinConfig {
            dead_zone: 5,
            ..PinConfig::default()
        };
        let mut pid = PinPid::from_config(&config);
        assert_eq!(pid.compute(100.0, 97.0, 0.01), 0.0);
        assert!(pid.compute(100.0, 90.0, 0.01) > 0.0);
    }

    #[test]
    fn test_integral_anti_windup() {
        let config = PinConfig {
            gain_p: 0.0,
            gain_i: 1.0,
            max_i: 10,
            ..PinConfig::default()
        };
        let mut pid = PinPid::from_config(&config);
        for _ in 0..100 {
            pid.compute(255.0, 0.0, 0.1);
        }
        assert_eq!(pid.integral(), 10.0);

        // Tighter limit takes effect immediately
        pid.apply(&PinConfig {
            max_i: 3,
            ..config
        });
        assert_eq!(pid.integral(), 3.0);
    }

    #[test]
    fn test_step_converges_and_stays_in_range() {
        let mut pid = PinPid::from_config(&PinConfig::default());
        let mut position = 0.0;
        for _ in 0..300 {
            position = pid.step(180.0, position, 1.0 / 30.0);
            assert!((POSITION_MIN..=POSITION_MAX).contains(&position));
        }
        assert!((position - 180.0).abs() <= 3.0, "position {}", position);
    }

    #[test]
    fn test_zero_dt_holds_position() {
        let mut pid = PinPid::new(1.0, 1.0);
        assert_eq!(pid.step(200.0, 12.0, 0.0), 12.0);
        assert_eq!(pid.integral(), 0.0);
    }
}
