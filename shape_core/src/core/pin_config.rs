//! Feedback-control tuning for pin actuators

use super::clock::Timestamp;
use super::grid::GridSize;
use crate::error::ShapeResult;
use serde::{Deserialize, Serialize};
use std::ops::{Index, IndexMut};

pub const DEFAULT_GAIN_P: f64 = 1.5;
pub const DEFAULT_GAIN_I: f64 = 0.045;
pub const DEFAULT_MAX_I: u8 = 25;
pub const DEFAULT_DEAD_ZONE: u8 = 2;
pub const DEFAULT_MAX_SPEED: u16 = 200;

/// Tuning record for one pin (or all pins when applied globally)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PinConfig {
    /// Proportional gain
    pub gain_p: f64,
    /// Integral gain
    pub gain_i: f64,
    /// Integral clamp (anti-windup)
    pub max_i: u8,
    /// Position error ignored by the controller, in height units
    pub dead_zone: u8,
    /// Maximum actuation speed, in height units per second
    pub max_speed: u16,
    /// When this record last changed
    pub time_of_update: Timestamp,
}

impl Default for PinConfig {
    fn default() -> Self {
        Self {
            gain_p: DEFAULT_GAIN_P,
            gain_i: DEFAULT_GAIN_I,
            max_i: DEFAULT_MAX_I,
            dead_zone: DEFAULT_DEAD_ZONE,
            max_speed: DEFAULT_MAX_SPEED,
            time_of_update: Timestamp::ZERO,
        }
    }
}

impl PinConfig {
    pub fn stamped(mut self, time: Timestamp) -> Self {
        self.time_of_update = time;
        self
    }

    /// Compare control parameters, ignoring the update timestamp
    pub fn same_tuning(&self, other: &PinConfig) -> bool {
        self.gain_p == other.gain_p
            && self.gain_i == other.gain_i
            && self.max_i == other.max_i
            && self.dead_zone == other.dead_zone
            && self.max_speed == other.max_speed
    }
}

/// One tuning record per pin
#[derive(Debug, Clone, PartialEq)]
pub struct PinConfigGrid {
    size: GridSize,
    configs: Vec<PinConfig>,
}

impl PinConfigGrid {
    pub fn uniform(size: GridSize, config: PinConfig) -> Self {
        Self {
            size,
            configs: vec![config; size.pin_count()],
        }
    }

    pub fn size(&self) -> GridSize {
        self.size
    }

    #[inline]
    pub fn get(&self, x: usize, y: usize) -> &PinConfig {
        &self.configs[self.size.index(x, y)]
    }

    #[inline]
    pub fn set(&mut self, x: usize, y: usize, config: PinConfig) {
        let idx = self.size.index(x, y);
        self.configs[idx] = config;
    }

    /// Apply one record to every pin
    pub fn fill(&mut self, config: PinConfig) {
        self.configs.fill(config);
    }

    pub fn copy_from(&mut self, other: &PinConfigGrid) -> ShapeResult<()> {
        self.size.ensure_matches(other.size)?;
        self.configs.copy_from_slice(&other.configs);
        Ok(())
    }

    pub fn as_slice(&self) -> &[PinConfig] {
        &self.configs
    }

    /// Newest `time_of_update` of any pin
    pub fn latest_update(&self) -> Timestamp {
        self.configs
            .iter()
            .map(|c| c.time_of_update)
            .fold(Timestamp::ZERO, |acc, t| if t > acc { t } else { acc })
    }

    /// The shared record if every pin carries the same tuning
    pub fn uniform_config(&self) -> Option<PinConfig> {
        let first = *self.configs.first()?;
        self.configs
            .iter()
            .all(|c| c.same_tuning(&first))
            .then_some(first)
    }
}

impl Index<(usize, usize)> for PinConfigGrid {
    type Output = PinConfig;

    fn index(&self, (x, y): (usize, usize)) -> &PinConfig {
        self.get(x, y)
    }
}

impl IndexMut<(usize, usize)> for PinConfigGrid {
    fn index_mut(&mut self, (x, y): (usize, usize)) -> &mut PinConfig {
        let idx = self.size.index(x, y);
        &mut self.configs[idx]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_constants() {
        let config = PinConfig::default();
        assert_eq!(config.gain_p, DEFAULT_GAIN_P);
        assert_eq!(config.max_speed, DEFAULT_MAX_SPEED);
        assert_eq!(config.time_of_update, Timestamp::ZERO);
    }

    #[test]
    fn test_uniform_detection() {
        let size = GridSize::new(3, 3);
        let mut grid = PinConfigGrid::uniform(size, PinConfig::default());
        assert!(grid.uniform_config().is_some());

        grid[(1, 2)].gain_p = 3.0;
        assert!(grid.uniform_config().is_none());
    }

    #[test]
    fn test_latest_update() {
        let size = GridSize::new(2, 2);
        let mut grid = PinConfigGrid::uniform(size, PinConfig::default());
        grid.set(
            1,
            0,
            PinConfig::default().stamped(Timestamp::from_secs(4.0)),
        );
        assert_eq!(grid.latest_update(), Timestamp::from_secs(4.0));
    }
}
