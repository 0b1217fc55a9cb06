//! Fixed-size height grids
//!
//! Every grid in a running display shares one [`GridSize`]. Storage is a flat
//! row-major `Vec<u8>` allocated once; per-tick updates write in place.

use crate::error::{ShapeError, ShapeResult};
use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Index, IndexMut};
use std::sync::Arc;

/// Pin counts along each axis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GridSize {
    pub x: usize,
    pub y: usize,
}

impl GridSize {
    pub const fn new(x: usize, y: usize) -> Self {
        Self { x, y }
    }

    pub const fn pin_count(&self) -> usize {
        self.x * self.y
    }

    #[inline]
    pub fn contains(&self, x: usize, y: usize) -> bool {
        x < self.x && y < self.y
    }

    #[inline]
    pub(crate) fn index(&self, x: usize, y: usize) -> usize {
        debug_assert!(self.contains(x, y), "pin ({}, {}) outside {}", x, y, self);
        y * self.x + x
    }

    /// Fail with `GridMismatch` unless `other` equals this size
    pub fn ensure_matches(&self, other: GridSize) -> ShapeResult<()> {
        if *self == other {
            Ok(())
        } else {
            Err(ShapeError::GridMismatch {
                expected: *self,
                actual: other,
            })
        }
    }
}

impl fmt::Display for GridSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.x, self.y)
    }
}

/// 2-D grid of pin heights (0 = fully retracted, 255 = fully extended)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeightField {
    size: GridSize,
    heights: Vec<u8>,
}

impl HeightField {
    /// Allocate a zeroed grid
    pub fn zeroed(size: GridSize) -> Self {
        Self::filled(size, 0)
    }

    pub fn filled(size: GridSize, height: u8) -> Self {
        Self {
            size,
            heights: vec![height; size.pin_count()],
        }
    }

    pub fn size(&self) -> GridSize {
        self.size
    }

    #[inline]
    pub fn get(&self, x: usize, y: usize) -> u8 {
        self.heights[self.size.index(x, y)]
    }

    #[inline]
    pub fn set(&mut self, x: usize, y: usize, height: u8) {
        let idx = self.size.index(x, y);
        self.heights[idx] = height;
    }

    pub fn fill(&mut self, height: u8) {
        self.heights.fill(height);
    }

    /// Copy every height from `other` without reallocating
    pub fn copy_from(&mut self, other: &HeightField) -> ShapeResult<()> {
        self.size.ensure_matches(other.size)?;
        self.heights.copy_from_slice(&other.heights);
        Ok(())
    }

    /// Row-major view of all heights
    pub fn as_slice(&self) -> &[u8] {
        &self.heights
    }

    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        &mut self.heights
    }

    /// Heights of row `y`
    pub fn row(&self, y: usize) -> &[u8] {
        let start = self.size.index(0, y);
        &self.heights[start..start + self.size.x]
    }

    pub fn row_mut(&mut self, y: usize) -> &mut [u8] {
        let start = self.size.index(0, y);
        let width = self.size.x;
        &mut self.heights[start..start + width]
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, usize, u8)> + '_ {
        let width = self.size.x;
        self.heights
            .iter()
            .enumerate()
            .map(move |(i, h)| (i % width, i / width, *h))
    }
}

impl Index<(usize, usize)> for HeightField {
    type Output = u8;

    fn index(&self, (x, y): (usize, usize)) -> &u8 {
        &self.heights[self.size.index(x, y)]
    }
}

impl IndexMut<(usize, usize)> for HeightField {
    fn index_mut(&mut self, (x, y): (usize, usize)) -> &mut u8 {
        let idx = self.size.index(x, y);
        &mut self.heights[idx]
    }
}

/// Height field written by the orchestrator and read by applications
///
/// Only the orchestrator holds a `SharedHeightField`; applications receive a
/// [`HeightFieldReader`] which cannot write.
#[derive(Debug)]
pub struct SharedHeightField {
    inner: Arc<RwLock<HeightField>>,
}

impl SharedHeightField {
    pub fn zeroed(size: GridSize) -> Self {
        Self {
            inner: Arc::new(RwLock::new(HeightField::zeroed(size))),
        }
    }

    pub fn reader(&self) -> HeightFieldReader {
        HeightFieldReader {
            inner: self.inner.clone(),
        }
    }

    pub fn read(&self) -> RwLockReadGuard<'_, HeightField> {
        self.inner.read()
    }

    pub fn write(&self) -> RwLockWriteGuard<'_, HeightField> {
        self.inner.write()
    }
}

/// Read-only handle onto the measured heights
#[derive(Debug, Clone)]
pub struct HeightFieldReader {
    inner: Arc<RwLock<HeightField>>,
}

impl HeightFieldReader {
    pub fn read(&self) -> RwLockReadGuard<'_, HeightField> {
        self.inner.read()
    }

    pub fn size(&self) -> GridSize {
        self.inner.read().size()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zeroed_grid() {
        let field = HeightField::zeroed(GridSize::new(4, 3));
        assert_eq!(field.as_slice().len(), 12);
        assert!(field.as_slice().iter().all(|&h| h == 0));
    }

    #[test]
    fn test_row_major_layout() {
        let mut field = HeightField::zeroed(GridSize::new(4, 3));
        field.set(3, 1, 200);
        field[(0, 2)] = 17;

        assert_eq!(field.row(1), &[0, 0, 0, 200]);
        assert_eq!(field.get(0, 2), 17);
        assert_eq!(field.as_slice()[7], 200);
    }

    #[test]
    fn test_copy_from_rejects_mismatch() {
        let mut field = HeightField::zeroed(GridSize::new(4, 3));
        let other = HeightField::filled(GridSize::new(3, 4), 9);

        match field.copy_from(&other) {
            Err(ShapeError::GridMismatch { expected, actual }) => {
                assert_eq!(expected, GridSize::new(4, 3));
                assert_eq!(actual, GridSize::new(3, 4));
            }
            other => panic!("expected GridMismatch, got {:?}", other),
        }
    }

    #[test]
    fn test_reader_sees_writes() {
        let shared = SharedHeightField::zeroed(GridSize::new(2, 2));
        let reader = shared.reader();

        shared.write().fill(42);
        assert_eq!(reader.read().get(1, 1), 42);
        assert_eq!(reader.size(), GridSize::new(2, 2));
    }

    #[test]
    fn test_iter_coordinates() {
        let mut field = HeightField::zeroed(GridSize::new(3, 2));
        field.set(2, 1, 5);
        let hit: Vec<_> = field.iter().filter(|(_, _, h)| *h == 5).collect();
        assert_eq!(hit, vec![(2, 1, 5)]);
    }
}
