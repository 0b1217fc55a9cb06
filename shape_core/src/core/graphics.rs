//! Overlay surface applications draw into each tick
//!
//! Compositing and display of the overlay happen outside this crate; the
//! buffer only collects what an application draws.

/// RGBA8 pixel buffer, allocated once
#[derive(Debug, Clone)]
pub struct GraphicsBuffer {
    width: usize,
    height: usize,
    pixels: Vec<[u8; 4]>,
}

impl GraphicsBuffer {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            pixels: vec![[0, 0, 0, 0]; width * height],
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn clear(&mut self) {
        self.pixels.fill([0, 0, 0, 0]);
    }

    pub fn pixel(&self, x: usize, y: usize) -> Option<[u8; 4]> {
        (x < self.width && y < self.height).then(|| self.pixels[y * self.width + x])
    }

    /// Pixels outside the surface are ignored
    pub fn put_pixel(&mut self, x: usize, y: usize, rgba: [u8; 4]) {
        if x < self.width && y < self.height {
            self.pixels[y * self.width + x] = rgba;
        }
    }

    /// Fill an axis-aligned rectangle, clipped to the surface
    pub fn fill_rect(&mut self, x: usize, y: usize, w: usize, h: usize, rgba: [u8; 4]) {
        let x_end = (x + w).min(self.width);
        let y_end = (y + h).min(self.height);
        for row in y.min(self.height)..y_end {
            let start = row * self.width;
            self.pixels[start + x.min(x_end)..start + x_end].fill(rgba);
        }
    }

    pub fn is_blank(&self) -> bool {
        self.pixels.iter().all(|p| p[3] == 0)
    }

    pub fn as_slice(&self) -> &[[u8; 4]] {
        &self.pixels
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fill_rect_clips() {
        let mut buffer = GraphicsBuffer::new(4, 4);
        buffer.fill_rect(2, 2, 10, 10, [255, 0, 0, 255]);

        assert_eq!(buffer.pixel(3, 3), Some([255, 0, 0, 255]));
        assert_eq!(buffer.pixel(1, 1), Some([0, 0, 0, 0]));
        assert_eq!(buffer.pixel(4, 4), None);
    }

    #[test]
    fn test_clear() {
        let mut buffer = GraphicsBuffer::new(2, 2);
        buffer.put_pixel(0, 0, [1, 2, 3, 255]);
        assert!(!buffer.is_blank());
        buffer.clear();
        assert!(buffer.is_blank());
    }
}
