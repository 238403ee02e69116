//! Per-pixel collision masks

use crate::error::AssetError;

/// Pixels with alpha above this value are solid
pub const ALPHA_THRESHOLD: u8 = 127;

/// Bit mask of the solid pixels of a sprite
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollisionMask {
    width: u32,
    height: u32,
    /// One bit per pixel, row-major, packed into 64-bit words
    bits: Vec<u64>,
}

impl CollisionMask {
    /// Empty mask of the given size
    pub fn new(width: u32, height: u32) -> Self {
        let len = (width as usize * height as usize).div_ceil(64);
        Self {
            width,
            height,
            bits: vec![0; len],
        }
    }

    /// Build a mask from a predicate over pixel coordinates
    pub fn from_fn(width: u32, height: u32, mut solid: impl FnMut(u32, u32) -> bool) -> Self {
        let mut mask = Self::new(width, height);
        for y in 0..height {
            for x in 0..width {
                if solid(x, y) {
                    mask.set(x, y, true);
                }
            }
        }
        mask
    }

    /// Build a mask from an RGBA buffer
    pub fn from_rgba(width: u32, height: u32, rgba: &[u8]) -> Result<Self, AssetError> {
        let expected = width as usize * height as usize * 4;
        if rgba.len() != expected {
            return Err(AssetError::Dimensions {
                width,
                height,
                actual: rgba.len(),
            });
        }
        Ok(Self::from_fn(width, height, |x, y| {
            let idx = (y as usize * width as usize + x as usize) * 4;
            rgba[idx + 3] > ALPHA_THRESHOLD
        }))
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    #[inline]
    fn index(&self, x: u32, y: u32) -> usize {
        y as usize * self.width as usize + x as usize
    }

    /// True if the pixel is solid; out-of-range pixels are empty
    #[inline]
    pub fn get(&self, x: u32, y: u32) -> bool {
        if x >= self.width || y >= self.height {
            return false;
        }
        let i = self.index(x, y);
        self.bits[i / 64] & (1 << (i % 64)) != 0
    }

    pub fn set(&mut self, x: u32, y: u32, solid: bool) {
        if x >= self.width || y >= self.height {
            return;
        }
        let i = self.index(x, y);
        if solid {
            self.bits[i / 64] |= 1 << (i % 64);
        } else {
            self.bits[i / 64] &= !(1 << (i % 64));
        }
    }

    /// Number of solid pixels
    pub fn count(&self) -> usize {
        self.bits.iter().map(|w| w.count_ones() as usize).sum()
    }

    /// Mirror top to bottom
    pub fn flip_vertical(&self) -> Self {
        Self::from_fn(self.width, self.height, |x, y| {
            self.get(x, self.height - 1 - y)
        })
    }

    /// First solid pixel shared with `other`, in this mask's coordinates
    ///
    /// `offset` is the position of `other`'s top-left corner relative to
    /// this mask's top-left corner. Pixels are scanned row by row.
    pub fn overlap(&self, other: &CollisionMask, offset: (i32, i32)) -> Option<(i32, i32)> {
        let (dx, dy) = offset;
        let x_start = dx.max(0);
        let y_start = dy.max(0);
        let x_end = (self.width as i32).min(dx + other.width as i32);
        let y_end = (self.height as i32).min(dy + other.height as i32);

        for y in y_start..y_end {
            for x in x_start..x_end {
                if self.get(x as u32, y as u32) && other.get((x - dx) as u32, (y - dy) as u32) {
                    return Some((x, y));
                }
            }
        }
        None
    }
}
