//! Owned single-channel `f64` plane in row-major layout.
//!
//! 8-bit planes use [`image::GrayImage`] directly. Gradients, Laplacian
//! responses and magnitudes live in [`FloatPlane`] until they are quantized
//! back to 8 bits by the [`normalize`](crate::normalize) helpers.

use image::GrayImage;

/// A `width × height` grid of `f64` samples.
#[derive(Debug, Clone, PartialEq)]
pub struct FloatPlane {
    width: u32,
    height: u32,
    data: Vec<f64>,
}

impl FloatPlane {
    /// Create a zero-filled plane.
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        Self::from_pixel(width, height, 0.0)
    }

    /// Create a plane with every sample set to `value`.
    #[must_use]
    pub fn from_pixel(width: u32, height: u32, value: f64) -> Self {
        Self {
            width,
            height,
            data: vec![value; width as usize * height as usize],
        }
    }

    /// Build a plane by evaluating `f(x, y)` at every sample.
    #[must_use]
    pub fn from_fn(width: u32, height: u32, mut f: impl FnMut(u32, u32) -> f64) -> Self {
        let mut data = Vec::with_capacity(width as usize * height as usize);
        for y in 0..height {
            for x in 0..width {
                data.push(f(x, y));
            }
        }
        Self {
            width,
            height,
            data,
        }
    }

    /// Wrap an existing row-major buffer.
    ///
    /// Returns `None` when `data.len() != width * height`.
    #[must_use]
    pub fn from_raw(width: u32, height: u32, data: Vec<f64>) -> Option<Self> {
        (data.len() == width as usize * height as usize).then_some(Self {
            width,
            height,
            data,
        })
    }

    /// Widen an 8-bit plane into the working domain.
    #[must_use]
    pub fn from_gray(image: &GrayImage) -> Self {
        Self {
            width: image.width(),
            height: image.height(),
            data: image.as_raw().iter().map(|&v| f64::from(v)).collect(),
        }
    }

    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    #[must_use]
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// `(width, height)`, matching `image::GenericImageView::dimensions`.
    #[must_use]
    pub const fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    #[inline]
    const fn index(&self, x: u32, y: u32) -> usize {
        y as usize * self.width as usize + x as usize
    }

    /// Sample at `(x, y)`.
    ///
    /// # Panics
    ///
    /// Panics if `(x, y)` is outside the plane.
    #[inline]
    #[must_use]
    pub fn get(&self, x: u32, y: u32) -> f64 {
        self.data[self.index(x, y)]
    }

    /// Overwrite the sample at `(x, y)`.
    ///
    /// # Panics
    ///
    /// Panics if `(x, y)` is outside the plane.
    #[inline]
    pub fn set(&mut self, x: u32, y: u32, value: f64) {
        let i = self.index(x, y);
        self.data[i] = value;
    }

    /// All samples in row-major order.
    #[must_use]
    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }

    /// Apply `f` to every sample, producing a new plane of the same shape.
    #[must_use]
    pub fn map(&self, f: impl Fn(f64) -> f64) -> Self {
        Self {
            width: self.width,
            height: self.height,
            data: self.data.iter().map(|&v| f(v)).collect(),
        }
    }

    /// Combine two planes sample by sample.
    ///
    /// Both planes must share dimensions; every plane derived from one
    /// image does.
    #[must_use]
    pub fn zip_map(&self, other: &Self, f: impl Fn(f64, f64) -> f64) -> Self {
        debug_assert_eq!(self.dimensions(), other.dimensions());
        Self {
            width: self.width,
            height: self.height,
            data: self
                .data
                .iter()
                .zip(&other.data)
                .map(|(&a, &b)| f(a, b))
                .collect(),
        }
    }

    /// Smallest and largest sample, or `None` for an empty plane.
    #[must_use]
    pub fn min_max(&self) -> Option<(f64, f64)> {
        self.data.iter().fold(None, |acc, &v| match acc {
            None => Some((v, v)),
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_fn_is_row_major() {
        let plane = FloatPlane::from_fn(3, 2, |x, y| f64::from(y * 10 + x));
        assert_eq!(plane.as_slice(), &[0.0, 1.0, 2.0, 10.0, 11.0, 12.0]);
        assert!((plane.get(2, 1) - 12.0).abs() < f64::EPSILON);
    }

    #[test]
    fn from_raw_rejects_wrong_length() {
        assert!(FloatPlane::from_raw(2, 2, vec![0.0; 3]).is_none());
        assert!(FloatPlane::from_raw(2, 2, vec![0.0; 4]).is_some());
    }

    #[test]
    fn from_gray_widens_samples() {
        let gray = GrayImage::from_fn(2, 2, |x, y| image::Luma([u8::try_from(x + 2 * y).unwrap_or(0) * 50]));
        let plane = FloatPlane::from_gray(&gray);
        assert_eq!(plane.dimensions(), (2, 2));
        assert_eq!(plane.as_slice(), &[0.0, 50.0, 100.0, 150.0]);
    }

    #[test]
    fn min_max_of_empty_plane_is_none() {
        assert!(FloatPlane::new(0, 0).min_max().is_none());
    }

    #[test]
    fn min_max_finds_extremes() {
        let plane = FloatPlane::from_raw(2, 2, vec![3.0, -1.5, 7.25, 0.0]).unwrap_or_else(|| FloatPlane::new(0, 0));
        assert_eq!(plane.min_max(), Some((-1.5, 7.25)));
    }

    #[test]
    fn set_then_get() {
        let mut plane = FloatPlane::new(4, 3);
        plane.set(3, 2, 9.5);
        assert!((plane.get(3, 2) - 9.5).abs() < f64::EPSILON);
        assert!(plane.get(0, 0).abs() < f64::EPSILON);
    }
}
