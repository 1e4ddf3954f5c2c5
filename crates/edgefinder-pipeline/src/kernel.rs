//! Fixed convolution kernels for the edge operators.
//!
//! Every kernel the operators use is a `const` item, so the operator set
//! is closed: there is no path for a caller to supply weights. The only
//! kernel computed at runtime is the Gaussian used by the Canny blur, and
//! its size and sigma are fixed as well.

use std::borrow::Cow;

/// A small signed-weight 2D kernel stored row-major.
#[derive(Debug, Clone, PartialEq)]
pub struct Kernel {
    weights: Cow<'static, [f64]>,
    width: usize,
    height: usize,
}

impl Kernel {
    /// Wrap a static row-major weight table.
    ///
    /// Intended for `const` kernels; a length mismatch fails at compile time.
    #[must_use]
    pub const fn from_static(weights: &'static [f64], width: usize, height: usize) -> Self {
        assert!(weights.len() == width * height, "kernel weights do not match dimensions");
        assert!(width > 0 && height > 0, "kernel must not be empty");
        Self {
            weights: Cow::Borrowed(weights),
            width,
            height,
        }
    }

    /// Build a kernel from computed weights.
    ///
    /// Returns `None` when `weights.len() != width * height` or either
    /// dimension is zero.
    #[must_use]
    pub fn from_vec(weights: Vec<f64>, width: usize, height: usize) -> Option<Self> {
        (width > 0 && height > 0 && weights.len() == width * height).then_some(Self {
            weights: Cow::Owned(weights),
            width,
            height,
        })
    }

    #[must_use]
    pub const fn width(&self) -> usize {
        self.width
    }

    #[must_use]
    pub const fn height(&self) -> usize {
        self.height
    }

    /// Weight at column `x`, row `y`.
    #[inline]
    #[must_use]
    pub fn weight(&self, x: usize, y: usize) -> f64 {
        self.weights[y * self.width + x]
    }

    /// Row-major weights.
    #[must_use]
    pub fn weights(&self) -> &[f64] {
        &self.weights
    }

    /// Sum of all weights.
    #[must_use]
    pub fn sum(&self) -> f64 {
        self.weights.iter().sum()
    }
}

/// Sobel horizontal derivative.
pub const SOBEL_X: Kernel = Kernel::from_static(
    &[-1.0, 0.0, 1.0, -2.0, 0.0, 2.0, -1.0, 0.0, 1.0],
    3,
    3,
);

/// Sobel vertical derivative.
pub const SOBEL_Y: Kernel = Kernel::from_static(
    &[-1.0, -2.0, -1.0, 0.0, 0.0, 0.0, 1.0, 2.0, 1.0],
    3,
    3,
);

/// Scharr horizontal derivative.
pub const SCHARR_X: Kernel = Kernel::from_static(
    &[-3.0, 0.0, 3.0, -10.0, 0.0, 10.0, -3.0, 0.0, 3.0],
    3,
    3,
);

/// Scharr vertical derivative.
pub const SCHARR_Y: Kernel = Kernel::from_static(
    &[-3.0, -10.0, -3.0, 0.0, 0.0, 0.0, 3.0, 10.0, 3.0],
    3,
    3,
);

/// Prewitt horizontal derivative.
pub const PREWITT_X: Kernel = Kernel::from_static(
    &[-1.0, 0.0, 1.0, -1.0, 0.0, 1.0, -1.0, 0.0, 1.0],
    3,
    3,
);

/// Prewitt vertical derivative. Note the sign: positive row on top.
pub const PREWITT_Y: Kernel = Kernel::from_static(
    &[1.0, 1.0, 1.0, 0.0, 0.0, 0.0, -1.0, -1.0, -1.0],
    3,
    3,
);

/// Roberts cross, main diagonal.
pub const ROBERTS_X: Kernel = Kernel::from_static(&[1.0, 0.0, 0.0, -1.0], 2, 2);

/// Roberts cross, anti-diagonal.
pub const ROBERTS_Y: Kernel = Kernel::from_static(&[0.0, 1.0, -1.0, 0.0], 2, 2);

/// 4-neighbor Laplacian.
pub const LAPLACIAN_4: Kernel = Kernel::from_static(
    &[0.0, 1.0, 0.0, 1.0, -4.0, 1.0, 0.0, 1.0, 0.0],
    3,
    3,
);

/// 8-neighbor Laplacian.
pub const LAPLACIAN_8: Kernel = Kernel::from_static(
    &[1.0, 1.0, 1.0, 1.0, -8.0, 1.0, 1.0, 1.0, 1.0],
    3,
    3,
);

/// 5×5 Laplacian-of-Gaussian approximation.
#[rustfmt::skip]
pub const LAPLACIAN_OF_GAUSSIAN: Kernel = Kernel::from_static(
    &[
         0.0,  0.0, -1.0,  0.0,  0.0,
         0.0, -1.0, -2.0, -1.0,  0.0,
        -1.0, -2.0, 16.0, -2.0, -1.0,
         0.0, -1.0, -2.0, -1.0,  0.0,
         0.0,  0.0, -1.0,  0.0,  0.0,
    ],
    5,
    5,
);

/// Side length of the Canny smoothing kernel.
pub const GAUSSIAN_SIZE: usize = 5;

/// Standard deviation of the Canny smoothing kernel.
pub const GAUSSIAN_SIGMA: f64 = 1.4;

/// Normalized `size × size` Gaussian kernel with the given sigma.
///
/// Built as the outer product of a normalized 1D kernel, so the weights
/// sum to one. Returns `None` for an even or zero `size` or a
/// non-positive sigma.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn gaussian(size: usize, sigma: f64) -> Option<Kernel> {
    if size % 2 == 0 || sigma <= 0.0 {
        return None;
    }
    let half = (size / 2) as f64;
    let row: Vec<f64> = (0..size)
        .map(|i| {
            let d = i as f64 - half;
            (-d * d / (2.0 * sigma * sigma)).exp()
        })
        .collect();
    let total: f64 = row.iter().sum();
    let row: Vec<f64> = row.into_iter().map(|v| v / total).collect();

    let weights = row
        .iter()
        .flat_map(|&wy| row.iter().map(move |&wx| wy * wx))
        .collect();
    Kernel::from_vec(weights, size, size)
}
