//! The two Canny variants.
//!
//! [`canny`] builds the detector from this crate's own parts: Gaussian
//! blur, Sobel gradients, [`non_maximum_suppression`], then the same
//! clip and min-max normalize as the other gradient operators. It has no
//! hysteresis stage, so the output is a graded thin-edge map rather than
//! a binary one.
//!
//! [`canny_builtin`] delegates to [`imageproc::edges::canny`] and returns
//! its binary map as is.

use image::GrayImage;

use crate::blur::gaussian_blur;
use crate::convolve::convolve;
use crate::kernel;
use crate::normalize::{clip, min_max_normalize};
use crate::operator::EdgeResponse;
use crate::plane::FloatPlane;
use crate::types::Threshold;

/// Minimum hysteresis threshold passed to `imageproc`.
///
/// With a low threshold of zero, hysteresis in `imageproc 0.26` follows
/// zero-magnitude border pixels and underflows `x - 1` at the image edge.
/// Any positive floor keeps it inside the suppressed border.
pub const MIN_THRESHOLD: f32 = 1.0;
const _: () = assert!(MIN_THRESHOLD > 0.0);

/// Gradient direction bucket used by [`non_maximum_suppression`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    /// Horizontal gradient: compare west and east.
    Deg0,
    /// Compare south-east and north-west.
    Deg45,
    /// Vertical gradient: compare north and south.
    Deg90,
    /// Compare south-west and north-east.
    Deg135,
}

impl Direction {
    /// Bucket an angle in `[0, 180)` degrees.
    fn from_degrees(angle: f64) -> Self {
        if !(22.5..157.5).contains(&angle) {
            Self::Deg0
        } else if angle < 67.5 {
            Self::Deg45
        } else if angle < 112.5 {
            Self::Deg90
        } else {
            Self::Deg135
        }
    }

    /// Offsets of the two neighbors along the gradient.
    const fn neighbors(self) -> [(i64, i64); 2] {
        match self {
            Self::Deg0 => [(-1, 0), (1, 0)],
            Self::Deg45 => [(1, 1), (-1, -1)],
            Self::Deg90 => [(0, -1), (0, 1)],
            Self::Deg135 => [(-1, 1), (1, -1)],
        }
    }
}

/// Gradient angle of `(gx, gy)` folded into `[0, 180)` degrees.
fn gradient_angle(gx: f64, gy: f64) -> f64 {
    let angle = gy.atan2(gx).to_degrees();
    let angle = if angle < 0.0 { angle + 180.0 } else { angle };
    // atan2 returns exactly 180 for a negative gx with zero gy.
    if angle >= 180.0 { 0.0 } else { angle }
}

/// Thin edges by keeping only local maxima along the gradient direction.
///
/// `magnitude`, `gx` and `gy` must share dimensions. For every interior
/// sample, the gradient angle picks one of four directions; the sample is
/// kept if it is at least as large as both neighbors along that direction
/// and zeroed otherwise. Border samples are always zero.
///
/// The result never exceeds `magnitude` at any sample.
#[must_use = "returns the suppressed magnitude plane"]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn non_maximum_suppression(
    magnitude: &FloatPlane,
    gx: &FloatPlane,
    gy: &FloatPlane,
) -> FloatPlane {
    debug_assert_eq!(magnitude.dimensions(), gx.dimensions());
    debug_assert_eq!(magnitude.dimensions(), gy.dimensions());
    let (width, height) = magnitude.dimensions();

    FloatPlane::from_fn(width, height, |x, y| {
        if x == 0 || y == 0 || x + 1 >= width || y + 1 >= height {
            return 0.0;
        }
        let value = magnitude.get(x, y);
        let direction = Direction::from_degrees(gradient_angle(gx.get(x, y), gy.get(x, y)));
        let is_max = direction.neighbors().iter().all(|&(dx, dy)| {
            // Interior samples always have all eight neighbors in bounds.
            let nx = (i64::from(x) + dx) as u32;
            let ny = (i64::from(y) + dy) as u32;
            value >= magnitude.get(nx, ny)
        });
        if is_max { value } else { 0.0 }
    })
}

/// Canny without hysteresis, built on the in-crate convolution.
///
/// Blur → Sobel → [`non_maximum_suppression`] → clip → min-max normalize.
///
/// The blurred plane is rounded to whole intensities, as an 8-bit blur
/// would store it. Sobel sums of integer samples are exact, so a flat
/// channel gives exactly zero gradient instead of rounding noise that
/// min-max normalization would stretch to full white.
#[must_use = "returns the edge response"]
pub fn canny(channel: &GrayImage, threshold: Threshold) -> EdgeResponse {
    let blurred =
        gaussian_blur(&FloatPlane::from_gray(channel), kernel::GAUSSIAN_SIGMA).map(f64::round);
    let gx = convolve(&blurred, &kernel::SOBEL_X);
    let gy = convolve(&blurred, &kernel::SOBEL_Y);
    let raw = gx.zip_map(&gy, f64::hypot);
    let magnitude = clip(&non_maximum_suppression(&raw, &gx, &gy), threshold);
    EdgeResponse {
        edges: min_max_normalize(&magnitude),
        magnitude,
    }
}

/// Full Canny from `imageproc` with `threshold` as the hysteresis pair.
///
/// Returns a binary image: 255 for edge pixels, 0 for non-edge. Both
/// thresholds are raised to at least [`MIN_THRESHOLD`].
#[must_use = "returns the binary edge map"]
pub fn canny_builtin(channel: &GrayImage, threshold: Threshold) -> GrayImage {
    let high = f32::from(threshold.high()).max(MIN_THRESHOLD);
    let low = f32::from(threshold.low()).max(MIN_THRESHOLD).min(high);
    imageproc::edges::canny(channel, low, high)
}
