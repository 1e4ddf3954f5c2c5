//! Threshold clipping and quantization back to 8 bits.
//!
//! Gradient operators finish with [`clip`] followed by
//! [`min_max_normalize`]; the Laplacian family finishes with [`clip`]
//! followed by [`abs_scale`]. The two quantizers are deliberately
//! different: min-max stretches the clipped range to fill `0..=255`,
//! absolute scaling keeps the clipped values as they are.

use image::{GrayImage, Luma};

use crate::plane::FloatPlane;
use crate::types::Threshold;

/// Clamp every sample into `[threshold.low(), threshold.high()]`.
#[must_use = "returns the clipped plane"]
pub fn clip(plane: &FloatPlane, threshold: Threshold) -> FloatPlane {
    let low = f64::from(threshold.low());
    let high = f64::from(threshold.high());
    plane.map(|v| v.clamp(low, high))
}

/// Linearly rescale `plane` so its minimum maps to 0 and its maximum to
/// 255, truncating to 8 bits.
///
/// A constant plane (including an empty one) has no range to stretch and
/// yields all zeros.
#[must_use = "returns the normalized 8-bit plane"]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn min_max_normalize(plane: &FloatPlane) -> GrayImage {
    let (width, height) = plane.dimensions();
    let Some((min, max)) = plane.min_max() else {
        return GrayImage::new(width, height);
    };
    let range = max - min;
    if range <= 0.0 {
        return GrayImage::new(width, height);
    }
    GrayImage::from_fn(width, height, |x, y| {
        // Multiply before dividing so the maximum lands exactly on 255.
        let v = (plane.get(x, y) - min) * 255.0 / range;
        Luma([v.clamp(0.0, 255.0) as u8])
    })
}

/// Take the absolute value of every sample, round, and saturate to 8 bits.
#[must_use = "returns the scaled 8-bit plane"]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn abs_scale(plane: &FloatPlane) -> GrayImage {
    let (width, height) = plane.dimensions();
    GrayImage::from_fn(width, height, |x, y| {
        Luma([plane.get(x, y).abs().round().min(255.0) as u8])
    })
}
