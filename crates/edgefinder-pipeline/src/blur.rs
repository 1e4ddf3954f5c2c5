//! Gaussian smoothing ahead of the in-crate Canny.
//!
//! Runs the fixed 5×5 kernel from [`kernel::gaussian`] through the same
//! reflect-padded [`convolve`] the other operators use, so the blurred
//! plane lines up with the Sobel pass that follows it.

use crate::convolve::convolve;
use crate::kernel;
use crate::plane::FloatPlane;

/// Blur `plane` with a [`kernel::GAUSSIAN_SIZE`]-square Gaussian of the
/// given `sigma`.
///
/// Non-positive sigma values return the plane unchanged.
#[must_use = "returns the blurred plane"]
pub fn gaussian_blur(plane: &FloatPlane, sigma: f64) -> FloatPlane {
    kernel::gaussian(kernel::GAUSSIAN_SIZE, sigma)
        .map_or_else(|| plane.clone(), |k| convolve(plane, &k))
}
