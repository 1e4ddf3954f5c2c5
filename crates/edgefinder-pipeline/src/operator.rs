//! Edge operators: one 8-bit channel plane in, one 8-bit edge plane out.
//!
//! [`EdgeOperator`] is the strategy seam and [`Method`] the closed set of
//! strategies. Every operator is a pure function of the channel and the
//! [`Threshold`]; dispatch is an exhaustive match.
//!
//! Two quantization contracts coexist on purpose:
//!
//! - gradient operators (Sobel, Prewitt, Scharr, Roberts, Canny) clip the
//!   gradient magnitude and min-max normalize it,
//! - the Laplacian family clips the signed response and takes its
//!   absolute value without stretching.
//!
//! The built-in Canny returns the 0/255 map of the external detector
//! unmodified.

use std::fmt;
use std::str::FromStr;

use image::GrayImage;
use serde::{Deserialize, Serialize};

use crate::canny;
use crate::convolve::convolve;
use crate::kernel::{self, Kernel};
use crate::normalize::{abs_scale, clip, min_max_normalize};
use crate::plane::FloatPlane;
use crate::types::{EdgeError, Threshold};

/// Selects which edge operator to run on each channel.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Method {
    /// 3×3 Sobel gradient magnitude.
    #[default]
    Sobel,
    /// 3×3 Prewitt gradient magnitude.
    Prewitt,
    /// 3×3 Scharr gradient magnitude.
    Scharr,
    /// 2×2 Roberts cross gradient magnitude.
    Roberts,
    /// 4-neighbor Laplacian.
    #[serde(rename = "laplacian-4", alias = "laplacian")]
    Laplacian4,
    /// 8-neighbor Laplacian.
    #[serde(rename = "laplacian-8")]
    Laplacian8,
    /// 5×5 Laplacian of Gaussian.
    #[serde(rename = "log", alias = "laplacian-log")]
    LaplacianOfGaussian,
    /// Canny with in-crate smoothing and non-maximum suppression, without
    /// hysteresis.
    Canny,
    /// Full Canny from `imageproc`, with hysteresis.
    CannyBuiltin,
}

impl Method {
    /// All methods, in display order.
    pub const ALL: [Self; 9] = [
        Self::Sobel,
        Self::Prewitt,
        Self::Scharr,
        Self::Roberts,
        Self::Laplacian4,
        Self::Laplacian8,
        Self::LaplacianOfGaussian,
        Self::Canny,
        Self::CannyBuiltin,
    ];

    /// Canonical name accepted by [`FromStr`] and serde.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Sobel => "sobel",
            Self::Prewitt => "prewitt",
            Self::Scharr => "scharr",
            Self::Roberts => "roberts",
            Self::Laplacian4 => "laplacian-4",
            Self::Laplacian8 => "laplacian-8",
            Self::LaplacianOfGaussian => "log",
            Self::Canny => "canny",
            Self::CannyBuiltin => "canny-builtin",
        }
    }

    /// Alternative names also accepted by [`FromStr`].
    const fn aliases(self) -> &'static [&'static str] {
        match self {
            Self::Laplacian4 => &["laplacian"],
            Self::LaplacianOfGaussian => &["laplacian-log"],
            _ => &[],
        }
    }

    /// Whether this is either Canny variant.
    #[must_use]
    pub const fn is_canny(self) -> bool {
        matches!(self, Self::Canny | Self::CannyBuiltin)
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Method {
    type Err = EdgeError;

    /// Case-insensitive lookup by name or alias. Underscores and spaces
    /// are accepted in place of hyphens.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase().replace(['_', ' '], "-");
        Self::ALL
            .into_iter()
            .find(|m| m.name() == wanted || m.aliases().contains(&wanted.as_str()))
            .ok_or_else(|| EdgeError::UnsupportedMethod(s.to_owned()))
    }
}

/// Output of one operator on one channel.
#[derive(Debug, Clone, PartialEq)]
pub struct EdgeResponse {
    /// Quantized edge plane, same shape as the input channel.
    pub edges: GrayImage,
    /// The `f64` plane `edges` was quantized from: the clipped magnitude
    /// or clipped Laplacian response.
    pub magnitude: FloatPlane,
}

impl EdgeResponse {
    /// Wrap an edge plane that has no finer-grained source.
    #[must_use]
    pub fn from_edges(edges: GrayImage) -> Self {
        let magnitude = FloatPlane::from_gray(&edges);
        Self { edges, magnitude }
    }
}

/// Trait for edge detection strategies.
///
/// Input: one 8-bit channel plane. Output: an edge plane of identical
/// shape where brighter means stronger edge.
pub trait EdgeOperator {
    /// Run the operator, keeping the pre-quantization plane.
    fn apply(&self, channel: &GrayImage, threshold: Threshold) -> EdgeResponse;

    /// Run the operator and return only the 8-bit edge plane.
    fn detect(&self, channel: &GrayImage, threshold: Threshold) -> GrayImage {
        self.apply(channel, threshold).edges
    }
}

impl EdgeOperator for Method {
    fn apply(&self, channel: &GrayImage, threshold: Threshold) -> EdgeResponse {
        match *self {
            Self::Sobel => gradient(channel, &kernel::SOBEL_X, &kernel::SOBEL_Y, threshold),
            Self::Prewitt => gradient(channel, &kernel::PREWITT_X, &kernel::PREWITT_Y, threshold),
            Self::Scharr => gradient(channel, &kernel::SCHARR_X, &kernel::SCHARR_Y, threshold),
            Self::Roberts => gradient(channel, &kernel::ROBERTS_X, &kernel::ROBERTS_Y, threshold),
            Self::Laplacian4 => laplacian(channel, &kernel::LAPLACIAN_4, threshold),
            Self::Laplacian8 => laplacian(channel, &kernel::LAPLACIAN_8, threshold),
            Self::LaplacianOfGaussian => {
                laplacian(channel, &kernel::LAPLACIAN_OF_GAUSSIAN, threshold)
            }
            Self::Canny => canny::canny(channel, threshold),
            Self::CannyBuiltin => {
                EdgeResponse::from_edges(canny::canny_builtin(channel, threshold))
            }
        }
    }
}

/// `hypot(Gx, Gy)` of two convolutions.
#[must_use]
pub fn gradient_magnitude(plane: &FloatPlane, kx: &Kernel, ky: &Kernel) -> FloatPlane {
    let gx = convolve(plane, kx);
    let gy = convolve(plane, ky);
    gx.zip_map(&gy, f64::hypot)
}

fn gradient(channel: &GrayImage, kx: &Kernel, ky: &Kernel, threshold: Threshold) -> EdgeResponse {
    let magnitude = clip(
        &gradient_magnitude(&FloatPlane::from_gray(channel), kx, ky),
        threshold,
    );
    EdgeResponse {
        edges: min_max_normalize(&magnitude),
        magnitude,
    }
}

fn laplacian(channel: &GrayImage, k: &Kernel, threshold: Threshold) -> EdgeResponse {
    let magnitude = clip(&convolve(&FloatPlane::from_gray(channel), k), threshold);
    EdgeResponse {
        edges: abs_scale(&magnitude),
        magnitude,
    }
}
