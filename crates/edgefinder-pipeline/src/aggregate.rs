//! Combining per-channel edge planes into one aggregate plane.

use image::{GrayImage, Luma};
use serde::{Deserialize, Serialize};

use crate::normalize::min_max_normalize;
use crate::operator::EdgeResponse;
use crate::plane::FloatPlane;

/// How channel edge planes combine into the aggregate.
///
/// Selected per color space and method by
/// [`ColorSpace::aggregation_rule`](crate::color::ColorSpace::aggregation_rule).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AggregationRule {
    /// Equal-weight mean of the 8-bit planes, rounded once.
    WeightedAverage,
    /// Element-wise maximum of the 8-bit planes.
    Maximum,
    /// `sqrt(Σ m²)` over the pre-quantization planes, min-max normalized.
    EuclideanNorm,
}

impl AggregationRule {
    /// Combine `responses` into one plane.
    ///
    /// All responses must share dimensions. An empty slice yields an empty
    /// plane.
    #[must_use = "returns the aggregate plane"]
    pub fn combine(self, responses: &[EdgeResponse]) -> GrayImage {
        let Some(first) = responses.first() else {
            return GrayImage::new(0, 0);
        };
        let (width, height) = first.edges.dimensions();
        match self {
            Self::WeightedAverage => weighted_average(responses, width, height),
            Self::Maximum => maximum(responses, width, height),
            Self::EuclideanNorm => euclidean_norm(responses, width, height),
        }
    }
}

#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]
fn weighted_average(responses: &[EdgeResponse], width: u32, height: u32) -> GrayImage {
    let n = responses.len() as f64;
    GrayImage::from_fn(width, height, |x, y| {
        let sum: f64 = responses
            .iter()
            .map(|r| f64::from(r.edges.get_pixel(x, y).0[0]))
            .sum();
        Luma([(sum / n).round().clamp(0.0, 255.0) as u8])
    })
}

fn maximum(responses: &[EdgeResponse], width: u32, height: u32) -> GrayImage {
    GrayImage::from_fn(width, height, |x, y| {
        let max = responses
            .iter()
            .map(|r| r.edges.get_pixel(x, y).0[0])
            .max()
            .unwrap_or(0);
        Luma([max])
    })
}

fn euclidean_norm(responses: &[EdgeResponse], width: u32, height: u32) -> GrayImage {
    let norm = FloatPlane::from_fn(width, height, |x, y| {
        responses
            .iter()
            .map(|r| r.magnitude.get(x, y).powi(2))
            .sum::<f64>()
            .sqrt()
    });
    min_max_normalize(&norm)
}
