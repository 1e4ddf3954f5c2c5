//! Shared types for the edgefinder pipeline.

use serde::{Deserialize, Serialize};

use crate::color::ColorSpace;
use crate::label::LabelLookup;
use crate::operator::Method;

/// Re-export `GrayImage` so downstream crates can reference edge planes
/// without depending on `image` directly.
pub use image::GrayImage;

/// Re-export `RgbImage` so downstream crates can build pipeline input
/// without depending on `image` directly.
pub use image::RgbImage;

/// Clip range applied to raw operator responses before quantization.
///
/// For `Method::CannyBuiltin` the same pair is used as the hysteresis
/// thresholds instead, which is a different meaning under the same names.
///
/// # Invariant
///
/// `low <= high`. [`Threshold::new`] cross-clamps `low` down to `high`
/// rather than failing, matching how slider pairs are usually wired.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "RawThreshold")]
pub struct Threshold {
    low: u8,
    high: u8,
}

/// Unvalidated serde shape of [`Threshold`].
#[derive(Deserialize)]
struct RawThreshold {
    low: u8,
    high: u8,
}

impl From<RawThreshold> for Threshold {
    fn from(raw: RawThreshold) -> Self {
        Self::new(raw.low, raw.high)
    }
}

impl Threshold {
    /// Default lower bound: nothing is clipped from below.
    pub const DEFAULT_LOW: u8 = 0;

    /// Default upper bound: nothing is clipped from above.
    pub const DEFAULT_HIGH: u8 = 255;

    /// The full `0..=255` range.
    pub const FULL: Self = Self {
        low: Self::DEFAULT_LOW,
        high: Self::DEFAULT_HIGH,
    };

    /// Create a threshold, clamping `low` to at most `high`.
    #[must_use]
    pub const fn new(low: u8, high: u8) -> Self {
        let low = if low > high { high } else { low };
        Self { low, high }
    }

    #[must_use]
    pub const fn low(self) -> u8 {
        self.low
    }

    #[must_use]
    pub const fn high(self) -> u8 {
        self.high
    }
}

impl Default for Threshold {
    fn default() -> Self {
        Self::FULL
    }
}

/// Configuration for one edge-detection run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectConfig {
    /// Channel decomposition to run the operator on.
    pub color_space: ColorSpace,
    /// Edge operator applied to every channel.
    pub method: Method,
    /// Clip range (or hysteresis pair for the built-in Canny).
    pub threshold: Threshold,
}

impl DetectConfig {
    pub const DEFAULT_COLOR_SPACE: ColorSpace = ColorSpace::Rgb;
    pub const DEFAULT_METHOD: Method = Method::Sobel;
    pub const DEFAULT_THRESHOLD: Threshold = Threshold::FULL;

    /// Create a config from its three parts.
    #[must_use]
    pub const fn new(color_space: ColorSpace, method: Method, threshold: Threshold) -> Self {
        Self {
            color_space,
            method,
            threshold,
        }
    }
}

impl Default for DetectConfig {
    fn default() -> Self {
        Self::new(
            Self::DEFAULT_COLOR_SPACE,
            Self::DEFAULT_METHOD,
            Self::DEFAULT_THRESHOLD,
        )
    }
}

/// Output of a full edge-detection run.
///
/// `channel_edges` and the leading entries of `labels` follow the channel
/// order of the color space (R, G, B / H, S, V / L, A, B / C, M, Y, K).
/// `labels` always has one more entry than `channel_edges`; the last one
/// names `aggregate`.
///
/// Uses custom `Serialize`/`Deserialize` implementations because the
/// `image` buffers do not implement serde traits. Rasters are serialized
/// as `(width, height, raw_pixels)` tuples.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EdgeResult {
    /// The input converted to RGB channel order, for display next to the
    /// edge planes.
    pub preview: RgbImage,
    /// One edge plane per channel.
    pub channel_edges: Vec<GrayImage>,
    /// Combined edge plane.
    pub aggregate: GrayImage,
    /// Display labels: one per channel, then the aggregate label.
    pub labels: Vec<String>,
}

impl EdgeResult {
    /// Label of the aggregate plane.
    #[must_use]
    pub fn aggregate_label(&self) -> &str {
        self.labels.last().map_or("", String::as_str)
    }

    /// Pairs of `(label, plane)` for every channel, followed by the
    /// aggregate.
    pub fn labeled_planes(&self) -> impl Iterator<Item = (&str, &GrayImage)> {
        self.labels
            .iter()
            .map(String::as_str)
            .zip(self.channel_edges.iter().chain(std::iter::once(&self.aggregate)))
    }
}

/// Serde-compatible proxy for [`EdgeResult`].
#[derive(Serialize, Deserialize)]
struct EdgeResultProxy {
    preview: (u32, u32, Vec<u8>),
    channel_edges: Vec<(u32, u32, Vec<u8>)>,
    aggregate: (u32, u32, Vec<u8>),
    labels: Vec<String>,
}

fn gray_to_raw(image: &GrayImage) -> (u32, u32, Vec<u8>) {
    (image.width(), image.height(), image.as_raw().clone())
}

impl Serialize for EdgeResult {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let proxy = EdgeResultProxy {
            preview: (
                self.preview.width(),
                self.preview.height(),
                self.preview.as_raw().clone(),
            ),
            channel_edges: self.channel_edges.iter().map(gray_to_raw).collect(),
            aggregate: gray_to_raw(&self.aggregate),
            labels: self.labels.clone(),
        };
        proxy.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for EdgeResult {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let proxy = EdgeResultProxy::deserialize(deserializer)?;

        let preview = RgbImage::from_raw(proxy.preview.0, proxy.preview.1, proxy.preview.2)
            .ok_or_else(|| serde::de::Error::custom("invalid preview image dimensions"))?;
        let channel_edges = proxy
            .channel_edges
            .into_iter()
            .map(|(w, h, raw)| {
                GrayImage::from_raw(w, h, raw)
                    .ok_or_else(|| serde::de::Error::custom("invalid channel edge dimensions"))
            })
            .collect::<Result<Vec<_>, _>>()?;
        let aggregate = GrayImage::from_raw(proxy.aggregate.0, proxy.aggregate.1, proxy.aggregate.2)
            .ok_or_else(|| serde::de::Error::custom("invalid aggregate dimensions"))?;
        if proxy.labels.len() != channel_edges.len() + 1 {
            return Err(serde::de::Error::custom(
                "expected one label per channel plus the aggregate label",
            ));
        }

        Ok(Self {
            preview,
            channel_edges,
            aggregate,
            labels: proxy.labels,
        })
    }
}

/// Errors that can occur during edge detection.
///
/// Every variant carries a message key (see [`EdgeError::message_key`])
/// that a caller can resolve through a [`LabelLookup`] to show a
/// localized message.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error, Serialize, Deserialize)]
pub enum EdgeError {
    /// The input image is missing, empty, or its buffer does not match
    /// its dimensions.
    #[error("invalid image: {0}")]
    InvalidImage(String),

    /// The requested edge operator is not one of the supported methods.
    #[error("unsupported edge detection method: {0:?}")]
    UnsupportedMethod(String),

    /// The requested color space is not one of the supported spaces.
    #[error("unsupported color space: {0:?}")]
    UnsupportedColorSpace(String),
}

impl EdgeError {
    /// Message key for an invalid image.
    pub const INVALID_IMAGE_KEY: &'static str = "invalid_image";
    /// Message key for an unknown method.
    pub const UNSUPPORTED_METHOD_KEY: &'static str = "unsupported_method";
    /// Message key for an unknown color space.
    pub const UNSUPPORTED_COLOR_SPACE_KEY: &'static str = "unsupported_color_space";

    /// The key a presentation layer resolves to a display message.
    #[must_use]
    pub const fn message_key(&self) -> &'static str {
        match self {
            Self::InvalidImage(_) => Self::INVALID_IMAGE_KEY,
            Self::UnsupportedMethod(_) => Self::UNSUPPORTED_METHOD_KEY,
            Self::UnsupportedColorSpace(_) => Self::UNSUPPORTED_COLOR_SPACE_KEY,
        }
    }

    /// The message resolved through `labels`.
    ///
    /// With an identity lookup this is just the message key.
    #[must_use]
    pub fn localized(&self, labels: &dyn LabelLookup) -> String {
        labels.label(self.message_key())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::label::IdentityLookup;

    #[test]
    fn threshold_cross_clamps_low() {
        let t = Threshold::new(200, 100);
        assert_eq!((t.low(), t.high()), (100, 100));
        let t = Threshold::new(10, 20);
        assert_eq!((t.low(), t.high()), (10, 20));
    }

    #[test]
    fn threshold_default_is_full_range() {
        assert_eq!(Threshold::default(), Threshold::new(0, 255));
    }

    #[test]
    fn threshold_deserialize_applies_invariant() {
        let t: Threshold = serde_json::from_str(r#"{"low": 250, "high": 5}"#).unwrap();
        assert_eq!((t.low(), t.high()), (5, 5));
    }

    #[test]
    fn threshold_deserialize_rejects_out_of_range() {
        let result: Result<Threshold, _> = serde_json::from_str(r#"{"low": 0, "high": 256}"#);
        assert!(result.is_err());
    }

    #[test]
    fn config_defaults() {
        let config = DetectConfig::default();
        assert_eq!(config.color_space, ColorSpace::Rgb);
        assert_eq!(config.method, Method::Sobel);
        assert_eq!(config.threshold, Threshold::FULL);
    }

    #[test]
    fn config_partial_json_fills_defaults() {
        let config: DetectConfig = serde_json::from_str(r#"{"method": "canny"}"#).unwrap();
        assert_eq!(config.method, Method::Canny);
        assert_eq!(config.color_space, ColorSpace::Rgb);
        assert_eq!(config.threshold, Threshold::FULL);
    }

    #[test]
    fn config_json_round_trip() {
        let config = DetectConfig::new(ColorSpace::Lab, Method::Laplacian8, Threshold::new(5, 90));
        let json = serde_json::to_string(&config).unwrap();
        let back: DetectConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back, config);
    }

    #[test]
    fn error_message_keys() {
        assert_eq!(
            EdgeError::InvalidImage(String::new()).message_key(),
            "invalid_image"
        );
        assert_eq!(
            EdgeError::UnsupportedMethod("x".into()).message_key(),
            "unsupported_method"
        );
        assert_eq!(
            EdgeError::UnsupportedColorSpace("x".into()).message_key(),
            "unsupported_color_space"
        );
    }

    #[test]
    fn error_localized_with_identity_is_key() {
        let err = EdgeError::UnsupportedMethod("Fourier".into());
        assert_eq!(err.localized(&IdentityLookup), "unsupported_method");
    }

    #[test]
    fn edge_result_serde_round_trip() {
        let plane = GrayImage::from_fn(3, 2, |x, y| image::Luma([u8::try_from(x * 40 + y).unwrap()]));
        let result = EdgeResult {
            preview: RgbImage::from_pixel(3, 2, image::Rgb([1, 2, 3])),
            channel_edges: vec![plane.clone(), plane.clone(), plane.clone()],
            aggregate: plane,
            labels: ["R", "G", "B", "sum"].map(String::from).to_vec(),
        };
        let json = serde_json::to_string(&result).unwrap();
        let back: EdgeResult = serde_json::from_str(&json).unwrap();
        assert_eq!(back, result);
        assert_eq!(back.aggregate_label(), "sum");
    }

    #[test]
    fn edge_result_rejects_label_count_mismatch() {
        let json = r#"{"preview":[1,1,[0,0,0]],"channel_edges":[[1,1,[0]]],"aggregate":[1,1,[0]],"labels":["R"]}"#;
        let result: Result<EdgeResult, _> = serde_json::from_str(json);
        assert!(result.is_err());
    }

    #[test]
    fn labeled_planes_pairs_in_order() {
        let a = GrayImage::from_pixel(1, 1, image::Luma([1]));
        let b = GrayImage::from_pixel(1, 1, image::Luma([2]));
        let sum = GrayImage::from_pixel(1, 1, image::Luma([3]));
        let result = EdgeResult {
            preview: RgbImage::new(1, 1),
            channel_edges: vec![a, b],
            aggregate: sum,
            labels: ["X", "Y", "sum"].map(String::from).to_vec(),
        };
        let pairs: Vec<(&str, u8)> = result
            .labeled_planes()
            .map(|(l, p)| (l, p.get_pixel(0, 0).0[0]))
            .collect();
        assert_eq!(pairs, vec![("X", 1), ("Y", 2), ("sum", 3)]);
    }
}
