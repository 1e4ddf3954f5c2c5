//! Incremental pipeline: advance stage-by-stage, inspecting each
//! intermediate result before continuing.
//!
//! Unlike [`crate::detect_edges`] which runs everything in one call,
//! [`Pipeline`] lets the caller drive execution one step at a time:
//!
//! ```rust
//! # use edgefinder_pipeline::{DetectConfig, EdgeError, IdentityLookup, Pipeline, RgbImage};
//! # fn run(image: RgbImage) -> Result<(), EdgeError> {
//! let aggregated = Pipeline::new(image, DetectConfig::default())
//!     .convert()?
//!     .detect()
//!     .aggregate();
//!
//! let result = aggregated.into_result(&IdentityLookup);
//! # Ok(())
//! # }
//! ```
//!
//! Each stage method consumes `self` and returns the next pipeline state,
//! carrying the previously computed intermediates the later stages need.
//! Only [`Pending::convert`] can fail: image validation happens there,
//! before any channel is processed.

use crate::aggregate::AggregationRule;
use crate::color;
use crate::diagnostics::{self, ChannelMetrics, StageMetrics};
use crate::label::{LabelLookup, SUM_KEY};
use crate::operator::{EdgeOperator, EdgeResponse, Method};
use crate::types::{DetectConfig, EdgeError, EdgeResult, GrayImage, RgbImage, Threshold};

/// Entry point of the typestate pipeline.
pub struct Pipeline;

impl Pipeline {
    /// Create a new pipeline from an RGB image and config.
    ///
    /// No processing is performed. Call [`.convert()`](Pending::convert)
    /// to begin.
    #[allow(clippy::new_ret_no_self)]
    pub const fn new(image: RgbImage, config: DetectConfig) -> Pending {
        Pending { config, image }
    }
}

// ───────────────────────── Stage 0: Pending ──────────────────────────

/// Pipeline state before any processing has occurred.
#[must_use = "pipeline stages are consumed by advancing; call .convert() to continue"]
pub struct Pending {
    config: DetectConfig,
    image: RgbImage,
}

impl Pending {
    /// The input image.
    #[must_use]
    pub const fn image(&self) -> &RgbImage {
        &self.image
    }

    #[must_use]
    pub const fn config(&self) -> &DetectConfig {
        &self.config
    }

    /// Validate the image and split it into channel planes.
    ///
    /// # Errors
    ///
    /// Returns [`EdgeError::InvalidImage`] if the image has no pixels.
    pub fn convert(self) -> Result<Converted, EdgeError> {
        let channels = color::split_channels(&self.image, self.config.color_space)?;
        Ok(Converted {
            config: self.config,
            preview: self.image,
            channels,
        })
    }
}

// ───────────────────────── Stage 1: Converted ────────────────────────

/// Pipeline state after color-space conversion.
#[must_use = "pipeline stages are consumed by advancing; call .detect() to continue"]
pub struct Converted {
    config: DetectConfig,
    preview: RgbImage,
    channels: Vec<GrayImage>,
}

impl Converted {
    /// Channel planes in [`ColorSpace::channel_keys`](crate::ColorSpace::channel_keys) order.
    #[must_use]
    pub fn channels(&self) -> &[GrayImage] {
        &self.channels
    }

    /// Run the configured operator on every channel.
    pub fn detect(self) -> Detected {
        let responses = detect_channels(&self.channels, self.config.method, self.config.threshold);
        Detected {
            config: self.config,
            preview: self.preview,
            responses,
        }
    }
}

/// Apply `method` to each channel, keeping channel order.
#[cfg(not(feature = "parallel"))]
fn detect_channels(channels: &[GrayImage], method: Method, threshold: Threshold) -> Vec<EdgeResponse> {
    channels
        .iter()
        .map(|channel| method.apply(channel, threshold))
        .collect()
}

/// Apply `method` to each channel on the rayon pool, keeping channel
/// order.
#[cfg(feature = "parallel")]
fn detect_channels(channels: &[GrayImage], method: Method, threshold: Threshold) -> Vec<EdgeResponse> {
    use rayon::prelude::*;

    channels
        .par_iter()
        .map(|channel| method.apply(channel, threshold))
        .collect()
}

// ───────────────────────── Stage 2: Detected ─────────────────────────

/// Pipeline state after per-channel edge detection.
#[must_use = "pipeline stages are consumed by advancing; call .aggregate() to continue"]
pub struct Detected {
    config: DetectConfig,
    preview: RgbImage,
    responses: Vec<EdgeResponse>,
}

impl Detected {
    /// One response per channel.
    #[must_use]
    pub fn responses(&self) -> &[EdgeResponse] {
        &self.responses
    }

    /// Combine the channel planes with the rule for this color space and
    /// method.
    pub fn aggregate(self) -> Aggregated {
        let rule = self.config.color_space.aggregation_rule(self.config.method);
        let aggregate = rule.combine(&self.responses);
        Aggregated {
            config: self.config,
            preview: self.preview,
            responses: self.responses,
            rule,
            aggregate,
        }
    }
}

// ───────────────────────── Stage 3: Aggregated ───────────────────────

/// Final pipeline state.
///
/// Call [`into_result`](Self::into_result) to extract the [`EdgeResult`].
#[must_use = "call .into_result() to extract the EdgeResult"]
pub struct Aggregated {
    config: DetectConfig,
    preview: RgbImage,
    responses: Vec<EdgeResponse>,
    rule: AggregationRule,
    aggregate: GrayImage,
}

impl Aggregated {
    /// The combined edge plane.
    #[must_use]
    pub const fn aggregate(&self) -> &GrayImage {
        &self.aggregate
    }

    /// The rule the aggregate was built with.
    #[must_use]
    pub const fn rule(&self) -> AggregationRule {
        self.rule
    }

    /// Consume the pipeline, resolving labels through `labels`.
    pub fn into_result(self, labels: &dyn LabelLookup) -> EdgeResult {
        let labels = self
            .config
            .color_space
            .channel_keys()
            .iter()
            .chain(std::iter::once(&SUM_KEY))
            .map(|key| labels.label(key))
            .collect();
        EdgeResult {
            preview: self.preview,
            channel_edges: self.responses.into_iter().map(|r| r.edges).collect(),
            aggregate: self.aggregate,
            labels,
        }
    }
}

// ──────────────────────────── PipelineStage ──────────────────────────

/// Number of processing stages after [`Pending`].
pub const STAGE_COUNT: usize = 3;

/// Implemented by every stage that has done work, for diagnostics.
pub trait PipelineStage {
    /// Human-readable name of this stage.
    const NAME: &str;

    /// Zero-based index of this stage among the processing stages.
    const INDEX: usize;

    /// Metrics describing the work done to reach this state.
    fn metrics(&self) -> StageMetrics;
}

impl PipelineStage for Converted {
    const NAME: &str = "convert";
    const INDEX: usize = 0;

    fn metrics(&self) -> StageMetrics {
        StageMetrics::Convert {
            color_space: self.config.color_space.to_string(),
            width: self.preview.width(),
            height: self.preview.height(),
            channel_count: self.channels.len(),
        }
    }
}

impl PipelineStage for Detected {
    const NAME: &str = "edge_detection";
    const INDEX: usize = 1;

    fn metrics(&self) -> StageMetrics {
        let channels = self
            .config
            .color_space
            .channel_keys()
            .iter()
            .zip(&self.responses)
            .map(|(key, response)| ChannelMetrics::measure(key, &response.edges))
            .collect();
        StageMetrics::EdgeDetection {
            method: self.config.method.to_string(),
            low_threshold: self.config.threshold.low(),
            high_threshold: self.config.threshold.high(),
            channels,
        }
    }
}

impl PipelineStage for Aggregated {
    const NAME: &str = "aggregation";
    const INDEX: usize = 2;

    fn metrics(&self) -> StageMetrics {
        StageMetrics::Aggregation {
            rule: format!("{:?}", self.rule),
            nonzero_pixel_count: diagnostics::count_nonzero_pixels(&self.aggregate),
            mean_intensity: diagnostics::mean_intensity(&self.aggregate),
        }
    }
}

/// Compile-time guard: bump [`STAGE_COUNT`] when a stage is added.
const _: () = assert!(Aggregated::INDEX + 1 == STAGE_COUNT);

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::color::ColorSpace;
    use crate::label::IdentityLookup;
    use image::Rgb;

    fn sharp_edge_image(width: u32, height: u32) -> RgbImage {
        RgbImage::from_fn(width, height, |x, _| {
            if x < width / 2 {
                Rgb([0, 0, 0])
            } else {
                Rgb([255, 255, 255])
            }
        })
    }

    #[test]
    fn stages_advance_to_result() {
        let image = sharp_edge_image(12, 8);
        let result = Pipeline::new(image.clone(), DetectConfig::default())
            .convert()
            .unwrap()
            .detect()
            .aggregate()
            .into_result(&IdentityLookup);
        assert_eq!(result.preview, image);
        assert_eq!(result.channel_edges.len(), 3);
        assert_eq!(result.labels, vec!["R", "G", "B", "sum"]);
        assert_eq!(result.aggregate.dimensions(), (12, 8));
    }

    #[test]
    fn convert_rejects_empty_image() {
        let result = Pipeline::new(RgbImage::new(0, 0), DetectConfig::default()).convert();
        assert!(matches!(result, Err(EdgeError::InvalidImage(_))));
    }

    #[test]
    fn converted_exposes_channels() {
        let config = DetectConfig {
            color_space: ColorSpace::Cmyk,
            ..DetectConfig::default()
        };
        let converted = Pipeline::new(sharp_edge_image(6, 4), config).convert().unwrap();
        assert_eq!(converted.channels().len(), 4);
        // Black half has full key, white half none.
        assert_eq!(converted.channels()[3].get_pixel(0, 0).0[0], 255);
        assert_eq!(converted.channels()[3].get_pixel(5, 0).0[0], 0);
    }

    #[test]
    fn aggregated_reports_rule() {
        let config = DetectConfig {
            color_space: ColorSpace::Lab,
            method: Method::Canny,
            ..DetectConfig::default()
        };
        let aggregated = Pipeline::new(sharp_edge_image(10, 10), config)
            .convert()
            .unwrap()
            .detect()
            .aggregate();
        assert_eq!(aggregated.rule(), AggregationRule::Maximum);
    }

    #[test]
    fn detected_metrics_cover_every_channel() {
        let config = DetectConfig {
            color_space: ColorSpace::Hsv,
            ..DetectConfig::default()
        };
        let detected = Pipeline::new(sharp_edge_image(10, 6), config)
            .convert()
            .unwrap()
            .detect();
        assert_eq!(detected.responses().len(), 3);
        let StageMetrics::EdgeDetection { channels, method, .. } = detected.metrics() else {
            unreachable!("expected edge detection metrics");
        };
        assert_eq!(method, "sobel");
        let keys: Vec<&str> = channels.iter().map(|c| c.key.as_str()).collect();
        assert_eq!(keys, vec!["H", "S", "V"]);
        // Only V changes across the boundary.
        assert_eq!(channels[0].nonzero_pixel_count, 0);
        assert!(channels[2].nonzero_pixel_count > 0);
    }

    #[test]
    fn labels_resolve_through_lookup() {
        let lookup = |key: &str| format!("<{key}>");
        let result = Pipeline::new(sharp_edge_image(4, 4), DetectConfig::default())
            .convert()
            .unwrap()
            .detect()
            .aggregate()
            .into_result(&lookup);
        assert_eq!(result.labels, vec!["<R>", "<G>", "<B>", "<sum>"]);
        assert_eq!(result.aggregate_label(), "<sum>");
    }
}
