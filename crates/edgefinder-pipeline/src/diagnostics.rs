//! Pipeline diagnostics: timing and per-channel counts for each stage.
//!
//! [`detect_edges_with_diagnostics`] runs the same stages as
//! [`detect_edges`](crate::detect_edges) and records how long each took
//! and what it produced. The caller supplies the [`Clock`], so the core
//! stays free of any particular time source; [`WebClock`] is a ready-made
//! one backed by `web-time` (`performance.now()` on WASM,
//! `std::time::Instant` on native).
//!
//! Durations are serialized as fractional seconds (`f64`) for JSON
//! compatibility, since `std::time::Duration` does not implement serde
//! traits.

use std::time::Duration;

use image::GrayImage;
use serde::{Deserialize, Serialize};

use crate::label::LabelLookup;
use crate::pipeline::{Aggregated, Converted, Detected, Pipeline, PipelineStage};
use crate::types::{DetectConfig, EdgeError, EdgeResult, RgbImage};

/// Serde support for `std::time::Duration` as fractional seconds.
mod duration_serde {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    /// Serialize a `Duration` as fractional seconds (`f64`).
    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        duration.as_secs_f64().serialize(serializer)
    }

    /// Deserialize a `Duration` from fractional seconds (`f64`).
    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let secs = f64::deserialize(deserializer)?;
        Duration::try_from_secs_f64(secs).map_err(|_| {
            serde::de::Error::custom(
                "duration seconds must be finite, non-negative, and representable as a Duration",
            )
        })
    }
}

/// A monotonic time source.
pub trait Clock {
    /// Opaque point in time.
    type Instant;

    /// The current instant.
    fn now(&self) -> Self::Instant;

    /// Time elapsed since `since`.
    fn elapsed(&self, since: &Self::Instant) -> Duration;
}

/// [`Clock`] backed by `web_time::Instant`.
#[derive(Debug, Clone, Copy, Default)]
pub struct WebClock;

impl Clock for WebClock {
    type Instant = web_time::Instant;

    fn now(&self) -> web_time::Instant {
        web_time::Instant::now()
    }

    fn elapsed(&self, since: &web_time::Instant) -> Duration {
        since.elapsed()
    }
}

/// Diagnostics collected from a single pipeline run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineDiagnostics {
    /// Stage 0: validation and color-space conversion.
    pub convert: StageDiagnostics,
    /// Stage 1: per-channel edge detection.
    pub edge_detection: StageDiagnostics,
    /// Stage 2: aggregation into one plane.
    pub aggregation: StageDiagnostics,
    /// Total wall-clock duration of the entire pipeline (seconds).
    #[serde(with = "duration_serde")]
    pub total_duration: Duration,
    /// Summary across all stages.
    pub summary: PipelineSummary,
}

/// Diagnostics for a single pipeline stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageDiagnostics {
    /// Stage name, as in [`PipelineStage::NAME`].
    pub name: String,
    /// Wall-clock duration of this stage (seconds).
    #[serde(with = "duration_serde")]
    pub duration: Duration,
    /// Stage-specific metrics.
    pub metrics: StageMetrics,
}

impl StageDiagnostics {
    fn of<S: PipelineStage>(stage: &S, duration: Duration) -> Self {
        Self {
            name: S::NAME.to_owned(),
            duration,
            metrics: stage.metrics(),
        }
    }
}

/// Stage-specific metrics that vary by pipeline stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum StageMetrics {
    /// Color-space conversion metrics.
    Convert {
        /// Color space name.
        color_space: String,
        /// Image width in pixels.
        width: u32,
        /// Image height in pixels.
        height: u32,
        /// Number of channel planes produced.
        channel_count: usize,
    },
    /// Edge detection metrics.
    EdgeDetection {
        /// Operator name.
        method: String,
        /// Low threshold.
        low_threshold: u8,
        /// High threshold.
        high_threshold: u8,
        /// One entry per channel, in channel order.
        channels: Vec<ChannelMetrics>,
    },
    /// Aggregation metrics.
    Aggregation {
        /// Aggregation rule name.
        rule: String,
        /// Non-zero pixels in the aggregate plane.
        nonzero_pixel_count: u64,
        /// Mean aggregate intensity (0-255).
        mean_intensity: f64,
    },
}

/// Per-channel edge plane statistics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelMetrics {
    /// Channel label key (`"R"`, `"H"`, ...).
    pub key: String,
    /// Non-zero pixels in the channel's edge plane.
    pub nonzero_pixel_count: u64,
    /// Mean edge intensity (0-255).
    pub mean_intensity: f64,
}

impl ChannelMetrics {
    pub(crate) fn measure(key: &str, edges: &GrayImage) -> Self {
        Self {
            key: key.to_owned(),
            nonzero_pixel_count: count_nonzero_pixels(edges),
            mean_intensity: mean_intensity(edges),
        }
    }
}

/// High-level summary for the entire pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineSummary {
    /// Image width in pixels.
    pub image_width: u32,
    /// Image height in pixels.
    pub image_height: u32,
    /// Total pixel count.
    pub pixel_count: u64,
    /// Color space name.
    pub color_space: String,
    /// Operator name.
    pub method: String,
    /// Number of channel planes.
    pub channel_count: usize,
    /// Non-zero pixels in the aggregate plane.
    pub aggregate_nonzero_pixel_count: u64,
}

/// Run the pipeline, collecting per-stage diagnostics.
///
/// Produces the same [`EdgeResult`] as [`detect_edges`](crate::detect_edges).
///
/// # Errors
///
/// Returns [`EdgeError::InvalidImage`] if the image has no pixels.
pub fn detect_edges_with_diagnostics<C: Clock>(
    image: &RgbImage,
    config: &DetectConfig,
    labels: &dyn LabelLookup,
    clock: &C,
) -> Result<(EdgeResult, PipelineDiagnostics), EdgeError> {
    let total_start = clock.now();

    let start = clock.now();
    let converted: Converted = Pipeline::new(image.clone(), *config).convert()?;
    let convert = StageDiagnostics::of(&converted, clock.elapsed(&start));

    let start = clock.now();
    let detected: Detected = converted.detect();
    let edge_detection = StageDiagnostics::of(&detected, clock.elapsed(&start));

    let start = clock.now();
    let aggregated: Aggregated = detected.aggregate();
    let aggregation = StageDiagnostics::of(&aggregated, clock.elapsed(&start));

    let summary = PipelineSummary {
        image_width: image.width(),
        image_height: image.height(),
        pixel_count: u64::from(image.width()) * u64::from(image.height()),
        color_space: config.color_space.to_string(),
        method: config.method.to_string(),
        channel_count: config.color_space.channel_count(),
        aggregate_nonzero_pixel_count: count_nonzero_pixels(aggregated.aggregate()),
    };
    let result = aggregated.into_result(labels);

    let diagnostics = PipelineDiagnostics {
        convert,
        edge_detection,
        aggregation,
        total_duration: clock.elapsed(&total_start),
        summary,
    };
    Ok((result, diagnostics))
}

impl PipelineDiagnostics {
    /// Stages in execution order.
    #[must_use]
    pub fn stages(&self) -> [&StageDiagnostics; 3] {
        [&self.convert, &self.edge_detection, &self.aggregation]
    }

    /// Format diagnostics as a human-readable report.
    #[must_use]
    pub fn report(&self) -> String {
        let mut lines = Vec::new();

        lines.push(format!("Pipeline Diagnostics Report\n{}", "=".repeat(60)));
        lines.push(format!(
            "Image: {}x{} ({} pixels)",
            self.summary.image_width, self.summary.image_height, self.summary.pixel_count,
        ));
        lines.push(format!(
            "Color space: {}  |  Method: {}",
            self.summary.color_space, self.summary.method,
        ));
        lines.push(format!(
            "Total duration: {:.3}ms",
            duration_ms(self.total_duration),
        ));
        lines.push(String::new());

        lines.push(format!(
            "{:<24} {:>10} {:>10}  {}",
            "Stage", "Duration", "% Total", "Details"
        ));
        lines.push("-".repeat(80));

        let total_ms = duration_ms(self.total_duration);
        for diag in self.stages() {
            let ms = duration_ms(diag.duration);
            let pct = if total_ms > 0.0 {
                ms / total_ms * 100.0
            } else {
                0.0
            };
            let details = format_metrics(&diag.metrics);
            lines.push(format!("{:<24} {ms:>8.3}ms {pct:>9.1}%  {details}", diag.name));
        }

        if let StageMetrics::EdgeDetection { channels, .. } = &self.edge_detection.metrics {
            lines.push(String::new());
            lines.push(format!("{:<8} {:>12} {:>10}", "Channel", "Non-zero", "Mean"));
            for channel in channels {
                lines.push(format!(
                    "{:<8} {:>12} {:>10.2}",
                    channel.key, channel.nonzero_pixel_count, channel.mean_intensity,
                ));
            }
        }

        lines.push(String::new());
        lines.push(format!(
            "Channels: {}  |  Aggregate non-zero pixels: {}",
            self.summary.channel_count, self.summary.aggregate_nonzero_pixel_count,
        ));

        lines.join("\n")
    }
}

/// Convert a `Duration` to milliseconds as `f64`.
fn duration_ms(d: Duration) -> f64 {
    d.as_secs_f64() * 1000.0
}

/// Format stage metrics into a compact detail string.
fn format_metrics(metrics: &StageMetrics) -> String {
    match metrics {
        StageMetrics::Convert {
            color_space,
            width,
            height,
            channel_count,
        } => format!("{color_space} {width}x{height} -> {channel_count} channels"),
        StageMetrics::EdgeDetection {
            method,
            low_threshold,
            high_threshold,
            channels,
        } => format!(
            "{method} low={low_threshold} high={high_threshold} ({} planes)",
            channels.len(),
        ),
        StageMetrics::Aggregation {
            rule,
            nonzero_pixel_count,
            mean_intensity,
        } => format!("{rule} nonzero={nonzero_pixel_count} mean={mean_intensity:.2}"),
    }
}

/// Count pixels with any edge response.
pub(crate) fn count_nonzero_pixels(image: &GrayImage) -> u64 {
    image
        .pixels()
        .map(|p| u64::from(u8::from(p.0[0] != 0)))
        .sum()
}

/// Mean pixel value, or 0 for an empty image.
#[allow(clippy::cast_precision_loss)]
pub(crate) fn mean_intensity(image: &GrayImage) -> f64 {
    let count = image.as_raw().len();
    if count == 0 {
        return 0.0;
    }
    let sum: u64 = image.as_raw().iter().map(|&v| u64::from(v)).sum();
    sum as f64 / count as f64
}
