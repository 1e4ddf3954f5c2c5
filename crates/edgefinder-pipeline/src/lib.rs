//! edgefinder-pipeline: multi-color-space edge detection (sans-IO).
//!
//! Splits an RGB image into the channels of one color space, runs an
//! edge operator on every channel, and combines the channel responses
//! into one aggregate edge map:
//!
//! color conversion -> per-channel edge detection -> aggregation.
//!
//! This crate has **no I/O dependencies**. It operates on in-memory
//! images and returns structured data; decoding, saving and display live
//! in `edgefinder-cli`. Display strings are resolved through a
//! caller-supplied [`LabelLookup`].

pub mod aggregate;
pub mod blur;
pub mod canny;
pub mod color;
pub mod convolve;
pub mod diagnostics;
pub mod kernel;
pub mod label;
pub mod normalize;
pub mod operator;
pub mod pipeline;
pub mod plane;
pub mod render;
pub mod types;

pub use aggregate::AggregationRule;
pub use color::{ChannelOrder, ColorSpace, rgb_from_interleaved};
pub use label::{IdentityLookup, LabelLookup, Language, Translations};
pub use operator::{EdgeOperator, EdgeResponse, Method};
pub use pipeline::Pipeline;
pub use plane::FloatPlane;
pub use render::DisplayOptions;
pub use types::{DetectConfig, EdgeError, EdgeResult, GrayImage, RgbImage, Threshold};

/// Run the full edge detection pipeline.
///
/// # Pipeline steps
///
/// 1. Validate the image and split it into `config.color_space` channels
/// 2. Run `config.method` on every channel with `config.threshold`
/// 3. Combine the channel planes with the color space's aggregation rule
/// 4. Resolve channel and aggregate labels through `labels`
///
/// # Errors
///
/// Returns [`EdgeError::InvalidImage`] if the image has no pixels.
pub fn detect_edges(
    image: &RgbImage,
    config: &DetectConfig,
    labels: &dyn LabelLookup,
) -> Result<EdgeResult, EdgeError> {
    Ok(Pipeline::new(image.clone(), *config)
        .convert()?
        .detect()
        .aggregate()
        .into_result(labels))
}

/// [`detect_edges`] with the color space and method given by name.
///
/// Names are matched case-insensitively (see [`ColorSpace`] and
/// [`Method`] for the accepted spellings).
///
/// # Errors
///
/// Checked in this order: [`EdgeError::InvalidImage`] if the image has no
/// pixels, [`EdgeError::UnsupportedMethod`] for an unknown method name,
/// [`EdgeError::UnsupportedColorSpace`] for an unknown color space name.
pub fn detect_edges_by_name(
    image: &RgbImage,
    color_space: &str,
    method: &str,
    threshold: Threshold,
    labels: &dyn LabelLookup,
) -> Result<EdgeResult, EdgeError> {
    color::validate(image)?;
    let method: Method = method.parse()?;
    let color_space: ColorSpace = color_space.parse()?;
    detect_edges(
        image,
        &DetectConfig::new(color_space, method, threshold),
        labels,
    )
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use image::Rgb;

    /// Left half black, right half white.
    fn sharp_edge_image(width: u32, height: u32) -> RgbImage {
        RgbImage::from_fn(width, height, |x, _y| {
            if x < width / 2 {
                Rgb([0, 0, 0])
            } else {
                Rgb([255, 255, 255])
            }
        })
    }

    #[test]
    fn detect_edges_default_config() {
        let result =
            detect_edges(&sharp_edge_image(20, 10), &DetectConfig::default(), &IdentityLookup)
                .unwrap();
        assert_eq!(result.channel_edges.len(), 3);
        assert_eq!(result.labels, vec!["R", "G", "B", "sum"]);
        assert!(result.aggregate.pixels().any(|p| p.0[0] == 255));
    }

    #[test]
    fn detect_edges_empty_image() {
        let result = detect_edges(&RgbImage::new(0, 0), &DetectConfig::default(), &IdentityLookup);
        assert!(matches!(result, Err(EdgeError::InvalidImage(_))));
    }

    #[test]
    fn by_name_parses_both_names() {
        let result = detect_edges_by_name(
            &sharp_edge_image(8, 8),
            "CMYK",
            "Scharr",
            Threshold::FULL,
            &IdentityLookup,
        )
        .unwrap();
        assert_eq!(result.labels, vec!["C", "M", "Y", "K", "sum"]);
    }

    #[test]
    fn by_name_unknown_method() {
        let err = detect_edges_by_name(
            &sharp_edge_image(8, 8),
            "RGB",
            "Fourier",
            Threshold::FULL,
            &IdentityLookup,
        )
        .unwrap_err();
        assert_eq!(err, EdgeError::UnsupportedMethod("Fourier".into()));
        assert_eq!(err.localized(&IdentityLookup), "unsupported_method");
    }

    #[test]
    fn by_name_unknown_color_space() {
        let err = detect_edges_by_name(
            &sharp_edge_image(8, 8),
            "YUV",
            "sobel",
            Threshold::FULL,
            &IdentityLookup,
        )
        .unwrap_err();
        assert_eq!(err, EdgeError::UnsupportedColorSpace("YUV".into()));
    }

    #[test]
    fn by_name_checks_image_first() {
        let err = detect_edges_by_name(
            &RgbImage::new(3, 0),
            "YUV",
            "Fourier",
            Threshold::FULL,
            &IdentityLookup,
        )
        .unwrap_err();
        assert_eq!(err.message_key(), "invalid_image");
    }

    #[test]
    fn by_name_checks_method_before_color_space() {
        let err = detect_edges_by_name(
            &sharp_edge_image(4, 4),
            "YUV",
            "Fourier",
            Threshold::FULL,
            &IdentityLookup,
        )
        .unwrap_err();
        assert_eq!(err.message_key(), "unsupported_method");
    }

    #[test]
    fn translated_labels() {
        let result = detect_edges(
            &sharp_edge_image(6, 6),
            &DetectConfig {
                color_space: ColorSpace::Hsv,
                ..DetectConfig::default()
            },
            &Translations::new(Language::Polish),
        )
        .unwrap();
        assert_eq!(result.labels, vec!["H", "S", "V", "Suma krawędzi"]);
    }
}
