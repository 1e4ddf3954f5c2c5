//! Color-space decomposition of an RGB image into 8-bit channel planes.
//!
//! Every conversion produces planes in the usual 8-bit convention for its
//! space, so each channel can be fed to the same edge operators:
//!
//! | Space | Channels   | 8-bit encoding                                  |
//! |-------|------------|-------------------------------------------------|
//! | RGB   | R, G, B    | as stored                                       |
//! | HSV   | H, S, V    | H = hue° / 2 (0..=179), S and V scaled to 255   |
//! | LAB   | L, A, B    | L · 255 / 100, a + 128, b + 128 (D65)           |
//! | CMYK  | C, M, Y, K | each component scaled to 255 and truncated      |

use std::fmt;
use std::str::FromStr;

use image::{GrayImage, Luma, Rgb, RgbImage};
use palette::{FromColor, Hsv, Lab, Srgb, encoding};
use serde::{Deserialize, Serialize};

use crate::aggregate::AggregationRule;
use crate::operator::Method;
use crate::types::EdgeError;

/// Color representation whose channels are run through the edge operator.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorSpace {
    /// Red, green, blue.
    #[default]
    Rgb,
    /// Hue, saturation, value.
    Hsv,
    /// CIE L\*a\*b\*.
    Lab,
    /// Cyan, magenta, yellow, key.
    Cmyk,
}

impl ColorSpace {
    /// All color spaces, in display order.
    pub const ALL: [Self; 4] = [Self::Rgb, Self::Hsv, Self::Lab, Self::Cmyk];

    /// Lowercase name accepted by [`FromStr`].
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Rgb => "rgb",
            Self::Hsv => "hsv",
            Self::Lab => "lab",
            Self::Cmyk => "cmyk",
        }
    }

    /// Label keys of the channels, in plane order.
    #[must_use]
    pub const fn channel_keys(self) -> &'static [&'static str] {
        match self {
            Self::Rgb => &["R", "G", "B"],
            Self::Hsv => &["H", "S", "V"],
            Self::Lab => &["L", "A", "B"],
            Self::Cmyk => &["C", "M", "Y", "K"],
        }
    }

    /// Number of channel planes this space decomposes into.
    #[must_use]
    pub const fn channel_count(self) -> usize {
        self.channel_keys().len()
    }

    /// How per-channel edge planes combine into the aggregate for `method`.
    ///
    /// Canny output is already a thin edge map, so every space takes the
    /// element-wise maximum for both Canny variants.
    #[must_use]
    pub const fn aggregation_rule(self, method: Method) -> AggregationRule {
        match (self, method.is_canny()) {
            (Self::Rgb, false) => AggregationRule::WeightedAverage,
            (Self::Lab, false) => AggregationRule::EuclideanNorm,
            (Self::Hsv | Self::Cmyk, _) | (Self::Rgb | Self::Lab, true) => {
                AggregationRule::Maximum
            }
        }
    }
}

impl fmt::Display for ColorSpace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Rgb => "RGB",
            Self::Hsv => "HSV",
            Self::Lab => "LAB",
            Self::Cmyk => "CMYK",
        };
        f.write_str(name)
    }
}

impl FromStr for ColorSpace {
    type Err = EdgeError;

    /// Case-insensitive lookup by name.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|space| space.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| EdgeError::UnsupportedColorSpace(s.to_owned()))
    }
}

/// Byte order of an interleaved 3-channel pixel buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelOrder {
    Rgb,
    Bgr,
}

/// Build an RGB image from interleaved 8-bit pixels.
///
/// # Errors
///
/// Returns [`EdgeError::InvalidImage`] if either dimension is zero or
/// `bytes.len()` is not `width * height * 3`.
pub fn rgb_from_interleaved(
    bytes: &[u8],
    width: u32,
    height: u32,
    order: ChannelOrder,
) -> Result<RgbImage, EdgeError> {
    if width == 0 || height == 0 {
        return Err(EdgeError::InvalidImage(format!(
            "image has no pixels ({width}x{height})"
        )));
    }
    let expected = (width as usize)
        .checked_mul(height as usize)
        .and_then(|n| n.checked_mul(3));
    if expected != Some(bytes.len()) {
        return Err(EdgeError::InvalidImage(format!(
            "{} bytes do not hold a {width}x{height} 3-channel image",
            bytes.len()
        )));
    }

    let data = match order {
        ChannelOrder::Rgb => bytes.to_vec(),
        ChannelOrder::Bgr => bytes
            .chunks_exact(3)
            .flat_map(|px| [px[2], px[1], px[0]])
            .collect(),
    };
    RgbImage::from_raw(width, height, data)
        .ok_or_else(|| EdgeError::InvalidImage("pixel buffer does not match dimensions".into()))
}

/// Check that `image` has at least one pixel.
///
/// # Errors
///
/// Returns [`EdgeError::InvalidImage`] for a zero-width or zero-height image.
pub fn validate(image: &RgbImage) -> Result<(), EdgeError> {
    if image.width() == 0 || image.height() == 0 {
        return Err(EdgeError::InvalidImage(format!(
            "image has no pixels ({}x{})",
            image.width(),
            image.height()
        )));
    }
    Ok(())
}

/// Decompose `image` into the channel planes of `space`.
///
/// Returns [`ColorSpace::channel_count`] planes, each the size of `image`,
/// in [`ColorSpace::channel_keys`] order.
///
/// # Errors
///
/// Returns [`EdgeError::InvalidImage`] for an image with no pixels.
pub fn split_channels(image: &RgbImage, space: ColorSpace) -> Result<Vec<GrayImage>, EdgeError> {
    validate(image)?;
    let planes = match space {
        ColorSpace::Rgb => split_with(image, |p| p.0),
        ColorSpace::Hsv => split_with(image, |p| rgb_to_hsv8(p.0)),
        ColorSpace::Lab => split_with(image, |p| rgb_to_lab8(p.0)),
        ColorSpace::Cmyk => split_with(image, |p| rgb_to_cmyk8(p.0)),
    };
    Ok(planes)
}

/// Convert every pixel with `f` and scatter the components into planes.
fn split_with<const N: usize>(image: &RgbImage, f: impl Fn(&Rgb<u8>) -> [u8; N]) -> Vec<GrayImage> {
    let (width, height) = image.dimensions();
    let mut planes: Vec<GrayImage> = (0..N).map(|_| GrayImage::new(width, height)).collect();
    for (x, y, pixel) in image.enumerate_pixels() {
        let components = f(pixel);
        for (plane, value) in planes.iter_mut().zip(components) {
            plane.put_pixel(x, y, Luma([value]));
        }
    }
    planes
}

/// Round and saturate an `f64` into a byte.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn saturate(v: f64) -> u8 {
    v.round().clamp(0.0, 255.0) as u8
}

/// 8-bit HSV: hue in half-degrees so a full turn fits in a byte.
fn rgb_to_hsv8([r, g, b]: [u8; 3]) -> [u8; 3] {
    let hsv: Hsv<encoding::Srgb, f64> = Hsv::from_color(Srgb::new(r, g, b).into_format::<f64>());
    // 359.x degrees rounds up to a full turn.
    let h = saturate(hsv.hue.into_positive_degrees() / 2.0) % 180;
    [h, saturate(hsv.saturation * 255.0), saturate(hsv.value * 255.0)]
}

/// 8-bit CIE L\*a\*b\* under D65.
fn rgb_to_lab8([r, g, b]: [u8; 3]) -> [u8; 3] {
    let srgb = Srgb::new(r, g, b).into_format::<f32>();
    let lab: Lab = Lab::from_color(srgb.into_linear());
    [
        saturate(f64::from(lab.l) * 255.0 / 100.0),
        saturate(f64::from(lab.a) + 128.0),
        saturate(f64::from(lab.b) + 128.0),
    ]
}

/// Subtractive CMYK with the key factored out of C, M and Y.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn rgb_to_cmyk8([r, g, b]: [u8; 3]) -> [u8; 4] {
    let c = 1.0 - f64::from(r) / 255.0;
    let m = 1.0 - f64::from(g) / 255.0;
    let y = 1.0 - f64::from(b) / 255.0;
    let k = c.min(m).min(y);
    let denom = if 1.0 - k == 0.0 { 1.0 } else { 1.0 - k };

    let to_byte = |v: f64| (v * 255.0).clamp(0.0, 255.0) as u8;
    [
        to_byte((c - k) / denom),
        to_byte((m - k) / denom),
        to_byte((y - k) / denom),
        to_byte(k),
    ]
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn single(r: u8, g: u8, b: u8) -> RgbImage {
        RgbImage::from_pixel(1, 1, Rgb([r, g, b]))
    }

    fn components(image: &RgbImage, space: ColorSpace) -> Vec<u8> {
        split_channels(image, space)
            .unwrap()
            .iter()
            .map(|p| p.get_pixel(0, 0).0[0])
            .collect()
    }

    #[test]
    fn parse_is_case_insensitive() {
        assert_eq!("RGB".parse::<ColorSpace>().unwrap(), ColorSpace::Rgb);
        assert_eq!("hsv".parse::<ColorSpace>().unwrap(), ColorSpace::Hsv);
        assert_eq!("Lab".parse::<ColorSpace>().unwrap(), ColorSpace::Lab);
        assert_eq!("cMyK".parse::<ColorSpace>().unwrap(), ColorSpace::Cmyk);
    }

    #[test]
    fn parse_unknown_space_fails() {
        let err = "XYZ".parse::<ColorSpace>().unwrap_err();
        assert_eq!(err, EdgeError::UnsupportedColorSpace("XYZ".into()));
    }

    #[test]
    fn display_round_trips_through_parse() {
        for space in ColorSpace::ALL {
            assert_eq!(space.to_string().parse::<ColorSpace>().unwrap(), space);
        }
    }

    #[test]
    fn channel_counts() {
        assert_eq!(ColorSpace::Rgb.channel_count(), 3);
        assert_eq!(ColorSpace::Hsv.channel_count(), 3);
        assert_eq!(ColorSpace::Lab.channel_count(), 3);
        assert_eq!(ColorSpace::Cmyk.channel_count(), 4);
    }

    #[test]
    fn aggregation_rules() {
        use AggregationRule::{EuclideanNorm, Maximum, WeightedAverage};
        assert_eq!(ColorSpace::Rgb.aggregation_rule(Method::Sobel), WeightedAverage);
        assert_eq!(ColorSpace::Rgb.aggregation_rule(Method::Laplacian4), WeightedAverage);
        assert_eq!(ColorSpace::Rgb.aggregation_rule(Method::Canny), Maximum);
        assert_eq!(ColorSpace::Rgb.aggregation_rule(Method::CannyBuiltin), Maximum);
        assert_eq!(ColorSpace::Hsv.aggregation_rule(Method::Sobel), Maximum);
        assert_eq!(ColorSpace::Lab.aggregation_rule(Method::Scharr), EuclideanNorm);
        assert_eq!(ColorSpace::Lab.aggregation_rule(Method::Canny), Maximum);
        assert_eq!(ColorSpace::Cmyk.aggregation_rule(Method::Prewitt), Maximum);
    }

    #[test]
    fn rgb_split_preserves_order() {
        assert_eq!(components(&single(10, 20, 30), ColorSpace::Rgb), vec![10, 20, 30]);
    }

    #[test]
    fn cmyk_white_and_black() {
        assert_eq!(components(&single(255, 255, 255), ColorSpace::Cmyk), vec![0, 0, 0, 0]);
        assert_eq!(components(&single(0, 0, 0), ColorSpace::Cmyk), vec![0, 0, 0, 255]);
    }

    #[test]
    fn cmyk_primaries() {
        assert_eq!(components(&single(255, 0, 0), ColorSpace::Cmyk), vec![0, 255, 255, 0]);
        assert_eq!(components(&single(0, 255, 255), ColorSpace::Cmyk), vec![255, 0, 0, 0]);
    }

    #[test]
    fn hsv_primaries() {
        assert_eq!(components(&single(255, 0, 0), ColorSpace::Hsv), vec![0, 255, 255]);
        assert_eq!(components(&single(0, 255, 0), ColorSpace::Hsv), vec![60, 255, 255]);
        assert_eq!(components(&single(0, 0, 255), ColorSpace::Hsv), vec![120, 255, 255]);
    }

    #[test]
    fn hsv_mixed_color() {
        // Hue 20°, saturation 150/200, value 200.
        assert_eq!(components(&single(200, 100, 50), ColorSpace::Hsv), vec![10, 191, 200]);
        // Hue 210°.
        assert_eq!(components(&single(0, 128, 255), ColorSpace::Hsv), vec![105, 255, 255]);
    }

    #[test]
    fn hsv_gray_has_no_hue_or_saturation() {
        assert_eq!(components(&single(128, 128, 128), ColorSpace::Hsv), vec![0, 0, 128]);
        assert_eq!(components(&single(0, 0, 0), ColorSpace::Hsv), vec![0, 0, 0]);
    }

    #[test]
    fn hsv_hue_stays_below_180() {
        // Hue just under 360 degrees wraps to 0 instead of 180.
        let [h, _, _] = rgb_to_hsv8([255, 0, 1]);
        assert!(h < 180);
    }

    #[test]
    fn lab_white_and_black() {
        let white = components(&single(255, 255, 255), ColorSpace::Lab);
        assert_eq!(white[0], 255);
        assert!((i16::from(white[1]) - 128).abs() <= 1);
        assert!((i16::from(white[2]) - 128).abs() <= 1);

        let black = components(&single(0, 0, 0), ColorSpace::Lab);
        assert_eq!(black, vec![0, 128, 128]);
    }

    #[test]
    fn lab_red_has_positive_a() {
        let red = components(&single(255, 0, 0), ColorSpace::Lab);
        assert!(red[1] > 128 + 60, "a channel of red: {}", red[1]);
    }

    #[test]
    fn split_rejects_empty_image() {
        let result = split_channels(&RgbImage::new(0, 5), ColorSpace::Rgb);
        assert!(matches!(result, Err(EdgeError::InvalidImage(_))));
    }

    #[test]
    fn split_preserves_dimensions() {
        let image = RgbImage::from_fn(7, 3, |x, y| Rgb([u8::try_from(x * 30).unwrap(), u8::try_from(y * 80).unwrap(), 5]));
        for space in ColorSpace::ALL {
            let planes = split_channels(&image, space).unwrap();
            assert_eq!(planes.len(), space.channel_count());
            assert!(planes.iter().all(|p| p.dimensions() == (7, 3)));
        }
    }

    #[test]
    fn interleaved_bgr_is_swapped() {
        let image = rgb_from_interleaved(&[1, 2, 3, 4, 5, 6], 2, 1, ChannelOrder::Bgr).unwrap();
        assert_eq!(image.get_pixel(0, 0).0, [3, 2, 1]);
        assert_eq!(image.get_pixel(1, 0).0, [6, 5, 4]);
    }

    #[test]
    fn interleaved_rgb_is_copied() {
        let image = rgb_from_interleaved(&[1, 2, 3], 1, 1, ChannelOrder::Rgb).unwrap();
        assert_eq!(image.get_pixel(0, 0).0, [1, 2, 3]);
    }

    #[test]
    fn interleaved_rejects_bad_buffers() {
        assert!(matches!(
            rgb_from_interleaved(&[1, 2], 1, 1, ChannelOrder::Rgb),
            Err(EdgeError::InvalidImage(_))
        ));
        assert!(matches!(
            rgb_from_interleaved(&[], 0, 0, ChannelOrder::Rgb),
            Err(EdgeError::InvalidImage(_))
        ));
    }
}
