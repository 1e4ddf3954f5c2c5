//! Display post-processing of edge planes.
//!
//! Edge planes come out of the pipeline as bright-on-dark. For viewing or
//! saving they are usually flipped to dark lines on white, optionally
//! reduced to pure black and white.

use image::{GrayImage, Luma};
use serde::{Deserialize, Serialize};

/// Values above this become white in [`binarize`].
pub const BINARIZE_THRESHOLD: u8 = 254;

/// Invert an edge map (bitwise NOT).
///
/// Swaps edge pixels (255 → 0) and background pixels (0 → 255).
#[must_use = "returns the inverted edge map"]
pub fn invert_edge_map(edges: &GrayImage) -> GrayImage {
    GrayImage::from_fn(edges.width(), edges.height(), |x, y| {
        Luma([!edges.get_pixel(x, y).0[0]])
    })
}

/// Map values above [`BINARIZE_THRESHOLD`] to 255 and everything else
/// to 0.
///
/// On an inverted map only pure background survives as white, so every
/// pixel with any edge response turns black.
#[must_use = "returns the binarized plane"]
pub fn binarize(plane: &GrayImage) -> GrayImage {
    GrayImage::from_fn(plane.width(), plane.height(), |x, y| {
        let v = plane.get_pixel(x, y).0[0];
        Luma([if v > BINARIZE_THRESHOLD { 255 } else { 0 }])
    })
}

/// How an edge plane is prepared for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayOptions {
    /// Dark edges on a white background.
    pub invert: bool,
    /// Reduce to pure black and white after inversion.
    pub binarize: bool,
}

impl DisplayOptions {
    pub const DEFAULT_INVERT: bool = true;
    pub const DEFAULT_BINARIZE: bool = false;

    /// Apply inversion, then binarization, as enabled.
    #[must_use = "returns the display plane"]
    pub fn apply(self, plane: &GrayImage) -> GrayImage {
        let plane = if self.invert {
            invert_edge_map(plane)
        } else {
            plane.clone()
        };
        if self.binarize {
            binarize(&plane)
        } else {
            plane
        }
    }
}

impl Default for DisplayOptions {
    fn default() -> Self {
        Self {
            invert: Self::DEFAULT_INVERT,
            binarize: Self::DEFAULT_BINARIZE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(values: &[u8]) -> GrayImage {
        GrayImage::from_fn(
            u32::try_from(values.len()).unwrap_or(0),
            1,
            |x, _| Luma([values[x as usize]]),
        )
    }

    #[test]
    fn invert_flips_all_values() {
        let inverted = invert_edge_map(&row(&[0, 1, 128, 255]));
        assert_eq!(inverted.as_raw(), &vec![255, 254, 127, 0]);
    }

    #[test]
    fn invert_preserves_dimensions() {
        let img = GrayImage::new(13, 29);
        assert_eq!(invert_edge_map(&img).dimensions(), (13, 29));
    }

    #[test]
    fn binarize_keeps_only_full_white() {
        let out = binarize(&row(&[0, 200, 254, 255]));
        assert_eq!(out.as_raw(), &vec![0, 0, 0, 255]);
    }

    #[test]
    fn default_display_inverts_only() {
        let out = DisplayOptions::default().apply(&row(&[0, 10, 255]));
        assert_eq!(out.as_raw(), &vec![255, 245, 0]);
    }

    #[test]
    fn invert_then_binarize_marks_any_edge_black() {
        let options = DisplayOptions {
            invert: true,
            binarize: true,
        };
        let out = options.apply(&row(&[0, 1, 90, 255]));
        assert_eq!(out.as_raw(), &vec![255, 0, 0, 0]);
    }

    #[test]
    fn disabled_options_are_identity() {
        let options = DisplayOptions {
            invert: false,
            binarize: false,
        };
        let plane = row(&[3, 4, 5]);
        assert_eq!(options.apply(&plane), plane);
    }
}
