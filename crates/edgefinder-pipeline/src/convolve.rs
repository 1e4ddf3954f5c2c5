//! 2D convolution with reflect padding.
//!
//! The kernel is flipped before it is applied, so this is a true
//! convolution rather than a correlation. The input is padded per axis
//! by `⌈K/2⌉ − 1` samples before and `⌊K/2⌋` after; for odd kernels that
//! is `⌊K/2⌋` on both sides, and for the 2×2 Roberts kernels it is 0
//! before and 1 after. Padding mirrors interior samples across the
//! border without repeating the border sample (`c b | a b c d | c b`).
//!
//! Padding is never materialized: each padded coordinate is mapped back
//! into the plane by [`reflect`]. The result is identical to building the
//! padded plane and taking a dot product per window.

use crate::kernel::Kernel;
use crate::plane::FloatPlane;

/// Convolve `plane` with `kernel`, producing a plane of the same shape.
#[must_use = "returns the convolved plane"]
#[allow(clippy::cast_possible_wrap)]
pub fn convolve(plane: &FloatPlane, kernel: &Kernel) -> FloatPlane {
    let (width, height) = plane.dimensions();
    let (kw, kh) = (kernel.width(), kernel.height());
    let (before_x, before_y) = (pad_before(kw) as i64, pad_before(kh) as i64);

    FloatPlane::from_fn(width, height, |x, y| {
        let mut acc = 0.0;
        for ky in 0..kh {
            let sy = reflect(i64::from(y) + ky as i64 - before_y, height);
            for kx in 0..kw {
                let sx = reflect(i64::from(x) + kx as i64 - before_x, width);
                // Flipped kernel: window offset (kx, ky) pairs with weight
                // (kw - 1 - kx, kh - 1 - ky).
                acc += kernel.weight(kw - 1 - kx, kh - 1 - ky) * plane.get(sx, sy);
            }
        }
        acc
    })
}

/// Padding inserted before the first sample for a kernel of side `k`.
const fn pad_before(k: usize) -> usize {
    k.div_ceil(2) - 1
}

/// Map a possibly out-of-range coordinate onto `0..len` by mirroring
/// across the borders without repeating the edge sample.
///
/// Coordinates further out than one plane width keep bouncing, which is
/// what padding a narrow plane with a wide kernel requires. A
/// single-sample axis maps everything to 0.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn reflect(i: i64, len: u32) -> u32 {
    let n = i64::from(len);
    if n <= 1 {
        return 0;
    }
    let period = 2 * (n - 1);
    let m = i.rem_euclid(period);
    (if m < n { m } else { period - m }) as u32
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::kernel;

    #[test]
    fn reflect_mirrors_without_repeating_edge() {
        // len 4: ... 2 1 | 0 1 2 3 | 2 1 ...
        assert_eq!(reflect(-1, 4), 1);
        assert_eq!(reflect(-2, 4), 2);
        assert_eq!(reflect(4, 4), 2);
        assert_eq!(reflect(5, 4), 1);
        assert_eq!(reflect(2, 4), 2);
    }

    #[test]
    fn reflect_bounces_for_wide_padding() {
        // len 2: 0 1 0 1 0 ...
        assert_eq!(reflect(-2, 2), 0);
        assert_eq!(reflect(-1, 2), 1);
        assert_eq!(reflect(3, 2), 1);
        assert_eq!(reflect(4, 2), 0);
    }

    #[test]
    fn reflect_single_sample_axis() {
        assert_eq!(reflect(-2, 1), 0);
        assert_eq!(reflect(3, 1), 0);
    }

    #[test]
    fn pad_sizes() {
        assert_eq!(pad_before(2), 0);
        assert_eq!(pad_before(3), 1);
        assert_eq!(pad_before(5), 2);
    }

    #[test]
    fn constant_plane_yields_kernel_sum() {
        let gauss = kernel::gaussian(kernel::GAUSSIAN_SIZE, kernel::GAUSSIAN_SIGMA).unwrap();
        let ones = Kernel::from_vec(vec![1.0; 9], 3, 3).unwrap();
        let kernels = [
            &kernel::SOBEL_X,
            &kernel::SOBEL_Y,
            &kernel::SCHARR_X,
            &kernel::SCHARR_Y,
            &kernel::PREWITT_X,
            &kernel::PREWITT_Y,
            &kernel::ROBERTS_X,
            &kernel::ROBERTS_Y,
            &kernel::LAPLACIAN_4,
            &kernel::LAPLACIAN_8,
            &kernel::LAPLACIAN_OF_GAUSSIAN,
            &gauss,
            &ones,
        ];
        let c = 37.0;
        let plane = FloatPlane::from_pixel(7, 6, c);
        for k in kernels {
            let out = convolve(&plane, k);
            assert_eq!(out.dimensions(), (7, 6));
            let expected = c * k.sum();
            for &v in out.as_slice() {
                assert!((v - expected).abs() < 1e-9, "{k:?}: got {v}, expected {expected}");
            }
        }
    }

    #[test]
    fn kernel_is_flipped() {
        // Impulse at the center of a 5x5 plane. Convolution with an
        // asymmetric kernel reproduces the kernel itself around the
        // impulse (correlation would reproduce it mirrored).
        let mut plane = FloatPlane::new(5, 5);
        plane.set(2, 2, 1.0);
        let out = convolve(&plane, &kernel::SOBEL_X);
        for ky in 0..3u32 {
            for kx in 0..3u32 {
                let got = out.get(1 + kx, 1 + ky);
                let expected = kernel::SOBEL_X.weight(kx as usize, ky as usize);
                assert!((got - expected).abs() < 1e-12, "({kx},{ky}): {got} != {expected}");
            }
        }
    }

    #[test]
    fn matches_explicit_padded_dot_product() {
        // Build the reflect-padded plane explicitly and compare.
        let plane = FloatPlane::from_fn(4, 3, |x, y| f64::from(x * 7 + y * 13 % 5));
        let k = &kernel::SOBEL_Y;
        let out = convolve(&plane, k);

        let pad = 1i64;
        let padded_w = 4 + 2 * pad;
        let padded_h = 3 + 2 * pad;
        let padded = |px: i64, py: i64| plane.get(reflect(px - pad, 4), reflect(py - pad, 3));
        for y in 0..3i64 {
            for x in 0..4i64 {
                let mut acc = 0.0;
                for i in 0..3i64 {
                    for j in 0..3i64 {
                        let w = k.weight((2 - j) as usize, (2 - i) as usize);
                        acc += w * padded(x + j, y + i);
                    }
                }
                assert!(x + 2 < padded_w && y + 2 < padded_h);
                let got = out.get(x as u32, y as u32);
                assert!((got - acc).abs() < 1e-12, "({x},{y}): {got} != {acc}");
            }
        }
    }

    #[test]
    fn roberts_pads_after_only() {
        // Even kernel: window covers (x, y)..=(x+1, y+1), flipped.
        let plane = FloatPlane::from_fn(3, 3, |x, y| f64::from(x + 3 * y));
        let out = convolve(&plane, &kernel::ROBERTS_X);
        // Flipped ROBERTS_X = [[-1, 0], [0, 1]]: out = p(x+1, y+1) - p(x, y).
        assert!((out.get(0, 0) - 4.0).abs() < 1e-12);
        assert!((out.get(1, 1) - 4.0).abs() < 1e-12);
        // At the far border x+1 reflects to x-1 and y+1 to y-1.
        // p(1, 1) - p(2, 2) = 4 - 8 = -4.
        assert!((out.get(2, 2) + 4.0).abs() < 1e-12);
    }

    #[test]
    fn empty_plane_stays_empty() {
        let out = convolve(&FloatPlane::new(0, 0), &kernel::SOBEL_X);
        assert_eq!(out.dimensions(), (0, 0));
    }
}
