//! Least squares endpoint optimization for BC6H.
//!
//! Based on https://github.com/knarkowicz/GPURealTimeBC6H (public domain).
//! The fit operates on the bit patterns of half floats, which are roughly
//! logarithmic in the value.

use glam::Vec3A;

use crate::color::{f16_bits_to_f32, f32_to_f16_bits};

/// The bits of the largest finite half float.
const F16_MAX_BITS: f32 = 0x7BFF as f32;

fn to_f16_bits(v: Vec3A) -> Vec3A {
    Vec3A::new(
        f32_to_f16_bits(v.x) as f32,
        f32_to_f16_bits(v.y) as f32,
        f32_to_f16_bits(v.z) as f32,
    )
}
fn from_f16_bits(v: Vec3A) -> [f32; 3] {
    [v.x, v.y, v.z].map(|c| f16_bits_to_f32(c as u16))
}

fn texel_index(r: f32, index_bits: u8) -> f32 {
    if index_bits == 4 {
        (r * 15.0).clamp(0.0, 15.0).floor()
    } else {
        (r * 6.98182 + 0.00909 + 0.5).clamp(0.0, 7.0).floor()
    }
}

/// Fits two endpoints to the pixels.
///
/// Every pixel is assigned the index of its projection onto the current
/// endpoints in half float bits, then the endpoints that minimize the squared
/// error for these indexes are solved for. Returns `None` if the system is degenerate. The
/// result is clamped to `0..=f16::MAX`, so this only makes sense for
/// non-negative pixels.
pub(crate) fn refine_endpoints(
    pixels: &[[f32; 3]],
    e0: [f32; 3],
    e1: [f32; 3],
    index_bits: u8,
) -> Option<([f32; 3], [f32; 3])> {
    let e0 = to_f16_bits(Vec3A::from(e0));
    let e1 = to_f16_bits(Vec3A::from(e1));

    // channels may run in opposite directions
    let dir = e1 - e0;
    let length_sq = dir.length_squared();
    if length_sq < 1.0 {
        return None;
    }

    let max_index = ((1 << index_bits) - 1) as f32;
    let mut alpha_texel_sum = Vec3A::ZERO;
    let mut beta_texel_sum = Vec3A::ZERO;
    let mut alpha_beta_sum = 0.0;
    let mut alpha_sq_sum = 0.0;
    let mut beta_sq_sum = 0.0;

    for &pixel in pixels {
        let texel = to_f16_bits(Vec3A::from(pixel));
        let r = (texel - e0).dot(dir) / length_sq;
        let index = texel_index(r, index_bits);

        let beta = (index / max_index).clamp(0.0, 1.0);
        let alpha = 1.0 - beta;

        alpha_texel_sum += texel * alpha;
        beta_texel_sum += texel * beta;
        alpha_beta_sum += alpha * beta;
        alpha_sq_sum += alpha * alpha;
        beta_sq_sum += beta * beta;
    }

    let det = alpha_sq_sum * beta_sq_sum - alpha_beta_sum * alpha_beta_sum;
    if !(det.abs() > 1e-5) {
        return None;
    }

    let det_rcp = 1.0 / det;
    let max = Vec3A::splat(F16_MAX_BITS);
    let ep0 = ((alpha_texel_sum * beta_sq_sum - beta_texel_sum * alpha_beta_sum) * det_rcp)
        .clamp(Vec3A::ZERO, max);
    let ep1 = ((beta_texel_sum * alpha_sq_sum - alpha_texel_sum * alpha_beta_sum) * det_rcp)
        .clamp(Vec3A::ZERO, max);

    Some((from_f16_bits(ep0), from_f16_bits(ep1)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recovers_a_gradient() {
        // within one exponent, half float bits are linear in the value
        let pixels: Vec<[f32; 3]> = (0..16).map(|i| [1.0 + i as f32 / 16.0; 3]).collect();

        let (e0, e1) = refine_endpoints(&pixels, [1.0; 3], [1.9375; 3], 4).unwrap();
        for c in 0..3 {
            assert!((e0[c] - 1.0).abs() < 0.1, "{e0:?}");
            assert!((e1[c] - 1.9375).abs() < 0.1, "{e1:?}");
        }
    }

    #[test]
    fn recovers_a_falling_channel() {
        let pixels: Vec<[f32; 3]> = (0..16)
            .map(|i| [1.0 + i as f32 / 16.0, 1.9375 - i as f32 / 16.0, 1.5])
            .collect();

        let (e0, e1) =
            refine_endpoints(&pixels, [1.0, 1.9375, 1.5], [1.9375, 1.0, 1.5], 4).unwrap();
        for (c, (low, high)) in [(1.0, 1.9375), (1.9375, 1.0), (1.5, 1.5)].into_iter().enumerate() {
            assert!((e0[c] - low).abs() < 0.1, "{e0:?}");
            assert!((e1[c] - high).abs() < 0.1, "{e1:?}");
        }
    }

    #[test]
    fn degenerate_inputs() {
        let pixels = [[0.5_f32; 3]; 16];
        // no direction
        assert_eq!(refine_endpoints(&pixels, [1.0; 3], [1.0; 3], 4), None);
        // all pixels get the same index
        assert_eq!(refine_endpoints(&pixels, [0.0; 3], [1.0; 3], 3), None);
        // the pixel sits in the middle of a falling direction
        assert_eq!(
            refine_endpoints(&pixels, [0.0, 1.0, 0.0], [1.0, 0.0, 0.0], 4),
            None
        );
    }
}
