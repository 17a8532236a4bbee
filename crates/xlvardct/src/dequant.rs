//! Per-channel quantization tables over the 64 zigzag coefficient positions, scaled by a
//! frame-level distance. Channel order matches [`xlcolor::ycbcr`]: 0 = Y, 1 = Cb, 2 = Cr.

use crate::zigzag::BLOCK_LEN;

/// Base DC divisor per channel: finer for luma than chroma, mirroring the channel weighting in
/// the teacher's `Dct8` dequant matrix (scaled down since these divisors act directly on
/// pixel-range DCT output rather than the teacher's XYB-normalized coefficients).
const BASE: [f32; 3] = [2.0, 3.0, 3.0];
/// Per-step growth of the divisor across the zigzag run, coarsening higher frequencies faster
/// for luma than chroma.
const GROWTH: [f32; 3] = [0.25, 0.2, 0.2];

/// Maps a user-facing quality (0..100) to an encoder distance; monotonic, `distance(90) == 1.0`.
pub fn distance_from_quality(quality: u8) -> f32 {
    let quality = quality.min(100) as f32;
    (0.1 + (100.0 - quality) * 0.09).max(0.0)
}

fn step(channel: usize, zigzag_index: usize, distance: f32) -> f32 {
    BASE[channel] * (1.0 + GROWTH[channel] * zigzag_index as f32) * distance.max(0.1)
}

/// Rounds each zigzag-ordered coefficient by its quantization step, channel- and
/// distance-scaled.
pub fn quantize_block(coeffs_zigzag: &[f32; BLOCK_LEN], channel: usize, distance: f32) -> [i32; BLOCK_LEN] {
    let mut out = [0i32; BLOCK_LEN];
    for (i, (&c, o)) in coeffs_zigzag.iter().zip(out.iter_mut()).enumerate() {
        let q = step(channel, i, distance);
        *o = (c / q).round() as i32;
    }
    out
}

pub fn dequantize_block(quantized: &[i32; BLOCK_LEN], channel: usize, distance: f32) -> [f32; BLOCK_LEN] {
    let mut out = [0f32; BLOCK_LEN];
    for (i, (&q, o)) in quantized.iter().zip(out.iter_mut()).enumerate() {
        *o = q as f32 * step(channel, i, distance);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn distance_is_monotonic_and_hits_reference_point() {
        assert!((distance_from_quality(90) - 1.0).abs() < 1e-6);
        assert!(distance_from_quality(100) < distance_from_quality(90));
        assert!(distance_from_quality(90) < distance_from_quality(10));
    }

    #[test]
    fn quantize_dequantize_stays_within_half_step() {
        let mut coeffs = [0f32; BLOCK_LEN];
        for (i, c) in coeffs.iter_mut().enumerate() {
            *c = (i as f32 - 32.0) * 7.5;
        }
        let distance = distance_from_quality(75);
        for channel in 0..3 {
            let q = quantize_block(&coeffs, channel, distance);
            let recon = dequantize_block(&q, channel, distance);
            for (i, (orig, rec)) in coeffs.iter().zip(&recon).enumerate() {
                let q_step = step(channel, i, distance);
                assert!((orig - rec).abs() <= q_step, "{orig} vs {rec}");
            }
        }
    }

    #[test]
    fn zero_block_quantizes_to_zero() {
        let coeffs = [0f32; BLOCK_LEN];
        let q = quantize_block(&coeffs, 0, 1.0);
        assert_eq!(q, [0i32; BLOCK_LEN]);
    }
}
