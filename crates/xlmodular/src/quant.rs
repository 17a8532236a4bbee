//! Near-lossless residual quantization: round the prediction residual to the nearest multiple
//! of `step` before entropy coding. `step == 1` is the lossless identity case.

/// Rounds `residual` to the nearest multiple of `step` and returns the quotient (the value that
/// gets entropy-coded).
pub fn quantize(residual: i32, step: u32) -> i32 {
    if step <= 1 {
        return residual;
    }
    let step = step as i64;
    let residual = residual as i64;
    let half = step / 2;
    let rounded = if residual >= 0 { (residual + half) / step } else { -((-residual + half) / step) };
    rounded as i32
}

/// Expands a quantized residual back to the delta applied on top of the prediction.
pub fn dequantize(quantized: i32, step: u32) -> i32 {
    if step <= 1 {
        quantized
    } else {
        quantized * step as i32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lossless_step_is_identity() {
        for r in [-100, -1, 0, 1, 100] {
            assert_eq!(dequantize(quantize(r, 1), 1), r);
        }
    }

    #[test]
    fn quantization_stays_within_half_step() {
        let step = 5u32;
        for r in -50..50 {
            let q = quantize(r, step);
            let recon = dequantize(q, step);
            assert!((recon - r).abs() <= step as i32 / 2 + 1);
        }
    }

    #[test]
    fn zero_residual_quantizes_to_zero() {
        assert_eq!(quantize(0, 7), 0);
        assert_eq!(dequantize(0, 7), 0);
    }
}
