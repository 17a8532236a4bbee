//! Zero run-length + magnitude-class tokenization of a coefficient block, independent of which
//! entropy backend encodes the resulting token/extra-bits stream.
//!
//! A token packs `(zero_run, magnitude_class)` into one symbol: `run * SIZE_CLASSES +
//! size_class`. `size_class == 0` with `run == 0` is the end-of-block marker; a maximal run of
//! `MAX_RUN` zeros with `size_class == 0` is a run-continuation marker (mirrors JPEG's ZRL).
//! `size_class == ESCAPE_CLASS` is a third marker: DCT coefficients and near-lossless residuals
//! fit comfortably under `MAX_SIZE_CLASS` bits, but a Modular channel over raw `F32` bit patterns
//! (spectral/depth data, or any gradient crossing a sign or exponent boundary) can produce
//! residuals in the hundreds of millions. The escape marker carries the value as a fixed 32-bit
//! zig-zag field instead of the variable-width one, so no magnitude is ever out of range.

use xlbit::{BitReader, BitWriter};

use crate::Result;

pub const MAX_RUN: u32 = 15;
pub const MAX_SIZE_CLASS: u32 = 16;
/// Sentinel size class: the magnitude that follows is a raw, fixed-width 32-bit zig-zag value
/// rather than a `size_class`-bit variable field.
pub const ESCAPE_CLASS: u32 = MAX_SIZE_CLASS + 1;
pub const SIZE_CLASSES: u32 = ESCAPE_CLASS + 1;
pub const ALPHABET_SIZE: usize = ((MAX_RUN + 1) * SIZE_CLASSES) as usize;

pub fn token_symbol(run: u32, size_class: u32) -> u16 {
    debug_assert!(run <= MAX_RUN && size_class <= ESCAPE_CLASS);
    (run * SIZE_CLASSES + size_class) as u16
}

fn token_parts(symbol: u16) -> (u32, u32) {
    let symbol = symbol as u32;
    (symbol / SIZE_CLASSES, symbol % SIZE_CLASSES)
}

/// The number of bits needed to hold `value`'s magnitude, capped so that anything requiring more
/// than [`MAX_SIZE_CLASS`] bits is reported as [`ESCAPE_CLASS`] instead.
fn size_class(value: i32) -> u32 {
    let magnitude = value.unsigned_abs();
    let bits = 32 - magnitude.leading_zeros();
    if bits > MAX_SIZE_CLASS {
        ESCAPE_CLASS
    } else {
        bits
    }
}

/// Emits tokens for `coeffs` (run, size_class) and returns them alongside the raw magnitude
/// bits each token with a nonzero size class needs, so callers can entropy-code the tokens and
/// bit-pack the magnitudes separately (or inline, as [`write_block`] does).
pub fn tokenize(coeffs: &[i32]) -> Vec<(u16, i32)> {
    let mut tokens = Vec::new();
    let Some(last_nonzero) = coeffs.iter().rposition(|&c| c != 0) else {
        tokens.push((token_symbol(0, 0), 0));
        return tokens;
    };

    let mut run = 0u32;
    for &c in &coeffs[..=last_nonzero] {
        if c == 0 {
            run += 1;
            if run == MAX_RUN + 1 {
                // `(MAX_RUN, 0)` is the run-continuation marker: it stands for MAX_RUN + 1
                // zeros, not a literal run of MAX_RUN.
                tokens.push((token_symbol(MAX_RUN, 0), 0));
                run = 0;
            }
            continue;
        }
        tokens.push((token_symbol(run, size_class(c)), c));
        run = 0;
    }
    if last_nonzero + 1 < coeffs.len() {
        tokens.push((token_symbol(0, 0), 0));
    }
    tokens
}

/// Writes the magnitude's extra bits using JPEG-style variable-length-integer packing: the
/// stored value is `v` for positive `v` and `v + (1 << size) - 1` for negative `v`, so the top
/// bit of the stored field distinguishes sign. `size == ESCAPE_CLASS` instead writes the full
/// value as a fixed 32-bit zig-zag field, since `1 << size` would overflow past 16 bits anyway.
pub fn write_magnitude(w: &mut BitWriter, value: i32, size: u32) -> Result<()> {
    if size == 0 {
        return Ok(());
    }
    if size == ESCAPE_CLASS {
        w.append_bits(xlbit::pack_signed(value), 32)?;
        return Ok(());
    }
    let stored = if value > 0 {
        value as u32
    } else {
        (value + (1 << size) - 1) as u32
    };
    w.append_bits(stored, size as usize)?;
    Ok(())
}

pub fn read_magnitude(r: &mut BitReader, size: u32) -> Result<i32> {
    if size == 0 {
        return Ok(0);
    }
    if size == ESCAPE_CLASS {
        return Ok(xlbit::unpack_signed(r.read_bits(32)?));
    }
    let raw = r.read_bits(size as usize)?;
    let half = 1u32 << (size - 1);
    Ok(if raw < half { raw as i32 - (1i32 << size) + 1 } else { raw as i32 })
}

/// Expands `(symbol, extra_bits)` token events back into a flat coefficient array, honoring the
/// end-of-block marker by leaving the remainder zero-filled.
pub fn detokenize(tokens: &[(u16, i32)], len: usize) -> Vec<i32> {
    let mut out = vec![0i32; len];
    let mut pos = 0usize;
    for &(symbol, value) in tokens {
        let (run, size) = token_parts(symbol);
        if size == 0 {
            if run == 0 {
                break; // end-of-block
            }
            // Run-continuation marker: `run` (== MAX_RUN) stands for MAX_RUN + 1 zeros.
            pos += run as usize + 1;
            continue;
        }
        pos += run as usize;
        if pos < len {
            out[pos] = value;
        }
        pos += 1;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_mixed_block() {
        let mut coeffs = vec![0i32; 64];
        coeffs[0] = 12;
        coeffs[3] = -5;
        coeffs[4] = 1;
        coeffs[40] = -300;

        let tokens = tokenize(&coeffs);
        let decoded = detokenize(&tokens, coeffs.len());
        assert_eq!(decoded, coeffs);
    }

    #[test]
    fn all_zero_block_is_single_eob() {
        let coeffs = vec![0i32; 64];
        let tokens = tokenize(&coeffs);
        assert_eq!(tokens.len(), 1);
        let (run, size) = token_parts(tokens[0].0);
        assert_eq!((run, size), (0, 0));
        assert_eq!(detokenize(&tokens, 64), coeffs);
    }

    #[test]
    fn magnitude_round_trips_through_bits() {
        for value in [-300i32, -1, 1, 2047, -2047] {
            let size = size_class(value);
            assert_ne!(size, ESCAPE_CLASS);
            let mut w = BitWriter::new();
            write_magnitude(&mut w, value, size).unwrap();
            let bytes = w.finish();
            let mut r = BitReader::new(&bytes);
            assert_eq!(read_magnitude(&mut r, size).unwrap(), value);
        }
    }

    #[test]
    fn magnitudes_past_max_size_class_use_the_escape_marker() {
        for value in [65536i32, -65536, 1 << 28, i32::MIN, i32::MAX] {
            let size = size_class(value);
            assert_eq!(size, ESCAPE_CLASS);
            let mut w = BitWriter::new();
            write_magnitude(&mut w, value, size).unwrap();
            let bytes = w.finish();
            let mut r = BitReader::new(&bytes);
            assert_eq!(read_magnitude(&mut r, size).unwrap(), value);
        }
    }

    #[test]
    fn block_with_a_bit_pattern_sized_residual_round_trips() {
        // Mirrors a Modular residual over raw F32 bit patterns, where a sign or exponent
        // boundary between neighboring samples produces a huge MED-predictor residual.
        let mut coeffs = vec![0i32; 16];
        coeffs[2] = i32::MIN / 2;
        coeffs[9] = 100_000;

        let tokens = tokenize(&coeffs);
        assert_eq!(detokenize(&tokens, coeffs.len()), coeffs);
    }

    #[test]
    fn long_zero_run_uses_continuation_marker() {
        let mut coeffs = vec![0i32; 40];
        coeffs[39] = 7;
        let tokens = tokenize(&coeffs);
        assert!(tokens.len() > 1);
        assert_eq!(detokenize(&tokens, coeffs.len()), coeffs);
    }
}
