//! Separable 8x8 DCT-II / DCT-III (its inverse), computed directly from the cosine basis rather
//! than the teacher's fast recursive butterfly, since only the fixed 8x8 block size is in scope
//! here.

pub const N: usize = 8;

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum DctDirection {
    Forward,
    Inverse,
}

fn basis() -> [[f32; N]; N] {
    let mut table = [[0f32; N]; N];
    for (k, row) in table.iter_mut().enumerate() {
        for (n, cell) in row.iter_mut().enumerate() {
            *cell = (std::f32::consts::PI / N as f32 * (n as f32 + 0.5) * k as f32).cos();
        }
    }
    table
}

fn scale(k: usize) -> f32 {
    let c = if k == 0 { std::f32::consts::FRAC_1_SQRT_2 } else { 1.0 };
    c * (2.0 / N as f32).sqrt()
}

/// Runs `N`-point DCT-II (forward) or DCT-III (inverse) over `line` in place.
fn dct_1d(line: &mut [f32; N], direction: DctDirection) {
    let basis = basis();
    let mut out = [0f32; N];
    match direction {
        DctDirection::Forward => {
            for (k, out_k) in out.iter_mut().enumerate() {
                let mut sum = 0f32;
                for n in 0..N {
                    sum += line[n] * basis[k][n];
                }
                *out_k = sum * scale(k);
            }
        },
        DctDirection::Inverse => {
            for (n, out_n) in out.iter_mut().enumerate() {
                let mut sum = 0f32;
                for k in 0..N {
                    sum += line[k] * scale(k) * basis[k][n];
                }
                *out_n = sum;
            }
        },
    }
    *line = out;
}

/// Runs the 2D DCT over an 8x8 block stored in row-major order, row transform then column
/// transform, matching the teacher's row-then-column separable structure.
pub fn dct_2d(block: &mut [f32; N * N], direction: DctDirection) {
    for row in 0..N {
        let mut line: [f32; N] = block[row * N..row * N + N].try_into().unwrap();
        dct_1d(&mut line, direction);
        block[row * N..row * N + N].copy_from_slice(&line);
    }
    for col in 0..N {
        let mut line = [0f32; N];
        for (row, v) in line.iter_mut().enumerate() {
            *v = block[row * N + col];
        }
        dct_1d(&mut line, direction);
        for (row, v) in line.into_iter().enumerate() {
            block[row * N + col] = v;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn forward_then_inverse_round_trips() {
        let mut block = [0f32; 64];
        for (i, v) in block.iter_mut().enumerate() {
            *v = (i as f32 * 1.7).sin() * 50.0;
        }
        let original = block;
        dct_2d(&mut block, DctDirection::Forward);
        dct_2d(&mut block, DctDirection::Inverse);
        for (a, b) in original.iter().zip(&block) {
            assert!((a - b).abs() < 1e-3, "{a} vs {b}");
        }
    }

    #[test]
    fn constant_block_has_energy_only_in_dc() {
        let mut block = [3.0f32; 64];
        dct_2d(&mut block, DctDirection::Forward);
        assert!(block[0].abs() > 1.0);
        for &coeff in &block[1..] {
            assert!(coeff.abs() < 1e-3, "{coeff}");
        }
    }
}
