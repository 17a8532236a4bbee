//! RGB <-> XYB (the perceptual space used for lossy VarDCT encoding), per spec §4.4. Forward and
//! inverse are exact algebraic inverses of each other using the opsin absorbance matrix and the
//! cube-root nonlinearity published by the specification.

use crate::consts::{OPSIN_ABSORBANCE_MATRIX, OPSIN_BIAS, OPSIN_BIAS_CBRT};

/// `[r, g, b]` (linear-light, scaled by `intensity_target`/255) -> `[x, y, b]`.
pub fn rgb_to_xyb(rgb: [&mut [f32]; 3], intensity_target: f32) {
    let [r, g, b] = rgb;
    assert_eq!(r.len(), g.len());
    assert_eq!(g.len(), b.len());
    let scale = intensity_target / 255.0;

    for ((r, g), b) in r.iter_mut().zip(g.iter_mut()).zip(b.iter_mut()) {
        let rgb = [*r * scale, *g * scale, *b * scale];
        let mut mixed_cbrt = [0f32; 3];
        for c in 0..3 {
            let m = &OPSIN_ABSORBANCE_MATRIX[c];
            let mixed = m[0] * rgb[0] + m[1] * rgb[1] + m[2] * rgb[2] + OPSIN_BIAS[c];
            mixed_cbrt[c] = mixed.max(0.0).cbrt() - OPSIN_BIAS_CBRT[c];
        }
        let [gl, gm, gs] = mixed_cbrt;
        *r = (gl - gm) / 2.0;
        *g = (gl + gm) / 2.0;
        *b = gs;
    }
}

/// `[x, y, b]` -> `[r, g, b]` (linear-light, scaled by `intensity_target`/255).
pub fn xyb_to_rgb(xyb: [&mut [f32]; 3], intensity_target: f32) {
    let [x, y, b] = xyb;
    assert_eq!(x.len(), y.len());
    assert_eq!(y.len(), b.len());
    let itscale = 255.0 / intensity_target;

    for ((x, y), b) in x.iter_mut().zip(y.iter_mut()).zip(b.iter_mut()) {
        let gl = *y + *x;
        let gm = *y - *x;
        let gs = *b;

        let gl = gl - OPSIN_BIAS_CBRT[0];
        let gm = gm - OPSIN_BIAS_CBRT[1];
        let gs = gs - OPSIN_BIAS_CBRT[2];

        *x = (gl * gl).mul_add(gl, OPSIN_BIAS[0]) * itscale;
        *y = (gm * gm).mul_add(gm, OPSIN_BIAS[1]) * itscale;
        *b = (gs * gs).mul_add(gs, OPSIN_BIAS[2]) * itscale;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip() {
        for &(r, g, b) in &[(0.0, 0.0, 0.0), (255.0, 255.0, 255.0), (128.0, 64.0, 200.0)] {
            let mut rb = [r];
            let mut gb = [g];
            let mut bb = [b];
            rgb_to_xyb([&mut rb, &mut gb, &mut bb], 255.0);
            xyb_to_rgb([&mut rb, &mut gb, &mut bb], 255.0);
            assert!((rb[0] - r).abs() < 0.05, "r {} vs {}", rb[0], r);
            assert!((gb[0] - g).abs() < 0.05, "g {} vs {}", gb[0], g);
            assert!((bb[0] - b).abs() < 0.05, "b {} vs {}", bb[0], b);
        }
    }
}
