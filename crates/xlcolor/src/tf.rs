//! Scalar transfer-function conversions between encoded (non-linear) and linear-light samples,
//! per spec §3 "linear<->encoded (sRGB/PQ/HLG/gamma)". No SIMD specialization: the scalar path is
//! the normative reference (§9 "Numeric contract vs accelerated backends").

use crate::header::TransferFunction;

pub fn linear_to_encoded(samples: &mut [f32], tf: TransferFunction) {
    match tf {
        TransferFunction::Gamma(g) => apply_gamma(samples, g as f32 / 1e7),
        TransferFunction::Linear | TransferFunction::Unknown => {}
        TransferFunction::Bt709 => {
            for x in samples {
                *x = bt709_oetf(*x);
            }
        }
        TransferFunction::Srgb | TransferFunction::Dci => {
            for x in samples {
                *x = srgb_oetf(*x);
            }
        }
        TransferFunction::Pq => {
            for x in samples {
                *x = pq_oetf(*x);
            }
        }
        TransferFunction::Hlg => {
            for x in samples {
                *x = hlg_oetf(*x);
            }
        }
    }
}

pub fn encoded_to_linear(samples: &mut [f32], tf: TransferFunction) {
    match tf {
        TransferFunction::Gamma(g) => apply_gamma(samples, 1e7 / g as f32),
        TransferFunction::Linear | TransferFunction::Unknown => {}
        TransferFunction::Bt709 => {
            for x in samples {
                *x = bt709_eotf(*x);
            }
        }
        TransferFunction::Srgb | TransferFunction::Dci => {
            for x in samples {
                *x = srgb_eotf(*x);
            }
        }
        TransferFunction::Pq => {
            for x in samples {
                *x = pq_eotf(*x);
            }
        }
        TransferFunction::Hlg => {
            for x in samples {
                *x = hlg_eotf(*x);
            }
        }
    }
}

fn apply_gamma(samples: &mut [f32], gamma: f32) {
    for x in samples {
        *x = if *x <= 1e-5 { 0.0 } else { x.powf(gamma) };
    }
}

#[inline]
fn srgb_oetf(x: f32) -> f32 {
    if x <= 0.003_130_8 {
        x * 12.92
    } else {
        1.055 * x.powf(1.0 / 2.4) - 0.055
    }
}

#[inline]
fn srgb_eotf(x: f32) -> f32 {
    if x <= 0.040_45 {
        x / 12.92
    } else {
        ((x + 0.055) / 1.055).powf(2.4)
    }
}

#[inline]
fn bt709_oetf(x: f32) -> f32 {
    if x < 0.018 {
        4.5 * x
    } else {
        1.099 * x.powf(0.45) - 0.099
    }
}

#[inline]
fn bt709_eotf(x: f32) -> f32 {
    if x < 0.081 {
        x / 4.5
    } else {
        ((x + 0.099) / 1.099).powf(1.0 / 0.45)
    }
}

const PQ_M1: f32 = 2610.0 / 16384.0;
const PQ_M2: f32 = 2523.0 / 4096.0 * 128.0;
const PQ_C1: f32 = 3424.0 / 4096.0;
const PQ_C2: f32 = 2413.0 / 4096.0 * 32.0;
const PQ_C3: f32 = 2392.0 / 4096.0 * 32.0;

#[inline]
fn pq_oetf(x: f32) -> f32 {
    let y = x.max(0.0);
    let ym1 = y.powf(PQ_M1);
    ((PQ_C1 + PQ_C2 * ym1) / (1.0 + PQ_C3 * ym1)).powf(PQ_M2)
}

#[inline]
fn pq_eotf(x: f32) -> f32 {
    let ym2 = x.max(0.0).powf(1.0 / PQ_M2);
    ((ym2 - PQ_C1).max(0.0) / (PQ_C2 - PQ_C3 * ym2)).powf(1.0 / PQ_M1)
}

const HLG_A: f32 = 0.178_832_77;
const HLG_B: f32 = 0.284_668_92;
const HLG_C: f32 = 0.559_910_73;

#[inline]
fn hlg_oetf(x: f32) -> f32 {
    let y = x.max(0.0);
    if y <= 1.0 / 12.0 {
        (3.0 * y).sqrt()
    } else {
        HLG_A * (12.0 * y - HLG_B).ln() + HLG_C
    }
}

#[inline]
fn hlg_eotf(x: f32) -> f32 {
    if x <= 0.5 {
        x * x / 3.0
    } else {
        ((x - HLG_C) / HLG_A).exp() / 12.0 + HLG_B / 12.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn srgb_round_trip() {
        for i in 0..=255u32 {
            let x = i as f32 / 255.0;
            let enc = srgb_oetf(x);
            let lin = srgb_eotf(enc);
            assert!((lin - x).abs() < 1e-4);
        }
    }

    #[test]
    fn pq_round_trip() {
        for &x in &[0.0, 0.01, 0.25, 0.5, 1.0] {
            let enc = pq_oetf(x);
            let lin = pq_eotf(enc);
            assert!((lin - x).abs() < 1e-3, "{x} -> {enc} -> {lin}");
        }
    }

    #[test]
    fn hlg_round_trip() {
        for &x in &[0.0, 0.02, 0.3, 0.7, 1.0] {
            let enc = hlg_oetf(x);
            let lin = hlg_eotf(enc);
            assert!((lin - x).abs() < 1e-3, "{x} -> {enc} -> {lin}");
        }
    }

    #[test]
    fn gamma_round_trip() {
        let mut s = [0.5f32];
        apply_gamma(&mut s, 2.2);
        apply_gamma(&mut s, 1.0 / 2.2);
        assert!((s[0] - 0.5).abs() < 1e-4);
    }
}
