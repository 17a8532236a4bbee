//! Modular coding path: per-channel neighbor prediction plus residual entropy coding, used for
//! lossless images and for lossless extra channels carried alongside a VarDCT frame.

mod error;
pub mod predictor;
pub mod quant;

pub use error::{Error, Result};
pub use predictor::{Predictor, NUM_PREDICTORS};

use xlbit::{BitReader, BitWriter};
use xlcoding::{Decoder, Encoder, Mode};

/// Per-channel shape and lossiness; dimensions are supplied by the frame driver rather than
/// carried in the Modular stream itself.
#[derive(Debug, Clone, Copy)]
pub struct ChannelConfig {
    pub width: u32,
    pub height: u32,
    /// `1` is lossless; larger values widen the near-lossless quantization step.
    pub near_lossless_step: u32,
}

/// Predicts the sample at `(x, y)` from its already-reconstructed west/north/north-west
/// neighbors, replicating across the image edges the way JPEG-LS-style predictors do.
fn predict_at(recon: &[i32], width: u32, x: u32, y: u32, predictor: Predictor) -> i32 {
    let at = |xx: u32, yy: u32| recon[(yy * width + xx) as usize];
    let w = if x > 0 {
        at(x - 1, y)
    } else if y > 0 {
        at(x, y - 1)
    } else {
        0
    };
    let n = if y > 0 { at(x, y - 1) } else { w };
    let nw = if x > 0 && y > 0 { at(x - 1, y - 1) } else { n };
    predictor.predict(w, n, nw)
}

/// Runs the closed-loop forward transform: predicts each sample from reconstructed neighbors,
/// quantizes the residual, and reconstructs from the quantized value so the decoder's neighbor
/// state matches exactly.
pub fn forward_channel(samples: &[i32], width: u32, height: u32, predictor: Predictor, near_lossless_step: u32) -> Vec<i32> {
    let mut recon = vec![0i32; samples.len()];
    let mut residuals = Vec::with_capacity(samples.len());
    for y in 0..height {
        for x in 0..width {
            let idx = (y * width + x) as usize;
            let pred = predict_at(&recon, width, x, y, predictor);
            let residual = samples[idx] - pred;
            let q = quant::quantize(residual, near_lossless_step);
            residuals.push(q);
            recon[idx] = pred + quant::dequantize(q, near_lossless_step);
        }
    }
    residuals
}

pub fn inverse_channel(residuals: &[i32], width: u32, height: u32, predictor: Predictor, near_lossless_step: u32) -> Vec<i32> {
    let mut recon = vec![0i32; residuals.len()];
    for y in 0..height {
        for x in 0..width {
            let idx = (y * width + x) as usize;
            let pred = predict_at(&recon, width, x, y, predictor);
            recon[idx] = pred + quant::dequantize(residuals[idx], near_lossless_step);
        }
    }
    recon
}

/// Picks the predictor with the smallest total lossless residual magnitude over the channel.
pub fn choose_predictor(samples: &[i32], width: u32, height: u32) -> Predictor {
    Predictor::all()
        .into_iter()
        .min_by_key(|&p| {
            forward_channel(samples, width, height, p, 1)
                .iter()
                .map(|&r| r.unsigned_abs() as u64)
                .sum::<u64>()
        })
        .expect("Predictor::all() is non-empty")
}

/// Encodes a set of raster-order channels. Context `i * NUM_PREDICTORS + predictor.index()`
/// keeps each channel's residual histogram, and each predictor's within it, separate.
pub fn encode(channels: &[(ChannelConfig, Vec<i32>)]) -> Result<Vec<u8>> {
    let num_channels = channels.len();
    let mut header = BitWriter::new();
    let mut predictors = Vec::with_capacity(num_channels);
    for (cfg, samples) in channels {
        if samples.len() != (cfg.width * cfg.height) as usize {
            return Err(Error::DimensionMismatch);
        }
        let predictor = choose_predictor(samples, cfg.width, cfg.height);
        predictors.push(predictor);
        header.append_bits(predictor.index() as u32, 3)?;
    }
    let header_bytes = header.finish();

    let mut enc = Encoder::new(Mode::Ans, num_channels * NUM_PREDICTORS);
    for (i, (cfg, samples)) in channels.iter().enumerate() {
        let predictor = predictors[i];
        let residuals = forward_channel(samples, cfg.width, cfg.height, predictor, cfg.near_lossless_step.max(1));
        let context = i * NUM_PREDICTORS + predictor.index() as usize;
        enc.push_block(context, &residuals)?;
    }
    let payload = enc.finish()?;

    let mut out = Vec::with_capacity(4 + header_bytes.len() + payload.len());
    out.extend_from_slice(&(header_bytes.len() as u32).to_le_bytes());
    out.extend_from_slice(&header_bytes);
    out.extend_from_slice(&payload);
    Ok(out)
}

pub fn decode(bytes: &[u8], configs: &[ChannelConfig]) -> Result<Vec<Vec<i32>>> {
    let num_channels = configs.len();
    if bytes.len() < 4 {
        return Err(Error::DimensionMismatch);
    }
    let header_len = u32::from_le_bytes(bytes[0..4].try_into().unwrap()) as usize;
    let header_bytes = &bytes[4..4 + header_len];
    let payload = &bytes[4 + header_len..];

    let mut header_reader = BitReader::new(header_bytes);
    let mut predictors = Vec::with_capacity(num_channels);
    for _ in 0..num_channels {
        let idx = header_reader.read_bits(3)? as u8;
        predictors.push(Predictor::from_index(idx).ok_or(Error::InvalidPredictor(idx))?);
    }

    let mut dec = Decoder::new(payload, num_channels * NUM_PREDICTORS)?;
    let mut out = Vec::with_capacity(num_channels);
    for (i, cfg) in configs.iter().enumerate() {
        let predictor = predictors[i];
        let context = i * NUM_PREDICTORS + predictor.index() as usize;
        let len = (cfg.width * cfg.height) as usize;
        let residuals = dec.read_block(context, len)?;
        out.push(inverse_channel(&residuals, cfg.width, cfg.height, predictor, cfg.near_lossless_step.max(1)));
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gradient_round_trips_a_gradient_image() {
        let (width, height) = (9u32, 6u32);
        let samples: Vec<i32> = (0..width * height).map(|i| (i % 23) as i32 - 11).collect();
        let residuals = forward_channel(&samples, width, height, Predictor::Gradient, 1);
        let recon = inverse_channel(&residuals, width, height, Predictor::Gradient, 1);
        assert_eq!(recon, samples);
    }

    #[test]
    fn near_lossless_reconstruction_stays_within_half_step() {
        let (width, height) = (8u32, 8u32);
        let samples: Vec<i32> = (0..width * height).map(|i| (i as i32 * 7) % 50 - 25).collect();
        let step = 4u32;
        let residuals = forward_channel(&samples, width, height, Predictor::Gradient, step);
        let recon = inverse_channel(&residuals, width, height, Predictor::Gradient, step);
        for (orig, rec) in samples.iter().zip(&recon) {
            assert!((orig - rec).abs() <= step as i32, "{orig} vs {rec}");
        }
    }

    #[test]
    fn encode_decode_round_trips_multiple_channels() {
        let (width, height) = (6u32, 5u32);
        let luma: Vec<i32> = (0..width * height).map(|i| (i % 17) as i32).collect();
        let chroma: Vec<i32> = (0..width * height).map(|i| ((i * 3) % 9) as i32 - 4).collect();

        let cfg = ChannelConfig {
            width,
            height,
            near_lossless_step: 1,
        };
        let bytes = encode(&[(cfg, luma.clone()), (cfg, chroma.clone())]).unwrap();
        let decoded = decode(&bytes, &[cfg, cfg]).unwrap();
        assert_eq!(decoded[0], luma);
        assert_eq!(decoded[1], chroma);
    }

    #[test]
    fn rejects_mismatched_channel_length() {
        let cfg = ChannelConfig {
            width: 4,
            height: 4,
            near_lossless_step: 1,
        };
        let samples = vec![0i32; 10];
        assert!(matches!(encode(&[(cfg, samples)]), Err(Error::DimensionMismatch)));
    }
}
