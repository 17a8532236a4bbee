//! VarDCT coding path: 8x8 block DCT, chroma-from-luma prediction, distance-scaled
//! quantization, and progressive DC/low-AC/high-AC passes over entropy-coded coefficients.

mod cfl;
mod dct;
mod dequant;
mod error;
mod pass;
mod zigzag;

pub use dct::DctDirection;
pub use dequant::distance_from_quality;
pub use error::{Error, Result};
pub use pass::Pass;
pub use zigzag::BLOCK_LEN;

use xlcoding::{Band, ContextModel, Decoder, Encoder, Mode};

pub const BLOCK: u32 = dct::N as u32;
const NUM_CHANNELS: usize = 3;

fn pad_dim(n: u32) -> u32 {
    n.div_ceil(BLOCK) * BLOCK
}

/// Edge-replicates `samples` up to a multiple of 8 on each axis.
fn pad_plane(samples: &[f32], width: u32, height: u32) -> (Vec<f32>, u32, u32) {
    let (pw, ph) = (pad_dim(width), pad_dim(height));
    let mut out = vec![0f32; (pw * ph) as usize];
    for y in 0..ph {
        let sy = y.min(height - 1);
        for x in 0..pw {
            let sx = x.min(width - 1);
            out[(y * pw + x) as usize] = samples[(sy * width + sx) as usize];
        }
    }
    (out, pw, ph)
}

/// Crops a padded plane back down to the declared image size.
fn crop_plane(padded: &[f32], padded_width: u32, width: u32, height: u32) -> Vec<f32> {
    let mut out = Vec::with_capacity((width * height) as usize);
    for y in 0..height {
        out.extend_from_slice(&padded[(y * padded_width) as usize..(y * padded_width + width) as usize]);
    }
    out
}

fn extract_block(padded: &[f32], padded_width: u32, bx: u32, by: u32) -> [f32; BLOCK_LEN] {
    let mut block = [0f32; BLOCK_LEN];
    for row in 0..BLOCK {
        let src_start = ((by * BLOCK + row) * padded_width + bx * BLOCK) as usize;
        block[(row * BLOCK) as usize..(row * BLOCK + BLOCK) as usize]
            .copy_from_slice(&padded[src_start..src_start + BLOCK as usize]);
    }
    block
}

fn write_block(padded: &mut [f32], padded_width: u32, bx: u32, by: u32, block: &[f32; BLOCK_LEN]) {
    for row in 0..BLOCK {
        let dst_start = ((by * BLOCK + row) * padded_width + bx * BLOCK) as usize;
        padded[dst_start..dst_start + BLOCK as usize]
            .copy_from_slice(&block[(row * BLOCK) as usize..(row * BLOCK + BLOCK) as usize]);
    }
}

/// Forward DCT-II plus zigzag reordering of one 8x8 spatial block.
pub fn block_forward(samples: &[f32; BLOCK_LEN]) -> [f32; BLOCK_LEN] {
    let mut block = *samples;
    dct::dct_2d(&mut block, DctDirection::Forward);
    zigzag::to_zigzag(&block)
}

/// Inverse of [`block_forward`]: zigzag un-reordering plus DCT-III.
pub fn block_inverse(zigzag_coeffs: &[f32; BLOCK_LEN]) -> [f32; BLOCK_LEN] {
    let mut block = zigzag::from_zigzag(zigzag_coeffs);
    dct::dct_2d(&mut block, DctDirection::Inverse);
    block
}

/// Shape and lossiness shared by all three channels of a VarDCT frame. Dimensions come from the
/// frame header; the Modular path carries any extra channels separately.
#[derive(Debug, Clone, Copy)]
pub struct VarDctConfig {
    pub width: u32,
    pub height: u32,
    pub distance: f32,
}

impl VarDctConfig {
    fn blocks(&self) -> (u32, u32) {
        (pad_dim(self.width) / BLOCK, pad_dim(self.height) / BLOCK)
    }
}

fn band_of(pass: Pass) -> Band {
    match pass {
        Pass::Dc => Band::Dc,
        Pass::LowFreqAc => Band::AcLow,
        Pass::HighFreqAc => Band::AcHigh,
    }
}

/// Encodes Y/Cb/Cr planes (in that order, each `width * height` samples) into a progressive,
/// pass-separated coefficient stream. Chroma-from-luma is fit against the *reconstructed*
/// (quantized then dequantized) luma block, so the decoder's closed-loop state matches exactly.
pub fn encode_frame(planes: &[Vec<f32>; NUM_CHANNELS], cfg: &VarDctConfig) -> Result<Vec<u8>> {
    for plane in planes {
        if plane.len() != (cfg.width * cfg.height) as usize {
            return Err(Error::DimensionMismatch);
        }
    }
    let (blocks_x, blocks_y) = cfg.blocks();
    let num_blocks = (blocks_x * blocks_y) as usize;

    let padded: Vec<(Vec<f32>, u32, u32)> = planes.iter().map(|p| pad_plane(p, cfg.width, cfg.height)).collect();
    let padded_width = padded[0].1;

    let mut zz: [Vec<[f32; BLOCK_LEN]>; NUM_CHANNELS] = std::array::from_fn(|_| Vec::with_capacity(num_blocks));
    for by in 0..blocks_y {
        for bx in 0..blocks_x {
            for (c, (plane, _, _)) in padded.iter().enumerate() {
                zz[c].push(block_forward(&extract_block(plane, padded_width, bx, by)));
            }
        }
    }

    let mut quantized: [Vec<[i32; BLOCK_LEN]>; NUM_CHANNELS] = std::array::from_fn(|_| Vec::with_capacity(num_blocks));
    quantized[0] = zz[0].iter().map(|b| dequant::quantize_block(b, 0, cfg.distance)).collect();
    let recon_luma: Vec<[f32; BLOCK_LEN]> = quantized[0].iter().map(|q| dequant::dequantize_block(q, 0, cfg.distance)).collect();

    let mut slopes = [Vec::with_capacity(num_blocks), Vec::with_capacity(num_blocks)];
    for (ci, channel) in [1usize, 2].into_iter().enumerate() {
        for (luma, chroma) in recon_luma.iter().zip(&zz[channel]) {
            let slope = cfl::fit_slope(luma, chroma);
            let residual = cfl::apply(luma, chroma, slope);
            quantized[channel].push(dequant::quantize_block(&residual, channel, cfg.distance));
            slopes[ci].push(slope);
        }
    }

    let mut slope_bytes = Vec::with_capacity(num_blocks * 8);
    for slope_list in &slopes {
        for &s in slope_list {
            slope_bytes.extend_from_slice(&s.to_le_bytes());
        }
    }

    let model = ContextModel::new(NUM_CHANNELS);
    let mut enc = Encoder::new(Mode::Ans, model.num_contexts());
    for pass in Pass::ORDER {
        let range = pass.range();
        for (channel, blocks) in quantized.iter().enumerate() {
            let context = model.context_of(channel, band_of(pass));
            for block in blocks {
                enc.push_block(context, &block[range.clone()])?;
            }
        }
    }
    let payload = enc.finish()?;

    let mut out = Vec::with_capacity(slope_bytes.len() + payload.len());
    out.extend_from_slice(&slope_bytes);
    out.extend_from_slice(&payload);
    Ok(out)
}

/// Decodes a stream written by [`encode_frame`] back into Y/Cb/Cr planes, cropped to
/// `cfg.width x cfg.height`.
pub fn decode_frame(bytes: &[u8], cfg: &VarDctConfig) -> Result<[Vec<f32>; NUM_CHANNELS]> {
    let (blocks_x, blocks_y) = cfg.blocks();
    let num_blocks = (blocks_x * blocks_y) as usize;

    let slope_len = num_blocks * 2 * 4;
    if bytes.len() < slope_len {
        return Err(Error::DimensionMismatch);
    }
    let mut slopes = [vec![0f32; num_blocks], vec![0f32; num_blocks]];
    for (ci, slope_list) in slopes.iter_mut().enumerate() {
        for (i, s) in slope_list.iter_mut().enumerate() {
            let off = (ci * num_blocks + i) * 4;
            *s = f32::from_le_bytes(bytes[off..off + 4].try_into().unwrap());
        }
    }
    let payload = &bytes[slope_len..];

    let model = ContextModel::new(NUM_CHANNELS);
    let mut dec = Decoder::new(payload, model.num_contexts())?;
    let mut quantized: [Vec<[i32; BLOCK_LEN]>; NUM_CHANNELS] = std::array::from_fn(|_| vec![[0i32; BLOCK_LEN]; num_blocks]);
    for pass in Pass::ORDER {
        let range = pass.range();
        for channel in 0..NUM_CHANNELS {
            let context = model.context_of(channel, band_of(pass));
            for block in quantized[channel].iter_mut() {
                let values = dec.read_block(context, range.len())?;
                block[range.clone()].copy_from_slice(&values);
            }
        }
    }

    Ok(reconstruct_from_quantized(&quantized, &slopes, cfg))
}

/// Reconstructs spatial planes from already-dequantized zigzag coefficients and CfL slopes.
/// Shared tail of [`decode_frame`] and [`decode_frame_progressive`].
fn reconstruct_from_quantized(
    quantized: &[Vec<[i32; BLOCK_LEN]>; NUM_CHANNELS],
    slopes: &[Vec<f32>; 2],
    cfg: &VarDctConfig,
) -> [Vec<f32>; NUM_CHANNELS] {
    let (blocks_x, blocks_y) = cfg.blocks();
    let num_blocks = (blocks_x * blocks_y) as usize;
    let padded_width = blocks_x * BLOCK;
    let padded_height = blocks_y * BLOCK;

    let recon_luma: Vec<[f32; BLOCK_LEN]> = quantized[0].iter().map(|q| dequant::dequantize_block(q, 0, cfg.distance)).collect();
    let mut zz: [Vec<[f32; BLOCK_LEN]>; NUM_CHANNELS] = std::array::from_fn(|_| Vec::with_capacity(num_blocks));
    zz[0] = recon_luma.clone();
    for (ci, channel) in [1usize, 2].into_iter().enumerate() {
        for (i, luma) in recon_luma.iter().enumerate() {
            let residual = dequant::dequantize_block(&quantized[channel][i], channel, cfg.distance);
            zz[channel].push(cfl::undo(luma, &residual, slopes[ci][i]));
        }
    }

    let mut padded = [
        vec![0f32; (padded_width * padded_height) as usize],
        vec![0f32; (padded_width * padded_height) as usize],
        vec![0f32; (padded_width * padded_height) as usize],
    ];
    let mut idx = 0usize;
    for by in 0..blocks_y {
        for bx in 0..blocks_x {
            for channel in 0..NUM_CHANNELS {
                let spatial = block_inverse(&zz[channel][idx]);
                write_block(&mut padded[channel], padded_width, bx, by, &spatial);
            }
            idx += 1;
        }
    }

    std::array::from_fn(|c| crop_plane(&padded[c], padded_width, cfg.width, cfg.height))
}

/// Encodes Y/Cb/Cr planes as three independent, self-contained sections (one per [`Pass`]),
/// so that a decoder given only a prefix of the returned list can still reconstruct a
/// (lower-fidelity) image. The DC section additionally carries the CfL slopes, since those are
/// needed to reconstruct chroma regardless of which AC passes are present.
pub fn encode_frame_progressive(planes: &[Vec<f32>; NUM_CHANNELS], cfg: &VarDctConfig) -> Result<Vec<Vec<u8>>> {
    for plane in planes {
        if plane.len() != (cfg.width * cfg.height) as usize {
            return Err(Error::DimensionMismatch);
        }
    }
    let (blocks_x, blocks_y) = cfg.blocks();
    let num_blocks = (blocks_x * blocks_y) as usize;

    let padded: Vec<(Vec<f32>, u32, u32)> = planes.iter().map(|p| pad_plane(p, cfg.width, cfg.height)).collect();
    let padded_width = padded[0].1;

    let mut zz: [Vec<[f32; BLOCK_LEN]>; NUM_CHANNELS] = std::array::from_fn(|_| Vec::with_capacity(num_blocks));
    for by in 0..blocks_y {
        for bx in 0..blocks_x {
            for (c, (plane, _, _)) in padded.iter().enumerate() {
                zz[c].push(block_forward(&extract_block(plane, padded_width, bx, by)));
            }
        }
    }

    let mut quantized: [Vec<[i32; BLOCK_LEN]>; NUM_CHANNELS] = std::array::from_fn(|_| Vec::with_capacity(num_blocks));
    quantized[0] = zz[0].iter().map(|b| dequant::quantize_block(b, 0, cfg.distance)).collect();
    let recon_luma: Vec<[f32; BLOCK_LEN]> = quantized[0].iter().map(|q| dequant::dequantize_block(q, 0, cfg.distance)).collect();

    let mut slope_bytes = Vec::with_capacity(num_blocks * 2 * 4);
    for channel in [1usize, 2] {
        for (luma, chroma) in recon_luma.iter().zip(&zz[channel]) {
            let slope = cfl::fit_slope(luma, chroma);
            let residual = cfl::apply(luma, chroma, slope);
            quantized[channel].push(dequant::quantize_block(&residual, channel, cfg.distance));
            slope_bytes.extend_from_slice(&slope.to_le_bytes());
        }
    }

    let model = ContextModel::new(NUM_CHANNELS);
    let mut sections = Vec::with_capacity(Pass::ORDER.len());
    for pass in Pass::ORDER {
        let range = pass.range();
        let mut enc = Encoder::new(Mode::Ans, model.num_contexts());
        for (channel, blocks) in quantized.iter().enumerate() {
            let context = model.context_of(channel, band_of(pass));
            for block in blocks {
                enc.push_block(context, &block[range.clone()])?;
            }
        }
        let payload = enc.finish()?;
        let mut section = Vec::with_capacity(if pass == Pass::Dc { slope_bytes.len() } else { 0 } + payload.len());
        if pass == Pass::Dc {
            section.extend_from_slice(&slope_bytes);
        }
        section.extend_from_slice(&payload);
        sections.push(section);
    }
    Ok(sections)
}

/// Decodes a prefix of the sections written by [`encode_frame_progressive`]. Coefficients in
/// passes beyond `sections.len()` are treated as zero, producing a lower-fidelity reconstruction
/// at the same pixel dimensions.
pub fn decode_frame_progressive(sections: &[Vec<u8>], cfg: &VarDctConfig) -> Result<[Vec<f32>; NUM_CHANNELS]> {
    if sections.is_empty() {
        return Err(Error::DimensionMismatch);
    }
    let (blocks_x, blocks_y) = cfg.blocks();
    let num_blocks = (blocks_x * blocks_y) as usize;
    let slope_len = num_blocks * 2 * 4;

    let dc_section = &sections[0];
    if dc_section.len() < slope_len {
        return Err(Error::DimensionMismatch);
    }
    let mut slopes = [vec![0f32; num_blocks], vec![0f32; num_blocks]];
    for (ci, slope_list) in slopes.iter_mut().enumerate() {
        for (i, s) in slope_list.iter_mut().enumerate() {
            let off = (ci * num_blocks + i) * 4;
            *s = f32::from_le_bytes(dc_section[off..off + 4].try_into().unwrap());
        }
    }

    let model = ContextModel::new(NUM_CHANNELS);
    let mut quantized: [Vec<[i32; BLOCK_LEN]>; NUM_CHANNELS] = std::array::from_fn(|_| vec![[0i32; BLOCK_LEN]; num_blocks]);
    for (pass, section) in Pass::ORDER.into_iter().zip(sections.iter()) {
        let payload = if pass == Pass::Dc { &section[slope_len..] } else { &section[..] };
        let mut dec = Decoder::new(payload, model.num_contexts())?;
        let range = pass.range();
        for channel in 0..NUM_CHANNELS {
            let context = model.context_of(channel, band_of(pass));
            for block in quantized[channel].iter_mut() {
                let values = dec.read_block(context, range.len())?;
                block[range.clone()].copy_from_slice(&values);
            }
        }
    }

    Ok(reconstruct_from_quantized(&quantized, &slopes, cfg))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gradient_plane(width: u32, height: u32, scale: f32, offset: f32) -> Vec<f32> {
        (0..width * height).map(|i| (i as f32) * scale + offset).collect()
    }

    #[test]
    fn block_dct_round_trip_is_close() {
        let mut samples = [0f32; BLOCK_LEN];
        for (i, v) in samples.iter_mut().enumerate() {
            *v = (i as f32 - 32.0) * 3.0;
        }
        let zigzag = block_forward(&samples);
        let restored = block_inverse(&zigzag);
        for (a, b) in samples.iter().zip(&restored) {
            assert!((a - b).abs() < 1e-2, "{a} vs {b}");
        }
    }

    #[test]
    fn encode_decode_round_trip_is_close_at_high_quality() {
        let (width, height) = (16u32, 8u32);
        let y = gradient_plane(width, height, 0.7, 20.0);
        let cb = gradient_plane(width, height, -0.2, 0.0);
        let cr = gradient_plane(width, height, 0.1, -5.0);
        let cfg = VarDctConfig {
            width,
            height,
            distance: distance_from_quality(95),
        };

        let bytes = encode_frame(&[y.clone(), cb.clone(), cr.clone()], &cfg).unwrap();
        let [ry, rcb, rcr] = decode_frame(&bytes, &cfg).unwrap();
        assert_eq!(ry.len(), (width * height) as usize);

        let mse = |a: &[f32], b: &[f32]| -> f32 { a.iter().zip(b).map(|(x, y)| (x - y).powi(2)).sum::<f32>() / a.len() as f32 };
        assert!(mse(&y, &ry) < 25.0, "luma mse too high: {}", mse(&y, &ry));
        assert!(mse(&cb, &rcb) < 25.0);
        assert!(mse(&cr, &rcr) < 25.0);
    }

    #[test]
    fn rejects_mismatched_plane_length() {
        let cfg = VarDctConfig {
            width: 8,
            height: 8,
            distance: 1.0,
        };
        let bad = vec![0f32; 10];
        let good = vec![0f32; 64];
        assert!(matches!(
            encode_frame(&[bad, good.clone(), good], &cfg),
            Err(Error::DimensionMismatch)
        ));
    }

    #[test]
    fn progressive_full_prefix_matches_single_shot_decode() {
        let (width, height) = (16u32, 8u32);
        let y = gradient_plane(width, height, 0.7, 20.0);
        let cb = gradient_plane(width, height, -0.2, 0.0);
        let cr = gradient_plane(width, height, 0.1, -5.0);
        let cfg = VarDctConfig { width, height, distance: distance_from_quality(95) };

        let sections = encode_frame_progressive(&[y.clone(), cb.clone(), cr.clone()], &cfg).unwrap();
        assert_eq!(sections.len(), 3);
        let [ry, rcb, rcr] = decode_frame_progressive(&sections, &cfg).unwrap();

        let bytes = encode_frame(&[y, cb, cr], &cfg).unwrap();
        let [fy, fcb, fcr] = decode_frame(&bytes, &cfg).unwrap();
        assert_eq!(ry, fy);
        assert_eq!(rcb, fcb);
        assert_eq!(rcr, fcr);
    }

    #[test]
    fn dc_only_prefix_yields_a_lower_fidelity_but_decodable_preview() {
        let (width, height) = (16u32, 8u32);
        let y = gradient_plane(width, height, 0.7, 20.0);
        let cb = gradient_plane(width, height, -0.2, 0.0);
        let cr = gradient_plane(width, height, 0.1, -5.0);
        let cfg = VarDctConfig { width, height, distance: distance_from_quality(95) };

        let sections = encode_frame_progressive(&[y.clone(), cb.clone(), cr.clone()], &cfg).unwrap();
        let preview = decode_frame_progressive(&sections[..1], &cfg).unwrap();
        assert_eq!(preview[0].len(), (width * height) as usize);

        let full = decode_frame_progressive(&sections, &cfg).unwrap();
        let mse = |a: &[f32], b: &[f32]| -> f32 { a.iter().zip(b).map(|(x, y)| (x - y).powi(2)).sum::<f32>() / a.len() as f32 };
        assert!(mse(&preview[0], &full[0]) >= 0.0);
    }
}
