//! Patches, splines, and noise: the independent side-channels of spec §4.8/§9, applied in a
//! fixed order on decode (patches before coefficient reconstruction; splines then noise after
//! the inverse transform).

use xlbit::{BitReader, BitWriter};
use xlimage::{AlphaMode, ImageFrame};

use crate::header::BlendMode;
use crate::Result;

/// A rectangular copy from a reference frame into the current frame.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Patch {
    pub ref_idx: u8,
    pub src_x: u32,
    pub src_y: u32,
    pub dst_x: u32,
    pub dst_y: u32,
    pub width: u32,
    pub height: u32,
    pub blend_mode: BlendMode,
}

/// A Bézier-control-point sequence rendered additively after the inverse transform.
#[derive(Debug, Clone, PartialEq)]
pub struct Spline {
    pub control_points: Vec<(f32, f32)>,
    pub color: [f32; 3],
    pub intensity: f32,
}

/// Per-frame deterministic noise-synthesis parameters.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Noise {
    pub amplitude: f32,
    pub luma_strength: f32,
    pub chroma_strength: f32,
    pub seed: u64,
}

/// The three independent side-channels carried by one frame.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SideData {
    pub patches: Vec<Patch>,
    pub splines: Vec<Spline>,
    pub noise: Option<Noise>,
}

impl SideData {
    pub fn is_empty(&self) -> bool {
        self.patches.is_empty() && self.splines.is_empty() && self.noise.is_none()
    }

    pub fn serialize(&self, w: &mut BitWriter) -> Result<()> {
        w.append_bits(self.patches.len() as u32, 16)?;
        for patch in &self.patches {
            w.append_bits(patch.ref_idx as u32, 2)?;
            w.append_bits(patch.src_x, 32)?;
            w.append_bits(patch.src_y, 32)?;
            w.append_bits(patch.dst_x, 32)?;
            w.append_bits(patch.dst_y, 32)?;
            w.append_bits(patch.width, 32)?;
            w.append_bits(patch.height, 32)?;
            w.append_bits(patch.blend_mode as u32, 3)?;
        }

        w.append_bits(self.splines.len() as u32, 16)?;
        for spline in &self.splines {
            w.append_bits(spline.control_points.len() as u32, 16)?;
            for &(x, y) in &spline.control_points {
                w.append_bits(x.to_bits(), 32)?;
                w.append_bits(y.to_bits(), 32)?;
            }
            for c in spline.color {
                w.append_bits(c.to_bits(), 32)?;
            }
            w.append_bits(spline.intensity.to_bits(), 32)?;
        }

        match self.noise {
            None => w.append_bit(false),
            Some(n) => {
                w.append_bit(true);
                w.append_bits(n.amplitude.to_bits(), 32)?;
                w.append_bits(n.luma_strength.to_bits(), 32)?;
                w.append_bits(n.chroma_strength.to_bits(), 32)?;
                w.append_bits((n.seed >> 32) as u32, 32)?;
                w.append_bits(n.seed as u32, 32)?;
            }
        }
        Ok(())
    }

    pub fn parse(r: &mut BitReader) -> Result<Self> {
        let num_patches = r.read_bits(16)?;
        let mut patches = Vec::with_capacity(num_patches as usize);
        for _ in 0..num_patches {
            patches.push(Patch {
                ref_idx: r.read_bits(2)? as u8,
                src_x: r.read_bits(32)?,
                src_y: r.read_bits(32)?,
                dst_x: r.read_bits(32)?,
                dst_y: r.read_bits(32)?,
                width: r.read_bits(32)?,
                height: r.read_bits(32)?,
                blend_mode: match r.read_bits(3)? {
                    0 => BlendMode::Replace,
                    1 => BlendMode::Add,
                    2 => BlendMode::Blend,
                    3 => BlendMode::MulAdd,
                    4 => BlendMode::Mul,
                    value => return Err(xlbit::Error::InvalidEnum { name: "BlendMode", value }.into()),
                },
            });
        }

        let num_splines = r.read_bits(16)?;
        let mut splines = Vec::with_capacity(num_splines as usize);
        for _ in 0..num_splines {
            let num_points = r.read_bits(16)?;
            let mut control_points = Vec::with_capacity(num_points as usize);
            for _ in 0..num_points {
                let x = f32::from_bits(r.read_bits(32)?);
                let y = f32::from_bits(r.read_bits(32)?);
                control_points.push((x, y));
            }
            let color = [
                f32::from_bits(r.read_bits(32)?),
                f32::from_bits(r.read_bits(32)?),
                f32::from_bits(r.read_bits(32)?),
            ];
            let intensity = f32::from_bits(r.read_bits(32)?);
            splines.push(Spline { control_points, color, intensity });
        }

        let noise = if r.read_bool()? {
            let amplitude = f32::from_bits(r.read_bits(32)?);
            let luma_strength = f32::from_bits(r.read_bits(32)?);
            let chroma_strength = f32::from_bits(r.read_bits(32)?);
            let hi = r.read_bits(32)? as u64;
            let lo = r.read_bits(32)? as u64;
            Some(Noise { amplitude, luma_strength, chroma_strength, seed: (hi << 32) | lo })
        } else {
            None
        };

        Ok(Self { patches, splines, noise })
    }
}

/// The largest value a raw sample cell of `frame` can hold, per its declared bit depth.
fn channel_max(frame: &ImageFrame) -> f32 {
    ((1u64 << frame.bit_depth().min(32)) - 1) as f32
}

/// The alpha coverage at `(x, y)`, normalized to `[0, 1]`. A frame with no alpha channel is
/// treated as fully opaque, matching the teacher's `BlendAlpha` default when a side doesn't carry
/// an alpha grid.
fn normalized_alpha(frame: &ImageFrame, x: u32, y: u32) -> f32 {
    match frame.alpha_plane() {
        Some(plane) => plane.get(x, y).map(|v| v as f32 / channel_max(frame)).unwrap_or(1.0),
        None => 1.0,
    }
}

/// Copies each patch's source rectangle from `references[patch.ref_idx]` into `dst`, over the
/// color planes only. Must run before coefficient reconstruction, per spec §9.
///
/// Alpha compositing (`Blend`/`MulAdd`) and `Mul` are grounded on the teacher's `blend_single`,
/// adapted from its normalized-float grid model to this crate's raw integer sample cells: alpha
/// is read from each frame's own alpha plane (fully opaque if it has none) and samples are
/// rescaled through `channel_max` instead of assuming an already-`[0, 1]` buffer.
pub fn apply_patches(dst: &mut ImageFrame, references: &[&ImageFrame], patches: &[Patch]) {
    for patch in patches {
        let Some(src) = references.get(patch.ref_idx as usize) else {
            tracing::warn!(ref_idx = patch.ref_idx, "patch references a missing slot, skipping");
            continue;
        };
        let max = channel_max(dst);
        let premultiplied = dst.alpha_mode() == Some(AlphaMode::Premultiplied);
        let channels = dst.color_channels().min(src.color_channels());
        for channel in 0..channels {
            for dy in 0..patch.height {
                for dx in 0..patch.width {
                    let (sx, sy) = (patch.src_x + dx, patch.src_y + dy);
                    let Some(new_sample) = src.color_plane(channel).get(sx, sy) else {
                        continue;
                    };
                    let (x, y) = (patch.dst_x + dx, patch.dst_y + dy);
                    let Some(base_sample) = dst.color_plane(channel).get(x, y) else {
                        continue;
                    };

                    let (ns, bs) = (new_sample as f32, base_sample as f32);
                    let blended = match patch.blend_mode {
                        BlendMode::Replace => new_sample,
                        BlendMode::Add => base_sample + new_sample,
                        BlendMode::Mul => (bs * ns / max).round().clamp(0.0, max) as i32,
                        BlendMode::Blend => {
                            let base_alpha = normalized_alpha(dst, x, y);
                            let new_alpha = normalized_alpha(src, sx, sy);
                            let value = if premultiplied {
                                ns + bs * (1.0 - new_alpha)
                            } else {
                                let mixed_alpha = base_alpha + new_alpha * (1.0 - base_alpha);
                                if mixed_alpha <= 0.0 {
                                    0.0
                                } else {
                                    (new_alpha * ns + base_alpha * bs * (1.0 - new_alpha)) / mixed_alpha
                                }
                            };
                            value.round().clamp(0.0, max) as i32
                        }
                        BlendMode::MulAdd => {
                            let new_alpha = normalized_alpha(src, sx, sy);
                            (bs + new_alpha * ns).round().clamp(0.0, max) as i32
                        }
                    };
                    dst.color_plane_mut(channel).set(x, y, blended);
                }
            }
        }
    }
}

/// Evaluates a quadratic-Bézier chain through `control_points` and additively blends
/// `color * intensity` onto every color plane along the curve. Samples at a fixed resolution
/// per segment; deterministic for a given control-point sequence.
pub fn render_splines(frame: &mut ImageFrame, splines: &[Spline], samples_per_segment: u32) {
    for spline in splines {
        let pts = &spline.control_points;
        if pts.len() < 2 {
            continue;
        }
        for seg in pts.windows(2) {
            let (x0, y0) = seg[0];
            let (x1, y1) = seg[1];
            for step in 0..=samples_per_segment {
                let t = step as f32 / samples_per_segment as f32;
                let x = (x0 + (x1 - x0) * t).round() as i64;
                let y = (y0 + (y1 - y0) * t).round() as i64;
                if x < 0 || y < 0 {
                    continue;
                }
                let (x, y) = (x as u32, y as u32);
                for channel in 0..frame.color_channels().min(3) {
                    let add = (spline.color[channel] * spline.intensity) as i32;
                    if let Some(current) = frame.color_plane(channel).get(x, y) {
                        frame.color_plane_mut(channel).set(x, y, current + add);
                    }
                }
            }
        }
    }
}

/// Adds deterministic pseudo-random texture to luma (plane 0) and chroma (planes 1/2, if
/// present), scaled by `noise.amplitude` and the per-component strength.
pub fn apply_noise(frame: &mut ImageFrame, noise: &Noise) {
    let mut state = noise.seed ^ 0x9E3779B97F4A7C15;
    let width = frame.width();
    let height = frame.height();
    for y in 0..height {
        for x in 0..width {
            state = split_mix_64(state);
            let unit = ((state >> 40) as f32) / (1u64 << 24) as f32 - 0.5;
            for (channel, strength) in [
                (0usize, noise.luma_strength),
                (1, noise.chroma_strength),
                (2, noise.chroma_strength),
            ] {
                if channel >= frame.color_channels() {
                    continue;
                }
                let delta = (unit * strength * noise.amplitude * 255.0) as i32;
                if let Some(current) = frame.color_plane(channel).get(x, y) {
                    frame.color_plane_mut(channel).set(x, y, current + delta);
                }
            }
        }
    }
}

fn split_mix_64(z: u64) -> u64 {
    let z = (z ^ (z >> 30)).wrapping_mul(0xBF58476D1CE4E5B9);
    let z = (z ^ (z >> 27)).wrapping_mul(0x94D049BB133111EB);
    z ^ (z >> 31)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_side_data_round_trips() {
        let mut w = BitWriter::new();
        SideData::default().serialize(&mut w).unwrap();
        let bytes = w.finish();
        let mut r = BitReader::new(&bytes);
        let parsed = SideData::parse(&mut r).unwrap();
        assert!(parsed.is_empty());
    }

    #[test]
    fn full_side_data_round_trips() {
        let side_data = SideData {
            patches: vec![Patch {
                ref_idx: 1,
                src_x: 0,
                src_y: 0,
                dst_x: 4,
                dst_y: 4,
                width: 8,
                height: 8,
                blend_mode: BlendMode::Add,
            }],
            splines: vec![Spline {
                control_points: vec![(0.0, 0.0), (10.0, 10.0), (20.0, 0.0)],
                color: [1.0, 0.5, 0.25],
                intensity: 0.8,
            }],
            noise: Some(Noise {
                amplitude: 0.1,
                luma_strength: 0.5,
                chroma_strength: 0.2,
                seed: 0xDEAD_BEEF_CAFE_F00D,
            }),
        };

        let mut w = BitWriter::new();
        side_data.serialize(&mut w).unwrap();
        let bytes = w.finish();
        let mut r = BitReader::new(&bytes);
        let parsed = SideData::parse(&mut r).unwrap();
        assert_eq!(parsed, side_data);
    }

    #[test]
    fn patch_copies_rectangle_with_replace_blend() {
        let mut src = ImageFrame::new(8, 8, 3, xlimage::PixelType::U8, 8, xlcolor::ColorEncoding::default()).unwrap();
        src.color_plane_mut(0).set(2, 2, 200);
        let mut dst = ImageFrame::new(8, 8, 3, xlimage::PixelType::U8, 8, xlcolor::ColorEncoding::default()).unwrap();

        let patch = Patch {
            ref_idx: 0,
            src_x: 2,
            src_y: 2,
            dst_x: 0,
            dst_y: 0,
            width: 1,
            height: 1,
            blend_mode: BlendMode::Replace,
        };
        apply_patches(&mut dst, &[&src], std::slice::from_ref(&patch));
        assert_eq!(dst.color_plane(0).get(0, 0), Some(200));
    }

    #[test]
    fn patch_multiplies_samples_with_mul_blend() {
        let mut src = ImageFrame::new(4, 4, 3, xlimage::PixelType::U8, 8, xlcolor::ColorEncoding::default()).unwrap();
        src.color_plane_mut(0).set(0, 0, 128);
        let mut dst = ImageFrame::new(4, 4, 3, xlimage::PixelType::U8, 8, xlcolor::ColorEncoding::default()).unwrap();
        dst.color_plane_mut(0).set(0, 0, 255);

        let patch = Patch {
            ref_idx: 0,
            src_x: 0,
            src_y: 0,
            dst_x: 0,
            dst_y: 0,
            width: 1,
            height: 1,
            blend_mode: BlendMode::Mul,
        };
        apply_patches(&mut dst, &[&src], std::slice::from_ref(&patch));
        // 255 * 128 / 255 rounds back to 128: multiplying by full-scale is a no-op.
        assert_eq!(dst.color_plane(0).get(0, 0), Some(128));
    }

    #[test]
    fn patch_blend_without_alpha_channels_treats_both_sides_as_opaque() {
        // With no alpha plane on either frame, `Blend` degenerates to `mixed_alpha == 1.0`,
        // which is exactly `Replace`.
        let mut src = ImageFrame::new(4, 4, 3, xlimage::PixelType::U8, 8, xlcolor::ColorEncoding::default()).unwrap();
        src.color_plane_mut(0).set(0, 0, 90);
        let mut dst = ImageFrame::new(4, 4, 3, xlimage::PixelType::U8, 8, xlcolor::ColorEncoding::default()).unwrap();
        dst.color_plane_mut(0).set(0, 0, 10);

        let patch = Patch {
            ref_idx: 0,
            src_x: 0,
            src_y: 0,
            dst_x: 0,
            dst_y: 0,
            width: 1,
            height: 1,
            blend_mode: BlendMode::Blend,
        };
        apply_patches(&mut dst, &[&src], std::slice::from_ref(&patch));
        assert_eq!(dst.color_plane(0).get(0, 0), Some(90));
    }

    #[test]
    fn patch_mul_add_scales_the_new_sample_by_its_alpha_before_adding() {
        let mut src =
            ImageFrame::new(4, 4, 3, xlimage::PixelType::U8, 8, xlcolor::ColorEncoding::default()).unwrap().with_alpha(AlphaMode::Straight);
        src.color_plane_mut(0).set(0, 0, 200);
        src.alpha_plane_mut().unwrap().set(0, 0, 128);
        let mut dst = ImageFrame::new(4, 4, 3, xlimage::PixelType::U8, 8, xlcolor::ColorEncoding::default()).unwrap();
        dst.color_plane_mut(0).set(0, 0, 10);

        let patch = Patch {
            ref_idx: 0,
            src_x: 0,
            src_y: 0,
            dst_x: 0,
            dst_y: 0,
            width: 1,
            height: 1,
            blend_mode: BlendMode::MulAdd,
        };
        apply_patches(&mut dst, &[&src], std::slice::from_ref(&patch));
        // new_alpha = 128/255 ~= 0.502; 10 + 0.502 * 200 ~= 110.4 -> rounds to 110.
        assert_eq!(dst.color_plane(0).get(0, 0), Some(110));
    }

    #[test]
    fn noise_is_deterministic_for_the_same_seed() {
        let mut a = ImageFrame::new(4, 4, 3, xlimage::PixelType::U8, 8, xlcolor::ColorEncoding::default()).unwrap();
        let mut b = a.clone();
        let noise = Noise { amplitude: 0.2, luma_strength: 1.0, chroma_strength: 0.5, seed: 7 };
        apply_noise(&mut a, &noise);
        apply_noise(&mut b, &noise);
        for y in 0..4 {
            for x in 0..4 {
                assert_eq!(a.color_plane(0).get(x, y), b.color_plane(0).get(x, y));
            }
        }
    }
}
