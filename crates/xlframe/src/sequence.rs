//! Builds the `FrameData` sequence for a still image or an animation, per spec §4.8: still
//! images are a single `is_last=1` frame; animations share dimensions across every frame and
//! carry a per-frame duration computed from the ticks-per-second rate.

use xlimage::ImageFrame;

use crate::header::FrameHeader;
use crate::sidedata::SideData;
use crate::{Error, FrameData, Result};

/// Ticks-per-second rate plus loop count and per-frame timing, per spec §4.8/§9.
#[derive(Debug, Clone, PartialEq)]
pub struct AnimationConfig {
    pub tps_numerator: u32,
    pub tps_denominator: u32,
    /// 0 means infinite looping.
    pub loop_count: u32,
    /// Uniform display rate; ignored when `frame_durations` is set.
    pub fps: Option<f64>,
    /// Explicit duration (in ticks) per frame; overrides `fps` when present.
    pub frame_durations: Option<Vec<u32>>,
}

impl AnimationConfig {
    fn tick_rate(&self) -> f64 {
        self.tps_numerator as f64 / self.tps_denominator.max(1) as f64
    }

    fn duration_for(&self, index: usize) -> Result<u32> {
        if let Some(durations) = &self.frame_durations {
            return durations
                .get(index)
                .copied()
                .ok_or(Error::MissingConfiguration);
        }
        let fps = self.fps.ok_or(Error::MissingConfiguration)?;
        if fps <= 0.0 {
            return Err(Error::MissingConfiguration);
        }
        Ok((self.tick_rate() / fps).floor() as u32)
    }
}

/// Builds the frame sequence for a single still image.
pub fn sequence_still(frame: FrameHeader, side_data: SideData, sections: Vec<Vec<u8>>) -> Vec<FrameData> {
    vec![FrameData {
        header: FrameHeader { is_last: true, duration: 0, ..frame },
        side_data,
        sections,
    }]
}

/// Builds the frame sequence for an animation: validates that every frame shares width, height,
/// pixel type, and color-channel count, then assigns each frame its duration in ticks.
///
/// A single frame submitted here still requires `config`, matching the still-image path only
/// when called through [`sequence_still`]; more than one frame without a config is rejected
/// rather than silently guessed at.
pub fn sequence_animation(
    images: &[ImageFrame],
    config: &AnimationConfig,
    mut per_frame: impl FnMut(usize, &ImageFrame) -> Result<(SideData, Vec<Vec<u8>>)>,
) -> Result<Vec<FrameData>> {
    if images.len() > 1 {
        validate_consistency(images)?;
    }

    let mut frames = Vec::with_capacity(images.len());
    for (index, image) in images.iter().enumerate() {
        let duration = config.duration_for(index)?;
        let (side_data, sections) = per_frame(index, image)?;
        frames.push(FrameData {
            header: FrameHeader {
                is_last: index + 1 == images.len(),
                duration,
                ..FrameHeader::default()
            },
            side_data,
            sections,
        });
    }
    Ok(frames)
}

/// Like [`sequence_animation`], but lets the caller supply the full per-frame header (encoding,
/// distance, pass count) instead of always defaulting to VarDCT/one pass. `is_last` and
/// `duration` are still assigned by the sequencer.
pub fn sequence_animation_with_header(
    images: &[ImageFrame],
    config: &AnimationConfig,
    mut per_frame: impl FnMut(usize, &ImageFrame) -> Result<(FrameHeader, SideData, Vec<Vec<u8>>)>,
) -> Result<Vec<FrameData>> {
    if images.len() > 1 {
        validate_consistency(images)?;
    }

    let mut frames = Vec::with_capacity(images.len());
    for (index, image) in images.iter().enumerate() {
        let duration = config.duration_for(index)?;
        let (header, side_data, sections) = per_frame(index, image)?;
        frames.push(FrameData {
            header: FrameHeader {
                is_last: index + 1 == images.len(),
                duration,
                ..header
            },
            side_data,
            sections,
        });
    }
    Ok(frames)
}

fn validate_consistency(images: &[ImageFrame]) -> Result<()> {
    let first = &images[0];
    for image in &images[1..] {
        if image.width() != first.width()
            || image.height() != first.height()
            || image.pixel_type() != first.pixel_type()
            || image.color_channels() != first.color_channels()
        {
            return Err(Error::InconsistentFrames);
        }
    }
    Ok(())
}
