//! `EncoderConfig`, the single configuration record spec §6 describes: mode, effort,
//! progressive/animation toggles, and the optional patch/spline/noise/ROI encoder policies.

use xlframe::AnimationConfig;

/// Lossless vs. lossy, with the quality knob for the latter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Mode {
    Lossless,
    Lossy { quality: u8 },
}

impl Mode {
    pub fn distance(self) -> f32 {
        match self {
            Self::Lossless => 0.0,
            Self::Lossy { quality } => xlvardct::distance_from_quality(quality),
        }
    }
}

/// Named effort presets, in increasing order of search thoroughness.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Effort {
    Lightning = 1,
    Falcon = 2,
    Cheetah = 3,
    Squirrel = 4,
    #[default]
    Kitten = 5,
    Wombat = 6,
    Tortoise = 9,
}

impl Effort {
    pub fn value(self) -> u8 {
        self as u8
    }

    /// Whether this effort level is high enough to prefer the ANS coder over run-length codes.
    pub fn use_ans(self) -> bool {
        self.value() >= Self::Squirrel.value()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferenceFramePreset {
    Off,
    Balanced,
    Aggressive,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatchPreset {
    Off,
    ScreenContent,
    Photograph,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SplineConfig {
    pub enabled: bool,
    pub quantization_adjustment: i32,
    pub min_control_point_distance: f32,
    pub max_splines_per_frame: u32,
    pub edge_threshold: f32,
    pub min_edge_length: f32,
}

impl Default for SplineConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            quantization_adjustment: 0,
            min_control_point_distance: 8.0,
            max_splines_per_frame: 32,
            edge_threshold: 0.1,
            min_edge_length: 16.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NoiseConfig {
    pub enabled: bool,
    pub amplitude: f32,
    pub luma_strength: f32,
    pub chroma_strength: f32,
    pub seed: u64,
}

impl Default for NoiseConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            amplitude: 0.0,
            luma_strength: 0.0,
            chroma_strength: 0.0,
            seed: 0,
        }
    }
}

/// Encoder-side-only policy: inside `(x, y, w, h)` (plus a linear-falloff feather border of
/// `feather_width` pixels) the quantization step is scaled down by `quality_boost`. Never
/// signaled in the bitstream.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RegionOfInterest {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
    pub quality_boost: f32,
    pub feather_width: u32,
}

/// The single configuration record spec §6 describes.
#[derive(Debug, Clone)]
pub struct EncoderConfig {
    pub mode: Mode,
    pub effort: Effort,
    pub progressive: bool,
    pub animation_config: Option<AnimationConfig>,
    pub reference_frame_config: ReferenceFramePreset,
    pub patch_config: PatchPreset,
    pub spline_config: SplineConfig,
    pub noise_config: NoiseConfig,
    pub region_of_interest: Option<RegionOfInterest>,
    pub num_threads: usize,
    pub modular_mode: bool,
    pub use_ans: bool,
}

impl Default for EncoderConfig {
    fn default() -> Self {
        Self {
            mode: Mode::Lossy { quality: 90 },
            effort: Effort::default(),
            progressive: false,
            animation_config: None,
            reference_frame_config: ReferenceFramePreset::Off,
            patch_config: PatchPreset::Off,
            spline_config: SplineConfig::default(),
            noise_config: NoiseConfig::default(),
            region_of_interest: None,
            num_threads: 0,
            modular_mode: false,
            use_ans: true,
        }
    }
}
