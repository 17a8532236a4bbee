//! Frame-level types: the per-frame header, the patch/spline/noise side-channels, the
//! length-prefixed section layout a frame's coded pixel data is packed into, and the sequencer
//! that turns one or more images into a displayable frame sequence.
//!
//! A codestream carries one or more frames. A still image is a single frame with `is_last`; an
//! animation is a sequence of frames sharing dimensions, each carrying its own display duration.
//! Reference-only and LF-only frames are never displayed directly but may be read back by a
//! later frame's patches or progressive refinement.

mod error;
pub mod header;
pub mod sections;
pub mod sequence;
pub mod sidedata;

pub use error::{Error, Result};
pub use header::{BlendMode, Crop, Encoding, FrameHeader, FrameType};
pub use sections::FrameData;
pub use sequence::{sequence_animation, sequence_animation_with_header, sequence_still, AnimationConfig};
pub use sidedata::{apply_noise, apply_patches, render_splines, Noise, Patch, SideData, Spline};
