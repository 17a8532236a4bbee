//! Planar pixel model, variable-length size header, and image metadata header.
//!
//! This crate owns the in-memory [`ImageFrame`] representation shared by the VarDCT and Modular
//! coding paths, plus the two fixed-order bitstream headers (`SizeHeader`, `ImageMetadata`) that
//! precede a `ColorEncoding` inside a codestream header.

mod error;
pub mod header;
pub mod pixel;

pub use error::{Error, Result};
pub use header::{Animation, ImageMetadata, SizeHeader};
pub use pixel::{AlphaMode, ExtraChannel, ExtraChannelKind, ImageFrame, PixelType, Plane, Sample};
