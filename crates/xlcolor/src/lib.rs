//! Color encoding headers and the reference scalar color transforms used by the VarDCT and
//! pixel-model layers: RGB<->YCbCr (BT.601), RGB<->XYB, and linear<->encoded transfer functions.

mod consts;
mod error;
pub mod header;
pub mod tf;
pub mod xyb;
pub mod ycbcr;

pub use error::{Error, Result};
pub use header::{ColorEncoding, ColorSpace, Customxy, EnumColorEncoding, Primaries, RenderingIntent, TransferFunction, WhitePoint};
