//! `SizeHeader` and `ImageMetadata`, the two fixed-order header codecs that precede
//! `ColorEncoding` in a codestream header, per spec §3/§4.2.

use xlbit::{BitReader, BitWriter};

use crate::pixel::PixelType;
use crate::{Error, Result};

/// Image dimensions. Small images (both axes ≤ 256) use an 8-bit-each shortcut; otherwise each
/// axis picks the smallest of four widths independently.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct SizeHeader {
    pub width: u32,
    pub height: u32,
}

const DIM_WIDTHS: [u32; 4] = [9, 13, 18, 30];

impl SizeHeader {
    pub fn new(width: u32, height: u32) -> Result<Self> {
        if width == 0 || height == 0 || width > (1 << 30) || height > (1 << 30) {
            return Err(Error::InvalidDimensions);
        }
        Ok(Self { width, height })
    }

    fn small(&self) -> bool {
        self.width <= 256 && self.height <= 256
    }

    pub fn serialize(&self, w: &mut BitWriter) -> Result<()> {
        if self.small() {
            w.append_bit(true);
            w.append_bits(self.width - 1, 8)?;
            w.append_bits(self.height - 1, 8)?;
        } else {
            w.append_bit(false);
            write_dim(w, self.width)?;
            write_dim(w, self.height)?;
        }
        Ok(())
    }

    pub fn parse(r: &mut BitReader) -> Result<Self> {
        let small = r.read_bool()?;
        let (width, height) = if small {
            (r.read_bits(8)? + 1, r.read_bits(8)? + 1)
        } else {
            (read_dim(r)?, read_dim(r)?)
        };
        Self::new(width, height)
    }
}

fn write_dim(w: &mut BitWriter, value: u32) -> Result<()> {
    let biased = value - 1;
    let selector = DIM_WIDTHS.iter().position(|&bits| biased < (1 << bits)).unwrap_or(3);
    w.append_bits(selector as u32, 2)?;
    w.append_bits(biased, DIM_WIDTHS[selector] as usize)?;
    Ok(())
}

fn read_dim(r: &mut BitReader) -> Result<u32> {
    let selector = r.read_bits(2)? as usize;
    Ok(r.read_bits(DIM_WIDTHS[selector] as usize)? + 1)
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Animation {
    pub tps_numerator: u32,
    pub tps_denominator: u32,
    pub num_loops: u32,
}

/// Metadata preceding `ColorEncoding` in a codestream header: pixel format, alpha, XYB flag,
/// orientation, and optional animation timing.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageMetadata {
    pub bit_depth: u32,
    pub pixel_type: PixelType,
    pub has_alpha: bool,
    pub num_extra_channels: u8,
    pub xyb_encoded: bool,
    pub orientation: u8,
    pub animation: Option<Animation>,
}

impl Default for ImageMetadata {
    fn default() -> Self {
        Self {
            bit_depth: 8,
            pixel_type: PixelType::U8,
            has_alpha: false,
            num_extra_channels: 0,
            xyb_encoded: false,
            orientation: 1,
            animation: None,
        }
    }
}

impl ImageMetadata {
    fn is_all_default(&self) -> bool {
        *self == Self::default()
    }

    pub fn serialize(&self, w: &mut BitWriter) -> Result<()> {
        if self.is_all_default() {
            w.append_bit(true);
            return Ok(());
        }
        w.append_bit(false);

        let (selector, width) = bit_depth_selector(self.bit_depth);
        w.append_bits(selector, 2)?;
        w.append_bits(self.bit_depth, width)?;
        w.append_bits(sample_kind(self.pixel_type), 2)?;

        w.append_bit(self.has_alpha);
        w.append_bits(self.num_extra_channels as u32, 8)?;

        w.append_bit(self.xyb_encoded);

        w.append_bit(self.orientation != 1);
        if self.orientation != 1 {
            w.append_bits((self.orientation - 1) as u32, 3)?;
        }

        match &self.animation {
            None => {
                w.append_bit(false);
            }
            Some(anim) => {
                w.append_bit(true);
                w.append_bits(anim.tps_numerator, 32)?;
                w.append_bits(anim.tps_denominator, 32)?;
                w.append_bits(anim.num_loops, 32)?;
            }
        }
        Ok(())
    }

    pub fn parse(r: &mut BitReader) -> Result<Self> {
        if r.read_bool()? {
            return Ok(Self::default());
        }

        let selector = r.read_bits(2)?;
        let width = bit_depth_field_width(selector)?;
        let bit_depth = r.read_bits(width)?;
        let pixel_type = parse_sample_kind(r.read_bits(2)?, bit_depth)?;

        let has_alpha = r.read_bool()?;
        let num_extra_channels = r.read_bits(8)? as u8;

        let xyb_encoded = r.read_bool()?;

        let orientation = if r.read_bool()? {
            (r.read_bits(3)? + 1) as u8
        } else {
            1
        };
        if !(1..=8).contains(&orientation) {
            return Err(Error::InvalidOrientation);
        }

        let animation = if r.read_bool()? {
            Some(Animation {
                tps_numerator: r.read_bits(32)?,
                tps_denominator: r.read_bits(32)?,
                num_loops: r.read_bits(32)?,
            })
        } else {
            None
        };

        Ok(Self {
            bit_depth,
            pixel_type,
            has_alpha,
            num_extra_channels,
            xyb_encoded,
            orientation,
            animation,
        })
    }
}

fn bit_depth_selector(bit_depth: u32) -> (u32, usize) {
    if bit_depth <= 8 {
        (0, 8)
    } else if bit_depth <= 16 {
        (1, 16)
    } else {
        (2, 32)
    }
}

fn bit_depth_field_width(selector: u32) -> Result<usize> {
    match selector {
        0 => Ok(8),
        1 => Ok(16),
        2 => Ok(32),
        _ => Err(Error::InvalidBitDepth),
    }
}

fn sample_kind(pixel_type: PixelType) -> u32 {
    match pixel_type {
        PixelType::U8 | PixelType::U16 => 0,
        PixelType::I16 => 1,
        PixelType::F32 => 2,
    }
}

fn parse_sample_kind(kind: u32, bit_depth: u32) -> Result<PixelType> {
    match kind {
        0 if bit_depth <= 8 => Ok(PixelType::U8),
        0 => Ok(PixelType::U16),
        1 => Ok(PixelType::I16),
        2 => Ok(PixelType::F32),
        _ => Err(Error::InvalidBitDepth),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn round_trip_size(w: u32, h: u32) -> Vec<u8> {
        let mut writer = BitWriter::new();
        SizeHeader::new(w, h).unwrap().serialize(&mut writer).unwrap();
        let bytes = writer.finish();
        let mut reader = BitReader::new(&bytes);
        let parsed = SizeHeader::parse(&mut reader).unwrap();
        assert_eq!(parsed, SizeHeader { width: w, height: h });
        bytes
    }

    #[test]
    fn small_dimensions_use_shortcut() {
        round_trip_size(1, 1);
        round_trip_size(256, 256);
    }

    #[test]
    fn large_dimensions_pick_smallest_selector() {
        round_trip_size(257, 4000);
        round_trip_size(1 << 20, 1 << 20);
    }

    #[test]
    fn size_header_monotonicity() {
        let small = round_trip_size(256, 256).len();
        let large = round_trip_size(257, 257).len();
        assert!(large >= small);
    }

    #[test]
    fn default_metadata_uses_shortcut() {
        let mut w = BitWriter::new();
        ImageMetadata::default().serialize(&mut w).unwrap();
        assert_eq!(w.num_written_bits(), 1);
    }

    #[test]
    fn non_default_metadata_round_trips() {
        let meta = ImageMetadata {
            bit_depth: 16,
            pixel_type: PixelType::U16,
            has_alpha: true,
            num_extra_channels: 2,
            xyb_encoded: true,
            orientation: 6,
            animation: Some(Animation {
                tps_numerator: 30,
                tps_denominator: 1,
                num_loops: 0,
            }),
        };
        let mut w = BitWriter::new();
        meta.serialize(&mut w).unwrap();
        let bytes = w.finish();
        let mut r = BitReader::new(&bytes);
        let parsed = ImageMetadata::parse(&mut r).unwrap();
        assert_eq!(parsed, meta);
    }

    #[test]
    fn bad_bit_depth_selector_rejected() {
        let mut w = BitWriter::new();
        w.append_bit(false);
        w.append_bits(3, 2).unwrap();
        let bytes = w.finish();
        let mut r = BitReader::new(&bytes);
        assert!(matches!(ImageMetadata::parse(&mut r), Err(Error::InvalidBitDepth)));
    }
}
