//! `FrameHeader`, per spec §3/§4.2: frame type, coding mode, blending, duration, optional crop,
//! and the pass/group counts that size the section list in [`crate::FrameData`].

use xlbit::{BitReader, BitWriter};

use crate::{Error, Result};

#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
#[repr(u8)]
pub enum FrameType {
    #[default]
    Regular = 0,
    LfOnly = 1,
    ReferenceOnly = 2,
    SkipProgressive = 3,
}

impl FrameType {
    fn parse(r: &mut BitReader) -> Result<Self> {
        Ok(match r.read_bits(2)? {
            0 => Self::Regular,
            1 => Self::LfOnly,
            2 => Self::ReferenceOnly,
            3 => Self::SkipProgressive,
            value => return Err(xlbit::Error::InvalidEnum { name: "FrameType", value }.into()),
        })
    }

    /// Whether this frame type is displayed (as opposed to a pure reference/LF source).
    pub fn is_normal_frame(self) -> bool {
        matches!(self, Self::Regular | Self::SkipProgressive)
    }
}

#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
#[repr(u8)]
pub enum Encoding {
    #[default]
    VarDct = 0,
    Modular = 1,
}

impl Encoding {
    fn parse(r: &mut BitReader) -> Result<Self> {
        Ok(match r.read_bits(1)? {
            0 => Self::VarDct,
            1 => Self::Modular,
            value => return Err(xlbit::Error::InvalidEnum { name: "Encoding", value }.into()),
        })
    }
}

#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
#[repr(u8)]
pub enum BlendMode {
    #[default]
    Replace = 0,
    Add = 1,
    Blend = 2,
    MulAdd = 3,
    Mul = 4,
}

impl BlendMode {
    fn parse(r: &mut BitReader) -> Result<Self> {
        Ok(match r.read_bits(3)? {
            0 => Self::Replace,
            1 => Self::Add,
            2 => Self::Blend,
            3 => Self::MulAdd,
            4 => Self::Mul,
            value => return Err(xlbit::Error::InvalidEnum { name: "BlendMode", value }.into()),
        })
    }

    #[inline]
    pub fn use_alpha(self) -> bool {
        matches!(self, Self::Blend | Self::MulAdd)
    }
}

/// Frame-relative crop region: a sub-rectangle of the canvas this frame covers.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Crop {
    pub x0: i32,
    pub y0: i32,
    pub width: u32,
    pub height: u32,
}

const CROP_DIM_WIDTHS: [u32; 4] = [8, 11, 14, 30];
const PASS_COUNT_WIDTHS: [u32; 4] = [0, 2, 4, 8];
const GROUP_COUNT_WIDTHS: [u32; 4] = [0, 4, 10, 20];
const MAX_NAME_LEN: usize = 255;

#[derive(Debug, Clone, PartialEq)]
pub struct FrameHeader {
    pub frame_type: FrameType,
    pub encoding: Encoding,
    pub blend_mode: BlendMode,
    /// Ticks of display duration; 0 for still frames.
    pub duration: u32,
    pub is_last: bool,
    /// 0 = not kept as a reference; 1..=3 = reference slot.
    pub save_as_reference: u8,
    pub name: Option<String>,
    pub crop: Option<Crop>,
    /// VarDCT quantization distance this frame was coded at; meaningless for Modular frames but
    /// still round-tripped so a decoder never has to guess it.
    pub distance: f32,
    pub num_passes: u32,
    pub num_groups: u32,
}

impl Default for FrameHeader {
    fn default() -> Self {
        Self {
            frame_type: FrameType::Regular,
            encoding: Encoding::VarDct,
            blend_mode: BlendMode::Replace,
            duration: 0,
            is_last: true,
            save_as_reference: 0,
            name: None,
            crop: None,
            distance: 0.0,
            num_passes: 1,
            num_groups: 1,
        }
    }
}

impl FrameHeader {
    fn is_all_default(&self) -> bool {
        *self == Self::default()
    }

    /// Whether subsequent frames may reference this one's pixels.
    pub fn can_reference(&self) -> bool {
        !self.is_last && self.save_as_reference != 0
    }

    pub fn serialize(&self, w: &mut BitWriter) -> Result<()> {
        if self.is_all_default() {
            w.append_bit(true);
            return Ok(());
        }
        w.append_bit(false);

        w.append_bits(self.frame_type as u32, 2)?;
        w.append_bits(self.encoding as u32, 1)?;
        w.append_bits(self.blend_mode as u32, 3)?;
        w.append_bits(self.distance.to_bits(), 32)?;
        write_duration(w, self.duration)?;
        w.append_bit(self.is_last);

        if self.save_as_reference > 3 {
            return Err(Error::UnsupportedFeature("save_as_reference slot out of range"));
        }
        w.append_bits(self.save_as_reference as u32, 2)?;

        match &self.name {
            None => w.append_bit(false),
            Some(name) => {
                let bytes = name.as_bytes();
                if bytes.len() > MAX_NAME_LEN {
                    return Err(Error::UnsupportedFeature("frame name longer than 255 bytes"));
                }
                w.append_bit(true);
                w.append_bits(bytes.len() as u32, 8)?;
                for &b in bytes {
                    w.append_bits(b as u32, 8)?;
                }
            }
        }

        match self.crop {
            None => w.append_bit(false),
            Some(crop) => {
                w.append_bit(true);
                xlbit::write_size_selected(w, xlbit::pack_signed(crop.x0) + 1, &CROP_DIM_WIDTHS)?;
                xlbit::write_size_selected(w, xlbit::pack_signed(crop.y0) + 1, &CROP_DIM_WIDTHS)?;
                xlbit::write_size_selected(w, crop.width, &CROP_DIM_WIDTHS)?;
                xlbit::write_size_selected(w, crop.height, &CROP_DIM_WIDTHS)?;
            }
        }

        xlbit::write_size_selected(w, self.num_passes, &PASS_COUNT_WIDTHS)?;
        xlbit::write_size_selected(w, self.num_groups, &GROUP_COUNT_WIDTHS)?;
        Ok(())
    }

    pub fn parse(r: &mut BitReader) -> Result<Self> {
        if r.read_bool()? {
            return Ok(Self::default());
        }

        let frame_type = FrameType::parse(r)?;
        let encoding = Encoding::parse(r)?;
        let blend_mode = BlendMode::parse(r)?;
        let distance = f32::from_bits(r.read_bits(32)?);
        let duration = read_duration(r)?;
        let is_last = r.read_bool()?;
        let save_as_reference = r.read_bits(2)? as u8;

        let name = if r.read_bool()? {
            let len = r.read_bits(8)? as usize;
            let mut buf = Vec::with_capacity(len);
            for _ in 0..len {
                buf.push(r.read_bits(8)? as u8);
            }
            Some(String::from_utf8(buf).map_err(|_| Error::UnsupportedFeature("frame name is not valid UTF-8"))?)
        } else {
            None
        };

        let crop = if r.read_bool()? {
            let x0 = xlbit::unpack_signed(xlbit::read_size_selected(r, &CROP_DIM_WIDTHS)? - 1);
            let y0 = xlbit::unpack_signed(xlbit::read_size_selected(r, &CROP_DIM_WIDTHS)? - 1);
            let width = xlbit::read_size_selected(r, &CROP_DIM_WIDTHS)?;
            let height = xlbit::read_size_selected(r, &CROP_DIM_WIDTHS)?;
            Some(Crop { x0, y0, width, height })
        } else {
            None
        };

        let num_passes = xlbit::read_size_selected(r, &PASS_COUNT_WIDTHS)?;
        let num_groups = xlbit::read_size_selected(r, &GROUP_COUNT_WIDTHS)?;

        Ok(Self {
            frame_type,
            encoding,
            blend_mode,
            duration,
            is_last,
            save_as_reference,
            name,
            crop,
            distance,
            num_passes,
            num_groups,
        })
    }
}

fn write_duration(w: &mut BitWriter, value: u32) -> Result<()> {
    match value {
        0 => w.append_bits(0, 2)?,
        1 => w.append_bits(1, 2)?,
        v if v <= 0xFF => {
            w.append_bits(2, 2)?;
            w.append_bits(v, 8)?;
        }
        v => {
            w.append_bits(3, 2)?;
            w.append_bits(v, 32)?;
        }
    }
    Ok(())
}

fn read_duration(r: &mut BitReader) -> Result<u32> {
    Ok(match r.read_bits(2)? {
        0 => 0,
        1 => 1,
        2 => r.read_bits(8)?,
        3 => r.read_bits(32)?,
        _ => unreachable!(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn round_trip(header: &FrameHeader) -> Vec<u8> {
        let mut w = BitWriter::new();
        header.serialize(&mut w).unwrap();
        let bytes = w.finish();
        let mut r = BitReader::new(&bytes);
        let parsed = FrameHeader::parse(&mut r).unwrap();
        assert_eq!(&parsed, header);
        bytes
    }

    #[test]
    fn default_header_uses_shortcut() {
        let mut w = BitWriter::new();
        FrameHeader::default().serialize(&mut w).unwrap();
        assert_eq!(w.num_written_bits(), 1);
    }

    #[test]
    fn non_default_header_round_trips() {
        round_trip(&FrameHeader {
            frame_type: FrameType::Regular,
            encoding: Encoding::Modular,
            blend_mode: BlendMode::Blend,
            duration: 41,
            is_last: false,
            save_as_reference: 2,
            name: Some("layer-1".to_string()),
            crop: Some(Crop { x0: -4, y0: 8, width: 32, height: 16 }),
            distance: 1.5,
            num_passes: 3,
            num_groups: 12,
        });
    }

    #[test]
    fn large_duration_round_trips() {
        round_trip(&FrameHeader {
            duration: 1_000_000,
            ..FrameHeader::default()
        });
    }

    #[test]
    fn rejects_out_of_range_reference_slot() {
        let header = FrameHeader {
            save_as_reference: 7,
            ..FrameHeader::default()
        };
        let mut w = BitWriter::new();
        assert!(matches!(header.serialize(&mut w), Err(Error::UnsupportedFeature(_))));
    }
}
