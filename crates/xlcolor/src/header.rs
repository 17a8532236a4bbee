//! Bitstream representation of color encoding, per spec §3 `ColorEncoding`.

use xlbit::{BitReader, BitWriter};

use crate::consts::*;
use crate::{Error, Result};

#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum ColorSpace {
    #[default]
    Rgb = 0,
    Grey = 1,
    Xyb = 2,
    Unknown = 3,
}

impl TryFrom<u32> for ColorSpace {
    type Error = ();

    fn try_from(value: u32) -> std::result::Result<Self, Self::Error> {
        Ok(match value {
            0 => Self::Rgb,
            1 => Self::Grey,
            2 => Self::Xyb,
            3 => Self::Unknown,
            _ => return Err(()),
        })
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Default)]
pub enum WhitePoint {
    #[default]
    D65,
    Custom(Customxy),
    E,
    Dci,
}

impl WhitePoint {
    fn discriminant(self) -> u32 {
        match self {
            Self::D65 => 1,
            Self::Custom(_) => 2,
            Self::E => 10,
            Self::Dci => 11,
        }
    }

    pub fn as_chromaticity(self) -> [f32; 2] {
        match self {
            Self::D65 => ILLUMINANT_D65,
            Self::Custom(xy) => xy.as_float(),
            Self::E => ILLUMINANT_E,
            Self::Dci => ILLUMINANT_DCI,
        }
    }

    fn serialize(self, w: &mut BitWriter) -> Result<()> {
        w.append_bits(self.discriminant(), 4)?;
        if let Self::Custom(xy) = self {
            xy.serialize(w)?;
        }
        Ok(())
    }

    fn parse(r: &mut BitReader) -> Result<Self> {
        Ok(match r.read_bits(4)? {
            1 => Self::D65,
            2 => Self::Custom(Customxy::parse(r)?),
            10 => Self::E,
            11 => Self::Dci,
            value => return Err(Error::InvalidEnum { name: "WhitePoint", value }),
        })
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Default)]
pub enum Primaries {
    #[default]
    Srgb,
    Custom { red: Customxy, green: Customxy, blue: Customxy },
    Bt2100,
    P3,
}

impl Primaries {
    fn discriminant(self) -> u32 {
        match self {
            Self::Srgb => 1,
            Self::Custom { .. } => 2,
            Self::Bt2100 => 9,
            Self::P3 => 11,
        }
    }

    pub fn as_chromaticity(self) -> [[f32; 2]; 3] {
        match self {
            Self::Srgb => PRIMARIES_SRGB,
            Self::Custom { red, green, blue } => [red.as_float(), green.as_float(), blue.as_float()],
            Self::Bt2100 => PRIMARIES_BT2100,
            Self::P3 => PRIMARIES_P3,
        }
    }

    fn serialize(self, w: &mut BitWriter) -> Result<()> {
        w.append_bits(self.discriminant(), 4)?;
        if let Self::Custom { red, green, blue } = self {
            red.serialize(w)?;
            green.serialize(w)?;
            blue.serialize(w)?;
        }
        Ok(())
    }

    fn parse(r: &mut BitReader) -> Result<Self> {
        Ok(match r.read_bits(4)? {
            1 => Self::Srgb,
            2 => Self::Custom {
                red: Customxy::parse(r)?,
                green: Customxy::parse(r)?,
                blue: Customxy::parse(r)?,
            },
            9 => Self::Bt2100,
            11 => Self::P3,
            value => return Err(Error::InvalidEnum { name: "Primaries", value }),
        })
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Default)]
pub enum TransferFunction {
    Gamma(u32),
    Bt709,
    Unknown,
    Linear,
    #[default]
    Srgb,
    Pq,
    Dci,
    Hlg,
}

impl TransferFunction {
    fn enum_value(self) -> Option<u32> {
        match self {
            Self::Gamma(_) => None,
            Self::Bt709 => Some(1),
            Self::Unknown => Some(2),
            Self::Linear => Some(8),
            Self::Srgb => Some(13),
            Self::Pq => Some(16),
            Self::Dci => Some(17),
            Self::Hlg => Some(18),
        }
    }

    fn serialize(self, w: &mut BitWriter) -> Result<()> {
        match self {
            Self::Gamma(g) => {
                w.append_bit(true);
                w.append_bits(g, 24)?;
            }
            other => {
                w.append_bit(false);
                w.append_bits(other.enum_value().unwrap(), 5)?;
            }
        }
        Ok(())
    }

    fn parse(r: &mut BitReader) -> Result<Self> {
        if r.read_bool()? {
            return Ok(Self::Gamma(r.read_bits(24)?));
        }
        Ok(match r.read_bits(5)? {
            1 => Self::Bt709,
            2 => Self::Unknown,
            8 => Self::Linear,
            13 => Self::Srgb,
            16 => Self::Pq,
            17 => Self::Dci,
            18 => Self::Hlg,
            value => return Err(Error::InvalidEnum { name: "TransferFunction", value }),
        })
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum RenderingIntent {
    Perceptual = 0,
    #[default]
    Relative = 1,
    Saturation = 2,
    Absolute = 3,
}

impl RenderingIntent {
    fn parse(r: &mut BitReader) -> Result<Self> {
        Ok(match r.read_bits(2)? {
            0 => Self::Perceptual,
            1 => Self::Relative,
            2 => Self::Saturation,
            3 => Self::Absolute,
            value => return Err(Error::InvalidEnum { name: "RenderingIntent", value }),
        })
    }
}

/// Fixed-point chromaticity coordinate, `value * 1e-6`, signed via `UnpackSigned`.
#[derive(Debug, Copy, Clone, PartialEq, Default)]
pub struct Customxy {
    pub x: i32,
    pub y: i32,
}

impl Customxy {
    pub fn as_float(self) -> [f32; 2] {
        [self.x as f32 / 1_000_000.0, self.y as f32 / 1_000_000.0]
    }

    /// Chromaticity fits comfortably in 22 bits after `PackSigned` (range is roughly
    /// ±2.1, scaled by 1e6).
    const BITS: usize = 22;

    fn serialize(self, w: &mut BitWriter) -> Result<()> {
        w.append_bits(xlbit::pack_signed(self.x), Self::BITS)?;
        w.append_bits(xlbit::pack_signed(self.y), Self::BITS)?;
        Ok(())
    }

    fn parse(r: &mut BitReader) -> Result<Self> {
        let x = xlbit::unpack_signed(r.read_bits(Self::BITS)?);
        let y = xlbit::unpack_signed(r.read_bits(Self::BITS)?);
        Ok(Self { x, y })
    }
}

/// Full color encoding record: the `all_default = sRGB` shortcut, an ICC flag, then the enum
/// chain (color space, white point, primaries, transfer function, rendering intent).
#[derive(Debug, Clone, PartialEq)]
pub enum ColorEncoding {
    /// Parametric color encoding described by the enum chain below.
    Enum(EnumColorEncoding),
    /// The decoder should use an out-of-band ICC profile instead.
    IccProfile(ColorSpace),
}

impl Default for ColorEncoding {
    fn default() -> Self {
        Self::Enum(EnumColorEncoding::default())
    }
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct EnumColorEncoding {
    pub color_space: ColorSpace,
    pub white_point: WhitePoint,
    pub primaries: Primaries,
    pub tf: TransferFunction,
    pub rendering_intent: RenderingIntent,
}

impl Default for EnumColorEncoding {
    fn default() -> Self {
        Self::srgb(RenderingIntent::Relative)
    }
}

impl EnumColorEncoding {
    pub fn srgb(rendering_intent: RenderingIntent) -> Self {
        Self {
            color_space: ColorSpace::Rgb,
            white_point: WhitePoint::D65,
            primaries: Primaries::Srgb,
            tf: TransferFunction::Srgb,
            rendering_intent,
        }
    }

    pub fn linear_srgb(rendering_intent: RenderingIntent) -> Self {
        Self { tf: TransferFunction::Linear, ..Self::srgb(rendering_intent) }
    }

    pub fn gray_srgb() -> Self {
        Self {
            color_space: ColorSpace::Grey,
            white_point: WhitePoint::D65,
            primaries: Primaries::Srgb,
            tf: TransferFunction::Srgb,
            rendering_intent: RenderingIntent::Relative,
        }
    }

    pub fn display_p3(rendering_intent: RenderingIntent) -> Self {
        Self {
            color_space: ColorSpace::Rgb,
            white_point: WhitePoint::D65,
            primaries: Primaries::P3,
            tf: TransferFunction::Srgb,
            rendering_intent,
        }
    }

    pub fn rec2100_pq(rendering_intent: RenderingIntent) -> Self {
        Self {
            color_space: ColorSpace::Rgb,
            white_point: WhitePoint::D65,
            primaries: Primaries::Bt2100,
            tf: TransferFunction::Pq,
            rendering_intent,
        }
    }

    pub fn rec2100_hlg(rendering_intent: RenderingIntent) -> Self {
        Self {
            color_space: ColorSpace::Rgb,
            white_point: WhitePoint::D65,
            primaries: Primaries::Bt2100,
            tf: TransferFunction::Hlg,
            rendering_intent,
        }
    }

    pub fn xyb() -> Self {
        Self {
            color_space: ColorSpace::Xyb,
            white_point: WhitePoint::D65,
            primaries: Primaries::Srgb,
            tf: TransferFunction::Linear,
            rendering_intent: RenderingIntent::Perceptual,
        }
    }
}

impl ColorEncoding {
    #[inline]
    pub fn color_space(&self) -> ColorSpace {
        match self {
            Self::Enum(e) => e.color_space,
            Self::IccProfile(cs) => *cs,
        }
    }

    #[inline]
    pub fn want_icc(&self) -> bool {
        matches!(self, Self::IccProfile(_))
    }

    #[inline]
    pub fn is_srgb(&self) -> bool {
        matches!(self, Self::Enum(e) if *e == EnumColorEncoding::srgb(e.rendering_intent))
    }

    pub fn serialize(&self, w: &mut BitWriter) -> Result<()> {
        let all_default = matches!(self, Self::Enum(e) if *e == EnumColorEncoding::default());
        w.append_bit(all_default);
        if all_default {
            return Ok(());
        }
        w.append_bit(self.want_icc());
        let color_space = self.color_space();
        w.append_bits(color_space as u32, 2)?;
        match self {
            Self::IccProfile(_) => {}
            Self::Enum(e) => {
                if color_space != ColorSpace::Xyb {
                    e.white_point.serialize(w)?;
                }
                if !matches!(color_space, ColorSpace::Xyb | ColorSpace::Grey) {
                    e.primaries.serialize(w)?;
                }
                e.tf.serialize(w)?;
                w.append_bits(e.rendering_intent as u32, 2)?;
            }
        }
        Ok(())
    }

    pub fn parse(r: &mut BitReader) -> Result<Self> {
        if r.read_bool()? {
            return Ok(Self::default());
        }
        let want_icc = r.read_bool()?;
        let color_space = ColorSpace::try_from(r.read_bits(2)?)
            .map_err(|_| Error::InvalidEnum { name: "ColorSpace", value: 0 })?;
        if want_icc {
            return Ok(Self::IccProfile(color_space));
        }
        let white_point = if color_space == ColorSpace::Xyb {
            WhitePoint::D65
        } else {
            WhitePoint::parse(r)?
        };
        let primaries = if matches!(color_space, ColorSpace::Xyb | ColorSpace::Grey) {
            Primaries::Srgb
        } else {
            Primaries::parse(r)?
        };
        let tf = TransferFunction::parse(r)?;
        let rendering_intent = RenderingIntent::parse(r)?;
        Ok(Self::Enum(EnumColorEncoding { color_space, white_point, primaries, tf, rendering_intent }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn round_trip(ce: &ColorEncoding) {
        let mut w = BitWriter::new();
        ce.serialize(&mut w).unwrap();
        let bytes = w.finish();
        let mut r = BitReader::new(&bytes);
        let parsed = ColorEncoding::parse(&mut r).unwrap();
        assert_eq!(&parsed, ce);
    }

    #[test]
    fn default_is_srgb_shortcut() {
        round_trip(&ColorEncoding::default());
    }

    #[test]
    fn custom_primaries_round_trip() {
        round_trip(&ColorEncoding::Enum(EnumColorEncoding {
            color_space: ColorSpace::Rgb,
            white_point: WhitePoint::Custom(Customxy { x: 312_700, y: -329_000 }),
            primaries: Primaries::Custom {
                red: Customxy { x: 640_000, y: 330_000 },
                green: Customxy { x: 300_000, y: 600_000 },
                blue: Customxy { x: 150_000, y: 60_000 },
            },
            tf: TransferFunction::Gamma(2_200_000),
            rendering_intent: RenderingIntent::Absolute,
        }));
    }

    #[test]
    fn icc_shortcut_round_trip() {
        round_trip(&ColorEncoding::IccProfile(ColorSpace::Rgb));
    }

    #[test]
    fn xyb_round_trip() {
        round_trip(&ColorEncoding::Enum(EnumColorEncoding::xyb()));
    }
}
