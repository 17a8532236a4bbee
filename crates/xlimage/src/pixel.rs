//! The planar [`ImageFrame`] pixel model of spec §3, with bounds-checked `(x, y, channel)`
//! accessors.

use crate::{Error, Result};

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum PixelType {
    U8,
    U16,
    /// Signed 16-bit, used for Hounsfield-unit medical data.
    I16,
    F32,
}

impl PixelType {
    pub fn default_bit_depth(self) -> u32 {
        match self {
            Self::U8 => 8,
            Self::U16 | Self::I16 => 16,
            Self::F32 => 32,
        }
    }

    pub fn is_bit_depth_valid(self, bit_depth: u32) -> bool {
        if !(1..=32).contains(&bit_depth) {
            return false;
        }
        match self {
            Self::U8 => bit_depth <= 8,
            Self::U16 | Self::I16 => bit_depth <= 16,
            Self::F32 => bit_depth == 32,
        }
    }
}

/// A decoded or to-be-encoded sample. Carries the bit pattern for `F32` rather than a cooked
/// float, so that accessor round-trips preserve exact bits as required by spec §4.4.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum Sample {
    U(u32),
    I(i32),
    F(f32),
}

impl Sample {
    pub fn as_u32(self) -> u32 {
        match self {
            Self::U(v) => v,
            Self::I(v) => v as u32,
            Self::F(v) => v.to_bits(),
        }
    }

    pub fn as_i32(self) -> i32 {
        match self {
            Self::U(v) => v as i32,
            Self::I(v) => v,
            Self::F(v) => v.to_bits() as i32,
        }
    }

    pub fn as_f32_bits(self) -> f32 {
        f32::from_bits(self.as_u32())
    }
}

/// A single raster-order channel buffer. Stores each sample in a 32-bit cell regardless of
/// `PixelType`, matching [`Sample`]'s bit-exact contract.
#[derive(Debug, Clone)]
pub struct Plane {
    width: u32,
    height: u32,
    data: Vec<i32>,
}

impl Plane {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            data: vec![0; (width as usize) * (height as usize)],
        }
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    #[inline]
    fn index(&self, x: u32, y: u32) -> Option<usize> {
        if x >= self.width || y >= self.height {
            return None;
        }
        Some(y as usize * self.width as usize + x as usize)
    }

    #[inline]
    pub fn get(&self, x: u32, y: u32) -> Option<i32> {
        self.index(x, y).map(|i| self.data[i])
    }

    #[inline]
    pub fn set(&mut self, x: u32, y: u32, value: i32) -> bool {
        match self.index(x, y) {
            Some(i) => {
                self.data[i] = value;
                true
            }
            None => false,
        }
    }

    #[inline]
    pub fn as_slice(&self) -> &[i32] {
        &self.data
    }

    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [i32] {
        &mut self.data
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum AlphaMode {
    Straight,
    Premultiplied,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum ExtraChannelKind {
    Alpha,
    Depth,
    Thermal,
    Spectral,
    Confidence,
}

#[derive(Debug, Clone)]
pub struct ExtraChannel {
    pub name: String,
    pub kind: ExtraChannelKind,
    pub bit_depth: u32,
    pub plane: Plane,
}

/// A planar image: color planes, optional alpha, and ordered extra channels, per spec §3.
#[derive(Debug, Clone)]
pub struct ImageFrame {
    width: u32,
    height: u32,
    pixel_type: PixelType,
    bit_depth: u32,
    color_planes: Vec<Plane>,
    alpha: Option<(AlphaMode, Plane)>,
    extra_channels: Vec<ExtraChannel>,
    color_encoding: xlcolor::ColorEncoding,
    orientation: u8,
}

impl ImageFrame {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        width: u32,
        height: u32,
        color_channels: usize,
        pixel_type: PixelType,
        bit_depth: u32,
        color_encoding: xlcolor::ColorEncoding,
    ) -> Result<Self> {
        if width == 0 || height == 0 || width > (1 << 30) || height > (1 << 30) {
            return Err(Error::InvalidDimensions);
        }
        if !pixel_type.is_bit_depth_valid(bit_depth) {
            return Err(Error::InvalidBitDepth);
        }
        if !matches!(color_channels, 1 | 3) {
            return Err(Error::UnsupportedChannelCount);
        }
        Ok(Self {
            width,
            height,
            pixel_type,
            bit_depth,
            color_planes: (0..color_channels).map(|_| Plane::new(width, height)).collect(),
            alpha: None,
            extra_channels: Vec::new(),
            color_encoding,
            orientation: 1,
        })
    }

    pub fn with_alpha(mut self, mode: AlphaMode) -> Self {
        self.alpha = Some((mode, Plane::new(self.width, self.height)));
        self
    }

    pub fn push_extra_channel(&mut self, name: String, kind: ExtraChannelKind, bit_depth: u32) -> Result<()> {
        if self.extra_channels.len() >= 255 {
            return Err(Error::UnsupportedChannelCount);
        }
        self.extra_channels.push(ExtraChannel {
            name,
            kind,
            bit_depth,
            plane: Plane::new(self.width, self.height),
        });
        Ok(())
    }

    pub fn set_orientation(&mut self, orientation: u8) -> Result<()> {
        if !(1..=8).contains(&orientation) {
            return Err(Error::InvalidOrientation);
        }
        self.orientation = orientation;
        Ok(())
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    #[inline]
    pub fn color_channels(&self) -> usize {
        self.color_planes.len()
    }

    #[inline]
    pub fn pixel_type(&self) -> PixelType {
        self.pixel_type
    }

    #[inline]
    pub fn bit_depth(&self) -> u32 {
        self.bit_depth
    }

    #[inline]
    pub fn orientation(&self) -> u8 {
        self.orientation
    }

    #[inline]
    pub fn color_encoding(&self) -> &xlcolor::ColorEncoding {
        &self.color_encoding
    }

    #[inline]
    pub fn has_alpha(&self) -> bool {
        self.alpha.is_some()
    }

    #[inline]
    pub fn alpha_mode(&self) -> Option<AlphaMode> {
        self.alpha.as_ref().map(|(m, _)| *m)
    }

    #[inline]
    pub fn extra_channels(&self) -> &[ExtraChannel] {
        &self.extra_channels
    }

    #[inline]
    pub fn color_plane(&self, channel: usize) -> &Plane {
        &self.color_planes[channel]
    }

    #[inline]
    pub fn color_plane_mut(&mut self, channel: usize) -> &mut Plane {
        &mut self.color_planes[channel]
    }

    #[inline]
    pub fn alpha_plane(&self) -> Option<&Plane> {
        self.alpha.as_ref().map(|(_, p)| p)
    }

    #[inline]
    pub fn alpha_plane_mut(&mut self) -> Option<&mut Plane> {
        self.alpha.as_mut().map(|(_, p)| p)
    }

    #[inline]
    pub fn extra_channel_plane_mut(&mut self, idx: usize) -> Option<&mut Plane> {
        self.extra_channels.get_mut(idx).map(|c| &mut c.plane)
    }

    pub fn get_sample(&self, x: u32, y: u32, channel: usize) -> Option<Sample> {
        let raw = if channel < self.color_planes.len() {
            self.color_planes[channel].get(x, y)?
        } else if channel == self.color_planes.len() {
            self.alpha.as_ref()?.1.get(x, y)?
        } else {
            let ec_idx = channel - self.color_planes.len() - 1;
            self.extra_channels.get(ec_idx)?.plane.get(x, y)?
        };
        Some(match self.pixel_type {
            PixelType::F32 => Sample::F(f32::from_bits(raw as u32)),
            PixelType::I16 => Sample::I(raw),
            PixelType::U8 | PixelType::U16 => Sample::U(raw as u32),
        })
    }

    pub fn set_sample(&mut self, x: u32, y: u32, channel: usize, value: Sample) -> bool {
        let raw = match self.pixel_type {
            PixelType::F32 => value.as_f32_bits().to_bits() as i32,
            PixelType::I16 => value.as_i32(),
            PixelType::U8 | PixelType::U16 => value.as_u32() as i32,
        };
        if channel < self.color_planes.len() {
            self.color_planes[channel].set(x, y, raw)
        } else if channel == self.color_planes.len() {
            match &mut self.alpha {
                Some((_, p)) => p.set(x, y, raw),
                None => false,
            }
        } else {
            let ec_idx = channel - self.color_planes.len() - 1;
            match self.extra_channels.get_mut(ec_idx) {
                Some(c) => c.plane.set(x, y, raw),
                None => false,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn float_accessor_preserves_bit_pattern() {
        let mut img = ImageFrame::new(2, 2, 3, PixelType::F32, 32, xlcolor::ColorEncoding::default()).unwrap();
        let v = 1.0f32 / 3.0;
        img.set_sample(0, 0, 0, Sample::F(v));
        let Some(Sample::F(out)) = img.get_sample(0, 0, 0) else { panic!() };
        assert_eq!(out.to_bits(), v.to_bits());
    }

    #[test]
    fn signed_i16_round_trips() {
        let mut img = ImageFrame::new(2, 2, 1, PixelType::I16, 16, xlcolor::ColorEncoding::default()).unwrap();
        img.set_sample(1, 1, 0, Sample::I(-1024));
        assert_eq!(img.get_sample(1, 1, 0), Some(Sample::I(-1024)));
    }

    #[test]
    fn out_of_bounds_rejected() {
        let mut img = ImageFrame::new(2, 2, 1, PixelType::U8, 8, xlcolor::ColorEncoding::default()).unwrap();
        assert!(!img.set_sample(5, 5, 0, Sample::U(1)));
        assert_eq!(img.get_sample(5, 5, 0), None);
    }

    #[test]
    fn rejects_bad_dimensions_and_channels() {
        assert!(matches!(
            ImageFrame::new(0, 1, 3, PixelType::U8, 8, xlcolor::ColorEncoding::default()),
            Err(Error::InvalidDimensions)
        ));
        assert!(matches!(
            ImageFrame::new(1, 1, 2, PixelType::U8, 8, xlcolor::ColorEncoding::default()),
            Err(Error::UnsupportedChannelCount)
        ));
        assert!(matches!(
            ImageFrame::new(1, 1, 1, PixelType::U8, 32, xlcolor::ColorEncoding::default()),
            Err(Error::InvalidBitDepth)
        ));
    }
}
