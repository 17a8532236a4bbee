//! Assembles a [`FrameHeader`] plus [`SideData`] and the frame's coded sections into a
//! self-delimiting byte run, per spec §3's `FrameData` data model.

use xlbit::{BitReader, BitWriter};

use crate::header::FrameHeader;
use crate::sidedata::SideData;
use crate::{Error, Result};

/// A fully assembled frame: header and side-data as a bit-packed prefix, byte-aligned, followed
/// by a length-counted list of coded sections (one per pass/group, per spec §4.2).
#[derive(Debug, Clone, PartialEq)]
pub struct FrameData {
    pub header: FrameHeader,
    pub side_data: SideData,
    pub sections: Vec<Vec<u8>>,
}

impl FrameData {
    pub fn serialize(&self) -> Result<Vec<u8>> {
        let mut w = BitWriter::new();
        self.header.serialize(&mut w)?;
        self.side_data.serialize(&mut w)?;
        w.byte_align();
        let mut out = w.finish();

        out.extend_from_slice(&(self.sections.len() as u32).to_le_bytes());
        for section in &self.sections {
            out.extend_from_slice(&(section.len() as u32).to_le_bytes());
            out.extend_from_slice(section);
        }
        Ok(out)
    }

    /// Parses one `FrameData` from the front of `bytes`, returning it along with the number of
    /// bytes consumed so callers can walk a sequence of frames back to back.
    pub fn parse(bytes: &[u8]) -> Result<(Self, usize)> {
        let mut r = BitReader::new(bytes);
        let header = FrameHeader::parse(&mut r)?;
        let side_data = SideData::parse(&mut r)?;
        r.byte_align()?;
        let mut offset = r.byte_offset();

        let count = read_u32_le(bytes, &mut offset)?;
        let mut sections = Vec::with_capacity(count as usize);
        for _ in 0..count {
            let len = read_u32_le(bytes, &mut offset)? as usize;
            let end = offset
                .checked_add(len)
                .filter(|&end| end <= bytes.len())
                .ok_or(Error::TruncatedSection)?;
            sections.push(bytes[offset..end].to_vec());
            offset = end;
        }

        Ok((Self { header, side_data, sections }, offset))
    }
}

fn read_u32_le(bytes: &[u8], offset: &mut usize) -> Result<u32> {
    let end = offset.checked_add(4).filter(|&end| end <= bytes.len()).ok_or(Error::TruncatedSection)?;
    let value = u32::from_le_bytes(bytes[*offset..end].try_into().unwrap());
    *offset = end;
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::header::{BlendMode, Encoding, FrameType};

    #[test]
    fn default_frame_round_trips() {
        let frame = FrameData {
            header: FrameHeader::default(),
            side_data: SideData::default(),
            sections: vec![vec![1, 2, 3], vec![]],
        };
        let bytes = frame.serialize().unwrap();
        let (parsed, consumed) = FrameData::parse(&bytes).unwrap();
        assert_eq!(parsed, frame);
        assert_eq!(consumed, bytes.len());
    }

    #[test]
    fn non_default_frame_round_trips_with_trailing_bytes() {
        let frame = FrameData {
            header: FrameHeader {
                frame_type: FrameType::ReferenceOnly,
                encoding: Encoding::Modular,
                blend_mode: BlendMode::Add,
                is_last: false,
                save_as_reference: 1,
                ..FrameHeader::default()
            },
            side_data: SideData::default(),
            sections: vec![vec![9; 17]],
        };
        let mut bytes = frame.serialize().unwrap();
        let trailer = [0xAA, 0xBB];
        bytes.extend_from_slice(&trailer);

        let (parsed, consumed) = FrameData::parse(&bytes).unwrap();
        assert_eq!(parsed, frame);
        assert_eq!(&bytes[consumed..], &trailer);
    }

    #[test]
    fn truncated_section_length_is_rejected() {
        let frame = FrameData {
            header: FrameHeader::default(),
            side_data: SideData::default(),
            sections: vec![vec![0; 100]],
        };
        let mut bytes = frame.serialize().unwrap();
        bytes.truncate(bytes.len() - 50);
        assert!(matches!(FrameData::parse(&bytes), Err(Error::TruncatedSection)));
    }
}
