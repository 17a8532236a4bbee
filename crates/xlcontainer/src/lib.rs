//! ISOBMFF-style box container: signature/ftyp/level/color-profile/metadata/frame-index boxes
//! wrapping a codestream, per spec §3/§4.3.

mod error;

pub use error::{Error, Result};

const SIGNATURE_PAYLOAD: [u8; 4] = [0x0D, 0x0A, 0x87, 0x0A];
const BRAND_JXL: [u8; 4] = *b"jxl ";

/// Four-byte ASCII box type tag.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct BoxType(pub [u8; 4]);

impl BoxType {
    pub const SIGNATURE: Self = Self(*b"JXL ");
    pub const FILE_TYPE: Self = Self(*b"ftyp");
    pub const LEVEL: Self = Self(*b"jxll");
    pub const COLOR_PROFILE: Self = Self(*b"colr");
    pub const EXIF: Self = Self(*b"Exif");
    pub const XML: Self = Self(*b"xml ");
    pub const FRAME_INDEX: Self = Self(*b"jxli");
    pub const CODESTREAM: Self = Self(*b"jxlc");
}

/// One entry in the frame index (`jxli`) box.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameIndexEntry {
    pub frame_number: u32,
    pub byte_offset: u64,
    pub duration: u32,
}

/// In-memory model of a parsed or to-be-serialized JPEG XL container.
///
/// Boxes are written in the fixed order spec §4.3 requires: signature, ftyp, level (when
/// `level != 5`), color profile, Exif, XMP, frame index, then the codestream.
#[derive(Debug, Clone, Default)]
pub struct Container {
    pub level: u8,
    pub icc_profile: Option<Vec<u8>>,
    pub exif: Option<Vec<u8>>,
    pub xmp: Option<Vec<u8>>,
    pub frame_index: Vec<FrameIndexEntry>,
    pub codestream: Vec<u8>,
}

impl Container {
    pub fn new(codestream: Vec<u8>) -> Self {
        Self {
            level: 5,
            icc_profile: None,
            exif: None,
            xmp: None,
            frame_index: Vec::new(),
            codestream,
        }
    }

    pub fn serialize(&self) -> Vec<u8> {
        let mut out = Vec::new();
        write_box(&mut out, BoxType::SIGNATURE, &SIGNATURE_PAYLOAD);
        write_box(&mut out, BoxType::FILE_TYPE, &file_type_payload());
        if self.level != 5 {
            write_box(&mut out, BoxType::LEVEL, &[self.level]);
        }
        if let Some(icc) = &self.icc_profile {
            let mut payload = Vec::with_capacity(4 + icc.len());
            payload.extend_from_slice(b"prof");
            payload.extend_from_slice(icc);
            write_box(&mut out, BoxType::COLOR_PROFILE, &payload);
        }
        if let Some(exif) = &self.exif {
            let mut payload = Vec::with_capacity(4 + exif.len());
            payload.extend_from_slice(&0u32.to_be_bytes());
            payload.extend_from_slice(exif);
            write_box(&mut out, BoxType::EXIF, &payload);
        }
        if let Some(xmp) = &self.xmp {
            write_box(&mut out, BoxType::XML, xmp);
        }
        if !self.frame_index.is_empty() {
            write_box(&mut out, BoxType::FRAME_INDEX, &frame_index_payload(&self.frame_index));
        }
        write_box(&mut out, BoxType::CODESTREAM, &self.codestream);
        out
    }

    pub fn parse(buf: &[u8]) -> Result<Self> {
        let mut pos = 0usize;
        let (ty, payload, consumed) = read_box(buf, pos)?;
        if ty != BoxType::SIGNATURE || payload != SIGNATURE_PAYLOAD {
            return Err(Error::SignatureMismatch);
        }
        pos += consumed;

        let mut container = Container {
            level: 5,
            ..Container::default()
        };
        let mut seen_ftyp = false;

        while pos < buf.len() {
            let (ty, payload, consumed) = read_box(buf, pos)?;
            pos += consumed;
            if ty == BoxType::FILE_TYPE {
                seen_ftyp = true;
                continue;
            }
            if ty == BoxType::LEVEL {
                container.level = *payload.first().unwrap_or(&5);
            } else if ty == BoxType::COLOR_PROFILE {
                container.icc_profile = Some(payload.get(4..).unwrap_or(&[]).to_vec());
            } else if ty == BoxType::EXIF {
                container.exif = Some(payload.get(4..).unwrap_or(&[]).to_vec());
            } else if ty == BoxType::XML {
                container.xmp = Some(payload.to_vec());
            } else if ty == BoxType::FRAME_INDEX {
                container.frame_index = parse_frame_index_payload(payload)?;
            } else if ty == BoxType::CODESTREAM {
                // Duplicate boxes of optional types are permitted; the codestream itself always
                // wins on the last occurrence, matching the rest of the container's semantics.
                container.codestream = payload.to_vec();
            }
        }

        if !seen_ftyp {
            tracing::debug!("container had no ftyp box");
        }
        if container.codestream.is_empty() {
            return Err(Error::MissingCodestream);
        }

        Ok(container)
    }
}

fn file_type_payload() -> Vec<u8> {
    let mut v = Vec::with_capacity(12);
    v.extend_from_slice(&BRAND_JXL);
    v.extend_from_slice(&0u32.to_be_bytes());
    v.extend_from_slice(&BRAND_JXL);
    v
}

fn frame_index_payload(entries: &[FrameIndexEntry]) -> Vec<u8> {
    let mut v = Vec::with_capacity(4 + entries.len() * 16);
    v.extend_from_slice(&(entries.len() as u32).to_be_bytes());
    for e in entries {
        v.extend_from_slice(&e.frame_number.to_be_bytes());
        v.extend_from_slice(&e.byte_offset.to_be_bytes());
        v.extend_from_slice(&e.duration.to_be_bytes());
    }
    v
}

fn parse_frame_index_payload(payload: &[u8]) -> Result<Vec<FrameIndexEntry>> {
    if payload.len() < 4 {
        return Err(Error::Truncated);
    }
    let count = u32::from_be_bytes(payload[0..4].try_into().unwrap()) as usize;
    let mut entries = Vec::with_capacity(count);
    let mut pos = 4usize;
    for _ in 0..count {
        if payload.len() < pos + 16 {
            return Err(Error::Truncated);
        }
        let frame_number = u32::from_be_bytes(payload[pos..pos + 4].try_into().unwrap());
        let byte_offset = u64::from_be_bytes(payload[pos + 4..pos + 12].try_into().unwrap());
        let duration = u32::from_be_bytes(payload[pos + 12..pos + 16].try_into().unwrap());
        entries.push(FrameIndexEntry {
            frame_number,
            byte_offset,
            duration,
        });
        pos += 16;
    }
    Ok(entries)
}

fn write_box(out: &mut Vec<u8>, ty: BoxType, payload: &[u8]) {
    let total_size = 8u64 + payload.len() as u64;
    if total_size <= u32::MAX as u64 {
        out.extend_from_slice(&(total_size as u32).to_be_bytes());
        out.extend_from_slice(&ty.0);
    } else {
        out.extend_from_slice(&1u32.to_be_bytes());
        out.extend_from_slice(&ty.0);
        out.extend_from_slice(&(total_size + 8).to_be_bytes());
    }
    out.extend_from_slice(payload);
}

/// Returns `(box_type, payload, bytes_consumed)` for the box starting at `pos`.
fn read_box(buf: &[u8], pos: usize) -> Result<(BoxType, &[u8], usize)> {
    if buf.len() < pos + 8 {
        return Err(Error::Truncated);
    }
    let size32 = u32::from_be_bytes(buf[pos..pos + 4].try_into().unwrap());
    let ty = BoxType(buf[pos + 4..pos + 8].try_into().unwrap());

    let (header_len, total_size) = if size32 == 1 {
        if buf.len() < pos + 16 {
            return Err(Error::Truncated);
        }
        let ext = u64::from_be_bytes(buf[pos + 8..pos + 16].try_into().unwrap());
        (16usize, ext)
    } else {
        (8usize, size32 as u64)
    };

    if total_size < header_len as u64 {
        return Err(Error::InvalidBoxSize);
    }
    let payload_len = (total_size - header_len as u64) as usize;
    let payload_start = pos + header_len;
    let payload_end = payload_start.checked_add(payload_len).ok_or(Error::InvalidBoxSize)?;
    if buf.len() < payload_end {
        return Err(Error::Truncated);
    }

    Ok((ty, &buf[payload_start..payload_end], header_len + payload_len))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_minimal_container() {
        let container = Container::new(vec![0xAA, 0xBB, 0xCC]);
        let bytes = container.serialize();
        let parsed = Container::parse(&bytes).unwrap();
        assert_eq!(parsed.codestream, container.codestream);
        assert_eq!(parsed.level, 5);
        assert!(parsed.icc_profile.is_none());
    }

    #[test]
    fn round_trips_full_metadata() {
        let mut container = Container::new(vec![1, 2, 3, 4]);
        container.level = 10;
        container.icc_profile = Some(vec![0x10, 0x20, 0x30]);
        container.exif = Some(vec![0xAB, 0xCD]);
        container.xmp = Some(b"<xmp/>".to_vec());
        container.frame_index.push(FrameIndexEntry {
            frame_number: 0,
            byte_offset: 128,
            duration: 1000,
        });
        container.frame_index.push(FrameIndexEntry {
            frame_number: 1,
            byte_offset: 4096,
            duration: 500,
        });

        let bytes = container.serialize();
        let parsed = Container::parse(&bytes).unwrap();
        assert_eq!(parsed.level, 10);
        assert_eq!(parsed.icc_profile, container.icc_profile);
        assert_eq!(parsed.exif, container.exif);
        assert_eq!(parsed.xmp, container.xmp);
        assert_eq!(parsed.frame_index.len(), 2);
        assert_eq!(parsed.frame_index[1].byte_offset, 4096);
        assert_eq!(parsed.codestream, container.codestream);
    }

    #[test]
    fn rejects_bad_signature() {
        let bytes = vec![0u8; 20];
        assert!(matches!(Container::parse(&bytes), Err(Error::SignatureMismatch)));
    }

    #[test]
    fn rejects_truncated_box() {
        let mut bytes = Container::new(vec![9, 9]).serialize();
        bytes.truncate(bytes.len() - 4);
        assert!(Container::parse(&bytes).is_err());
    }

    #[test]
    fn duplicate_optional_boxes_last_wins() {
        let mut out = Vec::new();
        write_box(&mut out, BoxType::SIGNATURE, &SIGNATURE_PAYLOAD);
        write_box(&mut out, BoxType::FILE_TYPE, &file_type_payload());
        write_box(&mut out, BoxType::LEVEL, &[5]);
        write_box(&mut out, BoxType::LEVEL, &[10]);
        write_box(&mut out, BoxType::CODESTREAM, &[7, 7]);

        let parsed = Container::parse(&out).unwrap();
        assert_eq!(parsed.level, 10);
    }
}
