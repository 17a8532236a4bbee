//! Progressive pass partitioning of the 64 zigzag coefficient positions: DC, low-frequency AC,
//! then high-frequency AC, each written as an independent section.

use crate::zigzag::BLOCK_LEN;

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Pass {
    Dc,
    LowFreqAc,
    HighFreqAc,
}

impl Pass {
    pub const ORDER: [Pass; 3] = [Pass::Dc, Pass::LowFreqAc, Pass::HighFreqAc];

    pub fn range(self) -> std::ops::Range<usize> {
        match self {
            Pass::Dc => 0..1,
            Pass::LowFreqAc => 1..16,
            Pass::HighFreqAc => 16..BLOCK_LEN,
        }
    }
}

/// Extracts this pass's slice of a zigzag-ordered block, zero-padded to `range().len()`.
pub fn extract(block_zigzag: &[f32; BLOCK_LEN], pass: Pass) -> Vec<f32> {
    block_zigzag[pass.range()].to_vec()
}

/// Writes a pass's decoded coefficients back into their zigzag slots of `block_zigzag`.
pub fn scatter(block_zigzag: &mut [f32; BLOCK_LEN], pass: Pass, values: &[f32]) {
    let range = pass.range();
    debug_assert_eq!(values.len(), range.len());
    block_zigzag[range].copy_from_slice(values);
}
