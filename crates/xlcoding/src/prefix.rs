//! Canonical prefix (Huffman) codes over token symbols, length-limited so every code fits in a
//! `u16`.

use std::collections::BinaryHeap;

use xlbit::{BitReader, BitWriter};

use crate::{Error, Result};

const MAX_CODE_LEN: u8 = 15;

#[derive(Debug, Clone)]
pub struct PrefixTable {
    /// Code length in bits per symbol; 0 means the symbol is unused.
    lengths: Vec<u8>,
    codes: Vec<u16>,
    /// Decode lookup: `(length, code) -> symbol`, sorted for binary search during decode.
    decode_order: Vec<(u8, u16, u16)>,
}

impl PrefixTable {
    /// Builds a canonical code from observed symbol counts. Symbols with zero count get no code
    /// and cannot be encoded.
    pub fn from_counts(counts: &[u32]) -> Self {
        let lengths = huffman_lengths(counts);
        Self::from_lengths(lengths)
    }

    pub fn from_lengths(lengths: Vec<u8>) -> Self {
        let codes = canonical_codes(&lengths);
        let mut decode_order: Vec<(u8, u16, u16)> = lengths
            .iter()
            .zip(&codes)
            .enumerate()
            .filter(|(_, (&len, _))| len > 0)
            .map(|(sym, (&len, &code))| (len, code, sym as u16))
            .collect();
        decode_order.sort_unstable();
        Self {
            lengths,
            codes,
            decode_order,
        }
    }

    pub fn lengths(&self) -> &[u8] {
        &self.lengths
    }

    pub fn write_symbol(&self, w: &mut BitWriter, symbol: u16) -> Result<()> {
        let len = self.lengths[symbol as usize];
        debug_assert!(len > 0, "symbol {symbol} has no assigned code");
        w.append_bits(self.codes[symbol as usize] as u32, len as usize)?;
        Ok(())
    }

    pub fn read_symbol(&self, r: &mut BitReader) -> Result<u16> {
        let mut code: u16 = 0;
        let mut len: u8 = 0;
        loop {
            code = (code << 1) | r.read_bits(1)? as u16;
            len += 1;
            if let Ok(idx) = self.decode_order.binary_search_by_key(&(len, code), |&(l, c, _)| (l, c)) {
                return Ok(self.decode_order[idx].2);
            }
            if len > MAX_CODE_LEN {
                return Err(Error::InvalidHistogram);
            }
        }
    }

    pub fn serialize_lengths(&self, w: &mut BitWriter) -> Result<()> {
        w.append_bits(self.lengths.len() as u32, 16)?;
        for &len in &self.lengths {
            w.append_bits(len as u32, 4)?;
        }
        Ok(())
    }

    pub fn parse_lengths(r: &mut BitReader) -> Result<Self> {
        let count = r.read_bits(16)? as usize;
        let mut lengths = Vec::with_capacity(count);
        for _ in 0..count {
            lengths.push(r.read_bits(4)? as u8);
        }
        Ok(Self::from_lengths(lengths))
    }
}

/// Length-limited Huffman code lengths via a standard binary-heap merge, with lengths clamped
/// and Kraft-repaired if the limit is exceeded.
fn huffman_lengths(counts: &[u32]) -> Vec<u8> {
    #[derive(Eq, PartialEq)]
    struct Node {
        freq: u64,
        // Tie-break deterministically by insertion order, not memory address.
        seq: usize,
        symbol: Option<usize>,
        left: Option<Box<Node>>,
        right: Option<Box<Node>>,
    }
    impl Ord for Node {
        fn cmp(&self, other: &Self) -> std::cmp::Ordering {
            other.freq.cmp(&self.freq).then(other.seq.cmp(&self.seq))
        }
    }
    impl PartialOrd for Node {
        fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
            Some(self.cmp(other))
        }
    }

    let nonzero: Vec<(usize, u32)> = counts.iter().enumerate().filter(|&(_, &c)| c > 0).map(|(i, &c)| (i, c)).collect();
    let mut lengths = vec![0u8; counts.len()];
    if nonzero.is_empty() {
        return lengths;
    }
    if nonzero.len() == 1 {
        lengths[nonzero[0].0] = 1;
        return lengths;
    }

    let mut heap = BinaryHeap::new();
    for (seq, &(sym, count)) in nonzero.iter().enumerate() {
        heap.push(Node {
            freq: count as u64,
            seq,
            symbol: Some(sym),
            left: None,
            right: None,
        });
    }
    let mut seq = nonzero.len();
    while heap.len() > 1 {
        let a = heap.pop().unwrap();
        let b = heap.pop().unwrap();
        heap.push(Node {
            freq: a.freq + b.freq,
            seq,
            symbol: None,
            left: Some(Box::new(a)),
            right: Some(Box::new(b)),
        });
        seq += 1;
    }

    fn walk(node: &Node, depth: u8, lengths: &mut [u8]) {
        if let Some(sym) = node.symbol {
            lengths[sym] = depth.max(1);
            return;
        }
        if let Some(l) = &node.left {
            walk(l, depth + 1, lengths);
        }
        if let Some(r) = &node.right {
            walk(r, depth + 1, lengths);
        }
    }
    walk(&heap.pop().unwrap(), 0, &mut lengths);

    let max_len = lengths.iter().copied().max().unwrap_or(0);
    if max_len > MAX_CODE_LEN {
        clamp_lengths(&mut lengths);
    }
    lengths
}

/// Clamps all lengths to `MAX_CODE_LEN`, then repairs the Kraft inequality by lengthening the
/// cheapest codes until `sum(2^-len) <= 1` holds for a valid canonical assignment.
fn clamp_lengths(lengths: &mut [u8]) {
    for len in lengths.iter_mut() {
        if *len > MAX_CODE_LEN {
            *len = MAX_CODE_LEN;
        }
    }
    loop {
        let deficit: i64 = lengths.iter().filter(|&&l| l > 0).map(|&l| 1i64 << (MAX_CODE_LEN - l)).sum::<i64>()
            - (1i64 << MAX_CODE_LEN);
        if deficit <= 0 {
            break;
        }
        let Some((idx, _)) = lengths.iter().enumerate().filter(|&(_, &l)| l > 0 && l < MAX_CODE_LEN).max_by_key(|&(_, &l)| l) else {
            break;
        };
        lengths[idx] += 1;
    }
}

/// Assigns canonical codes (shortest-length-first, left-to-right) from a length table.
fn canonical_codes(lengths: &[u8]) -> Vec<u16> {
    let max_len = lengths.iter().copied().max().unwrap_or(0) as usize;
    let mut count_per_len = vec![0u32; max_len + 1];
    for &len in lengths {
        if len > 0 {
            count_per_len[len as usize] += 1;
        }
    }
    let mut next_code = vec![0u16; max_len + 2];
    let mut code = 0u32;
    for len in 1..=max_len {
        code = (code + count_per_len[len - 1]) << 1;
        next_code[len] = code as u16;
    }
    let mut codes = vec![0u16; lengths.len()];
    for (sym, &len) in lengths.iter().enumerate() {
        if len == 0 {
            continue;
        }
        codes[sym] = next_code[len as usize];
        next_code[len as usize] += 1;
    }
    codes
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_symbols() {
        let counts = [10u32, 1, 1, 5, 0, 20];
        let table = PrefixTable::from_counts(&counts);
        let symbols = [0u16, 5, 5, 3, 1, 2, 0, 5];

        let mut w = BitWriter::new();
        for &s in &symbols {
            table.write_symbol(&mut w, s).unwrap();
        }
        let bytes = w.finish();
        let mut r = BitReader::new(&bytes);
        for &expected in &symbols {
            assert_eq!(table.read_symbol(&mut r).unwrap(), expected);
        }
    }

    #[test]
    fn single_symbol_alphabet() {
        let counts = [0u32, 7, 0];
        let table = PrefixTable::from_counts(&counts);
        let mut w = BitWriter::new();
        table.write_symbol(&mut w, 1).unwrap();
        table.write_symbol(&mut w, 1).unwrap();
        let bytes = w.finish();
        let mut r = BitReader::new(&bytes);
        assert_eq!(table.read_symbol(&mut r).unwrap(), 1);
        assert_eq!(table.read_symbol(&mut r).unwrap(), 1);
    }

    #[test]
    fn lengths_round_trip_through_serialization() {
        let counts = [10u32, 1, 1, 5, 0, 20];
        let table = PrefixTable::from_counts(&counts);
        let mut w = BitWriter::new();
        table.serialize_lengths(&mut w).unwrap();
        let bytes = w.finish();
        let mut r = BitReader::new(&bytes);
        let parsed = PrefixTable::parse_lengths(&mut r).unwrap();
        assert_eq!(parsed.lengths(), table.lengths());
    }

    #[test]
    fn skewed_distribution_stays_within_max_code_len() {
        let mut counts = vec![1u32; 40];
        counts[0] = 1_000_000;
        let table = PrefixTable::from_counts(&counts);
        assert!(table.lengths().iter().all(|&l| l <= MAX_CODE_LEN));
    }
}
