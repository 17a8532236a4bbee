//! A static rANS (range asymmetric numeral system) coder. The encoder writes the normalized
//! frequency table up front; the decoder reconstructs it byte-for-byte before touching the
//! entropy-coded payload, per spec §4.7.

use crate::histogram::normalize;
use crate::{Error, Result};

pub const PRECISION_BITS: u32 = 12;
const PRECISION: u32 = 1 << PRECISION_BITS;
const RANS_L: u32 = 1 << 23;

#[derive(Debug, Clone)]
pub struct AnsTable {
    freq: Vec<u32>,
    cum_freq: Vec<u32>,
    /// `slot -> symbol` lookup, `PRECISION` entries wide.
    slot_to_symbol: Vec<u16>,
}

impl AnsTable {
    pub fn from_counts(counts: &[u32]) -> Self {
        let freq = normalize(counts, PRECISION_BITS);
        Self::from_freq(freq)
    }

    fn from_freq(freq: Vec<u32>) -> Self {
        let mut cum_freq = Vec::with_capacity(freq.len() + 1);
        let mut acc = 0u32;
        for &f in &freq {
            cum_freq.push(acc);
            acc += f;
        }
        cum_freq.push(acc);
        debug_assert_eq!(acc, PRECISION);

        let mut slot_to_symbol = vec![0u16; PRECISION as usize];
        for (sym, (&f, &start)) in freq.iter().zip(&cum_freq).enumerate() {
            for slot in slot_to_symbol.iter_mut().skip(start as usize).take(f as usize) {
                *slot = sym as u16;
            }
        }

        Self {
            freq,
            cum_freq,
            slot_to_symbol,
        }
    }

    pub fn freq(&self) -> &[u32] {
        &self.freq
    }

    pub fn single_symbol(&self) -> Option<u16> {
        let nonzero: Vec<usize> = self.freq.iter().enumerate().filter(|&(_, &f)| f > 0).map(|(i, _)| i).collect();
        match nonzero.as_slice() {
            [single] => Some(*single as u16),
            _ => None,
        }
    }

    pub fn serialize(&self, w: &mut xlbit::BitWriter) -> Result<()> {
        w.append_bits(self.freq.len() as u32, 16)?;
        for &f in &self.freq {
            w.append_bits(f, (PRECISION_BITS + 1) as usize)?;
        }
        Ok(())
    }

    pub fn parse(r: &mut xlbit::BitReader) -> Result<Self> {
        let count = r.read_bits(16)? as usize;
        let mut freq = Vec::with_capacity(count);
        let mut sum = 0u32;
        for _ in 0..count {
            let f = r.read_bits((PRECISION_BITS + 1) as usize)?;
            sum += f;
            freq.push(f);
        }
        if sum != PRECISION {
            return Err(Error::InvalidHistogram);
        }
        Ok(Self::from_freq(freq))
    }
}

/// Encodes `symbols` (read forward) against `table`, producing a self-contained byte stream:
/// the final 4-byte state followed by the renormalization bytes, in the order the decoder
/// consumes them.
pub fn encode(table: &AnsTable, symbols: &[u16]) -> Vec<u8> {
    let mut state = RANS_L;
    let mut reversed = Vec::new();

    for &sym in symbols.iter().rev() {
        let freq = table.freq[sym as usize].max(1);
        let cum = table.cum_freq[sym as usize];
        let x_max = (RANS_L >> PRECISION_BITS) << 8;
        let x_max = x_max * freq;
        while state >= x_max {
            reversed.push((state & 0xff) as u8);
            state >>= 8;
        }
        state = ((state / freq) << PRECISION_BITS) + (state % freq) + cum;
    }

    for byte in state.to_le_bytes() {
        reversed.push(byte);
    }
    reversed.reverse();
    reversed
}

/// Decoder over a byte stream produced by [`encode`], symbol-at-a-time.
pub struct AnsDecoder<'a> {
    bytes: &'a [u8],
    pos: usize,
    state: u32,
}

impl<'a> AnsDecoder<'a> {
    pub fn new(bytes: &'a [u8]) -> Result<Self> {
        if bytes.len() < 4 {
            return Err(Error::InvalidHistogram);
        }
        let state = u32::from_le_bytes(bytes[0..4].try_into().unwrap());
        Ok(Self { bytes, pos: 4, state })
    }

    fn next_byte(&mut self) -> u8 {
        let b = self.bytes.get(self.pos).copied().unwrap_or(0);
        self.pos += 1;
        b
    }

    pub fn read_symbol(&mut self, table: &AnsTable) -> u16 {
        let slot = self.state & (PRECISION - 1);
        let sym = table.slot_to_symbol[slot as usize];
        let freq = table.freq[sym as usize];
        let cum = table.cum_freq[sym as usize];
        self.state = freq * (self.state >> PRECISION_BITS) + slot - cum;
        while self.state < RANS_L {
            self.state = (self.state << 8) | self.next_byte() as u32;
        }
        sym
    }

    pub fn finalize(&self) -> Result<()> {
        if self.state == RANS_L {
            Ok(())
        } else {
            Err(Error::AnsVerificationFailed)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_symbols() {
        let counts = [30u32, 5, 1, 1, 50];
        let table = AnsTable::from_counts(&counts);
        let symbols: Vec<u16> = [0u16, 4, 4, 1, 0, 0, 2, 3, 4, 0].to_vec();

        let bytes = encode(&table, &symbols);
        let mut decoder = AnsDecoder::new(&bytes).unwrap();
        let decoded: Vec<u16> = symbols.iter().map(|_| decoder.read_symbol(&table)).collect();
        assert_eq!(decoded, symbols);
        decoder.finalize().unwrap();
    }

    #[test]
    fn table_round_trips_through_serialization() {
        let counts = [30u32, 5, 1, 1, 50];
        let table = AnsTable::from_counts(&counts);
        let mut w = xlbit::BitWriter::new();
        table.serialize(&mut w).unwrap();
        let bytes = w.finish();
        let mut r = xlbit::BitReader::new(&bytes);
        let parsed = AnsTable::parse(&mut r).unwrap();
        assert_eq!(parsed.freq(), table.freq());
    }

    #[test]
    fn single_symbol_stream_round_trips() {
        let counts = [0u32, 9, 0];
        let table = AnsTable::from_counts(&counts);
        assert_eq!(table.single_symbol(), Some(1));
        let symbols = [1u16; 5];
        let bytes = encode(&table, &symbols);
        let mut decoder = AnsDecoder::new(&bytes).unwrap();
        for &expected in &symbols {
            assert_eq!(decoder.read_symbol(&table), expected);
        }
    }
}
