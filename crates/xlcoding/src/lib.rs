//! Entropy coding over coefficient blocks and Modular residual streams: zero-run-length plus a
//! canonical prefix code, or a static rANS coder, both keyed by the same per-(channel, band)
//! [`ContextModel`], per spec §4.7.

mod ans;
mod context;
mod error;
mod histogram;
mod prefix;
mod rle;

pub use context::{Band, ContextModel};
pub use error::{Error, Result};

use xlbit::{BitReader, BitWriter};

/// Which entropy backend a stream uses. Run-length + prefix codes are cheaper to build and
/// favored at low effort; rANS gets closer to the entropy bound at higher effort.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Mode {
    RunLengthPrefix,
    Ans,
}

enum Backend {
    Prefix(Vec<prefix::PrefixTable>),
    Ans(Vec<ans::AnsTable>),
}

/// An entropy-coded stream writer over `num_contexts` independent histograms.
pub struct Encoder {
    mode: Mode,
    counts: Vec<Vec<u32>>,
    events: Vec<(usize, u16, i32)>,
}

impl Encoder {
    pub fn new(mode: Mode, num_contexts: usize) -> Self {
        Self {
            mode,
            counts: vec![vec![0u32; rle::ALPHABET_SIZE]; num_contexts],
            events: Vec::new(),
        }
    }

    /// Tokenizes a coefficient block (in zigzag order, DC first) under `context` and records
    /// the tokens for the eventual histogram-then-encode pass.
    pub fn push_block(&mut self, context: usize, coeffs: &[i32]) -> Result<()> {
        if context >= self.counts.len() {
            return Err(Error::InvalidContext(context));
        }
        for (symbol, value) in rle::tokenize(coeffs) {
            self.counts[context][symbol as usize] += 1;
            self.events.push((context, symbol, value));
        }
        Ok(())
    }

    /// Finalizes the histograms, writes the preamble (mode, per-context tables), then the coded
    /// payload, and returns the finished byte buffer.
    pub fn finish(self) -> Result<Vec<u8>> {
        let mut w = BitWriter::new();
        w.append_bit(matches!(self.mode, Mode::Ans));

        match self.mode {
            Mode::RunLengthPrefix => {
                let tables: Vec<_> = self.counts.iter().map(|c| prefix::PrefixTable::from_counts(c)).collect();
                for t in &tables {
                    t.serialize_lengths(&mut w)?;
                }
                for (context, symbol, value) in &self.events {
                    tables[*context].write_symbol(&mut w, *symbol)?;
                    let (_, size) = token_parts(*symbol);
                    rle::write_magnitude(&mut w, *value, size)?;
                }
            }
            Mode::Ans => {
                let tables: Vec<_> = self.counts.iter().map(|c| ans::AnsTable::from_counts(c)).collect();
                for t in &tables {
                    t.serialize(&mut w)?;
                }
                let mut header = w.finish();

                let mut per_context_symbols: Vec<Vec<u16>> = vec![Vec::new(); tables.len()];
                let mut magnitudes = BitWriter::new();
                for (context, symbol, value) in &self.events {
                    per_context_symbols[*context].push(*symbol);
                    let (_, size) = token_parts(*symbol);
                    rle::write_magnitude(&mut magnitudes, *value, size)?;
                }
                let magnitude_bytes = magnitudes.finish();

                for (context, symbols) in per_context_symbols.iter().enumerate() {
                    let blob = ans::encode(&tables[context], symbols);
                    header.extend_from_slice(&(blob.len() as u32).to_le_bytes());
                    header.extend_from_slice(&blob);
                }
                header.extend_from_slice(&magnitude_bytes);
                return Ok(header);
            }
        }

        Ok(w.finish())
    }
}

/// Reads back a stream written by [`Encoder`], replaying the same `push_block` call sequence.
pub struct Decoder<'a> {
    backend: Backend,
    reader: BitReader<'a>,
    ans_streams: Vec<AnsStream<'a>>,
}

struct AnsStream<'a> {
    decoder: ans::AnsDecoder<'a>,
}

impl<'a> Decoder<'a> {
    pub fn new(bytes: &'a [u8], num_contexts: usize) -> Result<Self> {
        let mut r = BitReader::new(bytes);
        let use_ans = r.read_bool()?;

        if !use_ans {
            let mut tables = Vec::with_capacity(num_contexts);
            for _ in 0..num_contexts {
                tables.push(prefix::PrefixTable::parse_lengths(&mut r)?);
            }
            return Ok(Self {
                backend: Backend::Prefix(tables),
                reader: r,
                ans_streams: Vec::new(),
            });
        }

        let mut tables = Vec::with_capacity(num_contexts);
        for _ in 0..num_contexts {
            tables.push(ans::AnsTable::parse(&mut r)?);
        }
        r.byte_align()?;
        let mut cursor = r.byte_offset();

        // The header (mode bit + tables) is followed by one length-prefixed rANS blob per
        // context, then the byte-aligned magnitude bitstream covering the rest of the buffer.
        let mut ans_streams = Vec::with_capacity(num_contexts);
        for _ in 0..num_contexts {
            let len = u32::from_le_bytes(bytes[cursor..cursor + 4].try_into().unwrap()) as usize;
            cursor += 4;
            let blob = &bytes[cursor..cursor + len];
            cursor += len;
            ans_streams.push(AnsStream {
                decoder: ans::AnsDecoder::new(blob)?,
            });
        }

        Ok(Self {
            backend: Backend::Ans(tables),
            reader: BitReader::new(&bytes[cursor..]),
            ans_streams,
        })
    }

    pub fn read_block(&mut self, context: usize, len: usize) -> Result<Vec<i32>> {
        let mut tokens = Vec::new();
        loop {
            let symbol = match &self.backend {
                Backend::Prefix(tables) => tables[context].read_symbol(&mut self.reader)?,
                Backend::Ans(tables) => self.ans_streams[context].decoder.read_symbol(&tables[context]),
            };
            let (run, size) = token_parts(symbol);
            let value = rle::read_magnitude(&mut self.reader, size)?;
            let is_eob = size == 0 && run == 0;
            tokens.push((symbol, value));
            if is_eob {
                break;
            }
            let consumed: usize = tokens.iter().map(|&(s, _)| token_parts(s).0 as usize + 1).sum();
            if consumed >= len {
                break;
            }
        }
        Ok(rle::detokenize(&tokens, len))
    }
}

fn token_parts(symbol: u16) -> (u32, u32) {
    let symbol = symbol as u32;
    (symbol / rle::SIZE_CLASSES, symbol % rle::SIZE_CLASSES)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn round_trip(mode: Mode) {
        let model = ContextModel::new(1);
        let mut enc = Encoder::new(mode, model.num_contexts());

        let mut block_a = vec![0i32; 64];
        block_a[0] = 5;
        block_a[3] = -2;
        let mut block_b = vec![0i32; 64];
        block_b[0] = -9;
        block_b[10] = 1;

        let ctx = model.context_of(0, Band::Dc);
        enc.push_block(ctx, &block_a).unwrap();
        enc.push_block(ctx, &block_b).unwrap();

        let bytes = enc.finish().unwrap();
        let mut dec = Decoder::new(&bytes, model.num_contexts()).unwrap();
        let out_a = dec.read_block(ctx, 64).unwrap();
        let out_b = dec.read_block(ctx, 64).unwrap();
        assert_eq!(out_a, block_a);
        assert_eq!(out_b, block_b);
    }

    #[test]
    fn run_length_prefix_round_trips() {
        round_trip(Mode::RunLengthPrefix);
    }

    #[test]
    fn ans_round_trips() {
        round_trip(Mode::Ans);
    }

    #[test]
    fn rejects_out_of_range_context() {
        let mut enc = Encoder::new(Mode::RunLengthPrefix, 1);
        assert!(matches!(enc.push_block(3, &[0i32; 8]), Err(Error::InvalidContext(3))));
    }
}
