//! The shared context model: coefficients are partitioned by `(channel, zigzag band, DC/AC)`,
//! per spec §4.7. Both entropy backends key their per-context histograms off the same
//! `ContextModel`.

/// Which zigzag band a coefficient token belongs to.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Band {
    Dc,
    AcLow,
    AcHigh,
}

impl Band {
    /// Classifies a zigzag position within an 8x8 block (DC at index 0, low-frequency AC for the
    /// first quarter of AC indices, high-frequency AC beyond that).
    pub fn from_zigzag_index(index: usize) -> Self {
        if index == 0 {
            Self::Dc
        } else if index < 16 {
            Self::AcLow
        } else {
            Self::AcHigh
        }
    }
}

/// Maps `(channel, band)` pairs to a dense context index in `0..num_contexts()`.
#[derive(Debug, Clone, Copy)]
pub struct ContextModel {
    num_channels: usize,
}

const BANDS_PER_CHANNEL: usize = 3;

impl ContextModel {
    pub fn new(num_channels: usize) -> Self {
        Self { num_channels }
    }

    pub fn num_contexts(&self) -> usize {
        self.num_channels * BANDS_PER_CHANNEL
    }

    pub fn context_of(&self, channel: usize, band: Band) -> usize {
        debug_assert!(channel < self.num_channels);
        channel * BANDS_PER_CHANNEL
            + match band {
                Band::Dc => 0,
                Band::AcLow => 1,
                Band::AcHigh => 2,
            }
    }
}
