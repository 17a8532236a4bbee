//! Fixed per-sample predictors over the left/top/top-left neighborhood, selected once per
//! channel by the encoder and written to the bitstream for the decoder to mirror.

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
#[repr(u8)]
pub enum Predictor {
    Zero = 0,
    West = 1,
    North = 2,
    AvgWestNorth = 3,
    /// MED / LOCO-I gradient predictor: clamps `w + n - nw` to the range spanned by `w` and `n`.
    Gradient = 4,
}

pub const NUM_PREDICTORS: usize = 5;

impl Predictor {
    pub fn from_index(index: u8) -> Option<Self> {
        use Predictor::*;
        Some(match index {
            0 => Zero,
            1 => West,
            2 => North,
            3 => AvgWestNorth,
            4 => Gradient,
            _ => return None,
        })
    }

    pub fn index(self) -> u8 {
        self as u8
    }

    pub fn all() -> [Predictor; NUM_PREDICTORS] {
        [
            Predictor::Zero,
            Predictor::West,
            Predictor::North,
            Predictor::AvgWestNorth,
            Predictor::Gradient,
        ]
    }

    /// Predicts a sample from its already-reconstructed west (`w`), north (`n`), and north-west
    /// (`nw`) neighbors. Out-of-bounds neighbors are supplied by the caller using image-edge
    /// replication, matching the teacher's row/column boundary handling.
    pub fn predict(self, w: i32, n: i32, nw: i32) -> i32 {
        use Predictor::*;
        match self {
            Zero => 0,
            West => w,
            North => n,
            AvgWestNorth => ((w as i64 + n as i64) / 2) as i32,
            Gradient => {
                let (w, n, nw) = (w as i64, n as i64, nw as i64);
                (w + n - nw).clamp(w.min(n), w.max(n)) as i32
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gradient_clamps_to_neighbor_range() {
        assert_eq!(Predictor::Gradient.predict(10, 12, 100), 10);
        assert_eq!(Predictor::Gradient.predict(10, 12, 0), 12);
        assert_eq!(Predictor::Gradient.predict(10, 12, 5), 17);
    }

    #[test]
    fn from_index_round_trips() {
        for p in Predictor::all() {
            assert_eq!(Predictor::from_index(p.index()), Some(p));
        }
    }
}
