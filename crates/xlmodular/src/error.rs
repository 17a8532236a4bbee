#[derive(Debug)]
#[non_exhaustive]
pub enum Error {
    /// A channel header named a predictor index outside the known set.
    InvalidPredictor(u8),
    /// A channel's declared dimensions don't match the residual stream length.
    DimensionMismatch,
    Bitstream(xlbit::Error),
    Coding(xlcoding::Error),
}

impl From<xlbit::Error> for Error {
    fn from(err: xlbit::Error) -> Self {
        Self::Bitstream(err)
    }
}

impl From<xlcoding::Error> for Error {
    fn from(err: xlcoding::Error) -> Self {
        Self::Coding(err)
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        use Error::*;

        match self {
            InvalidPredictor(idx) => write!(f, "invalid predictor index {idx}"),
            DimensionMismatch => write!(f, "channel dimensions don't match residual stream length"),
            Bitstream(err) => write!(f, "bitstream error: {err}"),
            Coding(err) => write!(f, "entropy decoder error: {err}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        use Error::*;

        match self {
            Bitstream(err) => Some(err),
            Coding(err) => Some(err),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
