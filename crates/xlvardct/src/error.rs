#[derive(Debug)]
#[non_exhaustive]
pub enum Error {
    Bitstream(xlbit::Error),
    Coding(xlcoding::Error),
    /// A plane's sample count doesn't match its declared width/height.
    DimensionMismatch,
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
            Bitstream(err) => write!(f, "bitstream error: {err}"),
            Coding(err) => write!(f, "entropy decoder error: {err}"),
            DimensionMismatch => write!(f, "plane dimensions don't match sample count"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        use Error::*;

        match self {
            Bitstream(err) => Some(err),
            Coding(err) => Some(err),
            DimensionMismatch => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
