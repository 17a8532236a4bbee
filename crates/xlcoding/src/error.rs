#[derive(Debug)]
#[non_exhaustive]
pub enum Error {
    Bitstream(xlbit::Error),
    /// A context index was outside `0..num_contexts`.
    InvalidContext(usize),
    /// A serialized frequency table did not sum to the expected total.
    InvalidHistogram,
    /// The rANS stream's final state did not match the expected sentinel.
    AnsVerificationFailed,
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Bitstream(e) => Some(e),
            _ => None,
        }
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Bitstream(e) => write!(f, "{e}"),
            Self::InvalidContext(id) => write!(f, "context index {id} out of range"),
            Self::InvalidHistogram => write!(f, "frequency table did not sum to the expected total"),
            Self::AnsVerificationFailed => write!(f, "rANS stream final state mismatch"),
        }
    }
}

impl From<xlbit::Error> for Error {
    fn from(e: xlbit::Error) -> Self {
        Self::Bitstream(e)
    }
}

pub type Result<T> = std::result::Result<T, Error>;
