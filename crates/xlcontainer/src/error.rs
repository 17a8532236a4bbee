#[derive(Debug)]
#[non_exhaustive]
pub enum Error {
    /// Signature box payload did not match `0x0D 0x0A 0x87 0x0A`.
    SignatureMismatch,
    /// A box header or payload ran past the end of the buffer.
    Truncated,
    /// Declared box size was inconsistent with the remaining buffer.
    InvalidBoxSize,
    /// No `jxlc`/`jxlp` box was present.
    MissingCodestream,
}

impl std::error::Error for Error {}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::SignatureMismatch => write!(f, "container signature box did not match the JPEG XL magic"),
            Self::Truncated => write!(f, "box header or payload truncated"),
            Self::InvalidBoxSize => write!(f, "invalid box size"),
            Self::MissingCodestream => write!(f, "container has no jxlc/jxlp box"),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
