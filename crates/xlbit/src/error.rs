#[derive(Debug)]
#[non_exhaustive]
pub enum Error {
    /// Reader ran out of bits before the requested count could be consumed.
    UnexpectedEof,
    /// A field read outside the domain the specification allows for it.
    ValidationFailed(&'static str),
    /// `byte_align` on the reader found non-zero padding bits.
    NonZeroPadding,
    /// A parsed value couldn't be represented by the target enum.
    InvalidEnum { name: &'static str, value: u32 },
    /// Requested more than 32 bits in a single primitive read/write.
    FieldTooWide(usize),
}

impl std::error::Error for Error {}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnexpectedEof => write!(f, "unexpected end of bitstream"),
            Self::ValidationFailed(msg) => write!(f, "bitstream validation failed: {msg}"),
            Self::NonZeroPadding => write!(f, "byte_align read non-zero padding bits"),
            Self::InvalidEnum { name, value } => {
                write!(f, "enum {name} has no variant for value {value}")
            }
            Self::FieldTooWide(n) => write!(f, "field width {n} exceeds 32 bits"),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
