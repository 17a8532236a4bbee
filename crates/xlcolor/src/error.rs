#[derive(Debug)]
#[non_exhaustive]
pub enum Error {
    Bitstream(xlbit::Error),
    InvalidEnum { name: &'static str, value: u32 },
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Bitstream(e) => Some(e),
            Self::InvalidEnum { .. } => None,
        }
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Bitstream(e) => write!(f, "{e}"),
            Self::InvalidEnum { name, value } => {
                write!(f, "enum {name} has no variant for value {value}")
            }
        }
    }
}

impl From<xlbit::Error> for Error {
    fn from(e: xlbit::Error) -> Self {
        Self::Bitstream(e)
    }
}

pub type Result<T> = std::result::Result<T, Error>;
