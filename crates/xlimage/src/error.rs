#[derive(Debug)]
#[non_exhaustive]
pub enum Error {
    Bitstream(xlbit::Error),
    Color(xlcolor::Error),
    /// Width/height is zero, or exceeds 2^30.
    InvalidDimensions,
    /// Bit depth is outside `[1, 32]`, or mismatched with the declared pixel type.
    InvalidBitDepth,
    /// EXIF orientation tag outside `1..=8`.
    InvalidOrientation,
    /// Color channel count outside `{1, 3}`, or more than 255 extra channels.
    UnsupportedChannelCount,
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Bitstream(e) => Some(e),
            Self::Color(e) => Some(e),
            _ => None,
        }
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Bitstream(e) => write!(f, "{e}"),
            Self::Color(e) => write!(f, "{e}"),
            Self::InvalidDimensions => write!(f, "width/height is zero or exceeds 2^30"),
            Self::InvalidBitDepth => write!(f, "bit depth outside [1, 32] or mismatched with pixel type"),
            Self::InvalidOrientation => write!(f, "orientation outside 1..=8"),
            Self::UnsupportedChannelCount => {
                write!(f, "color channel count not in {{1, 3}}, or too many extra channels")
            }
        }
    }
}

impl From<xlbit::Error> for Error {
    fn from(e: xlbit::Error) -> Self {
        Self::Bitstream(e)
    }
}

impl From<xlcolor::Error> for Error {
    fn from(e: xlcolor::Error) -> Self {
        Self::Color(e)
    }
}

pub type Result<T> = std::result::Result<T, Error>;
