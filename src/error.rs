//! The stable, user-visible error taxonomy surfaced at the encode/decode boundary. Every
//! sub-crate error folds into one of these variants; none of them are swallowed internally.

#[derive(Debug)]
#[non_exhaustive]
pub enum Error {
    /// Width/height is zero, or exceeds 2^30.
    InvalidDimensions,
    /// Bit depth is outside `[1, 32]`, or mismatched with the declared pixel type.
    InvalidBitDepth,
    /// EXIF orientation tag outside `1..=8`.
    InvalidOrientation,
    /// Color channel count outside `{1, 3}`, or more than 255 extra channels.
    UnsupportedChannelCount,
    /// Container signature mismatch, truncated box, or missing required brand.
    InvalidContainer,
    /// Unexpected end of bitstream, header-field domain violation, or bad entropy symbol.
    CorruptedBitstream,
    /// Animation frames disagreed on dimensions, pixel type, or channel count.
    InconsistentFrames,
    /// A bitstream field named a feature this implementation does not cover.
    UnsupportedFeature(&'static str),
    /// Multiple frames were submitted without an animation configuration.
    MissingConfiguration,
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidDimensions => write!(f, "width/height is zero or exceeds 2^30"),
            Self::InvalidBitDepth => write!(f, "bit depth outside [1, 32] or mismatched with pixel type"),
            Self::InvalidOrientation => write!(f, "orientation outside 1..=8"),
            Self::UnsupportedChannelCount => write!(f, "color channel count not in {{1, 3}}, or too many extra channels"),
            Self::InvalidContainer => write!(f, "container signature, box layout, or required brand is invalid"),
            Self::CorruptedBitstream => write!(f, "bitstream ended unexpectedly or violated a field's domain"),
            Self::InconsistentFrames => write!(f, "animation frames disagree on dimensions, pixel type, or channel count"),
            Self::UnsupportedFeature(what) => write!(f, "unsupported feature: {what}"),
            Self::MissingConfiguration => write!(f, "multiple frames submitted without an animation configuration"),
        }
    }
}

impl std::error::Error for Error {}

impl From<xlimage::Error> for Error {
    fn from(e: xlimage::Error) -> Self {
        match e {
            xlimage::Error::InvalidDimensions => Self::InvalidDimensions,
            xlimage::Error::InvalidBitDepth => Self::InvalidBitDepth,
            xlimage::Error::InvalidOrientation => Self::InvalidOrientation,
            xlimage::Error::UnsupportedChannelCount => Self::UnsupportedChannelCount,
            xlimage::Error::Bitstream(_) => Self::CorruptedBitstream,
            xlimage::Error::Color(_) => Self::CorruptedBitstream,
            _ => Self::CorruptedBitstream,
        }
    }
}

impl From<xlcolor::Error> for Error {
    fn from(_: xlcolor::Error) -> Self {
        Self::CorruptedBitstream
    }
}

impl From<xlbit::Error> for Error {
    fn from(_: xlbit::Error) -> Self {
        Self::CorruptedBitstream
    }
}

impl From<xlcontainer::Error> for Error {
    fn from(_: xlcontainer::Error) -> Self {
        Self::InvalidContainer
    }
}

impl From<xlframe::Error> for Error {
    fn from(e: xlframe::Error) -> Self {
        match e {
            xlframe::Error::InconsistentFrames => Self::InconsistentFrames,
            xlframe::Error::MissingConfiguration => Self::MissingConfiguration,
            xlframe::Error::UnsupportedFeature(what) => Self::UnsupportedFeature(what),
            xlframe::Error::Bitstream(_)
            | xlframe::Error::Coding(_)
            | xlframe::Error::Modular(_)
            | xlframe::Error::VarDct(_)
            | xlframe::Error::TruncatedSection => Self::CorruptedBitstream,
            _ => Self::CorruptedBitstream,
        }
    }
}

impl From<xlvardct::Error> for Error {
    fn from(_: xlvardct::Error) -> Self {
        Self::CorruptedBitstream
    }
}

impl From<xlmodular::Error> for Error {
    fn from(_: xlmodular::Error) -> Self {
        Self::CorruptedBitstream
    }
}

impl From<xlcoding::Error> for Error {
    fn from(_: xlcoding::Error) -> Self {
        Self::CorruptedBitstream
    }
}

pub type Result<T> = std::result::Result<T, Error>;
