#[derive(Debug)]
#[non_exhaustive]
pub enum Error {
    Bitstream(xlbit::Error),
    Coding(xlcoding::Error),
    Modular(xlmodular::Error),
    VarDct(xlvardct::Error),
    /// A section's declared length ran past the end of the buffer.
    TruncatedSection,
    /// Animation frames disagreed on width, height, pixel type, or color channel count.
    InconsistentFrames,
    /// More than one frame was submitted to the sequencer without an animation configuration.
    MissingConfiguration,
    /// A bitstream field named a value this crate doesn't implement.
    UnsupportedFeature(&'static str),
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

impl From<xlmodular::Error> for Error {
    fn from(err: xlmodular::Error) -> Self {
        Self::Modular(err)
    }
}

impl From<xlvardct::Error> for Error {
    fn from(err: xlvardct::Error) -> Self {
        Self::VarDct(err)
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        use Error::*;

        match self {
            Bitstream(err) => write!(f, "bitstream error: {err}"),
            Coding(err) => write!(f, "entropy decoder error: {err}"),
            Modular(err) => write!(f, "modular stream error: {err}"),
            VarDct(err) => write!(f, "vardct error: {err}"),
            TruncatedSection => write!(f, "section length prefix exceeds remaining bytes"),
            InconsistentFrames => write!(f, "animation frames disagree on dimensions, pixel type, or channel count"),
            MissingConfiguration => write!(f, "multiple frames submitted without an animation configuration"),
            UnsupportedFeature(what) => write!(f, "unsupported feature: {what}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        use Error::*;

        match self {
            Bitstream(err) => Some(err),
            Coding(err) => Some(err),
            Modular(err) => Some(err),
            VarDct(err) => Some(err),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
