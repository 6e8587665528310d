use thiserror::Error;

/// Odometry trail error types
///
/// None of these are fatal: the accumulator records them in its status and
/// keeps consuming the stream.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TrailError {
    #[error("Malformed sample: {0}")]
    MalformedSample(String),

    #[error("Glyph backend unavailable: {0}")]
    GlyphUnavailable(String),

    #[error("Configuration value out of range: {0}")]
    ConfigOutOfRange(String),

    #[error("Accumulator lock poisoned")]
    LockPoisoned,

    #[error("Stream error: {0}")]
    Stream(String),
}

pub type TrailResult<T> = Result<T, TrailError>;
