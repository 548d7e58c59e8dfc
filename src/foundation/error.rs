/// Convenience result type used across the engine.
pub type VersusResult<T> = Result<T, VersusError>;

/// Top-level error taxonomy used by engine APIs.
///
/// All configuration problems are detected eagerly at clip/timeline
/// construction time; nothing in this taxonomy is raised lazily mid-render
/// except [`VersusError::Encoding`], which surfaces failures from the
/// external encoder boundary.
#[derive(thiserror::Error, Debug)]
pub enum VersusError {
    /// Zero-area or undecodable source image.
    #[error("invalid image: {0}")]
    InvalidImage(String),

    /// A layer interval falls outside the scene duration.
    #[error("out of bounds: {0}")]
    OutOfBounds(String),

    /// Non-positive durations, frame rates or animation windows that cannot
    /// be clamped safely.
    #[error("invalid timing: {0}")]
    InvalidTiming(String),

    /// Failure surfaced by the external encoder boundary. Fatal; the engine
    /// does not retry or emit partial output.
    #[error("encoding error: {0}")]
    Encoding(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl VersusError {
    /// Build a [`VersusError::InvalidImage`] value.
    pub fn invalid_image(msg: impl Into<String>) -> Self {
        Self::InvalidImage(msg.into())
    }

    /// Build a [`VersusError::OutOfBounds`] value.
    pub fn out_of_bounds(msg: impl Into<String>) -> Self {
        Self::OutOfBounds(msg.into())
    }

    /// Build a [`VersusError::InvalidTiming`] value.
    pub fn invalid_timing(msg: impl Into<String>) -> Self {
        Self::InvalidTiming(msg.into())
    }

    /// Build a [`VersusError::Encoding`] value.
    pub fn encoding(msg: impl Into<String>) -> Self {
        Self::Encoding(msg.into())
    }
}
