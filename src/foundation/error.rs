/// Convenience result type used across the generator.
pub type MmnistResult<T> = Result<T, MmnistError>;

/// Top-level error taxonomy used by library APIs.
#[derive(thiserror::Error, Debug)]
pub enum MmnistError {
    /// Invalid user-provided configuration or arguments.
    #[error("validation error: {0}")]
    Validation(String),

    /// Malformed source image/label data.
    #[error("source data error: {0}")]
    Source(String),

    /// A sprite has no pixel above the brightness threshold, so it has no tight bbox.
    #[error("empty sprite: digit {label} has no pixel above the brightness threshold")]
    EmptySprite {
        /// Label of the offending digit.
        label: u8,
    },

    /// Inconsistent dataset contents on disk.
    #[error("dataset error: {0}")]
    Dataset(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl MmnistError {
    /// Build a [`MmnistError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`MmnistError::Source`] value.
    pub fn source(msg: impl Into<String>) -> Self {
        Self::Source(msg.into())
    }

    /// Build a [`MmnistError::Dataset`] value.
    pub fn dataset(msg: impl Into<String>) -> Self {
        Self::Dataset(msg.into())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
