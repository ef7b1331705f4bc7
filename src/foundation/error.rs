/// Convenience result type used across layerloom.
pub type LoomResult<T> = Result<T, LoomError>;

/// Top-level error taxonomy used by engine APIs.
///
/// `DuplicateEdition` and `InvalidCombination` are recoverable: the composer retries the
/// edition with a fresh sample. Everything else halts the run.
#[derive(thiserror::Error, Debug)]
pub enum LoomError {
    /// Authoring mistake in layer configuration or catalog data.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The sampler had no eligible element to choose from.
    #[error("exhaustion error: {0}")]
    Exhaustion(String),

    /// The uniqueness key of a candidate edition is already registered.
    #[error("duplicate edition: uniqueness key '{key}' already registered")]
    DuplicateEdition {
        /// Offending uniqueness key.
        key: String,
    },

    /// A candidate edition contains a statically forbidden trait combination.
    #[error("invalid combination: {0}")]
    InvalidCombination(String),

    /// Too many rejected attempts for a single edition.
    #[error(
        "failure tolerance exceeded at edition {edition} after {attempts} attempts; add layers or elements to grow the collection"
    )]
    ToleranceExceeded {
        /// Edition index being generated when the run aborted.
        edition: u64,
        /// Number of rejected attempts.
        attempts: u64,
    },

    /// Malformed input data (DNA strings, metadata files).
    #[error("validation error: {0}")]
    Validation(String),

    /// Errors when serializing or deserializing data structures.
    #[error("serialization error: {0}")]
    Serde(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl LoomError {
    /// Build a [`LoomError::Configuration`] value.
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    /// Build a [`LoomError::Exhaustion`] value.
    pub fn exhaustion(msg: impl Into<String>) -> Self {
        Self::Exhaustion(msg.into())
    }

    /// Build a [`LoomError::InvalidCombination`] value.
    pub fn invalid_combination(msg: impl Into<String>) -> Self {
        Self::InvalidCombination(msg.into())
    }

    /// Build a [`LoomError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`LoomError::Serde`] value.
    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }

    /// Return `true` for errors the composer handles by retrying the edition.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::DuplicateEdition { .. } | Self::InvalidCombination(_)
        )
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
