//! JSON project configuration.

/// Configuration model and validation.
pub mod model;
