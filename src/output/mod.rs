//! Edition sinks.
//!
//! Sinks receive accepted editions in generation order.

/// `build/` directory writer.
pub mod build_dir;
/// Sink trait and the in-memory sink.
pub mod sink;
