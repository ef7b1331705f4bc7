//! Edition compositing.
//!
//! The renderer only sees resolved file paths, blend modes and opacities; it never consults the
//! conflict or ordering rules.

/// Per-pixel blend modes.
pub mod blend;
/// Background colors.
pub mod color;
/// CPU compositor and render requests.
pub mod cpu;
