//! Layer catalogs: weighted elements discovered from asset directories.

/// Catalog data model.
pub mod model;
/// Directory scanning.
pub mod scan;
