//! Metadata attributes and per-network records.

/// Attribute projection and its replay inverse.
pub mod attributes;
/// Ethereum and Solana metadata records.
pub mod record;
