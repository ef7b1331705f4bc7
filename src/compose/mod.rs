//! Trait composition: sampling, conflict resolution, draw ordering, DNA encoding and uniqueness.
//!
//! [`composer::TraitComposer`] drives one edition at a time through these stages.

/// Per-layer selection outcomes.
pub mod choice;
/// Sequential per-edition state machine.
pub mod composer;
/// Replace-then-remove conflict rules.
pub mod conflict;
/// DNA encoding and decoding.
pub mod dna;
/// Static invalid trait combinations.
pub mod invalid;
/// Draw-order exceptions.
pub mod layering;
/// Accepted uniqueness keys.
pub mod registry;
/// Weighted and replay samplers.
pub mod sampler;
/// Locator override strategies.
pub mod strategy;
