//! Layerloom generates collections of unique layered artworks.
//!
//! A run samples one element per layer under rarity weights, resolves conflicts between trait
//! choices, picks the layer draw order, encodes the result as a canonical DNA string and rejects
//! repeats:
//!
//! - Load a [`ProjectConfig`] and scan one [`LayerCatalog`] per configuration block
//! - Drive [`generate`] with a [`Sampler`] and an [`EditionSink`]
//! - Decode DNA back into choices with [`CompositionPlan::decode`]
#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod foundation;

/// Asset catalogs.
pub mod catalog;
/// Trait composition engine.
pub mod compose;
/// Project configuration.
pub mod config;
/// Metadata attributes and records.
pub mod metadata;
/// Edition sinks.
pub mod output;
/// Run driver.
pub mod pipeline;
/// Compositing.
pub mod render;

pub use crate::foundation::core::{Canvas, EditionIndex, ElementId};
pub use crate::foundation::error::{LoomError, LoomResult};

pub use crate::catalog::model::{BlendMode, Element, Layer, LayerCatalog};
pub use crate::catalog::scan::build_catalog;
pub use crate::compose::choice::{Choice, ChoiceSet};
pub use crate::compose::composer::{CompositionPlan, Edition, TraitComposer};
pub use crate::compose::dna::Dna;
pub use crate::compose::registry::UniquenessRegistry;
pub use crate::compose::sampler::{
    DrawSource, FixedDraws, ReplaySampler, Sampler, SeededDraw, WeightedSampler,
};
pub use crate::compose::strategy::{LocatorStrategy, StrategyRegistry, StrategySpec};
pub use crate::config::model::{Network, ProjectConfig};
pub use crate::metadata::attributes::Attribute;
pub use crate::metadata::record::MetadataRecord;
pub use crate::output::build_dir::BuildDirSink;
pub use crate::output::sink::{EditionSink, InMemorySink};
pub use crate::pipeline::{GenerateReport, generate, load_catalogs};
pub use crate::render::cpu::{CpuRenderer, RenderBackend, RenderRequest};
