//! Run driver: configuration blocks in, accepted editions out.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use anyhow::Context;
use rand::SeedableRng;
use rand::seq::SliceRandom;
use rand_chacha::ChaCha20Rng;

use crate::{
    catalog::model::LayerCatalog,
    catalog::scan::build_catalog,
    compose::composer::{CompositionPlan, Edition, TraitComposer},
    compose::sampler::{ReplaySampler, Sampler},
    config::model::ProjectConfig,
    foundation::core::EditionIndex,
    foundation::error::{LoomError, LoomResult},
    metadata::attributes::preset_from_attributes,
    metadata::record::MetadataRecord,
    output::sink::EditionSink,
};

/// Outcome of a completed run.
#[derive(Clone, Debug)]
pub struct GenerateReport {
    /// Accepted editions in generation order.
    pub editions: Vec<Edition>,
    /// Rejected attempts (duplicates and invalid combinations) across the run.
    pub rejected_attempts: u64,
}

/// Scan `layers_dir` once per configuration block.
pub fn load_catalogs(project: &ProjectConfig, layers_dir: &Path) -> LoomResult<Vec<LayerCatalog>> {
    project
        .layer_configurations
        .iter()
        .map(|block| build_catalog(layers_dir, &block.layers_order, &project.rarity_delimiter))
        .collect()
}

/// Edition numbers in the order they are handed out.
///
/// Numbering starts at the network's first edition; with `shuffle_layer_configurations` the
/// numbers are permuted so blocks interleave across the collection. The shuffle draws from its
/// own ChaCha stream so it does not disturb trait sampling.
pub fn edition_indexes(project: &ProjectConfig) -> Vec<EditionIndex> {
    let first = project.network.first_edition();
    let mut out: Vec<EditionIndex> = (first..first + project.total_editions())
        .map(EditionIndex)
        .collect();
    if project.shuffle_layer_configurations {
        let mut rng = match project.seed {
            Some(seed) => ChaCha20Rng::seed_from_u64(seed),
            None => ChaCha20Rng::from_entropy(),
        };
        rng.set_stream(1);
        out.shuffle(&mut rng);
    }
    out
}

/// Generate the whole collection.
///
/// `catalogs` holds one catalog per configuration block. Blocks run in order, each growing the
/// collection to its `grow_edition_size_to`. The sink sees `begin`, every accepted edition, then
/// `end`.
pub fn generate<S, K>(
    project: &ProjectConfig,
    catalogs: Vec<LayerCatalog>,
    sink: &mut K,
    sampler: &mut S,
) -> LoomResult<GenerateReport>
where
    S: Sampler + ?Sized,
    K: EditionSink + ?Sized,
{
    project.validate()?;
    if catalogs.len() != project.layer_configurations.len() {
        return Err(LoomError::configuration(format!(
            "expected {} layer catalogs, got {}",
            project.layer_configurations.len(),
            catalogs.len()
        )));
    }
    let plans = project
        .layer_configurations
        .iter()
        .zip(catalogs)
        .map(|(block, catalog)| CompositionPlan::from_config(block, catalog))
        .collect::<LoomResult<Vec<_>>>()?;

    let indexes = edition_indexes(project);
    let mut composer = TraitComposer::new()
        .with_failure_tolerance(project.unique_dna_tolerance)
        .with_value_labels(project.value_labels.clone());

    sink.begin()?;
    let mut produced = 0u64;
    for (block_idx, (block, plan)) in project.layer_configurations.iter().zip(&plans).enumerate() {
        tracing::info!(
            block = block_idx,
            grow_to = block.grow_edition_size_to,
            layers = plan.catalog.layers.len(),
            "starting layer configuration"
        );
        while produced < block.grow_edition_size_to {
            let index = usize::try_from(produced)
                .ok()
                .and_then(|i| indexes.get(i).copied())
                .ok_or_else(|| {
                    LoomError::configuration(format!("no edition number left for edition {produced}"))
                })?;
            composer.compose_edition(index, plan, &mut *sampler, &mut *sink)?;
            produced += 1;
        }
    }
    sink.end()?;

    let rejected_attempts = composer.rejected_attempts();
    tracing::info!(
        editions = produced,
        rejected = rejected_attempts,
        "collection generated"
    );
    Ok(GenerateReport {
        editions: composer.into_editions(),
        rejected_attempts,
    })
}

/// Read a collection metadata array written by a previous run.
pub fn read_metadata(path: &Path) -> LoomResult<Vec<MetadataRecord>> {
    let f = File::open(path).with_context(|| format!("open metadata '{}'", path.display()))?;
    serde_json::from_reader(BufReader::new(f))
        .map_err(|e| LoomError::serde(format!("parse metadata '{}': {e}", path.display())))
}

/// Build a replay sampler whose presets come from previously written records.
///
/// Each record is matched against every catalog and keeps the preset that resolves the most
/// layers.
pub fn replay_sampler<S: Sampler>(
    records: &[MetadataRecord],
    catalogs: &[LayerCatalog],
    project: &ProjectConfig,
    fallback: S,
) -> ReplaySampler<S> {
    records.iter().fold(ReplaySampler::new(fallback), |sampler, record| {
        let preset = catalogs
            .iter()
            .map(|c| preset_from_attributes(record.attributes(), c, &project.value_labels))
            .max_by_key(|p| p.len())
            .unwrap_or_default();
        sampler.with_preset(record.edition(), preset)
    })
}
