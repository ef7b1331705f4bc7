use std::collections::BTreeMap;

use crate::{
    catalog::model::LayerCatalog,
    compose::choice::ChoiceSet,
    compose::conflict::{self, ConflictRule},
    compose::dna::{self, Dna},
    compose::invalid::{InvalidCombination, find_invalid},
    compose::layering::{LayeringException, order_layers},
    compose::registry::UniquenessRegistry,
    compose::sampler::Sampler,
    compose::strategy::StrategyRegistry,
    config::model::LayerConfiguration,
    foundation::core::EditionIndex,
    foundation::error::{LoomError, LoomResult},
    metadata::attributes::{Attribute, project},
    output::sink::EditionSink,
};

/// One accepted artwork.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct Edition {
    /// Edition number.
    pub index: EditionIndex,
    /// Resolved per-layer choices.
    pub choices: ChoiceSet,
    /// Canonical identifier.
    pub dna: Dna,
    /// Final draw order, bottom layer first.
    pub draw_order: Vec<String>,
    /// Projected metadata attributes.
    pub attributes: Vec<Attribute>,
}

/// Everything the composer needs to generate editions from one configuration block.
#[derive(Clone, Debug)]
pub struct CompositionPlan {
    /// Layers in catalog order.
    pub catalog: LayerCatalog,
    /// Replace/remove rules.
    pub conflict_rules: Vec<ConflictRule>,
    /// Alternate draw orders.
    pub layering_exceptions: Vec<LayeringException>,
    /// Combinations rejected at validation.
    pub invalid_combinations: Vec<InvalidCombination>,
    /// Locator overrides applied while encoding.
    pub strategies: StrategyRegistry,
}

impl CompositionPlan {
    /// Plan with no rules.
    pub fn new(catalog: LayerCatalog) -> Self {
        Self {
            catalog,
            conflict_rules: Vec::new(),
            layering_exceptions: Vec::new(),
            invalid_combinations: Vec::new(),
            strategies: StrategyRegistry::new(),
        }
    }

    /// Combine a configuration block with its scanned catalog, checking every reference.
    pub fn from_config(block: &LayerConfiguration, catalog: LayerCatalog) -> LoomResult<Self> {
        block.validate()?;
        catalog.validate()?;
        conflict::check_rules(&block.conflict_rules, &catalog)?;
        Ok(Self {
            strategies: StrategyRegistry::from_specs(&block.layers_order)?,
            conflict_rules: block.conflict_rules.clone(),
            layering_exceptions: block.layering_exceptions.clone(),
            invalid_combinations: block.invalid_combinations.clone(),
            catalog,
        })
    }

    /// Catalog order, used when no layering exception matches.
    pub fn default_order(&self) -> Vec<String> {
        self.catalog.names()
    }

    /// Decode `dna` produced under this plan, recovering its draw order as well.
    ///
    /// Tries the default order and every exception order; the first whose decoded choices
    /// would have produced that same order wins.
    pub fn decode(&self, dna: &Dna) -> LoomResult<(ChoiceSet, Vec<String>)> {
        let default = self.default_order();
        let candidates =
            std::iter::once(&default).chain(self.layering_exceptions.iter().map(|e| &e.layers));
        let mut last_err = None;
        for order in candidates {
            match dna::decode(dna, &self.catalog, order) {
                Ok(choices) => {
                    if &order_layers(&choices, &default, &self.layering_exceptions)? == order {
                        return Ok((choices, order.clone()));
                    }
                }
                Err(e) => last_err = Some(e),
            }
        }
        Err(last_err.unwrap_or_else(|| {
            LoomError::validation(format!(
                "DNA '{dna}' does not match any draw order of this configuration"
            ))
        }))
    }
}

/// Sequential edition generator.
///
/// Owns the uniqueness registry and the list of accepted editions; both only grow, and only
/// after the sink has accepted an edition.
#[derive(Debug, Default)]
pub struct TraitComposer {
    registry: UniquenessRegistry,
    editions: Vec<Edition>,
    failure_tolerance: Option<u64>,
    value_labels: BTreeMap<String, String>,
    rejected: u64,
}

impl TraitComposer {
    /// Composer that never aborts on repeated rejections.
    pub fn new() -> Self {
        Self::default()
    }

    /// Abort an edition after `tolerance` rejected attempts; `None` retries forever.
    pub fn with_failure_tolerance(mut self, tolerance: Option<u64>) -> Self {
        self.failure_tolerance = tolerance;
        self
    }

    /// Element-name to display-value table used for attributes.
    pub fn with_value_labels(mut self, labels: BTreeMap<String, String>) -> Self {
        self.value_labels = labels;
        self
    }

    /// Accepted editions in generation order.
    pub fn editions(&self) -> &[Edition] {
        &self.editions
    }

    /// Consume the composer, returning accepted editions.
    pub fn into_editions(self) -> Vec<Edition> {
        self.editions
    }

    /// Registry of accepted uniqueness keys.
    pub fn registry(&self) -> &UniquenessRegistry {
        &self.registry
    }

    /// Total rejected attempts across all editions so far.
    pub fn rejected_attempts(&self) -> u64 {
        self.rejected
    }

    /// Generate, validate and hand off edition `index`, retrying rejected attempts.
    #[tracing::instrument(level = "debug", skip_all, fields(edition = index.0))]
    pub fn compose_edition<S, K>(
        &mut self,
        index: EditionIndex,
        plan: &CompositionPlan,
        sampler: &mut S,
        sink: &mut K,
    ) -> LoomResult<&Edition>
    where
        S: Sampler + ?Sized,
        K: EditionSink + ?Sized,
    {
        let mut failures = 0u64;
        loop {
            match self.attempt(index, plan, &mut *sampler) {
                Ok(edition) => {
                    sink.accept(&edition, &plan.catalog)?;
                    self.registry.admit(&edition.dna);
                    tracing::info!(edition = index.0, dna = %edition.dna, "edition accepted");
                    self.editions.push(edition);
                    let last = self.editions.len() - 1;
                    return Ok(&self.editions[last]);
                }
                Err(e) if e.is_recoverable() => {
                    failures += 1;
                    self.rejected += 1;
                    sampler.reject_attempt(index);
                    tracing::debug!(edition = index.0, attempt = failures, error = %e, "attempt rejected");
                    if let Some(tolerance) = self.failure_tolerance
                        && failures >= tolerance
                    {
                        tracing::warn!(
                            edition = index.0,
                            attempts = failures,
                            "failure tolerance exceeded"
                        );
                        return Err(LoomError::ToleranceExceeded {
                            edition: index.0,
                            attempts: failures,
                        });
                    }
                }
                Err(e) => return Err(e),
            }
        }
    }

    fn attempt<S: Sampler + ?Sized>(
        &self,
        index: EditionIndex,
        plan: &CompositionPlan,
        sampler: &mut S,
    ) -> LoomResult<Edition> {
        sampler.begin_edition(index);

        let mut choices = ChoiceSet::new();
        for layer in &plan.catalog.layers {
            choices.insert(sampler.sample(layer, &[])?);
        }

        let choices = conflict::resolve(choices, &plan.conflict_rules, &plan.catalog, sampler)?;
        choices.check_complete(&plan.catalog)?;

        let draw_order = order_layers(&choices, &plan.default_order(), &plan.layering_exceptions)?;
        let dna = dna::encode(&choices, &draw_order, &plan.strategies)?;

        if let Some(combo) = find_invalid(&choices, &plan.invalid_combinations) {
            return Err(LoomError::invalid_combination(combo.to_string()));
        }
        if !self.registry.is_unique(&dna) {
            return Err(LoomError::DuplicateEdition {
                key: dna.uniqueness_key(),
            });
        }

        let attributes = project(&choices, &plan.catalog, &self.value_labels);
        Ok(Edition {
            index,
            choices,
            dna,
            draw_order,
            attributes,
        })
    }
}

#[cfg(test)]
#[path = "../../tests/unit/compose/composer.rs"]
mod tests;
