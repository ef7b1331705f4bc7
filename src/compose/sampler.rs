use std::collections::BTreeMap;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;

use crate::{
    catalog::model::{Element, Layer},
    compose::choice::Choice,
    foundation::core::EditionIndex,
    foundation::error::{LoomError, LoomResult},
};

/// Source of uniform draws in `[0, 1)`.
pub trait DrawSource {
    /// Next uniform value in `[0, 1)`.
    fn next_unit(&mut self) -> f64;
}

/// Reproducible draw source backed by ChaCha20.
#[derive(Clone, Debug)]
pub struct SeededDraw {
    rng: ChaCha20Rng,
}

impl SeededDraw {
    /// Seeded stream; equal seeds yield equal draws.
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha20Rng::seed_from_u64(seed),
        }
    }

    /// Stream seeded from system entropy.
    pub fn from_entropy() -> Self {
        Self {
            rng: ChaCha20Rng::from_entropy(),
        }
    }
}

impl DrawSource for SeededDraw {
    fn next_unit(&mut self) -> f64 {
        self.rng.r#gen::<f64>()
    }
}

/// Scripted draws, cycled in order. An empty script always yields `0.0`.
#[derive(Clone, Debug, Default)]
pub struct FixedDraws {
    values: Vec<f64>,
    next: usize,
}

impl FixedDraws {
    /// Cycle through `values`.
    pub fn new(values: Vec<f64>) -> Self {
        Self { values, next: 0 }
    }
}

impl DrawSource for FixedDraws {
    fn next_unit(&mut self) -> f64 {
        if self.values.is_empty() {
            return 0.0;
        }
        let v = self.values[self.next % self.values.len()];
        self.next = self.next.wrapping_add(1);
        v
    }
}

/// Cumulative-weight pick over `elements` minus `excluded` names.
///
/// `unit` is a uniform draw in `[0, 1)` scaled by the total eligible weight; the element at
/// which the running remainder turns negative wins. Returns `None` when nothing survives the
/// exclusion or the total weight is not positive.
pub fn weighted_pick<'a>(
    elements: &'a [Element],
    excluded: &[String],
    unit: f64,
) -> Option<&'a Element> {
    let eligible: Vec<&Element> = elements
        .iter()
        .filter(|e| !excluded.iter().any(|x| x == &e.name))
        .collect();
    let total: f64 = eligible.iter().map(|e| e.weight).sum();
    if eligible.is_empty() || !(total.is_finite() && total > 0.0) {
        return None;
    }

    let mut remaining = unit.clamp(0.0, 1.0 - f64::EPSILON) * total;
    for &element in &eligible {
        remaining -= element.weight;
        if remaining < 0.0 {
            return Some(element);
        }
    }
    // Rounding can leave a zero remainder after the last element.
    eligible.last().copied()
}

/// Strategy that selects one element per layer.
pub trait Sampler {
    /// Called before the first sample of every edition attempt.
    fn begin_edition(&mut self, _edition: EditionIndex) {}

    /// Select one element of `layer` whose name is not in `excluded`.
    fn sample(&mut self, layer: &Layer, excluded: &[String]) -> LoomResult<Choice>;

    /// Called after an attempt for `edition` was rejected; the next attempt must re-sample.
    fn reject_attempt(&mut self, _edition: EditionIndex) {}
}

impl<S: Sampler + ?Sized> Sampler for &mut S {
    fn begin_edition(&mut self, edition: EditionIndex) {
        (**self).begin_edition(edition);
    }

    fn sample(&mut self, layer: &Layer, excluded: &[String]) -> LoomResult<Choice> {
        (**self).sample(layer, excluded)
    }

    fn reject_attempt(&mut self, edition: EditionIndex) {
        (**self).reject_attempt(edition);
    }
}

impl<S: Sampler + ?Sized> Sampler for Box<S> {
    fn begin_edition(&mut self, edition: EditionIndex) {
        (**self).begin_edition(edition);
    }

    fn sample(&mut self, layer: &Layer, excluded: &[String]) -> LoomResult<Choice> {
        (**self).sample(layer, excluded)
    }

    fn reject_attempt(&mut self, edition: EditionIndex) {
        (**self).reject_attempt(edition);
    }
}

/// Rarity-weighted sampler.
#[derive(Clone, Debug)]
pub struct WeightedSampler<D = SeededDraw> {
    draw: D,
}

impl<D: DrawSource> WeightedSampler<D> {
    /// Sampler drawing from `draw`.
    pub fn new(draw: D) -> Self {
        Self { draw }
    }
}

impl WeightedSampler<SeededDraw> {
    /// Sampler seeded with `seed`, or from entropy when `None`.
    pub fn seeded(seed: Option<u64>) -> Self {
        match seed {
            Some(seed) => Self::new(SeededDraw::new(seed)),
            None => Self::new(SeededDraw::from_entropy()),
        }
    }
}

impl<D: DrawSource> Sampler for WeightedSampler<D> {
    fn sample(&mut self, layer: &Layer, excluded: &[String]) -> LoomResult<Choice> {
        let unit = self.draw.next_unit();
        let element = weighted_pick(&layer.elements, excluded, unit).ok_or_else(|| {
            LoomError::exhaustion(format!(
                "layer '{}' has no eligible element after excluding {:?}",
                layer.name, excluded
            ))
        })?;
        Ok(Choice::from_element(layer, element))
    }
}

/// Regenerate-with-overrides sampler.
///
/// For editions with a recorded preset, layers named in the preset take the recorded element;
/// everything else (and preset values that are currently excluded) falls back to the wrapped
/// sampler. A rejected attempt drops the edition's preset so retries draw fresh choices.
#[derive(Clone, Debug)]
pub struct ReplaySampler<S> {
    presets: BTreeMap<EditionIndex, BTreeMap<String, String>>,
    current: Option<BTreeMap<String, String>>,
    fallback: S,
}

impl<S: Sampler> ReplaySampler<S> {
    /// Wrap `fallback` with no presets.
    pub fn new(fallback: S) -> Self {
        Self {
            presets: BTreeMap::new(),
            current: None,
            fallback,
        }
    }

    /// Record the layer → element-name preset for `edition`.
    pub fn with_preset(mut self, edition: EditionIndex, preset: BTreeMap<String, String>) -> Self {
        self.presets.insert(edition, preset);
        self
    }

    /// Number of editions with a preset.
    pub fn preset_count(&self) -> usize {
        self.presets.len()
    }
}

impl<S: Sampler> Sampler for ReplaySampler<S> {
    fn begin_edition(&mut self, edition: EditionIndex) {
        self.current = self.presets.get(&edition).cloned();
        self.fallback.begin_edition(edition);
    }

    fn sample(&mut self, layer: &Layer, excluded: &[String]) -> LoomResult<Choice> {
        let recorded = self
            .current
            .as_ref()
            .and_then(|p| p.get(&layer.name))
            .filter(|name| !excluded.iter().any(|x| x == *name));

        match recorded {
            Some(name) => {
                let element = layer.element_by_name(name).ok_or_else(|| {
                    LoomError::configuration(format!(
                        "replay preset selects unknown element '{name}' in layer '{}'",
                        layer.name
                    ))
                })?;
                Ok(Choice::from_element(layer, element))
            }
            None => self.fallback.sample(layer, excluded),
        }
    }

    fn reject_attempt(&mut self, edition: EditionIndex) {
        if self.presets.remove(&edition).is_some() {
            tracing::debug!(
                edition = edition.0,
                "replay preset rejected, falling back to fresh draws"
            );
        }
        self.current = None;
        self.fallback.reject_attempt(edition);
    }
}

#[cfg(test)]
#[path = "../../tests/unit/compose/sampler.rs"]
mod tests;
