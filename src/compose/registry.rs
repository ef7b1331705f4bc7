use std::collections::HashSet;

use crate::compose::dna::Dna;

/// Set of uniqueness keys of accepted editions.
///
/// Membership is exact string equality of [`Dna::uniqueness_key`]. Keys are only ever added.
#[derive(Clone, Debug, Default)]
pub struct UniquenessRegistry {
    keys: HashSet<String>,
}

impl UniquenessRegistry {
    /// Empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Return `true` when no accepted edition shares `dna`'s uniqueness key.
    pub fn is_unique(&self, dna: &Dna) -> bool {
        !self.keys.contains(&dna.uniqueness_key())
    }

    /// Record an accepted edition. Returns `false` if its key was already present.
    pub fn admit(&mut self, dna: &Dna) -> bool {
        self.keys.insert(dna.uniqueness_key())
    }

    /// Return `true` when `key` is registered.
    pub fn contains_key(&self, key: &str) -> bool {
        self.keys.contains(key)
    }

    /// Number of registered keys.
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Return `true` when nothing has been admitted.
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/compose/registry.rs"]
mod tests;
