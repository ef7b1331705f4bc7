use crate::compose::choice::ChoiceSet;

#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
/// One `{trait, variant}` member of an invalid combination.
pub struct CombinationPair {
    /// Layer name.
    #[serde(rename = "trait")]
    pub trait_name: String,
    /// Element name.
    #[serde(alias = "value")]
    pub variant: String,
}

#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
/// Trait/variant pairs that must never all appear in one edition.
pub struct InvalidCombination(pub Vec<CombinationPair>);

impl InvalidCombination {
    /// Return `true` when every pair is selected in `choices`.
    pub fn matches(&self, choices: &ChoiceSet) -> bool {
        !self.0.is_empty()
            && self
                .0
                .iter()
                .all(|p| choices.element_name(&p.trait_name) == Some(p.variant.as_str()))
    }
}

impl std::fmt::Display for InvalidCombination {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (i, pair) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(" + ")?;
            }
            write!(f, "{}={}", pair.trait_name, pair.variant)?;
        }
        Ok(())
    }
}

/// First declared combination fully present in `choices`.
pub fn find_invalid<'a>(
    choices: &ChoiceSet,
    combos: &'a [InvalidCombination],
) -> Option<&'a InvalidCombination> {
    combos.iter().find(|c| c.matches(choices))
}

#[cfg(test)]
#[path = "../../tests/unit/compose/invalid.rs"]
mod tests;
