use crate::{
    catalog::model::LayerCatalog,
    compose::choice::{Choice, ChoiceSet},
    compose::sampler::Sampler,
    foundation::error::{LoomError, LoomResult},
};

/// Wildcard value matching any present choice.
pub const WILDCARD: &str = "*";

#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
/// How a matching conflict rule changes the affected trait.
pub enum Resolution {
    /// Re-sample the affected layer, excluding the affected condition's values.
    Replace,
    /// Force the affected layer to its neutral element.
    Remove,
}

#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(from = "RawMatch", into = "RawMatch")]
/// Value side of a trait condition.
pub enum TraitMatch {
    /// `"*"`: any choice for the layer.
    Any,
    /// Any of these element names.
    Values(Vec<String>),
}

#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
#[serde(untagged)]
enum RawMatch {
    One(String),
    Many(Vec<String>),
}

impl From<RawMatch> for TraitMatch {
    fn from(raw: RawMatch) -> Self {
        match raw {
            RawMatch::One(v) if v == WILDCARD => Self::Any,
            RawMatch::One(v) => Self::Values(vec![v]),
            RawMatch::Many(vs) => Self::Values(vs),
        }
    }
}

impl From<TraitMatch> for RawMatch {
    fn from(m: TraitMatch) -> Self {
        match m {
            TraitMatch::Any => Self::One(WILDCARD.to_string()),
            TraitMatch::Values(mut vs) if vs.len() == 1 => Self::One(vs.remove(0)),
            TraitMatch::Values(vs) => Self::Many(vs),
        }
    }
}

impl TraitMatch {
    /// Match against the element name currently chosen for the layer.
    pub fn matches(&self, chosen: Option<&str>) -> bool {
        match (self, chosen) {
            (_, None) => false,
            (Self::Any, Some(_)) => true,
            (Self::Values(vs), Some(name)) => vs.iter().any(|v| v == name),
        }
    }

    /// Declared values; empty for the wildcard.
    pub fn values(&self) -> &[String] {
        match self {
            Self::Any => &[],
            Self::Values(vs) => vs,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
/// `{trait, value}` pair evaluated against a choice set.
pub struct TraitCondition {
    /// Layer name.
    #[serde(rename = "trait")]
    pub trait_name: String,
    /// Matching value(s).
    pub value: TraitMatch,
}

impl TraitCondition {
    /// Return `true` when the condition holds for `choices`.
    pub fn matches(&self, choices: &ChoiceSet) -> bool {
        self.value.matches(choices.element_name(&self.trait_name))
    }
}

#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
/// Declarative constraint between two traits: `traits[0]` triggers, `traits[1]` is affected.
pub struct ConflictRule {
    /// Resolution applied when the rule matches.
    pub resolution: Resolution,
    /// Trigger and affected conditions.
    pub traits: [TraitCondition; 2],
}

/// Apply replace rules, then remove rules, to a tentative choice set.
///
/// Replace rules run once each in declaration order and see earlier replacements; a
/// replacement never re-triggers rules that were already evaluated. Remove rules then react to
/// the final values. Only the choice set changes; `catalog` is read-only.
pub fn resolve<S: Sampler + ?Sized>(
    mut choices: ChoiceSet,
    rules: &[ConflictRule],
    catalog: &LayerCatalog,
    sampler: &mut S,
) -> LoomResult<ChoiceSet> {
    for (idx, rule) in rules.iter().enumerate() {
        if rule.resolution != Resolution::Replace {
            continue;
        }
        let [trigger, affected] = &rule.traits;
        if !trigger.matches(&choices) {
            continue;
        }
        let layer = catalog.require(&affected.trait_name)?;
        let replacement = sampler.sample(layer, affected.value.values())?;
        log_substitution(idx, "replace", choices.get(&layer.name), &replacement);
        choices.insert(replacement);
    }

    for (idx, rule) in rules.iter().enumerate() {
        if rule.resolution != Resolution::Remove {
            continue;
        }
        let [trigger, affected] = &rule.traits;
        if !(trigger.matches(&choices) && affected.matches(&choices)) {
            continue;
        }
        let layer = catalog.require(&affected.trait_name)?;
        let neutral = layer.neutral()?;
        let removal = Choice::from_element(layer, neutral);
        if choices.get(&layer.name) == Some(&removal) {
            continue;
        }
        log_substitution(idx, "remove", choices.get(&layer.name), &removal);
        choices.insert(removal);
    }

    Ok(choices)
}

fn log_substitution(rule: usize, kind: &str, before: Option<&Choice>, after: &Choice) {
    tracing::info!(
        rule,
        kind,
        layer = %after.layer,
        from = before.map(|c| c.element_name.as_str()).unwrap_or("<unset>"),
        to = %after.element_name,
        "conflict rule applied"
    );
}

/// Check that every layer referenced by `rules` exists in `catalog`.
pub fn check_rules(rules: &[ConflictRule], catalog: &LayerCatalog) -> LoomResult<()> {
    for (idx, rule) in rules.iter().enumerate() {
        for cond in &rule.traits {
            if catalog.layer(&cond.trait_name).is_none() {
                return Err(LoomError::configuration(format!(
                    "conflict rule {idx} references unknown layer '{}'",
                    cond.trait_name
                )));
            }
        }
    }
    Ok(())
}

#[cfg(test)]
#[path = "../../tests/unit/compose/conflict.rs"]
mod tests;
