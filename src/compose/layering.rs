use std::collections::BTreeSet;

use crate::{
    compose::choice::ChoiceSet,
    foundation::error::{LoomError, LoomResult},
};

#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
/// Exact `{trait, value}` trigger of a layering exception.
pub struct ExceptionTrigger {
    /// Layer name.
    #[serde(rename = "trait")]
    pub trait_name: String,
    /// Element name that triggers the exception.
    #[serde(alias = "variant")]
    pub value: String,
}

#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
/// Alternate draw order used when `exception` matches.
pub struct LayeringException {
    /// Trigger condition.
    pub exception: ExceptionTrigger,
    /// Full alternate draw order; a permutation of the default order.
    #[serde(deserialize_with = "de_layer_names")]
    pub layers: Vec<String>,
}

/// Accept both `["bg", ...]` and `[{"name": "bg"}, ...]`.
fn de_layer_names<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(serde::Deserialize)]
    #[serde(untagged)]
    enum Entry {
        Name(String),
        Obj { name: String },
    }

    let entries: Vec<Entry> = serde::Deserialize::deserialize(deserializer)?;
    Ok(entries
        .into_iter()
        .map(|e| match e {
            Entry::Name(n) | Entry::Obj { name: n } => n,
        })
        .collect())
}

impl LayeringException {
    /// Return `true` when the trigger matches `choices`.
    pub fn matches(&self, choices: &ChoiceSet) -> bool {
        choices.element_name(&self.exception.trait_name) == Some(self.exception.value.as_str())
    }

    /// Ensure `layers` names exactly the layers of `default_order`.
    pub fn check_layer_set(&self, default_order: &[String]) -> LoomResult<()> {
        let expected: BTreeSet<&str> = default_order.iter().map(String::as_str).collect();
        let actual: BTreeSet<&str> = self.layers.iter().map(String::as_str).collect();
        if expected != actual || self.layers.len() != default_order.len() {
            return Err(LoomError::configuration(format!(
                "layering exception for {}={} must reorder exactly the layers {:?}, got {:?}",
                self.exception.trait_name, self.exception.value, default_order, self.layers
            )));
        }
        Ok(())
    }
}

/// Determine the draw order for `choices`.
///
/// The first matching exception wins and supplies the full order; with no match the default
/// order is returned unchanged.
pub fn order_layers(
    choices: &ChoiceSet,
    default_order: &[String],
    exceptions: &[LayeringException],
) -> LoomResult<Vec<String>> {
    let Some(exception) = exceptions.iter().find(|e| e.matches(choices)) else {
        return Ok(default_order.to_vec());
    };
    exception.check_layer_set(default_order)?;
    tracing::debug!(
        trait_name = %exception.exception.trait_name,
        value = %exception.exception.value,
        "layering exception applied"
    );
    Ok(exception.layers.clone())
}

#[cfg(test)]
#[path = "../../tests/unit/compose/layering.rs"]
mod tests;
