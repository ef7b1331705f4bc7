use std::collections::BTreeMap;

use crate::{
    catalog::model::{Element, Layer, LayerCatalog},
    foundation::core::ElementId,
    foundation::error::{LoomError, LoomResult},
};

#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
/// Outcome of selecting one element for one layer within one edition.
pub struct Choice {
    /// Layer the element belongs to.
    pub layer: String,
    /// Selected element id (unique within `layer`).
    pub element_id: ElementId,
    /// Selected element name.
    pub element_name: String,
    /// Asset locator, possibly overridden by a locator strategy after decoding.
    pub locator: String,
    /// Copied from the layer flag; tags the DNA token.
    pub bypass_uniqueness: bool,
}

impl Choice {
    /// Build the choice selecting `element` in `layer`.
    pub fn from_element(layer: &Layer, element: &Element) -> Self {
        Self {
            layer: layer.name.clone(),
            element_id: element.id,
            element_name: element.name.clone(),
            locator: element.locator.clone(),
            bypass_uniqueness: layer.bypass_uniqueness,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
/// Per-layer selection outcome for one edition, keyed by layer name.
pub struct ChoiceSet {
    choices: BTreeMap<String, Choice>,
}

impl ChoiceSet {
    /// Create an empty choice set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite the choice for `choice.layer`, returning the previous one.
    pub fn insert(&mut self, choice: Choice) -> Option<Choice> {
        self.choices.insert(choice.layer.clone(), choice)
    }

    /// Choice for `layer`, if any.
    pub fn get(&self, layer: &str) -> Option<&Choice> {
        self.choices.get(layer)
    }

    /// Selected element name for `layer`, if any.
    pub fn element_name(&self, layer: &str) -> Option<&str> {
        self.choices.get(layer).map(|c| c.element_name.as_str())
    }

    /// Number of layers with a choice.
    pub fn len(&self) -> usize {
        self.choices.len()
    }

    /// Return `true` when no layer has a choice.
    pub fn is_empty(&self) -> bool {
        self.choices.is_empty()
    }

    /// Iterate choices in layer-name order.
    pub fn iter(&self) -> impl Iterator<Item = &Choice> {
        self.choices.values()
    }

    /// Layer name to element name view, as used by replay presets.
    pub fn to_names(&self) -> BTreeMap<String, String> {
        self.choices
            .iter()
            .map(|(layer, c)| (layer.clone(), c.element_name.clone()))
            .collect()
    }

    /// Ensure there is exactly one choice per catalog layer and nothing else.
    pub fn check_complete(&self, catalog: &LayerCatalog) -> LoomResult<()> {
        for layer in &catalog.layers {
            if !self.choices.contains_key(&layer.name) {
                return Err(LoomError::configuration(format!(
                    "choice set is missing layer '{}'",
                    layer.name
                )));
            }
        }
        if self.choices.len() != catalog.layers.len() {
            let extra = self
                .choices
                .keys()
                .find(|k| catalog.layer(k).is_none())
                .cloned()
                .unwrap_or_default();
            return Err(LoomError::configuration(format!(
                "choice set references unknown layer '{extra}'"
            )));
        }
        Ok(())
    }
}

impl FromIterator<Choice> for ChoiceSet {
    fn from_iter<T: IntoIterator<Item = Choice>>(iter: T) -> Self {
        let mut out = Self::new();
        for choice in iter {
            out.insert(choice);
        }
        out
    }
}
