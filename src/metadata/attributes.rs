use std::collections::BTreeMap;

use crate::{catalog::model::LayerCatalog, compose::choice::ChoiceSet};

#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
/// One `{trait_type, value}` metadata attribute.
pub struct Attribute {
    /// Layer display name.
    #[serde(alias = "trait")]
    pub trait_type: String,
    /// Element name, or its human-readable label.
    pub value: String,
}

/// Project a resolved choice set into metadata attributes.
///
/// Attributes follow catalog order and skip `artwork_only` layers. `labels` maps element names
/// to display values; unlabeled names pass through.
pub fn project(
    choices: &ChoiceSet,
    catalog: &LayerCatalog,
    labels: &BTreeMap<String, String>,
) -> Vec<Attribute> {
    catalog
        .layers
        .iter()
        .filter(|layer| !layer.artwork_only)
        .filter_map(|layer| {
            let name = choices.element_name(&layer.name)?;
            Some(Attribute {
                trait_type: layer.display_name.clone(),
                value: labels.get(name).cloned().unwrap_or_else(|| name.to_string()),
            })
        })
        .collect()
}

/// Invert [`project`] into a layer → element-name replay preset.
///
/// Attributes that do not map back to a catalog layer and element are skipped, so the replay
/// sampler falls back to a fresh draw for them.
pub fn preset_from_attributes(
    attributes: &[Attribute],
    catalog: &LayerCatalog,
    labels: &BTreeMap<String, String>,
) -> BTreeMap<String, String> {
    let mut out = BTreeMap::new();
    for attr in attributes {
        let Some(layer) = catalog
            .layers
            .iter()
            .find(|l| l.display_name == attr.trait_type)
        else {
            continue;
        };
        let element = layer.element_by_name(&attr.value).or_else(|| {
            labels
                .iter()
                .filter(|(_, label)| **label == attr.value)
                .find_map(|(name, _)| layer.element_by_name(name))
        });
        if let Some(element) = element {
            out.insert(layer.name.clone(), element.name.clone());
        }
    }
    out
}

#[cfg(test)]
#[path = "../../tests/unit/metadata/attributes.rs"]
mod tests;
