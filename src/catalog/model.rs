use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use crate::{
    compose::dna::{DNA_DELIMITER, ID_SEPARATOR, QUERY_PREFIX},
    foundation::core::ElementId,
    foundation::error::{LoomError, LoomResult},
};

/// Name of the neutral element used by "remove" conflict rules when a layer does not override it.
pub const DEFAULT_NEUTRAL_ELEMENT: &str = "None";

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "kebab-case")]
/// Blend mode used when compositing a layer over the layers below it.
pub enum BlendMode {
    /// Standard "source over destination".
    #[default]
    #[serde(alias = "normal")]
    SourceOver,
    /// Channel-wise product.
    Multiply,
    /// Inverse product of inverses.
    Screen,
    /// Channel-wise minimum.
    Darken,
    /// Channel-wise maximum.
    Lighten,
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
/// One selectable asset variant within a layer.
pub struct Element {
    /// Identifier, unique within the owning layer (discovery order).
    pub id: ElementId,
    /// Semantic name with any rarity suffix stripped.
    pub name: String,
    /// Asset reference relative to the layer directory.
    pub locator: String,
    /// Rarity weight; positive and finite.
    pub weight: f64,
}

impl Element {
    /// Build an element.
    pub fn new(
        id: u32,
        name: impl Into<String>,
        locator: impl Into<String>,
        weight: f64,
    ) -> Self {
        Self {
            id: ElementId(id),
            name: name.into(),
            locator: locator.into(),
            weight,
        }
    }
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
/// An ordered position in the composite, holding its candidate elements.
pub struct Layer {
    /// Trait key.
    pub name: String,
    /// Label used for the metadata attribute.
    pub display_name: String,
    /// Candidate elements in discovery order.
    pub elements: Vec<Element>,
    /// Leave this layer's token out of the uniqueness key.
    #[serde(default)]
    pub bypass_uniqueness: bool,
    /// Contribute an attribute but never render.
    #[serde(default)]
    pub metadata_only: bool,
    /// Render but never emit an attribute.
    #[serde(default)]
    pub artwork_only: bool,
    /// Compositing blend mode.
    #[serde(default)]
    pub blend: BlendMode,
    /// Compositing opacity in `[0, 1]`.
    #[serde(default = "default_opacity")]
    pub opacity: f64,
    /// Element forced by "remove" conflict rules; defaults to [`DEFAULT_NEUTRAL_ELEMENT`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub neutral_element: Option<String>,
}

fn default_opacity() -> f64 {
    1.0
}

impl Layer {
    /// Build a layer with default flags and render options.
    pub fn new(name: impl Into<String>, elements: Vec<Element>) -> Self {
        let name = name.into();
        Self {
            display_name: name.clone(),
            name,
            elements,
            bypass_uniqueness: false,
            metadata_only: false,
            artwork_only: false,
            blend: BlendMode::default(),
            opacity: default_opacity(),
            neutral_element: None,
        }
    }

    /// Lookup an element by id.
    pub fn element_by_id(&self, id: ElementId) -> Option<&Element> {
        self.elements.iter().find(|e| e.id == id)
    }

    /// Lookup an element by name.
    pub fn element_by_name(&self, name: &str) -> Option<&Element> {
        self.elements.iter().find(|e| e.name == name)
    }

    /// Resolve the neutral element used by "remove" conflict rules.
    ///
    /// The default name matches case-insensitively so `none.png` and `None.png` both qualify.
    pub fn neutral(&self) -> LoomResult<&Element> {
        let found = match &self.neutral_element {
            Some(name) => self.element_by_name(name),
            None => self
                .elements
                .iter()
                .find(|e| e.name.eq_ignore_ascii_case(DEFAULT_NEUTRAL_ELEMENT)),
        };
        found.ok_or_else(|| {
            LoomError::configuration(format!(
                "layer '{}' has no neutral element '{}' required by a remove rule",
                self.name,
                self.neutral_element
                    .as_deref()
                    .unwrap_or(DEFAULT_NEUTRAL_ELEMENT)
            ))
        })
    }

    /// Validate element and option invariants for this layer.
    pub fn validate(&self) -> LoomResult<()> {
        if self.name.trim().is_empty() {
            return Err(LoomError::configuration("layer name must be non-empty"));
        }
        if self.elements.is_empty() {
            return Err(LoomError::configuration(format!(
                "layer '{}' has zero elements",
                self.name
            )));
        }
        if !self.opacity.is_finite() || !(0.0..=1.0).contains(&self.opacity) {
            return Err(LoomError::configuration(format!(
                "layer '{}' opacity must be within [0, 1]",
                self.name
            )));
        }
        if self.metadata_only && self.artwork_only {
            return Err(LoomError::configuration(format!(
                "layer '{}' cannot be both metadata_only and artwork_only",
                self.name
            )));
        }

        let mut ids = BTreeSet::new();
        for element in &self.elements {
            if !ids.insert(element.id) {
                return Err(LoomError::configuration(format!(
                    "layer '{}' has duplicate element id {}",
                    self.name, element.id
                )));
            }
            if !element.weight.is_finite() || element.weight <= 0.0 {
                return Err(LoomError::configuration(format!(
                    "element '{}' in layer '{}' must have a positive weight",
                    element.name, self.name
                )));
            }
            check_reserved(&element.name, "element name", &self.name)?;
            check_reserved(&element.locator, "element locator", &self.name)?;
        }
        Ok(())
    }
}

fn check_reserved(value: &str, field: &str, layer: &str) -> LoomResult<()> {
    if value.is_empty() {
        return Err(LoomError::configuration(format!(
            "{field} in layer '{layer}' must be non-empty"
        )));
    }
    if value.contains(DNA_DELIMITER) || value.contains(QUERY_PREFIX) {
        return Err(LoomError::configuration(format!(
            "{field} '{value}' in layer '{layer}' contains a reserved DNA character \
             ('{DNA_DELIMITER}' or '{QUERY_PREFIX}')"
        )));
    }
    if field == "element name" && value.contains(ID_SEPARATOR) {
        return Err(LoomError::configuration(format!(
            "{field} '{value}' in layer '{layer}' must not contain '{ID_SEPARATOR}'"
        )));
    }
    Ok(())
}

#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
/// Ordered layers of one layer configuration, as discovered by the asset catalog.
pub struct LayerCatalog {
    /// Directory holding one sub-directory per layer; empty for in-memory catalogs.
    #[serde(default)]
    pub root: PathBuf,
    /// Layers in declared (catalog) order.
    pub layers: Vec<Layer>,
}

impl LayerCatalog {
    /// Build an in-memory catalog.
    pub fn new(layers: Vec<Layer>) -> Self {
        Self {
            root: PathBuf::new(),
            layers,
        }
    }

    /// Lookup a layer by name.
    pub fn layer(&self, name: &str) -> Option<&Layer> {
        self.layers.iter().find(|l| l.name == name)
    }

    /// Lookup a layer by name, failing with a configuration error when absent.
    pub fn require(&self, name: &str) -> LoomResult<&Layer> {
        self.layer(name).ok_or_else(|| {
            LoomError::configuration(format!("unknown layer '{name}' referenced by configuration"))
        })
    }

    /// Layer names in catalog order (the default draw order).
    pub fn names(&self) -> Vec<String> {
        self.layers.iter().map(|l| l.name.clone()).collect()
    }

    /// Absolute path of an element locator inside this catalog.
    pub fn asset_path(&self, layer: &str, locator: &str) -> PathBuf {
        self.root.join(Path::new(layer)).join(Path::new(locator))
    }

    /// Validate layer invariants and name uniqueness.
    pub fn validate(&self) -> LoomResult<()> {
        if self.layers.is_empty() {
            return Err(LoomError::configuration("layer catalog must not be empty"));
        }
        let mut names = BTreeSet::new();
        for layer in &self.layers {
            layer.validate()?;
            if !names.insert(layer.name.as_str()) {
                return Err(LoomError::configuration(format!(
                    "layer '{}' is declared twice",
                    layer.name
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/catalog/model.rs"]
mod tests;
