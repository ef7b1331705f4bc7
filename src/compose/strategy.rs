use std::collections::BTreeMap;
use std::sync::Arc;

use crate::{
    compose::choice::{Choice, ChoiceSet},
    compose::layering::ExceptionTrigger,
    config::model::LayerSpec,
    foundation::error::{LoomError, LoomResult},
};

/// Placeholder that expands to the element's default locator.
pub const LOCATOR_PLACEHOLDER: &str = "locator";

/// Pure function of the full choice set that may yield an alternate locator.
pub trait LocatorStrategy: Send + Sync + std::fmt::Debug {
    /// Alternate locator, or `None` to keep the default.
    fn resolve(&self, default_locator: &str, choices: &ChoiceSet) -> Option<String>;
}

#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
/// Data-configured template strategy.
///
/// `{layer}` expands to that layer's chosen element name, `{locator}` to the default locator.
/// With `when`, the strategy only applies while that trait has that value.
pub struct StrategySpec {
    /// Optional guard.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub when: Option<ExceptionTrigger>,
    /// Locator template.
    pub template: String,
}

impl StrategySpec {
    /// Template-only strategy.
    pub fn template(template: impl Into<String>) -> Self {
        Self {
            when: None,
            template: template.into(),
        }
    }

    /// Layers read by this strategy (placeholders and guard).
    pub fn referenced_layers(&self) -> Vec<String> {
        let mut out: Vec<String> = placeholders(&self.template)
            .into_iter()
            .filter(|p| p != LOCATOR_PLACEHOLDER)
            .collect();
        if let Some(when) = &self.when {
            out.push(when.trait_name.clone());
        }
        out.sort();
        out.dedup();
        out
    }
}

impl LocatorStrategy for StrategySpec {
    fn resolve(&self, default_locator: &str, choices: &ChoiceSet) -> Option<String> {
        if let Some(when) = &self.when
            && choices.element_name(&when.trait_name) != Some(when.value.as_str())
        {
            return None;
        }

        let mut out = String::with_capacity(self.template.len());
        let mut rest = self.template.as_str();
        while let Some(open) = rest.find('{') {
            out.push_str(&rest[..open]);
            let after = &rest[open + 1..];
            let close = after.find('}')?;
            let key = &after[..close];
            if key == LOCATOR_PLACEHOLDER {
                out.push_str(default_locator);
            } else {
                out.push_str(choices.element_name(key)?);
            }
            rest = &after[close + 1..];
        }
        out.push_str(rest);
        Some(out)
    }
}

fn placeholders(template: &str) -> Vec<String> {
    let mut out = Vec::new();
    let mut rest = template;
    while let Some(open) = rest.find('{') {
        let after = &rest[open + 1..];
        let Some(close) = after.find('}') else {
            break;
        };
        out.push(after[..close].to_string());
        rest = &after[close + 1..];
    }
    out
}

/// Named strategy lookup keyed by `(layer, element)` for variant overrides and by layer for
/// static overrides.
#[derive(Clone, Debug, Default)]
pub struct StrategyRegistry {
    variant: BTreeMap<(String, String), Arc<dyn LocatorStrategy>>,
    fixed: BTreeMap<String, Arc<dyn LocatorStrategy>>,
}

impl StrategyRegistry {
    /// Empty registry; every locator stays at its default.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the registry declared by layer options.
    pub fn from_specs(specs: &[LayerSpec]) -> LoomResult<Self> {
        let mut out = Self::new();
        for spec in specs {
            for (element, strategy) in &spec.options.variant_locator_overrides {
                if strategy.template.trim().is_empty() {
                    return Err(LoomError::configuration(format!(
                        "locator override for '{}/{element}' has an empty template",
                        spec.name
                    )));
                }
                out.register_variant(&spec.name, element, Arc::new(strategy.clone()));
            }
            if let Some(strategy) = &spec.options.static_locator_override {
                out.register_static(&spec.name, Arc::new(strategy.clone()));
            }
        }
        Ok(out)
    }

    /// Register a strategy used when `layer` selects `element`.
    pub fn register_variant(
        &mut self,
        layer: &str,
        element: &str,
        strategy: Arc<dyn LocatorStrategy>,
    ) {
        self.variant
            .insert((layer.to_string(), element.to_string()), strategy);
    }

    /// Register a strategy applied to every element of `layer`.
    pub fn register_static(&mut self, layer: &str, strategy: Arc<dyn LocatorStrategy>) {
        self.fixed.insert(layer.to_string(), strategy);
    }

    /// Return `true` when no strategy is registered.
    pub fn is_empty(&self) -> bool {
        self.variant.is_empty() && self.fixed.is_empty()
    }

    /// Final locator for `choice` given the full choice set.
    ///
    /// Variant strategies win over the static strategy; empty results are ignored.
    pub fn resolve_locator(&self, choice: &Choice, choices: &ChoiceSet) -> String {
        let key = (choice.layer.clone(), choice.element_name.clone());
        let from_variant = self
            .variant
            .get(&key)
            .and_then(|s| s.resolve(&choice.locator, choices))
            .filter(|l| !l.is_empty());
        if let Some(locator) = from_variant {
            return locator;
        }
        self.fixed
            .get(&choice.layer)
            .and_then(|s| s.resolve(&choice.locator, choices))
            .filter(|l| !l.is_empty())
            .unwrap_or_else(|| choice.locator.clone())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/compose/strategy.rs"]
mod tests;
