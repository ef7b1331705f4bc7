use std::collections::{BTreeMap, BTreeSet};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use anyhow::Context;

use crate::{
    catalog::model::{BlendMode, Element, Layer},
    catalog::scan::DEFAULT_RARITY_DELIMITER,
    compose::conflict::{ConflictRule, Resolution, TraitMatch},
    compose::invalid::InvalidCombination,
    compose::layering::LayeringException,
    compose::strategy::StrategySpec,
    foundation::core::Canvas,
    foundation::error::{LoomError, LoomResult},
    render::color::Color,
};

#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
/// Complete generator configuration.
///
/// This is the JSON-facing, human-edited representation of a run. It is validated up front
/// and turned into layer catalogs, conflict rules and a strategy registry before any edition
/// is composed.
pub struct ProjectConfig {
    /// Output canvas dimensions.
    #[serde(default)]
    pub format: Canvas,
    /// Seed for the weighted sampler; `None` draws one from system entropy.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
    /// Target network; selects the metadata record shape and the first edition number.
    #[serde(default)]
    pub network: Network,
    /// Edition name prefix (`"{prefix} #{n}"`).
    pub name_prefix: String,
    /// Collection description.
    #[serde(default)]
    pub description: String,
    /// Base URI for image links in Ethereum records.
    #[serde(default)]
    pub base_uri: String,
    /// Solana-specific record fields.
    #[serde(default)]
    pub solana: SolanaMetadata,
    /// Configuration blocks, generated in order.
    pub layer_configurations: Vec<LayerConfiguration>,
    /// Shuffle edition numbers across configuration blocks.
    #[serde(default)]
    pub shuffle_layer_configurations: bool,
    /// Rejected attempts allowed per edition before aborting; `None` never aborts.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unique_dna_tolerance: Option<u64>,
    /// Background fill behind the first layer.
    #[serde(default)]
    pub background: BackgroundConfig,
    /// Separator between element name and weight in asset file names.
    #[serde(default = "default_rarity_delimiter")]
    pub rarity_delimiter: String,
    /// Extra key/value pairs merged into every metadata record.
    #[serde(default, skip_serializing_if = "serde_json::Map::is_empty")]
    pub extra_metadata: serde_json::Map<String, serde_json::Value>,
    /// Human-readable labels for element names used as attribute values.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub value_labels: BTreeMap<String, String>,
}

fn default_rarity_delimiter() -> String {
    DEFAULT_RARITY_DELIMITER.to_string()
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
/// Target network for metadata records.
pub enum Network {
    /// Ethereum-style records; editions start at 1.
    #[default]
    Eth,
    /// Solana (Candy Machine) records; editions start at 0.
    Sol,
}

impl Network {
    /// First edition number for this network.
    pub fn first_edition(self) -> u64 {
        match self {
            Self::Eth => 1,
            Self::Sol => 0,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
/// Solana-only metadata fields.
pub struct SolanaMetadata {
    /// Collection symbol.
    #[serde(default)]
    pub symbol: String,
    /// Royalty in basis points (1000 = 10%).
    #[serde(default)]
    pub seller_fee_basis_points: u32,
    /// External URL shown by marketplaces.
    #[serde(default)]
    pub external_url: String,
    /// Royalty split.
    #[serde(default)]
    pub creators: Vec<Creator>,
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
/// One royalty recipient.
pub struct Creator {
    /// Wallet address.
    pub address: String,
    /// Share in percent.
    pub share: u8,
}

#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
/// Background fill options.
pub struct BackgroundConfig {
    /// Fill the canvas before drawing layers.
    #[serde(default = "default_true")]
    pub generate: bool,
    /// Lightness of generated pastel colors in `[0, 1]`.
    #[serde(default = "default_brightness")]
    pub brightness: f64,
    /// Always use `default` instead of a random hue.
    #[serde(default, rename = "static")]
    pub static_color: bool,
    /// Color used when `static` is set.
    #[serde(default = "default_background_color")]
    pub default: Color,
}

fn default_true() -> bool {
    true
}

fn default_brightness() -> f64 {
    0.8
}

fn default_background_color() -> Color {
    Color::BLACK
}

impl Default for BackgroundConfig {
    fn default() -> Self {
        Self {
            generate: true,
            brightness: default_brightness(),
            static_color: false,
            default: default_background_color(),
        }
    }
}

#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
/// One configuration block: a layer set and the rules that apply to it.
pub struct LayerConfiguration {
    /// Cumulative edition count this block grows the collection to.
    pub grow_edition_size_to: u64,
    /// Layers in catalog (and default draw) order.
    pub layers_order: Vec<LayerSpec>,
    /// Replace/remove rules applied after sampling.
    #[serde(default)]
    pub conflict_rules: Vec<ConflictRule>,
    /// Alternate draw orders triggered by specific trait values.
    #[serde(default)]
    pub layering_exceptions: Vec<LayeringException>,
    /// Trait combinations that must never co-occur.
    #[serde(default)]
    pub invalid_combinations: Vec<InvalidCombination>,
}

#[derive(Clone, Debug, Default, serde::Serialize, serde::Deserialize)]
/// A layer entry in `layers_order`.
pub struct LayerSpec {
    /// Layer (and directory) name.
    pub name: String,
    /// Optional per-layer settings.
    #[serde(default)]
    pub options: LayerOptions,
}

#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
/// Per-layer settings.
pub struct LayerOptions {
    /// Attribute label; defaults to the layer name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    /// Leave this layer out of the uniqueness key.
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
    /// Compositing opacity.
    #[serde(default = "default_opacity")]
    pub opacity: f64,
    /// Element forced by remove rules (default `"None"`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub neutral_element: Option<String>,
    /// Locator strategies keyed by selected element name.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub variant_locator_overrides: BTreeMap<String, StrategySpec>,
    /// Locator strategy applied to every element of the layer.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub static_locator_override: Option<StrategySpec>,
}

fn default_opacity() -> f64 {
    1.0
}

impl Default for LayerOptions {
    fn default() -> Self {
        Self {
            display_name: None,
            bypass_uniqueness: false,
            metadata_only: false,
            artwork_only: false,
            blend: BlendMode::default(),
            opacity: default_opacity(),
            neutral_element: None,
            variant_locator_overrides: BTreeMap::new(),
            static_locator_override: None,
        }
    }
}

impl LayerSpec {
    /// Combine this spec with scanned elements into a catalog layer.
    pub fn to_layer(&self, elements: Vec<Element>) -> Layer {
        let o = &self.options;
        Layer {
            name: self.name.clone(),
            display_name: o.display_name.clone().unwrap_or_else(|| self.name.clone()),
            elements,
            bypass_uniqueness: o.bypass_uniqueness,
            metadata_only: o.metadata_only,
            artwork_only: o.artwork_only,
            blend: o.blend,
            opacity: o.opacity,
            neutral_element: o.neutral_element.clone(),
        }
    }
}

impl ProjectConfig {
    /// Parse a configuration from a JSON reader.
    pub fn from_reader<R: std::io::Read>(r: R) -> LoomResult<Self> {
        serde_json::from_reader(r)
            .map_err(|e| LoomError::serde(format!("parse project configuration JSON: {e}")))
    }

    /// Parse a configuration from a JSON file on disk.
    pub fn from_path(path: impl AsRef<Path>) -> LoomResult<Self> {
        let path = path.as_ref();
        let f = File::open(path)
            .with_context(|| format!("open configuration '{}'", path.display()))?;
        Self::from_reader(BufReader::new(f))
    }

    /// Validate structural invariants that do not require scanning assets.
    pub fn validate(&self) -> LoomResult<()> {
        Canvas::new(self.format.width, self.format.height)?;
        if self.name_prefix.trim().is_empty() {
            return Err(LoomError::configuration("name_prefix must be non-empty"));
        }
        if self.layer_configurations.is_empty() {
            return Err(LoomError::configuration(
                "at least one layer configuration is required",
            ));
        }
        if !self.background.brightness.is_finite()
            || !(0.0..=1.0).contains(&self.background.brightness)
        {
            return Err(LoomError::configuration(
                "background brightness must be within [0, 1]",
            ));
        }
        if let Some(0) = self.unique_dna_tolerance {
            return Err(LoomError::configuration(
                "unique_dna_tolerance must be >= 1 when set",
            ));
        }

        let mut previous_target = 0u64;
        for (idx, block) in self.layer_configurations.iter().enumerate() {
            if block.grow_edition_size_to <= previous_target {
                return Err(LoomError::configuration(format!(
                    "layer configuration {idx}: grow_edition_size_to must exceed {previous_target}"
                )));
            }
            block
                .validate()
                .map_err(|e| prefix_block_error(idx, e))?;
            previous_target = block.grow_edition_size_to;
        }
        Ok(())
    }

    /// Total number of editions across all blocks.
    pub fn total_editions(&self) -> u64 {
        self.layer_configurations
            .last()
            .map(|b| b.grow_edition_size_to)
            .unwrap_or(0)
    }
}

fn prefix_block_error(idx: usize, e: LoomError) -> LoomError {
    match e {
        LoomError::Configuration(msg) => {
            LoomError::configuration(format!("layer configuration {idx}: {msg}"))
        }
        other => other,
    }
}

impl LayerConfiguration {
    /// Validate layer names and every rule reference against `layers_order`.
    pub fn validate(&self) -> LoomResult<()> {
        if self.layers_order.is_empty() {
            return Err(LoomError::configuration("layers_order must be non-empty"));
        }
        let mut names = BTreeSet::new();
        for spec in &self.layers_order {
            if spec.name.trim().is_empty() {
                return Err(LoomError::configuration("layer name must be non-empty"));
            }
            if !names.insert(spec.name.as_str()) {
                return Err(LoomError::configuration(format!(
                    "layer '{}' is declared twice",
                    spec.name
                )));
            }
            let o = &spec.options;
            if !o.opacity.is_finite() || !(0.0..=1.0).contains(&o.opacity) {
                return Err(LoomError::configuration(format!(
                    "layer '{}' opacity must be within [0, 1]",
                    spec.name
                )));
            }
            if o.metadata_only && o.artwork_only {
                return Err(LoomError::configuration(format!(
                    "layer '{}' cannot be both metadata_only and artwork_only",
                    spec.name
                )));
            }
        }

        let require = |layer: &str, what: &str| -> LoomResult<()> {
            if names.contains(layer) {
                Ok(())
            } else {
                Err(LoomError::configuration(format!(
                    "{what} references unknown layer '{layer}'"
                )))
            }
        };

        for (i, rule) in self.conflict_rules.iter().enumerate() {
            let [trigger, affected] = &rule.traits;
            require(&trigger.trait_name, &format!("conflict rule {i}"))?;
            require(&affected.trait_name, &format!("conflict rule {i}"))?;
            if matches!(trigger.value, TraitMatch::Any) {
                return Err(LoomError::configuration(format!(
                    "conflict rule {i}: the trigger trait cannot use the '*' wildcard"
                )));
            }
            if rule.resolution == Resolution::Replace && matches!(affected.value, TraitMatch::Any)
            {
                return Err(LoomError::configuration(format!(
                    "conflict rule {i}: a replace rule cannot exclude '*' (nothing would remain)"
                )));
            }
        }

        let default_order: Vec<String> = self.layers_order.iter().map(|s| s.name.clone()).collect();
        for (i, exc) in self.layering_exceptions.iter().enumerate() {
            require(&exc.exception.trait_name, &format!("layering exception {i}"))?;
            exc.check_layer_set(&default_order)?;
        }

        for (i, combo) in self.invalid_combinations.iter().enumerate() {
            if combo.0.is_empty() {
                return Err(LoomError::configuration(format!(
                    "invalid combination {i} must list at least one trait"
                )));
            }
            for pair in &combo.0 {
                require(&pair.trait_name, &format!("invalid combination {i}"))?;
            }
        }

        for spec in &self.layers_order {
            for element in spec.options.variant_locator_overrides.keys() {
                if element.trim().is_empty() {
                    return Err(LoomError::configuration(format!(
                        "layer '{}' declares a locator override for an empty element name",
                        spec.name
                    )));
                }
            }
            let strategies = spec
                .options
                .variant_locator_overrides
                .values()
                .chain(spec.options.static_locator_override.iter());
            for strategy in strategies {
                for layer in strategy.referenced_layers() {
                    require(&layer, &format!("locator strategy on layer '{}'", spec.name))?;
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/config/model.rs"]
mod tests;
