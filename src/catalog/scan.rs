use std::path::{Path, PathBuf};

use anyhow::Context;

use crate::{
    catalog::model::{Element, LayerCatalog},
    config::model::LayerSpec,
    foundation::error::{LoomError, LoomResult},
};

/// Default separator between an element name and its rarity weight (`name#weight.png`).
pub const DEFAULT_RARITY_DELIMITER: &str = "#";

/// Split an asset file name into `(element name, weight)`.
///
/// The weight is the number after the last delimiter; it falls back to `1` when absent,
/// unparsable or not finite.
pub fn parse_element_file(file_name: &str, rarity_delimiter: &str) -> (String, f64) {
    let stem = Path::new(file_name)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(file_name);

    if rarity_delimiter.is_empty() {
        return (stem.to_string(), 1.0);
    }

    let name = stem.split(rarity_delimiter).next().unwrap_or(stem);
    let weight = stem
        .rsplit(rarity_delimiter)
        .next()
        .filter(|_| stem.contains(rarity_delimiter))
        .and_then(|w| w.trim().parse::<f64>().ok())
        .filter(|w| w.is_finite())
        .unwrap_or(1.0);
    (name.to_string(), weight)
}

/// Scan one layer directory into elements.
///
/// Hidden entries and sub-directories are skipped. File names are sorted so element ids are
/// stable across platforms.
pub fn scan_elements(dir: &Path, rarity_delimiter: &str) -> LoomResult<Vec<Element>> {
    let rd = std::fs::read_dir(dir)
        .with_context(|| format!("read layer directory '{}'", dir.display()))?;

    let mut files = Vec::new();
    for entry in rd {
        let entry = entry.with_context(|| format!("list layer directory '{}'", dir.display()))?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let Some(file_name) = path.file_name().and_then(|s| s.to_str()) else {
            continue;
        };
        if file_name.starts_with('.') {
            continue;
        }
        files.push(file_name.to_string());
    }
    files.sort();

    let mut elements = Vec::with_capacity(files.len());
    for (idx, file_name) in files.into_iter().enumerate() {
        let id = u32::try_from(idx).map_err(|_| {
            LoomError::configuration(format!("too many elements in '{}'", dir.display()))
        })?;
        let (name, weight) = parse_element_file(&file_name, rarity_delimiter);
        elements.push(Element::new(id, name, file_name, weight));
    }
    Ok(elements)
}

/// Build the catalog for one layer configuration from `root/<layer name>/` directories.
pub fn build_catalog(
    root: impl Into<PathBuf>,
    specs: &[LayerSpec],
    rarity_delimiter: &str,
) -> LoomResult<LayerCatalog> {
    let root = root.into();
    let mut layers = Vec::with_capacity(specs.len());
    for spec in specs {
        let elements = scan_elements(&root.join(&spec.name), rarity_delimiter)?;
        if elements.is_empty() {
            return Err(LoomError::configuration(format!(
                "layer '{}' has zero elements in '{}'",
                spec.name,
                root.join(&spec.name).display()
            )));
        }
        layers.push(spec.to_layer(elements));
    }

    let catalog = LayerCatalog { root, layers };
    catalog.validate()?;
    tracing::debug!(
        layers = catalog.layers.len(),
        root = %catalog.root.display(),
        "layer catalog scanned"
    );
    Ok(catalog)
}

#[cfg(test)]
#[path = "../../tests/unit/catalog/scan.rs"]
mod tests;
