use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use anyhow::Context;

use crate::{
    catalog::model::LayerCatalog,
    compose::composer::Edition,
    config::model::ProjectConfig,
    foundation::error::LoomResult,
    metadata::record::MetadataRecord,
    output::sink::EditionSink,
    render::cpu::{CpuRenderer, RenderBackend, RenderRequest},
};

/// File name of the collection-wide metadata array inside `json/`.
pub const COLLECTION_METADATA_FILE: &str = "_metadata.json";

/// Sink that renders each edition and writes `images/<n>.png` and `json/<n>.json`.
///
/// `begin` wipes and recreates the build directory; `end` writes the collection metadata array.
#[derive(Debug)]
pub struct BuildDirSink<R = CpuRenderer> {
    root: PathBuf,
    project: ProjectConfig,
    renderer: R,
    records: Vec<MetadataRecord>,
}

impl<R: RenderBackend> BuildDirSink<R> {
    /// Sink writing under `root`.
    pub fn new(root: impl Into<PathBuf>, project: ProjectConfig, renderer: R) -> Self {
        Self {
            root: root.into(),
            project,
            renderer,
            records: Vec::new(),
        }
    }

    /// Build directory root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory holding rendered images.
    pub fn images_dir(&self) -> PathBuf {
        self.root.join("images")
    }

    /// Directory holding metadata records.
    pub fn json_dir(&self) -> PathBuf {
        self.root.join("json")
    }

    /// Records written so far, in acceptance order.
    pub fn records(&self) -> &[MetadataRecord] {
        &self.records
    }

    /// Remove any previous build output and recreate the directory layout.
    pub fn setup(&self) -> LoomResult<()> {
        if self.root.exists() {
            std::fs::remove_dir_all(&self.root)
                .with_context(|| format!("remove build dir '{}'", self.root.display()))?;
        }
        for dir in [self.images_dir(), self.json_dir()] {
            std::fs::create_dir_all(&dir)
                .with_context(|| format!("create output dir '{}'", dir.display()))?;
        }
        Ok(())
    }
}

fn write_json<T: serde::Serialize>(path: &Path, value: &T) -> LoomResult<()> {
    let f = File::create(path).with_context(|| format!("create '{}'", path.display()))?;
    serde_json::to_writer_pretty(BufWriter::new(f), value)
        .with_context(|| format!("write json '{}'", path.display()))?;
    Ok(())
}

impl<R: RenderBackend> EditionSink for BuildDirSink<R> {
    fn begin(&mut self) -> LoomResult<()> {
        self.records.clear();
        self.setup()
    }

    fn accept(&mut self, edition: &Edition, catalog: &LayerCatalog) -> LoomResult<()> {
        let req = RenderRequest::for_edition(
            edition,
            catalog,
            self.project.format,
            &self.project.background,
        )?;
        let img = self.renderer.render(&req)?;

        let png = self.images_dir().join(format!("{}.png", edition.index));
        img.save_with_format(&png, image::ImageFormat::Png)
            .with_context(|| format!("write png '{}'", png.display()))?;

        let record = MetadataRecord::for_edition(
            &self.project,
            edition,
            chrono::Utc::now().timestamp_millis(),
        );
        write_json(
            &self.json_dir().join(format!("{}.json", edition.index)),
            &record,
        )?;
        tracing::debug!(edition = edition.index.0, path = %png.display(), "wrote edition");
        self.records.push(record);
        Ok(())
    }

    fn end(&mut self) -> LoomResult<()> {
        write_json(
            &self.json_dir().join(COLLECTION_METADATA_FILE),
            &self.records,
        )
    }
}

#[cfg(test)]
#[path = "../../tests/unit/output/build_dir.rs"]
mod tests;
