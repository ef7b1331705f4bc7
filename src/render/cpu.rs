use std::path::PathBuf;

use anyhow::Context;
use image::RgbaImage;
use rayon::prelude::*;

use crate::{
    catalog::model::{BlendMode, LayerCatalog},
    compose::composer::Edition,
    config::model::BackgroundConfig,
    foundation::core::Canvas,
    foundation::error::{LoomError, LoomResult},
    render::blend::blend_in_place,
    render::color::Color,
};

/// One image to composite.
#[derive(Clone, Debug, PartialEq)]
pub struct RenderLayer {
    /// Layer name, for diagnostics.
    pub layer: String,
    /// Image file on disk.
    pub path: PathBuf,
    /// Blend mode against the layers below.
    pub blend: BlendMode,
    /// Opacity in `[0, 1]`.
    pub opacity: f32,
}

/// Fully resolved render input for one edition.
#[derive(Clone, Debug, PartialEq)]
pub struct RenderRequest {
    /// Output size.
    pub canvas: Canvas,
    /// Fill applied before the first layer.
    pub background: Option<Color>,
    /// Layers bottom-first.
    pub layers: Vec<RenderLayer>,
}

impl RenderRequest {
    /// Resolve `edition` against `catalog`.
    ///
    /// Layers follow the edition's draw order with the locators written in its DNA;
    /// `metadata_only` layers are left out.
    pub fn for_edition(
        edition: &Edition,
        catalog: &LayerCatalog,
        canvas: Canvas,
        background: &BackgroundConfig,
    ) -> LoomResult<Self> {
        let tokens = edition.dna.tokens()?;
        if tokens.len() != edition.draw_order.len() {
            return Err(LoomError::validation(format!(
                "edition {} DNA does not match its draw order",
                edition.index
            )));
        }

        let mut layers = Vec::with_capacity(tokens.len());
        for (token, name) in tokens.iter().zip(&edition.draw_order) {
            let layer = catalog.require(name)?;
            if layer.metadata_only {
                continue;
            }
            layers.push(RenderLayer {
                layer: layer.name.clone(),
                path: catalog.asset_path(&layer.name, token.locator),
                blend: layer.blend,
                opacity: layer.opacity as f32,
            });
        }

        Ok(Self {
            canvas,
            background: background_fill(background, edition),
            layers,
        })
    }
}

/// Background color for `edition`, if any.
///
/// Non-static backgrounds take a pastel hue derived from the edition's DNA digest so a given
/// edition always gets the same color.
pub fn background_fill(cfg: &BackgroundConfig, edition: &Edition) -> Option<Color> {
    if !cfg.generate {
        return None;
    }
    if cfg.static_color {
        return Some(cfg.default);
    }
    let digest = edition.dna.digest();
    let seed = u32::from_str_radix(&digest[..8], 16).unwrap_or(0);
    Some(Color::pastel(f64::from(seed % 360), cfg.brightness))
}

/// Backend that turns a [`RenderRequest`] into pixels.
pub trait RenderBackend {
    /// Render one edition.
    fn render(&mut self, req: &RenderRequest) -> LoomResult<RgbaImage>;
}

/// CPU compositor.
///
/// Layer images are decoded in parallel; compositing then runs bottom-up in draw order.
pub struct CpuRenderer {
    pool: rayon::ThreadPool,
}

impl CpuRenderer {
    /// Renderer with `threads` decode workers, or rayon's default when `None`.
    pub fn new(threads: Option<usize>) -> LoomResult<Self> {
        Ok(Self {
            pool: build_thread_pool(threads)?,
        })
    }
}

impl std::fmt::Debug for CpuRenderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CpuRenderer")
            .field("threads", &self.pool.current_num_threads())
            .finish()
    }
}

impl RenderBackend for CpuRenderer {
    fn render(&mut self, req: &RenderRequest) -> LoomResult<RgbaImage> {
        let Canvas { width, height } = req.canvas;
        let decoded = self.pool.install(|| {
            req.layers
                .par_iter()
                .map(|layer| load_layer(layer, req.canvas))
                .collect::<Vec<_>>()
        });

        let mut pixels = vec![0u8; (width as usize) * (height as usize) * 4];
        if let Some(color) = req.background {
            let px = color.to_rgba8();
            for chunk in pixels.chunks_exact_mut(4) {
                chunk.copy_from_slice(&px);
            }
        }
        for (layer, image) in req.layers.iter().zip(decoded) {
            let image = image?;
            blend_in_place(&mut pixels, image.as_raw(), layer.blend, layer.opacity)?;
        }

        RgbaImage::from_raw(width, height, pixels)
            .ok_or_else(|| LoomError::validation("composited buffer does not match the canvas"))
    }
}

fn load_layer(layer: &RenderLayer, canvas: Canvas) -> LoomResult<RgbaImage> {
    let img = image::open(&layer.path)
        .with_context(|| format!("decode layer '{}' from {}", layer.layer, layer.path.display()))?
        .to_rgba8();
    if img.dimensions() == (canvas.width, canvas.height) {
        return Ok(img);
    }
    tracing::debug!(
        layer = %layer.layer,
        from = ?img.dimensions(),
        "resizing layer image to canvas"
    );
    Ok(image::imageops::resize(
        &img,
        canvas.width,
        canvas.height,
        image::imageops::FilterType::Triangle,
    ))
}

fn build_thread_pool(threads: Option<usize>) -> LoomResult<rayon::ThreadPool> {
    if let Some(0) = threads {
        return Err(LoomError::configuration(
            "render threads must be >= 1 when set",
        ));
    }

    let mut builder = rayon::ThreadPoolBuilder::new();
    if let Some(n) = threads {
        builder = builder.num_threads(n);
    }
    builder
        .build()
        .map_err(|e| LoomError::configuration(format!("failed to build rayon thread pool: {e}")))
}

#[cfg(test)]
#[path = "../../tests/unit/render/cpu.rs"]
mod tests;
