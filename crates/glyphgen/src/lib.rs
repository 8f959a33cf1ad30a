// this_file: crates/glyphgen/src/lib.rs

//! Asynchronous SDF glyph generation for runtime text rendering
//!
//! Given a loaded outline font and a requested string, this crate rasterizes
//! only the glyphs not yet cached, computes signed-distance-field bitmaps
//! (with an optional shadow channel), and feeds them into the host's glyph
//! cache without blocking the calling thread.
//!
//! The [`Generator`] is the entry point: an explicit context object the host
//! owns and drives. Rasterization happens on one dedicated worker thread;
//! results are integrated into the [`GlyphStore`] on the calling thread
//! during [`Generator::update`], which the host invokes each tick with a
//! wall-clock budget.
//!
//! ```ignore
//! use glyphgen::{Generator, GeneratorConfig};
//! use std::time::Duration;
//!
//! let mut generator = Generator::builder()
//!     .source(my_resources)
//!     .store(my_glyph_cache)
//!     .config(GeneratorConfig::default())
//!     .build()?;
//!
//! let font = generator.load_font("/main.fontc", "/fonts/main.ttf")?;
//! generator.add_glyphs(font, "Hello", Some(Box::new(|request, outcome| {
//!     println!("request {:?}: success = {}", request, outcome.success());
//! })))?;
//!
//! // each frame:
//! generator.update(Duration::from_millis(1));
//! ```

mod instance;
mod outline_registry;
mod raster;
mod scheduler;

pub use glyphgen_core::{
    BatchOutcome, CellCompression, FaceBounds, FaceMetrics, FontId, FontInfo, GeneratorConfig,
    GlyphCell, GlyphGenError, GlyphHMetrics, GlyphMetrics, GlyphStore, OnComplete, OutlineFace,
    OutlineParser, OutputFormat, RenderMode, RequestId, ResourceDescriptor, ResourceSource,
    Result, SdfBitmap, COMPILED_FONT_TYPE,
};
pub use glyphgen_ttf::{TtfFace, TtfParser};

use instance::FontInstance;
use outline_registry::OutlineRegistry;
use scheduler::{GlyphJob, Scheduler};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

/// The glyph generation context
///
/// Owns the font instances, the shared outline faces, and the worker thread.
/// All methods must be called from one thread, the same thread that drives
/// [`update`](Self::update); the glyph store is only ever touched from
/// there.
pub struct Generator {
    config: GeneratorConfig,
    source: Arc<dyn ResourceSource>,
    store: Arc<dyn GlyphStore>,
    registry: OutlineRegistry,
    instances: HashMap<FontId, FontInstance>,
    scheduler: Scheduler,
    next_request: u64,
}

impl std::fmt::Debug for Generator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Generator")
            .field("config", &self.config)
            .field("next_request", &self.next_request)
            .finish_non_exhaustive()
    }
}

impl Generator {
    /// Start building a new generator.
    pub fn builder() -> GeneratorBuilder {
        GeneratorBuilder::new()
    }

    /// Load a font instance: resolve the compiled font at `font_path`, bind
    /// it to the outline font at `outline_path` (parsed once and shared
    /// across instances), and register the derived cache-cell geometry with
    /// the glyph store.
    ///
    /// Fails with [`GlyphGenError::DuplicateLoad`] when `font_path` is
    /// already loaded; loading is not idempotent. Any failure rolls back
    /// whatever was acquired.
    pub fn load_font(&mut self, font_path: &str, outline_path: &str) -> Result<FontId> {
        let font = FontId::from_path(font_path);
        if self.instances.contains_key(&font) {
            return Err(GlyphGenError::DuplicateLoad(font_path.to_string()));
        }

        let descriptor = self.source.get(font_path)?;
        if descriptor.type_name() != COMPILED_FONT_TYPE {
            return Err(GlyphGenError::TypeMismatch {
                path: font_path.to_string(),
                expected: COMPILED_FONT_TYPE.to_string(),
                found: descriptor.type_name().to_string(),
            });
        }

        let info = self.store.font_info(descriptor.as_ref())?;
        if info.output_format != OutputFormat::DistanceField {
            return Err(GlyphGenError::UnsupportedFormat {
                path: font_path.to_string(),
                detail: "only distance-field output is supported".to_string(),
            });
        }

        let face = self.registry.acquire(self.source.as_ref(), outline_path)?;
        let instance = FontInstance::new(font_path, descriptor, face, info, &self.config);

        // the store must know the cell size before any glyph is generated
        self.store.set_cell_geometry(
            instance.descriptor.as_ref(),
            instance.cell.width,
            instance.cell.height,
            instance.cell.max_ascent,
        )?;

        log::debug!(
            "loaded font '{font_path}' (outline '{outline_path}', size {}, padding {}, \
             scale {:.4}, cell {}x{} ascent {}, shadow {})",
            instance.info.size,
            instance.padding,
            instance.scale,
            instance.cell.width,
            instance.cell.height,
            instance.cell.max_ascent,
            instance.has_shadow
        );
        self.instances.insert(font, instance);
        Ok(font)
    }

    /// Unload a font instance, releasing its descriptor and outline
    /// references.
    ///
    /// Returns `Ok(false)` when no such instance is loaded. Refuses with
    /// [`GlyphGenError::JobsPending`] while glyph jobs for the instance are
    /// in flight; drain them with [`update`](Self::update) first.
    pub fn unload_font(&mut self, font: FontId) -> Result<bool> {
        let Some(instance) = self.instances.get(&font) else {
            return Ok(false);
        };
        let pending = self.scheduler.pending_jobs(font);
        if pending > 0 {
            log::warn!(
                "refusing to unload '{}': {pending} glyph jobs in flight",
                instance.font_path
            );
            return Err(GlyphGenError::JobsPending(instance.font_path.clone()));
        }
        log::debug!("unloaded font '{}'", instance.font_path);
        self.instances.remove(&font);
        Ok(true)
    }

    /// Request glyph generation for every codepoint of `text` not already
    /// in the glyph store.
    ///
    /// Returns immediately; the work happens on the worker thread and the
    /// results land in the store during [`update`](Self::update). When the
    /// last codepoint of the request has completed, `on_complete` fires
    /// exactly once on the updating thread, also for requests that
    /// submitted no jobs at all.
    pub fn add_glyphs(
        &mut self,
        font: FontId,
        text: &str,
        on_complete: Option<OnComplete>,
    ) -> Result<RequestId> {
        let Some(instance) = self.instances.get(&font) else {
            return Err(GlyphGenError::NotLoaded(format!("{:#x}", font.raw())));
        };

        let request = RequestId::from_raw(self.next_request);
        self.next_request += 1;

        let params = instance.render_params(self.config.compress_cells);
        let mut seen = HashSet::new();
        let mut jobs = Vec::new();
        for codepoint in text.chars() {
            if !seen.insert(codepoint) {
                continue;
            }
            if self.store.has_glyph(instance.descriptor.as_ref(), codepoint) {
                continue;
            }
            jobs.push(GlyphJob {
                font,
                codepoint,
                face: instance.face.clone(),
                params,
            });
        }

        self.scheduler.submit_batch(request, jobs, on_complete)?;
        Ok(request)
    }

    /// Drop cached glyphs for every codepoint of `text`. Synchronous, not
    /// routed through the worker. Returns `Ok(false)` when the font is not
    /// loaded.
    pub fn remove_glyphs(&mut self, font: FontId, text: &str) -> Result<bool> {
        let Some(instance) = self.instances.get(&font) else {
            return Ok(false);
        };
        for codepoint in text.chars() {
            self.store.remove_glyph(instance.descriptor.as_ref(), codepoint);
        }
        Ok(true)
    }

    /// Integrate completed glyphs into the store and fire due batch
    /// callbacks, for at most `budget` of wall-clock time. Call every tick.
    ///
    /// Returns the number of glyphs added to the store.
    pub fn update(&mut self, budget: Duration) -> usize {
        let Self {
            scheduler,
            instances,
            store,
            ..
        } = self;
        scheduler.drain(budget, |font, codepoint, metrics, cell| {
            let Some(instance) = instances.get(&font) else {
                // unreachable while unload refuses pending jobs
                return Err(GlyphGenError::NotLoaded(format!("{:#x}", font.raw())));
            };
            store.add_glyph(instance.descriptor.as_ref(), codepoint, metrics, cell)
        })
    }

    /// Whether a font instance is currently loaded.
    pub fn is_loaded(&self, font: FontId) -> bool {
        self.instances.contains_key(&font)
    }

    /// Number of loaded font instances.
    pub fn loaded_fonts(&self) -> usize {
        self.instances.len()
    }

    /// Number of outline faces currently resident, across all instances.
    pub fn resident_outlines(&self) -> usize {
        self.registry.resident_count()
    }

    /// Baseline to highest ascender of a loaded font, scaled pixels.
    pub fn ascent(&self, font: FontId) -> Option<f32> {
        self.instances.get(&font).map(FontInstance::ascent)
    }

    /// Baseline to lowest descender of a loaded font as a positive
    /// distance, scaled pixels.
    pub fn descent(&self, font: FontId) -> Option<f32> {
        self.instances.get(&font).map(FontInstance::descent)
    }

    /// Baseline-to-baseline distance of a loaded font, scaled pixels.
    pub fn line_height(&self, font: FontId) -> Option<f32> {
        self.instances.get(&font).map(FontInstance::line_height)
    }
}

impl Drop for Generator {
    fn drop(&mut self) {
        // correct hosts unload explicitly; anything left here leaked
        for instance in self.instances.values() {
            log::warn!(
                "font '{}' still loaded at generator shutdown, releasing",
                instance.font_path
            );
        }
    }
}

/// Builder for [`Generator`]
///
/// The resource source and glyph store are required; the outline parser
/// defaults to [`TtfParser`].
#[derive(Default)]
pub struct GeneratorBuilder {
    config: GeneratorConfig,
    source: Option<Arc<dyn ResourceSource>>,
    store: Option<Arc<dyn GlyphStore>>,
    parser: Option<Box<dyn OutlineParser>>,
}

impl GeneratorBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn config(mut self, config: GeneratorConfig) -> Self {
        self.config = config;
        self
    }

    pub fn source(mut self, source: Arc<dyn ResourceSource>) -> Self {
        self.source = Some(source);
        self
    }

    pub fn store(mut self, store: Arc<dyn GlyphStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn parser(mut self, parser: Box<dyn OutlineParser>) -> Self {
        self.parser = Some(parser);
        self
    }

    /// Validate the configuration and spawn the worker thread.
    pub fn build(self) -> Result<Generator> {
        self.config.validate()?;
        let source = self.source.ok_or_else(|| {
            GlyphGenError::Config("no resource source configured".to_string())
        })?;
        let store = self
            .store
            .ok_or_else(|| GlyphGenError::Config("no glyph store configured".to_string()))?;
        let parser = self.parser.unwrap_or_else(|| Box::new(TtfParser));

        Ok(Generator {
            config: self.config,
            source,
            store,
            registry: OutlineRegistry::new(parser),
            instances: HashMap::new(),
            scheduler: Scheduler::new()?,
            next_request: 1,
        })
    }
}
