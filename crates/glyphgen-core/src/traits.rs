// this_file: crates/glyphgen-core/src/traits.rs

//! The contracts that bind the pipeline to its collaborators
//!
//! Three seams, three owners. The generator never parses resources, never
//! owns the glyph atlas, and never decides what a font file means; it talks
//! to those systems through these traits, so hosts (and tests) can supply
//! their own.
//!
//! - [`OutlineFace`] - a parsed outline font as a rasterization capability
//! - [`ResourceSource`] - the host's resource subsystem, keyed by path
//! - [`GlyphStore`] - the host's glyph cache/atlas that receives cells

use crate::error::Result;
use crate::types::{
    FaceBounds, FaceMetrics, FontInfo, GlyphCell, GlyphHMetrics, GlyphMetrics, SdfBitmap,
};
use std::sync::Arc;

/// Resource type name a compiled font descriptor must declare.
pub const COMPILED_FONT_TYPE: &str = "fontc";

/// A parsed outline font, reduced to what glyph generation needs
///
/// Implementations own their font bytes and parsed tables; the pipeline only
/// ever asks capability questions. `Send + Sync` is required because faces
/// are shared with the rasterization worker thread via `Arc`.
///
/// ```ignore
/// struct MyFace { /* parsed tables */ }
///
/// impl OutlineFace for MyFace {
///     fn path(&self) -> &str { "/fonts/body.ttf" }
///     fn glyph_index(&self, ch: char) -> Option<u16> { Some(42) }
///     // ...
/// }
/// ```
pub trait OutlineFace: std::fmt::Debug + Send + Sync {
    /// Source path the face was loaded from, for diagnostics.
    fn path(&self) -> &str;

    /// Find the glyph that represents this codepoint.
    ///
    /// Returns None when the font does not map it.
    fn glyph_index(&self, codepoint: char) -> Option<u16>;

    /// Uniform scale (pixels per font unit) that renders the face at
    /// `pixel_height` pixels from ascender to descender.
    fn scale_for_pixel_height(&self, pixel_height: f32) -> f32;

    /// Vertical metrics in font units.
    fn metrics(&self) -> FaceMetrics;

    /// Union of all glyph bounding boxes in font units, for cell sizing.
    fn bounds(&self) -> FaceBounds;

    /// Advance and left side bearing for a glyph, in font units.
    fn h_metrics(&self, glyph: u16) -> GlyphHMetrics;

    /// Rasterize a signed distance field for `glyph` at `scale`, with
    /// `padding` pixels of margin on every side and `edge_value` as the
    /// zero-crossing level (larger values are deeper inside the glyph).
    ///
    /// Returns `Ok(None)` for glyphs with no outline, such as space.
    fn render_sdf(
        &self,
        glyph: u16,
        scale: f32,
        padding: u32,
        edge_value: u8,
    ) -> Result<Option<SdfBitmap>>;
}

/// Turns raw resource bytes into an [`OutlineFace`].
///
/// The font-data registry calls this once per outline path; everything after
/// parse failure is rolled back by dropping the bytes.
pub trait OutlineParser {
    fn parse(&self, path: &str, bytes: Vec<u8>) -> Result<Arc<dyn OutlineFace>>;
}

/// A reference-counted handle to a host resource.
///
/// Holding the `Arc` keeps the underlying resource loaded; dropping it is
/// the release.
pub trait ResourceDescriptor {
    /// Path the resource was resolved from.
    fn path(&self) -> &str;

    /// Declared resource type, compared against [`COMPILED_FONT_TYPE`].
    fn type_name(&self) -> &str;
}

/// The host's resource subsystem
///
/// Only consulted on the thread that drives the generator; implementations
/// need no internal synchronization on the generator's account.
pub trait ResourceSource {
    /// Raw byte payload at `path`, e.g. an outline font file.
    fn get_raw(&self, path: &str) -> Result<Vec<u8>>;

    /// Acquire a descriptor handle for the resource at `path`.
    fn get(&self, path: &str) -> Result<Arc<dyn ResourceDescriptor>>;
}

/// The host's glyph cache/atlas
///
/// Assumed non-thread-safe: the generator touches it only from the thread
/// driving `update`, never from the worker.
pub trait GlyphStore {
    /// Descriptor data for a compiled font resource.
    fn font_info(&self, font: &dyn ResourceDescriptor) -> Result<FontInfo>;

    /// Fix the cell geometry every glyph of this font will occupy. Called
    /// once per load, before any glyph is added.
    fn set_cell_geometry(
        &self,
        font: &dyn ResourceDescriptor,
        width: u32,
        height: u32,
        max_ascent: u32,
    ) -> Result<()>;

    /// Whether a glyph for `codepoint` is already cached.
    fn has_glyph(&self, font: &dyn ResourceDescriptor, codepoint: char) -> bool;

    /// Hand over a generated cell. The store owns `cell` from here on,
    /// including the empty cell of whitespace glyphs.
    fn add_glyph(
        &self,
        font: &dyn ResourceDescriptor,
        codepoint: char,
        metrics: &GlyphMetrics,
        cell: GlyphCell,
    ) -> Result<()>;

    /// Drop a cached glyph. No-op when the codepoint is not cached.
    fn remove_glyph(&self, font: &dyn ResourceDescriptor, codepoint: char);
}
