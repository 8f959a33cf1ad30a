// this_file: crates/glyphgen-core/src/types.rs

//! Shared data types for the glyph generation pipeline

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::time::Duration;

/// Identity of a loaded font instance, derived from its compiled-font path.
///
/// Stable across loads: the same path always hashes to the same id, so hosts
/// can recompute it instead of storing the value returned by `load_font`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FontId(u64);

impl FontId {
    pub fn from_path(path: &str) -> Self {
        let mut hasher = DefaultHasher::new();
        path.hash(&mut hasher);
        Self(hasher.finish())
    }

    pub fn raw(self) -> u64 {
        self.0
    }
}

/// Identity of one `add_glyphs` request. Unique per generator for its lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RequestId(u64);

impl RequestId {
    pub fn from_raw(value: u64) -> Self {
        Self(value)
    }

    pub fn raw(self) -> u64 {
        self.0
    }
}

/// Output format declared by a compiled font descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Signed distance field glyphs. The only format the generator produces.
    DistanceField,
    /// Plain alpha bitmaps. Declared for completeness; generation is refused.
    Bitmap,
}

/// Layer mode declared by a compiled font descriptor.
///
/// Multi-layer fonts render face, outline, and shadow as separate passes and
/// need extra cell padding for the outline/shadow expansion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderMode {
    SingleLayer,
    MultiLayer,
}

/// Descriptor data the glyph store holds for one compiled font resource.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FontInfo {
    pub output_format: OutputFormat,
    pub render_mode: RenderMode,
    /// Nominal pixel size (ascender to descender).
    pub size: u32,
    /// Outline stroke width in pixels, 0 disables.
    pub outline_width: f32,
    /// Shadow blur radius in pixels, 0 disables.
    pub shadow_blur: u32,
    /// Shadow opacity in 0..=1, 0 disables.
    pub shadow_alpha: f32,
}

impl FontInfo {
    /// A shadow layer is generated only when it would be visible.
    pub fn has_shadow(&self) -> bool {
        self.shadow_alpha > 0.0 && self.shadow_blur > 0
    }
}

/// Vertical metrics of an outline face, in font units.
///
/// `descent` keeps the font's own sign convention: negative below the
/// baseline for y-up coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FaceMetrics {
    pub ascent: f32,
    pub descent: f32,
    pub line_gap: f32,
}

/// Union of all glyph bounding boxes of a face, in font units, y-up.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FaceBounds {
    pub x_min: f32,
    pub y_min: f32,
    pub x_max: f32,
    pub y_max: f32,
}

impl FaceBounds {
    pub fn width(&self) -> f32 {
        self.x_max - self.x_min
    }

    pub fn height(&self) -> f32 {
        self.y_max - self.y_min
    }
}

/// Horizontal metrics for one glyph, in font units.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct GlyphHMetrics {
    pub advance: f32,
    pub left_bearing: f32,
}

/// A single-channel SDF rasterized into a tight box around one glyph.
///
/// Offsets position the box relative to the pen origin in y-down bitmap
/// coordinates: `offset_y` is negative for glyphs that rise above the
/// baseline.
#[derive(Debug, Clone, Default)]
pub struct SdfBitmap {
    pub width: u32,
    pub height: u32,
    pub offset_x: i32,
    pub offset_y: i32,
    pub data: Vec<u8>,
}

/// Per-glyph metrics delivered to the glyph store, in scaled pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct GlyphMetrics {
    /// Cell width in pixels. 0 for whitespace glyphs.
    pub width: u32,
    /// Cell height in pixels. 0 for whitespace glyphs.
    pub height: u32,
    /// Channels per pixel in the cell buffer: 1, or 3 with a shadow layer.
    pub channels: u8,
    pub advance: f32,
    pub left_bearing: f32,
    /// Font-level ascent; identical for every glyph of one instance.
    pub ascent: f32,
    /// Font-level descent as a positive distance below the baseline.
    pub descent: f32,
}

/// Compression applied to a generated cell buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CellCompression {
    #[default]
    None,
    Deflate,
}

/// A generated cache-cell bitmap, ready for the glyph store to own.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GlyphCell {
    pub compression: CellCompression,
    pub data: Vec<u8>,
}

impl GlyphCell {
    /// The cell for whitespace glyphs: no pixels, still counted as added.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Aggregated result of one `add_glyphs` batch.
#[derive(Debug, Clone)]
pub struct BatchOutcome {
    /// Codepoints submitted after cache skipping.
    pub total: usize,
    /// Codepoints that failed rasterization or store insertion.
    pub failures: usize,
    /// Message of the first failure only; later failures are counted, not kept.
    pub first_error: Option<String>,
    /// Worker time attributed to this batch's glyphs.
    pub raster_time: Duration,
}

impl BatchOutcome {
    pub fn success(&self) -> bool {
        self.failures == 0
    }
}

/// Completion callback for one `add_glyphs` request. Invoked exactly once,
/// on the thread driving `update`, after every codepoint of the batch has
/// completed.
pub type OnComplete = Box<dyn FnOnce(RequestId, BatchOutcome)>;
