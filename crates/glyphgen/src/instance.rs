// this_file: crates/glyphgen/src/instance.rs

//! Font instances: a compiled font bound to its outline face
//!
//! Everything derived at load time lives here: the padding expansion for
//! outline and shadow layers, the pixel scale for the nominal size, and the
//! cache-cell geometry the glyph store is told to allocate.

use crate::raster::RenderJobParams;
use glyphgen_core::{
    FaceBounds, FontInfo, GeneratorConfig, OutlineFace, RenderMode, ResourceDescriptor,
};
use std::f32::consts::SQRT_2;
use std::sync::Arc;

/// Fixed size of the atlas slot every glyph of one instance occupies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellGeometry {
    pub width: u32,
    pub height: u32,
    /// Cell top to baseline, in pixels.
    pub max_ascent: u32,
}

/// Total SDF padding for a compiled font.
///
/// Outline and shadow layers of multi-layer fonts push the distance field
/// further out; the `SQRT_2` term covers diagonal strokes and the doubling
/// matches the output of the offline generator this replaces. Single-layer
/// fonts keep the base padding regardless of descriptor values.
pub(crate) fn padding_for(base: u32, info: &FontInfo) -> u32 {
    let mut padding = base as f32;
    if info.render_mode == RenderMode::MultiLayer {
        if info.outline_width > 0.0 {
            padding += 2.0 * (info.outline_width + SQRT_2);
        }
        if info.shadow_blur > 0 {
            padding += 2.0 * (info.shadow_blur as f32 + SQRT_2);
        }
    }
    padding.ceil() as u32
}

/// Cell geometry from the face's global glyph bounds.
///
/// The scaled bounds round up before the padding add, so the cell never
/// clips the widest or tallest glyph of the face.
pub(crate) fn cell_geometry(padding: u32, scale: f32, bounds: &FaceBounds) -> CellGeometry {
    CellGeometry {
        width: padding + (bounds.width() * scale).ceil() as u32,
        height: padding + (bounds.height() * scale).ceil() as u32,
        max_ascent: padding + (bounds.y_max * scale).ceil() as u32,
    }
}

/// One logical renderable font: a compiled-font descriptor, its shared
/// outline face, and the parameters derived from both.
///
/// Holding the descriptor `Arc` keeps the host resource loaded and holding
/// the face `Arc` keeps the outline registry entry alive; dropping the
/// instance releases both.
pub(crate) struct FontInstance {
    pub font_path: String,
    pub descriptor: Arc<dyn ResourceDescriptor>,
    pub face: Arc<dyn OutlineFace>,
    pub info: FontInfo,
    pub padding: u32,
    pub edge_value: u8,
    pub scale: f32,
    pub has_shadow: bool,
    pub cell: CellGeometry,
}

impl FontInstance {
    pub fn new(
        font_path: &str,
        descriptor: Arc<dyn ResourceDescriptor>,
        face: Arc<dyn OutlineFace>,
        info: FontInfo,
        config: &GeneratorConfig,
    ) -> Self {
        let padding = padding_for(config.base_padding, &info);
        let scale = face.scale_for_pixel_height(info.size as f32);
        let cell = cell_geometry(padding, scale, &face.bounds());
        Self {
            font_path: font_path.to_string(),
            descriptor,
            face,
            info,
            padding,
            edge_value: config.edge_value,
            scale,
            has_shadow: info.has_shadow(),
            cell,
        }
    }

    /// Baseline to highest ascender, scaled pixels.
    pub fn ascent(&self) -> f32 {
        self.face.metrics().ascent * self.scale
    }

    /// Baseline to lowest descender as a positive distance, scaled pixels.
    pub fn descent(&self) -> f32 {
        -self.face.metrics().descent * self.scale
    }

    /// Baseline-to-baseline distance, scaled pixels.
    pub fn line_height(&self) -> f32 {
        let metrics = self.face.metrics();
        (metrics.ascent - metrics.descent + metrics.line_gap) * self.scale
    }

    /// Everything the worker thread needs to rasterize one of our glyphs.
    pub fn render_params(&self, compress_cells: bool) -> RenderJobParams {
        RenderJobParams {
            scale: self.scale,
            padding: self.padding,
            edge_value: self.edge_value,
            cell_width: self.cell.width,
            cell_height: self.cell.height,
            cell_max_ascent: self.cell.max_ascent,
            has_shadow: self.has_shadow,
            compress_cells,
        }
    }
}
