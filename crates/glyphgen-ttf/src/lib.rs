// this_file: crates/glyphgen-ttf/src/lib.rs

//! TrueType/OpenType outline faces for the glyph generator
//!
//! The production [`OutlineFace`]: parses font bytes with read-fonts, answers
//! metric questions from the head/hhea/hmtx tables, and rasterizes per-glyph
//! signed distance fields (zeno coverage mask, then a Euclidean distance
//! transform over it).
//!
//! Faces store their raw data and re-create a `FontRef` on demand for
//! parsing operations; TTC collections pick a face by index.

mod outline;
mod sdf;

pub use sdf::sdf_from_mask;

use glyphgen_core::{
    FaceBounds, FaceMetrics, GlyphGenError, GlyphHMetrics, OutlineFace, OutlineParser, Result,
    SdfBitmap,
};
use read_fonts::{FontRef, TableProvider};
use std::sync::Arc;

/// A parsed TrueType/OpenType face with the vertical metrics and global
/// bounds cached at load time.
#[derive(Debug)]
pub struct TtfFace {
    data: Vec<u8>,
    face_index: u32,
    path: String,
    metrics: FaceMetrics,
    bounds: FaceBounds,
}

impl TtfFace {
    /// Parse the first face in `data`.
    pub fn from_bytes(path: &str, data: Vec<u8>) -> Result<Self> {
        Self::from_bytes_index(path, data, 0)
    }

    /// Parse a specific face (for TTC collections).
    ///
    /// Validates the data up front and fails with
    /// [`GlyphGenError::ParseError`] when it is not an outline font or lacks
    /// the metric tables the generator depends on.
    pub fn from_bytes_index(path: &str, data: Vec<u8>, face_index: u32) -> Result<Self> {
        let parse_error = |reason: String| GlyphGenError::ParseError {
            path: path.to_string(),
            reason,
        };

        let font =
            FontRef::from_index(&data, face_index).map_err(|e| parse_error(e.to_string()))?;

        let head = font
            .head()
            .map_err(|e| parse_error(format!("head table: {e}")))?;
        let hhea = font
            .hhea()
            .map_err(|e| parse_error(format!("hhea table: {e}")))?;

        let metrics = FaceMetrics {
            ascent: f32::from(hhea.ascender().to_i16()),
            descent: f32::from(hhea.descender().to_i16()),
            line_gap: f32::from(hhea.line_gap().to_i16()),
        };
        let bounds = FaceBounds {
            x_min: f32::from(head.x_min()),
            y_min: f32::from(head.y_min()),
            x_max: f32::from(head.x_max()),
            y_max: f32::from(head.y_max()),
        };

        Ok(Self {
            data,
            face_index,
            path: path.to_string(),
            metrics,
            bounds,
        })
    }

    pub fn face_index(&self) -> u32 {
        self.face_index
    }

    /// Re-parse on demand; cheap, the table directory is tiny.
    fn font_ref(&self) -> Option<FontRef<'_>> {
        FontRef::from_index(&self.data, self.face_index).ok()
    }
}

/// `pixel_height / (ascent - descent)`, the classic scale that maps the
/// ascender-to-descender span onto the requested pixel size.
fn pixel_height_scale(ascent: f32, descent: f32, pixel_height: f32) -> f32 {
    let span = ascent - descent;
    if span <= 0.0 {
        return 0.0;
    }
    pixel_height / span
}

impl OutlineFace for TtfFace {
    fn path(&self) -> &str {
        &self.path
    }

    fn glyph_index(&self, codepoint: char) -> Option<u16> {
        self.font_ref().and_then(|font| {
            let gid = font.cmap().ok()?.map_codepoint(codepoint)?;
            u16::try_from(gid.to_u32()).ok()
        })
    }

    fn scale_for_pixel_height(&self, pixel_height: f32) -> f32 {
        pixel_height_scale(self.metrics.ascent, self.metrics.descent, pixel_height)
    }

    fn metrics(&self) -> FaceMetrics {
        self.metrics
    }

    fn bounds(&self) -> FaceBounds {
        self.bounds
    }

    fn h_metrics(&self, glyph: u16) -> GlyphHMetrics {
        self.font_ref()
            .and_then(|font| {
                let hmtx = font.hmtx().ok()?;
                let gid = read_fonts::types::GlyphId::new(u32::from(glyph));
                let advance = hmtx.advance(gid)?;
                let left_bearing = hmtx.side_bearing(gid).unwrap_or(0);
                Some(GlyphHMetrics {
                    advance: f32::from(advance),
                    left_bearing: f32::from(left_bearing),
                })
            })
            .unwrap_or_default()
    }

    fn render_sdf(
        &self,
        glyph: u16,
        scale: f32,
        padding: u32,
        edge_value: u8,
    ) -> Result<Option<SdfBitmap>> {
        if scale <= 0.0 {
            log::warn!("{}: non-positive scale for glyph {}", self.path, glyph);
            return Ok(None);
        }

        let Some(mask) = outline::rasterize_coverage(
            &self.data,
            self.face_index,
            &self.path,
            glyph,
            scale,
            padding,
        )?
        else {
            return Ok(None);
        };

        let data = sdf::sdf_from_mask(&mask.data, mask.width, mask.height, padding, edge_value);
        Ok(Some(SdfBitmap {
            width: mask.width,
            height: mask.height,
            offset_x: mask.left,
            offset_y: mask.top,
            data,
        }))
    }
}

/// The default parser wired into the generator: bytes in, [`TtfFace`] out.
#[derive(Debug, Default, Clone, Copy)]
pub struct TtfParser;

impl OutlineParser for TtfParser {
    fn parse(&self, path: &str, bytes: Vec<u8>) -> Result<Arc<dyn OutlineFace>> {
        Ok(Arc::new(TtfFace::from_bytes(path, bytes)?))
    }
}
