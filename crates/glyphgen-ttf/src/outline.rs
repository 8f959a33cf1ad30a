// this_file: crates/glyphgen-ttf/src/outline.rs

//! Outline extraction and coverage rasterization
//!
//! Builds each glyph outline in two forms at once: an SVG path string for
//! zeno's rasterizer and a kurbo path for exact bounds. The pixel scale is
//! folded into the pen, so every downstream coordinate is already in scaled
//! pixel space.

use glyphgen_core::{GlyphGenError, Result};
use kurbo::Shape;
use read_fonts::FontRef;
use skrifa::instance::{LocationRef, Size};
use skrifa::outline::DrawSettings;
use skrifa::{GlyphId, MetadataProvider};
use zeno::Mask;

/// A y-down coverage mask around one glyph, margin included on every side.
pub(crate) struct CoverageMask {
    pub width: u32,
    pub height: u32,
    /// Pen origin to left box edge, pixels.
    pub left: i32,
    /// Baseline to top box edge, y-down pixels (negative above baseline).
    pub top: i32,
    pub data: Vec<u8>,
}

/// Rasterize the coverage of `glyph` at `scale` into a tight box grown by
/// `margin` pixels. Returns `Ok(None)` for glyphs without an outline.
pub(crate) fn rasterize_coverage(
    font_data: &[u8],
    face_index: u32,
    source_path: &str,
    glyph: u16,
    scale: f32,
    margin: u32,
) -> Result<Option<CoverageMask>> {
    let font = FontRef::from_index(font_data, face_index).map_err(|e| GlyphGenError::ParseError {
        path: source_path.to_string(),
        reason: e.to_string(),
    })?;

    let outlines = font.outline_glyphs();
    let Some(outline) = outlines.get(GlyphId::new(u32::from(glyph))) else {
        return Ok(None);
    };

    let mut pen = ScaledPathPen::new(scale);
    let settings = DrawSettings::unhinted(Size::unscaled(), LocationRef::default());
    outline
        .draw(settings, &mut pen)
        .map_err(|e| GlyphGenError::ParseError {
            path: source_path.to_string(),
            reason: format!("outline of glyph {glyph}: {e}"),
        })?;

    let (path_data, bez_path) = pen.finish();
    let bbox = bez_path.bounding_box();

    // Empty outlines (space and friends) produce an unbounded box
    if bbox.x0.is_infinite() || bbox.y0.is_infinite() || bbox.x1.is_infinite() || bbox.y1.is_infinite()
    {
        return Ok(None);
    }

    // Integer pixel box, still y-up
    let x0 = bbox.x0.floor() as i32;
    let x1 = bbox.x1.ceil() as i32;
    let y0 = bbox.y0.floor() as i32;
    let y1 = bbox.y1.ceil() as i32;
    let glyph_w = (x1 - x0).max(0) as u32;
    let glyph_h = (y1 - y0).max(0) as u32;
    if glyph_w == 0 || glyph_h == 0 {
        return Ok(None);
    }

    let width = glyph_w + 2 * margin;
    let height = glyph_h + 2 * margin;
    let m = margin as i32;

    let mut mask = vec![0u8; (width * height) as usize];
    Mask::new(path_data.as_str())
        .size(width, height)
        .offset((m - x0, m - y0))
        .render_into(&mut mask, None);

    // Font coordinates are y-up, bitmaps are y-down
    let w = width as usize;
    for y in 0..(height / 2) as usize {
        let top_row = y * w;
        let bottom_row = (height as usize - 1 - y) * w;
        for x in 0..w {
            mask.swap(top_row + x, bottom_row + x);
        }
    }

    Ok(Some(CoverageMask {
        width,
        height,
        left: x0 - m,
        top: -y1 - m,
        data: mask,
    }))
}

/// Dual-output path pen: SVG commands for zeno, kurbo path for bounds.
struct ScaledPathPen {
    commands: Vec<String>,
    bez_path: kurbo::BezPath,
    scale: f32,
}

impl ScaledPathPen {
    fn new(scale: f32) -> Self {
        Self {
            commands: Vec::new(),
            bez_path: kurbo::BezPath::new(),
            scale,
        }
    }

    fn finish(self) -> (String, kurbo::BezPath) {
        (self.commands.join(" "), self.bez_path)
    }
}

impl skrifa::outline::OutlinePen for ScaledPathPen {
    fn move_to(&mut self, x: f32, y: f32) {
        let x = x * self.scale;
        let y = y * self.scale;
        self.commands.push(format!("M {:.3},{:.3}", x, y));
        self.bez_path.move_to((f64::from(x), f64::from(y)));
    }

    fn line_to(&mut self, x: f32, y: f32) {
        let x = x * self.scale;
        let y = y * self.scale;
        self.commands.push(format!("L {:.3},{:.3}", x, y));
        self.bez_path.line_to((f64::from(x), f64::from(y)));
    }

    fn quad_to(&mut self, cx: f32, cy: f32, x: f32, y: f32) {
        let cx = cx * self.scale;
        let cy = cy * self.scale;
        let x = x * self.scale;
        let y = y * self.scale;
        self.commands
            .push(format!("Q {:.3},{:.3} {:.3},{:.3}", cx, cy, x, y));
        self.bez_path
            .quad_to((f64::from(cx), f64::from(cy)), (f64::from(x), f64::from(y)));
    }

    fn curve_to(&mut self, cx0: f32, cy0: f32, cx1: f32, cy1: f32, x: f32, y: f32) {
        let cx0 = cx0 * self.scale;
        let cy0 = cy0 * self.scale;
        let cx1 = cx1 * self.scale;
        let cy1 = cy1 * self.scale;
        let x = x * self.scale;
        let y = y * self.scale;
        self.commands.push(format!(
            "C {:.3},{:.3} {:.3},{:.3} {:.3},{:.3}",
            cx0, cy0, cx1, cy1, x, y
        ));
        self.bez_path.curve_to(
            (f64::from(cx0), f64::from(cy0)),
            (f64::from(cx1), f64::from(cy1)),
            (f64::from(x), f64::from(y)),
        );
    }

    fn close(&mut self) {
        self.commands.push("Z".to_string());
        self.bez_path.close_path();
    }
}
