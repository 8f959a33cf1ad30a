// this_file: crates/glyphgen/src/raster.rs

//! Cell composition: the worker-phase half of glyph generation
//!
//! Turns (face, codepoint, render parameters) into a cache-cell-sized buffer
//! plus glyph metrics. Pure compute, no I/O and no locks, so it can run on
//! the worker thread against an `Arc`'d face.

use flate2::write::DeflateEncoder;
use flate2::Compression;
use glyphgen_core::{
    CellCompression, GlyphCell, GlyphGenError, GlyphMetrics, OutlineFace, Result,
};
use std::io::Write;

/// Codepoints that render nothing but still count as added glyphs.
const WHITESPACE: [char; 4] = [' ', '\t', '\n', '\u{200B}'];

pub(crate) fn is_whitespace(codepoint: char) -> bool {
    WHITESPACE.contains(&codepoint)
}

/// Per-instance parameters copied into every job, so the worker never
/// touches the instance registry.
#[derive(Debug, Clone, Copy)]
pub(crate) struct RenderJobParams {
    pub scale: f32,
    pub padding: u32,
    pub edge_value: u8,
    pub cell_width: u32,
    pub cell_height: u32,
    pub cell_max_ascent: u32,
    pub has_shadow: bool,
    pub compress_cells: bool,
}

/// Generate the cell for one codepoint.
///
/// Whitespace short-circuits to an empty cell with zero visual metrics (the
/// advance is still real when the face maps the codepoint). A mapped glyph
/// without an outline also yields an empty cell; only an unmapped
/// non-whitespace codepoint is an error.
pub(crate) fn compose_cell(
    face: &dyn OutlineFace,
    codepoint: char,
    params: &RenderJobParams,
) -> Result<(GlyphMetrics, GlyphCell)> {
    let face_metrics = face.metrics();
    let ascent = face_metrics.ascent * params.scale;
    let descent = -face_metrics.descent * params.scale;

    if is_whitespace(codepoint) {
        let advance = face
            .glyph_index(codepoint)
            .map(|glyph| face.h_metrics(glyph).advance * params.scale)
            .unwrap_or(0.0);
        let metrics = GlyphMetrics {
            width: 0,
            height: 0,
            channels: 1,
            advance,
            left_bearing: 0.0,
            ascent,
            descent,
        };
        return Ok((metrics, GlyphCell::empty()));
    }

    let glyph = face
        .glyph_index(codepoint)
        .ok_or_else(|| GlyphGenError::GlyphMissing {
            codepoint,
            font: face.path().to_string(),
        })?;

    let h_metrics = face.h_metrics(glyph);
    let mut metrics = GlyphMetrics {
        width: params.cell_width,
        height: params.cell_height,
        channels: if params.has_shadow { 3 } else { 1 },
        advance: h_metrics.advance * params.scale,
        left_bearing: h_metrics.left_bearing * params.scale,
        ascent,
        descent,
    };

    let Some(sdf) = face.render_sdf(glyph, params.scale, params.padding, params.edge_value)?
    else {
        // mapped but outline-less, e.g. NBSP: added with no pixels
        metrics.width = 0;
        metrics.height = 0;
        metrics.channels = 1;
        return Ok((metrics, GlyphCell::empty()));
    };

    let mut cell = vec![0u8; (params.cell_width * params.cell_height) as usize];
    let top = params.cell_max_ascent as i32 + sdf.offset_y;
    blit(
        &mut cell,
        params.cell_width,
        params.cell_height,
        1,
        &sdf.data,
        sdf.width,
        sdf.height,
        1,
        0,
        top,
    );

    let data = if params.has_shadow {
        expand_shadow(&cell)
    } else {
        cell
    };
    Ok((metrics, encode_cell(data, params.compress_cells)))
}

/// Copy `src` into `dst` at `(x, y)`, dropping pixels outside the
/// destination. Copies are additive-opaque: fully transparent pixels of a
/// 4-channel source keep the destination, everything else overwrites it,
/// with missing source channels read as 255.
#[allow(clippy::too_many_arguments)]
pub(crate) fn blit(
    dst: &mut [u8],
    dst_width: u32,
    dst_height: u32,
    dst_channels: u32,
    src: &[u8],
    src_width: u32,
    src_height: u32,
    src_channels: u32,
    x: i32,
    y: i32,
) {
    let src_channels = src_channels as usize;
    let dst_channels = dst_channels as usize;
    for sy in 0..src_height as i32 {
        let dy = y + sy;
        if dy < 0 || dy >= dst_height as i32 {
            continue;
        }
        for sx in 0..src_width as i32 {
            let dx = x + sx;
            if dx < 0 || dx >= dst_width as i32 {
                continue;
            }
            let sp = (sy as usize * src_width as usize + sx as usize) * src_channels;
            if src_channels == 4 && src[sp + 3] == 0 {
                continue;
            }
            let dp = (dy as usize * dst_width as usize + dx as usize) * dst_channels;
            for c in 0..dst_channels {
                dst[dp + c] = if c < src_channels { src[sp + c] } else { 255 };
            }
        }
    }
}

/// Grow a single-channel cell to the three layers of a shadowed font:
/// channel 0 carries the face, channel 1 the outline (empty until a real
/// outline pass exists), channel 2 the shadow. The shadow is the unblurred
/// face for now; the cell padding already reserves room for the blur.
fn expand_shadow(cell: &[u8]) -> Vec<u8> {
    let mut expanded = vec![0u8; cell.len() * 3];
    for (i, &value) in cell.iter().enumerate() {
        expanded[i * 3] = value;
        expanded[i * 3 + 2] = value;
    }
    expanded
}

/// Deflate the cell when asked to and when it actually helps.
fn encode_cell(data: Vec<u8>, compress: bool) -> GlyphCell {
    if compress {
        let mut encoder = DeflateEncoder::new(
            Vec::with_capacity(data.len() / 2),
            Compression::default(),
        );
        let compressed = encoder
            .write_all(&data)
            .and_then(|()| encoder.finish())
            .ok();
        if let Some(compressed) = compressed {
            if compressed.len() < data.len() {
                return GlyphCell {
                    compression: CellCompression::Deflate,
                    data: compressed,
                };
            }
        }
    }
    GlyphCell {
        compression: CellCompression::None,
        data,
    }
}
