// this_file: crates/glyphgen-core/src/lib.rs

//! Glyphgen Core: the contracts of the glyph generation pipeline
//!
//! A text renderer that draws from a glyph atlas needs someone to fill that
//! atlas. This crate defines the shared vocabulary for the pipeline that does
//! the filling: the collaborator traits the host implements, the data types
//! that cross the seams, the error taxonomy, and the configuration.
//!
//! ## The Seams
//!
//! - [`OutlineFace`] - a parsed outline font, reduced to glyph lookup,
//!   metrics, and SDF rasterization
//! - [`ResourceSource`] - the host's resource subsystem (bytes and typed
//!   descriptors by path)
//! - [`GlyphStore`] - the host's glyph cache/atlas that receives generated
//!   cells
//!
//! The pipeline itself lives in the `glyphgen` crate; the production
//! TrueType/OpenType face lives in `glyphgen-ttf`. Everything here is plain
//! data and traits so tests can stand in their own collaborators.

pub mod config;
pub mod error;
pub mod traits;
pub mod types;

pub use config::GeneratorConfig;
pub use error::{GlyphGenError, Result};
pub use traits::{
    GlyphStore, OutlineFace, OutlineParser, ResourceDescriptor, ResourceSource, COMPILED_FONT_TYPE,
};
pub use types::{
    BatchOutcome, CellCompression, FaceBounds, FaceMetrics, FontId, FontInfo, GlyphCell,
    GlyphHMetrics, GlyphMetrics, OnComplete, OutputFormat, RenderMode, RequestId, SdfBitmap,
};
