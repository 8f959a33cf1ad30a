// this_file: crates/glyphgen-core/src/error.rs

//! Error types for the glyph generation pipeline

use thiserror::Error;

pub type Result<T> = std::result::Result<T, GlyphGenError>;

/// Main error type for glyph generation
#[derive(Debug, Error)]
pub enum GlyphGenError {
    /// No resource exists at the given path.
    #[error("Resource not found: {0}")]
    ResourceNotFound(String),

    /// The resource at the path is not of the expected kind.
    #[error("Resource type mismatch at '{path}': expected '{expected}', found '{found}'")]
    TypeMismatch {
        path: String,
        expected: String,
        found: String,
    },

    /// The byte stream at the path is not a valid outline font.
    #[error("Invalid outline font at '{path}': {reason}")]
    ParseError { path: String, reason: String },

    /// The compiled font requests an output format the generator cannot produce.
    #[error("Unsupported output format for '{path}': {detail}")]
    UnsupportedFormat { path: String, detail: String },

    /// A font instance with this path already exists.
    #[error("Font already loaded: {0}")]
    DuplicateLoad(String),

    /// The operation names a font instance that was never loaded.
    #[error("Font not loaded: {0}")]
    NotLoaded(String),

    /// The codepoint has no glyph in the font and is not whitespace.
    #[error("No glyph for U+{:04X} in font '{}'", *codepoint as u32, font)]
    GlyphMissing { codepoint: char, font: String },

    /// The glyph store refused a geometry or add-glyph call.
    #[error("Glyph cache rejected {0}")]
    CacheRejected(String),

    /// The instance still has glyph jobs in flight.
    #[error("Cannot unload '{0}': glyph jobs still pending")]
    JobsPending(String),

    /// The worker thread is gone; no further jobs can be submitted.
    #[error("Glyph worker thread unavailable")]
    WorkerGone,

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn glyph_missing_names_the_codepoint() {
        let err = GlyphGenError::GlyphMissing {
            codepoint: '\u{E000}',
            font: "/fonts/body.ttf".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("U+E000"), "got: {msg}");
        assert!(msg.contains("/fonts/body.ttf"));
    }

    #[test]
    fn type_mismatch_reports_both_sides() {
        let err = GlyphGenError::TypeMismatch {
            path: "/main.fontc".to_string(),
            expected: "fontc".to_string(),
            found: "texturec".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("fontc") && msg.contains("texturec"));
    }
}
