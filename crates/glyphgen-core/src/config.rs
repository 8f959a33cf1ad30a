// this_file: crates/glyphgen-core/src/config.rs

//! Generator configuration

use crate::error::{GlyphGenError, Result};

/// Tunables for a generator, applied to every font instance it loads.
#[derive(Debug, Clone)]
pub struct GeneratorConfig {
    /// SDF padding in pixels before outline/shadow expansion. The distance
    /// field spans exactly this many pixels outward from the edge.
    pub base_padding: u32,
    /// SDF value at the glyph edge, 1..=255. Values above it are inside.
    pub edge_value: u8,
    /// Deflate generated cell buffers when that makes them smaller.
    pub compress_cells: bool,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            base_padding: 3,
            edge_value: 190,
            compress_cells: false,
        }
    }
}

impl GeneratorConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_base_padding(mut self, padding: u32) -> Self {
        self.base_padding = padding;
        self
    }

    pub fn with_edge_value(mut self, edge_value: u8) -> Self {
        self.edge_value = edge_value;
        self
    }

    pub fn with_cell_compression(mut self, compress: bool) -> Self {
        self.compress_cells = compress;
        self
    }

    /// The distance-to-value scale divides by the padding, so both knobs
    /// must be nonzero.
    pub fn validate(&self) -> Result<()> {
        if self.base_padding == 0 {
            return Err(GlyphGenError::Config(
                "base_padding must be at least 1".to_string(),
            ));
        }
        if self.edge_value == 0 {
            return Err(GlyphGenError::Config(
                "edge_value must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = GeneratorConfig::default();
        assert_eq!(config.base_padding, 3);
        assert_eq!(config.edge_value, 190);
        assert!(!config.compress_cells);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn zero_padding_is_rejected() {
        let config = GeneratorConfig::new().with_base_padding(0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn zero_edge_is_rejected() {
        let config = GeneratorConfig::new().with_edge_value(0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn builder_setters_apply() {
        let config = GeneratorConfig::new()
            .with_base_padding(5)
            .with_edge_value(128)
            .with_cell_compression(true);
        assert_eq!(config.base_padding, 5);
        assert_eq!(config.edge_value, 128);
        assert!(config.compress_cells);
    }
}
