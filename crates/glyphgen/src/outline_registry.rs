// this_file: crates/glyphgen/src/outline_registry.rs

//! Shared outline faces, one per path
//!
//! Several font instances can reference the same outline file at different
//! sizes; parsing it once and sharing the face is the whole point of this
//! registry. Entries are weak: a face lives exactly as long as the instances
//! (and in-flight jobs) holding it, and a dead entry is pruned the next time
//! the registry is consulted.

use glyphgen_core::{OutlineFace, OutlineParser, ResourceSource, Result};
use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::hash::{Hash, Hasher};
use std::sync::{Arc, Weak};

fn path_key(path: &str) -> u64 {
    let mut hasher = DefaultHasher::new();
    path.hash(&mut hasher);
    hasher.finish()
}

pub(crate) struct OutlineRegistry {
    parser: Box<dyn OutlineParser>,
    entries: HashMap<u64, Weak<dyn OutlineFace>>,
}

impl OutlineRegistry {
    pub fn new(parser: Box<dyn OutlineParser>) -> Self {
        Self {
            parser,
            entries: HashMap::new(),
        }
    }

    /// Return the face for `path`, parsing it on first use.
    ///
    /// A resident face is shared; otherwise the bytes come from `source` and
    /// go through the parser. Fetch and parse happen before the table is
    /// touched, so a missing path or malformed file leaves no trace.
    pub fn acquire(
        &mut self,
        source: &dyn ResourceSource,
        path: &str,
    ) -> Result<Arc<dyn OutlineFace>> {
        let key = path_key(path);
        if let Some(face) = self.entries.get(&key).and_then(Weak::upgrade) {
            log::debug!("outline '{path}' already resident, sharing");
            return Ok(face);
        }

        let bytes = source.get_raw(path)?;
        let face = self.parser.parse(path, bytes)?;
        log::debug!("parsed outline '{path}'");

        self.entries.retain(|_, entry| entry.strong_count() > 0);
        self.entries.insert(key, Arc::downgrade(&face));
        Ok(face)
    }

    /// Number of faces currently kept alive by at least one owner.
    pub fn resident_count(&self) -> usize {
        self.entries
            .values()
            .filter(|entry| entry.strong_count() > 0)
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glyphgen_core::{
        FaceBounds, FaceMetrics, GlyphGenError, GlyphHMetrics, SdfBitmap,
    };
    use std::cell::Cell;
    use std::rc::Rc;

    #[derive(Debug)]
    struct StubFace {
        path: String,
    }

    impl OutlineFace for StubFace {
        fn path(&self) -> &str {
            &self.path
        }
        fn glyph_index(&self, _codepoint: char) -> Option<u16> {
            None
        }
        fn scale_for_pixel_height(&self, _pixel_height: f32) -> f32 {
            1.0
        }
        fn metrics(&self) -> FaceMetrics {
            FaceMetrics::default()
        }
        fn bounds(&self) -> FaceBounds {
            FaceBounds::default()
        }
        fn h_metrics(&self, _glyph: u16) -> GlyphHMetrics {
            GlyphHMetrics::default()
        }
        fn render_sdf(
            &self,
            _glyph: u16,
            _scale: f32,
            _padding: u32,
            _edge_value: u8,
        ) -> Result<Option<SdfBitmap>> {
            Ok(None)
        }
    }

    struct CountingParser {
        parses: Rc<Cell<usize>>,
    }

    impl OutlineParser for CountingParser {
        fn parse(&self, path: &str, bytes: Vec<u8>) -> Result<Arc<dyn OutlineFace>> {
            if bytes.is_empty() {
                return Err(GlyphGenError::ParseError {
                    path: path.to_string(),
                    reason: "empty".to_string(),
                });
            }
            self.parses.set(self.parses.get() + 1);
            Ok(Arc::new(StubFace {
                path: path.to_string(),
            }))
        }
    }

    struct StubSource;

    impl ResourceSource for StubSource {
        fn get_raw(&self, path: &str) -> Result<Vec<u8>> {
            match path {
                "/missing.ttf" => Err(GlyphGenError::ResourceNotFound(path.to_string())),
                "/broken.ttf" => Ok(Vec::new()),
                _ => Ok(vec![1, 2, 3]),
            }
        }
        fn get(&self, path: &str) -> Result<Arc<dyn glyphgen_core::ResourceDescriptor>> {
            Err(GlyphGenError::ResourceNotFound(path.to_string()))
        }
    }

    fn registry_with_counter() -> (OutlineRegistry, Rc<Cell<usize>>) {
        let parses = Rc::new(Cell::new(0));
        let registry = OutlineRegistry::new(Box::new(CountingParser {
            parses: parses.clone(),
        }));
        (registry, parses)
    }

    #[test]
    fn same_path_parses_once_and_shares() {
        let (mut registry, parses) = registry_with_counter();
        let a = registry.acquire(&StubSource, "/fonts/body.ttf").unwrap();
        let b = registry.acquire(&StubSource, "/fonts/body.ttf").unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(parses.get(), 1);
        assert_eq!(registry.resident_count(), 1);
    }

    #[test]
    fn distinct_paths_get_distinct_faces() {
        let (mut registry, parses) = registry_with_counter();
        let a = registry.acquire(&StubSource, "/a.ttf").unwrap();
        let b = registry.acquire(&StubSource, "/b.ttf").unwrap();
        assert!(!Arc::ptr_eq(&a, &b));
        assert_eq!(parses.get(), 2);
        assert_eq!(registry.resident_count(), 2);
    }

    #[test]
    fn dropping_all_owners_releases_the_face() {
        let (mut registry, parses) = registry_with_counter();
        let face = registry.acquire(&StubSource, "/a.ttf").unwrap();
        assert_eq!(registry.resident_count(), 1);
        drop(face);
        assert_eq!(registry.resident_count(), 0);

        // the dead entry is replaced by a fresh parse
        let _face = registry.acquire(&StubSource, "/a.ttf").unwrap();
        assert_eq!(parses.get(), 2);
        assert_eq!(registry.resident_count(), 1);
    }

    #[test]
    fn one_owner_keeps_the_face_alive() {
        let (mut registry, parses) = registry_with_counter();
        let keep = registry.acquire(&StubSource, "/a.ttf").unwrap();
        let other = registry.acquire(&StubSource, "/a.ttf").unwrap();
        drop(other);
        assert_eq!(registry.resident_count(), 1);
        let again = registry.acquire(&StubSource, "/a.ttf").unwrap();
        assert!(Arc::ptr_eq(&keep, &again));
        assert_eq!(parses.get(), 1);
    }

    #[test]
    fn missing_path_leaves_no_entry() {
        let (mut registry, _) = registry_with_counter();
        let err = registry.acquire(&StubSource, "/missing.ttf").unwrap_err();
        assert!(matches!(err, GlyphGenError::ResourceNotFound(_)));
        assert_eq!(registry.resident_count(), 0);
    }

    #[test]
    fn parse_failure_leaves_no_entry() {
        let (mut registry, _) = registry_with_counter();
        let err = registry.acquire(&StubSource, "/broken.ttf").unwrap_err();
        assert!(matches!(err, GlyphGenError::ParseError { .. }));
        assert_eq!(registry.resident_count(), 0);
    }
}
