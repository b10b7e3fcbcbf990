//! Shared test utilities for the og-card test suite.
//!
//! Provides an in-memory [`ContentSource`] backed by a temp directory (so
//! output files land somewhere real) and builders for render items.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let source = MemorySource::new()
//!     .with("posts", vec![post("Hello World")])
//!     .with_asset("/assets/me.png", b"not decoded here");
//!
//! let report = render_site_with_backend(&MockCanvas::new(), &config, &source, None);
//! ```

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

use crate::content::{ContentError, ContentSource};
use crate::naming::slugify;
use crate::types::RenderItem;

// =========================================================================
// Content source
// =========================================================================

/// Collections and assets held in memory; outputs go to a temp directory.
pub struct MemorySource {
    dir: TempDir,
    collections: HashMap<String, Vec<RenderItem>>,
    assets: HashMap<String, Vec<u8>>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().unwrap(),
            collections: HashMap::new(),
            assets: HashMap::new(),
        }
    }

    pub fn with(mut self, name: &str, items: Vec<RenderItem>) -> Self {
        self.collections.insert(name.to_string(), items);
        self
    }

    /// Register an asset under its site-relative path (leading `/` optional).
    pub fn with_asset(mut self, path: &str, bytes: &[u8]) -> Self {
        self.assets
            .insert(path.trim_start_matches('/').to_string(), bytes.to_vec());
        self
    }
}

impl ContentSource for MemorySource {
    fn root(&self) -> &Path {
        self.dir.path()
    }

    fn list_collection(&self, name: &str) -> Result<Option<Vec<RenderItem>>, ContentError> {
        Ok(self.collections.get(name).cloned())
    }

    fn read_asset(&self, path: &str) -> Option<Vec<u8>> {
        self.assets.get(path.trim_start_matches('/')).cloned()
    }
}

// =========================================================================
// Item builders
// =========================================================================

/// Item with a title and nothing else.
pub fn item(title: &str) -> RenderItem {
    RenderItem {
        source_path: PathBuf::from(format!("{}.md", slugify(title))),
        basename: slugify(title),
        title: Some(title.to_string()),
        ..RenderItem::default()
    }
}

/// Item as it would come out of `_posts/`.
pub fn post(title: &str) -> RenderItem {
    let slug = slugify(title);
    RenderItem {
        source_path: PathBuf::from(format!("_posts/2024-01-05-{slug}.md")),
        ..item(title)
    }
}
