//! Shared types passed between the content source, layout and render stages.
//!
//! These types are serialized into the render report, so the item's
//! write-back descriptor reads the same in memory and on disk.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Image reference attached to an item once its card exists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageDescriptor {
    /// Site-relative public path with a leading slash.
    pub path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alt: Option<String>,
}

/// One post, page, or collection entry as seen by the renderer.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RenderItem {
    /// Source file, relative to the site root.
    pub source_path: PathBuf,
    /// File stem, used when there is no title or slug.
    pub basename: String,
    pub title: Option<String>,
    /// Explicit slug from front matter.
    pub slug: Option<String>,
    pub draft: bool,
    pub date: Option<NaiveDateTime>,
    pub tags: Vec<String>,
    /// Every other scalar front-matter value, by key.
    pub fields: BTreeMap<String, String>,
    /// Per-item `og_image` table merged over the site config.
    pub overrides: Option<toml::Table>,
    /// Image the item already carries, or the card written back for it.
    pub image: Option<ImageDescriptor>,
}

impl RenderItem {
    /// Attach `descriptor` unless the item already carries an image.
    ///
    /// Returns whether the descriptor was attached.
    pub fn set_image_once(&mut self, descriptor: ImageDescriptor) -> bool {
        if self.image.is_some() {
            return false;
        }
        self.image = Some(descriptor);
        true
    }

    /// Title text, if present and non-blank.
    pub fn title(&self) -> Option<&str> {
        self.title.as_deref().filter(|t| !t.trim().is_empty())
    }

    /// Custom text field, if present and non-blank.
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields
            .get(name)
            .map(String::as_str)
            .filter(|v| !v.trim().is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn descriptor(path: &str) -> ImageDescriptor {
        ImageDescriptor {
            path: path.to_string(),
            width: Some(1200),
            height: Some(600),
            alt: Some("Hello".to_string()),
        }
    }

    #[test]
    fn set_image_once_attaches_when_empty() {
        let mut item = RenderItem::default();
        assert!(item.set_image_once(descriptor("/og/a.png")));
        assert_eq!(item.image.unwrap().path, "/og/a.png");
    }

    #[test]
    fn set_image_once_never_overwrites() {
        let mut item = RenderItem::default();
        item.set_image_once(descriptor("/first.png"));

        assert!(!item.set_image_once(descriptor("/second.png")));
        assert_eq!(item.image.unwrap().path, "/first.png");
    }

    #[test]
    fn blank_title_and_fields_are_absent() {
        let mut item = RenderItem {
            title: Some("  ".to_string()),
            ..RenderItem::default()
        };
        item.fields.insert("author".to_string(), String::new());
        item.fields.insert("lang".to_string(), "en".to_string());

        assert_eq!(item.title(), None);
        assert_eq!(item.field("author"), None);
        assert_eq!(item.field("lang"), Some("en"));
        assert_eq!(item.field("missing"), None);
    }

    #[test]
    fn descriptor_json_skips_missing_dimensions() {
        let d = ImageDescriptor {
            path: "/x.png".to_string(),
            width: None,
            height: None,
            alt: None,
        };
        let json = serde_json::to_string(&d).unwrap();
        assert_eq!(json, r#"{"path":"/x.png"}"#);
    }
}
