//! Content discovery: collections of posts, pages and entries.
//!
//! The renderer only needs the [`ContentSource`] trait. [`SiteSource`]
//! implements it over a site directory laid out the usual static-site way:
//!
//! ```text
//! site/
//! ├── config.toml
//! ├── about.md                     # page
//! ├── blog/index.html              # page
//! ├── _posts/
//! │   └── 2024-01-05-hello.md      # post (date from file name)
//! ├── _projects/
//! │   └── og-card.md               # entry of the "projects" collection
//! └── assets/
//! ```
//!
//! ## Front Matter
//!
//! Content files start with a TOML block delimited by `+++`:
//!
//! ```text
//! +++
//! title = "Hello World"
//! date = 2024-01-05
//! tags = ["rust", "cards"]
//! author = "Ada"
//!
//! [og_image]                      # per-item card config override
//! domain = "ada.dev"
//! +++
//! ```
//!
//! Files without front matter are not content and are skipped. Known keys
//! (`title`, `slug`, `draft`, `date`, `tags`, `image`, `og_image`) are read
//! into [`RenderItem`] fields; every scalar value (and every array of scalars,
//! joined with `", "`) is also available by key as a custom field.

use crate::naming;
use crate::types::{ImageDescriptor, RenderItem};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum ContentError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid front matter in {}: {source}", path.display())]
    FrontMatter {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// Where render items come from.
///
/// `Sync` so collections can be rendered from rayon workers.
pub trait ContentSource: Sync {
    /// Site root: output paths and assets are relative to it.
    fn root(&self) -> &Path;

    /// Items of a collection in a stable order, or `None` if the site has no
    /// collection by that name.
    fn list_collection(&self, name: &str) -> Result<Option<Vec<RenderItem>>, ContentError>;

    /// Bytes of a site-relative asset (a leading `/` is allowed), or `None`
    /// if it cannot be read.
    fn read_asset(&self, path: &str) -> Option<Vec<u8>>;
}

const CONTENT_EXTENSIONS: &[&str] = &["md", "markdown", "html"];

/// Content source over a site directory.
pub struct SiteSource {
    root: PathBuf,
}

impl SiteSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Directory holding a `_`-prefixed collection (`posts` → `_posts`).
    fn collection_dir(&self, name: &str) -> PathBuf {
        self.root.join(format!("_{name}"))
    }

    /// Front-mattered files under `dir`, sorted by path.
    ///
    /// With `skip_private`, directories starting with `_` or `.` are not entered.
    fn content_files(&self, dir: &Path, skip_private: bool) -> Result<Vec<PathBuf>, ContentError> {
        let mut files = Vec::new();
        let walker = WalkDir::new(dir)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| {
                !(skip_private
                    && e.depth() > 0
                    && e.file_type().is_dir()
                    && e.file_name()
                        .to_str()
                        .is_some_and(|n| n.starts_with('_') || n.starts_with('.')))
            });
        for entry in walker {
            let entry = entry.map_err(std::io::Error::from)?;
            if entry.file_type().is_file() && is_content_file(entry.path()) {
                files.push(entry.into_path());
            }
        }
        Ok(files)
    }

    fn load_items(&self, files: Vec<PathBuf>, dated_names: bool) -> Result<Vec<RenderItem>, ContentError> {
        let mut items = Vec::new();
        for path in files {
            let content = fs::read_to_string(&path)?;
            let rel = path.strip_prefix(&self.root).unwrap_or(&path);
            match parse_item(rel, &content, dated_names) {
                Ok(Some(item)) => items.push(item),
                Ok(None) => debug!(path = %rel.display(), "no front matter, skipping"),
                Err(source) => warn!(
                    path = %rel.display(),
                    error = %source,
                    "invalid front matter, skipping"
                ),
            }
        }
        Ok(items)
    }
}

impl ContentSource for SiteSource {
    fn root(&self) -> &Path {
        &self.root
    }

    fn list_collection(&self, name: &str) -> Result<Option<Vec<RenderItem>>, ContentError> {
        let (files, dated) = if name == "pages" {
            (self.content_files(&self.root, true)?, false)
        } else {
            let dir = self.collection_dir(name);
            if !dir.is_dir() {
                return Ok(None);
            }
            (self.content_files(&dir, false)?, name == "posts")
        };
        self.load_items(files, dated).map(Some)
    }

    fn read_asset(&self, path: &str) -> Option<Vec<u8>> {
        let full = self.root.join(path.trim_start_matches('/'));
        match fs::read(&full) {
            Ok(bytes) => Some(bytes),
            Err(e) => {
                warn!(path = %full.display(), error = %e, "cannot read asset");
                None
            }
        }
    }
}

fn is_content_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| CONTENT_EXTENSIONS.iter().any(|c| e.eq_ignore_ascii_case(c)))
}

/// Load one content file as a render item, front matter or not.
///
/// Files under a `_posts` directory take their fallback date from the name.
pub fn load_item(root: &Path, path: &Path) -> Result<RenderItem, ContentError> {
    let content = fs::read_to_string(path)?;
    let rel = path.strip_prefix(root).unwrap_or(path);
    let dated = rel.components().any(|c| c.as_os_str() == "_posts");

    let parsed = parse_item(rel, &content, dated).map_err(|source| ContentError::FrontMatter {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(parsed.unwrap_or_else(|| bare_item(rel, dated)))
}

/// Split `+++`-delimited TOML front matter from the body.
pub fn split_front_matter(content: &str) -> Option<(&str, &str)> {
    let trimmed = content.trim_start_matches('\u{feff}').trim_start();
    let rest = trimmed.strip_prefix("+++")?;
    let end = rest.find("\n+++")?;
    let front = rest[..end].trim();
    let body = rest[end + 4..].trim_start_matches('\n');
    Some((front, body))
}

/// Item carrying only what the file name says.
fn bare_item(rel: &Path, dated_names: bool) -> RenderItem {
    let stem = rel
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default();
    let parsed = naming::parse_entry_name(&stem);
    let date = if dated_names {
        parsed.date.and_then(|d| d.and_hms_opt(0, 0, 0))
    } else {
        None
    };

    RenderItem {
        source_path: rel.to_path_buf(),
        basename: if dated_names && !parsed.name.is_empty() {
            parsed.name
        } else {
            stem
        },
        date,
        ..RenderItem::default()
    }
}

/// Parse a content file into a render item.
///
/// Returns `Ok(None)` when the file has no front matter.
pub fn parse_item(
    rel: &Path,
    content: &str,
    dated_names: bool,
) -> Result<Option<RenderItem>, toml::de::Error> {
    let Some((front, _body)) = split_front_matter(content) else {
        return Ok(None);
    };
    let table: toml::Table = toml::from_str(front)?;
    let mut item = bare_item(rel, dated_names);

    for (key, value) in &table {
        match key.as_str() {
            "title" => item.title = value.as_str().map(str::to_string),
            "slug" => item.slug = value.as_str().map(str::to_string).filter(|s| !s.is_empty()),
            "draft" => item.draft = as_bool(value),
            "date" => {
                if let Some(date) = parse_date_value(value) {
                    item.date = Some(date);
                }
            }
            "tags" => item.tags = parse_tags(value),
            "image" => item.image = parse_image(value),
            "og_image" => item.overrides = parse_overrides(value),
            _ => {}
        }
        if let Some(text) = field_text(value) {
            item.fields.insert(key.clone(), text);
        }
    }

    Ok(Some(item))
}

fn as_bool(value: &toml::Value) -> bool {
    match value {
        toml::Value::Boolean(b) => *b,
        toml::Value::String(s) => s.eq_ignore_ascii_case("true"),
        _ => false,
    }
}

/// Text form of a scalar, or of an array of scalars joined with `", "`.
fn field_text(value: &toml::Value) -> Option<String> {
    match value {
        toml::Value::String(s) => Some(s.clone()),
        toml::Value::Integer(i) => Some(i.to_string()),
        toml::Value::Float(f) => Some(f.to_string()),
        toml::Value::Boolean(b) => Some(b.to_string()),
        toml::Value::Datetime(d) => Some(d.to_string()),
        toml::Value::Array(values) => {
            let parts: Option<Vec<String>> = values
                .iter()
                .map(|v| match v {
                    toml::Value::Array(_) | toml::Value::Table(_) => None,
                    scalar => field_text(scalar),
                })
                .collect();
            parts.map(|p| p.join(", "))
        }
        toml::Value::Table(_) => None,
    }
}

fn parse_tags(value: &toml::Value) -> Vec<String> {
    match value {
        toml::Value::Array(values) => values
            .iter()
            .filter_map(field_text)
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .collect(),
        toml::Value::String(s) => s.split_whitespace().map(str::to_string).collect(),
        _ => Vec::new(),
    }
}

fn parse_image(value: &toml::Value) -> Option<ImageDescriptor> {
    let dimension = |t: &toml::Table, key: &str| {
        t.get(key)
            .and_then(toml::Value::as_integer)
            .and_then(|v| u32::try_from(v).ok())
    };
    match value {
        toml::Value::String(path) if !path.is_empty() => Some(ImageDescriptor {
            path: path.clone(),
            width: None,
            height: None,
            alt: None,
        }),
        toml::Value::Table(t) => Some(ImageDescriptor {
            path: t.get("path")?.as_str()?.to_string(),
            width: dimension(t, "width"),
            height: dimension(t, "height"),
            alt: t.get("alt").and_then(|v| v.as_str()).map(str::to_string),
        }),
        _ => None,
    }
}

/// `og_image = { ... }` overrides; `og_image = false` disables the card.
fn parse_overrides(value: &toml::Value) -> Option<toml::Table> {
    match value {
        toml::Value::Table(t) => Some(t.clone()),
        toml::Value::Boolean(enabled) => {
            let mut t = toml::Table::new();
            t.insert("enabled".to_string(), toml::Value::Boolean(*enabled));
            Some(t)
        }
        _ => None,
    }
}

fn parse_date_value(value: &toml::Value) -> Option<NaiveDateTime> {
    match value {
        toml::Value::Datetime(d) => parse_date(&d.to_string()),
        toml::Value::String(s) => parse_date(s),
        _ => None,
    }
}

/// Parse the date forms found in front matter.
///
/// Accepts RFC 3339, `YYYY-MM-DD HH:MM:SS` (optionally with a numeric
/// offset), `YYYY-MM-DDTHH:MM:SS[.f]` and `YYYY-MM-DD`. Offsets are dropped;
/// the local wall-clock time is kept.
pub fn parse_date(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.naive_local());
    }
    if let Ok(dt) = DateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S %z") {
        return Some(dt.naive_local());
    }
    for format in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, format) {
            return Some(dt);
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

/// Item count per collection, `None` for collections the site doesn't have.
pub fn count_items(source: &dyn ContentSource, collections: &[String]) -> BTreeMap<String, Option<usize>> {
    collections
        .iter()
        .map(|name| {
            let count = match source.list_collection(name) {
                Ok(items) => items.map(|i| i.len()),
                Err(e) => {
                    warn!(collection = %name, error = %e, "cannot list collection");
                    None
                }
            };
            (name.clone(), count)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write(root: &Path, rel: &str, content: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn site() -> TempDir {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path();
        write(
            root,
            "_posts/2024-01-05-hello-world.md",
            "+++\ntitle = \"Hello World\"\ntags = [\"a\", \"b\"]\n+++\n\nBody",
        );
        write(
            root,
            "_posts/2024-02-01-second.md",
            "+++\ntitle = \"Second\"\ndraft = true\n+++\n",
        );
        write(root, "_posts/notes.txt", "not content");
        write(root, "about.md", "+++\ntitle = \"About\"\n+++\n");
        write(root, "blog/index.html", "+++\ntitle = \"Blog\"\n+++\n<p></p>");
        write(root, "README.md", "# no front matter");
        write(root, "_drafts/wip.md", "+++\ntitle = \"WIP\"\n+++\n");
        write(root, ".hidden/secret.md", "+++\ntitle = \"Secret\"\n+++\n");
        write(root, "_projects/og-card.md", "+++\ntitle = \"og-card\"\n+++\n");
        tmp
    }

    // =========================================================================
    // split_front_matter() tests
    // =========================================================================

    #[test]
    fn split_toml_front_matter() {
        let (front, body) = split_front_matter("+++\ntitle = \"Hi\"\n+++\n\n# Body").unwrap();
        assert_eq!(front, "title = \"Hi\"");
        assert_eq!(body, "# Body");
    }

    #[test]
    fn no_front_matter() {
        assert!(split_front_matter("# Just content").is_none());
        assert!(split_front_matter("+++\nunterminated").is_none());
    }

    #[test]
    fn front_matter_after_bom() {
        assert!(split_front_matter("\u{feff}+++\na = 1\n+++\n").is_some());
    }

    // =========================================================================
    // parse_item() tests
    // =========================================================================

    fn parse(content: &str) -> RenderItem {
        parse_item(Path::new("_posts/2024-01-05-hello.md"), content, true)
            .unwrap()
            .unwrap()
    }

    #[test]
    fn known_keys_are_read() {
        let item = parse(
            r#"+++
title = "Hello"
slug = "custom"
draft = true
tags = ["x", "y"]
+++"#,
        );
        assert_eq!(item.title.as_deref(), Some("Hello"));
        assert_eq!(item.slug.as_deref(), Some("custom"));
        assert!(item.draft);
        assert_eq!(item.tags, vec!["x", "y"]);
        assert_eq!(item.basename, "hello");
    }

    #[test]
    fn post_date_falls_back_to_file_name() {
        let item = parse("+++\ntitle = \"x\"\n+++");
        assert_eq!(item.date, parse_date("2024-01-05"));
    }

    #[test]
    fn front_matter_date_wins() {
        let item = parse("+++\ndate = 2023-12-24T18:30:00\n+++");
        assert_eq!(item.date, parse_date("2023-12-24 18:30:00"));
    }

    #[test]
    fn undated_names_have_no_date() {
        let item = parse_item(Path::new("about.md"), "+++\n+++", false).unwrap().unwrap();
        assert_eq!(item.date, None);
        assert_eq!(item.basename, "about");
    }

    #[test]
    fn tags_from_whitespace_string() {
        let item = parse("+++\ntags = \"rust  cards\"\n+++");
        assert_eq!(item.tags, vec!["rust", "cards"]);
    }

    #[test]
    fn scalars_and_arrays_become_fields() {
        let item = parse(
            r#"+++
author = "Ada"
reading_time = 5
categories = ["one", "two"]
nested = { a = 1 }
+++"#,
        );
        assert_eq!(item.field("author"), Some("Ada"));
        assert_eq!(item.field("reading_time"), Some("5"));
        assert_eq!(item.field("categories"), Some("one, two"));
        assert_eq!(item.field("nested"), None);
    }

    #[test]
    fn existing_image_descriptor() {
        let table = parse("+++\n[image]\npath = \"/x.png\"\nwidth = 10\n+++");
        assert_eq!(table.image.as_ref().unwrap().path, "/x.png");
        assert_eq!(table.image.unwrap().width, Some(10));

        let bare = parse("+++\nimage = \"/y.png\"\n+++");
        assert_eq!(bare.image.unwrap().path, "/y.png");
    }

    #[test]
    fn og_image_table_is_override() {
        let item = parse("+++\n[og_image]\ndomain = \"a.com\"\n+++");
        let overrides = item.overrides.unwrap();
        assert_eq!(overrides.get("domain").unwrap().as_str(), Some("a.com"));
    }

    #[test]
    fn og_image_false_disables() {
        let item = parse("+++\nog_image = false\n+++");
        let overrides = item.overrides.unwrap();
        assert_eq!(overrides.get("enabled").unwrap().as_bool(), Some(false));
    }

    #[test]
    fn invalid_front_matter_is_error() {
        let result = parse_item(Path::new("x.md"), "+++\ntitle = \n+++", false);
        assert!(result.is_err());
    }

    // =========================================================================
    // parse_date() tests
    // =========================================================================

    #[test]
    fn parse_date_forms() {
        let day = parse_date("2024-01-05").unwrap();
        assert_eq!(day.to_string(), "2024-01-05 00:00:00");
        assert_eq!(
            parse_date("2024-01-05 10:20:30").unwrap().to_string(),
            "2024-01-05 10:20:30"
        );
        assert_eq!(
            parse_date("2024-01-05T10:20:30+02:00").unwrap().to_string(),
            "2024-01-05 10:20:30"
        );
        assert_eq!(
            parse_date("2024-01-05 10:20:30 +0100").unwrap().to_string(),
            "2024-01-05 10:20:30"
        );
        assert!(parse_date("yesterday").is_none());
    }

    // =========================================================================
    // SiteSource tests
    // =========================================================================

    #[test]
    fn posts_collection_lists_front_mattered_posts_in_order() {
        let tmp = site();
        let source = SiteSource::new(tmp.path());

        let posts = source.list_collection("posts").unwrap().unwrap();

        let titles: Vec<_> = posts.iter().map(|p| p.title.clone().unwrap()).collect();
        assert_eq!(titles, vec!["Hello World", "Second"]);
        assert_eq!(posts[0].basename, "hello-world");
        assert!(posts[1].draft);
    }

    #[test]
    fn pages_skip_private_and_unfronted_files() {
        let tmp = site();
        let source = SiteSource::new(tmp.path());

        let pages = source.list_collection("pages").unwrap().unwrap();

        let titles: Vec<_> = pages.iter().map(|p| p.title.clone().unwrap()).collect();
        assert_eq!(titles, vec!["About", "Blog"]);
        assert_eq!(pages[1].basename, "index");
    }

    #[test]
    fn custom_collection_from_underscore_dir() {
        let tmp = site();
        let source = SiteSource::new(tmp.path());

        let projects = source.list_collection("projects").unwrap().unwrap();
        assert_eq!(projects.len(), 1);
    }

    #[test]
    fn unknown_collection_is_none() {
        let tmp = site();
        let source = SiteSource::new(tmp.path());
        assert!(source.list_collection("recipes").unwrap().is_none());
    }

    #[test]
    fn read_asset_strips_leading_slash() {
        let tmp = site();
        write(tmp.path(), "assets/bg.png", "bytes");
        let source = SiteSource::new(tmp.path());

        assert_eq!(source.read_asset("/assets/bg.png").unwrap(), b"bytes");
        assert_eq!(source.read_asset("assets/bg.png").unwrap(), b"bytes");
        assert!(source.read_asset("/assets/missing.png").is_none());
    }

    #[test]
    fn load_item_without_front_matter() {
        let tmp = site();
        let item = load_item(tmp.path(), &tmp.path().join("README.md")).unwrap();
        assert_eq!(item.basename, "README");
        assert_eq!(item.title, None);
    }

    #[test]
    fn load_item_reports_bad_front_matter() {
        let tmp = site();
        write(tmp.path(), "broken.md", "+++\n= nope\n+++");
        let result = load_item(tmp.path(), &tmp.path().join("broken.md"));
        assert!(matches!(result, Err(ContentError::FrontMatter { .. })));
    }

    #[test]
    fn count_items_marks_unknown_collections() {
        let tmp = site();
        let source = SiteSource::new(tmp.path());
        let counts = count_items(&source, &["posts".to_string(), "nope".to_string()]);
        assert_eq!(counts["posts"], Some(2));
        assert_eq!(counts["nope"], None);
    }
}
