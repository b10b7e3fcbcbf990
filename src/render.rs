//! Batch rendering of cards for every configured collection.
//!
//! For each collection the orchestrator lists items from the
//! [`ContentSource`], creates `<output_dir>/<collection>/`, and renders each
//! item in parallel:
//!
//! 1. Drafts are skipped when `skip_drafts` is set.
//! 2. The slug is the item's explicit slug, else its slugified title, else its
//!    slugified basename.
//! 3. If `<output_dir>/<collection>/<slug>.png` exists and `force` is off, the
//!    card is left alone.
//! 4. The item's `og_image` overrides are merged over the site config; a
//!    disabled result skips the item.
//! 5. Layout runs, the canvas backend draws and saves the card.
//!
//! Items whose card was rendered or already existed get an image descriptor
//! written back, unless they already carry one. Failures are per item (or per
//! collection when its output directory cannot be created) and never stop
//! the batch.
//!
//! ## Output Structure
//!
//! ```text
//! site/assets/images/og/
//! ├── manifest.json            # RenderReport (written by the CLI)
//! ├── posts/
//! │   ├── hello-world.png
//! │   └── second-post.png
//! └── pages/
//!     └── about.png
//! ```

use crate::config::{CardConfig, ConfigError, resolve_config};
use crate::content::{self, ContentError, ContentSource};
use crate::imaging::{BackendError, CanvasBackend, DrawOp, RustCanvas, render_card};
use crate::layout::{CardAssets, card_title, layout};
use crate::naming::slugify;
use crate::types::{ImageDescriptor, RenderItem};
use rayon::prelude::*;
use serde::Serialize;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::mpsc::Sender;
use thiserror::Error;
use tracing::{error, info, warn};

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
    #[error("Content error: {0}")]
    Content(#[from] ContentError),
    #[error("Canvas error: {0}")]
    Backend(#[from] BackendError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Progress events emitted while rendering.
#[derive(Debug, Clone, PartialEq)]
pub enum RenderEvent {
    /// A collection's items were listed and are about to render.
    CollectionStarted { name: String, item_count: usize },
    /// A collection was not rendered at all.
    CollectionSkipped { name: String, reason: String },
    /// One item is done, whatever the outcome.
    ItemFinished {
        /// 1-based position within the collection.
        index: usize,
        title: String,
        source_path: String,
        output: Option<String>,
        outcome: ItemOutcome,
    },
}

/// What happened to one item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemOutcome {
    Rendered,
    /// Output file already present and `force` is off.
    Existing,
    SkippedDraft,
    /// `enabled = false` after merging the item's overrides.
    Disabled,
    Failed(String),
}

impl ItemOutcome {
    /// Whether the item gets an image descriptor written back.
    pub fn has_card(&self) -> bool {
        matches!(self, Self::Rendered | Self::Existing)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ItemReport {
    pub source_path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
    /// Public path of the card, once known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
    pub outcome: ItemOutcome,
    /// The item's image after write-back.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<ImageDescriptor>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CollectionReport {
    pub name: String,
    /// Set when the whole collection was skipped or failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub items: Vec<ItemReport>,
}

/// Result of a batch run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RenderReport {
    pub collections: Vec<CollectionReport>,
}

impl RenderReport {
    /// Number of items with the given outcome kind.
    pub fn count(&self, pred: impl Fn(&ItemOutcome) -> bool) -> usize {
        self.collections
            .iter()
            .flat_map(|c| &c.items)
            .filter(|i| pred(&i.outcome))
            .count()
    }

    /// Failed items plus failed collections.
    pub fn failures(&self) -> usize {
        let items = self.count(|o| matches!(o, ItemOutcome::Failed(_)));
        let collections = self
            .collections
            .iter()
            .filter(|c| c.error.is_some() && c.name_was_known())
            .count();
        items + collections
    }
}

/// Reason used for collections the content source doesn't know.
pub const UNKNOWN_COLLECTION: &str = "unknown collection";

impl CollectionReport {
    fn name_was_known(&self) -> bool {
        self.error.as_deref() != Some(UNKNOWN_COLLECTION)
    }
}

/// Output slug: explicit slug as written, else slugified title, else
/// slugified basename.
pub fn output_slug(item: &RenderItem) -> String {
    let explicit = item
        .slug
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string);
    explicit
        .or_else(|| item.title().map(slugify).filter(|s| !s.is_empty()))
        .or_else(|| Some(slugify(&item.basename)).filter(|s| !s.is_empty()))
        .unwrap_or_else(|| "untitled".to_string())
}

/// Site-relative public path of a card: `/<output_dir>/<collection>/<slug>.png`.
pub fn public_path(output_dir: &str, collection: &str, slug: &str) -> String {
    let dir = output_dir.trim_matches('/');
    if dir.is_empty() {
        format!("/{collection}/{slug}.png")
    } else {
        format!("/{dir}/{collection}/{slug}.png")
    }
}

/// Effective config for one item.
///
/// Overrides apply to everything except the canvas size: every card of a site
/// is drawn at the site's size, the one recorded on the item.
pub fn item_config(global: &CardConfig, item: &RenderItem) -> Result<CardConfig, ConfigError> {
    let mut config = resolve_config(global, item.overrides.as_ref())?;
    config.canvas.width = global.canvas.width;
    config.canvas.height = global.canvas.height;
    Ok(config)
}

/// Directory cards of `collection` are written to.
pub fn collection_dir(root: &Path, config: &CardConfig, collection: &str) -> PathBuf {
    root.join(config.output_dir.trim_start_matches('/')).join(collection)
}

/// Read the background and thumbnail bytes a config asks for.
pub fn load_assets(config: &CardConfig, source: &impl ContentSource) -> CardAssets {
    let background = config
        .canvas
        .background_image
        .as_deref()
        .filter(|p| !p.is_empty())
        .and_then(|p| source.read_asset(p));
    let image = if config.has_image() {
        config.image.path.as_deref().and_then(|p| source.read_asset(p))
    } else {
        None
    };
    CardAssets { background, image }
}

/// Font directories from config, resolved against the site root.
pub fn font_dirs(config: &CardConfig, root: &Path) -> Vec<PathBuf> {
    config
        .font_dirs
        .iter()
        .map(|d| root.join(d.trim_start_matches('/')))
        .collect()
}

/// Render all configured collections with the pure-Rust canvas.
pub fn render_site(
    config: &CardConfig,
    source: &impl ContentSource,
    events: Option<Sender<RenderEvent>>,
) -> RenderReport {
    let backend = RustCanvas::new(font_dirs(config, source.root()));
    render_site_with_backend(&backend, config, source, events)
}

/// Render all configured collections with a specific backend (allows testing with mock).
pub fn render_site_with_backend(
    backend: &impl CanvasBackend,
    config: &CardConfig,
    source: &impl ContentSource,
    events: Option<Sender<RenderEvent>>,
) -> RenderReport {
    let emit = |event: RenderEvent| {
        if let Some(tx) = &events {
            tx.send(event).ok();
        }
    };

    let mut report = RenderReport::default();
    for name in &config.collections {
        let collection = render_collection(backend, config, source, name, &events);
        if let Some(reason) = &collection.error {
            emit(RenderEvent::CollectionSkipped {
                name: name.clone(),
                reason: reason.clone(),
            });
        }
        report.collections.push(collection);
    }
    report
}

fn render_collection(
    backend: &impl CanvasBackend,
    config: &CardConfig,
    source: &impl ContentSource,
    name: &str,
    events: &Option<Sender<RenderEvent>>,
) -> CollectionReport {
    let skipped = |reason: String| CollectionReport {
        name: name.to_string(),
        error: Some(reason),
        items: Vec::new(),
    };

    let mut items = match source.list_collection(name) {
        Ok(Some(items)) => items,
        Ok(None) => {
            warn!(collection = name, "unknown collection, skipping");
            return skipped(UNKNOWN_COLLECTION.to_string());
        }
        Err(e) => {
            error!(collection = name, error = %e, "cannot list collection");
            return skipped(e.to_string());
        }
    };
    if items.is_empty() {
        info!(collection = name, "no items");
        return CollectionReport {
            name: name.to_string(),
            error: None,
            items: Vec::new(),
        };
    }

    let dir = collection_dir(source.root(), config, name);
    if let Err(e) = std::fs::create_dir_all(&dir) {
        error!(collection = name, dir = %dir.display(), error = %e, "cannot create output directory");
        return skipped(RenderError::Io(e).to_string());
    }

    if let Some(tx) = events {
        tx.send(RenderEvent::CollectionStarted {
            name: name.to_string(),
            item_count: items.len(),
        })
        .ok();
    }

    let job = ItemJob {
        backend,
        config,
        source,
        collection: name,
        dir: &dir,
    };
    let finish = |i: usize, item: &mut RenderItem| {
        let report = job.run(item);
        if let Some(tx) = events {
            tx.send(RenderEvent::ItemFinished {
                index: i + 1,
                title: card_title(item).to_string(),
                source_path: item.source_path.display().to_string(),
                output: report.output.clone(),
                outcome: report.outcome.clone(),
            })
            .ok();
        }
        report
    };

    // Items sharing an output path run after the parallel pass, in order, so
    // only one worker ever writes a given file.
    let repeated = repeated_slugs(config, &items);
    let mut reports: Vec<Option<ItemReport>> = items
        .par_iter_mut()
        .enumerate()
        .map(|(i, item)| (!repeated[i]).then(|| finish(i, item)))
        .collect();
    for (i, item) in items.iter_mut().enumerate() {
        if repeated[i] {
            reports[i] = Some(finish(i, item));
        }
    }

    CollectionReport {
        name: name.to_string(),
        error: None,
        items: reports.into_iter().flatten().collect(),
    }
}

/// Marks every item whose output slug an earlier item of the collection
/// already claims. Skipped drafts claim nothing.
fn repeated_slugs(config: &CardConfig, items: &[RenderItem]) -> Vec<bool> {
    let mut claimed = HashSet::new();
    items
        .iter()
        .map(|item| {
            if item.draft && config.skip_drafts {
                return false;
            }
            !claimed.insert(output_slug(item))
        })
        .collect()
}

/// Everything needed to render one item of a collection.
struct ItemJob<'a, B, S> {
    backend: &'a B,
    config: &'a CardConfig,
    source: &'a S,
    collection: &'a str,
    dir: &'a Path,
}

impl<B: CanvasBackend, S: ContentSource> ItemJob<'_, B, S> {
    fn run(&self, item: &mut RenderItem) -> ItemReport {
        let source_path = item.source_path.display().to_string();
        let mut report = ItemReport {
            source_path: source_path.clone(),
            slug: None,
            output: None,
            outcome: ItemOutcome::SkippedDraft,
            image: item.image.clone(),
        };

        if item.draft && self.config.skip_drafts {
            info!(item = %source_path, "skipping draft");
            return report;
        }

        let slug = output_slug(item);
        let path = self.dir.join(format!("{slug}.png"));
        let public = public_path(&self.config.output_dir, self.collection, &slug);
        report.slug = Some(slug);
        report.output = Some(public.clone());

        report.outcome = if path.exists() && !self.config.force {
            info!(item = %source_path, output = %public, "card exists, skipping");
            ItemOutcome::Existing
        } else {
            self.render(item, &path)
        };

        if report.outcome.has_card() {
            let descriptor = ImageDescriptor {
                path: public,
                width: Some(self.config.canvas.width),
                height: Some(self.config.canvas.height),
                alt: item.title().map(str::to_string),
            };
            item.set_image_once(descriptor);
        }
        report.image = item.image.clone();
        report
    }

    fn render(&self, item: &RenderItem, path: &Path) -> ItemOutcome {
        let config = match item_config(self.config, item) {
            Ok(config) => config,
            Err(e) => {
                error!(item = %item.source_path.display(), error = %e, "invalid og_image override");
                return ItemOutcome::Failed(e.to_string());
            }
        };
        if !config.enabled {
            info!(item = %item.source_path.display(), "cards disabled, skipping");
            return ItemOutcome::Disabled;
        }

        let ops = layout(&config, item, load_assets(&config, self.source));
        match render_card(self.backend, &ops, path) {
            Ok(()) => {
                info!(item = %item.source_path.display(), output = %path.display(), "rendered card");
                ItemOutcome::Rendered
            }
            Err(e) => {
                error!(item = %item.source_path.display(), error = %e, "failed to render card");
                ItemOutcome::Failed(e.to_string())
            }
        }
    }
}

/// Draw operations for one content file, without rasterizing.
pub fn plan_item(
    config: &CardConfig,
    source: &impl ContentSource,
    path: &Path,
) -> Result<Vec<DrawOp>, RenderError> {
    let item = content::load_item(source.root(), path)?;
    let config = item_config(config, &item)?;
    Ok(layout(&config, &item, load_assets(&config, source)))
}
