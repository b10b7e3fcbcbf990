//! # og-card
//!
//! Social card ("og:image") generator for static sites. Every post, page or
//! collection entry gets a PNG card with its title, a metadata line, an
//! optional thumbnail and the site domain, ready to be referenced from
//! `<meta property="og:image">`.
//!
//! # Architecture: Config → Layout → Canvas
//!
//! ```text
//! 1. Resolve   site config + item overrides  →  CardConfig
//! 2. Layout    CardConfig + item + assets    →  Vec<DrawOp>   (pure)
//! 3. Render    Vec<DrawOp>                   →  <slug>.png    (CanvasBackend)
//! ```
//!
//! The [`render`] module drives this per item across all configured
//! collections, in parallel, and reports what happened to each.
//!
//! Layout never touches pixels and the canvas never makes layout decisions,
//! so the interesting logic is tested against a recording mock backend
//! without fonts or image encoders.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`config`] | `[og_image]` config: defaults, validation, deep merge of per-item overrides |
//! | [`content`] | Content source trait and the site-directory implementation (front matter, collections) |
//! | [`layout`] | Pure layout engine: config + item → draw operations |
//! | [`imaging`] | Draw operation types, canvas backend trait, pure-Rust rasterizer and font lookup |
//! | [`render`] | Batch orchestration: idempotence, drafts, per-item failures, image write-back |
//! | [`types`] | Render items and the image descriptor written back to them |
//! | [`naming`] | `YYYY-MM-DD-name` file names and slugs |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## Idempotent Output
//!
//! A card is identified by its path, `<output_dir>/<collection>/<slug>.png`.
//! When that file exists the item is not rendered again, so a site build
//! only pays for new content. `force` re-renders everything.
//!
//! ## Pure-Rust Rasterizing
//!
//! Cards are drawn with the `image` crate and text is rasterized with
//! `fontdue`. Fonts are found by file name in the site's font directories
//! and the usual system locations, with no fontconfig or ImageMagick needed.

pub mod config;
pub mod content;
pub mod imaging;
pub mod layout;
pub mod naming;
pub mod output;
pub mod render;
pub mod types;

#[cfg(test)]
pub(crate) mod test_helpers;
