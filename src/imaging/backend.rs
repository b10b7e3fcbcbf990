//! Canvas backend trait and shared error type.
//!
//! The [`CanvasBackend`] trait defines the five primitives every backend must
//! support: create a surface, draw a border, draw an image, draw text, and save.
//! All coordinate semantics (gravity + anchor) are defined by
//! [`calculations::place`](super::calculations::place) and must be honored
//! exactly by every backend.
//!
//! The production implementation is
//! [`RustCanvas`](super::rust_backend::RustCanvas): `image` for pixels and
//! PNG encoding, `fontdue` for glyphs.

use super::params::{BackgroundParams, BorderParams, ImageParams, TextParams};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to decode image: {0}")]
    Decode(String),
    #[error("No usable font for {family:?} (searched {searched} directories)")]
    Font { family: String, searched: usize },
    #[error("Failed to save {}: {reason}", path.display())]
    Save { path: PathBuf, reason: String },
    #[error("Draw sequence must start with a background operation")]
    InvalidSequence,
}

/// Trait for rendering backends.
///
/// A backend owns no per-card state; everything lives in the `Surface` it
/// hands out, so one backend can render many cards concurrently.
pub trait CanvasBackend: Sync {
    /// In-progress card being drawn.
    type Surface;

    /// Create a surface filled with the background color (and image, if any).
    fn create(&self, params: &BackgroundParams) -> Result<Self::Surface, BackendError>;

    /// Draw a multi-color border strip along one edge.
    fn draw_border(
        &self,
        surface: &mut Self::Surface,
        params: &BorderParams,
    ) -> Result<(), BackendError>;

    /// Place a raster image with rounded corners.
    fn draw_image(
        &self,
        surface: &mut Self::Surface,
        params: &ImageParams,
    ) -> Result<(), BackendError>;

    /// Render a block of text.
    fn draw_text(&self, surface: &mut Self::Surface, params: &TextParams)
    -> Result<(), BackendError>;

    /// Encode the surface and write it to `path`.
    fn save(&self, surface: Self::Surface, path: &Path) -> Result<(), BackendError>;
}
