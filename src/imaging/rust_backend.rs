//! Pure Rust canvas backend.
//!
//! Everything is statically linked into the binary.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Decode (JPEG, PNG, WebP) | `image::load_from_memory` |
//! | Background / image fit | `image::DynamicImage::resize_to_fill` with `Lanczos3` |
//! | Rounded corners | [`calculations::corner_coverage`](super::calculations::corner_coverage) |
//! | Glyph rasterization | `fontdue` |
//! | Font lookup | [`FontBook`] (`walkdir` + `dirs`) |
//! | Encode | `image` PNG encoder |

use super::backend::{BackendError, CanvasBackend};
use super::calculations::{
    blend, border_segments, corner_coverage, font_pixel_size, place, wrap_words,
};
use super::fonts::FontBook;
use super::params::{BackgroundParams, BorderParams, Color, Gravity, ImageParams, TextParams};
use fontdue::Font;
use image::imageops::FilterType;
use image::{DynamicImage, ImageFormat, Rgba, RgbaImage};
use std::path::{Path, PathBuf};
use tracing::warn;

/// Pure Rust backend drawing onto an in-memory RGBA buffer.
///
/// See the [module docs](self) for the crate-to-operation mapping.
pub struct RustCanvas {
    fonts: FontBook,
}

impl RustCanvas {
    /// Backend that looks for fonts in `font_dirs` before the system directories.
    pub fn new(font_dirs: Vec<PathBuf>) -> Self {
        Self {
            fonts: FontBook::new(font_dirs),
        }
    }
}

impl Default for RustCanvas {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

/// Decode image bytes. `None` (with a warning) if the bytes are not an image.
fn decode(bytes: &[u8], what: &str) -> Option<DynamicImage> {
    match image::load_from_memory(bytes) {
        Ok(img) => Some(img),
        Err(e) => {
            warn!(element = what, error = %e, "skipping undecodable image");
            None
        }
    }
}

/// Blend one pixel onto the surface, ignoring coordinates outside it.
fn paint(surface: &mut RgbaImage, x: i64, y: i64, src: [u8; 4], coverage: f32) {
    if x < 0 || y < 0 || x >= surface.width() as i64 || y >= surface.height() as i64 {
        return;
    }
    let px = surface.get_pixel_mut(x as u32, y as u32);
    px.0 = blend(px.0, src, coverage);
}

/// Laid-out text: lines plus the metrics needed to place them.
struct TextBlock {
    lines: Vec<String>,
    px: f32,
    ascent: f32,
    line_height: f32,
}

impl TextBlock {
    fn layout(font: &Font, params: &TextParams) -> Self {
        let px = font_pixel_size(params.dpi);
        let (ascent, line_height) = match font.horizontal_line_metrics(px) {
            Some(m) => (m.ascent, m.new_line_size),
            None => (px * 0.8, px * 1.2),
        };

        let lines = match params.width {
            Some(w) => wrap_words(&params.text, w as f32, |s| measure(font, s, px)),
            None => params.text.split('\n').map(str::to_string).collect(),
        };

        Self {
            lines,
            px,
            ascent,
            line_height,
        }
    }

    fn widest(&self, font: &Font) -> u32 {
        self.lines
            .iter()
            .map(|l| measure(font, l, self.px))
            .fold(0.0_f32, f32::max)
            .ceil() as u32
    }

    fn height(&self) -> u32 {
        (self.lines.len() as f32 * self.line_height).ceil() as u32
    }
}

/// Advance width of `text` at `px`, kerning included.
fn measure(font: &Font, text: &str, px: f32) -> f32 {
    let mut width = 0.0;
    let mut prev: Option<char> = None;
    for c in text.chars() {
        if let Some(p) = prev {
            width += font.horizontal_kern(p, c, px).unwrap_or(0.0);
        }
        width += font.metrics(c, px).advance_width;
        prev = Some(c);
    }
    width
}

/// Horizontal offset of a line inside its block, following the gravity's
/// horizontal component.
fn align(gravity: Gravity, block_width: u32, line_width: f32) -> f32 {
    let slack = (block_width as f32 - line_width).max(0.0);
    match gravity {
        Gravity::NorthWest | Gravity::West | Gravity::SouthWest => 0.0,
        Gravity::North | Gravity::Center | Gravity::South => slack / 2.0,
        Gravity::NorthEast | Gravity::East | Gravity::SouthEast => slack,
    }
}

fn draw_glyphs(surface: &mut RgbaImage, font: &Font, text: &str, px: f32, origin: (f32, f32), color: Color) {
    let (mut pen_x, baseline) = origin;
    let rgba = color.to_rgba();
    let mut prev: Option<char> = None;

    for c in text.chars() {
        if let Some(p) = prev {
            pen_x += font.horizontal_kern(p, c, px).unwrap_or(0.0);
        }
        let (metrics, bitmap) = font.rasterize(c, px);
        let left = (pen_x + metrics.xmin as f32).round() as i64;
        let top = (baseline - (metrics.height as i32 + metrics.ymin) as f32).round() as i64;

        for row in 0..metrics.height {
            for col in 0..metrics.width {
                let coverage = bitmap[row * metrics.width + col];
                if coverage > 0 {
                    paint(
                        surface,
                        left + col as i64,
                        top + row as i64,
                        rgba,
                        coverage as f32 / 255.0,
                    );
                }
            }
        }

        pen_x += metrics.advance_width;
        prev = Some(c);
    }
}

impl CanvasBackend for RustCanvas {
    type Surface = RgbaImage;

    fn create(&self, params: &BackgroundParams) -> Result<RgbaImage, BackendError> {
        let mut surface = RgbaImage::from_pixel(params.width, params.height, Rgba(params.color.to_rgba()));

        if let Some(img) = params.image.as_deref().and_then(|b| decode(b, "background"))
            && params.width > 0
            && params.height > 0
        {
            let cover = img
                .resize_to_fill(params.width, params.height, FilterType::Lanczos3)
                .to_rgba8();
            image::imageops::overlay(&mut surface, &cover, 0, 0);
        }

        Ok(surface)
    }

    fn draw_border(&self, surface: &mut RgbaImage, params: &BorderParams) -> Result<(), BackendError> {
        let (width, height) = surface.dimensions();
        let top = height.saturating_sub(params.width);

        for ((start, len), color) in border_segments(width, params.fill.len())
            .into_iter()
            .zip(&params.fill)
        {
            let rgba = color.to_rgba();
            for y in top..height {
                for x in start..start + len {
                    paint(surface, x as i64, y as i64, rgba, 1.0);
                }
            }
        }
        Ok(())
    }

    fn draw_image(&self, surface: &mut RgbaImage, params: &ImageParams) -> Result<(), BackendError> {
        if params.width == 0 || params.height == 0 {
            return Ok(());
        }
        let Some(img) = decode(&params.bytes, "image") else {
            return Ok(());
        };

        let fitted = img
            .resize_to_fill(params.width, params.height, FilterType::Lanczos3)
            .to_rgba8();
        let (left, top) = place(
            params.gravity,
            params.anchor,
            surface.dimensions(),
            fitted.dimensions(),
        );

        for (x, y, px) in fitted.enumerate_pixels() {
            let coverage = corner_coverage(x, y, params.width, params.height, params.radius);
            if coverage > 0.0 {
                paint(surface, left + x as i64, top + y as i64, px.0, coverage);
            }
        }
        Ok(())
    }

    fn draw_text(&self, surface: &mut RgbaImage, params: &TextParams) -> Result<(), BackendError> {
        if params.text.trim().is_empty() {
            return Ok(());
        }
        let font = self.fonts.get(&params.font_family)?;
        let block = TextBlock::layout(&font, params);

        let block_width = params.width.unwrap_or_else(|| block.widest(&font));
        let (left, top) = place(
            params.gravity,
            params.anchor,
            surface.dimensions(),
            (block_width, block.height()),
        );

        for (i, line) in block.lines.iter().enumerate() {
            let offset = align(params.gravity, block_width, measure(&font, line, block.px));
            let origin = (
                left as f32 + offset,
                top as f32 + block.ascent + i as f32 * block.line_height,
            );
            draw_glyphs(surface, &font, line, block.px, origin, params.color);
        }
        Ok(())
    }

    fn save(&self, surface: RgbaImage, path: &Path) -> Result<(), BackendError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        surface
            .save_with_format(path, ImageFormat::Png)
            .map_err(|e| BackendError::Save {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })
    }
}
