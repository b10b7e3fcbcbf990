//! Card layout: effective config + item → ordered draw operations.
//!
//! [`layout`] is a pure function. It reads no files and no clock; the
//! background and thumbnail bytes arrive already loaded in [`CardAssets`].
//!
//! ## Geometry
//!
//! ```text
//! (80,100) nw                                        ne (80,100)
//!  ┌──────────────────────────────────────────────────────────┐
//!  │  Header (dpi 400, width 1040,                ┌───────┐  │
//!  │          or 1040 - image - 30)               │ image │  │
//!  │                                              └───────┘  │
//!  │                                                          │
//!  │  metadata (sw, width 1040 or 600)      domain (se)       │
//!  ├──────────────────────────────────────────────────────────┤ ← margin_bottom
//!  │▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓ border (width px) ▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓│
//!  └──────────────────────────────────────────────────────────┘
//! ```
//!
//! Metadata and domain share one bottom margin, `80 + border width`, so a
//! border pushes both up. When both are present the domain sits 50px higher
//! than the metadata line and the metadata line narrows to 600px, keeping the
//! two apart.

use crate::config::CardConfig;
use crate::imaging::{
    Anchor, BackgroundParams, BorderParams, DrawOp, Edge, Gravity, ImageParams, TextParams,
};
use crate::types::RenderItem;
use std::fmt::Write;

/// Left/right inset of text, and the base bottom margin.
pub const MARGIN: i32 = 80;
/// Distance of the header from the top edge.
pub const HEADER_TOP: i32 = 100;
/// Full text width between the margins.
pub const CONTENT_WIDTH: u32 = 1040;
/// Gap between header text and the thumbnail image.
pub const IMAGE_SPACING: u32 = 30;
/// Metadata width when the domain takes the right side.
pub const METADATA_WIDTH_WITH_DOMAIN: u32 = 600;
/// Domain lift above the metadata line.
pub const DOMAIN_LIFT: i32 = 50;
pub const HEADER_DPI: u32 = 400;
pub const CONTENT_DPI: u32 = 150;

const UNTITLED: &str = "Untitled";

/// Raw bytes of the optional images a card uses.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CardAssets {
    pub background: Option<Vec<u8>>,
    pub image: Option<Vec<u8>>,
}

/// Bottom margin shared by the metadata line and the domain.
pub fn margin_bottom(config: &CardConfig) -> i32 {
    let border = config
        .border_bottom
        .as_ref()
        .map_or(0, |b| i32::try_from(b.width).unwrap_or(i32::MAX));
    MARGIN.saturating_add(border)
}

/// Header text width: full width, minus the image and spacing when an image
/// is configured.
pub fn header_width(config: &CardConfig) -> u32 {
    if config.has_image() {
        CONTENT_WIDTH.saturating_sub(config.image.width.saturating_add(IMAGE_SPACING))
    } else {
        CONTENT_WIDTH
    }
}

/// The item's title, falling back to its basename and then to "Untitled".
pub fn card_title(item: &RenderItem) -> &str {
    item.title()
        .or_else(|| Some(item.basename.as_str()).filter(|b| !b.trim().is_empty()))
        .unwrap_or(UNTITLED)
}

/// `prefix + title + suffix`, see [`card_title`].
pub fn header_text(config: &CardConfig, item: &RenderItem) -> String {
    format!(
        "{}{}{}",
        config.header.prefix,
        card_title(item),
        config.header.suffix
    )
}

/// One metadata field's text, or `None` if the item has nothing for it.
fn metadata_segment(config: &CardConfig, item: &RenderItem, field: &str) -> Option<String> {
    match field {
        "date" => {
            let date = item.date?;
            let mut text = String::new();
            // Invalid formats are rejected at config load; this is the fallback.
            write!(text, "{}", date.format(&config.metadata.date_format)).ok()?;
            Some(text).filter(|t| !t.is_empty())
        }
        "tags" => {
            if item.tags.is_empty() {
                return None;
            }
            let tags: Vec<String> = item.tags.iter().map(|t| format!("#{t}")).collect();
            Some(tags.join(" "))
        }
        name => item.field(name).map(str::to_string),
    }
}

/// Whether the item has a value for `field`.
fn field_present(item: &RenderItem, field: &str) -> bool {
    match field {
        "date" => item.date.is_some(),
        "tags" => !item.tags.is_empty(),
        name => item.field(name).is_some(),
    }
}

/// Metadata segments in configured field order, skipping empty ones.
pub fn metadata_segments(config: &CardConfig, item: &RenderItem) -> Vec<String> {
    config
        .metadata
        .fields
        .iter()
        .filter_map(|field| metadata_segment(config, item, field))
        .collect()
}

/// Whether any configured metadata field has a value on the item.
pub fn has_metadata(config: &CardConfig, item: &RenderItem) -> bool {
    config.metadata.fields.iter().any(|f| field_present(item, f))
}

fn domain(config: &CardConfig) -> Option<&str> {
    config.domain.as_deref().filter(|d| !d.trim().is_empty())
}

/// Draw operations for one card, in painting order.
///
/// Always starts with the background and always contains the header. Border,
/// image, metadata and domain appear only when configured and non-empty.
pub fn layout(config: &CardConfig, item: &RenderItem, assets: CardAssets) -> Vec<DrawOp> {
    let mut ops = Vec::with_capacity(6);
    let bottom = margin_bottom(config);

    ops.push(DrawOp::Background(BackgroundParams {
        width: config.canvas.width,
        height: config.canvas.height,
        color: config.canvas.background_color,
        image: assets.background,
    }));

    if let Some(border) = &config.border_bottom {
        ops.push(DrawOp::Border(BorderParams {
            width: border.width,
            edge: Edge::Bottom,
            fill: border.fill.clone(),
        }));
    }

    if config.has_image()
        && let Some(bytes) = assets.image
    {
        ops.push(DrawOp::Image(ImageParams {
            bytes,
            gravity: config.image.gravity,
            width: config.image.width,
            height: config.image.height,
            radius: config.image.radius,
            anchor: config.image.position,
        }));
    }

    ops.push(DrawOp::Text(TextParams {
        text: header_text(config, item),
        gravity: Gravity::NorthWest,
        width: Some(header_width(config)),
        color: config.header.color,
        dpi: HEADER_DPI,
        font_family: config.header.font_family.clone(),
        anchor: Anchor::new(MARGIN, HEADER_TOP),
    }));

    let segments = metadata_segments(config, item);
    if !segments.is_empty() {
        let width = if domain(config).is_some() {
            METADATA_WIDTH_WITH_DOMAIN
        } else {
            CONTENT_WIDTH
        };
        ops.push(DrawOp::Text(TextParams {
            text: segments.join(&config.metadata.separator),
            gravity: Gravity::SouthWest,
            width: Some(width),
            color: config.content.color,
            dpi: CONTENT_DPI,
            font_family: config.content.font_family.clone(),
            anchor: Anchor::new(MARGIN, bottom),
        }));
    }

    if let Some(domain) = domain(config) {
        let y = if has_metadata(config, item) {
            bottom.saturating_add(DOMAIN_LIFT)
        } else {
            bottom
        };
        ops.push(DrawOp::Text(TextParams {
            text: domain.to_string(),
            gravity: Gravity::SouthEast,
            width: None,
            color: config.content.color,
            dpi: CONTENT_DPI,
            font_family: config.content.font_family.clone(),
            anchor: Anchor::new(MARGIN, y),
        }));
    }

    ops
}
