//! Card configuration module.
//!
//! Handles loading, validating, and merging card settings. Configuration is
//! layered: stock defaults are overridden by the site's config file, and the
//! site config is overridden per item by the `og_image` table in the item's
//! front matter.
//!
//! ## Config File Location
//!
//! Card settings live in the `[og_image]` table of the site's `config.toml`:
//!
//! ```text
//! site/
//! ├── config.toml          # [og_image] table (overrides stock defaults)
//! ├── _posts/
//! │   └── 2024-01-05-hello.md   # +++ og_image = { ... } +++ (overrides site)
//! └── assets/fonts/        # searched for fonts before system directories
//! ```
//!
//! ## Configuration Options
//!
//! ```toml
//! [og_image]
//! # All options are optional - defaults shown below
//! enabled = true
//! output_dir = "assets/images/og"
//! collections = ["posts"]
//! force = false
//! verbose = false
//! skip_drafts = true
//! # domain = "example.com"
//! font_dirs = ["assets/fonts"]
//!
//! [og_image.canvas]
//! background_color = "#ffffff"
//! # background_image = "/assets/images/og-background.png"
//! width = 1200
//! height = 600
//!
//! [og_image.header]
//! font_family = "Helvetica, Bold"
//! color = "#2f313d"
//! prefix = ""
//! suffix = ""
//!
//! [og_image.content]
//! font_family = "Helvetica, Regular"
//! color = "#535358"
//!
//! # [og_image.border_bottom]
//! # width = 20
//! # fill = ["#820C02", "#A91401", "#D51F06"]   # or a single color
//!
//! [og_image.image]
//! # path = "/assets/images/avatar.png"       # or: image = "/path.png"
//! width = 150
//! height = 150
//! radius = 50
//! gravity = "ne"
//! position = { x = 80, y = 100 }
//!
//! [og_image.metadata]
//! fields = ["date", "tags"]
//! separator = " • "
//! date_format = "%B %d, %Y"
//!
//! [og_image.processing]
//! # max_processes = 4
//! ```
//!
//! ## Partial Configuration
//!
//! Every layer is sparse: override just the values you want. Nested tables
//! merge key by key; arrays and scalars replace the value below them.
//!
//! Unknown keys are ignored and reported as warnings.

use crate::imaging::{Anchor, Color, Gravity};
use chrono::format::{Item, StrftimeItems};
use serde::{Deserialize, Deserializer, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;
use tracing::warn;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("TOML serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Name of the table holding card settings in the site config file.
pub const CONFIG_TABLE: &str = "og_image";

/// Card configuration.
///
/// The same shape serves as the site-wide config and as the effective config
/// for one item; see [`resolve_config`]. All fields have defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CardConfig {
    /// Skip rendering entirely when false.
    pub enabled: bool,
    /// Output directory, relative to the site root.
    pub output_dir: String,
    /// Collections to render cards for.
    pub collections: Vec<String>,
    /// Re-render cards whose output file already exists.
    pub force: bool,
    /// Log progress at info level.
    pub verbose: bool,
    pub skip_drafts: bool,
    /// Site domain printed in the bottom-right corner.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
    /// Site-relative directories searched for fonts before system directories.
    pub font_dirs: Vec<String>,
    pub canvas: CanvasConfig,
    pub header: HeaderConfig,
    pub content: ContentConfig,
    /// Bottom border strip. Absent (or width 0) draws nothing.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub border_bottom: Option<BorderConfig>,
    #[serde(deserialize_with = "image_or_path")]
    pub image: ImageConfig,
    pub metadata: MetadataConfig,
    pub processing: ProcessingConfig,
}

impl Default for CardConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            output_dir: "assets/images/og".to_string(),
            collections: vec!["posts".to_string()],
            force: false,
            verbose: false,
            skip_drafts: true,
            domain: None,
            font_dirs: vec!["assets/fonts".to_string()],
            canvas: CanvasConfig::default(),
            header: HeaderConfig::default(),
            content: ContentConfig::default(),
            border_bottom: None,
            image: ImageConfig::default(),
            metadata: MetadataConfig::default(),
            processing: ProcessingConfig::default(),
        }
    }
}

impl CardConfig {
    /// Apply the structural normalizations every materialized config carries.
    ///
    /// - A border of width 0 becomes no border.
    /// - A border without fill colors is black.
    pub fn normalize(mut self) -> Self {
        self.border_bottom = self.border_bottom.and_then(|mut border| {
            if border.width == 0 {
                return None;
            }
            if border.fill.is_empty() {
                border.fill = vec![Color::BLACK];
            }
            Some(border)
        });
        self
    }

    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_dimensions("canvas", self.canvas.width, self.canvas.height)?;
        check_dimensions("image", self.image.width, self.image.height)?;
        if StrftimeItems::new(&self.metadata.date_format).any(|item| matches!(item, Item::Error)) {
            return Err(ConfigError::Validation(format!(
                "metadata.date_format {:?} is not a valid strftime format",
                self.metadata.date_format
            )));
        }
        Ok(())
    }

    /// Whether a thumbnail image is configured.
    pub fn has_image(&self) -> bool {
        self.image.path.as_deref().is_some_and(|p| !p.is_empty())
    }

    /// This config as a TOML table, the base layer for merging.
    pub fn to_value(&self) -> Result<toml::Value, ConfigError> {
        Ok(toml::Value::try_from(self)?)
    }
}

/// Largest width or height accepted for the canvas and the thumbnail.
pub const MAX_DIMENSION: u32 = 8192;

fn check_dimensions(group: &str, width: u32, height: u32) -> Result<(), ConfigError> {
    if width == 0 || height == 0 {
        return Err(ConfigError::Validation(format!(
            "{group}.width and {group}.height must be non-zero"
        )));
    }
    if width > MAX_DIMENSION || height > MAX_DIMENSION {
        return Err(ConfigError::Validation(format!(
            "{group} size {width}x{height} exceeds the {MAX_DIMENSION} pixel limit"
        )));
    }
    Ok(())
}

/// Canvas size and background.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CanvasConfig {
    pub background_color: Color,
    /// Site-relative path of an image covering the whole canvas.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub background_image: Option<String>,
    pub width: u32,
    pub height: u32,
}

impl Default for CanvasConfig {
    fn default() -> Self {
        Self {
            background_color: Color::WHITE,
            background_image: None,
            width: 1200,
            height: 600,
        }
    }
}

/// Title text style.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HeaderConfig {
    /// `"Family, Style"`.
    pub font_family: String,
    pub color: Color,
    /// Text placed before the title.
    pub prefix: String,
    /// Text placed after the title.
    pub suffix: String,
}

impl Default for HeaderConfig {
    fn default() -> Self {
        Self {
            font_family: "Helvetica, Bold".to_string(),
            color: Color::rgb(0x2f, 0x31, 0x3d),
            prefix: String::new(),
            suffix: String::new(),
        }
    }
}

/// Style for the metadata line and the domain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContentConfig {
    pub font_family: String,
    pub color: Color,
}

impl Default for ContentConfig {
    fn default() -> Self {
        Self {
            font_family: "Helvetica, Regular".to_string(),
            color: Color::rgb(0x53, 0x53, 0x58),
        }
    }
}

/// Bottom border strip.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BorderConfig {
    /// Strip height in pixels.
    pub width: u32,
    /// One color, or several drawn as equal segments left to right.
    #[serde(deserialize_with = "one_or_many")]
    pub fill: Vec<Color>,
}

/// Thumbnail image placed on the card.
///
/// In config files this may also be written as a bare path string
/// (`image = "/avatar.png"`), meaning that path with every other field at its
/// default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImageConfig {
    /// Site-relative path. No path, no image.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    pub width: u32,
    pub height: u32,
    /// Corner radius in pixels.
    pub radius: u32,
    pub gravity: Gravity,
    pub position: Anchor,
}

impl Default for ImageConfig {
    fn default() -> Self {
        Self {
            path: None,
            width: 150,
            height: 150,
            radius: 50,
            gravity: Gravity::NorthEast,
            position: Anchor::new(80, 100),
        }
    }
}

impl ImageConfig {
    pub fn from_path(path: impl Into<String>) -> Self {
        Self {
            path: Some(path.into()),
            ..Self::default()
        }
    }
}

/// Metadata line settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MetadataConfig {
    /// Field names rendered in order: `date`, `tags`, or any front-matter key.
    pub fields: Vec<String>,
    pub separator: String,
    /// strftime format for the `date` field.
    pub date_format: String,
}

impl Default for MetadataConfig {
    fn default() -> Self {
        Self {
            fields: vec!["date".to_string(), "tags".to_string()],
            separator: " • ".to_string(),
            date_format: "%B %d, %Y".to_string(),
        }
    }
}

/// Parallel processing settings.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessingConfig {
    /// Maximum number of parallel render workers.
    /// When absent, defaults to the number of CPU cores.
    /// Values larger than the core count are clamped down.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_processes: Option<usize>,
}

/// Resolve the effective thread count from config.
///
/// - `None` → use all available cores
/// - `Some(n)` → use `min(n, cores)` (user can constrain down, not up)
pub fn effective_threads(config: &ProcessingConfig) -> usize {
    let cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    config.max_processes.map(|n| n.min(cores)).unwrap_or(cores)
}

fn image_or_path<'de, D>(deserializer: D) -> Result<ImageConfig, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Input {
        Path(String),
        Table(ImageConfig),
    }

    Ok(match Input::deserialize(deserializer)? {
        Input::Path(path) => ImageConfig::from_path(path),
        Input::Table(config) => config,
    })
}

fn one_or_many<'de, D>(deserializer: D) -> Result<Vec<Color>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Input {
        One(Color),
        Many(Vec<Color>),
    }

    Ok(match Input::deserialize(deserializer)? {
        Input::One(color) => vec![color],
        Input::Many(colors) => colors,
    })
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely (arrays included).
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Deserialize, normalize and validate a raw config value.
///
/// Returns the config and the dotted paths of any keys that were ignored.
pub fn materialize(value: toml::Value) -> Result<(CardConfig, Vec<String>), ConfigError> {
    let mut ignored = Vec::new();
    let config: CardConfig = serde_ignored::deserialize(value, |path: serde_ignored::Path| {
        ignored.push(path.to_string());
    })?;
    let config = config.normalize();
    config.validate()?;
    Ok((config, ignored))
}

/// Effective config for one item: `overlay` merged on top of `global`.
///
/// Neither input is modified. Without an overlay the result equals `global`.
pub fn resolve_config(
    global: &CardConfig,
    overlay: Option<&toml::Table>,
) -> Result<CardConfig, ConfigError> {
    let Some(overlay) = overlay.filter(|t| !t.is_empty()) else {
        return Ok(global.clone());
    };
    let merged = merge_toml(global.to_value()?, toml::Value::Table(overlay.clone()));
    let (config, ignored) = materialize(merged)?;
    for key in ignored {
        warn!(key = %key, "ignoring unknown og_image key in front matter");
    }
    Ok(config)
}

/// Parse card settings from the text of a site config file.
///
/// Only the `[og_image]` table is read; a file without one yields defaults.
/// Ignored keys are reported with their full dotted path.
pub fn parse_config(content: &str) -> Result<(CardConfig, Vec<String>), ConfigError> {
    let mut document: toml::Table = toml::from_str(content)?;
    let Some(section) = document.remove(CONFIG_TABLE) else {
        return materialize(toml::Value::Table(toml::Table::new()));
    };
    if !section.is_table() {
        return Err(ConfigError::Validation(format!(
            "`{CONFIG_TABLE}` must be a table"
        )));
    }
    let (config, ignored) = materialize(section)?;
    let ignored = ignored
        .into_iter()
        .map(|key| format!("{CONFIG_TABLE}.{key}"))
        .collect();
    Ok((config, ignored))
}

/// Read card settings from a site config file, with the keys it ignored.
///
/// A missing file yields the stock defaults.
pub fn read_config(path: &Path) -> Result<(CardConfig, Vec<String>), ConfigError> {
    if !path.exists() {
        return Ok((CardConfig::default(), Vec::new()));
    }
    let content = fs::read_to_string(path)?;
    parse_config(&content)
}

/// Load card settings from a site config file.
///
/// A missing file yields the stock defaults. Unknown keys are logged as warnings.
pub fn load_config(path: &Path) -> Result<CardConfig, ConfigError> {
    let (config, ignored) = read_config(path)?;
    for key in ignored {
        warn!(key = %key, file = %path.display(), "ignoring unknown config key");
    }
    Ok(config)
}

/// Returns a fully-commented stock config with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# Social card configuration
# ==========================
# Card settings live in the [og_image] table of the site's config.toml.
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults.
#
# Any post or page can override these in its front matter:
#
#   +++
#   title = "Hello"
#   [og_image]
#   domain = "blog.example.com"
#   [og_image.canvas]
#   background_color = "#000000"
#   +++
#
# Unknown keys are ignored with a warning.

[og_image]
# Set to false to disable card generation (globally or for one item).
enabled = true

# Output directory, relative to the site root. Cards are written to
# <output_dir>/<collection>/<slug>.png.
output_dir = "assets/images/og"

# Collections to render: "posts", "pages", or the name of any _<name> directory.
collections = ["posts"]

# Re-render cards that already exist.
force = false

# Log progress for every item.
verbose = false

# Skip items marked draft = true.
skip_drafts = true

# Site domain printed in the bottom-right corner.
# domain = "example.com"

# Directories searched for font files before the system font directories.
font_dirs = ["assets/fonts"]

# ---------------------------------------------------------------------------
# Canvas
# ---------------------------------------------------------------------------
[og_image.canvas]
background_color = "#ffffff"
# Image covering the whole canvas, relative to the site root.
# background_image = "/assets/images/og-background.png"
width = 1200
height = 600

# ---------------------------------------------------------------------------
# Title text
# ---------------------------------------------------------------------------
[og_image.header]
# "Family, Style" matched against font file names.
font_family = "Helvetica, Bold"
color = "#2f313d"
prefix = ""
suffix = ""

# ---------------------------------------------------------------------------
# Metadata and domain text
# ---------------------------------------------------------------------------
[og_image.content]
font_family = "Helvetica, Regular"
color = "#535358"

# ---------------------------------------------------------------------------
# Bottom border (none by default)
# ---------------------------------------------------------------------------
# [og_image.border_bottom]
# width = 20
# One color, or several drawn as equal segments from left to right.
# fill = ["#820C02", "#A91401", "#D51F06", "#DE3F24", "#EDA286"]

# ---------------------------------------------------------------------------
# Thumbnail image (none until a path is set)
# ---------------------------------------------------------------------------
[og_image.image]
# path = "/assets/images/avatar.png"
width = 150
height = 150
radius = 50
# Corner the position is measured from: nw, n, ne, w, center, e, sw, s, se.
gravity = "ne"
position = { x = 80, y = 100 }

# ---------------------------------------------------------------------------
# Metadata line
# ---------------------------------------------------------------------------
[og_image.metadata]
# Rendered in this order. "date" and "tags" are built in; any other name is
# read from the item's front matter.
fields = ["date", "tags"]
separator = " • "
date_format = "%B %d, %Y"

# ---------------------------------------------------------------------------
# Processing
# ---------------------------------------------------------------------------
[og_image.processing]
# Maximum parallel render workers.
# Omit or comment out to auto-detect (= number of CPU cores).
# max_processes = 4
"##
}
