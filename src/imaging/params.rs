//! Parameter types for canvas operations.
//!
//! These structs describe *what* to draw, not *how* to draw it. They are the
//! interface between the [`layout`](crate::layout) engine (which decides what
//! goes on a card and where) and the [`backend`](super::backend) (which does the
//! actual pixel work). This separation allows swapping backends (e.g. for
//! testing with a mock) without changing layout logic.
//!
//! ## Types
//!
//! - [`Color`]: RGBA color parsed from a hex string (`#RGB`, `#RGBA`, `#RRGGBB`, `#RRGGBBAA`).
//! - [`Gravity`]: which corner/edge an [`Anchor`] offset is measured from.
//! - [`Anchor`]: an `(x, y)` offset from the gravity origin, measured inward.
//! - [`DrawOp`]: one drawing instruction; a card is an ordered `Vec<DrawOp>`.

use serde::{Deserialize, Serialize, Serializer};
use std::fmt;

/// An RGBA color.
///
/// Serialized as the canonical `#RRGGBB` / `#RRGGBBAA` hex string so it can
/// travel through TOML config merging unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const BLACK: Color = Color::rgb(0, 0, 0);
    pub const WHITE: Color = Color::rgb(255, 255, 255);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    /// Parse a hex color string. The leading `#` is optional.
    pub fn parse(input: &str) -> Result<Self, String> {
        let hex = input.trim().trim_start_matches('#');
        let invalid = || format!("invalid color {input:?} (expected #RGB or #RRGGBB hex)");

        if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(invalid());
        }

        // Short forms repeat each nibble: "f80" -> "ff8800"
        let expanded: String = match hex.len() {
            3 | 4 => hex.chars().flat_map(|c| [c, c]).collect(),
            6 | 8 => hex.to_string(),
            _ => return Err(invalid()),
        };

        let channel = |i: usize| u8::from_str_radix(&expanded[i..i + 2], 16).map_err(|_| invalid());
        Ok(Self {
            r: channel(0)?,
            g: channel(2)?,
            b: channel(4)?,
            a: if expanded.len() == 8 { channel(6)? } else { 255 },
        })
    }

    pub fn to_rgba(self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)?;
        if self.a != 255 {
            write!(f, "{:02x}", self.a)?;
        }
        Ok(())
    }
}

impl TryFrom<String> for Color {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Color::parse(&value)
    }
}

impl From<Color> for String {
    fn from(color: Color) -> Self {
        color.to_string()
    }
}

/// Anchor corner or edge for positioning an element on the canvas.
///
/// Config files may use the short compass form (`ne`) or the long one
/// (`northeast`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Gravity {
    #[serde(rename = "nw", alias = "northwest", alias = "north_west")]
    NorthWest,
    #[serde(rename = "n", alias = "north")]
    North,
    #[serde(rename = "ne", alias = "northeast", alias = "north_east")]
    NorthEast,
    #[serde(rename = "w", alias = "west")]
    West,
    #[serde(rename = "center", alias = "centre")]
    Center,
    #[serde(rename = "e", alias = "east")]
    East,
    #[serde(rename = "sw", alias = "southwest", alias = "south_west")]
    SouthWest,
    #[serde(rename = "s", alias = "south")]
    South,
    #[serde(rename = "se", alias = "southeast", alias = "south_east")]
    SouthEast,
}

/// Offset from the gravity origin, measured toward the canvas interior.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Anchor {
    pub x: i32,
    pub y: i32,
}

impl Anchor {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// Canvas edge a border is drawn along. Cards only use the bottom edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Edge {
    Bottom,
}

/// Create the canvas: fill with `color`, then cover with the background image if present.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BackgroundParams {
    pub width: u32,
    pub height: u32,
    pub color: Color,
    #[serde(rename = "image_bytes", serialize_with = "serialize_byte_len")]
    pub image: Option<Vec<u8>>,
}

/// A solid strip along one edge, split into equal segments, one per fill color.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BorderParams {
    pub width: u32,
    pub edge: Edge,
    pub fill: Vec<Color>,
}

/// A raster image with rounded corners placed relative to a gravity origin.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImageParams {
    #[serde(serialize_with = "serialize_len")]
    pub bytes: Vec<u8>,
    pub gravity: Gravity,
    pub width: u32,
    pub height: u32,
    pub radius: u32,
    pub anchor: Anchor,
}

/// A text block, optionally wrapped to `width` pixels.
///
/// `dpi` is the rasterization density: the font is rendered at
/// `12pt * dpi / 72` pixels.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TextParams {
    pub text: String,
    pub gravity: Gravity,
    pub width: Option<u32>,
    pub color: Color,
    pub dpi: u32,
    pub font_family: String,
    pub anchor: Anchor,
}

/// One drawing instruction. Later operations paint over earlier ones.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "op", rename_all = "lowercase")]
pub enum DrawOp {
    Background(BackgroundParams),
    Border(BorderParams),
    Image(ImageParams),
    Text(TextParams),
}

fn serialize_len<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_u64(bytes.len() as u64)
}

fn serialize_byte_len<S: Serializer>(
    bytes: &Option<Vec<u8>>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    match bytes {
        Some(b) => serializer.serialize_some(&(b.len() as u64)),
        None => serializer.serialize_none(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_long_hex() {
        assert_eq!(Color::parse("#2f313d").unwrap(), Color::rgb(0x2f, 0x31, 0x3d));
    }

    #[test]
    fn parse_short_hex_expands_nibbles() {
        assert_eq!(Color::parse("#f80").unwrap(), Color::rgb(0xff, 0x88, 0x00));
    }

    #[test]
    fn parse_with_alpha() {
        let c = Color::parse("#00000080").unwrap();
        assert_eq!(c.a, 0x80);
        assert_eq!(c.to_string(), "#00000080");
    }

    #[test]
    fn parse_without_hash() {
        assert_eq!(Color::parse("FFFFFF").unwrap(), Color::WHITE);
    }

    #[test]
    fn parse_rejects_garbage() {
        assert!(Color::parse("red").is_err());
        assert!(Color::parse("#12345").is_err());
        assert!(Color::parse("").is_err());
    }

    #[test]
    fn display_is_lowercase_hex() {
        assert_eq!(Color::parse("#FFFFFF").unwrap().to_string(), "#ffffff");
    }

    #[test]
    fn gravity_accepts_short_and_long_names() {
        #[derive(Deserialize)]
        struct Holder {
            g: Gravity,
        }
        let short: Holder = toml::from_str(r#"g = "ne""#).unwrap();
        let long: Holder = toml::from_str(r#"g = "southwest""#).unwrap();
        assert_eq!(short.g, Gravity::NorthEast);
        assert_eq!(long.g, Gravity::SouthWest);
    }

    #[test]
    fn draw_op_json_reports_byte_lengths() {
        let op = DrawOp::Background(BackgroundParams {
            width: 1200,
            height: 600,
            color: Color::WHITE,
            image: Some(vec![0; 42]),
        });
        let json = serde_json::to_value(&op).unwrap();
        assert_eq!(json["op"], "background");
        assert_eq!(json["image_bytes"], 42);
        assert_eq!(json["color"], "#ffffff");
    }
}
