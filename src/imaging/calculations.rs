//! Pure calculation functions for card geometry.
//!
//! All functions here are pure and testable without any I/O or pixels.

use super::params::{Anchor, Gravity};

/// Point size every text block is set in before DPI scaling.
const BASE_POINT_SIZE: f32 = 12.0;

/// Points per inch.
const POINTS_PER_INCH: f32 = 72.0;

/// Pixel size of a font rendered at `dpi`.
///
/// Text is set at 12pt, so `dpi = 72` gives 12px and `dpi = 400` gives ~66.7px.
pub fn font_pixel_size(dpi: u32) -> f32 {
    BASE_POINT_SIZE * dpi as f32 / POINTS_PER_INCH
}

/// Top-left pixel position of an element placed by gravity.
///
/// The anchor is an inward offset from the gravity origin: for `NorthEast`,
/// `x` is the distance between the element's right edge and the canvas's right
/// edge. Axes centered by the gravity ignore their offset.
///
/// # Arguments
/// * `gravity` - Corner/edge the anchor is measured from
/// * `anchor` - Offset from that origin
/// * `canvas` - Canvas dimensions (width, height)
/// * `element` - Element dimensions (width, height)
///
/// # Returns
/// * `(left, top)` - May be negative or exceed the canvas; callers clip.
pub fn place(gravity: Gravity, anchor: Anchor, canvas: (u32, u32), element: (u32, u32)) -> (i64, i64) {
    let (cw, ch) = (canvas.0 as i64, canvas.1 as i64);
    let (ew, eh) = (element.0 as i64, element.1 as i64);
    let (ax, ay) = (anchor.x as i64, anchor.y as i64);

    let from_left = ax;
    let from_right = cw - ax - ew;
    let center_x = (cw - ew) / 2;
    let from_top = ay;
    let from_bottom = ch - ay - eh;
    let center_y = (ch - eh) / 2;

    match gravity {
        Gravity::NorthWest => (from_left, from_top),
        Gravity::North => (center_x, from_top),
        Gravity::NorthEast => (from_right, from_top),
        Gravity::West => (from_left, center_y),
        Gravity::Center => (center_x, center_y),
        Gravity::East => (from_right, center_y),
        Gravity::SouthWest => (from_left, from_bottom),
        Gravity::South => (center_x, from_bottom),
        Gravity::SouthEast => (from_right, from_bottom),
    }
}

/// Split a border of `total` pixels into `count` equal segments.
///
/// Returns `(start, length)` pairs in order. The last segment absorbs the
/// remainder so the segments always cover the full length.
pub fn border_segments(total: u32, count: usize) -> Vec<(u32, u32)> {
    if count == 0 || total == 0 {
        return Vec::new();
    }
    let count = count as u32;
    let base = total / count;
    (0..count)
        .map(|i| {
            let start = i * base;
            let len = if i == count - 1 { total - start } else { base };
            (start, len)
        })
        .collect()
}

/// Greedy word wrap.
///
/// Breaks `text` into lines no wider than `max_width` as measured by
/// `measure`. Explicit newlines always break. A single word wider than the
/// limit stays on its own line rather than being split.
pub fn wrap_words(text: &str, max_width: f32, measure: impl Fn(&str) -> f32) -> Vec<String> {
    let mut lines = Vec::new();

    for paragraph in text.split('\n') {
        let mut current = String::new();
        for word in paragraph.split_whitespace() {
            if current.is_empty() {
                current.push_str(word);
                continue;
            }
            let candidate = format!("{current} {word}");
            if measure(&candidate) <= max_width {
                current = candidate;
            } else {
                lines.push(std::mem::take(&mut current));
                current.push_str(word);
            }
        }
        lines.push(current);
    }

    lines
}

/// Alpha coverage of pixel `(x, y)` inside a `width`×`height` rectangle with
/// rounded corners of `radius`.
///
/// Returns 1.0 for pixels fully inside, 0.0 outside, and a linear ramp across
/// the one-pixel band at the corner arc for anti-aliasing. The radius is
/// clamped to half the shorter side.
pub fn corner_coverage(x: u32, y: u32, width: u32, height: u32, radius: u32) -> f32 {
    let r = radius.min(width / 2).min(height / 2) as f32;
    if r <= 0.0 {
        return 1.0;
    }

    // Sample at the pixel center
    let px = x as f32 + 0.5;
    let py = y as f32 + 0.5;
    let (w, h) = (width as f32, height as f32);

    let cx = if px < r {
        r
    } else if px > w - r {
        w - r
    } else {
        return 1.0;
    };
    let cy = if py < r {
        r
    } else if py > h - r {
        h - r
    } else {
        return 1.0;
    };

    let dist = ((px - cx).powi(2) + (py - cy).powi(2)).sqrt();
    (r - dist + 0.5).clamp(0.0, 1.0)
}

/// Composite `src` over `dst` ("over" operator, straight alpha).
///
/// `coverage` scales the source alpha (glyph coverage, corner masks).
pub fn blend(dst: [u8; 4], src: [u8; 4], coverage: f32) -> [u8; 4] {
    let sa = (src[3] as f32 / 255.0) * coverage.clamp(0.0, 1.0);
    if sa <= 0.0 {
        return dst;
    }
    let da = dst[3] as f32 / 255.0;
    let out_a = sa + da * (1.0 - sa);
    if out_a <= 0.0 {
        return [0, 0, 0, 0];
    }

    let channel = |s: u8, d: u8| {
        let v = (s as f32 * sa + d as f32 * da * (1.0 - sa)) / out_a;
        v.round().clamp(0.0, 255.0) as u8
    };

    [
        channel(src[0], dst[0]),
        channel(src[1], dst[1]),
        channel(src[2], dst[2]),
        (out_a * 255.0).round().clamp(0.0, 255.0) as u8,
    ]
}
