//! Card drawing, pure Rust with no system libraries.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Background** | solid fill + `resize_to_fill` cover image |
//! | **Border** | equal-width color segments along the bottom edge |
//! | **Image** | Lanczos3 fit + anti-aliased rounded-corner mask |
//! | **Text** | `fontdue` glyphs, greedy word wrap, gravity placement |
//! | **Save** | PNG |
//!
//! The module is split into:
//! - **Calculations**: Pure functions for placement, wrapping and blending (unit testable)
//! - **Parameters**: [`DrawOp`] and the structs describing each drawing primitive
//! - **Backend**: [`CanvasBackend`] trait + [`RustCanvas`]
//! - **Fonts**: `"Family, Style"` lookup on disk
//! - **Operations**: [`render_card`], which runs a `DrawOp` sequence against a backend

pub mod backend;
mod calculations;
pub mod fonts;
pub mod operations;
mod params;
pub mod rust_backend;

pub use backend::{BackendError, CanvasBackend};
pub use operations::render_card;
pub use params::{
    Anchor, BackgroundParams, BorderParams, Color, DrawOp, Edge, Gravity, ImageParams, TextParams,
};
pub use rust_backend::RustCanvas;
