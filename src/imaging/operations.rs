//! High-level canvas operations.
//!
//! Executes a [`DrawOp`] sequence produced by the layout engine against a
//! backend, in order.

use super::backend::{BackendError, CanvasBackend};
use super::params::DrawOp;
use std::path::Path;

/// Result type for canvas operations.
pub type Result<T> = std::result::Result<T, BackendError>;

/// Render a card and save it to `output`.
///
/// The first operation must be [`DrawOp::Background`]; it creates the
/// surface every later operation paints onto. A second background in the
/// sequence is rejected the same way.
pub fn render_card(backend: &impl CanvasBackend, ops: &[DrawOp], output: &Path) -> Result<()> {
    let (first, rest) = ops.split_first().ok_or(BackendError::InvalidSequence)?;
    let DrawOp::Background(background) = first else {
        return Err(BackendError::InvalidSequence);
    };

    let mut surface = backend.create(background)?;
    for op in rest {
        match op {
            DrawOp::Background(_) => return Err(BackendError::InvalidSequence),
            DrawOp::Border(params) => backend.draw_border(&mut surface, params)?,
            DrawOp::Image(params) => backend.draw_image(&mut surface, params)?,
            DrawOp::Text(params) => backend.draw_text(&mut surface, params)?,
        }
    }

    backend.save(surface, output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::backend::tests::{MockCanvas, RecordedOp};
    use crate::imaging::params::{
        Anchor, BackgroundParams, BorderParams, Color, Edge, Gravity, TextParams,
    };

    fn background() -> DrawOp {
        DrawOp::Background(BackgroundParams {
            width: 1200,
            height: 600,
            color: Color::WHITE,
            image: None,
        })
    }

    fn text(s: &str) -> DrawOp {
        DrawOp::Text(TextParams {
            text: s.to_string(),
            gravity: Gravity::NorthWest,
            width: Some(1040),
            color: Color::BLACK,
            dpi: 400,
            font_family: "Helvetica, Bold".to_string(),
            anchor: Anchor::new(80, 100),
        })
    }

    #[test]
    fn executes_ops_in_order_then_saves() {
        let tmp = tempfile::TempDir::new().unwrap();
        let out = tmp.path().join("card.png");
        let backend = MockCanvas::new();
        let ops = vec![
            background(),
            DrawOp::Border(BorderParams {
                width: 20,
                edge: Edge::Bottom,
                fill: vec![Color::BLACK, Color::WHITE],
            }),
            text("Hello"),
        ];

        render_card(&backend, &ops, &out).unwrap();

        let recorded = backend.get_operations();
        assert_eq!(recorded.len(), 4);
        assert!(matches!(recorded[0], RecordedOp::Create { .. }));
        assert!(matches!(recorded[1], RecordedOp::Border { width: 20, colors: 2 }));
        assert!(matches!(&recorded[2], RecordedOp::Text { text, .. } if text == "Hello"));
        assert!(matches!(recorded[3], RecordedOp::Save(_)));
    }

    #[test]
    fn empty_sequence_is_rejected() {
        let backend = MockCanvas::new();
        let result = render_card(&backend, &[], Path::new("/unused.png"));
        assert!(matches!(result, Err(BackendError::InvalidSequence)));
    }

    #[test]
    fn sequence_not_starting_with_background_is_rejected() {
        let backend = MockCanvas::new();
        let result = render_card(&backend, &[text("x")], Path::new("/unused.png"));
        assert!(matches!(result, Err(BackendError::InvalidSequence)));
        assert!(backend.get_operations().is_empty());
    }

    #[test]
    fn second_background_is_rejected() {
        let backend = MockCanvas::new();
        let result = render_card(&backend, &[background(), background()], Path::new("/unused.png"));
        assert!(matches!(result, Err(BackendError::InvalidSequence)));
        assert!(backend.saved_paths().is_empty());
    }
}
