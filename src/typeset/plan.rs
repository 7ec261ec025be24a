use serde::Serialize;

use super::{Layout, TypesetConfig};
use crate::geom::Rect;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DrawLine {
    pub text: String,
    /// Horizontal centre of the line.
    pub x: f32,
    /// Vertical middle of the line.
    pub y: f32,
}

/// Erase-then-draw instructions for one bubble. The `clear` rectangle must be
/// filled with the background colour before any line is drawn so that the
/// source glyphs are fully hidden.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DrawPlan {
    pub clear: Rect,
    pub font_size: f32,
    pub lines: Vec<DrawLine>,
}

impl DrawPlan {
    /// Centres the line block vertically in `rect` and each line horizontally.
    pub fn new(rect: Rect, layout: &Layout, config: &TypesetConfig) -> Self {
        let font_size = layout.font_size;
        let line_height = font_size * config.line_height_ratio();
        let block_height = layout.lines.len() as f32 * line_height;
        let first_y = rect.y + (rect.height - block_height) / 2.0 + font_size / 2.0;
        let x = rect.center_x();

        let lines = layout
            .lines
            .iter()
            .enumerate()
            .map(|(idx, text)| DrawLine {
                text: text.clone(),
                x,
                y: first_y + idx as f32 * line_height,
            })
            .collect();

        Self {
            clear: rect,
            font_size,
            lines,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lines_are_centred_as_a_block() {
        let rect = Rect::new(10.0, 20.0, 100.0, 60.0);
        let layout = Layout {
            font_size: 10.0,
            lines: vec!["one".to_string(), "two".to_string()],
        };
        let plan = DrawPlan::new(rect, &layout, &TypesetConfig::default());
        assert_eq!(plan.clear, rect);
        assert_eq!(plan.lines.len(), 2);
        // block height 24, top at 20 + 18
        assert!((plan.lines[0].y - 43.0).abs() < 1e-4);
        assert!((plan.lines[1].y - 55.0).abs() < 1e-4);
        assert!(plan.lines.iter().all(|line| line.x == 60.0));
    }

    #[test]
    fn empty_layout_still_clears() {
        let rect = Rect::new(0.0, 0.0, 10.0, 10.0);
        let layout = Layout {
            font_size: 8.0,
            lines: Vec::new(),
        };
        let plan = DrawPlan::new(rect, &layout, &TypesetConfig::default());
        assert_eq!(plan.clear, rect);
        assert!(plan.lines.is_empty());
    }
}
