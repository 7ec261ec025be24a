mod cluster;
mod column;

use serde::Serialize;
use tracing::debug;

use crate::detection::DetectionBox;
use crate::error::EngineError;
use crate::geom::{union_rect, Rect};

/// How far, in multiples of a seed box's own size, the clustering window
/// reaches on each side.
pub const DEFAULT_WINDOW_SCALE: f32 = 2.0;
/// Fraction of the median member width within which two members share a column.
pub const DEFAULT_COLUMN_THRESHOLD_RATIO: f32 = 0.8;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReconstructConfig {
    window_scale: f32,
    column_threshold_ratio: f32,
}

impl Default for ReconstructConfig {
    fn default() -> Self {
        Self {
            window_scale: DEFAULT_WINDOW_SCALE,
            column_threshold_ratio: DEFAULT_COLUMN_THRESHOLD_RATIO,
        }
    }
}

impl ReconstructConfig {
    pub fn new(window_scale: f32, column_threshold_ratio: f32) -> Result<Self, EngineError> {
        if !window_scale.is_finite() || window_scale < 0.0 {
            return Err(EngineError::invalid(format!(
                "window scale must be a non-negative number, got {}",
                window_scale
            )));
        }
        if !column_threshold_ratio.is_finite() || column_threshold_ratio < 0.0 {
            return Err(EngineError::invalid(format!(
                "column threshold ratio must be a non-negative number, got {}",
                column_threshold_ratio
            )));
        }
        Ok(Self {
            window_scale,
            column_threshold_ratio,
        })
    }

    pub fn window_scale(&self) -> f32 {
        self.window_scale
    }

    pub fn column_threshold_ratio(&self) -> f32 {
        self.column_threshold_ratio
    }
}

/// A reconstructed speech balloon.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Bubble {
    rect: Rect,
    text: String,
    columns: Vec<Vec<DetectionBox>>,
}

impl Bubble {
    fn from_members(members: Vec<DetectionBox>, column_threshold_ratio: f32) -> Option<Self> {
        let rect = members
            .iter()
            .map(DetectionBox::bounds)
            .reduce(|acc, bounds| union_rect(&acc, &bounds))?;
        let columns = column::split_columns(members, column_threshold_ratio);
        let text = column::assemble_text(&columns);
        Some(Self {
            rect,
            text,
            columns,
        })
    }

    pub fn rect(&self) -> Rect {
        self.rect
    }

    /// Member text in reading order.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Member boxes per column, for diagnostics.
    pub fn columns(&self) -> &[Vec<DetectionBox>] {
        &self.columns
    }

    pub fn members(&self) -> impl Iterator<Item = &DetectionBox> {
        self.columns.iter().flatten()
    }

    pub fn member_count(&self) -> usize {
        self.columns.iter().map(Vec::len).sum()
    }
}

/// Groups raw detection boxes into bubbles and assembles each bubble's text
/// in vertical right-to-left reading order.
///
/// Every input box lands in exactly one bubble. The order of the returned
/// bubbles follows their seed boxes in the input; use [`sort_reading_rows`]
/// for presentation order.
pub fn reconstruct(boxes: &[DetectionBox], config: &ReconstructConfig) -> Vec<Bubble> {
    let clusters = cluster::cluster_indices(boxes, config.window_scale);
    debug!(
        boxes = boxes.len(),
        clusters = clusters.len(),
        "clustered detection boxes"
    );

    clusters
        .into_iter()
        .filter_map(|indices| {
            let members = indices.into_iter().map(|idx| boxes[idx].clone()).collect();
            Bubble::from_members(members, config.column_threshold_ratio)
        })
        .collect()
}

/// Sorts bubbles top-to-bottom, breaking ties right-to-left.
pub fn sort_reading_rows(bubbles: &mut [Bubble]) {
    bubbles.sort_by(|a, b| {
        a.rect
            .y
            .total_cmp(&b.rect.y)
            .then_with(|| b.rect.max_x().total_cmp(&a.rect.max_x()))
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    fn det(x: f32, y: f32, w: f32, h: f32, text: &str) -> DetectionBox {
        DetectionBox::from_rect(Rect::new(x, y, w, h), text).unwrap()
    }

    #[test]
    fn bubble_rect_encloses_all_members() {
        let boxes = vec![
            det(100.0, 100.0, 20.0, 30.0, "あ"),
            det(120.0, 125.0, 20.0, 30.0, "い"),
        ];
        let bubbles = reconstruct(&boxes, &ReconstructConfig::default());
        assert_eq!(bubbles.len(), 1);
        assert_eq!(bubbles[0].rect(), Rect::new(100.0, 100.0, 40.0, 55.0));
        assert_eq!(bubbles[0].member_count(), 2);
    }

    #[test]
    fn vertical_bubble_reads_in_manga_order() {
        // two columns of two glyphs, glyph boxes overlapping vertically
        let boxes = vec![
            det(100.0, 100.0, 20.0, 24.0, "ま"),
            det(100.0, 120.0, 20.0, 24.0, "す"),
            det(130.0, 100.0, 20.0, 24.0, "あ"),
            det(130.0, 120.0, 20.0, 24.0, "り"),
        ];
        let bubbles = reconstruct(&boxes, &ReconstructConfig::default());
        assert_eq!(bubbles.len(), 1);
        assert_eq!(bubbles[0].text(), "あり ます");
        assert_eq!(bubbles[0].columns().len(), 2);
    }

    #[test]
    fn config_rejects_negative_values() {
        assert!(ReconstructConfig::new(-1.0, 0.8).is_err());
        assert!(ReconstructConfig::new(2.0, f32::NAN).is_err());
        assert!(ReconstructConfig::new(0.0, 0.0).is_ok());
    }

    #[test]
    fn reading_rows_sort_top_down_then_right_to_left() {
        let boxes = vec![
            det(0.0, 500.0, 10.0, 10.0, "下"),
            det(0.0, 0.0, 10.0, 10.0, "左"),
            det(300.0, 0.0, 10.0, 10.0, "右"),
        ];
        let mut bubbles = reconstruct(&boxes, &ReconstructConfig::default());
        sort_reading_rows(&mut bubbles);
        let texts: Vec<&str> = bubbles.iter().map(Bubble::text).collect();
        assert_eq!(texts, vec!["右", "左", "下"]);
    }
}
