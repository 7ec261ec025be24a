use tracing::debug;

use crate::detection::DetectionBox;
use crate::geom::median;

/// Splits a cluster into vertical text columns in manga reading order:
/// columns right-to-left, members top-to-bottom.
///
/// Two members share a column when their horizontal centres are within
/// `threshold_ratio` of the cluster's median member width and their vertical
/// extents overlap the column seed. A zero median width puts every member in
/// its own column.
pub(super) fn split_columns(
    members: Vec<DetectionBox>,
    threshold_ratio: f32,
) -> Vec<Vec<DetectionBox>> {
    let mut widths: Vec<f32> = members.iter().map(DetectionBox::width).collect();
    let median_width = median(&mut widths);
    let threshold = median_width * threshold_ratio;

    let mut ordered = members;
    ordered.sort_by(|a, b| b.center_x().total_cmp(&a.center_x()));

    let mut columns: Vec<Vec<DetectionBox>> = if threshold > 0.0 {
        group_by_seed(ordered, threshold)
    } else {
        ordered.into_iter().map(|member| vec![member]).collect()
    };

    for column in &mut columns {
        column.sort_by(|a, b| a.center_y().total_cmp(&b.center_y()));
    }
    columns.sort_by(|a, b| column_right_edge(b).total_cmp(&column_right_edge(a)));

    debug!(
        median_width,
        threshold,
        columns = columns.len(),
        "split cluster into columns"
    );
    columns
}

fn group_by_seed(ordered: Vec<DetectionBox>, threshold: f32) -> Vec<Vec<DetectionBox>> {
    let mut slots: Vec<Option<DetectionBox>> = ordered.into_iter().map(Some).collect();
    let mut columns = Vec::new();

    for seed_idx in 0..slots.len() {
        let Some(seed) = slots[seed_idx].take() else {
            continue;
        };
        let seed_bounds = seed.bounds();
        let seed_center_x = seed.center_x();
        let mut column = vec![seed];

        for slot in slots.iter_mut().skip(seed_idx + 1) {
            let joins = slot.as_ref().is_some_and(|other| {
                (other.center_x() - seed_center_x).abs() <= threshold
                    && seed_bounds.overlaps_vertically(&other.bounds())
            });
            if joins {
                if let Some(other) = slot.take() {
                    column.push(other);
                }
            }
        }
        columns.push(column);
    }

    columns
}

fn column_right_edge(column: &[DetectionBox]) -> f32 {
    column
        .iter()
        .map(DetectionBox::max_x)
        .fold(f32::NEG_INFINITY, f32::max)
}

/// Glyphs within a column are joined without separators; columns are joined
/// with a single space.
pub(super) fn assemble_text(columns: &[Vec<DetectionBox>]) -> String {
    columns
        .iter()
        .map(|column| column.iter().map(DetectionBox::text).collect::<String>())
        .collect::<Vec<_>>()
        .join(" ")
}
