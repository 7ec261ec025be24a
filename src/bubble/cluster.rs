use crate::detection::DetectionBox;

/// Groups boxes by proximity to a seed box.
///
/// Each unvisited box seeds a cluster whose window is the seed inflated by
/// `window_scale` times its own width and height. Unvisited boxes whose
/// centre falls inside that window join the cluster. The window is never
/// re-grown from later members, so a bubble wider than the seed's window
/// is split.
pub(super) fn cluster_indices(boxes: &[DetectionBox], window_scale: f32) -> Vec<Vec<usize>> {
    let mut visited = vec![false; boxes.len()];
    let mut clusters = Vec::new();

    for seed_idx in 0..boxes.len() {
        if visited[seed_idx] {
            continue;
        }
        visited[seed_idx] = true;
        let window = boxes[seed_idx].bounds().inflate_by_own_size(window_scale);
        let mut members = vec![seed_idx];

        for (idx, candidate) in boxes.iter().enumerate() {
            if visited[idx] {
                continue;
            }
            if window.contains(candidate.center()) {
                visited[idx] = true;
                members.push(idx);
            }
        }
        clusters.push(members);
    }

    clusters
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geom::Rect;

    fn det(x: f32, y: f32, w: f32, h: f32) -> DetectionBox {
        DetectionBox::from_rect(Rect::new(x, y, w, h), "字").unwrap()
    }

    #[test]
    fn neighbours_within_window_join_seed() {
        let boxes = vec![det(100.0, 100.0, 10.0, 10.0), det(125.0, 100.0, 10.0, 10.0)];
        assert_eq!(cluster_indices(&boxes, 2.0), vec![vec![0, 1]]);
    }

    #[test]
    fn centre_just_outside_window_stays_apart() {
        // window spans x 80..130, candidate centre at 131
        let boxes = vec![det(100.0, 100.0, 10.0, 10.0), det(126.0, 100.0, 10.0, 10.0)];
        assert_eq!(cluster_indices(&boxes, 2.0), vec![vec![0], vec![1]]);
    }

    #[test]
    fn window_is_not_regrown_from_members() {
        // a reaches b, b would reach c, but c is outside a's window
        let boxes = vec![
            det(0.0, 0.0, 10.0, 10.0),
            det(20.0, 0.0, 10.0, 10.0),
            det(40.0, 0.0, 10.0, 10.0),
        ];
        assert_eq!(cluster_indices(&boxes, 2.0), vec![vec![0, 1], vec![2]]);
    }

    #[test]
    fn zero_size_boxes_only_catch_identical_centres() {
        let boxes = vec![
            det(5.0, 5.0, 0.0, 0.0),
            det(5.0, 5.0, 0.0, 0.0),
            det(6.0, 5.0, 0.0, 0.0),
        ];
        assert_eq!(cluster_indices(&boxes, 2.0), vec![vec![0, 1], vec![2]]);
    }

    #[test]
    fn empty_input_yields_no_clusters() {
        assert!(cluster_indices(&[], 2.0).is_empty());
    }
}
