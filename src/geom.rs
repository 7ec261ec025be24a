use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Axis-aligned rectangle in image pixels, top-left origin.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn from_extents(x: f32, y: f32, max_x: f32, max_y: f32) -> Self {
        Self {
            x,
            y,
            width: (max_x - x).max(0.0),
            height: (max_y - y).max(0.0),
        }
    }

    pub fn max_x(&self) -> f32 {
        self.x + self.width
    }

    pub fn max_y(&self) -> f32 {
        self.y + self.height
    }

    pub fn center_x(&self) -> f32 {
        self.x + self.width / 2.0
    }

    pub fn center_y(&self) -> f32 {
        self.y + self.height / 2.0
    }

    /// Grows the rectangle by `scale` times its own width/height on every side.
    pub fn inflate_by_own_size(&self, scale: f32) -> Rect {
        let dx = self.width * scale;
        let dy = self.height * scale;
        Rect::from_extents(self.x - dx, self.y - dy, self.max_x() + dx, self.max_y() + dy)
    }

    /// Inclusive on all edges.
    pub fn contains(&self, point: Point) -> bool {
        point.x >= self.x && point.x <= self.max_x() && point.y >= self.y && point.y <= self.max_y()
    }

    pub fn overlaps_vertically(&self, other: &Rect) -> bool {
        !(other.max_y() < self.y || other.y > self.max_y())
    }

    pub fn is_positive(&self) -> bool {
        self.width.is_finite() && self.height.is_finite() && self.width > 0.0 && self.height > 0.0
    }
}

pub fn union_rect(a: &Rect, b: &Rect) -> Rect {
    let x1 = a.x.min(b.x);
    let y1 = a.y.min(b.y);
    let x2 = a.max_x().max(b.max_x());
    let y2 = a.max_y().max(b.max_y());
    Rect::from_extents(x1, y1, x2, y2)
}

/// Median of the values; the mean of the two middle values for even counts.
pub(crate) fn median(values: &mut [f32]) -> f32 {
    if values.is_empty() {
        return 0.0;
    }
    values.sort_by(|a, b| a.total_cmp(b));
    let mid = values.len() / 2;
    if values.len() % 2 == 0 {
        (values[mid - 1] + values[mid]) / 2.0
    } else {
        values[mid]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inflate_uses_own_size_on_each_side() {
        let rect = Rect::new(10.0, 20.0, 4.0, 6.0);
        let window = rect.inflate_by_own_size(2.0);
        assert_eq!(window, Rect::new(2.0, 8.0, 20.0, 30.0));
    }

    #[test]
    fn contains_is_inclusive() {
        let rect = Rect::new(0.0, 0.0, 10.0, 10.0);
        assert!(rect.contains(Point::new(10.0, 10.0)));
        assert!(rect.contains(Point::new(0.0, 5.0)));
        assert!(!rect.contains(Point::new(10.5, 5.0)));
    }

    #[test]
    fn vertical_overlap_touching_edges_counts() {
        let a = Rect::new(0.0, 0.0, 5.0, 10.0);
        let b = Rect::new(50.0, 10.0, 5.0, 10.0);
        let c = Rect::new(50.0, 10.5, 5.0, 10.0);
        assert!(a.overlaps_vertically(&b));
        assert!(!a.overlaps_vertically(&c));
    }

    #[test]
    fn union_covers_both() {
        let a = Rect::new(0.0, 0.0, 5.0, 5.0);
        let b = Rect::new(10.0, -2.0, 5.0, 5.0);
        assert_eq!(union_rect(&a, &b), Rect::new(0.0, -2.0, 15.0, 7.0));
    }

    #[test]
    fn median_handles_even_and_odd() {
        assert_eq!(median(&mut [3.0, 1.0, 2.0]), 2.0);
        assert_eq!(median(&mut [4.0, 1.0, 3.0, 2.0]), 2.5);
        assert_eq!(median(&mut []), 0.0);
    }
}
