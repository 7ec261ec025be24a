use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::EngineError;
use crate::geom::{Point, Rect};

/// One raw OCR hit: a bounding polygon and the text recognised inside it.
///
/// Bounds are derived from `vertices` on every call so they cannot drift
/// from the polygon.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawDetectionBox")]
pub struct DetectionBox {
    vertices: Vec<Point>,
    text: String,
}

#[derive(Deserialize)]
struct RawDetectionBox {
    #[serde(default)]
    text: String,
    vertices: Vec<Point>,
}

impl TryFrom<RawDetectionBox> for DetectionBox {
    type Error = EngineError;

    fn try_from(raw: RawDetectionBox) -> Result<Self, Self::Error> {
        DetectionBox::new(raw.vertices, raw.text)
    }
}

impl DetectionBox {
    pub fn new(vertices: Vec<Point>, text: impl Into<String>) -> Result<Self, EngineError> {
        if vertices.len() < 3 {
            return Err(EngineError::invalid(format!(
                "detection box needs at least 3 vertices, got {}",
                vertices.len()
            )));
        }
        if let Some(bad) = vertices
            .iter()
            .find(|vertex| !vertex.x.is_finite() || !vertex.y.is_finite())
        {
            return Err(EngineError::invalid(format!(
                "detection box has a non-finite vertex ({}, {})",
                bad.x, bad.y
            )));
        }
        Ok(Self {
            vertices,
            text: text.into(),
        })
    }

    /// Builds a four-corner box from a rectangle.
    pub fn from_rect(rect: Rect, text: impl Into<String>) -> Result<Self, EngineError> {
        Self::new(
            vec![
                Point::new(rect.x, rect.y),
                Point::new(rect.max_x(), rect.y),
                Point::new(rect.max_x(), rect.max_y()),
                Point::new(rect.x, rect.max_y()),
            ],
            text,
        )
    }

    pub fn vertices(&self) -> &[Point] {
        &self.vertices
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn x(&self) -> f32 {
        self.vertices.iter().map(|v| v.x).fold(f32::INFINITY, f32::min)
    }

    pub fn y(&self) -> f32 {
        self.vertices.iter().map(|v| v.y).fold(f32::INFINITY, f32::min)
    }

    pub fn max_x(&self) -> f32 {
        self.vertices
            .iter()
            .map(|v| v.x)
            .fold(f32::NEG_INFINITY, f32::max)
    }

    pub fn max_y(&self) -> f32 {
        self.vertices
            .iter()
            .map(|v| v.y)
            .fold(f32::NEG_INFINITY, f32::max)
    }

    pub fn width(&self) -> f32 {
        self.max_x() - self.x()
    }

    pub fn height(&self) -> f32 {
        self.max_y() - self.y()
    }

    pub fn center_x(&self) -> f32 {
        (self.x() + self.max_x()) / 2.0
    }

    pub fn center_y(&self) -> f32 {
        (self.y() + self.max_y()) / 2.0
    }

    pub fn center(&self) -> Point {
        Point::new(self.center_x(), self.center_y())
    }

    pub fn bounds(&self) -> Rect {
        Rect::from_extents(self.x(), self.y(), self.max_x(), self.max_y())
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum DetectionFile {
    Plain(Vec<RawDetectionBox>),
    Vision(VisionResponse),
}

#[derive(Deserialize)]
struct VisionResponse {
    #[serde(rename = "textAnnotations", default)]
    text_annotations: Vec<VisionAnnotation>,
}

#[derive(Deserialize)]
struct VisionAnnotation {
    #[serde(default)]
    description: String,
    #[serde(rename = "boundingPoly", default)]
    bounding_poly: VisionPoly,
}

#[derive(Deserialize, Default)]
struct VisionPoly {
    #[serde(default)]
    vertices: Vec<VisionVertex>,
}

// Vision omits coordinates that are zero.
#[derive(Deserialize)]
struct VisionVertex {
    #[serde(default)]
    x: f32,
    #[serde(default)]
    y: f32,
}

/// Reads detection output in either the plain `[{text, vertices}]` shape or
/// the Vision `textAnnotations` shape. For Vision input the leading
/// whole-image annotation is dropped.
pub fn parse_detections(json: &str) -> Result<Vec<DetectionBox>> {
    let file: DetectionFile =
        serde_json::from_str(json).with_context(|| "failed to parse detection JSON")?;
    match file {
        DetectionFile::Plain(raw) => raw
            .into_iter()
            .enumerate()
            .map(|(idx, raw)| {
                DetectionBox::new(raw.vertices, raw.text)
                    .with_context(|| format!("invalid detection at index {}", idx))
            })
            .collect(),
        DetectionFile::Vision(response) => response
            .text_annotations
            .into_iter()
            .enumerate()
            .skip(1)
            .map(|(idx, annotation)| {
                let vertices = annotation
                    .bounding_poly
                    .vertices
                    .into_iter()
                    .map(|v| Point::new(v.x, v.y))
                    .collect();
                DetectionBox::new(vertices, annotation.description)
                    .with_context(|| format!("invalid text annotation at index {}", idx))
            })
            .collect(),
    }
}

pub fn load_detections(path: &Path) -> Result<Vec<DetectionBox>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read detections: {}", path.display()))?;
    parse_detections(&content)
        .with_context(|| format!("failed to load detections: {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derived_bounds_follow_vertices() {
        let det = DetectionBox::new(
            vec![
                Point::new(12.0, 4.0),
                Point::new(30.0, 5.0),
                Point::new(29.0, 40.0),
                Point::new(10.0, 38.0),
            ],
            "あ",
        )
        .unwrap();
        assert_eq!(det.x(), 10.0);
        assert_eq!(det.y(), 4.0);
        assert_eq!(det.max_x(), 30.0);
        assert_eq!(det.max_y(), 40.0);
        assert_eq!(det.width(), 20.0);
        assert_eq!(det.height(), 36.0);
        assert_eq!(det.center(), Point::new(20.0, 22.0));
    }

    #[test]
    fn rejects_too_few_vertices() {
        let err = DetectionBox::new(vec![Point::new(0.0, 0.0), Point::new(1.0, 1.0)], "x")
            .unwrap_err();
        assert!(matches!(err, EngineError::InvalidInput(_)));
    }

    #[test]
    fn rejects_non_finite_vertex() {
        let err = DetectionBox::new(
            vec![
                Point::new(0.0, 0.0),
                Point::new(f32::NAN, 1.0),
                Point::new(1.0, 1.0),
            ],
            "x",
        )
        .unwrap_err();
        assert!(matches!(err, EngineError::InvalidInput(_)));
    }

    #[test]
    fn vision_response_drops_summary_and_defaults_missing_coords() {
        let json = r#"{
            "textAnnotations": [
                {"description": "こんにちは", "boundingPoly": {"vertices": [{"x": 0, "y": 0}, {"x": 100}, {"x": 100, "y": 100}, {"y": 100}]}},
                {"description": "こ", "boundingPoly": {"vertices": [{}, {"x": 10}, {"x": 10, "y": 12}, {"y": 12}]}},
                {"description": "ん", "boundingPoly": {"vertices": [{"x": 20, "y": 0}, {"x": 30}, {"x": 30, "y": 12}, {"x": 20, "y": 12}]}}
            ]
        }"#;
        let boxes = parse_detections(json).unwrap();
        assert_eq!(boxes.len(), 2);
        assert_eq!(boxes[0].text(), "こ");
        assert_eq!(boxes[0].bounds(), Rect::new(0.0, 0.0, 10.0, 12.0));
        assert_eq!(boxes[1].text(), "ん");
        assert_eq!(boxes[1].x(), 20.0);
    }

    #[test]
    fn plain_shape_round_trips_through_serde() {
        let det = DetectionBox::from_rect(Rect::new(1.0, 2.0, 3.0, 4.0), "字").unwrap();
        let json = serde_json::to_string(&vec![det.clone()]).unwrap();
        let parsed = parse_detections(&json).unwrap();
        assert_eq!(parsed, vec![det]);
    }

    #[test]
    fn plain_shape_reports_bad_index() {
        let json = r#"[
            {"text": "a", "vertices": [{"x": 0, "y": 0}, {"x": 1, "y": 0}, {"x": 1, "y": 1}]},
            {"text": "b", "vertices": [{"x": 0, "y": 0}]}
        ]"#;
        let err = parse_detections(json).unwrap_err();
        assert!(format!("{:#}", err).contains("index 1"));
    }

    #[test]
    fn empty_inputs_are_valid() {
        assert!(parse_detections("[]").unwrap().is_empty());
        assert!(parse_detections(r#"{"textAnnotations": []}"#).unwrap().is_empty());
        assert!(parse_detections("{}").unwrap().is_empty());
    }
}
