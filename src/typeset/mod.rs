mod font;
mod measure;
mod plan;
mod wrap;

use serde::Serialize;
use tracing::debug;

use crate::error::EngineError;
use crate::geom::Rect;

pub use font::{
    load_font_metrics, overlay_fallback_fonts, resolve_overlay_font, FontMetrics,
    ResolvedOverlayFont,
};
pub use measure::{EstimatedMeasure, TextMeasure};
pub use plan::{DrawLine, DrawPlan};

pub const DEFAULT_MIN_FONT_SIZE: f32 = 8.0;
/// Starting font size as a fraction of the rectangle height.
pub const DEFAULT_INITIAL_FONT_RATIO: f32 = 0.8;
/// Share of the rectangle width and height that text may occupy.
pub const DEFAULT_FILL_RATIO: f32 = 0.9;
pub const DEFAULT_LINE_HEIGHT_RATIO: f32 = 1.2;
pub const FONT_SIZE_STEP: f32 = 1.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TypesetConfig {
    min_font_size: f32,
    initial_font_ratio: f32,
    fill_ratio: f32,
    line_height_ratio: f32,
}

impl Default for TypesetConfig {
    fn default() -> Self {
        Self {
            min_font_size: DEFAULT_MIN_FONT_SIZE,
            initial_font_ratio: DEFAULT_INITIAL_FONT_RATIO,
            fill_ratio: DEFAULT_FILL_RATIO,
            line_height_ratio: DEFAULT_LINE_HEIGHT_RATIO,
        }
    }
}

impl TypesetConfig {
    pub fn new(
        min_font_size: f32,
        initial_font_ratio: f32,
        fill_ratio: f32,
        line_height_ratio: f32,
    ) -> Result<Self, EngineError> {
        if !(min_font_size.is_finite() && min_font_size > 0.0) {
            return Err(EngineError::invalid(format!(
                "min font size must be positive, got {}",
                min_font_size
            )));
        }
        if !(initial_font_ratio.is_finite() && initial_font_ratio > 0.0) {
            return Err(EngineError::invalid(format!(
                "initial font ratio must be positive, got {}",
                initial_font_ratio
            )));
        }
        if !(fill_ratio > 0.0 && fill_ratio <= 1.0) {
            return Err(EngineError::invalid(format!(
                "fill ratio must be in (0, 1], got {}",
                fill_ratio
            )));
        }
        if !(line_height_ratio.is_finite() && line_height_ratio > 0.0) {
            return Err(EngineError::invalid(format!(
                "line height ratio must be positive, got {}",
                line_height_ratio
            )));
        }
        Ok(Self {
            min_font_size,
            initial_font_ratio,
            fill_ratio,
            line_height_ratio,
        })
    }

    /// Same ratios with a different font-size floor.
    pub fn with_min_font_size(self, min_font_size: f32) -> Result<Self, EngineError> {
        Self::new(
            min_font_size,
            self.initial_font_ratio,
            self.fill_ratio,
            self.line_height_ratio,
        )
    }

    pub fn min_font_size(&self) -> f32 {
        self.min_font_size
    }

    pub fn initial_font_ratio(&self) -> f32 {
        self.initial_font_ratio
    }

    pub fn fill_ratio(&self) -> f32 {
        self.fill_ratio
    }

    pub fn line_height_ratio(&self) -> f32 {
        self.line_height_ratio
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Layout {
    pub font_size: f32,
    pub lines: Vec<String>,
}

/// Outcome of fitting a string into a rectangle.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "layout", rename_all = "snake_case")]
pub enum Typeset {
    /// Every line fits the allotted width and the block fits the allotted height.
    Fitted(Layout),
    /// No size above the floor fit; the whole string is one line at the floor
    /// size and may overflow.
    Degraded(Layout),
}

impl Typeset {
    pub fn layout(&self) -> &Layout {
        match self {
            Typeset::Fitted(layout) | Typeset::Degraded(layout) => layout,
        }
    }

    pub fn into_layout(self) -> Layout {
        match self {
            Typeset::Fitted(layout) | Typeset::Degraded(layout) => layout,
        }
    }

    pub fn is_degraded(&self) -> bool {
        matches!(self, Typeset::Degraded(_))
    }
}

/// Shrink-to-fit layout of `text` inside `rect`.
///
/// Starts at `rect.height * initial_font_ratio` and steps the font size down
/// by [`FONT_SIZE_STEP`] until the greedily wrapped lines fit both the
/// allotted width and height. Reaching the floor yields
/// [`Typeset::Degraded`] with the untouched string on a single line. Text
/// without any words yields a fitted layout with no lines.
pub fn typeset<M: TextMeasure + ?Sized>(
    rect: Rect,
    text: &str,
    measure: &M,
    config: &TypesetConfig,
) -> Result<Typeset, EngineError> {
    if !rect.is_positive() {
        return Err(EngineError::invalid(format!(
            "typeset rectangle must have positive size, got {}x{}",
            rect.width, rect.height
        )));
    }

    let initial_size = rect.height * config.initial_font_ratio;
    let words: Vec<&str> = text.split_whitespace().collect();
    if words.is_empty() {
        return Ok(Typeset::Fitted(Layout {
            font_size: initial_size.max(config.min_font_size),
            lines: Vec::new(),
        }));
    }

    let allotted_width = rect.width * config.fill_ratio;
    let allotted_height = rect.height * config.fill_ratio;
    // integer steps: past 2^24 an f32 font size no longer moves by one
    let steps = ((initial_size - config.min_font_size) / FONT_SIZE_STEP)
        .ceil()
        .max(0.0) as u64;
    let mut attempts = 0u64;

    for step in 0..steps {
        let font_size = initial_size - step as f32 * FONT_SIZE_STEP;
        attempts += 1;
        let lines = wrap::wrap_words(&words, font_size, allotted_width, measure);
        let block_height = lines.len() as f32 * font_size * config.line_height_ratio;
        let fits_width = lines
            .iter()
            .all(|line| measure.measure(line, font_size) <= allotted_width);
        if fits_width && block_height <= allotted_height {
            debug!(font_size, lines = lines.len(), attempts, "text fitted");
            return Ok(Typeset::Fitted(Layout { font_size, lines }));
        }
    }

    debug!(attempts, "text fell back to the font size floor");
    Ok(Typeset::Degraded(Layout {
        font_size: config.min_font_size,
        lines: vec![text.to_string()],
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn half_em(text: &str, size: f32) -> f32 {
        text.chars().count() as f32 * size / 2.0
    }

    #[test]
    fn single_line_steps_down_until_line_height_fits() {
        // start at 40, but one line needs 48 of the 45 allotted
        let rect = Rect::new(0.0, 0.0, 400.0, 50.0);
        let result = typeset(rect, "Hi", &half_em, &TypesetConfig::default()).unwrap();
        assert!(!result.is_degraded());
        let layout = result.layout();
        assert!((layout.font_size - 37.0).abs() < 1e-3);
        assert_eq!(layout.lines, vec!["Hi".to_string()]);
    }

    #[test]
    fn shrinks_until_height_fits() {
        // 100x30: allotted 90x27, start at 24
        let rect = Rect::new(0.0, 0.0, 100.0, 30.0);
        let result = typeset(rect, "aaaa bbbb cccc", &half_em, &TypesetConfig::default()).unwrap();
        let layout = result.layout();
        assert!(!result.is_degraded());
        let height = layout.lines.len() as f32 * layout.font_size * 1.2;
        assert!(height <= 27.0);
        assert!(layout
            .lines
            .iter()
            .all(|line| half_em(line, layout.font_size) <= 90.0));
    }

    #[test]
    fn whitespace_only_text_has_no_lines() {
        let rect = Rect::new(0.0, 0.0, 100.0, 30.0);
        let result = typeset(rect, "   ", &half_em, &TypesetConfig::default()).unwrap();
        assert!(!result.is_degraded());
        assert!(result.layout().lines.is_empty());
    }

    #[test]
    fn rejects_non_positive_rectangles() {
        let config = TypesetConfig::default();
        for rect in [
            Rect::new(0.0, 0.0, 0.0, 10.0),
            Rect::new(0.0, 0.0, 10.0, -1.0),
            Rect::new(0.0, 0.0, f32::INFINITY, 10.0),
        ] {
            let err = typeset(rect, "x", &half_em, &config).unwrap_err();
            assert!(matches!(err, EngineError::InvalidInput(_)));
        }
    }

    #[test]
    fn degraded_keeps_original_spacing() {
        let rect = Rect::new(0.0, 0.0, 20.0, 20.0);
        let text = "far  too   long for this";
        let result = typeset(rect, text, &half_em, &TypesetConfig::default()).unwrap();
        assert_eq!(
            result,
            Typeset::Degraded(Layout {
                font_size: 8.0,
                lines: vec![text.to_string()],
            })
        );
    }

    #[test]
    fn config_validation() {
        assert!(TypesetConfig::new(0.0, 0.8, 0.9, 1.2).is_err());
        assert!(TypesetConfig::new(8.0, 0.8, 1.5, 1.2).is_err());
        assert!(TypesetConfig::new(8.0, 0.8, f32::NAN, 1.2).is_err());
        assert!(TypesetConfig::new(8.0, -0.1, 0.9, 1.2).is_err());
        assert!(TypesetConfig::new(8.0, 0.8, 0.9, 0.0).is_err());
        let config = TypesetConfig::default().with_min_font_size(12.0).unwrap();
        assert_eq!(config.min_font_size(), 12.0);
        assert_eq!(config.fill_ratio(), DEFAULT_FILL_RATIO);
    }
}
