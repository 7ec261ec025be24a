//! Speech-bubble reconstruction and translated-text typesetting for manga
//! pages.
//!
//! [`bubble::reconstruct`] groups raw OCR boxes into bubbles and recovers
//! vertical right-to-left reading order; [`typeset::typeset`] fits a
//! replacement string into a bubble's rectangle. Both are pure functions of
//! their inputs. [`pipeline`] and [`render`] wire them to images.

use anyhow::{Context, Result};
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

pub mod bubble;
pub mod debug;
pub mod detection;
pub mod error;
pub mod geom;
pub mod logging;
pub mod pipeline;
pub mod render;
pub mod settings;
pub mod typeset;

pub use bubble::{reconstruct, sort_reading_rows, Bubble, ReconstructConfig};
pub use detection::{load_detections, parse_detections, DetectionBox};
pub use error::EngineError;
pub use geom::{Point, Rect};
pub use typeset::{typeset, DrawPlan, Layout, TextMeasure, Typeset, TypesetConfig};

#[derive(Debug, Clone)]
pub struct Config {
    pub settings_path: Option<String>,
    pub command: Command,
}

#[derive(Debug, Clone)]
pub enum Command {
    Bubbles {
        detections: PathBuf,
        json: bool,
    },
    Overlay {
        image: PathBuf,
        detections: PathBuf,
        translations: Option<PathBuf>,
        output: PathBuf,
        output_mime: Option<String>,
        debug_bubbles: bool,
    },
}

pub fn run(config: Config) -> Result<String> {
    let settings_path = config.settings_path.as_deref().map(Path::new);
    let settings = settings::load_settings(settings_path)?;

    match config.command {
        Command::Bubbles { detections, json } => {
            let boxes = load_detections(&detections)?;
            let bubbles = pipeline::reading_order_bubbles(&boxes, &settings);
            if json {
                serde_json::to_string_pretty(&bubbles).with_context(|| "failed to encode bubbles")
            } else {
                Ok(format_bubble_listing(&bubbles))
            }
        }
        Command::Overlay {
            image,
            detections,
            translations,
            output,
            output_mime,
            debug_bubbles,
        } => {
            let image_bytes = std::fs::read(&image)
                .with_context(|| format!("failed to read image: {}", image.display()))?;
            let image_mime = pipeline::image_mime_for(&image_bytes)?;
            let output_mime = resolve_output_mime(output_mime.as_deref(), &output);
            let boxes = load_detections(&detections)?;
            let translations = translations
                .as_deref()
                .map(load_translations)
                .transpose()?;
            let debug = if debug_bubbles {
                Some(debug::BubbleDebugConfig::beside(&output)?)
            } else {
                None
            };
            let font = resolve_font(&settings);

            let request = pipeline::OverlayRequest {
                image_bytes: &image_bytes,
                image_mime,
                output_mime: &output_mime,
                detections: &boxes,
                translations: translations.as_deref(),
                debug,
            };
            let result = pipeline::overlay_image(request, &settings, font.as_ref())?;
            std::fs::write(&output, &result.image)
                .with_context(|| format!("failed to write output: {}", output.display()))?;

            let degraded = result.bubbles.iter().filter(|b| b.degraded).count();
            Ok(format!(
                "wrote {} ({} bubbles, {} at minimum font size)",
                output.display(),
                result.bubbles.len(),
                degraded
            ))
        }
    }
}

/// Reads a JSON array of replacement strings, one per bubble.
pub fn load_translations(path: &Path) -> Result<Vec<String>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read translations: {}", path.display()))?;
    let values: Vec<Option<String>> = serde_json::from_str(&content)
        .with_context(|| format!("failed to parse translations: {}", path.display()))?;
    Ok(values.into_iter().map(Option::unwrap_or_default).collect())
}

fn resolve_output_mime(explicit: Option<&str>, output: &Path) -> String {
    if let Some(mime) = explicit.map(str::trim).filter(|mime| !mime.is_empty()) {
        return mime.to_string();
    }
    image::ImageFormat::from_path(output)
        .map(|format| format.to_mime_type().to_string())
        .unwrap_or_else(|_| "image/png".to_string())
}

fn resolve_font(settings: &settings::Settings) -> Option<typeset::ResolvedOverlayFont> {
    let font_path = settings.overlay_font_path.as_deref().map(Path::new);
    match typeset::resolve_overlay_font(
        font_path,
        settings.overlay_font_family.as_deref(),
        typeset::overlay_fallback_fonts(),
    ) {
        Ok(resolved) => {
            info!(family = %resolved.family, "resolved overlay font");
            Some(resolved)
        }
        Err(err) => {
            warn!("no overlay font available, estimating text widths: {:#}", err);
            None
        }
    }
}

fn format_bubble_listing(bubbles: &[Bubble]) -> String {
    let mut out = String::new();
    for (idx, bubble) in bubbles.iter().enumerate() {
        let rect = bubble.rect();
        let _ = writeln!(
            out,
            "{}\t{},{} {}x{}\t{} columns\t{}",
            idx,
            rect.x,
            rect.y,
            rect.width,
            rect.height,
            bubble.columns().len(),
            bubble.text()
        );
    }
    if out.is_empty() {
        return "no bubbles".to_string();
    }
    out.truncate(out.trim_end().len());
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn output_mime_prefers_explicit_then_extension() {
        assert_eq!(
            resolve_output_mime(Some("image/webp"), Path::new("a.png")),
            "image/webp"
        );
        assert_eq!(resolve_output_mime(None, Path::new("a.jpg")), "image/jpeg");
        assert_eq!(resolve_output_mime(None, Path::new("a")), "image/png");
    }

    #[test]
    fn translations_accept_nulls() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("t.json");
        std::fs::write(&path, r#"["Hello", null, "Bye"]"#).unwrap();
        let list = load_translations(&path).unwrap();
        assert_eq!(list, vec!["Hello", "", "Bye"]);
    }

    #[test]
    fn listing_shows_index_rect_and_text() {
        let boxes = vec![DetectionBox::from_rect(Rect::new(1.0, 2.0, 3.0, 4.0), "字").unwrap()];
        let bubbles = reconstruct(&boxes, &ReconstructConfig::default());
        assert_eq!(format_bubble_listing(&bubbles), "0\t1,2 3x4\t1 columns\t字");
        assert_eq!(format_bubble_listing(&[]), "no bubbles");
    }
}
