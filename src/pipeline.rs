use anyhow::{Context, Result};
use image::GenericImageView;
use serde::Serialize;
use tracing::{info, warn};

use crate::bubble::{reconstruct, sort_reading_rows, Bubble};
use crate::debug::BubbleDebugConfig;
use crate::detection::DetectionBox;
use crate::geom::Rect;
use crate::render::{self, OverlayStyle};
use crate::settings::Settings;
use crate::typeset::{typeset, DrawPlan, EstimatedMeasure, ResolvedOverlayFont, TextMeasure};

pub struct OverlayRequest<'a> {
    pub image_bytes: &'a [u8],
    pub image_mime: &'a str,
    pub output_mime: &'a str,
    pub detections: &'a [DetectionBox],
    /// One replacement per bubble in reading-row order. `None` redraws each
    /// bubble's own text; a missing entry clears the bubble.
    pub translations: Option<&'a [String]>,
    pub debug: Option<BubbleDebugConfig>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BubbleReport {
    pub index: usize,
    pub rect: Rect,
    pub source: String,
    pub translated: String,
    pub font_size: f32,
    pub degraded: bool,
}

pub struct OverlayOutput {
    pub image: Vec<u8>,
    pub bubbles: Vec<BubbleReport>,
}

/// Reconstructs bubbles and orders them top-to-bottom for presentation.
pub fn reading_order_bubbles(detections: &[DetectionBox], settings: &Settings) -> Vec<Bubble> {
    let mut bubbles = reconstruct(detections, &settings.reconstruct);
    sort_reading_rows(&mut bubbles);
    bubbles
}

/// Replaces the text of every bubble in one image.
pub fn overlay_image(
    request: OverlayRequest<'_>,
    settings: &Settings,
    font: Option<&ResolvedOverlayFont>,
) -> Result<OverlayOutput> {
    let image = image::load_from_memory(request.image_bytes)
        .with_context(|| "failed to decode image for overlay")?;
    let (width, height) = image.dimensions();

    let bubbles = reading_order_bubbles(request.detections, settings);
    info!(
        detections = request.detections.len(),
        bubbles = bubbles.len(),
        "reconstructed bubbles"
    );

    if let Some(debug) = request.debug.as_ref() {
        write_debug_overlay(debug, &request, width, height, &bubbles)?;
    }

    let measure: &dyn TextMeasure = match font {
        Some(resolved) => &resolved.metrics,
        None => &EstimatedMeasure,
    };

    let mut plans = Vec::with_capacity(bubbles.len());
    let mut reports = Vec::with_capacity(bubbles.len());
    for (index, bubble) in bubbles.iter().enumerate() {
        let translated = match request.translations {
            Some(list) => list.get(index).cloned().unwrap_or_default(),
            None => bubble.text().to_string(),
        };
        let rect = bubble.rect();
        if !rect.is_positive() {
            warn!(index, "skipping bubble with an empty rectangle");
            continue;
        }
        let result = typeset(rect, &translated, measure, &settings.typeset)
            .with_context(|| format!("failed to typeset bubble {}", index))?;
        if result.is_degraded() {
            warn!(index, "bubble text did not fit; drawing at the minimum font size");
        }
        plans.push(DrawPlan::new(rect, result.layout(), &settings.typeset));
        reports.push(BubbleReport {
            index,
            rect,
            source: bubble.text().to_string(),
            translated,
            font_size: result.layout().font_size,
            degraded: result.is_degraded(),
        });
    }

    let style = overlay_style(settings, font.map(|resolved| resolved.family.as_str()));
    let svg = render::render_overlay_svg(
        request.image_bytes,
        request.image_mime,
        width,
        height,
        &plans,
        &style,
    );
    let font_data = font.map(|resolved| resolved.metrics.data());
    let image = render::render_svg_bytes(&svg, request.output_mime, font_data)?;
    info!(bubbles = reports.len(), "rendered overlay");

    Ok(OverlayOutput {
        image,
        bubbles: reports,
    })
}

/// Colours come from settings; a configured family beats the resolved font's.
fn overlay_style(settings: &Settings, resolved_family: Option<&str>) -> OverlayStyle {
    OverlayStyle {
        text_color: settings.overlay_text_color.clone(),
        fill_color: settings.overlay_fill_color.clone(),
        stroke_color: settings.overlay_stroke_color.clone(),
        font_family: settings
            .overlay_font_family
            .clone()
            .or_else(|| resolved_family.map(str::to_string)),
    }
}

fn write_debug_overlay(
    debug: &BubbleDebugConfig,
    request: &OverlayRequest<'_>,
    width: u32,
    height: u32,
    bubbles: &[Bubble],
) -> Result<()> {
    let svg = render::render_bubble_svg(
        request.image_bytes,
        request.image_mime,
        width,
        height,
        bubbles,
    );
    let bytes = render::render_svg_bytes(&svg, "image/png", None)?;
    let image_path = debug.image_path();
    std::fs::write(&image_path, bytes).with_context(|| {
        format!("failed to write bubble debug image: {}", image_path.display())
    })?;
    let json_path = debug.json_path();
    let json = serde_json::to_vec_pretty(bubbles)?;
    std::fs::write(&json_path, json)
        .with_context(|| format!("failed to write bubble debug json: {}", json_path.display()))?;
    info!(path = %image_path.display(), "wrote bubble debug overlay");
    Ok(())
}

/// Maps a decoded image format to the mime type used for embedding.
pub fn image_mime_for(bytes: &[u8]) -> Result<&'static str> {
    let format = image::guess_format(bytes).with_context(|| "unrecognised image format")?;
    Ok(format.to_mime_type())
}
