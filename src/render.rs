use anyhow::{anyhow, Context, Result};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use resvg::render;
use std::fmt::Write as _;
use std::io::Cursor;
use std::sync::Arc;
use tiny_skia::Pixmap;
use usvg::{fontdb, Options, Tree};

use crate::bubble::Bubble;
use crate::typeset::DrawPlan;

#[derive(Debug, Clone)]
pub struct OverlayStyle {
    pub text_color: String,
    pub fill_color: String,
    pub stroke_color: Option<String>,
    pub font_family: Option<String>,
}

const COLUMN_COLORS: &[&str] = &["#00c853", "#2962ff", "#ff6d00", "#d500f9", "#00b8d4"];

fn svg_open(svg: &mut String, image_bytes: &[u8], image_mime: &str, width: u32, height: u32) {
    let encoded = BASE64.encode(image_bytes);
    let data_uri = format!("data:{};base64,{}", image_mime, encoded);
    let _ = write!(
        svg,
        r#"<svg xmlns="http://www.w3.org/2000/svg" xmlns:xlink="http://www.w3.org/1999/xlink" width="{w}" height="{h}" viewBox="0 0 {w} {h}">"#,
        w = width,
        h = height
    );
    let _ = write!(
        svg,
        r#"<image href="{uri}" xlink:href="{uri}" x="0" y="0" width="{w}" height="{h}" preserveAspectRatio="none"/>"#,
        uri = data_uri,
        w = width,
        h = height
    );
}

/// Composes the source image with the translated bubbles. Each bubble's
/// rectangle is filled before its lines are drawn.
pub fn render_overlay_svg(
    image_bytes: &[u8],
    image_mime: &str,
    width: u32,
    height: u32,
    plans: &[DrawPlan],
    style: &OverlayStyle,
) -> String {
    let mut svg = String::new();
    svg_open(&mut svg, image_bytes, image_mime, width, height);

    for plan in plans {
        let stroke = match style.stroke_color.as_deref() {
            Some(color) => format!(r#" stroke="{}" stroke-width="2""#, escape_xml(color)),
            None => String::new(),
        };
        let _ = write!(
            svg,
            r#"<rect x="{x}" y="{y}" width="{w}" height="{h}" fill="{fill}"{stroke}/>"#,
            x = plan.clear.x,
            y = plan.clear.y,
            w = plan.clear.width,
            h = plan.clear.height,
            fill = escape_xml(&style.fill_color),
            stroke = stroke
        );
        let family = style
            .font_family
            .as_deref()
            .map(|family| format!(r#" font-family="{}""#, escape_xml(family)))
            .unwrap_or_default();
        for line in &plan.lines {
            let _ = write!(
                svg,
                r#"<text x="{x}" y="{y}" font-size="{size}" fill="{color}" text-anchor="middle" dominant-baseline="central"{family}>{text}</text>"#,
                x = line.x,
                y = line.y,
                size = plan.font_size,
                color = escape_xml(&style.text_color),
                family = family,
                text = escape_xml(&line.text)
            );
        }
    }

    svg.push_str("</svg>");
    svg
}

/// Outlines each bubble and the member boxes of each of its columns, labelled
/// with the column's reading position.
pub fn render_bubble_svg(
    image_bytes: &[u8],
    image_mime: &str,
    width: u32,
    height: u32,
    bubbles: &[Bubble],
) -> String {
    let mut svg = String::new();
    svg_open(&mut svg, image_bytes, image_mime, width, height);

    for (bubble_idx, bubble) in bubbles.iter().enumerate() {
        let rect = bubble.rect();
        let _ = write!(
            svg,
            r##"<rect x="{x}" y="{y}" width="{w}" height="{h}" fill="none" stroke="#d50000" stroke-width="2"/>"##,
            x = rect.x,
            y = rect.y,
            w = rect.width,
            h = rect.height
        );
        let _ = write!(
            svg,
            r##"<text x="{x}" y="{y}" font-size="14" fill="#d50000">{idx}</text>"##,
            x = rect.x,
            y = (rect.y - 4.0).max(12.0),
            idx = bubble_idx
        );
        for (column_idx, column) in bubble.columns().iter().enumerate() {
            let color = COLUMN_COLORS[column_idx % COLUMN_COLORS.len()];
            for member in column {
                let bounds = member.bounds();
                let _ = write!(
                    svg,
                    r#"<rect x="{x}" y="{y}" width="{w}" height="{h}" fill="none" stroke="{color}" stroke-width="1"/>"#,
                    x = bounds.x,
                    y = bounds.y,
                    w = bounds.width,
                    h = bounds.height,
                    color = color
                );
            }
            if let Some(first) = column.first() {
                let _ = write!(
                    svg,
                    r#"<text x="{x}" y="{y}" font-size="10" fill="{color}">{idx}</text>"#,
                    x = first.max_x() + 2.0,
                    y = first.y() + 10.0,
                    color = color,
                    idx = column_idx
                );
            }
        }
    }

    svg.push_str("</svg>");
    svg
}

pub fn render_svg_bytes(svg: &str, output_mime: &str, font_data: Option<&[u8]>) -> Result<Vec<u8>> {
    let format = image_format_from_mime(output_mime)
        .ok_or_else(|| anyhow!("unsupported output image mime '{}'", output_mime))?;
    let mut db = fontdb::Database::new();
    db.load_system_fonts();
    if let Some(data) = font_data {
        db.load_font_data(data.to_vec());
    }
    let options = Options {
        fontdb: Arc::new(db),
        ..Options::default()
    };
    let tree = Tree::from_str(svg, &options).with_context(|| "failed to parse SVG")?;
    let size = tree.size().to_int_size();
    let mut pixmap =
        Pixmap::new(size.width(), size.height()).ok_or_else(|| anyhow!("empty SVG size"))?;
    let mut pixmap_mut = pixmap.as_mut();
    render(&tree, tiny_skia::Transform::identity(), &mut pixmap_mut);
    let image = image::RgbaImage::from_raw(size.width(), size.height(), pixmap.data().to_vec())
        .ok_or_else(|| anyhow!("failed to build image buffer from SVG"))?;
    let mut bytes = Vec::new();
    let mut cursor = Cursor::new(&mut bytes);
    let output = if format == image::ImageFormat::Jpeg {
        image::DynamicImage::ImageRgb8(image::DynamicImage::ImageRgba8(image).to_rgb8())
    } else {
        image::DynamicImage::ImageRgba8(image)
    };
    output
        .write_to(&mut cursor, format)
        .with_context(|| "failed to encode image from SVG")?;
    Ok(bytes)
}

pub fn image_format_from_mime(mime: &str) -> Option<image::ImageFormat> {
    match mime {
        "image/png" => Some(image::ImageFormat::Png),
        "image/jpeg" => Some(image::ImageFormat::Jpeg),
        "image/jpg" => Some(image::ImageFormat::Jpeg),
        "image/gif" => Some(image::ImageFormat::Gif),
        "image/webp" => Some(image::ImageFormat::WebP),
        "image/bmp" => Some(image::ImageFormat::Bmp),
        "image/tiff" => Some(image::ImageFormat::Tiff),
        _ => None,
    }
}

fn escape_xml(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}
