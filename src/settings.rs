use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::bubble::ReconstructConfig;
use crate::typeset::TypesetConfig;

const DEFAULT_SETTINGS_TOML: &str = include_str!("../settings.toml");

#[derive(Debug, Clone)]
pub struct Settings {
    pub reconstruct: ReconstructConfig,
    pub typeset: TypesetConfig,
    pub overlay_text_color: String,
    pub overlay_fill_color: String,
    pub overlay_stroke_color: Option<String>,
    pub overlay_font_family: Option<String>,
    pub overlay_font_path: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            reconstruct: ReconstructConfig::default(),
            typeset: TypesetConfig::default(),
            overlay_text_color: "#000000".to_string(),
            overlay_fill_color: "#ffffff".to_string(),
            overlay_stroke_color: None,
            overlay_font_family: None,
            overlay_font_path: None,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct SettingsFile {
    bubble: Option<BubbleSettings>,
    typeset: Option<TypesetSettings>,
    overlay: Option<OverlaySettings>,
}

#[derive(Debug, Default, Deserialize)]
struct BubbleSettings {
    window_scale: Option<f32>,
    column_threshold_ratio: Option<f32>,
}

#[derive(Debug, Default, Deserialize)]
struct TypesetSettings {
    min_font_size: Option<f32>,
    initial_font_ratio: Option<f32>,
    fill_ratio: Option<f32>,
    line_height_ratio: Option<f32>,
}

#[derive(Debug, Default, Deserialize)]
struct OverlaySettings {
    text_color: Option<String>,
    fill_color: Option<String>,
    stroke_color: Option<String>,
    font_family: Option<String>,
    font_path: Option<String>,
}

/// Loads settings layered from the working directory, the home settings
/// directory and an optional extra file, later files winning.
pub fn load_settings(extra_path: Option<&Path>) -> Result<Settings> {
    load_settings_in(home_dir().as_deref(), extra_path)
}

pub fn load_settings_in(home: Option<&Path>, extra_path: Option<&Path>) -> Result<Settings> {
    let mut settings = Settings::default();
    if let Some(home) = home {
        ensure_home_settings_file(home)?;
    }

    let mut ordered_paths = vec![
        PathBuf::from("settings.toml"),
        PathBuf::from("settings.local.toml"),
    ];
    if let Some(home) = home {
        ordered_paths.push(home.join("settings.toml"));
        ordered_paths.push(home.join("settings.local.toml"));
    }
    if let Some(extra) = extra_path {
        if !extra.exists() {
            return Err(anyhow!("settings file not found: {}", extra.display()));
        }
        ordered_paths.push(extra.to_path_buf());
    }

    for path in ordered_paths {
        if path.exists() {
            let content = fs::read_to_string(&path)
                .with_context(|| format!("failed to read settings: {}", path.display()))?;
            let parsed: SettingsFile = toml::from_str(&content)
                .with_context(|| format!("failed to parse settings: {}", path.display()))?;
            settings
                .merge(parsed)
                .with_context(|| format!("invalid settings: {}", path.display()))?;
        }
    }

    Ok(settings)
}

impl Settings {
    fn merge(&mut self, incoming: SettingsFile) -> Result<()> {
        if let Some(bubble) = incoming.bubble {
            let window_scale = bubble
                .window_scale
                .filter(|value| *value >= 0.0)
                .unwrap_or(self.reconstruct.window_scale());
            let ratio = bubble
                .column_threshold_ratio
                .filter(|value| *value >= 0.0)
                .unwrap_or(self.reconstruct.column_threshold_ratio());
            self.reconstruct = ReconstructConfig::new(window_scale, ratio)?;
        }
        if let Some(typeset) = incoming.typeset {
            let current = self.typeset;
            self.typeset = TypesetConfig::new(
                positive_or(typeset.min_font_size, current.min_font_size()),
                positive_or(typeset.initial_font_ratio, current.initial_font_ratio()),
                positive_or(typeset.fill_ratio, current.fill_ratio()),
                positive_or(typeset.line_height_ratio, current.line_height_ratio()),
            )?;
        }
        if let Some(overlay) = incoming.overlay {
            if let Some(color) = non_blank(overlay.text_color) {
                self.overlay_text_color = color;
            }
            if let Some(color) = non_blank(overlay.fill_color) {
                self.overlay_fill_color = color;
            }
            if let Some(color) = non_blank(overlay.stroke_color) {
                self.overlay_stroke_color = Some(color);
            }
            if let Some(family) = non_blank(overlay.font_family) {
                self.overlay_font_family = Some(family);
            }
            if let Some(path) = non_blank(overlay.font_path) {
                self.overlay_font_path = Some(path);
            }
        }
        Ok(())
    }
}

fn positive_or(value: Option<f32>, current: f32) -> f32 {
    value.filter(|value| *value > 0.0).unwrap_or(current)
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|value| !value.trim().is_empty())
}

fn ensure_home_settings_file(home: &Path) -> Result<()> {
    fs::create_dir_all(home)
        .with_context(|| format!("failed to create settings directory: {}", home.display()))?;
    let path = home.join("settings.toml");
    if !path.exists() {
        fs::write(&path, DEFAULT_SETTINGS_TOML)
            .with_context(|| format!("failed to write settings: {}", path.display()))?;
    }
    Ok(())
}

fn home_dir() -> Option<PathBuf> {
    std::env::var("HOME").ok().and_then(|home| {
        let home = home.trim();
        if home.is_empty() {
            None
        } else {
            Some(Path::new(home).join(".manga-typeset"))
        }
    })
}
