use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

/// Where diagnostic bubble overlays are written.
#[derive(Debug, Clone)]
pub struct BubbleDebugConfig {
    output_dir: PathBuf,
    base_name: String,
}

impl BubbleDebugConfig {
    /// Places debug files next to `output`, named after its file stem.
    pub fn beside(output: &Path) -> Result<Self> {
        let dir = output
            .parent()
            .filter(|dir| !dir.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        let base = output
            .file_stem()
            .and_then(|value| value.to_str())
            .unwrap_or("output");
        std::fs::create_dir_all(dir)
            .with_context(|| format!("failed to create debug dir: {}", dir.display()))?;
        Ok(Self {
            output_dir: dir.to_path_buf(),
            base_name: sanitize_filename_component(base),
        })
    }

    pub fn image_path(&self) -> PathBuf {
        self.output_dir
            .join(format!("{}_bubbles.png", self.base_name))
    }

    pub fn json_path(&self) -> PathBuf {
        self.output_dir
            .join(format!("{}_bubbles.json", self.base_name))
    }
}

fn sanitize_filename_component(value: &str) -> String {
    let mut out = String::new();
    for ch in value.chars() {
        if ch.is_ascii_alphanumeric() || ch == '-' || ch == '_' {
            out.push(ch);
        } else if ch.is_whitespace() {
            out.push('_');
        }
    }
    if out.is_empty() {
        "output".to_string()
    } else {
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paths_sit_next_to_output() {
        let dir = tempfile::tempdir().unwrap();
        let config = BubbleDebugConfig::beside(&dir.path().join("page 01.png")).unwrap();
        assert_eq!(config.image_path(), dir.path().join("page_01_bubbles.png"));
        assert_eq!(config.json_path(), dir.path().join("page_01_bubbles.json"));
    }

    #[test]
    fn unusable_stem_falls_back() {
        assert_eq!(sanitize_filename_component("ページ"), "output");
    }
}
