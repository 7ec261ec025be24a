/// Width of a string at a given font size, in the same units as the target
/// rectangle.
pub trait TextMeasure {
    fn measure(&self, text: &str, font_size: f32) -> f32;
}

impl<F> TextMeasure for F
where
    F: Fn(&str, f32) -> f32,
{
    fn measure(&self, text: &str, font_size: f32) -> f32 {
        self(text, font_size)
    }
}

/// Measures text with per-character em estimates when no font file is at hand.
#[derive(Debug, Clone, Copy, Default)]
pub struct EstimatedMeasure;

impl TextMeasure for EstimatedMeasure {
    fn measure(&self, text: &str, font_size: f32) -> f32 {
        estimate_text_width_units(text) * font_size
    }
}

pub(crate) fn estimate_text_width_units(text: &str) -> f32 {
    text.chars().map(estimate_char_units).sum()
}

fn estimate_char_units(ch: char) -> f32 {
    if ch.is_whitespace() {
        0.25
    } else if ch.is_ascii_alphanumeric() {
        0.55
    } else if ch.is_ascii() {
        0.35
    } else if is_cjk(ch) {
        1.0
    } else {
        0.9
    }
}

pub(crate) fn is_cjk(ch: char) -> bool {
    matches!(
        ch as u32,
        0x4E00..=0x9FFF | 0x3040..=0x30FF | 0x31F0..=0x31FF | 0x3400..=0x4DBF
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn closures_measure_directly() {
        let measure = |text: &str, size: f32| text.chars().count() as f32 * size;
        assert_eq!(measure.measure("abc", 10.0), 30.0);
    }

    #[test]
    fn estimate_scales_with_font_size() {
        let narrow = EstimatedMeasure.measure("ab", 10.0);
        assert!((narrow - 11.0).abs() < 1e-4);
        let wide = EstimatedMeasure.measure("日本", 10.0);
        assert!((wide - 20.0).abs() < 1e-4);
    }
}
