use super::measure::TextMeasure;

/// Greedy word wrap at a fixed font size.
///
/// A word is appended to the current line unless the result would be wider
/// than `max_width`, in which case the current line is committed and the
/// word starts the next one. A single word wider than `max_width` still
/// gets its own line; callers check line widths afterwards.
pub(super) fn wrap_words<M: TextMeasure + ?Sized>(
    words: &[&str],
    font_size: f32,
    max_width: f32,
    measure: &M,
) -> Vec<String> {
    let mut lines = Vec::new();
    let Some((first, rest)) = words.split_first() else {
        return lines;
    };
    let mut current = (*first).to_string();

    for word in rest {
        let candidate = format!("{} {}", current, word);
        if measure.measure(&candidate, font_size) > max_width && !current.is_empty() {
            lines.push(std::mem::replace(&mut current, (*word).to_string()));
        } else {
            current = candidate;
        }
    }
    lines.push(current);
    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    fn per_char(text: &str, size: f32) -> f32 {
        text.chars().count() as f32 * size
    }

    #[test]
    fn breaks_before_overflowing_word() {
        let lines = wrap_words(&["aa", "bb", "cc"], 1.0, 5.0, &per_char);
        assert_eq!(lines, vec!["aa bb", "cc"]);
    }

    #[test]
    fn oversized_word_keeps_its_own_line() {
        let lines = wrap_words(&["a", "loooooong", "b"], 1.0, 4.0, &per_char);
        assert_eq!(lines, vec!["a", "loooooong", "b"]);
    }

    #[test]
    fn everything_fits_on_one_line() {
        let lines = wrap_words(&["one", "two"], 1.0, 100.0, &per_char);
        assert_eq!(lines, vec!["one two"]);
    }

    #[test]
    fn no_words_no_lines() {
        assert!(wrap_words(&[], 1.0, 10.0, &per_char).is_empty());
    }
}
