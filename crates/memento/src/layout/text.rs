//! Text shaping for fixed-width receipt lines.
//!
//! Widths are printed columns as reported by `unicode-width`: most characters
//! take one column, CJK and other wide characters take two. Only whitespace
//! separates words: punctuation stays inside the word it touches, so `don't`
//! is one word.

use unicode_width::UnicodeWidthStr;

/// Number of printed columns `text` occupies.
pub fn display_width(text: &str) -> usize {
    UnicodeWidthStr::width(text)
}

/// Capitalize the first letter of every whitespace-separated word and
/// lowercase the rest. Runs of whitespace collapse to a single space.
///
/// ```
/// use memento::layout::title_case;
///
/// assert_eq!(title_case("do the dishes"), "Do The Dishes");
/// assert_eq!(title_case("don't FORGET"), "Don't Forget");
/// ```
pub fn title_case(text: &str) -> String {
    text.split_whitespace()
        .map(capitalize)
        .collect::<Vec<_>>()
        .join(" ")
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect(),
        None => String::new(),
    }
}

/// Greedy word wrap at `width` columns.
///
/// Lines break only between words and never hyphenate. A word longer than
/// `width` is placed on its own line unsplit, overflowing the width.
pub fn wrap(text: &str, width: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    for word in text.split_whitespace() {
        let word_len = display_width(word);
        if current.is_empty() {
            current.push_str(word);
            current_len = word_len;
        } else if current_len + 1 + word_len <= width {
            current.push(' ');
            current.push_str(word);
            current_len += 1 + word_len;
        } else {
            lines.push(std::mem::take(&mut current));
            current.push_str(word);
            current_len = word_len;
        }
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

/// Pad `line` with spaces to `width`, centered.
///
/// When the padding is odd the extra space goes right, except when both the
/// padding and the width are odd, where it goes left. Lines at or over the
/// width come back unchanged.
pub fn center(line: &str, width: usize) -> String {
    let len = display_width(line);
    if len >= width {
        return line.to_string();
    }
    let margin = width - len;
    let left = margin / 2 + (margin & width & 1);
    let right = margin - left;
    format!("{}{line}{}", " ".repeat(left), " ".repeat(right))
}

/// Trimmed, case-insensitive equality.
pub fn same_text(a: &str, b: &str) -> bool {
    a.trim().to_lowercase() == b.trim().to_lowercase()
}
