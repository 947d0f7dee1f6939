//! Shared string helpers

use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

/// Truncate to at most `max_bytes`, backing off to a UTF-8 boundary.
pub fn truncate_utf8_safe(s: &str, max_bytes: usize) -> &str {
    if s.len() <= max_bytes {
        return s;
    }
    let mut end = max_bytes;
    while end > 0 && !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

/// Fit `s` into `width` terminal cells, marking cut text with `…`.
///
/// Width is measured in display cells so CJK and emoji in column names or
/// preview values don't break table alignment.
pub fn fit_width(s: &str, width: usize) -> String {
    if s.width() <= width {
        return s.to_string();
    }
    if width == 0 {
        return String::new();
    }

    // Reserve one cell for the ellipsis
    let budget = width - 1;
    let mut used = 0;
    let mut out = String::new();
    for c in s.chars() {
        let w = c.width().unwrap_or(0);
        if used + w > budget {
            break;
        }
        used += w;
        out.push(c);
    }
    out.push('…');
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_respects_char_boundaries() {
        assert_eq!(truncate_utf8_safe("hello world", 5), "hello");
        assert_eq!(truncate_utf8_safe("日本語", 4), "日");
        assert_eq!(truncate_utf8_safe("short", 10), "short");
    }

    #[test]
    fn test_fit_width_short_strings_unchanged() {
        assert_eq!(fit_width("Age", 10), "Age");
        assert_eq!(fit_width("", 3), "");
    }

    #[test]
    fn test_fit_width_adds_ellipsis() {
        assert_eq!(fit_width("PassengerId", 6), "Passe…");
        assert_eq!(fit_width("abc", 0), "");
    }

    #[test]
    fn test_fit_width_counts_wide_chars() {
        // Each CJK char is two cells wide
        let fitted = fit_width("日本語データ", 7);
        assert_eq!(fitted, "日本語…");
        assert!(fitted.width() <= 7);
    }
}
