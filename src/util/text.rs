use std::borrow::Cow;

use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

/// Terminal columns a string occupies (CJK and emoji count as two).
pub fn display_width(s: &str) -> usize {
    UnicodeWidthStr::width(s)
}

const ELLIPSIS: &str = "...";

/// Cut `s` so it fits in `max_width` columns, ending with `...` when cut.
///
/// Widths of three columns or fewer have no room for the ellipsis, so the
/// result is just the leading characters that fit.
///
/// ```
/// use newsdigest::util::truncate_to_width;
///
/// assert_eq!(truncate_to_width("Short", 10), "Short");
/// assert_eq!(truncate_to_width("Hello World", 8), "Hello...");
/// assert_eq!(truncate_to_width("Test", 2), "Te");
/// ```
pub fn truncate_to_width(s: &str, max_width: usize) -> Cow<'_, str> {
    if display_width(s) <= max_width {
        return Cow::Borrowed(s);
    }
    if max_width <= ELLIPSIS.len() {
        return Cow::Owned(take_columns(s, max_width).to_string());
    }
    let head = take_columns(s, max_width - ELLIPSIS.len());
    Cow::Owned(format!("{head}{ELLIPSIS}"))
}

/// Longest prefix of `s` that fits in `columns`.
fn take_columns(s: &str, columns: usize) -> &str {
    let mut used = 0;
    for (idx, c) in s.char_indices() {
        let w = UnicodeWidthChar::width(c).unwrap_or(0);
        if used + w > columns {
            return &s[..idx];
        }
        used += w;
    }
    s
}

/// Greedy word wrap to `width` columns.
///
/// Words longer than a whole line are split at the column limit. Empty
/// input yields no lines; a zero width is treated as one column.
pub fn wrap_to_width(s: &str, width: usize) -> Vec<String> {
    let width = width.max(1);
    let mut lines = Vec::new();
    let mut current = String::new();
    let mut used = 0;

    for word in s.split_whitespace() {
        let mut word = word;
        let mut w = display_width(word);

        if used > 0 && used + 1 + w > width {
            lines.push(std::mem::take(&mut current));
            used = 0;
        }

        // Only reached on an empty line
        while w > width {
            let head = match take_columns(word, width) {
                // A wide char on a one-column line
                "" => word.chars().next().map_or("", |c| &word[..c.len_utf8()]),
                head => head,
            };
            lines.push(head.to_string());
            word = &word[head.len()..];
            w = display_width(word);
        }

        if word.is_empty() {
            continue;
        }
        if used > 0 {
            current.push(' ');
            used += 1;
        }
        current.push_str(word);
        used += w;
    }

    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

/// Remove terminal escape sequences and control characters from untrusted
/// text before it reaches the terminal. Tabs and newlines survive.
///
/// Handles CSI (`ESC [ ... final`) and OSC (`ESC ] ... BEL` or `ESC \`)
/// sequences; any other ESC is dropped along with the byte after it.
pub fn strip_control_chars(s: &str) -> Cow<'_, str> {
    let is_stripped = |c: char| c == '\u{7f}' || (c.is_ascii_control() && !matches!(c, '\t' | '\n' | '\r'));
    if !s.chars().any(is_stripped) {
        return Cow::Borrowed(s);
    }

    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '\u{1b}' {
            if !is_stripped(c) {
                out.push(c);
            }
            continue;
        }
        match chars.next() {
            Some('[') => {
                // Parameters and intermediates, then one final byte in @..~
                for c in chars.by_ref() {
                    if ('\u{40}'..='\u{7e}').contains(&c) {
                        break;
                    }
                }
            }
            Some(']') => {
                while let Some(c) = chars.next() {
                    if c == '\u{07}' {
                        break;
                    }
                    if c == '\u{1b}' && chars.peek() == Some(&'\\') {
                        chars.next();
                        break;
                    }
                }
            }
            _ => {}
        }
    }
    Cow::Owned(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ascii_truncation() {
        assert_eq!(truncate_to_width("Hello World", 8), "Hello...");
        assert_eq!(truncate_to_width("Hello", 5), "Hello");
    }

    #[test]
    fn test_cjk_truncation() {
        // Each character is two columns wide
        assert_eq!(truncate_to_width("你好世界", 7), "你好...");
        assert_eq!(display_width("你好"), 4);
    }

    #[test]
    fn test_narrow_widths() {
        assert_eq!(truncate_to_width("Test", 0), "");
        assert_eq!(truncate_to_width("Test", 1), "T");
        assert_eq!(truncate_to_width("Test", 3), "Tes");
    }

    #[test]
    fn test_fits_returns_borrowed() {
        assert!(matches!(truncate_to_width("Fits", 10), Cow::Borrowed(_)));
    }

    #[test]
    fn test_wrap_breaks_on_words() {
        assert_eq!(
            wrap_to_width("the quick brown fox jumps", 10),
            vec!["the quick", "brown fox", "jumps"]
        );
    }

    #[test]
    fn test_wrap_splits_long_words() {
        assert_eq!(wrap_to_width("abcdefghij", 4), vec!["abcd", "efgh", "ij"]);
        assert_eq!(wrap_to_width("ab cdefgh", 4), vec!["ab", "cdef", "gh"]);
    }

    #[test]
    fn test_wrap_empty_and_zero_width() {
        assert!(wrap_to_width("   ", 10).is_empty());
        assert_eq!(wrap_to_width("ab", 0), vec!["a", "b"]);
    }

    #[test]
    fn test_wrapped_lines_fit() {
        for line in wrap_to_width("你好世界 hello wonderful world", 5) {
            assert!(display_width(&line) <= 5, "{line:?} too wide");
        }
    }

    #[test]
    fn test_strip_clean_text_returns_borrowed() {
        let input = "line1\nline2\ttabbed";
        assert!(matches!(strip_control_chars(input), Cow::Borrowed(_)));
    }

    #[test]
    fn test_strip_ansi_colour_codes() {
        assert_eq!(strip_control_chars("\x1b[31mRed\x1b[0m text"), "Red text");
    }

    #[test]
    fn test_strip_osc_sequences() {
        assert_eq!(strip_control_chars("a\x1b]0;title\x07b"), "ab");
        assert_eq!(strip_control_chars("a\x1b]8;;http://x\x1b\\b"), "ab");
    }

    #[test]
    fn test_strip_bare_controls_and_del() {
        assert_eq!(strip_control_chars("a\x00b\x7fc\x1bd"), "abc");
    }

    #[test]
    fn test_strip_preserves_unicode() {
        assert_eq!(strip_control_chars("ශ්‍රී ලංකා\x07"), "ශ්‍රී ලංකා");
    }
}
