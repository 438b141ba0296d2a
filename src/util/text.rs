use std::borrow::Cow;

use chrono::{DateTime, Utc};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

/// Calculates the display width of a string in terminal columns.
///
/// CJK characters and most emoji occupy two columns, combining marks zero.
///
/// ```
/// use marketfeed::util::display_width;
///
/// assert_eq!(display_width("Hello"), 5);
/// assert_eq!(display_width("日本"), 4);
/// ```
pub fn display_width(s: &str) -> usize {
    UnicodeWidthStr::width(s)
}

const ELLIPSIS: &str = "...";

/// Truncates a string to fit within `max_width` terminal columns.
///
/// Cut text ends in "..." when there is room for at least one character
/// before it; narrower budgets just keep whatever fits. Returns
/// `Cow::Borrowed` when the input already fits.
///
/// ```
/// use marketfeed::util::truncate_to_width;
///
/// assert_eq!(truncate_to_width("Short", 10), "Short");
/// assert_eq!(truncate_to_width("Hello World", 8), "Hello...");
/// assert_eq!(truncate_to_width("Test", 2), "Te");
/// ```
pub fn truncate_to_width(s: &str, max_width: usize) -> Cow<'_, str> {
    if display_width(s) <= max_width {
        return Cow::Borrowed(s);
    }

    let with_ellipsis = max_width > ELLIPSIS.len();
    let budget = if with_ellipsis {
        max_width - ELLIPSIS.len()
    } else {
        max_width
    };

    // Byte offset of the last char that still fits in `budget` columns
    let mut used = 0;
    let mut end = 0;
    for (idx, c) in s.char_indices() {
        used += UnicodeWidthChar::width(c).unwrap_or(0);
        if used > budget {
            break;
        }
        end = idx + c.len_utf8();
    }

    if with_ellipsis {
        Cow::Owned(format!("{}{ELLIPSIS}", &s[..end]))
    } else {
        Cow::Owned(s[..end].to_string())
    }
}

/// Strip ASCII control characters from feed-supplied text.
///
/// Tab, newline and carriage return survive; every other C0 control and
/// DEL is dropped. Returns `Cow::Borrowed` when nothing needs stripping,
/// which is the overwhelmingly common case for feed titles.
pub fn strip_control_chars(s: &str) -> Cow<'_, str> {
    let is_control = |c: char| {
        c == '\u{7f}' || (c < '\u{20}' && c != '\t' && c != '\n' && c != '\r')
    };

    if !s.chars().any(is_control) {
        return Cow::Borrowed(s);
    }

    Cow::Owned(s.chars().filter(|&c| !is_control(c)).collect())
}

/// Collapse every run of whitespace into a single space and trim the ends.
pub fn collapse_whitespace(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for word in s.split_whitespace() {
        if !out.is_empty() {
            out.push(' ');
        }
        out.push_str(word);
    }
    out
}

/// Number of whitespace-separated words in `s`.
pub fn word_count(s: &str) -> usize {
    s.split_whitespace().count()
}

/// Human-friendly age of a publication date relative to `now`.
///
/// Same-day dates read "Today", then "Yesterday", "N days ago" within a
/// week, "N weeks ago" within a month, and an absolute date beyond that.
pub fn format_relative_date(date: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let diff_secs = (now - date).num_seconds().unsigned_abs();
    let diff_days = diff_secs.div_ceil(86_400);

    match diff_days {
        0 => "Today".to_string(),
        1 => "Yesterday".to_string(),
        2..=6 => format!("{diff_days} days ago"),
        7..=29 => {
            let weeks = diff_days / 7;
            if weeks > 1 {
                format!("{weeks} weeks ago")
            } else {
                "1 week ago".to_string()
            }
        }
        _ => date.format("%b %-d, %Y").to_string(),
    }
}

/// Format an estimated read time in minutes, e.g. "4 min read".
///
/// Zero yields an empty string so callers can skip the label entirely.
pub fn format_read_time(minutes: u32) -> String {
    match minutes {
        0 => String::new(),
        1 => "1 min read".to_string(),
        n => format!("{n} min read"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    #[test]
    fn test_ascii_truncation() {
        assert_eq!(truncate_to_width("Hello World", 8), "Hello...");
        assert_eq!(truncate_to_width("Short", 10), "Short");
    }

    #[test]
    fn test_cjk_truncation() {
        // Each CJK character is two columns wide
        assert_eq!(truncate_to_width("日本語テキ", 7), "日本...");
        assert_eq!(truncate_to_width("日本", 10), "日本");
    }

    #[test]
    fn test_edge_case_widths() {
        assert_eq!(truncate_to_width("Test", 0), "");
        assert_eq!(truncate_to_width("Test", 1), "T");
        assert_eq!(truncate_to_width("Test", 3), "Tes");
        assert_eq!(truncate_to_width("日本", 1), "");
        assert_eq!(truncate_to_width("12345", 5), "12345");
    }

    #[test]
    fn test_strip_clean_text_returns_borrowed() {
        let input = "Home prices rise in\tspring\n";
        let result = strip_control_chars(input);
        assert!(matches!(result, Cow::Borrowed(_)));
        assert_eq!(result, input);
    }

    #[test]
    fn test_strip_control_chars_removes_controls() {
        let input = "he\x00ll\x07o\x08 w\x0bor\x0cld\x7f!";
        assert_eq!(strip_control_chars(input), "hello world!");
    }

    #[test]
    fn test_collapse_whitespace() {
        assert_eq!(collapse_whitespace("  a \n\t b   c "), "a b c");
        assert_eq!(collapse_whitespace("   "), "");
    }

    #[test]
    fn test_word_count() {
        assert_eq!(word_count(""), 0);
        assert_eq!(word_count("one two  three"), 3);
    }

    #[test]
    fn test_relative_dates() {
        let now = Utc.with_ymd_and_hms(2024, 6, 15, 12, 0, 0).unwrap();
        assert_eq!(format_relative_date(now, now), "Today");
        assert_eq!(format_relative_date(now - Duration::hours(20), now), "Yesterday");
        assert_eq!(format_relative_date(now - Duration::days(3), now), "3 days ago");
        assert_eq!(format_relative_date(now - Duration::days(8), now), "1 week ago");
        assert_eq!(format_relative_date(now - Duration::days(15), now), "2 weeks ago");
        assert_eq!(
            format_relative_date(now - Duration::days(60), now),
            "Apr 16, 2024"
        );
    }

    #[test]
    fn test_read_time_labels() {
        assert_eq!(format_read_time(0), "");
        assert_eq!(format_read_time(1), "1 min read");
        assert_eq!(format_read_time(7), "7 min read");
    }
}
