use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

/// Display width of a string, accounting for CJK double-width, emoji, etc.
pub(crate) fn display_width(s: &str) -> usize {
    UnicodeWidthStr::width(s)
}

/// Cut a string to at most `width` display columns. Control characters
/// (tabs, line breaks in quoted CSV fields) are shown as spaces so they
/// cannot break the grid layout.
pub(crate) fn clip(s: &str, width: usize) -> String {
    let mut out = String::new();
    let mut used = 0;
    for ch in s.chars() {
        let ch = if ch.is_control() { ' ' } else { ch };
        let cw = UnicodeWidthChar::width(ch).unwrap_or(0);
        if used + cw > width {
            break;
        }
        used += cw;
        out.push(ch);
    }
    out
}

/// Clip to `width` and right-pad with spaces to exactly `width` columns.
pub(crate) fn pad_right(s: &str, width: usize) -> String {
    let s = clip(s, width);
    let pad = width.saturating_sub(display_width(&s));
    format!("{}{}", s, " ".repeat(pad))
}

/// Clip to `width` and left-pad with spaces to exactly `width` columns.
pub(crate) fn pad_left(s: &str, width: usize) -> String {
    let s = clip(s, width);
    let pad = width.saturating_sub(display_width(&s));
    format!("{}{}", " ".repeat(pad), s)
}
