use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

/// Pad or cut `s` to exactly `width` terminal columns. Cut text ends in `…`.
pub fn fit_width(s: &str, width: usize) -> String {
    if width == 0 {
        return String::new();
    }
    let full = s.width();
    if full <= width {
        return format!("{}{}", s, " ".repeat(width - full));
    }
    let mut out = String::new();
    let mut used = 0;
    for c in s.chars() {
        let w = c.width().unwrap_or(0);
        if used + w > width - 1 {
            break;
        }
        out.push(c);
        used += w;
    }
    out.push('…');
    used += 1;
    out.push_str(&" ".repeat(width.saturating_sub(used)));
    out
}

/// First visible index so that `cursor` stays inside a window of `height`
/// rows, moving `offset` as little as possible.
pub fn scroll_into_view(offset: usize, cursor: usize, height: usize) -> usize {
    if height == 0 {
        return cursor;
    }
    if cursor < offset {
        cursor
    } else if cursor >= offset + height {
        cursor + 1 - height
    } else {
        offset
    }
}
