use bytesize::ByteSize;
use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph};
use ratatui::Frame;

use super::{layout, theme, util};
use crate::app::{App, Pane};
use crate::model::file::FileRecord;
use crate::state::sort::SortKey;

const SIZE_WIDTH: usize = 10;
const DATE_WIDTH: usize = 16;

pub fn draw_listing(f: &mut Frame, area: Rect, app: &App) {
    let is_active = app.focus == Pane::Listing;
    let border_style = if is_active {
        theme::BORDER_ACTIVE
    } else {
        theme::BORDER_INACTIVE
    };

    let title = match app.search {
        Some(ref query) => format!(" Search \"{}\" in {} ", query, app.current_dir),
        None => format!(" {} ", app.current_dir),
    };
    let block = Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(border_style);
    let inner = layout::pane_inner(area);
    f.render_widget(block, area);
    if inner.height == 0 {
        return;
    }

    let header_area = Rect { height: 1, ..inner };
    f.render_widget(Paragraph::new(header_line(app, inner.width as usize)), header_area);

    let body = layout::listing_body(area);
    if app.records.is_empty() {
        let msg = if app.loading {
            " Loading..."
        } else if app.search.is_some() {
            " No matches"
        } else {
            " Empty folder"
        };
        f.render_widget(Paragraph::new(msg).style(theme::EMPTY_STATE), body);
        return;
    }

    let width = body.width as usize;
    for (idx, rect) in layout::row_rects(body, app.listing_offset, app.records.len()) {
        let rec = &app.records[idx];
        let is_cursor = is_active && idx == app.selection.cursor();
        let is_selected = app.selection.is_selected(idx);
        let is_cut = app.clipboard.contains(&rec.path);
        let line = record_line(rec, width, app.sort_key, is_cut, is_selected);
        let mut style = if is_selected {
            theme::LIST_SELECTED
        } else if is_cursor {
            theme::LIST_CURSOR
        } else {
            theme::LIST_NORMAL
        };
        if is_cursor && is_selected {
            style = style.add_modifier(Modifier::BOLD);
        }
        f.render_widget(Paragraph::new(line).style(style), rect);
    }

    if let Some(marquee) = app.selection.marquee() {
        if marquee.moved() {
            let rect = marquee.rect().intersection(body);
            if rect.width > 0 && rect.height > 0 {
                let outline = Block::default()
                    .borders(Borders::ALL)
                    .border_style(theme::MARQUEE);
                f.render_widget(Clear, rect);
                f.render_widget(outline, rect);
            }
        }
    }
}

fn date_column(key: SortKey) -> (&'static str, SortKey) {
    if key == SortKey::Created {
        ("Created", SortKey::Created)
    } else {
        ("Modified", SortKey::Modified)
    }
}

fn header_line(app: &App, width: usize) -> Line<'static> {
    let label = |title: &str, key: SortKey| {
        if app.sort_key == key {
            format!("{} {}", title, app.sort_order.arrow())
        } else {
            title.to_string()
        }
    };
    let (date_title, date_key) = date_column(app.sort_key);
    let name_width = width.saturating_sub(SIZE_WIDTH + DATE_WIDTH + 4);
    Line::from(vec![
        Span::styled(
            util::fit_width(&format!(" {}", label("Name", SortKey::Name)), name_width + 1),
            theme::LIST_HEADER,
        ),
        Span::raw(" "),
        Span::styled(
            format!("{:>w$}", label("Size", SortKey::Size), w = SIZE_WIDTH),
            theme::LIST_HEADER,
        ),
        Span::raw("  "),
        Span::styled(
            util::fit_width(&label(date_title, date_key), DATE_WIDTH),
            theme::LIST_HEADER,
        ),
    ])
}

fn size_label(rec: &FileRecord) -> String {
    if rec.is_dir {
        "-".to_string()
    } else {
        ByteSize(rec.size).to_string()
    }
}

fn record_line(
    rec: &FileRecord,
    width: usize,
    sort_key: SortKey,
    is_cut: bool,
    is_selected: bool,
) -> Line<'static> {
    let name_width = width.saturating_sub(SIZE_WIDTH + DATE_WIDTH + 4);
    let mut name = rec.name.clone();
    if rec.is_dir {
        name.push('/');
    }
    if rec.is_shortcut {
        name.push_str(" ⇢");
    }

    let name_style = if is_cut {
        theme::LIST_CUT
    } else if is_selected {
        Style::default()
    } else if let Some(color) = rec.display_color() {
        Style::new().fg(color)
    } else if rec.is_shortcut {
        theme::SHORTCUT
    } else if rec.is_dir {
        theme::DIR
    } else {
        theme::FILE
    };
    let meta_style = if is_selected {
        Style::default()
    } else {
        theme::LIST_META
    };

    let date = match date_column(sort_key).1 {
        SortKey::Created => rec.created,
        _ => rec.modified,
    };
    let date = date
        .map(|d| d.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| "-".to_string());

    Line::from(vec![
        Span::raw(" "),
        Span::styled(util::fit_width(&name, name_width), name_style),
        Span::raw(" "),
        Span::styled(format!("{:>w$}", size_label(rec), w = SIZE_WIDTH), meta_style),
        Span::raw("  "),
        Span::styled(util::fit_width(&date, DATE_WIDTH), meta_style),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn file(name: &str, size: u64) -> FileRecord {
        FileRecord {
            is_dir: false,
            size,
            modified: Utc.with_ymd_and_hms(2024, 3, 5, 14, 7, 0).single(),
            ..FileRecord::directory(&format!("/{}", name))
        }
    }

    fn text(line: &Line) -> String {
        line.spans.iter().map(|s| s.content.as_ref()).collect()
    }

    #[test]
    fn row_fills_width_with_columns() {
        let line = record_line(&file("notes.txt", 2048), 60, SortKey::Name, false, false);
        assert_eq!(line.width(), 60);
        let text = text(&line);
        assert!(text.starts_with(" notes.txt"));
        assert!(text.contains("2.0 KB") || text.contains("2.0 KiB"));
        assert!(text.contains("2024-03-05 14:07"));
    }

    #[test]
    fn directories_show_no_size() {
        let dir = FileRecord::directory("/docs");
        let text = text(&record_line(&dir, 50, SortKey::Name, false, false));
        assert!(text.starts_with(" docs/"));
        assert!(text.contains(" - "));
    }

    #[test]
    fn cut_entries_are_dimmed() {
        let line = record_line(&file("a.txt", 1), 50, SortKey::Name, true, false);
        assert_eq!(line.spans[1].style, theme::LIST_CUT);
    }

    #[test]
    fn created_sort_swaps_date_column() {
        assert_eq!(date_column(SortKey::Created).0, "Created");
        assert_eq!(date_column(SortKey::Size).0, "Modified");
        // no created date on the record
        let text = text(&record_line(&file("a", 1), 50, SortKey::Created, false, false));
        assert!(!text.contains("2024"));
    }
}
