use bytesize::ByteSize;
use chrono::{DateTime, Local, Utc};
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::Style;
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};
use ratatui::Frame;
use tui_textarea::TextArea;

use super::{layout, theme, util};
use crate::model::activity::LogEntry;
use crate::model::file::FileRecord;
use crate::state::dialog::Dialog;
use crate::state::tree::TreeState;

/// Names listed in delete and download dialogs before "and N more".
const MAX_LISTED: usize = 8;

pub fn draw_dialog(f: &mut Frame, screen: Rect, dialog: &Dialog, error: Option<&str>) {
    match dialog {
        Dialog::Rename { input, .. } => draw_input(f, screen, dialog, "New name:", &[], input, error),
        Dialog::NewFolder { input, .. } => {
            draw_input(f, screen, dialog, "Folder name:", &[], input, error)
        }
        Dialog::Upload { input, .. } => draw_input(
            f,
            screen,
            dialog,
            "Local file or folder to upload:",
            &[],
            input,
            error,
        ),
        Dialog::Download { records, input } => draw_input(
            f,
            screen,
            dialog,
            "Save into local folder:",
            records,
            input,
            error,
        ),
        Dialog::Search { input, .. } => {
            draw_input(f, screen, dialog, "Names containing:", &[], input, error)
        }
        Dialog::Move { picker, .. } => draw_move(f, screen, dialog, picker, error),
        Dialog::ConfirmDelete { targets } => draw_confirm_delete(f, screen, targets, error),
        Dialog::Properties(rec) => draw_properties(f, screen, dialog, rec),
        Dialog::History {
            entries, scroll, ..
        } => draw_history(f, screen, dialog, entries.as_ref(), *scroll),
    }
}

fn popup(f: &mut Frame, screen: Rect, title: String, width: u16, height: u16, border: Style) -> Rect {
    let area = layout::centered(screen, width, height);
    f.render_widget(Clear, area);
    let block = Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(border);
    let inner = block.inner(area);
    f.render_widget(block, area);
    inner
}

fn footer(keys: &[(&'static str, &'static str)]) -> Line<'static> {
    let mut spans = vec![Span::raw(" ")];
    for (i, (key, desc)) in keys.iter().enumerate() {
        if i > 0 {
            spans.push(Span::raw("  "));
        }
        spans.push(Span::styled(*key, theme::HELP_KEY));
        spans.push(Span::styled(format!(" {}", desc), theme::LIST_META));
    }
    Line::from(spans)
}

fn error_line(error: Option<&str>) -> Line<'static> {
    match error {
        Some(msg) => Line::from(Span::styled(format!(" {}", msg), theme::BORDER_DANGER)),
        None => Line::from(""),
    }
}

/// Names of `records`, capped at [`MAX_LISTED`].
fn listed_names(records: &[FileRecord]) -> Vec<Line<'static>> {
    let mut lines: Vec<Line> = records
        .iter()
        .take(MAX_LISTED)
        .map(|r| {
            let style = if r.is_dir { theme::DIR } else { theme::FILE };
            let suffix = if r.is_dir { "/" } else { "" };
            Line::from(Span::styled(format!("   {}{}", r.name, suffix), style))
        })
        .collect();
    if records.len() > MAX_LISTED {
        lines.push(Line::from(Span::styled(
            format!("   and {} more", records.len() - MAX_LISTED),
            theme::LIST_META,
        )));
    }
    lines
}

fn draw_input(
    f: &mut Frame,
    screen: Rect,
    dialog: &Dialog,
    prompt: &str,
    records: &[FileRecord],
    input: &TextArea<'static>,
    error: Option<&str>,
) {
    let names = listed_names(records);
    let height = 8 + names.len() as u16;
    let inner = popup(f, screen, dialog.title(), 64, height, theme::BORDER_DIALOG);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(names.len() as u16),
            Constraint::Length(1), // Prompt
            Constraint::Length(3), // Input
            Constraint::Length(1), // Error
            Constraint::Min(1),    // Keys
        ])
        .split(inner);

    f.render_widget(Paragraph::new(names), chunks[0]);
    f.render_widget(
        Paragraph::new(Span::styled(format!(" {}", prompt), theme::HELP_DESC)),
        chunks[1],
    );

    let border = if error.is_some() {
        theme::BORDER_DANGER
    } else {
        theme::BORDER_ACTIVE
    };
    let frame = Block::default().borders(Borders::ALL).border_style(border);
    let field = frame.inner(chunks[2]);
    f.render_widget(frame, chunks[2]);
    f.render_widget(input, field);

    f.render_widget(Paragraph::new(error_line(error)), chunks[3]);
    f.render_widget(
        Paragraph::new(footer(&[("Enter", "confirm"), ("Esc", "cancel")])),
        chunks[4],
    );
}

fn draw_move(f: &mut Frame, screen: Rect, dialog: &Dialog, picker: &TreeState, error: Option<&str>) {
    let height = screen.height.saturating_sub(6).clamp(10, 24);
    let inner = popup(f, screen, dialog.title(), 56, height, theme::BORDER_DIALOG);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // Destination
            Constraint::Min(1),    // Picker
            Constraint::Length(1), // Error
            Constraint::Length(1), // Keys
        ])
        .split(inner);

    let dest = picker.cursor_path().unwrap_or("/");
    f.render_widget(
        Paragraph::new(Line::from(vec![
            Span::styled(" Into: ", theme::HELP_DESC),
            Span::styled(dest.to_string(), theme::DIR),
        ])),
        chunks[0],
    );

    let rows = picker.rows();
    let body = chunks[1];
    let offset = util::scroll_into_view(0, picker.cursor(), body.height as usize);
    for (idx, rect) in layout::row_rects(body, offset, rows.len()) {
        let row = &rows[idx];
        let arrow = match (row.depth, row.has_children, row.expanded) {
            (0, _, _) | (_, false, _) => "  ",
            (_, true, true) => "▾ ",
            (_, true, false) => "▸ ",
        };
        let name = if row.depth == 0 { "/" } else { row.name.as_str() };
        let style = if idx == picker.cursor() {
            theme::LIST_CURSOR
        } else {
            theme::DIR
        };
        let text = format!(" {}{}{}", "  ".repeat(row.depth), arrow, name);
        f.render_widget(
            Paragraph::new(util::fit_width(&text, rect.width as usize)).style(style),
            rect,
        );
    }

    f.render_widget(Paragraph::new(error_line(error)), chunks[2]);
    f.render_widget(
        Paragraph::new(footer(&[
            ("j/k", "nav"),
            ("h/l", "fold"),
            ("Enter", "move here"),
            ("Esc", "cancel"),
        ])),
        chunks[3],
    );
}

fn draw_confirm_delete(f: &mut Frame, screen: Rect, targets: &[FileRecord], error: Option<&str>) {
    let names = listed_names(targets);
    let height = 7 + names.len() as u16;
    let inner = popup(
        f,
        screen,
        " Confirm Delete ".to_string(),
        56,
        height,
        theme::BORDER_DANGER,
    );

    let question = match targets {
        [one] if one.is_dir => format!(" Delete folder \"{}\" and everything in it?", one.name),
        [one] => format!(" Delete \"{}\"?", one.name),
        many => format!(" Delete these {} items?", many.len()),
    };

    let mut lines = vec![
        Line::from(Span::styled(question, theme::HELP_DESC)),
        Line::from(""),
    ];
    lines.extend(names);
    lines.push(Line::from(""));
    lines.push(error_line(error));
    lines.push(footer(&[("y", "delete"), ("n/Esc", "cancel")]));

    f.render_widget(Paragraph::new(lines).wrap(Wrap { trim: false }), inner);
}

fn format_time(time: Option<DateTime<Utc>>) -> String {
    time.map(|t| {
        t.with_timezone(&Local)
            .format("%Y-%m-%d %H:%M:%S")
            .to_string()
    })
    .unwrap_or_else(|| "-".to_string())
}

fn property_lines(rec: &FileRecord) -> Vec<(&'static str, String)> {
    let size = if rec.is_dir {
        "-".to_string()
    } else {
        format!("{} ({} bytes)", ByteSize(rec.size), rec.size)
    };
    let file_type = match rec.extension() {
        Some(ext) => format!("{} file", ext.to_uppercase()),
        None => "-".to_string(),
    };
    vec![
        ("Kind", rec.kind_label().to_string()),
        ("Type", file_type),
        ("Path", rec.path.clone()),
        ("Size", size),
        ("Created", format_time(rec.created)),
        ("Modified", format_time(rec.modified)),
        ("Color", rec.color.clone().unwrap_or_else(|| "-".to_string())),
    ]
}

fn draw_properties(f: &mut Frame, screen: Rect, dialog: &Dialog, rec: &FileRecord) {
    let props = property_lines(rec);
    let height = props.len() as u16 + 4;
    let inner = popup(f, screen, dialog.title(), 60, height, theme::BORDER_DIALOG);

    let mut lines: Vec<Line> = props
        .into_iter()
        .map(|(key, value)| {
            let value_style = match (key, rec.display_color()) {
                ("Color", Some(color)) => Style::new().fg(color),
                _ => theme::HELP_DESC,
            };
            Line::from(vec![
                Span::styled(format!(" {:10}", key), theme::HELP_KEY),
                Span::styled(value, value_style),
            ])
        })
        .collect();
    lines.push(Line::from(""));
    lines.push(footer(&[("Esc", "close")]));

    f.render_widget(Paragraph::new(lines), inner);
}

fn history_line(entry: &LogEntry, width: usize) -> Line<'static> {
    let time = entry
        .timestamp
        .with_timezone(&Local)
        .format("%Y-%m-%d %H:%M")
        .to_string();
    let mut spans = vec![
        Span::styled(format!(" {}  ", time), theme::LOG_TIME),
        Span::styled(format!("{:10} ", entry.event_label()), theme::LOG_EVENT),
        Span::styled(entry.actor.clone(), theme::LOG_ACTOR),
    ];
    if let Some(ref detail) = entry.detail {
        let used = 20 + 11 + entry.actor.chars().count();
        let room = width.saturating_sub(used + 2);
        if room > 1 {
            spans.push(Span::styled(
                format!("  {}", util::fit_width(detail, room).trim_end()),
                theme::HELP_DESC,
            ));
        }
    }
    Line::from(spans)
}

fn draw_history(
    f: &mut Frame,
    screen: Rect,
    dialog: &Dialog,
    entries: Option<&Result<Vec<LogEntry>, String>>,
    scroll: usize,
) {
    let height = screen.height.saturating_sub(4).clamp(8, 30);
    let inner = popup(f, screen, dialog.title(), 90, height, theme::BORDER_DIALOG);
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(1), Constraint::Length(1)])
        .split(inner);

    let body: Vec<Line> = match entries {
        None => vec![Line::from(Span::styled(" Loading...", theme::EMPTY_STATE))],
        Some(Err(e)) => vec![Line::from(Span::styled(
            format!(" Failed to load history: {}", e),
            theme::BORDER_DANGER,
        ))],
        Some(Ok(list)) if list.is_empty() => vec![Line::from(Span::styled(
            " No recorded activity",
            theme::EMPTY_STATE,
        ))],
        Some(Ok(list)) => list
            .iter()
            .skip(scroll)
            .map(|e| history_line(e, chunks[0].width as usize))
            .collect(),
    };
    f.render_widget(Paragraph::new(body), chunks[0]);
    f.render_widget(
        Paragraph::new(footer(&[("j/k", "scroll"), ("Esc", "close")])),
        chunks[1],
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn properties_cover_metadata() {
        let mut rec = FileRecord::directory("/docs/report.pdf");
        rec.is_dir = false;
        rec.size = 1536;
        rec.color = Some("#ff0000".into());
        let props = property_lines(&rec);
        let get = |k: &str| props.iter().find(|(key, _)| *key == k).map(|(_, v)| v.clone());
        assert_eq!(get("Kind").as_deref(), Some("File"));
        assert_eq!(get("Type").as_deref(), Some("PDF file"));
        assert_eq!(get("Path").as_deref(), Some("/docs/report.pdf"));
        assert!(get("Size").is_some_and(|s| s.ends_with("(1536 bytes)")));
        assert_eq!(get("Created").as_deref(), Some("-"));
        assert_eq!(get("Color").as_deref(), Some("#ff0000"));
    }

    #[test]
    fn folders_have_no_file_type() {
        let props = property_lines(&FileRecord::directory("/archive.d"));
        assert!(props.contains(&("Type", "-".to_string())));
    }

    #[test]
    fn long_selections_are_summarized() {
        let records: Vec<FileRecord> = (0..12)
            .map(|i| FileRecord::directory(&format!("/d{}", i)))
            .collect();
        let lines = listed_names(&records);
        assert_eq!(lines.len(), MAX_LISTED + 1);
        let last: String = lines[MAX_LISTED]
            .spans
            .iter()
            .map(|s| s.content.as_ref())
            .collect();
        assert_eq!(last.trim(), "and 4 more");
    }

    #[test]
    fn history_line_shows_event_and_actor() {
        let entry = LogEntry {
            actor: "ana".into(),
            event: "rename".into(),
            timestamp: Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap(),
            detail: Some("a.txt -> b.txt".into()),
        };
        let text: String = history_line(&entry, 80)
            .spans
            .iter()
            .map(|s| s.content.as_ref())
            .collect();
        assert!(text.contains("Rename"));
        assert!(text.contains("ana"));
        assert!(text.contains("a.txt -> b.txt"));
    }
}
