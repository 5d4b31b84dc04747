use ratatui::layout::Rect;
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph};
use ratatui::Frame;

use super::{layout, theme, util};
use crate::app::{App, Pane};
use crate::state::tree::TreeRow;

pub fn draw_tree(f: &mut Frame, area: Rect, app: &App) {
    let is_active = app.focus == Pane::Tree;
    let border_style = if is_active {
        theme::BORDER_ACTIVE
    } else {
        theme::BORDER_INACTIVE
    };

    let block = Block::default()
        .title(" Folders ")
        .borders(Borders::ALL)
        .border_style(border_style);
    let body = layout::pane_inner(area);
    f.render_widget(block, area);

    if !app.tree.is_loaded() {
        f.render_widget(
            Paragraph::new(" Loading...").style(theme::EMPTY_STATE),
            body,
        );
        return;
    }

    let rows = app.tree.rows();
    let width = body.width as usize;
    for (idx, rect) in layout::row_rects(body, app.tree_offset, rows.len()) {
        let row = &rows[idx];
        let is_cursor = idx == app.tree.cursor();
        let is_current = row.path == app.current_dir;
        let line = tree_line(row, width, is_current);
        let style = if is_cursor && is_active {
            theme::LIST_CURSOR
        } else if is_cursor {
            theme::LIST_SELECTED
        } else {
            theme::LIST_NORMAL
        };
        f.render_widget(Paragraph::new(line).style(style), rect);
    }
}

fn arrow(row: &TreeRow) -> &'static str {
    if row.depth == 0 || !row.has_children {
        "  "
    } else if row.expanded {
        "▾ "
    } else {
        "▸ "
    }
}

fn tree_line(row: &TreeRow, width: usize, is_current: bool) -> Line<'static> {
    let indent = "  ".repeat(row.depth);
    let name = if row.depth == 0 { "/" } else { row.name.as_str() };
    let prefix_width = indent.len() + 2;
    let name_style = if is_current {
        theme::DIR.add_modifier(ratatui::style::Modifier::UNDERLINED)
    } else {
        theme::DIR
    };
    Line::from(vec![
        Span::raw(indent),
        Span::styled(arrow(row), theme::LIST_META),
        Span::styled(
            util::fit_width(name, width.saturating_sub(prefix_width)),
            name_style,
        ),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(name: &str, depth: usize, has_children: bool, expanded: bool) -> TreeRow {
        TreeRow {
            path: format!("/{}", name),
            name: name.to_string(),
            depth,
            has_children,
            expanded,
        }
    }

    #[test]
    fn arrows_reflect_fold_state() {
        assert_eq!(arrow(&row("", 0, true, true)), "  ");
        assert_eq!(arrow(&row("docs", 1, true, true)), "▾ ");
        assert_eq!(arrow(&row("docs", 1, true, false)), "▸ ");
        assert_eq!(arrow(&row("empty", 1, false, false)), "  ");
    }

    #[test]
    fn line_indents_by_depth() {
        let line = tree_line(&row("2024", 2, false, false), 20, false);
        let text: String = line.spans.iter().map(|s| s.content.as_ref()).collect();
        assert!(text.starts_with("      2024"));
        assert_eq!(line.width(), 20);
    }
}
