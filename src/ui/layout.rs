use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph};
use ratatui::Frame;

use super::{context_menu_view, dialogs, help_overlay, listing_view, theme, tree_view};
use crate::app::{App, Pane};
use crate::state::context_menu::ContextMenu;

/// Screen areas of the main panes. Shared by rendering and mouse
/// hit-testing so both agree on where rows are.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Regions {
    pub tree: Rect,
    pub listing: Rect,
    pub status: Rect,
}

pub fn regions(area: Rect) -> Regions {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(3),    // Panes
            Constraint::Length(2), // Status bar
        ])
        .split(area);

    let panes = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(28), Constraint::Percentage(72)])
        .split(chunks[0]);

    Regions {
        tree: panes[0],
        listing: panes[1],
        status: chunks[1],
    }
}

/// Inside of a bordered pane.
pub fn pane_inner(area: Rect) -> Rect {
    Block::default().borders(Borders::ALL).inner(area)
}

/// Rows of the listing, below its column header.
pub fn listing_body(listing: Rect) -> Rect {
    let inner = pane_inner(listing);
    Rect {
        y: inner.y.saturating_add(1).min(inner.bottom()),
        height: inner.height.saturating_sub(1),
        ..inner
    }
}

/// Screen row of every visible entry, paired with its index.
pub fn row_rects(body: Rect, offset: usize, len: usize) -> Vec<(usize, Rect)> {
    (offset..len)
        .take(body.height as usize)
        .enumerate()
        .map(|(line, idx)| (idx, Rect::new(body.x, body.y + line as u16, body.width, 1)))
        .collect()
}

/// Entry index under a screen cell, if any.
pub fn row_at(body: Rect, offset: usize, len: usize, col: u16, row: u16) -> Option<usize> {
    if !contains(body, col, row) {
        return None;
    }
    let idx = offset + (row - body.y) as usize;
    (idx < len).then_some(idx)
}

pub fn contains(area: Rect, col: u16, row: u16) -> bool {
    col >= area.x && col < area.right() && row >= area.y && row < area.bottom()
}

/// Centered popup of at most `width` x `height`.
pub fn centered(area: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(area.width.saturating_sub(4));
    let height = height.min(area.height.saturating_sub(2));

    let vert = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length((area.height.saturating_sub(height)) / 2),
            Constraint::Length(height),
            Constraint::Min(0),
        ])
        .split(area);

    let horiz = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Length((area.width.saturating_sub(width)) / 2),
            Constraint::Length(width),
            Constraint::Min(0),
        ])
        .split(vert[1]);

    horiz[1]
}

/// Where a context menu is drawn: at its anchor, shifted to stay on screen.
pub fn menu_area(menu: &ContextMenu, area: Rect) -> Rect {
    let label_width = menu
        .items
        .iter()
        .map(|a| a.label().chars().count() + a.hint().chars().count() + 3)
        .chain(std::iter::once(menu.title().chars().count() + 2))
        .max()
        .unwrap_or(10) as u16;
    let width = (label_width + 2).min(area.width);
    let height = (menu.items.len() as u16 + 2).min(area.height);

    let (col, row) = menu.anchor;
    let x = col.min(area.right().saturating_sub(width)).max(area.x);
    let y = row.min(area.bottom().saturating_sub(height)).max(area.y);
    Rect::new(x, y, width, height)
}

/// Menu item under a screen cell.
pub fn menu_item_at(menu: &ContextMenu, area: Rect, col: u16, row: u16) -> Option<usize> {
    let inner = pane_inner(menu_area(menu, area));
    row_at(inner, 0, menu.items.len(), col, row)
}

pub fn draw_layout(f: &mut Frame, app: &App) {
    let regions = regions(f.area());

    tree_view::draw_tree(f, regions.tree, app);
    listing_view::draw_listing(f, regions.listing, app);
    draw_status_bar(f, regions.status, app);

    if let Some(ref menu) = app.context_menu {
        context_menu_view::draw_context_menu(f, f.area(), menu);
    }

    if let Some(ref dialog) = app.dialog {
        dialogs::draw_dialog(f, f.area(), dialog, app.dialog_error.as_deref());
    }

    // Help overlay (on top of everything)
    if app.show_help {
        help_overlay::draw_help(f, f.area());
    }
}

fn hint_text(app: &App) -> Vec<(&'static str, &'static str)> {
    if app.dialog.is_some() {
        return vec![("Enter", "confirm"), ("Esc", "cancel")];
    }
    if app.context_menu.is_some() {
        return vec![("j/k", "nav"), ("Enter", "choose"), ("Esc", "close")];
    }
    let mut hints: Vec<(&str, &str)> = match app.focus {
        Pane::Tree => vec![
            ("j/k", "nav"),
            ("h/l", "fold"),
            ("Enter", "open"),
            ("Tab", "listing"),
        ],
        Pane::Listing => vec![
            ("Enter", "open"),
            ("Space", "select"),
            ("m", "menu"),
            ("u", "upload"),
            ("D", "download"),
            ("r", "rename"),
            ("d", "delete"),
            ("/", "search"),
        ],
    };
    if app.search.is_some() {
        hints.push(("Esc", "end search"));
    }
    if app.nav.can_go_back() {
        hints.push(("Alt+←", "back"));
    }
    if app.nav.can_go_forward() {
        hints.push(("Alt+→", "fwd"));
    }
    hints.push(("?", "help"));
    hints
}

fn draw_status_bar(f: &mut Frame, area: Rect, app: &App) {
    if area.height == 0 {
        return;
    }
    let info_area = Rect { height: 1, ..area };
    let hint_area = Rect {
        y: area.y + 1,
        height: area.height.saturating_sub(1),
        ..area
    };

    let mut left: Vec<Span> = vec![Span::styled(format!(" {} ", app.current_dir), theme::STATUS_PATH)];
    if let Some(ref query) = app.search {
        left.push(Span::styled(format!(" SEARCH: {} ", query), theme::SEARCH_BADGE));
    }

    let count = app.records.len();
    let selected = app.selection.len();
    let mut summary = if selected > 0 {
        format!(" {} of {} selected", selected, count)
    } else {
        format!(" {} item{}", count, if count == 1 { "" } else { "s" })
    };
    if app.loading {
        summary.push_str(" (loading)");
    }
    summary.push_str(&format!(
        "  {} {}",
        app.sort_key.label(),
        app.sort_order.arrow()
    ));
    if app.show_hidden {
        summary.push_str("  +hidden");
    }
    if !app.clipboard.is_empty() {
        summary.push_str(&format!("  {} cut", app.clipboard.paths().len()));
    }
    summary.push(' ');
    left.push(Span::styled(summary, theme::STATUS_BAR));

    if let Some(ref err) = app.last_error {
        left.push(Span::styled(format!(" ERR: {} ", err), theme::STATUS_ERROR));
    } else if let Some(ref notice) = app.notice {
        left.push(Span::styled(format!(" {} ", notice), theme::STATUS_NOTICE));
    }

    let mut right: Vec<Span> = Vec::new();
    if let Some(ref disk) = app.disk {
        let style = if disk.used_ratio() >= 0.9 {
            theme::DISK_FULL
        } else {
            theme::DISK_OK
        };
        right.push(Span::styled(format!(" {} ", disk.summary()), style));
    }
    if app.push_enabled {
        let (label, style) = if app.push_connected {
            (" live ", theme::PUSH_ONLINE)
        } else {
            (" offline ", theme::PUSH_OFFLINE)
        };
        right.push(Span::styled(label, style));
    }

    f.render_widget(Paragraph::new(spread(left, right, info_area.width)), info_area);

    if hint_area.height == 0 {
        return;
    }
    let mut hint_spans: Vec<Span> = Vec::new();
    for (i, (key, desc)) in hint_text(app).iter().enumerate() {
        if i > 0 {
            hint_spans.push(Span::styled("  ", theme::STATUS_BAR));
        }
        hint_spans.push(Span::styled(*key, theme::HINT_KEY));
        hint_spans.push(Span::styled(":", theme::HINT_DESC));
        hint_spans.push(Span::styled(*desc, theme::HINT_DESC));
    }
    hint_spans.push(Span::styled(" ", theme::STATUS_BAR));
    f.render_widget(
        Paragraph::new(spread(Vec::new(), hint_spans, hint_area.width)),
        hint_area,
    );
}

/// Left spans, a status-bar colored gap, then right-aligned spans.
fn spread<'a>(left: Vec<Span<'a>>, right: Vec<Span<'a>>, width: u16) -> Line<'a> {
    let left_width: usize = left.iter().map(|s| s.width()).sum();
    let right_width: usize = right.iter().map(|s| s.width()).sum();
    let gap = (width as usize).saturating_sub(left_width + right_width);

    let mut spans = left;
    spans.push(Span::styled(" ".repeat(gap), theme::STATUS_BAR));
    spans.extend(right);
    Line::from(spans)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::file::FileRecord;
    use crate::state::context_menu::ContextTarget;

    #[test]
    fn listing_rows_sit_below_header() {
        let r = regions(Rect::new(0, 0, 100, 30));
        assert_eq!(r.status.height, 2);
        assert_eq!(r.tree.y, 0);
        let body = listing_body(r.listing);
        // border + header
        assert_eq!(body.y, r.listing.y + 2);
        assert_eq!(body.height, r.listing.height - 3);

        let rows = row_rects(body, 5, 8);
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0], (5, Rect::new(body.x, body.y, body.width, 1)));
        assert_eq!(row_at(body, 5, 8, body.x, body.y + 2), Some(7));
        assert_eq!(row_at(body, 5, 8, body.x, body.y + 3), None);
        assert_eq!(row_at(body, 5, 8, 0, body.y), None);
    }

    #[test]
    fn menu_stays_on_screen() {
        let menu = ContextMenu::new(
            ContextTarget::Single(Box::new(FileRecord::directory("/docs"))),
            true,
            (95, 28),
        );
        let screen = Rect::new(0, 0, 100, 30);
        let area = menu_area(&menu, screen);
        assert!(area.right() <= screen.right());
        assert!(area.bottom() <= screen.bottom());
        assert_eq!(area.height as usize, menu.items.len() + 2);

        let first = menu_item_at(&menu, screen, area.x + 1, area.y + 1);
        assert_eq!(first, Some(0));
        assert_eq!(menu_item_at(&menu, screen, area.x + 1, area.y), None);
    }
}
