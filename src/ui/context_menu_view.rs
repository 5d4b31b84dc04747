use ratatui::layout::Rect;
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph};
use ratatui::Frame;

use super::{layout, theme, util};
use crate::state::context_menu::{ContextMenu, MenuAction};

pub fn draw_context_menu(f: &mut Frame, screen: Rect, menu: &ContextMenu) {
    let area = layout::menu_area(menu, screen);
    f.render_widget(Clear, area);

    let block = Block::default()
        .title(format!(" {} ", menu.title()))
        .borders(Borders::ALL)
        .border_style(theme::BORDER_DIALOG)
        .style(theme::MENU);
    let inner = layout::pane_inner(area);
    f.render_widget(block, area);

    let width = inner.width as usize;
    for (idx, rect) in layout::row_rects(inner, 0, menu.items.len()) {
        let action = menu.items[idx];
        let style = if idx == menu.index {
            theme::MENU_ACTIVE
        } else if action == MenuAction::Delete {
            theme::MENU_DANGER
        } else {
            theme::MENU
        };
        let hint = action.hint();
        let label_width = width.saturating_sub(hint.chars().count() + 1);
        let line = Line::from(vec![
            Span::styled(util::fit_width(&format!(" {}", action.label()), label_width), style),
            Span::styled(format!("{} ", hint), style),
        ]);
        f.render_widget(Paragraph::new(line), rect);
    }
}
