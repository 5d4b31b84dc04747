use ratatui::layout::Rect;
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph};
use ratatui::Frame;

use super::{layout, theme};

const BINDINGS: &[(&str, &[(&str, &str)])] = &[
    (
        "Navigation",
        &[
            ("Tab", "Switch folder tree / listing"),
            ("j/k or Up/Down", "Move cursor"),
            ("h/l or Left/Right", "Parent / open (tree: fold)"),
            ("Enter", "Open folder, download file"),
            ("Backspace", "Parent folder"),
            ("Alt+Left / Alt+Right", "Back / forward"),
            ("g / G", "Jump to top / bottom"),
        ],
    ),
    (
        "Selection",
        &[
            ("Space", "Toggle selection"),
            ("Shift+Up/Down", "Extend selection"),
            ("Ctrl+A", "Select all"),
            ("Esc", "Clear selection / leave search"),
        ],
    ),
    (
        "Operations",
        &[
            ("m / F10", "Context menu"),
            ("n", "New folder"),
            ("u / D", "Upload / download"),
            ("r / F2", "Rename"),
            ("M", "Move to..."),
            ("x / p", "Cut / paste"),
            ("d / Del", "Delete"),
            ("/", "Search current folder"),
            ("H / i", "History / properties"),
        ],
    ),
    (
        "View",
        &[
            ("s / S", "Cycle sort key / flip order"),
            (".", "Show hidden files"),
            ("R", "Refresh"),
            ("?", "Toggle this help"),
            ("q / Ctrl+C", "Quit"),
        ],
    ),
    (
        "Mouse",
        &[
            ("Click", "Select, double click opens"),
            ("Ctrl/Shift+click", "Toggle / extend selection"),
            ("Drag", "Select with a rectangle"),
            ("Right click", "Context menu"),
        ],
    ),
];

pub fn draw_help(f: &mut Frame, area: Rect) {
    let rows: usize = BINDINGS.iter().map(|(_, keys)| keys.len() + 1).sum();
    let popup_area = layout::centered(area, 62, rows as u16 + 4);

    // Clear background
    f.render_widget(Clear, popup_area);

    let mut lines = vec![
        Line::from(Span::styled(" Keybindings", theme::HELP_TITLE)),
        Line::from(""),
    ];

    for (section, keys) in BINDINGS {
        lines.push(Line::from(Span::styled(format!(" {}", section), theme::HELP_TITLE)));
        for (key, desc) in keys.iter() {
            lines.push(Line::from(vec![
                Span::styled(format!("  {:22}", key), theme::HELP_KEY),
                Span::styled(*desc, theme::HELP_DESC),
            ]));
        }
    }

    let block = Block::default()
        .title(" Help ")
        .borders(Borders::ALL)
        .border_style(theme::BORDER_ACTIVE);

    let paragraph = Paragraph::new(lines).block(block);
    f.render_widget(paragraph, popup_area);
}
