use ratatui::style::{Color, Modifier, Style};

// Status bar
pub const STATUS_BAR: Style = Style::new().fg(Color::White).bg(Color::DarkGray);
pub const STATUS_PATH: Style = Style::new()
    .fg(Color::Cyan)
    .bg(Color::DarkGray)
    .add_modifier(Modifier::BOLD);
pub const STATUS_ERROR: Style = Style::new().fg(Color::Red).bg(Color::DarkGray);
pub const STATUS_NOTICE: Style = Style::new().fg(Color::Green).bg(Color::DarkGray);
pub const PUSH_ONLINE: Style = Style::new().fg(Color::Green).bg(Color::DarkGray);
pub const PUSH_OFFLINE: Style = Style::new().fg(Color::Gray).bg(Color::DarkGray);
pub const SEARCH_BADGE: Style = Style::new()
    .fg(Color::Black)
    .bg(Color::Yellow)
    .add_modifier(Modifier::BOLD);

// List items
pub const LIST_CURSOR: Style = Style::new()
    .fg(Color::White)
    .bg(Color::DarkGray)
    .add_modifier(Modifier::BOLD);
pub const LIST_SELECTED: Style = Style::new().fg(Color::Black).bg(Color::Cyan);
pub const LIST_NORMAL: Style = Style::new().fg(Color::White);
pub const LIST_HEADER: Style = Style::new()
    .fg(Color::Gray)
    .add_modifier(Modifier::BOLD)
    .add_modifier(Modifier::UNDERLINED);
pub const LIST_META: Style = Style::new().fg(Color::Gray);
pub const LIST_CUT: Style = Style::new().fg(Color::DarkGray).add_modifier(Modifier::ITALIC);

// Entries
pub const DIR: Style = Style::new().fg(Color::Cyan).add_modifier(Modifier::BOLD);
pub const FILE: Style = Style::new().fg(Color::White);
pub const SHORTCUT: Style = Style::new().fg(Color::Magenta);

// Marquee
pub const MARQUEE: Style = Style::new().fg(Color::Yellow);

// Borders
pub const BORDER_ACTIVE: Style = Style::new().fg(Color::Cyan);
pub const BORDER_INACTIVE: Style = Style::new().fg(Color::DarkGray);
pub const BORDER_DANGER: Style = Style::new().fg(Color::Red);
pub const BORDER_DIALOG: Style = Style::new().fg(Color::Yellow);

// Help overlay
pub const HELP_TITLE: Style = Style::new().fg(Color::Cyan).add_modifier(Modifier::BOLD);
pub const HELP_KEY: Style = Style::new().fg(Color::Yellow).add_modifier(Modifier::BOLD);
pub const HELP_DESC: Style = Style::new().fg(Color::White);

// Footer hints
pub const HINT_KEY: Style = Style::new().fg(Color::Yellow).bg(Color::DarkGray);
pub const HINT_DESC: Style = Style::new().fg(Color::Gray).bg(Color::DarkGray);

// Context menu
pub const MENU: Style = Style::new().fg(Color::White).bg(Color::Black);
pub const MENU_ACTIVE: Style = Style::new()
    .fg(Color::Black)
    .bg(Color::Cyan)
    .add_modifier(Modifier::BOLD);
pub const MENU_DANGER: Style = Style::new().fg(Color::Red).bg(Color::Black);

// Empty state
pub const EMPTY_STATE: Style = Style::new().fg(Color::DarkGray);

// Disk gauge
pub const DISK_OK: Style = Style::new().fg(Color::Green).bg(Color::DarkGray);
pub const DISK_FULL: Style = Style::new().fg(Color::Red).bg(Color::DarkGray);

// Activity log
pub const LOG_ACTOR: Style = Style::new().fg(Color::Cyan);
pub const LOG_EVENT: Style = Style::new().fg(Color::Yellow).add_modifier(Modifier::BOLD);
pub const LOG_TIME: Style = Style::new().fg(Color::DarkGray);
