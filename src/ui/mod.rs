pub mod context_menu_view;
pub mod dialogs;
pub mod help_overlay;
pub mod layout;
pub mod listing_view;
pub mod theme;
pub mod tree_view;
pub mod util;

use ratatui::Frame;

use crate::app::App;

/// Main draw dispatcher.
pub fn draw(f: &mut Frame, app: &App) {
    layout::draw_layout(f, app);
}
