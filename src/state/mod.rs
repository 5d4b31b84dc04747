//! Client-side UI state machines. Nothing here touches the network or the
//! terminal; `app::App` wires them to both.

pub mod clipboard;
pub mod context_menu;
pub mod dialog;
pub mod history;
pub mod selection;
pub mod sort;
pub mod tree;
