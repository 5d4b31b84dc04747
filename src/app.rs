use std::path::PathBuf;
use std::sync::mpsc;
use std::time::{Duration, Instant};

use crossterm::event::{KeyEvent, KeyModifiers};
use ratatui::layout::Rect;

use crate::config::{Config, DISK_POLL_SECS, DOUBLE_CLICK_MS};
use crate::data::client::FileServerClient;
use crate::data::{loader, transfer};
use crate::event::{AppEvent, Operation, ServerChange};
use crate::model::activity::LogEntry;
use crate::model::disk::DiskSpace;
use crate::model::file::FileRecord;
use crate::model::path;
use crate::model::tree::DirTree;
use crate::state::clipboard::Clipboard;
use crate::state::context_menu::{ContextMenu, ContextTarget, MenuAction};
use crate::state::dialog::{self, Dialog, NameCheck};
use crate::state::history::NavHistory;
use crate::state::selection::Selection;
use crate::state::sort::{self, SortKey, SortOrder};
use crate::state::tree::TreeState;
use crate::ui::layout;
use crate::ui::util::scroll_into_view;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Pane {
    Tree,
    Listing,
}

pub struct App {
    client: FileServerClient,
    pub event_tx: Option<mpsc::Sender<AppEvent>>,

    pub focus: Pane,
    pub current_dir: String,
    /// Entries as the server returned them.
    entries: Vec<FileRecord>,
    /// Entries on screen: hidden ones filtered out, sorted.
    pub records: Vec<FileRecord>,
    pub loading: bool,
    listing_generation: u64,
    /// Active search query; the listing then shows search results.
    pub search: Option<String>,

    pub sort_key: SortKey,
    pub sort_order: SortOrder,
    pub show_hidden: bool,
    pub selection: Selection,
    pub listing_offset: usize,

    pub tree: TreeState,
    pub tree_offset: usize,
    pub nav: NavHistory,
    pub clipboard: Clipboard,

    pub context_menu: Option<ContextMenu>,
    pub dialog: Option<Dialog>,
    pub dialog_error: Option<String>,
    pub show_help: bool,

    pub disk: Option<DiskSpace>,
    pub disk_last_poll: Instant,
    pub push_enabled: bool,
    pub push_connected: bool,
    pub download_dir: PathBuf,

    pub last_error: Option<String>,
    pub notice: Option<String>,
    /// Terminal area, for mouse hit-testing and scrolling.
    pub viewport: Rect,
    last_click: Option<(Instant, usize)>,

    pub dirty: bool,
    pub should_quit: bool,
}

impl App {
    pub fn new(config: &Config, client: FileServerClient) -> Self {
        Self {
            client,
            event_tx: None,
            focus: Pane::Listing,
            current_dir: path::ROOT.to_string(),
            entries: Vec::new(),
            records: Vec::new(),
            loading: false,
            listing_generation: 0,
            search: None,
            sort_key: config.sort_key(),
            sort_order: config.sort_order(),
            show_hidden: config.show_hidden(),
            selection: Selection::default(),
            listing_offset: 0,
            tree: TreeState::default(),
            tree_offset: 0,
            nav: NavHistory::default(),
            clipboard: Clipboard::default(),
            context_menu: None,
            dialog: None,
            dialog_error: None,
            show_help: false,
            disk: None,
            disk_last_poll: Instant::now(),
            push_enabled: config.push_enabled(),
            push_connected: false,
            download_dir: config.download_dir(),
            last_error: None,
            notice: None,
            viewport: Rect::new(0, 0, 80, 24),
            last_click: None,
            dirty: true,
            should_quit: false,
        }
    }

    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    /// Run `job` with the client and event sender, if the loop is wired up.
    fn spawn<F>(&self, job: F)
    where
        F: FnOnce(&FileServerClient, &mpsc::Sender<AppEvent>),
    {
        if let Some(ref tx) = self.event_tx {
            job(&self.client, tx);
        }
    }

    // --- Loading ---

    pub fn load_all(&mut self) {
        self.reload_listing();
        self.reload_tree();
        self.reload_disk();
    }

    #[cfg(test)]
    pub fn listing_generation(&self) -> u64 {
        self.listing_generation
    }

    pub fn reload_listing(&mut self) {
        self.listing_generation += 1;
        let Some(ref tx) = self.event_tx else {
            return;
        };
        self.loading = true;
        let dir = self.current_dir.clone();
        match self.search {
            Some(ref query) => {
                loader::load_search(&self.client, tx, dir, query.clone(), self.listing_generation)
            }
            None => loader::load_listing(&self.client, tx, dir, self.listing_generation),
        }
    }

    pub fn reload_tree(&mut self) {
        self.spawn(loader::load_tree);
    }

    pub fn reload_disk(&mut self) {
        self.disk_last_poll = Instant::now();
        self.spawn(loader::load_disk_space);
    }

    pub fn refresh(&mut self) {
        self.notice = None;
        self.load_all();
    }

    /// Periodic work from the event loop.
    pub fn tick(&mut self) {
        if self.disk_last_poll.elapsed() >= Duration::from_secs(DISK_POLL_SECS) {
            self.reload_disk();
        }
    }

    pub fn handle_listing_loaded(
        &mut self,
        generation: u64,
        dir: String,
        result: Result<Vec<FileRecord>, String>,
    ) {
        if generation != self.listing_generation || dir != self.current_dir {
            log::debug!("dropping stale listing of {} (#{})", dir, generation);
            return;
        }
        self.loading = false;
        match result {
            Ok(entries) => {
                self.entries = entries;
                self.apply_view();
            }
            Err(e) => {
                log::warn!("list {} failed: {}", dir, e);
                self.last_error = Some(format!("List {}: {}", dir, e));
            }
        }
    }

    pub fn handle_search_loaded(
        &mut self,
        generation: u64,
        dir: String,
        query: String,
        result: Result<Vec<FileRecord>, String>,
    ) {
        if generation != self.listing_generation || self.search.as_deref() != Some(query.as_str())
        {
            log::debug!("dropping stale search {:?} in {}", query, dir);
            return;
        }
        self.loading = false;
        match result {
            Ok(entries) => {
                let n = entries.len();
                let plural = if n == 1 { "" } else { "es" };
                self.notice = Some(format!("{} match{} for \"{}\"", n, plural, query));
                self.entries = entries;
                self.apply_view();
            }
            Err(e) => {
                log::warn!("search {:?} in {} failed: {}", query, dir, e);
                self.last_error = Some(format!("Search: {}", e));
            }
        }
    }

    pub fn handle_tree_loaded(&mut self, result: Result<DirTree, String>) {
        match result {
            Ok(tree) => self.apply_tree(tree),
            Err(e) => {
                log::warn!("file tree failed: {}", e);
                self.last_error = Some(format!("Tree: {}", e));
            }
        }
    }

    fn apply_tree(&mut self, tree: DirTree) {
        let first_load = !self.tree.is_loaded();
        self.tree.replace(tree);
        if first_load {
            self.tree.reveal(&self.current_dir);
        }
        self.ensure_tree_visible();
    }

    pub fn handle_disk_loaded(&mut self, result: Result<DiskSpace, String>) {
        match result {
            Ok(disk) => self.disk = Some(disk),
            // keep the last known figure; the gauge is informational
            Err(e) => log::warn!("disk space failed: {}", e),
        }
    }

    pub fn handle_logs_loaded(&mut self, target: String, result: Result<Vec<LogEntry>, String>) {
        if let Some(Dialog::History {
            target: ref open,
            ref mut entries,
            ..
        }) = self.dialog
        {
            if *open == target {
                *entries = Some(result);
            }
        }
    }

    pub fn handle_operation_done(&mut self, op: Operation, result: Result<String, String>) {
        let ok = result.is_ok();
        match result {
            Ok(msg) => {
                log::info!("{}", msg);
                self.notice = Some(msg);
                self.last_error = None;
            }
            Err(e) => {
                log::warn!("operation failed: {}", e);
                self.notice = None;
                self.last_error = Some(e);
            }
        }

        let mut next_dir = None;
        match op {
            Operation::Download => return,
            Operation::Delete { ref paths } if ok => {
                self.clipboard.forget(paths);
                self.selection.clear();
                let mut dir = self.current_dir.clone();
                while paths.iter().any(|p| path::is_same_or_ancestor(p, &dir)) && !path::is_root(&dir)
                {
                    dir = path::parent(&dir);
                }
                if dir != self.current_dir {
                    next_dir = Some(dir);
                }
            }
            Operation::Rename { ref from, ref to } if ok => {
                self.clipboard.forget(std::slice::from_ref(from));
                if path::is_same_or_ancestor(from, &self.current_dir) {
                    next_dir = Some(path::rebase(&self.current_dir, from, to));
                }
            }
            Operation::Move {
                ref paths,
                ref destination,
            } if ok => {
                if self.clipboard.paths() == paths.as_slice() {
                    self.clipboard.clear();
                } else {
                    self.clipboard.forget(paths);
                }
                self.selection.clear();
                for moved in paths {
                    if path::is_same_or_ancestor(moved, &self.current_dir) {
                        let landed = path::join(destination, &path::file_name(moved));
                        next_dir = Some(path::rebase(&self.current_dir, moved, &landed));
                    }
                }
            }
            _ => {}
        }

        match next_dir {
            Some(dir) => self.enter_dir(dir),
            None => self.reload_listing(),
        }
        self.reload_tree();
    }

    pub fn handle_server_change(&mut self, change: ServerChange) {
        match change {
            ServerChange::TreeStale => self.reload_tree(),
            ServerChange::Tree(tree) => self.apply_tree(tree),
            ServerChange::Changed(changed) => {
                if changed == self.current_dir || path::parent(&changed) == self.current_dir {
                    self.reload_listing();
                }
            }
        }
    }

    pub fn set_push_status(&mut self, connected: bool) {
        self.push_connected = connected;
    }

    /// Rebuild the visible listing from the raw entries, keeping the
    /// selection and cursor on the same paths.
    fn apply_view(&mut self) {
        let remembered = self.selection.selected_paths(&self.records);
        let cursor_path = self
            .records
            .get(self.selection.cursor())
            .map(|r| r.path.clone());

        let mut records: Vec<FileRecord> = self
            .entries
            .iter()
            .filter(|r| self.show_hidden || !r.is_hidden())
            .cloned()
            .collect();
        sort::sort_records(&mut records, self.sort_key, self.sort_order);
        self.records = records;

        self.selection
            .restore(&remembered, cursor_path.as_deref(), &self.records);
        self.ensure_listing_visible();
    }

    // --- Navigation ---

    pub fn navigate_to(&mut self, dir: &str) {
        let dir = path::normalize(dir);
        if dir == self.current_dir {
            if self.search.take().is_some() {
                self.selection.reset();
                self.listing_offset = 0;
            }
            self.reload_listing();
            return;
        }
        self.nav.visit(&self.current_dir);
        self.enter_dir(dir);
    }

    fn enter_dir(&mut self, dir: String) {
        log::debug!("entering {}", dir);
        self.current_dir = dir;
        self.search = None;
        self.entries.clear();
        self.records.clear();
        self.selection.reset();
        self.listing_offset = 0;
        self.context_menu = None;
        self.last_click = None;
        self.last_error = None;
        self.tree.reveal(&self.current_dir);
        self.ensure_tree_visible();
        self.reload_listing();
    }

    pub fn go_parent(&mut self) {
        if !path::is_root(&self.current_dir) {
            let parent = path::parent(&self.current_dir);
            self.navigate_to(&parent);
        }
    }

    pub fn go_back(&mut self) {
        if let Some(dir) = self.nav.back(&self.current_dir) {
            self.enter_dir(dir);
        }
    }

    pub fn go_forward(&mut self) {
        if let Some(dir) = self.nav.forward(&self.current_dir) {
            self.enter_dir(dir);
        }
    }

    /// Open a listing entry: enter directories, offer to download files.
    pub fn open_index(&mut self, index: usize) {
        let Some(rec) = self.records.get(index).cloned() else {
            return;
        };
        if rec.is_dir {
            self.navigate_to(&rec.path);
        } else {
            self.open_download_for(vec![rec]);
        }
    }

    pub fn open_cursor(&mut self) {
        match self.focus {
            Pane::Listing => self.open_index(self.selection.cursor()),
            Pane::Tree => {
                if let Some(dir) = self.tree.cursor_path().map(String::from) {
                    self.tree.expand(&dir);
                    self.navigate_to(&dir);
                }
            }
        }
    }

    pub fn toggle_focus(&mut self) {
        self.focus = match self.focus {
            Pane::Tree => Pane::Listing,
            Pane::Listing => Pane::Tree,
        };
    }

    // --- Listing cursor and selection ---

    pub fn move_cursor(&mut self, delta: isize) {
        self.selection.move_cursor(delta, self.records.len());
        self.ensure_listing_visible();
    }

    pub fn extend_cursor(&mut self, delta: isize) {
        let len = self.records.len();
        if len == 0 {
            return;
        }
        let target = (self.selection.cursor() as isize + delta).clamp(0, len as isize - 1);
        self.selection.extend_to(target as usize);
        self.ensure_listing_visible();
    }

    pub fn toggle_cursor(&mut self) {
        let cursor = self.selection.cursor();
        if cursor < self.records.len() {
            self.selection.toggle(cursor);
        }
    }

    pub fn select_all(&mut self) {
        self.selection.select_all(self.records.len());
    }

    pub fn jump_top(&mut self) {
        match self.focus {
            Pane::Listing => {
                self.selection.set_cursor(0, self.records.len());
                self.ensure_listing_visible();
            }
            Pane::Tree => {
                self.tree.top();
                self.ensure_tree_visible();
            }
        }
    }

    pub fn jump_bottom(&mut self) {
        match self.focus {
            Pane::Listing => {
                let len = self.records.len();
                self.selection.set_cursor(len.saturating_sub(1), len);
                self.ensure_listing_visible();
            }
            Pane::Tree => {
                self.tree.bottom();
                self.ensure_tree_visible();
            }
        }
    }

    pub fn page(&mut self, down: bool) {
        let height = self.listing_height().max(1) as isize;
        self.move_cursor(if down { height } else { -height });
    }

    /// Esc outside of overlays: leave search, else drop the selection.
    pub fn escape(&mut self) {
        if self.search.is_some() {
            self.end_search();
        } else {
            self.selection.clear();
            self.notice = None;
        }
    }

    /// Entries the next operation acts on: the selection in the listing,
    /// or the directory under the tree cursor.
    pub fn targets(&self) -> Vec<FileRecord> {
        match self.focus {
            Pane::Listing => self
                .selection
                .effective(self.records.len())
                .into_iter()
                .filter_map(|i| self.records.get(i).cloned())
                .collect(),
            Pane::Tree => match self.tree.cursor_path() {
                Some(dir) if !path::is_root(dir) => vec![FileRecord::directory(dir)],
                _ => Vec::new(),
            },
        }
    }

    fn single_target(&mut self, verb: &str) -> Option<FileRecord> {
        let mut targets = self.targets();
        if targets.len() == 1 {
            targets.pop()
        } else {
            self.notice = Some(format!("Select a single item to {}", verb));
            None
        }
    }

    /// Known entries of `dir`, for name clash checks.
    fn siblings_of(&self, dir: &str) -> Vec<FileRecord> {
        self.entries
            .iter()
            .filter(|r| path::parent(&r.path) == dir)
            .cloned()
            .collect()
    }

    // --- Sorting and filtering ---

    pub fn cycle_sort(&mut self) {
        self.sort_key = self.sort_key.next();
        self.apply_view();
    }

    pub fn toggle_order(&mut self) {
        self.sort_order = self.sort_order.toggle();
        self.apply_view();
    }

    pub fn toggle_hidden(&mut self) {
        self.show_hidden = !self.show_hidden;
        self.apply_view();
    }

    // --- Tree pane ---

    pub fn tree_up(&mut self) {
        self.tree.up();
        self.ensure_tree_visible();
    }

    pub fn tree_down(&mut self) {
        self.tree.down();
        self.ensure_tree_visible();
    }

    pub fn tree_collapse(&mut self) {
        self.tree.collapse_or_parent();
        self.ensure_tree_visible();
    }

    pub fn tree_expand(&mut self) {
        self.tree.expand_or_child();
        self.ensure_tree_visible();
    }

    // --- Clipboard ---

    pub fn cut_selection(&mut self) {
        let targets = self.targets();
        self.cut(&targets);
    }

    fn cut(&mut self, records: &[FileRecord]) {
        if records.is_empty() {
            return;
        }
        self.clipboard
            .cut(records.iter().map(|r| r.path.clone()).collect());
        let n = self.clipboard.paths().len();
        self.notice = Some(format!("Cut {} item{}", n, if n == 1 { "" } else { "s" }));
    }

    pub fn paste_into(&mut self, dest: &str) {
        if self.clipboard.is_empty() {
            self.notice = Some("Nothing to paste".to_string());
            return;
        }
        let sources: Vec<FileRecord> = self
            .clipboard
            .paths()
            .iter()
            .map(|p| {
                self.entries
                    .iter()
                    .find(|r| r.path == *p)
                    .cloned()
                    .unwrap_or_else(|| FileRecord::directory(p))
            })
            .collect();
        if let Err(msg) = dialog::validate_move(&sources, dest) {
            self.last_error = Some(msg);
            return;
        }
        let paths = self.clipboard.paths().to_vec();
        let dest = path::normalize(dest);
        self.notice = Some(format!("Moving to {}", dest));
        self.spawn(|client, tx| loader::move_to(client, tx, paths, dest));
    }

    // --- Context menu ---

    fn context_target(&self) -> ContextTarget {
        let mut targets = self.targets();
        match targets.len() {
            0 => ContextTarget::Background(self.current_dir.clone()),
            1 => match targets.pop() {
                Some(rec) => ContextTarget::Single(Box::new(rec)),
                None => ContextTarget::Background(self.current_dir.clone()),
            },
            _ => ContextTarget::Multiple(targets),
        }
    }

    /// Keyboard-opened menu, anchored next to the cursor row.
    pub fn open_context_menu_at_cursor(&mut self) {
        let regions = layout::regions(self.viewport);
        let anchor = match self.focus {
            Pane::Listing => {
                let body = layout::listing_body(regions.listing);
                let cursor = self.selection.cursor();
                // the menu acts on the row it is drawn next to
                if cursor < self.records.len() && !self.selection.is_selected(cursor) {
                    self.selection.click(cursor);
                }
                layout::row_rects(body, self.listing_offset, self.records.len())
                    .into_iter()
                    .find(|(i, _)| *i == cursor)
                    .map(|(_, r)| (r.x + 2, r.y + 1))
                    .unwrap_or((body.x + 2, body.y))
            }
            Pane::Tree => {
                let body = layout::pane_inner(regions.tree);
                let row = self.tree.cursor().saturating_sub(self.tree_offset) as u16;
                (body.x + 2, body.y + row + 1)
            }
        };
        let target = self.context_target();
        self.context_menu = Some(ContextMenu::new(target, !self.clipboard.is_empty(), anchor));
    }

    pub fn activate_menu(&mut self) {
        let Some(menu) = self.context_menu.take() else {
            return;
        };
        if let Some(action) = menu.activate() {
            self.run_menu_action(action, &menu);
        }
    }

    fn run_menu_action(&mut self, action: MenuAction, menu: &ContextMenu) {
        let records = menu.records();
        let dir = match menu.target {
            ContextTarget::Background(ref dir) => dir.clone(),
            ContextTarget::Single(ref rec) if rec.is_dir => rec.path.clone(),
            _ => self.current_dir.clone(),
        };
        match action {
            MenuAction::Open => {
                if let Some(rec) = records.first() {
                    if rec.is_dir {
                        self.navigate_to(&rec.path);
                    } else {
                        self.open_download_for(records.clone());
                    }
                }
            }
            MenuAction::Download => self.open_download_for(records),
            MenuAction::Rename => {
                if let Some(rec) = records.into_iter().next() {
                    self.open_rename_for(rec);
                }
            }
            MenuAction::MoveTo => self.open_move_for(records),
            MenuAction::Cut => self.cut(&records),
            MenuAction::Paste => self.paste_into(&dir),
            MenuAction::History => {
                if let Some(rec) = records.first() {
                    self.open_history_for(rec.path.clone());
                }
            }
            MenuAction::Properties => {
                if let Some(rec) = records.into_iter().next() {
                    self.dialog = Some(Dialog::Properties(Box::new(rec)));
                }
            }
            MenuAction::Delete => self.open_delete_for(records),
            MenuAction::NewFolder => self.open_new_folder_in(dir),
            MenuAction::Upload => self.open_upload_to(dir),
            MenuAction::Refresh => self.refresh(),
            MenuAction::SelectAll => {
                self.focus = Pane::Listing;
                self.select_all();
            }
        }
    }

    // --- Dialogs ---

    fn open_dialog(&mut self, dialog: Dialog) {
        self.context_menu = None;
        self.dialog_error = None;
        self.dialog = Some(dialog);
    }

    pub fn close_dialog(&mut self) {
        self.dialog = None;
        self.dialog_error = None;
    }

    pub fn open_rename(&mut self) {
        if let Some(rec) = self.single_target("rename") {
            self.open_rename_for(rec);
        }
    }

    fn open_rename_for(&mut self, target: FileRecord) {
        let input = dialog::line_input(&target.name);
        self.open_dialog(Dialog::Rename { target, input });
    }

    pub fn open_new_folder(&mut self) {
        let parent = match self.focus {
            Pane::Tree => self
                .tree
                .cursor_path()
                .map(String::from)
                .unwrap_or_else(|| self.current_dir.clone()),
            Pane::Listing => self.current_dir.clone(),
        };
        self.open_new_folder_in(parent);
    }

    fn open_new_folder_in(&mut self, parent: String) {
        self.open_dialog(Dialog::NewFolder {
            parent,
            input: dialog::line_input(""),
        });
    }

    pub fn open_upload(&mut self) {
        let dest = self.current_dir.clone();
        self.open_upload_to(dest);
    }

    fn open_upload_to(&mut self, dest: String) {
        self.open_dialog(Dialog::Upload {
            dest,
            input: dialog::line_input(""),
        });
    }

    pub fn open_download(&mut self) {
        let targets = self.targets();
        self.open_download_for(targets);
    }

    fn open_download_for(&mut self, records: Vec<FileRecord>) {
        if records.is_empty() {
            return;
        }
        let input = dialog::line_input(&self.download_dir.to_string_lossy());
        self.open_dialog(Dialog::Download { records, input });
    }

    pub fn open_move(&mut self) {
        let targets = self.targets();
        self.open_move_for(targets);
    }

    fn open_move_for(&mut self, sources: Vec<FileRecord>) {
        if sources.is_empty() {
            return;
        }
        if !self.tree.is_loaded() {
            self.reload_tree();
        }
        let mut picker = TreeState::default();
        picker.replace(self.tree.tree().clone());
        picker.reveal(&self.current_dir);
        self.open_dialog(Dialog::Move { sources, picker });
    }

    pub fn open_delete(&mut self) {
        let targets = self.targets();
        self.open_delete_for(targets);
    }

    fn open_delete_for(&mut self, targets: Vec<FileRecord>) {
        if !targets.is_empty() {
            self.open_dialog(Dialog::ConfirmDelete { targets });
        }
    }

    pub fn open_search(&mut self) {
        let input = dialog::line_input(self.search.as_deref().unwrap_or(""));
        self.open_dialog(Dialog::Search {
            dir: self.current_dir.clone(),
            input,
        });
    }

    pub fn end_search(&mut self) {
        if self.search.take().is_some() {
            self.notice = None;
            self.selection.reset();
            self.listing_offset = 0;
            self.reload_listing();
        }
    }

    pub fn open_history(&mut self) {
        if let Some(rec) = self.single_target("show history for") {
            self.open_history_for(rec.path);
        }
    }

    fn open_history_for(&mut self, target: String) {
        self.open_dialog(Dialog::History {
            target: target.clone(),
            entries: None,
            scroll: 0,
        });
        self.spawn(|client, tx| loader::load_logs(client, tx, target));
    }

    pub fn open_properties(&mut self) {
        if let Some(rec) = self.single_target("inspect") {
            self.open_dialog(Dialog::Properties(Box::new(rec)));
        }
    }

    /// Forward a key to the open dialog's text input.
    pub fn dialog_input(&mut self, key: KeyEvent) {
        if let Some(input) = self.dialog.as_mut().and_then(Dialog::input_mut) {
            input.input(key);
            self.dialog_error = None;
        }
    }

    pub fn picker_mut(&mut self) -> Option<&mut TreeState> {
        match self.dialog {
            Some(Dialog::Move { ref mut picker, .. }) => Some(picker),
            _ => None,
        }
    }

    pub fn scroll_history(&mut self, delta: isize) {
        if let Some(Dialog::History {
            ref mut scroll,
            ref entries,
            ..
        }) = self.dialog
        {
            let len = match entries {
                Some(Ok(list)) => list.len(),
                _ => 0,
            };
            *scroll = (*scroll as isize + delta).clamp(0, len.saturating_sub(1) as isize) as usize;
        }
    }

    /// Confirm the open dialog. Invalid input keeps it open with a message.
    pub fn submit_dialog(&mut self) {
        let Some(dialog) = self.dialog.take() else {
            return;
        };
        self.dialog_error = None;
        if let Err((dialog, message)) = self.run_dialog(dialog) {
            self.dialog = Some(dialog);
            self.dialog_error = Some(message);
        }
    }

    fn run_dialog(&mut self, dialog: Dialog) -> Result<(), (Dialog, String)> {
        match dialog {
            Dialog::Rename { target, input } => {
                let text = dialog::input_text(&input);
                let siblings = self.siblings_of(&path::parent(&target.path));
                match dialog::validate_name(&text, &siblings, Some(&target.name)) {
                    Ok(NameCheck::Valid(name)) => {
                        let from = target.path;
                        self.spawn(|client, tx| loader::rename(client, tx, from, name));
                        Ok(())
                    }
                    Ok(NameCheck::Unchanged) => Ok(()),
                    Err(msg) => Err((Dialog::Rename { target, input }, msg)),
                }
            }
            Dialog::NewFolder { parent, input } => {
                let text = dialog::input_text(&input);
                match dialog::validate_name(&text, &self.siblings_of(&parent), None) {
                    Ok(NameCheck::Valid(name)) => {
                        let dir = path::join(&parent, &name);
                        self.spawn(|client, tx| loader::mkdir(client, tx, dir));
                        Ok(())
                    }
                    Ok(NameCheck::Unchanged) => Ok(()),
                    Err(msg) => Err((Dialog::NewFolder { parent, input }, msg)),
                }
            }
            Dialog::Upload { dest, input } => {
                let text = dialog::input_text(&input);
                if text.trim().is_empty() {
                    return Err((Dialog::Upload { dest, input }, "Enter a local path".into()));
                }
                let local = transfer::expand_home(&text);
                if !local.exists() {
                    let msg = format!("{} does not exist", local.display());
                    return Err((Dialog::Upload { dest, input }, msg));
                }
                self.notice = Some(format!("Uploading {}", local.display()));
                self.spawn(|client, tx| loader::upload(client, tx, local, dest));
                Ok(())
            }
            Dialog::Download { records, input } => {
                let text = dialog::input_text(&input);
                let local_dir = if text.trim().is_empty() {
                    self.download_dir.clone()
                } else {
                    transfer::expand_home(&text)
                };
                if local_dir.is_file() {
                    let msg = format!("{} is a file", local_dir.display());
                    return Err((Dialog::Download { records, input }, msg));
                }
                self.notice = Some(format!("Downloading to {}", local_dir.display()));
                self.spawn(|client, tx| loader::download(client, tx, records, local_dir));
                Ok(())
            }
            Dialog::Move { sources, picker } => {
                let destination = picker.cursor_path().unwrap_or(path::ROOT).to_string();
                if let Err(msg) = dialog::validate_move(&sources, &destination) {
                    return Err((Dialog::Move { sources, picker }, msg));
                }
                let paths = sources.into_iter().map(|r| r.path).collect();
                self.spawn(|client, tx| loader::move_to(client, tx, paths, destination));
                Ok(())
            }
            Dialog::ConfirmDelete { targets } => {
                let paths = targets.into_iter().map(|r| r.path).collect();
                self.spawn(|client, tx| loader::delete(client, tx, paths));
                Ok(())
            }
            Dialog::Search { dir, input } => {
                let query = dialog::input_text(&input).trim().to_string();
                if query.is_empty() {
                    self.end_search();
                    return Ok(());
                }
                if dir != self.current_dir {
                    self.navigate_to(&dir);
                }
                self.search = Some(query);
                self.selection.reset();
                self.listing_offset = 0;
                self.reload_listing();
                Ok(())
            }
            Dialog::Properties(_) | Dialog::History { .. } => Ok(()),
        }
    }

    // --- Mouse ---

    pub fn set_viewport(&mut self, area: Rect) {
        self.viewport = area;
        self.ensure_listing_visible();
        self.ensure_tree_visible();
    }

    fn listing_body(&self) -> Rect {
        layout::listing_body(layout::regions(self.viewport).listing)
    }

    fn tree_body(&self) -> Rect {
        layout::pane_inner(layout::regions(self.viewport).tree)
    }

    fn listing_height(&self) -> usize {
        self.listing_body().height as usize
    }

    fn ensure_listing_visible(&mut self) {
        let height = self.listing_height();
        self.listing_offset =
            scroll_into_view(self.listing_offset, self.selection.cursor(), height)
                .min(self.records.len().saturating_sub(1));
    }

    fn ensure_tree_visible(&mut self) {
        let height = self.tree_body().height as usize;
        self.tree_offset = scroll_into_view(self.tree_offset, self.tree.cursor(), height);
    }

    pub fn mouse_down(&mut self, col: u16, row: u16, modifiers: KeyModifiers) {
        if self.show_help {
            self.show_help = false;
            return;
        }
        if self.dialog.is_some() {
            return;
        }
        if let Some(mut menu) = self.context_menu.take() {
            // a click outside just closes the menu
            if let Some(idx) = layout::menu_item_at(&menu, self.viewport, col, row) {
                menu.select(idx);
                self.context_menu = Some(menu);
                self.activate_menu();
            }
            return;
        }

        let regions = layout::regions(self.viewport);
        if layout::contains(regions.tree, col, row) {
            self.focus = Pane::Tree;
            self.click_tree(col, row);
            return;
        }
        let body = self.listing_body();
        if !layout::contains(body, col, row) {
            return;
        }
        self.focus = Pane::Listing;

        let ctrl = modifiers.contains(KeyModifiers::CONTROL);
        let shift = modifiers.contains(KeyModifiers::SHIFT);
        match layout::row_at(body, self.listing_offset, self.records.len(), col, row) {
            Some(idx) if ctrl => self.selection.toggle(idx),
            Some(idx) if shift => self.selection.extend_to(idx),
            Some(idx) => {
                let double = self.last_click.is_some_and(|(at, i)| {
                    i == idx && at.elapsed() < Duration::from_millis(DOUBLE_CLICK_MS)
                });
                if double {
                    self.last_click = None;
                    self.open_index(idx);
                    return;
                }
                self.last_click = Some((Instant::now(), idx));
                self.selection.click(idx);
            }
            None => {
                if !ctrl && !shift {
                    self.selection.clear();
                }
            }
        }
        self.selection.begin_marquee((col, row), ctrl || shift);
    }

    pub fn mouse_drag(&mut self, col: u16, row: u16) {
        if self.selection.marquee().is_none() {
            return;
        }
        let body = self.listing_body();
        if body.width == 0 || body.height == 0 {
            return;
        }
        let point = (
            col.clamp(body.x, body.right() - 1),
            row.clamp(body.y, body.bottom() - 1),
        );
        let rows = layout::row_rects(body, self.listing_offset, self.records.len());
        self.selection.update_marquee(point, &rows);
    }

    pub fn mouse_up(&mut self) {
        if self.selection.end_marquee() {
            self.last_click = None;
        }
    }

    pub fn mouse_right(&mut self, col: u16, row: u16) {
        if self.dialog.is_some() {
            return;
        }
        self.context_menu = None;
        self.selection.cancel_marquee();

        let regions = layout::regions(self.viewport);
        if layout::contains(regions.tree, col, row) {
            let body = self.tree_body();
            let Some(idx) = layout::row_at(body, self.tree_offset, self.tree.rows().len(), col, row)
            else {
                return;
            };
            self.focus = Pane::Tree;
            self.tree.set_cursor(idx);
        } else if layout::contains(self.listing_body(), col, row) {
            self.focus = Pane::Listing;
            let body = self.listing_body();
            match layout::row_at(body, self.listing_offset, self.records.len(), col, row) {
                Some(idx) if !self.selection.is_selected(idx) => self.selection.click(idx),
                Some(idx) => self.selection.set_cursor(idx, self.records.len()),
                None => self.selection.clear(),
            }
            // background menu when nothing is selected
            if self.selection.is_empty() {
                self.context_menu = Some(ContextMenu::new(
                    ContextTarget::Background(self.current_dir.clone()),
                    !self.clipboard.is_empty(),
                    (col, row),
                ));
                return;
            }
        } else {
            return;
        }
        let target = self.context_target();
        self.context_menu = Some(ContextMenu::new(target, !self.clipboard.is_empty(), (col, row)));
    }

    pub fn mouse_move(&mut self, col: u16, row: u16) {
        if let Some(ref mut menu) = self.context_menu {
            if let Some(idx) = layout::menu_item_at(menu, self.viewport, col, row) {
                menu.select(idx);
            }
        }
    }

    pub fn scroll(&mut self, col: u16, row: u16, delta: isize) {
        if let Some(ref mut menu) = self.context_menu {
            if delta > 0 {
                menu.next();
            } else {
                menu.prev();
            }
            return;
        }
        let regions = layout::regions(self.viewport);
        if layout::contains(regions.tree, col, row) {
            let max = self
                .tree
                .rows()
                .len()
                .saturating_sub(self.tree_body().height as usize);
            self.tree_offset = (self.tree_offset as isize + delta * 3).clamp(0, max as isize) as usize;
        } else if layout::contains(regions.listing, col, row) {
            let max = self.records.len().saturating_sub(self.listing_height());
            self.listing_offset =
                (self.listing_offset as isize + delta * 3).clamp(0, max as isize) as usize;
        }
    }

    fn click_tree(&mut self, col: u16, row: u16) {
        let body = self.tree_body();
        let Some(idx) = layout::row_at(body, self.tree_offset, self.tree.rows().len(), col, row)
        else {
            return;
        };
        let Some(clicked) = self.tree.rows().get(idx).cloned() else {
            return;
        };
        self.tree.set_cursor(idx);
        // the arrow in front of the name folds without navigating
        let arrow_end = body.x + (clicked.depth as u16) * 2 + 2;
        if clicked.has_children && clicked.depth > 0 && col < arrow_end {
            self.tree.toggle(&clicked.path);
        } else {
            self.navigate_to(&clicked.path);
        }
        self.ensure_tree_visible();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn test_app() -> App {
        let client =
            FileServerClient::new("http://127.0.0.1:9", Duration::from_secs(1)).unwrap();
        let mut app = App::new(&Config::default(), client);
        app.set_viewport(Rect::new(0, 0, 100, 30));
        app
    }

    fn rec(p: &str, is_dir: bool) -> FileRecord {
        FileRecord {
            name: path::file_name(p),
            path: p.to_string(),
            size: 0,
            created: None,
            modified: None,
            is_dir,
            is_shortcut: false,
            color: None,
        }
    }

    fn load(app: &mut App, entries: Vec<FileRecord>) {
        app.reload_listing();
        let generation = app.listing_generation();
        let dir = app.current_dir.clone();
        app.handle_listing_loaded(generation, dir, Ok(entries));
    }

    fn names(app: &App) -> Vec<&str> {
        app.records.iter().map(|r| r.name.as_str()).collect()
    }

    #[test]
    fn stale_listing_is_dropped() {
        let mut app = test_app();
        app.reload_listing();
        let old = app.listing_generation();
        app.reload_listing();
        app.handle_listing_loaded(old, "/".into(), Ok(vec![rec("/old.txt", false)]));
        assert!(app.records.is_empty());
        let current = app.listing_generation();
        app.handle_listing_loaded(current, "/".into(), Ok(vec![rec("/new.txt", false)]));
        assert_eq!(names(&app), vec!["new.txt"]);
    }

    #[test]
    fn listing_is_sorted_filtered_and_keeps_selection() {
        let mut app = test_app();
        load(
            &mut app,
            vec![
                rec("/file10", false),
                rec("/.hidden", false),
                rec("/docs", true),
                rec("/file2", false),
            ],
        );
        assert_eq!(names(&app), vec!["docs", "file2", "file10"]);

        app.selection.click(2);
        load(
            &mut app,
            vec![
                rec("/a", false),
                rec("/file10", false),
                rec("/docs", true),
                rec("/file2", false),
            ],
        );
        assert_eq!(names(&app), vec!["docs", "a", "file2", "file10"]);
        assert!(app.selection.is_selected(3));
        assert_eq!(app.selection.len(), 1);

        app.toggle_hidden();
        app.toggle_order();
        // directories stay first when descending
        assert_eq!(names(&app)[0], "docs");
        assert_eq!(app.selection.selected_paths(&app.records), vec!["/file10"]);
    }

    #[test]
    fn back_and_forward_walk_history() {
        let mut app = test_app();
        app.navigate_to("/docs");
        app.navigate_to("/docs/2024");
        app.go_back();
        assert_eq!(app.current_dir, "/docs");
        app.go_back();
        assert_eq!(app.current_dir, "/");
        app.go_forward();
        assert_eq!(app.current_dir, "/docs");
        app.go_parent();
        assert_eq!(app.current_dir, "/");
        assert!(!app.nav.can_go_forward());
    }

    #[test]
    fn invalid_rename_keeps_dialog_open() {
        let mut app = test_app();
        load(&mut app, vec![rec("/a.txt", false), rec("/b.txt", false)]);
        app.selection.click(0);
        app.open_rename();
        if let Some(input) = app.dialog.as_mut().and_then(Dialog::input_mut) {
            *input = dialog::line_input("b.txt");
        }
        app.submit_dialog();
        assert!(matches!(app.dialog, Some(Dialog::Rename { .. })));
        assert!(app.dialog_error.as_deref().unwrap_or("").contains("already exists"));

        if let Some(input) = app.dialog.as_mut().and_then(Dialog::input_mut) {
            *input = dialog::line_input("c.txt");
        }
        app.submit_dialog();
        assert!(app.dialog.is_none());
        assert!(app.dialog_error.is_none());
    }

    #[test]
    fn deleting_current_dir_moves_to_surviving_parent() {
        let mut app = test_app();
        app.navigate_to("/docs/2024/q1");
        app.clipboard.cut(vec!["/docs/2024/q1/a".into(), "/music".into()]);
        app.handle_operation_done(
            Operation::Delete {
                paths: vec!["/docs/2024".into()],
            },
            Ok("Deleted 2024".into()),
        );
        assert_eq!(app.current_dir, "/docs");
        assert_eq!(app.clipboard.paths(), &["/music".to_string()]);
        assert_eq!(app.notice.as_deref(), Some("Deleted 2024"));
    }

    #[test]
    fn rename_of_ancestor_follows_current_dir() {
        let mut app = test_app();
        app.navigate_to("/docs/2024");
        app.handle_operation_done(
            Operation::Rename {
                from: "/docs".into(),
                to: "/papers".into(),
            },
            Ok("Renamed to papers".into()),
        );
        assert_eq!(app.current_dir, "/papers/2024");
    }

    #[test]
    fn paste_clears_clipboard_after_move() {
        let mut app = test_app();
        app.clipboard.cut(vec!["/a.txt".into()]);
        app.handle_operation_done(
            Operation::Move {
                paths: vec!["/a.txt".into()],
                destination: "/docs".into(),
            },
            Ok("Moved".into()),
        );
        assert!(app.clipboard.is_empty());
    }

    #[test]
    fn failed_operation_sets_error() {
        let mut app = test_app();
        app.handle_operation_done(
            Operation::Mkdir { path: "/x".into() },
            Err("already exists".into()),
        );
        assert_eq!(app.last_error.as_deref(), Some("already exists"));
    }

    #[test]
    fn paste_into_own_subfolder_is_rejected() {
        let mut app = test_app();
        load(&mut app, vec![rec("/docs", true)]);
        app.clipboard.cut(vec!["/docs".into()]);
        app.paste_into("/docs/2024");
        assert!(app.last_error.is_some());
        assert!(!app.clipboard.is_empty());
    }

    #[test]
    fn server_change_reloads_only_relevant_dirs() {
        let mut app = test_app();
        app.navigate_to("/docs");
        let before = app.listing_generation();
        app.handle_server_change(ServerChange::Changed("/music".into()));
        assert_eq!(app.listing_generation(), before);
        app.handle_server_change(ServerChange::Changed("/docs/report.pdf".into()));
        assert_eq!(app.listing_generation(), before + 1);
        app.handle_server_change(ServerChange::Changed("/docs".into()));
        assert_eq!(app.listing_generation(), before + 2);
    }

    #[test]
    fn mouse_click_ctrl_click_and_marquee() {
        let mut app = test_app();
        load(
            &mut app,
            (0..6).map(|i| rec(&format!("/f{}", i), false)).collect(),
        );
        let body = app.listing_body();
        let x = body.x + 2;

        app.mouse_down(x, body.y + 1, KeyModifiers::NONE);
        app.mouse_up();
        assert_eq!(app.selection.indices().collect::<Vec<_>>(), vec![1]);

        app.mouse_down(x, body.y + 3, KeyModifiers::CONTROL);
        app.mouse_up();
        assert_eq!(app.selection.indices().collect::<Vec<_>>(), vec![1, 3]);

        // plain drag from row 2 to row 4 replaces the selection
        app.mouse_down(x, body.y + 2, KeyModifiers::NONE);
        app.mouse_drag(x + 5, body.y + 4);
        app.mouse_up();
        assert_eq!(app.selection.indices().collect::<Vec<_>>(), vec![2, 3, 4]);

        // clicking empty space below the rows clears
        app.mouse_down(x, body.y + 10, KeyModifiers::NONE);
        app.mouse_up();
        assert!(app.selection.is_empty());
    }

    #[test]
    fn right_click_targets_selection_or_row() {
        let mut app = test_app();
        load(
            &mut app,
            vec![rec("/a", false), rec("/b", false), rec("/c", false)],
        );
        let body = app.listing_body();
        app.selection.click(0);
        app.selection.toggle(1);

        app.mouse_right(body.x + 1, body.y + 1);
        match app.context_menu {
            Some(ContextMenu {
                target: ContextTarget::Multiple(ref recs),
                ..
            }) => assert_eq!(recs.len(), 2),
            ref other => panic!("unexpected menu {:?}", other),
        }

        app.mouse_right(body.x + 1, body.y + 2);
        match app.context_menu {
            Some(ContextMenu {
                target: ContextTarget::Single(ref rec),
                ..
            }) => assert_eq!(rec.name, "c"),
            ref other => panic!("unexpected menu {:?}", other),
        }
        assert_eq!(app.selection.len(), 1);

        app.mouse_right(body.x + 1, body.y + 8);
        assert!(matches!(
            app.context_menu,
            Some(ContextMenu {
                target: ContextTarget::Background(_),
                ..
            })
        ));
    }

    #[test]
    fn menu_click_runs_action() {
        let mut app = test_app();
        load(&mut app, vec![rec("/a.txt", false)]);
        let body = app.listing_body();
        app.mouse_right(body.x + 1, body.y);
        let menu = app.context_menu.clone().unwrap();
        let rename_idx = menu
            .items
            .iter()
            .position(|a| *a == MenuAction::Rename)
            .unwrap();
        let area = layout::menu_area(&menu, app.viewport);
        app.mouse_down(area.x + 1, area.y + 1 + rename_idx as u16, KeyModifiers::NONE);
        assert!(app.context_menu.is_none());
        assert!(matches!(app.dialog, Some(Dialog::Rename { .. })));
    }

    #[test]
    fn search_submit_and_escape() {
        let mut app = test_app();
        app.open_search();
        if let Some(input) = app.dialog.as_mut().and_then(Dialog::input_mut) {
            *input = dialog::line_input("report");
        }
        app.submit_dialog();
        assert_eq!(app.search.as_deref(), Some("report"));
        let generation = app.listing_generation();
        app.handle_search_loaded(
            generation,
            "/".into(),
            "report".into(),
            Ok(vec![rec("/docs/report.pdf", false)]),
        );
        assert_eq!(names(&app), vec!["report.pdf"]);

        app.escape();
        assert!(app.search.is_none());
    }

    #[test]
    fn history_dialog_receives_matching_logs() {
        let mut app = test_app();
        load(&mut app, vec![rec("/a.txt", false)]);
        app.open_history();
        app.handle_logs_loaded("/other".into(), Ok(Vec::new()));
        assert!(matches!(
            app.dialog,
            Some(Dialog::History { entries: None, .. })
        ));
        app.handle_logs_loaded("/a.txt".into(), Err("boom".into()));
        assert!(matches!(
            app.dialog,
            Some(Dialog::History {
                entries: Some(Err(_)),
                ..
            })
        ));
    }
}
