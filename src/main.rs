mod app;
mod config;
mod data;
mod error;
mod event;
mod model;
mod state;
mod ui;
mod watcher;

use std::fs::File;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use bytesize::ByteSize;
use clap::Parser;
use crossterm::event::{
    self as ct_event, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent,
    KeyEventKind, KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use env_logger::Env;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::Rect;
use ratatui::Terminal;

use crate::app::{App, Pane};
use crate::config::{Config, ENV_LOG, ENV_SERVER};
use crate::data::client::FileServerClient;
use crate::event::AppEvent;
use crate::model::tree::DirTree;
use crate::state::dialog::Dialog;

#[derive(Parser)]
#[command(
    name = "filedeck",
    version,
    about = "filedeck - terminal client for a remote file server",
    override_help = HELP_TEXT,
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    /// File server base URL (overrides config and FILEDECK_SERVER)
    #[arg(long, global = true)]
    server: Option<String>,

    /// Config file to use instead of the default lookup
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Where the TUI writes its log
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,
}

#[derive(clap::Subcommand)]
enum Command {
    /// List a directory
    Ls {
        #[arg(default_value = "/")]
        path: String,

        /// Include hidden entries
        #[arg(short, long)]
        all: bool,
    },
    /// Print the directory tree
    Tree,
    /// Show disk usage
    Df,
    /// Show the activity history of a file or folder
    Logs { path: String },
}

const HELP_TEXT: &str = "\
filedeck - terminal client for a remote file server

USAGE:
  filedeck [OPTIONS]              Start the TUI
  filedeck ls [PATH] [-a]         List a directory
  filedeck tree                   Print the directory tree
  filedeck df                     Show disk usage
  filedeck logs PATH              Show activity history

GLOBAL OPTIONS:
  --server <URL>      File server base URL [env: FILEDECK_SERVER]
  --config <PATH>     Config file [env: FILEDECK_CONFIG]
  --log-file <PATH>   TUI log file [default: $TMPDIR/filedeck.log]
  -h, --help          Print this help
  -V, --version       Print version

TUI KEYBINDINGS:
  Tab                Switch tree / listing
  j/k  Up/Down       Move cursor
  Shift+Up/Down      Extend selection
  Space / Ctrl+A     Toggle / select all
  Enter              Open folder, download file
  Backspace          Parent folder
  Alt+Left/Right     Back / forward
  m / F10            Context menu
  n  u  D            New folder / upload / download
  r / F2   M         Rename / move
  x  p               Cut / paste
  d / Del            Delete
  /  Esc             Search / leave search
  H  i               History / properties
  s  S  .            Sort key / order / hidden files
  R                  Refresh
  ?                  Toggle help
  q / Ctrl+C         Quit

MOUSE:
  Click, Ctrl+click, Shift+click to select; double click opens;
  drag to select a range; right click for the context menu.

LOGGING:
  FILEDECK_LOG or RUST_LOG set the log filter [default: info].";

fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_target = match cli.command {
        None => Some(
            cli.log_file
                .clone()
                .unwrap_or_else(|| std::env::temp_dir().join("filedeck.log")),
        ),
        Some(_) => None,
    };
    init_logging(log_target.as_deref())?;

    let mut config = config::load_config(cli.config.as_deref());
    config.server_override = cli
        .server
        .clone()
        .or_else(|| std::env::var(ENV_SERVER).ok().filter(|s| !s.is_empty()));

    let client = FileServerClient::new(
        config.server_url(),
        Duration::from_secs(config.timeout_secs()),
    )
    .with_context(|| format!("cannot use server {}", config.server_url()))?;

    match cli.command {
        Some(Command::Ls { path, all }) => print_listing(&client, &path, all),
        Some(Command::Tree) => print_tree(&client),
        Some(Command::Df) => print_disk_space(&client),
        Some(Command::Logs { path }) => print_logs(&client, &path),
        None => run_tui(config, client),
    }
}

/// Log to `file` when given (the TUI owns the terminal), else to stderr.
fn init_logging(file: Option<&Path>) -> Result<()> {
    let env = if std::env::var_os(ENV_LOG).is_some() {
        Env::new().filter(ENV_LOG)
    } else {
        Env::default().default_filter_or(if file.is_some() { "info" } else { "warn" })
    };
    let mut builder = env_logger::Builder::from_env(env);
    builder.format(|buf, record| {
        writeln!(
            buf,
            "[{}] {} - {} {}",
            record.level(),
            chrono::Local::now().format("%Y-%m-%dT%H:%M:%S%.3f"),
            record.target(),
            record.args()
        )
    });
    if let Some(path) = file {
        let out = File::create(path)
            .with_context(|| format!("cannot open log file {}", path.display()))?;
        builder.target(env_logger::Target::Pipe(Box::new(out)));
    }
    // a logger may already be installed in tests
    let _ = builder.try_init();
    Ok(())
}

fn print_listing(client: &FileServerClient, dir: &str, all: bool) -> Result<()> {
    let mut records = client.list(dir)?;
    records.retain(|r| all || !r.is_hidden());
    state::sort::sort_records(
        &mut records,
        state::sort::SortKey::Name,
        state::sort::SortOrder::Asc,
    );

    let mut out = io::stdout().lock();
    for rec in &records {
        let size = if rec.is_dir {
            "-".to_string()
        } else {
            ByteSize(rec.size).to_string()
        };
        let modified = rec
            .modified
            .map(|m| m.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_else(|| "-".to_string());
        let suffix = if rec.is_dir { "/" } else { "" };
        writeln!(out, "{:>10}  {:16}  {}{}", size, modified, rec.name, suffix)?;
    }
    Ok(())
}

fn print_tree(client: &FileServerClient) -> Result<()> {
    let tree = client.file_tree()?;
    let mut out = io::stdout().lock();
    writeln!(out, "/")?;
    write_tree(&mut out, &tree, "")?;
    writeln!(out, "\n{} directories", tree.count())?;
    Ok(())
}

fn write_tree(out: &mut impl Write, tree: &DirTree, prefix: &str) -> io::Result<()> {
    let children = tree.children();
    let last = children.len().saturating_sub(1);
    for (i, (name, child)) in children.into_iter().enumerate() {
        let (branch, indent) = if i == last {
            ("└── ", "    ")
        } else {
            ("├── ", "│   ")
        };
        writeln!(out, "{}{}{}", prefix, branch, name)?;
        write_tree(out, child, &format!("{}{}", prefix, indent))?;
    }
    Ok(())
}

fn print_disk_space(client: &FileServerClient) -> Result<()> {
    let disk = client.disk_space()?;
    println!("{}", disk.summary());
    Ok(())
}

fn print_logs(client: &FileServerClient, target: &str) -> Result<()> {
    let entries = client.logs(target)?;
    let mut out = io::stdout().lock();
    if entries.is_empty() {
        writeln!(out, "no activity for {}", target)?;
    }
    for entry in &entries {
        write!(
            out,
            "{}  {:12}  {}",
            entry.timestamp.format("%Y-%m-%d %H:%M"),
            entry.event_label(),
            entry.actor
        )?;
        match entry.detail {
            Some(ref detail) => writeln!(out, "  {}", detail)?,
            None => writeln!(out)?,
        }
    }
    Ok(())
}

fn run_tui(config: Config, client: FileServerClient) -> Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Run app
    let result = run_app(&mut terminal, config, client);

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if let Err(ref e) = result {
        log::error!("fatal: {:#}", e);
        eprintln!("Error: {:#}", e);
    }
    result
}

fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    config: Config,
    client: FileServerClient,
) -> Result<()> {
    log::info!("connecting to {}", client.base_url());
    let events_url = client.endpoint("events");
    let mut app = App::new(&config, client);
    let size = terminal.size()?;
    app.set_viewport(Rect::new(0, 0, size.width, size.height));

    // Create event channel before initial load so async spawners can send results
    let (tx, rx) = mpsc::channel::<AppEvent>();
    app.event_tx = Some(tx.clone());

    app.load_all();

    // Push channel; without it the listing only changes on user actions
    let _watcher = if config.push_enabled() {
        match watcher::start_watcher(events_url, tx) {
            Ok(w) => Some(w),
            Err(e) => {
                log::warn!("push channel unavailable: {:#}", e);
                None
            }
        }
    } else {
        None
    };

    let tick_rate = Duration::from_millis(config.tick_rate());
    let mut last_tick = Instant::now();

    loop {
        // Draw only when dirty
        if app.dirty {
            terminal.draw(|f| ui::draw(f, &app))?;
            app.dirty = false;
        }

        let timeout = tick_rate.saturating_sub(last_tick.elapsed());

        // Check for crossterm events
        if ct_event::poll(timeout)? {
            match ct_event::read()? {
                Event::Key(key) if key.kind == KeyEventKind::Press => {
                    handle_key(&mut app, key);
                    app.mark_dirty();
                }
                Event::Mouse(mouse) => {
                    handle_mouse(&mut app, mouse);
                    app.mark_dirty();
                }
                Event::Resize(width, height) => {
                    app.set_viewport(Rect::new(0, 0, width, height));
                    app.mark_dirty();
                }
                _ => {}
            }
        }

        // Results from background requests and the push channel
        while let Ok(evt) = rx.try_recv() {
            match evt {
                AppEvent::ListingLoaded {
                    generation,
                    dir,
                    result,
                } => app.handle_listing_loaded(generation, dir, result),
                AppEvent::SearchLoaded {
                    generation,
                    dir,
                    query,
                    result,
                } => app.handle_search_loaded(generation, dir, query, result),
                AppEvent::TreeLoaded(result) => app.handle_tree_loaded(result),
                AppEvent::DiskSpaceLoaded(result) => app.handle_disk_loaded(result),
                AppEvent::LogsLoaded { target, result } => app.handle_logs_loaded(target, result),
                AppEvent::OperationDone { op, result } => app.handle_operation_done(op, result),
                AppEvent::ServerChanged(change) => app.handle_server_change(change),
                AppEvent::PushStatus(connected) => app.set_push_status(connected),
            }
            app.mark_dirty();
        }

        // Tick
        if last_tick.elapsed() >= tick_rate {
            last_tick = Instant::now();
            app.tick();
        }

        if app.should_quit {
            log::info!("quit");
            return Ok(());
        }
    }
}

fn handle_key(app: &mut App, key: KeyEvent) {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);

    // Global keybindings (always active)
    if key.code == KeyCode::Char('c') && ctrl {
        app.should_quit = true;
        return;
    }

    if app.show_help {
        if matches!(key.code, KeyCode::Esc | KeyCode::Char('?') | KeyCode::Char('q')) {
            app.show_help = false;
        }
        return;
    }

    if app.dialog.is_some() {
        handle_dialog_key(app, key);
        return;
    }

    if app.context_menu.is_some() {
        handle_menu_key(app, key);
        return;
    }

    let shift = key.modifiers.contains(KeyModifiers::SHIFT);
    let alt = key.modifiers.contains(KeyModifiers::ALT);

    match key.code {
        KeyCode::Char('a') if ctrl => {
            app.focus = Pane::Listing;
            app.select_all();
        }
        // no other Ctrl chords; keep them off the plain letter bindings
        KeyCode::Char(_) if ctrl => {}

        KeyCode::Char('q') => app.should_quit = true,
        KeyCode::Char('?') => app.show_help = true,
        KeyCode::Tab | KeyCode::BackTab => app.toggle_focus(),

        // History navigation
        KeyCode::Left if alt => app.go_back(),
        KeyCode::Right if alt => app.go_forward(),

        KeyCode::Enter => app.open_cursor(),
        KeyCode::Backspace => app.go_parent(),
        KeyCode::Esc => app.escape(),

        // Overlays and operations
        KeyCode::Char('m') | KeyCode::F(10) => app.open_context_menu_at_cursor(),
        KeyCode::Char('n') => app.open_new_folder(),
        KeyCode::Char('u') => app.open_upload(),
        KeyCode::Char('D') => app.open_download(),
        KeyCode::Char('r') | KeyCode::F(2) => app.open_rename(),
        KeyCode::Char('M') => app.open_move(),
        KeyCode::Char('x') => app.cut_selection(),
        KeyCode::Char('p') => {
            let dest = app.current_dir.clone();
            app.paste_into(&dest);
        }
        KeyCode::Char('d') | KeyCode::Delete => app.open_delete(),
        KeyCode::Char('/') => app.open_search(),
        KeyCode::Char('H') => app.open_history(),
        KeyCode::Char('i') => app.open_properties(),

        // View
        KeyCode::Char('s') => app.cycle_sort(),
        KeyCode::Char('S') => app.toggle_order(),
        KeyCode::Char('.') => app.toggle_hidden(),
        KeyCode::Char('R') => app.refresh(),

        _ => match app.focus {
            Pane::Listing => handle_listing_key(app, key.code, shift),
            Pane::Tree => handle_tree_key(app, key.code),
        },
    }
}

fn handle_listing_key(app: &mut App, code: KeyCode, shift: bool) {
    match code {
        KeyCode::Up if shift => app.extend_cursor(-1),
        KeyCode::Down if shift => app.extend_cursor(1),
        KeyCode::Char('K') => app.extend_cursor(-1),
        KeyCode::Char('J') => app.extend_cursor(1),
        KeyCode::Char('k') | KeyCode::Up => app.move_cursor(-1),
        KeyCode::Char('j') | KeyCode::Down => app.move_cursor(1),
        KeyCode::Char('g') | KeyCode::Home => app.jump_top(),
        KeyCode::Char('G') | KeyCode::End => app.jump_bottom(),
        KeyCode::PageUp => app.page(false),
        KeyCode::PageDown => app.page(true),
        KeyCode::Char(' ') => app.toggle_cursor(),
        KeyCode::Char('h') | KeyCode::Left => app.go_parent(),
        KeyCode::Char('l') | KeyCode::Right => app.open_cursor(),
        _ => {}
    }
}

fn handle_tree_key(app: &mut App, code: KeyCode) {
    match code {
        KeyCode::Char('k') | KeyCode::Up => app.tree_up(),
        KeyCode::Char('j') | KeyCode::Down => app.tree_down(),
        KeyCode::Char('g') | KeyCode::Home => app.jump_top(),
        KeyCode::Char('G') | KeyCode::End => app.jump_bottom(),
        KeyCode::Char('h') | KeyCode::Left => app.tree_collapse(),
        KeyCode::Char('l') | KeyCode::Right => app.tree_expand(),
        KeyCode::Char(' ') => {
            if let Some(dir) = app.tree.cursor_path().map(String::from) {
                app.tree.toggle(&dir);
            }
        }
        _ => {}
    }
}

fn handle_menu_key(app: &mut App, key: KeyEvent) {
    let Some(ref mut menu) = app.context_menu else {
        return;
    };
    match key.code {
        KeyCode::Char('j') | KeyCode::Down | KeyCode::Tab => menu.next(),
        KeyCode::Char('k') | KeyCode::Up | KeyCode::BackTab => menu.prev(),
        KeyCode::Enter | KeyCode::Char(' ') => app.activate_menu(),
        KeyCode::Esc | KeyCode::Char('m') | KeyCode::F(10) | KeyCode::Char('q') => {
            app.context_menu = None;
        }
        _ => {}
    }
}

fn handle_dialog_key(app: &mut App, key: KeyEvent) {
    if key.code == KeyCode::Esc {
        app.close_dialog();
        return;
    }
    match app.dialog {
        Some(Dialog::ConfirmDelete { .. }) => match key.code {
            KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Enter => app.submit_dialog(),
            KeyCode::Char('n') | KeyCode::Char('N') => app.close_dialog(),
            _ => {}
        },
        Some(Dialog::Move { .. }) => {
            if key.code == KeyCode::Enter {
                app.submit_dialog();
                return;
            }
            if let Some(picker) = app.picker_mut() {
                match key.code {
                    KeyCode::Char('k') | KeyCode::Up => picker.up(),
                    KeyCode::Char('j') | KeyCode::Down => picker.down(),
                    KeyCode::Char('h') | KeyCode::Left => picker.collapse_or_parent(),
                    KeyCode::Char('l') | KeyCode::Right => picker.expand_or_child(),
                    KeyCode::Char('g') | KeyCode::Home => picker.top(),
                    KeyCode::Char('G') | KeyCode::End => picker.bottom(),
                    _ => {}
                }
            }
            app.dialog_error = None;
        }
        Some(Dialog::History { .. }) => match key.code {
            KeyCode::Char('k') | KeyCode::Up => app.scroll_history(-1),
            KeyCode::Char('j') | KeyCode::Down => app.scroll_history(1),
            KeyCode::Enter | KeyCode::Char('q') | KeyCode::Char('H') => app.close_dialog(),
            _ => {}
        },
        Some(Dialog::Properties(_)) => {
            if matches!(
                key.code,
                KeyCode::Enter | KeyCode::Char('q') | KeyCode::Char('i')
            ) {
                app.close_dialog();
            }
        }
        Some(_) => match key.code {
            KeyCode::Enter => app.submit_dialog(),
            _ => app.dialog_input(key),
        },
        None => {}
    }
}

fn handle_mouse(app: &mut App, mouse: MouseEvent) {
    let (col, row) = (mouse.column, mouse.row);
    match mouse.kind {
        MouseEventKind::Down(MouseButton::Left) => app.mouse_down(col, row, mouse.modifiers),
        MouseEventKind::Drag(MouseButton::Left) => app.mouse_drag(col, row),
        MouseEventKind::Up(MouseButton::Left) => app.mouse_up(),
        MouseEventKind::Down(MouseButton::Right) => app.mouse_right(col, row),
        MouseEventKind::Moved => app.mouse_move(col, row),
        MouseEventKind::ScrollDown => app.scroll(col, row, 1),
        MouseEventKind::ScrollUp => app.scroll(col, row, -1),
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::file::FileRecord;

    fn test_app() -> App {
        let client =
            FileServerClient::new("http://127.0.0.1:9", Duration::from_secs(1)).unwrap();
        let mut app = App::new(&Config::default(), client);
        app.set_viewport(Rect::new(0, 0, 100, 30));
        app.reload_listing();
        let generation = app.listing_generation();
        app.handle_listing_loaded(
            generation,
            "/".into(),
            Ok(vec![
                FileRecord::directory("/docs"),
                FileRecord {
                    is_dir: false,
                    ..FileRecord::directory("/a.txt")
                },
            ]),
        );
        app
    }

    fn press(app: &mut App, code: KeyCode) {
        handle_key(app, KeyEvent::new(code, KeyModifiers::NONE));
    }

    fn ctrl(app: &mut App, c: char) {
        handle_key(app, KeyEvent::new(KeyCode::Char(c), KeyModifiers::CONTROL));
    }

    #[test]
    fn menu_key_on_unselected_row_targets_that_row() {
        let mut app = test_app();
        // docs/ is selected, the cursor moves on to a.txt
        app.selection.click(0);
        press(&mut app, KeyCode::Down);
        assert_eq!(app.selection.cursor(), 1);
        assert!(!app.selection.is_selected(1));

        press(&mut app, KeyCode::Char('m'));
        let menu = app.context_menu.as_ref().unwrap();
        let names: Vec<String> = menu.records().into_iter().map(|r| r.name).collect();
        assert_eq!(names, vec!["a.txt"]);
        assert_eq!(app.selection.indices().collect::<Vec<_>>(), vec![1]);
    }

    #[test]
    fn menu_key_on_selected_row_keeps_selection() {
        let mut app = test_app();
        ctrl(&mut app, 'a');
        press(&mut app, KeyCode::Char('m'));
        assert_eq!(app.context_menu.as_ref().unwrap().records().len(), 2);
        assert_eq!(app.selection.len(), 2);
    }

    #[test]
    fn ctrl_letters_do_not_trigger_plain_bindings() {
        let mut app = test_app();
        for c in ['d', 'r', 'n', 'u', 'm', 'q', 'x', 's'] {
            ctrl(&mut app, c);
        }
        assert!(app.dialog.is_none());
        assert!(app.context_menu.is_none());
        assert!(app.clipboard.is_empty());
        assert!(!app.should_quit);

        ctrl(&mut app, 'a');
        assert_eq!(app.selection.len(), 2);
    }

    #[test]
    fn delete_asks_for_confirmation() {
        let mut app = test_app();
        press(&mut app, KeyCode::Char('d'));
        assert!(matches!(app.dialog, Some(Dialog::ConfirmDelete { .. })));
        press(&mut app, KeyCode::Char('n'));
        assert!(app.dialog.is_none());
    }

    #[test]
    fn typing_goes_to_dialog_input() {
        let mut app = test_app();
        press(&mut app, KeyCode::Char('n'));
        for c in "new".chars() {
            press(&mut app, KeyCode::Char(c));
        }
        let text = app
            .dialog
            .as_ref()
            .and_then(Dialog::input)
            .map(crate::state::dialog::input_text);
        assert_eq!(text.as_deref(), Some("new"));
        // 'q' is text here, not quit
        press(&mut app, KeyCode::Char('q'));
        assert!(!app.should_quit);
        press(&mut app, KeyCode::Esc);
        assert!(app.dialog.is_none());
    }

    #[test]
    fn shift_down_extends_selection() {
        let mut app = test_app();
        handle_key(&mut app, KeyEvent::new(KeyCode::Down, KeyModifiers::SHIFT));
        assert_eq!(app.selection.len(), 2);
        press(&mut app, KeyCode::Esc);
        assert!(app.selection.is_empty());
    }

    #[test]
    fn menu_keys_navigate_and_close() {
        let mut app = test_app();
        press(&mut app, KeyCode::Char('m'));
        assert!(app.context_menu.is_some());
        press(&mut app, KeyCode::Char('j'));
        assert_eq!(app.context_menu.as_ref().map(|m| m.index), Some(1));
        press(&mut app, KeyCode::Esc);
        assert!(app.context_menu.is_none());
    }

    #[test]
    fn tree_writer_draws_branches() {
        let mut tree = DirTree::new();
        tree.insert("/docs/2024");
        tree.insert("/music");
        let mut out = Vec::new();
        write_tree(&mut out, &tree, "").unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(text, "├── docs\n│   └── 2024\n└── music\n");
    }
}
