//! A terminal browser for folders of videos and images.
//!
//! Run the binary on a directory to browse it.  The last location, volume
//! and loop preference are restored on the next launch.

mod app;
mod config;
mod core;
mod ui;

use std::io::{self, stderr};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, widgets::Paragraph, Frame, Terminal};

use crate::app::{
    event::{spawn_event_reader, AppEvent},
    handler,
    runtime::Runtime,
    state::{AppState, Request},
    watch,
};
use crate::config::{clamp_max_zoom, AppConfig, ConfigDir, PersistedState};
use crate::core::{
    fs::{self, ScanConfig},
    route::normalize_root_prefix,
    thumbnail::ImageDecoder,
    tree::FileTree,
};
use crate::ui::{
    layout::AppLayout, listing::ListingWidget, preview::PreviewWidget, theme::Theme,
    viewer::ViewerWidget,
};

const LISTING_HINT: &str = "↑/↓ select  Enter open  ⌫ up  ~ root  r rescan  q quit";
const VIEWER_HINT: &str = "Esc close  f fullscreen";

// ───────────────────────────────────────── CLI ───────────────

#[derive(Parser, Debug)]
#[command(name = env!("CARGO_PKG_NAME"), about = "Terminal browser for video and image folders")]
struct Cli {
    /// Directory to browse (defaults to the last one, then `.`).
    path: Option<PathBuf>,

    /// Show hidden (dot) files.
    #[arg(long)]
    hidden: bool,

    /// Don't rescan when the directory changes on disk.
    #[arg(long = "no-watch")]
    no_watch: bool,

    /// Maximum zoom factor in the image viewer.
    #[arg(long)]
    image_max_zoom: Option<f64>,

    /// Maximum zoom factor in the video viewer.
    #[arg(long)]
    video_max_zoom: Option<f64>,
}

// ───────────────────────────────────────── startup ───────────

/// Tree for `root`: the saved listing when it belongs to the same root,
/// otherwise a fresh scan.  Returns whether the saved listing was used.
fn initial_tree(
    store: &ConfigDir,
    persisted: &PersistedState,
    root_prefix: &str,
    scan: &ScanConfig,
    root: &std::path::Path,
) -> Result<(FileTree, bool)> {
    if persisted.root == root_prefix {
        let saved = config::load_file_list(store);
        if !saved.is_empty() {
            tracing::info!(count = saved.len(), "restored saved listing");
            return Ok((FileTree::from_paths(&saved), true));
        }
    }
    let tree = FileTree::from_paths(fs::scan_relative_paths(root, scan)?);
    if tree.is_empty() {
        tracing::warn!("no files under {}", root.display());
    }
    Ok((tree, false))
}

// ───────────────────────────────────────── drawing ───────────

fn draw(frame: &mut Frame, state: &mut AppState) {
    state.terminal_area = frame.area();
    let layout = AppLayout::from_area(frame.area(), state.fullscreen);

    if let Some(area) = layout.listing_area {
        let listing = ListingWidget::new(&state.tree, state.current_dir, &state.thumbnails)
            .focused(state.viewer.is_none());
        frame.render_stateful_widget(listing, area, &mut state.listing);
    }

    match &state.viewer {
        Some(viewer) => frame.render_widget(
            ViewerWidget {
                viewer,
                image: &state.viewer_image,
            },
            layout.side_area,
        ),
        None => frame.render_widget(
            PreviewWidget {
                tree: &state.tree,
                selected: state.selected_entry(),
                thumbnails: &state.thumbnails,
            },
            layout.side_area,
        ),
    }

    let hint = if state.viewer.is_some() {
        VIEWER_HINT
    } else {
        LISTING_HINT
    };
    let text = format!(
        " {}  │ {}",
        state.status_message.as_deref().unwrap_or(hint),
        state.breadcrumb()
    );
    frame.render_widget(
        Paragraph::new(text).style(Theme::status_bar_style()),
        layout.status_area,
    );
}

/// Hand queued work to the background runtime.
fn dispatch(state: &mut AppState, runtime: &Runtime) {
    for request in std::mem::take(&mut state.requests) {
        match request {
            Request::Rescan => runtime.spawn_rescan(state.root_dir.clone(), state.scan_config.clone()),
            Request::Thumbnail { rel_path, media } => {
                runtime.spawn_thumbnail(state.disk_path(&rel_path), rel_path, media)
            }
            Request::LoadViewer {
                rel_path,
                source,
                media,
            } => runtime.spawn_viewer_load(state.disk_path(&rel_path), source, media),
            Request::Fullscreen(request) => runtime.spawn_fullscreen(request),
        }
    }
}

// ───────────────────────────────────────── main ─────────────

#[tokio::main]
async fn main() -> Result<()> {
    // Silent unless RUST_LOG is set.
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(io::stderr) // never pollute stdout
        .init();

    let cli = Cli::parse();

    // ── configuration ─────────────────────────────────────────
    let store = ConfigDir::default_location();
    let mut user_config = AppConfig::load(&store);
    if let Some(z) = cli.image_max_zoom {
        user_config.image_max_zoom = clamp_max_zoom(z);
    }
    if let Some(z) = cli.video_max_zoom {
        user_config.video_max_zoom = clamp_max_zoom(z);
    }
    user_config.show_hidden |= cli.hidden;
    let mut persisted = PersistedState::load(&store);

    // ── build initial tree ────────────────────────────────────
    let root = cli
        .path
        .or_else(|| config::root_dir_from_prefix(&persisted.root))
        .unwrap_or_else(|| PathBuf::from("."));
    let root = root
        .canonicalize()
        .with_context(|| format!("cannot open {}", root.display()))?;
    let root_prefix = normalize_root_prefix(&root.display().to_string());
    if persisted.root != root_prefix {
        // A route only means something under the root it was saved for.
        persisted.route.clear();
    }
    let scan_config = ScanConfig {
        show_hidden: user_config.show_hidden,
        ..ScanConfig::default()
    };
    let (tree, from_saved) = initial_tree(&store, &persisted, &root_prefix, &scan_config, &root)?;

    let watch_window = Duration::from_millis(user_config.watch_debounce_ms);
    let mut state = AppState::new(root.clone(), tree, user_config, store, &persisted);
    state.restore();
    if from_saved {
        state.requests.push(Request::Rescan);
    } else {
        state.save_listing();
    }

    // ── terminal setup ────────────────────────────────────────
    enable_raw_mode()?;
    let mut stderr_handle = stderr();
    execute!(stderr_handle, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stderr());
    let mut terminal = Terminal::new(backend)?;

    // ── async channels ────────────────────────────────────────
    let (tx, mut events) = tokio::sync::mpsc::unbounded_channel::<AppEvent>();
    spawn_event_reader(Duration::from_millis(100), tx.clone());
    let runtime = Runtime::new(tx.clone(), Arc::new(ImageDecoder));
    let _watcher = if cli.no_watch {
        None
    } else {
        let filter = watch::WatchFilter::new(&root, &state.scan_config).exclude(state.store.path());
        match watch::spawn_watcher(filter, watch_window, tx.clone()) {
            Ok(w) => Some(w),
            Err(e) => {
                tracing::warn!("cannot watch {}: {e}", root.display());
                state.status_message = Some(format!("not watching for changes: {e}"));
                None
            }
        }
    };

    // ── event loop ────────────────────────────────────────────
    loop {
        terminal.draw(|frame| draw(frame, &mut state))?;
        dispatch(&mut state, &runtime);

        let Some(event) = events.recv().await else {
            break;
        };
        handler::handle_event(&mut state, event);
        // Drain everything currently queued before redrawing.
        while let Ok(event) = events.try_recv() {
            handler::handle_event(&mut state, event);
        }
        state.on_tick(Instant::now());

        if state.should_quit {
            break;
        }
    }

    // ── teardown ──────────────────────────────────────────────
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    state.persist();
    Ok(())
}
