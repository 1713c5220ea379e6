//! Central application state.
//!
//! All mutable state lives here so that the rest of the app can be pure
//! functions over `&AppState` (rendering) or `&mut AppState` (event handling).
//! Work that has to leave the UI thread is queued in [`AppState::requests`]
//! and drained by the main loop.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use image::RgbaImage;
use ratatui::layout::Rect;

use crate::config::{save_file_list, AppConfig, ConfigDir, PersistedState};
use crate::core::{
    fs::{resolve_on_disk, ScanConfig},
    media::MediaKind,
    route::{RouteEvent, RouteResolver},
    thumbnail::{DecodeError, ThumbnailCache},
    tree::{FileTree, NodeId, ROOT},
    viewer::{Viewer, ViewerEffect},
    viewport::FullscreenRequest,
};
use crate::ui::listing::ListingState;

/// Work for the background runtime.
#[derive(Debug, Clone, PartialEq)]
pub enum Request {
    Rescan,
    Thumbnail {
        rel_path: String,
        media: MediaKind,
    },
    LoadViewer {
        rel_path: String,
        source: String,
        media: MediaKind,
    },
    Fullscreen(FullscreenRequest),
}

/// Pixels behind the open image viewer.
#[derive(Debug, Clone, Default)]
pub enum ViewerImage {
    #[default]
    Loading,
    Ready(Arc<RgbaImage>),
    Unsupported,
}

/// Top-level application state.
pub struct AppState {
    pub tree: FileTree,
    pub resolver: RouteResolver,
    /// Directory shown in the listing.
    pub current_dir: NodeId,
    /// `rel_path` of `current_dir`; survives rebuilds, unlike the id.
    pub current_path: String,
    /// Widget-level state (selection, scroll).
    pub listing: ListingState,
    pub viewer: Option<Viewer>,
    pub viewer_image: ViewerImage,
    pub thumbnails: ThumbnailCache,
    /// Filesystem directory the tree was scanned from.
    pub root_dir: PathBuf,
    pub scan_config: ScanConfig,
    pub config: AppConfig,
    pub store: ConfigDir,
    /// Persisted playback preferences handed to each new video viewer.
    pub volume: f64,
    pub loop_enabled: bool,
    /// Platform fullscreen state; only [`AppState::on_fullscreen_changed`]
    /// writes it.
    pub fullscreen: bool,
    pub terminal_area: Rect,
    pub status_message: Option<String>,
    /// Controls the main event loop.
    pub should_quit: bool,
    /// Last left-clicked listing row and click time, for double-click.
    pub last_left_click: Option<(usize, Instant)>,
    /// Last left click inside the viewer, for double-click fullscreen.
    pub last_viewer_click: Option<Instant>,
    /// Pointer cell at the previous drag event.
    pub drag_anchor: Option<(u16, u16)>,
    pub last_tick: Instant,
    pub requests: Vec<Request>,
}

impl AppState {
    pub fn new(
        root_dir: PathBuf,
        tree: FileTree,
        config: AppConfig,
        store: ConfigDir,
        persisted: &PersistedState,
    ) -> Self {
        let mut resolver = RouteResolver::new(persisted.route.clone(), "");
        resolver.set_root_prefix(&root_dir.display().to_string());
        Self {
            tree,
            resolver,
            current_dir: ROOT,
            current_path: String::new(),
            listing: ListingState::default(),
            viewer: None,
            viewer_image: ViewerImage::default(),
            thumbnails: ThumbnailCache::default(),
            root_dir,
            scan_config: ScanConfig {
                show_hidden: config.show_hidden,
                ..ScanConfig::default()
            },
            config,
            store,
            volume: persisted.volume,
            loop_enabled: persisted.loop_enabled,
            fullscreen: false,
            terminal_area: Rect::default(),
            status_message: None,
            should_quit: false,
            last_left_click: None,
            last_viewer_click: None,
            drag_anchor: None,
            last_tick: Instant::now(),
            requests: Vec::new(),
        }
    }

    /// Resolve the persisted route against the freshly loaded tree.
    pub fn restore(&mut self) {
        let event = self.resolver.on_rebuild(&self.tree);
        self.apply_route_event(event);
    }

    // ── listing ────────────────────────────────────────────────

    /// Children of the current directory, in insertion order.
    pub fn entries(&self) -> &[NodeId] {
        self.tree.get(self.current_dir).children()
    }

    pub fn selected_entry(&self) -> Option<NodeId> {
        self.entries().get(self.listing.selected).copied()
    }

    // ── navigation ─────────────────────────────────────────────

    /// Act on whatever the resolver decided.
    pub fn apply_route_event(&mut self, event: RouteEvent) {
        match event {
            RouteEvent::Navigate(dir) => {
                let path = self.tree.get(dir).rel_path.clone();
                if path != self.current_path {
                    self.listing = ListingState {
                        height: self.listing.height,
                        ..ListingState::default()
                    };
                }
                self.current_dir = dir;
                self.current_path = path;
                self.listing.clamp_to(self.entries().len());
                self.drop_viewer();
            }
            RouteEvent::Select {
                node,
                absolute_path,
                media,
            } => {
                let leaf = self.tree.get(node);
                let rel_path = leaf.rel_path.clone();
                let parent = leaf.parent.unwrap_or(ROOT);
                self.current_dir = parent;
                self.current_path = self.tree.get(parent).rel_path.clone();
                if let Some(row) = self.entries().iter().position(|&id| id == node) {
                    self.listing.selected = row;
                }

                let same_source = self
                    .viewer
                    .as_ref()
                    .is_some_and(|v| v.source() == absolute_path);
                if !same_source {
                    self.viewer = Some(Viewer::open(
                        rel_path.clone(),
                        absolute_path.clone(),
                        media,
                        &self.config.viewer_settings(),
                        self.volume,
                        self.loop_enabled,
                    ));
                    self.viewer_image = ViewerImage::Loading;
                    self.requests.push(Request::LoadViewer {
                        rel_path,
                        source: absolute_path,
                        media,
                    });
                }
            }
        }
        self.persist();
    }

    /// Open a listing entry.  `other` leaves are ignored.
    pub fn open(&mut self, id: NodeId) {
        if let Some(event) = self.resolver.open(id, &self.tree) {
            self.apply_route_event(event);
        } else {
            let name = &self.tree.get(id).name;
            self.status_message = Some(format!("{name}: not a video or image"));
        }
    }

    pub fn open_selected(&mut self) {
        if let Some(id) = self.selected_entry() {
            self.open(id);
        }
    }

    pub fn go_up(&mut self) {
        let Some(parent) = self.tree.get(self.current_dir).parent else {
            return;
        };
        let from = self.current_dir;
        self.open(parent);
        if let Some(row) = self.entries().iter().position(|&id| id == from) {
            self.listing.selected = row;
        }
    }

    pub fn go_root(&mut self) {
        self.open(self.tree.root());
    }

    /// Leave the viewer and put the route back on the listed directory.
    pub fn close_viewer(&mut self) {
        let event = self.resolver.set_route(self.current_path.clone(), &self.tree);
        self.apply_route_event(event);
    }

    fn drop_viewer(&mut self) {
        if self.viewer.take().is_some() {
            self.viewer_image = ViewerImage::Loading;
            self.drag_anchor = None;
            if self.fullscreen {
                self.requests.push(Request::Fullscreen(FullscreenRequest::Exit));
            }
        }
    }

    // ── viewer ─────────────────────────────────────────────────

    pub fn apply_viewer_effect(&mut self, effect: ViewerEffect) {
        match effect {
            ViewerEffect::Fullscreen(request) => self.requests.push(Request::Fullscreen(request)),
            ViewerEffect::VolumeChanged(volume) => {
                self.volume = volume;
                self.persist();
            }
            ViewerEffect::LoopChanged(enabled) => {
                self.loop_enabled = enabled;
                self.status_message = Some(format!("loop {}", if enabled { "on" } else { "off" }));
                self.persist();
            }
        }
    }

    /// Platform notification.
    /// An `Enter` that lands after its viewer closed is undone right away,
    /// since the listing has no way out of fullscreen.
    pub fn on_fullscreen_changed(&mut self, active: bool) {
        self.fullscreen = active;
        match &mut self.viewer {
            Some(viewer) => viewer.viewport.on_fullscreen_change(active),
            None if active => self.requests.push(Request::Fullscreen(FullscreenRequest::Exit)),
            None => {}
        }
    }

    pub fn on_viewer_image(&mut self, source: &str, result: Result<Arc<RgbaImage>, DecodeError>) {
        let Some(viewer) = self.viewer.as_mut().filter(|v| v.source() == source) else {
            return;
        };
        match result {
            Ok(img) => {
                self.viewer_image = ViewerImage::Ready(img);
                viewer.on_metadata_loaded(None);
            }
            Err(e) => {
                tracing::debug!("viewer image {source:?} unsupported: {e}");
                self.viewer_image = ViewerImage::Unsupported;
            }
        }
    }

    pub fn on_metadata(&mut self, source: &str, duration: Option<f64>) {
        if let Some(viewer) = self.viewer.as_mut().filter(|v| v.source() == source) {
            viewer.on_metadata_loaded(duration);
        }
    }

    // ── periodic ───────────────────────────────────────────────

    /// Advance viewer clocks and queue decodes for the visible rows.
    pub fn on_tick(&mut self, now: Instant) {
        let elapsed = now.saturating_duration_since(self.last_tick);
        self.last_tick = now;
        if let Some(viewer) = &mut self.viewer {
            viewer.tick(now, elapsed);
        }
        self.request_visible_thumbnails();
    }

    fn request_visible_thumbnails(&mut self) {
        let dir = self.tree.get(self.current_dir);
        let rows = self.listing.visible_range(dir.children().len());
        for (row, &id) in dir.children().iter().enumerate() {
            let node = self.tree.get(id);
            let Some(media) = node.media() else {
                continue;
            };
            if self.thumbnails.request(&node.rel_path, media, rows.contains(&row)) {
                self.requests.push(Request::Thumbnail {
                    rel_path: node.rel_path.clone(),
                    media,
                });
            }
        }
    }

    // ── rebuild ────────────────────────────────────────────────

    pub fn on_rescanned(&mut self, result: anyhow::Result<Vec<String>>) {
        match result {
            Ok(paths) if paths.iter().map(String::as_str).eq(self.tree.leaf_paths()) => {
                tracing::debug!(count = paths.len(), "rescan found no changes");
            }
            Ok(paths) => self.rebuild(&paths),
            Err(e) => {
                tracing::warn!("rescan failed: {e:#}");
                self.status_message = Some(format!("rescan failed: {e}"));
            }
        }
    }

    /// Replace the tree contents and re-resolve the route.
    pub fn rebuild(&mut self, paths: &[String]) {
        let stats = self.tree.rebuild(paths);
        tracing::info!(
            inserted = stats.inserted,
            skipped = stats.skipped,
            nodes = self.tree.len(),
            generation = self.tree.generation(),
            "tree rebuilt"
        );
        let tree = &self.tree;
        self.thumbnails.retain_paths(|p| tree.find(p).is_some());
        if self.resolver.is_stale(&self.tree) {
            let event = self.resolver.on_rebuild(&self.tree);
            self.apply_route_event(event);
        }
        self.save_listing();
    }

    /// Persist the tree's leaves so the next launch starts without a scan.
    pub fn save_listing(&self) {
        let paths: Vec<String> = self.tree.leaf_paths().into_iter().map(str::to_string).collect();
        if let Err(e) = save_file_list(&self.store, &paths) {
            tracing::warn!("{e}");
        }
    }

    /// `Root › a › b` for the listed directory.
    pub fn breadcrumb(&self) -> String {
        self.tree
            .ancestors(self.current_dir)
            .into_iter()
            .map(|id| self.tree.get(id).name.as_str())
            .collect::<Vec<_>>()
            .join(" › ")
    }

    pub fn disk_path(&self, rel_path: &str) -> PathBuf {
        resolve_on_disk(&self.root_dir, rel_path)
    }

    // ── persistence ────────────────────────────────────────────

    pub fn persisted(&self) -> PersistedState {
        PersistedState {
            route: self.resolver.route().to_string(),
            root: self.resolver.root_prefix().to_string(),
            volume: self.volume,
            loop_enabled: self.loop_enabled,
        }
    }

    pub fn persist(&mut self) {
        if let Err(e) = self.persisted().save(&self.store) {
            tracing::warn!("{e}");
            self.status_message = Some(format!("could not save state: {e}"));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::viewport::ViewerKey;

    fn scratch(name: &str) -> ConfigDir {
        let dir = std::env::temp_dir().join(format!("media-tree-state-{name}-{}", std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        ConfigDir::new(dir)
    }

    fn app(name: &str, route: &str) -> AppState {
        let tree = FileTree::from_paths(["a/b.mp4", "a/c.jpg", "a/notes.txt", "d/e.png", "f.txt"]);
        let persisted = PersistedState {
            route: route.to_string(),
            ..PersistedState::default()
        };
        let mut state = AppState::new(
            PathBuf::from("/media"),
            tree,
            AppConfig::default(),
            scratch(name),
            &persisted,
        );
        state.restore();
        state
    }

    fn find(state: &AppState, path: &str) -> NodeId {
        state.tree.find(path).unwrap()
    }

    #[test]
    fn test_restore_selects_persisted_leaf() {
        let state = app("restore", "a/b.mp4");
        assert_eq!(state.current_path, "a");
        let viewer = state.viewer.as_ref().unwrap();
        assert_eq!(viewer.source(), "file:///media/a/b.mp4");
        assert_eq!(
            state.requests,
            vec![Request::LoadViewer {
                rel_path: "a/b.mp4".into(),
                source: "file:///media/a/b.mp4".into(),
                media: MediaKind::Video,
            }]
        );
        assert_eq!(state.listing.selected, 0);
    }

    #[test]
    fn test_open_directory_writes_route() {
        let mut state = app("open-dir", "");
        state.open(find(&state, "d"));
        assert_eq!(state.resolver.route(), "d");
        assert_eq!(state.current_path, "d");
        assert!(state.viewer.is_none());
    }

    #[test]
    fn test_open_other_leaf_does_nothing() {
        let mut state = app("open-other", "a");
        state.open(find(&state, "a/notes.txt"));
        assert_eq!(state.resolver.route(), "a");
        assert!(state.viewer.is_none());
        assert!(state.status_message.is_some());
    }

    #[test]
    fn test_go_up_selects_previous_dir() {
        let mut state = app("up", "d");
        state.go_up();
        assert_eq!(state.current_path, "");
        assert_eq!(state.resolver.route(), "");
        assert_eq!(state.selected_entry(), Some(find(&state, "d")));
        state.go_up();
        assert_eq!(state.current_path, "");
    }

    #[test]
    fn test_close_viewer_routes_back_to_directory() {
        let mut state = app("close", "a/c.jpg");
        assert!(state.viewer.is_some());
        state.close_viewer();
        assert!(state.viewer.is_none());
        assert_eq!(state.resolver.route(), "a");
    }

    #[test]
    fn test_rebuild_keeps_open_viewer() {
        let mut state = app("rebuild-keep", "a/b.mp4");
        state.requests.clear();
        state.viewer.as_mut().unwrap().on_metadata_loaded(Some(10.0));
        state.rebuild(&["x.txt".to_string(), "a/b.mp4".to_string()]);
        let viewer = state.viewer.as_ref().unwrap();
        assert!(viewer.loaded);
        assert!(state.requests.is_empty());
        assert!(!state.resolver.is_stale(&state.tree));
    }

    #[test]
    fn test_rebuild_without_file_closes_viewer() {
        let mut state = app("rebuild-gone", "a/b.mp4");
        state.rebuild(&["a/c.jpg".to_string()]);
        assert!(state.viewer.is_none());
        assert_eq!(state.current_path, "a");
    }

    #[test]
    fn test_fullscreen_follows_notifications_only() {
        let mut state = app("fullscreen", "d/e.png");
        state.requests.clear();
        let now = Instant::now();
        let effect = state
            .viewer
            .as_mut()
            .unwrap()
            .handle_key(ViewerKey::Char('f'), now)
            .unwrap();
        state.apply_viewer_effect(effect);
        assert_eq!(state.requests, vec![Request::Fullscreen(FullscreenRequest::Enter)]);
        assert!(!state.fullscreen);

        state.on_fullscreen_changed(true);
        assert!(state.viewer.as_ref().unwrap().viewport.state().fullscreen_active);

        state.requests.clear();
        state.close_viewer();
        assert_eq!(state.requests, vec![Request::Fullscreen(FullscreenRequest::Exit)]);
    }

    #[test]
    fn test_late_fullscreen_ack_without_viewer_exits() {
        let mut state = app("fullscreen-late", "d/e.png");
        state.requests.clear();
        let effect = state
            .viewer
            .as_mut()
            .unwrap()
            .handle_key(ViewerKey::Char('f'), Instant::now())
            .unwrap();
        state.apply_viewer_effect(effect);
        state.close_viewer();
        assert_eq!(state.requests, vec![Request::Fullscreen(FullscreenRequest::Enter)]);

        state.requests.clear();
        state.on_fullscreen_changed(true);
        assert!(state.viewer.is_none());
        assert_eq!(state.requests, vec![Request::Fullscreen(FullscreenRequest::Exit)]);

        state.requests.clear();
        state.on_fullscreen_changed(false);
        assert!(!state.fullscreen);
        assert!(state.requests.is_empty());
    }

    #[test]
    fn test_unchanged_rescan_skips_rebuild() {
        let mut state = app("rescan-same", "a");
        let generation = state.tree.generation();
        let same: Vec<String> = state.tree.leaf_paths().into_iter().map(str::to_string).collect();
        state.on_rescanned(Ok(same));
        assert_eq!(state.tree.generation(), generation);

        state.on_rescanned(Ok(vec!["a/b.mp4".to_string()]));
        assert_ne!(state.tree.generation(), generation);
    }

    #[test]
    fn test_stale_viewer_results_are_ignored() {
        let mut state = app("stale", "d/e.png");
        state.on_viewer_image("file:///media/other.png", Ok(Arc::new(RgbaImage::new(1, 1))));
        assert!(matches!(state.viewer_image, ViewerImage::Loading));
        state.on_viewer_image("file:///media/d/e.png", Err(DecodeError::Unsupported));
        assert!(matches!(state.viewer_image, ViewerImage::Unsupported));
    }

    #[test]
    fn test_tick_requests_visible_thumbnails_once() {
        let mut state = app("thumbs", "a");
        state.requests.clear();
        state.listing.height = 1;
        state.on_tick(Instant::now());
        assert_eq!(
            state.requests,
            vec![Request::Thumbnail {
                rel_path: "a/b.mp4".into(),
                media: MediaKind::Video,
            }]
        );
        state.requests.clear();
        state.on_tick(Instant::now());
        assert!(state.requests.is_empty());
    }

    #[test]
    fn test_rebuild_saves_deduplicated_listing() {
        let mut state = app("listing", "");
        state.rebuild(&["a/b.mp4".to_string(), "a/b.mp4".to_string(), "c.png".to_string()]);
        assert_eq!(crate::config::load_file_list(&state.store), vec!["a/b.mp4", "c.png"]);
        assert_eq!(state.breadcrumb(), "Root");
        state.open(find(&state, "a"));
        assert_eq!(state.breadcrumb(), "Root › a");
    }

    #[test]
    fn test_volume_change_is_persisted() {
        let mut state = app("volume", "");
        state.apply_viewer_effect(ViewerEffect::VolumeChanged(0.25));
        assert_eq!(PersistedState::load(&state.store).volume, 0.25);
    }
}
