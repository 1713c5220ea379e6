//! User configuration and persisted session state.
//!
//! Everything is stored as simple `key = value` text files under
//! `$XDG_CONFIG_HOME/media-tree/` (default `~/.config/media-tree/`):
//!
//! * `config.toml`: viewer and scan tunables ([`AppConfig`]).
//! * `state.conf`: namespaced session keys ([`PersistedState`]).
//! * `files.list`: the last scanned flat path list, one path per line.

use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::core::route::{decode_fragment, encode_fragment};
use crate::core::viewer::ViewerSettings;
use crate::core::viewport::{DEFAULT_IMAGE_MAX_ZOOM, DEFAULT_VIDEO_MAX_ZOOM};

const CONFIG_FILE: &str = "config.toml";
const STATE_FILE: &str = "state.conf";
const FILES_FILE: &str = "files.list";
const KEY_NAMESPACE: &str = "media_tree";

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("cannot write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

// ───────────────────────────────────────── location ──────────

/// Directory holding every persisted file.
#[derive(Debug, Clone)]
pub struct ConfigDir {
    dir: PathBuf,
}

impl ConfigDir {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// `$XDG_CONFIG_HOME/media-tree`, falling back to `~/.config/media-tree`.
    pub fn default_location() -> Self {
        let config_dir = std::env::var("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| {
                let home = std::env::var("HOME").unwrap_or_else(|_| ".".into());
                PathBuf::from(home).join(".config")
            });
        Self::new(config_dir.join(env!("CARGO_PKG_NAME")))
    }

    pub fn path(&self) -> &Path {
        &self.dir
    }

    fn file(&self, name: &str) -> PathBuf {
        self.dir.join(name)
    }

    fn read(&self, name: &str) -> Option<String> {
        std::fs::read_to_string(self.file(name)).ok()
    }

    fn write(&self, name: &str, contents: &str) -> Result<(), StoreError> {
        let path = self.file(name);
        let wrap = |source| StoreError::Write {
            path: path.clone(),
            source,
        };
        std::fs::create_dir_all(&self.dir).map_err(wrap)?;
        std::fs::write(&path, contents).map_err(wrap)
    }
}

/// Iterate `key = value` pairs, skipping blanks, comments and sections.
fn key_values(s: &str) -> impl Iterator<Item = (&str, &str)> {
    s.lines().filter_map(|line| {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') || line.starts_with('[') {
            return None;
        }
        let (key, value) = line.split_once('=')?;
        Some((key.trim(), value.trim()))
    })
}

// ───────────────────────────────────────── config ────────────

/// Viewer and scan tunables.
#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub image_max_zoom: f64,
    pub video_max_zoom: f64,
    /// Quiet period before viewer controls hide.
    pub controls_hide_ms: u64,
    /// Trailing window for collapsing directory change bursts.
    pub watch_debounce_ms: u64,
    /// Double-click detection window for the listing and viewers.
    pub double_click_ms: u64,
    pub show_hidden: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            image_max_zoom: DEFAULT_IMAGE_MAX_ZOOM,
            video_max_zoom: DEFAULT_VIDEO_MAX_ZOOM,
            controls_hide_ms: 1000,
            watch_debounce_ms: 100,
            double_click_ms: 250,
            show_hidden: false,
        }
    }
}

impl AppConfig {
    /// Load config from disk, falling back to defaults.  A missing file is
    /// written out with the defaults so there is something to edit.
    pub fn load(dir: &ConfigDir) -> Self {
        match dir.read(CONFIG_FILE) {
            Some(contents) => Self::parse(&contents),
            None => {
                let config = Self::default();
                if let Err(e) = config.save(dir) {
                    tracing::warn!("{e:#}");
                }
                config
            }
        }
    }

    /// Persist current config to disk.
    pub fn save(&self, dir: &ConfigDir) -> anyhow::Result<()> {
        dir.write(CONFIG_FILE, &self.serialise())?;
        Ok(())
    }

    pub fn viewer_settings(&self) -> ViewerSettings {
        ViewerSettings {
            image_max_zoom: self.image_max_zoom,
            video_max_zoom: self.video_max_zoom,
            hide_delay: Duration::from_millis(self.controls_hide_ms),
        }
    }

    fn parse(s: &str) -> Self {
        let mut config = Self::default();
        for (key, value) in key_values(s) {
            match key {
                "image_max_zoom" => {
                    if let Ok(v) = value.parse::<f64>() {
                        config.image_max_zoom = clamp_max_zoom(v);
                    }
                }
                "video_max_zoom" => {
                    if let Ok(v) = value.parse::<f64>() {
                        config.video_max_zoom = clamp_max_zoom(v);
                    }
                }
                "controls_hide_ms" => {
                    if let Ok(v) = value.parse::<u64>() {
                        config.controls_hide_ms = v.clamp(200, 10_000);
                    }
                }
                "watch_debounce_ms" => {
                    if let Ok(v) = value.parse::<u64>() {
                        config.watch_debounce_ms = v.clamp(10, 5_000);
                    }
                }
                "double_click_ms" => {
                    if let Ok(v) = value.parse::<u64>() {
                        // Keep this bounded for predictable UX.
                        config.double_click_ms = v.clamp(100, 2000);
                    }
                }
                "show_hidden" => config.show_hidden = value == "true",
                _ => {}
            }
        }
        config
    }

    fn serialise(&self) -> String {
        [
            "# media-tree configuration".to_string(),
            String::new(),
            "# Viewer".to_string(),
            format!("image_max_zoom = {}", self.image_max_zoom),
            format!("video_max_zoom = {}", self.video_max_zoom),
            format!("controls_hide_ms = {}", self.controls_hide_ms),
            format!("double_click_ms = {}", self.double_click_ms),
            String::new(),
            "# Scanning".to_string(),
            format!("watch_debounce_ms = {}", self.watch_debounce_ms),
            format!("show_hidden = {}", self.show_hidden),
            String::new(),
        ]
        .join("\n")
    }
}

pub fn clamp_max_zoom(v: f64) -> f64 {
    if v.is_finite() {
        v.clamp(1.0, 50.0)
    } else {
        DEFAULT_IMAGE_MAX_ZOOM
    }
}

// ───────────────────────────────────────── session state ─────

/// Everything that survives a restart besides the config.
#[derive(Debug, Clone, PartialEq)]
pub struct PersistedState {
    /// Decoded route (the file stores the `#`-fragment form).
    pub route: String,
    /// Root-location prefix, e.g. `file:///home/me/Videos`.
    pub root: String,
    pub volume: f64,
    pub loop_enabled: bool,
}

impl Default for PersistedState {
    fn default() -> Self {
        Self {
            route: String::new(),
            root: String::new(),
            volume: 1.0,
            loop_enabled: false,
        }
    }
}

impl PersistedState {
    pub fn load(dir: &ConfigDir) -> Self {
        dir.read(STATE_FILE)
            .map(|contents| Self::parse(&contents))
            .unwrap_or_default()
    }

    pub fn save(&self, dir: &ConfigDir) -> Result<(), StoreError> {
        dir.write(STATE_FILE, &self.serialise())
    }

    fn parse(s: &str) -> Self {
        let mut state = Self::default();
        for (key, value) in key_values(s) {
            let Some(key) = key
                .strip_prefix(KEY_NAMESPACE)
                .and_then(|k| k.strip_prefix('.'))
            else {
                continue;
            };
            match key {
                "route" => state.route = decode_fragment(value),
                "root" => state.root = value.to_string(),
                "volume" => {
                    if let Ok(v) = value.parse::<f64>() {
                        if v.is_finite() {
                            state.volume = v.clamp(0.0, 1.0);
                        }
                    }
                }
                "loop" => state.loop_enabled = value == "true",
                _ => {}
            }
        }
        state
    }

    fn serialise(&self) -> String {
        [
            format!("{KEY_NAMESPACE}.route = {}", encode_fragment(&self.route)),
            format!("{KEY_NAMESPACE}.root = {}", self.root),
            format!("{KEY_NAMESPACE}.volume = {}", self.volume),
            format!("{KEY_NAMESPACE}.loop = {}", self.loop_enabled),
            String::new(),
        ]
        .join("\n")
    }
}

/// Last scanned path list, in listing order.
pub fn load_file_list(dir: &ConfigDir) -> Vec<String> {
    dir.read(FILES_FILE)
        .map(|contents| {
            contents
                .lines()
                .filter(|l| !l.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

pub fn save_file_list(dir: &ConfigDir, paths: &[String]) -> Result<(), StoreError> {
    let mut contents = paths.join("\n");
    contents.push('\n');
    dir.write(FILES_FILE, &contents)
}

/// Turn a persisted root prefix back into a filesystem directory.
pub fn root_dir_from_prefix(prefix: &str) -> Option<PathBuf> {
    let path = prefix.strip_prefix("file://").unwrap_or(prefix);
    (!path.is_empty()).then(|| Path::new(path).to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch(name: &str) -> ConfigDir {
        let dir = std::env::temp_dir().join(format!("media-tree-config-{name}-{}", std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        ConfigDir::new(dir)
    }

    #[test]
    fn test_missing_files_give_defaults() {
        let dir = scratch("missing");
        assert_eq!(PersistedState::load(&dir), PersistedState::default());
        assert!(load_file_list(&dir).is_empty());
        assert_eq!(AppConfig::load(&dir), AppConfig::default());
        // The defaults were written out and read back unchanged.
        assert!(dir.file(CONFIG_FILE).exists());
        assert_eq!(AppConfig::load(&dir), AppConfig::default());
        std::fs::remove_dir_all(&dir.dir).unwrap();
    }

    #[test]
    fn test_config_parse_clamps_and_ignores_junk() {
        let config = AppConfig::parse(
            "# comment\n[viewer]\nimage_max_zoom = 500\nvideo_max_zoom = abc\ncontrols_hide_ms = 5\nunknown = 1\nshow_hidden = true\n",
        );
        assert_eq!(config.image_max_zoom, 50.0);
        assert_eq!(config.video_max_zoom, DEFAULT_VIDEO_MAX_ZOOM);
        assert_eq!(config.controls_hide_ms, 200);
        assert!(config.show_hidden);
    }

    #[test]
    fn test_default_max_zoom_differs_by_viewer() {
        let settings = AppConfig::default().viewer_settings();
        assert_ne!(settings.image_max_zoom, settings.video_max_zoom);
        assert_eq!(settings.hide_delay, Duration::from_millis(1000));
    }

    #[test]
    fn test_state_survives_save_and_load() {
        let dir = scratch("state");
        let state = PersistedState {
            route: "Shows/Season 1/e01.mkv".to_string(),
            root: "file:///srv/media".to_string(),
            volume: 0.35,
            loop_enabled: true,
        };
        state.save(&dir).unwrap();

        let raw = std::fs::read_to_string(dir.file(STATE_FILE)).unwrap();
        assert!(raw.contains("media_tree.route = #Shows/Season%201/e01.mkv"));
        assert_eq!(PersistedState::load(&dir), state);

        save_file_list(&dir, &["a/b.mp4".to_string(), "c.jpg".to_string()]).unwrap();
        assert_eq!(load_file_list(&dir), vec!["a/b.mp4", "c.jpg"]);

        std::fs::remove_dir_all(&dir.dir).unwrap();
    }

    #[test]
    fn test_state_parse_tolerates_bad_values() {
        let state = PersistedState::parse(
            "media_tree.volume = 7\nmedia_tree.loop = yes\nother.route = #x\nmedia_tree.route = \n",
        );
        assert_eq!(state.volume, 1.0);
        assert!(!state.loop_enabled);
        assert_eq!(state.route, "");
    }

    #[test]
    fn test_root_dir_from_prefix() {
        assert_eq!(root_dir_from_prefix("file:///srv/m"), Some(PathBuf::from("/srv/m")));
        assert_eq!(root_dir_from_prefix(""), None);
    }
}
