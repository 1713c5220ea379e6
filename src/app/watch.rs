//! Directory watching with a trailing debounce.
//!
//! The `notify` callback drops events the scan would not see anyway (the
//! app's own store, hidden entries, `.gitignore`d paths) and pings an
//! unbounded channel for the rest.  [`debounce`] collapses a burst of pings
//! into one call once the channel has been quiet for the whole window.

use std::path::{Component, Path, PathBuf};
use std::time::Duration;

use ignore::gitignore::Gitignore;
use notify::{RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;

use super::event::{AppEvent, EventSender};
use crate::core::fs::ScanConfig;

/// Decides which changed paths are worth a rescan.
#[derive(Debug, Clone)]
pub struct WatchFilter {
    root: PathBuf,
    excluded: Vec<PathBuf>,
    show_hidden: bool,
    gitignore: Option<Gitignore>,
}

impl WatchFilter {
    pub fn new(root: &Path, scan: &ScanConfig) -> Self {
        // The walker only applies .gitignore inside a repository.
        let gitignore = (scan.respect_gitignore && root.ancestors().any(|d| d.join(".git").exists()))
            .then(|| {
                let (matcher, err) = Gitignore::new(root.join(".gitignore"));
                if let Some(e) = err {
                    tracing::debug!("partial .gitignore for watcher: {e}");
                }
                matcher
            });
        Self {
            root: root.to_path_buf(),
            excluded: Vec::new(),
            show_hidden: scan.show_hidden,
            gitignore,
        }
    }

    /// Never report changes under `dir`.
    pub fn exclude(mut self, dir: &Path) -> Self {
        self.excluded
            .push(dir.canonicalize().unwrap_or_else(|_| dir.to_path_buf()));
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn is_relevant(&self, path: &Path) -> bool {
        if self.excluded.iter().any(|dir| path.starts_with(dir)) {
            return false;
        }
        let Ok(rel) = path.strip_prefix(&self.root) else {
            return false;
        };
        let hidden = rel.components().any(|c| match c {
            Component::Normal(name) => name.to_string_lossy().starts_with('.'),
            _ => false,
        });
        if hidden && !self.show_hidden {
            return false;
        }
        match &self.gitignore {
            Some(gi) if !rel.as_os_str().is_empty() => {
                !gi.matched_path_or_any_parents(rel, path.is_dir()).is_ignore()
            }
            _ => true,
        }
    }

    /// Events without paths (overflow, rescan hints) always count.
    fn wants(&self, event: &notify::Event) -> bool {
        !event.kind.is_access()
            && (event.paths.is_empty() || event.paths.iter().any(|p| self.is_relevant(p)))
    }
}

/// Watch the filter's root recursively; the returned watcher must be kept
/// alive.
pub fn spawn_watcher(
    filter: WatchFilter,
    window: Duration,
    events: EventSender,
) -> anyhow::Result<RecommendedWatcher> {
    let root = filter.root().to_path_buf();
    let (ping_tx, ping_rx) = mpsc::unbounded_channel::<()>();
    let mut watcher = notify::recommended_watcher(move |res: notify::Result<notify::Event>| {
        match res {
            Ok(event) if filter.wants(&event) => {
                let _ = ping_tx.send(());
            }
            Ok(_) => {}
            Err(e) => tracing::warn!("watcher error: {e}"),
        }
    })?;
    watcher.watch(&root, RecursiveMode::Recursive)?;

    tokio::spawn(debounce(ping_rx, window, move || {
        events.send(AppEvent::FsChanged).is_ok()
    }));
    tracing::info!(root = %root.display(), "watching for changes");
    Ok(watcher)
}

/// Call `fire` once per burst, `window` after the last ping of the burst.
/// Stops when the sender side closes or `fire` returns `false`.
pub async fn debounce<F>(mut pings: mpsc::UnboundedReceiver<()>, window: Duration, mut fire: F)
where
    F: FnMut() -> bool,
{
    while pings.recv().await.is_some() {
        loop {
            match tokio::time::timeout(window, pings.recv()).await {
                Ok(Some(())) => continue,
                Ok(None) => {
                    fire();
                    return;
                }
                Err(_) => break,
            }
        }
        if !fire() {
            return;
        }
    }
}
