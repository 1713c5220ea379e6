//! Filesystem traversal: turn a picked directory into the flat, ordered
//! list of relative file paths the [`FileTree`](super::tree::FileTree) is
//! built from.
//!
//! The walker respects `.gitignore` rules via the [`ignore`] crate.

use std::path::{Component, Path};

use anyhow::Context;
use ignore::WalkBuilder;

/// Configuration knobs for the traversal.
#[derive(Debug, Clone)]
pub struct ScanConfig {
    /// Respect `.gitignore` files.
    pub respect_gitignore: bool,
    /// Show hidden (dot-prefixed) entries.
    pub show_hidden: bool,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            respect_gitignore: true,
            show_hidden: false,
        }
    }
}

/// List every file under `root` as a `/`-separated path relative to it.
///
/// Entries are yielded depth-first with siblings sorted by file name, so
/// the same directory always produces the same listing order.  Directories
/// themselves are not listed; they are implied by their files.
pub fn scan_relative_paths(root: &Path, config: &ScanConfig) -> anyhow::Result<Vec<String>> {
    let meta = std::fs::metadata(root).with_context(|| format!("cannot read {}", root.display()))?;
    anyhow::ensure!(meta.is_dir(), "{} is not a directory", root.display());

    let walker = WalkBuilder::new(root)
        .hidden(!config.show_hidden)
        .git_ignore(config.respect_gitignore)
        .sort_by_file_name(|a, b| a.cmp(b))
        .build();

    let mut paths = Vec::new();
    for entry in walker.flatten() {
        if !entry.file_type().is_some_and(|ft| ft.is_file()) {
            continue;
        }
        if let Some(rel) = relative_slash_path(root, entry.path()) {
            paths.push(rel);
        }
    }
    Ok(paths)
}

/// `path` relative to `root`, joined with `/` whatever the platform.
pub fn relative_slash_path(root: &Path, path: &Path) -> Option<String> {
    let rel = path.strip_prefix(root).ok()?;
    let parts: Vec<String> = rel
        .components()
        .filter_map(|c| match c {
            Component::Normal(s) => Some(s.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect();
    (!parts.is_empty()).then(|| parts.join("/"))
}

/// Filesystem path of a tree-relative path under `root`.
pub fn resolve_on_disk(root: &Path, rel_path: &str) -> std::path::PathBuf {
    rel_path
        .split('/')
        .filter(|s| !s.is_empty())
        .fold(root.to_path_buf(), |acc, seg| acc.join(seg))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("media-tree-{name}-{}", std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn test_scan_lists_files_relative_and_sorted() {
        let root = scratch_dir("scan");
        std::fs::create_dir_all(root.join("b/inner")).unwrap();
        std::fs::write(root.join("b/inner/clip.mp4"), b"").unwrap();
        std::fs::write(root.join("b/a.png"), b"").unwrap();
        std::fs::write(root.join("a.txt"), b"").unwrap();
        std::fs::write(root.join(".hidden.jpg"), b"").unwrap();

        let paths = scan_relative_paths(&root, &ScanConfig::default()).unwrap();
        assert_eq!(paths, vec!["a.txt", "b/a.png", "b/inner/clip.mp4"]);

        let with_hidden = ScanConfig {
            show_hidden: true,
            ..ScanConfig::default()
        };
        let paths = scan_relative_paths(&root, &with_hidden).unwrap();
        assert!(paths.contains(&".hidden.jpg".to_string()));

        std::fs::remove_dir_all(&root).unwrap();
    }

    #[test]
    fn test_scan_rejects_missing_root() {
        assert!(scan_relative_paths(Path::new("/no/such/media/dir"), &ScanConfig::default()).is_err());
    }

    #[test]
    fn test_relative_and_on_disk_paths() {
        let root = Path::new("/media");
        assert_eq!(
            relative_slash_path(root, Path::new("/media/x/y.mp4")).as_deref(),
            Some("x/y.mp4")
        );
        assert_eq!(relative_slash_path(root, root), None);
        assert_eq!(resolve_on_disk(root, "x/y.mp4"), PathBuf::from("/media/x/y.mp4"));
    }
}
