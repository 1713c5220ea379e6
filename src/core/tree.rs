//! In-memory file tree built from a flat, ordered list of relative paths.
//!
//! The [`FileNode`] is the fundamental unit – it holds the name and relative
//! path of a single entry and links to its children via indices into an arena
//! (the [`FileTree`] struct).  Parents are stored as plain indices too, so the
//! back-reference never owns anything and there are no reference cycles.
//!
//! The root node always lives at index `0` and is never replaced: a rebuild
//! truncates the arena back to the root and re-inserts, so anyone holding the
//! tree keeps observing the same root.

use std::collections::HashMap;

use super::media::MediaKind;

// ───────────────────────────────────────── tree node ─────────

/// Index into [`FileTree`]'s arena.
pub type NodeId = usize;

/// Directory or leaf payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    /// Children in insertion (listing) order.
    Directory { children: Vec<NodeId> },
    Leaf { media: MediaKind },
}

/// A single node in the arena-allocated tree.
#[derive(Debug, Clone)]
pub struct FileNode {
    /// One path segment.
    pub name: String,
    /// `/`-joined path from the root; empty for the root itself.
    pub rel_path: String,
    /// Lookup-only back-reference, used for up-navigation and breadcrumbs.
    pub parent: Option<NodeId>,
    pub kind: NodeKind,
}

impl FileNode {
    pub fn is_dir(&self) -> bool {
        matches!(self.kind, NodeKind::Directory { .. })
    }

    /// Media kind for leaves, `None` for directories.
    pub fn media(&self) -> Option<MediaKind> {
        match self.kind {
            NodeKind::Leaf { media } => Some(media),
            NodeKind::Directory { .. } => None,
        }
    }

    pub fn children(&self) -> &[NodeId] {
        match &self.kind {
            NodeKind::Directory { children } => children,
            NodeKind::Leaf { .. } => &[],
        }
    }
}

/// Outcome counters for one [`FileTree::insert`] call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InsertStats {
    pub inserted: usize,
    /// Empty paths, duplicates and paths that would descend through a leaf.
    pub skipped: usize,
}

// ───────────────────────────────────────── arena tree ────────

/// Arena-backed file tree.
#[derive(Debug, Clone)]
pub struct FileTree {
    nodes: Vec<FileNode>,
    /// `rel_path` → node, so sibling lookups don't scan child lists.
    by_path: HashMap<String, NodeId>,
    /// Bumped by every [`FileTree::rebuild`]; node ids from an older
    /// generation must not be reused.
    generation: u64,
}

pub const ROOT: NodeId = 0;
const ROOT_NAME: &str = "Root";

impl Default for FileTree {
    fn default() -> Self {
        Self::new()
    }
}

impl FileTree {
    /// Create a tree holding only the root directory.
    pub fn new() -> Self {
        let root = FileNode {
            name: ROOT_NAME.to_string(),
            rel_path: String::new(),
            parent: None,
            kind: NodeKind::Directory {
                children: Vec::new(),
            },
        };
        let mut by_path = HashMap::new();
        by_path.insert(String::new(), ROOT);
        Self {
            nodes: vec![root],
            by_path,
            generation: 0,
        }
    }

    /// Convenience constructor: a fresh tree with `paths` inserted.
    pub fn from_paths<I, S>(paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut tree = Self::new();
        tree.insert(paths);
        tree
    }

    pub fn root(&self) -> NodeId {
        ROOT
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Return a reference to a node.
    pub fn get(&self, id: NodeId) -> &FileNode {
        &self.nodes[id]
    }

    /// Number of nodes, root included.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.get(ROOT).children().is_empty()
    }

    /// Find a direct child of `parent` by name.
    pub fn child_by_name(&self, parent: NodeId, name: &str) -> Option<NodeId> {
        let key = join(&self.nodes[parent].rel_path, name);
        self.by_path
            .get(&key)
            .copied()
            .filter(|&id| self.nodes[id].parent == Some(parent))
    }

    /// Look a node up by its full relative path.
    pub fn find(&self, rel_path: &str) -> Option<NodeId> {
        self.by_path.get(rel_path).copied()
    }

    /// Insert `/`-separated relative paths in order.
    ///
    /// Every segment but the last becomes a directory (created on first
    /// sight); the last becomes a leaf.  Empty segments are ignored.  When a
    /// path would need a directory where a leaf already exists, the leaf wins
    /// and the path is skipped; a path whose final node already exists is a
    /// duplicate and is skipped too.
    pub fn insert<I, S>(&mut self, paths: I) -> InsertStats
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut stats = InsertStats::default();
        for path in paths {
            if self.insert_one(path.as_ref()) {
                stats.inserted += 1;
            } else {
                stats.skipped += 1;
            }
        }
        stats
    }

    fn insert_one(&mut self, path: &str) -> bool {
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        let Some((last, dirs)) = segments.split_last() else {
            return false;
        };

        let mut current = ROOT;
        for &segment in dirs {
            current = match self.child_by_name(current, segment) {
                Some(id) if self.nodes[id].is_dir() => id,
                Some(_) => {
                    tracing::debug!("skipping {path:?}: {segment:?} is a file, not a directory");
                    return false;
                }
                None => self.add_child(
                    current,
                    segment,
                    NodeKind::Directory {
                        children: Vec::new(),
                    },
                ),
            };
        }

        if self.child_by_name(current, last).is_some() {
            tracing::debug!("skipping duplicate path {path:?}");
            return false;
        }
        let media = MediaKind::from_name(last);
        self.add_child(current, last, NodeKind::Leaf { media });
        true
    }

    /// Add a child under `parent_id` and return its [`NodeId`].
    fn add_child(&mut self, parent_id: NodeId, name: &str, kind: NodeKind) -> NodeId {
        let id = self.nodes.len();
        let rel_path = join(&self.nodes[parent_id].rel_path, name);
        self.by_path.insert(rel_path.clone(), id);
        self.nodes.push(FileNode {
            name: name.to_string(),
            rel_path,
            parent: Some(parent_id),
            kind,
        });
        if let NodeKind::Directory { children } = &mut self.nodes[parent_id].kind {
            children.push(id);
        }
        id
    }

    /// Drop every node below the root and insert `paths` afresh.
    ///
    /// The root keeps its id; all other ids are invalidated and the
    /// generation is bumped.
    pub fn rebuild<I, S>(&mut self, paths: I) -> InsertStats
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.nodes.truncate(1);
        if let NodeKind::Directory { children } = &mut self.nodes[ROOT].kind {
            children.clear();
        }
        self.by_path.clear();
        self.by_path.insert(String::new(), ROOT);
        self.generation = self.generation.wrapping_add(1);
        self.insert(paths)
    }

    /// Depth-first list of every leaf path, children visited in order.
    pub fn leaf_paths(&self) -> Vec<&str> {
        let mut out = Vec::new();
        self.collect_leaves(ROOT, &mut out);
        out
    }

    fn collect_leaves<'a>(&'a self, id: NodeId, out: &mut Vec<&'a str>) {
        let node = &self.nodes[id];
        match &node.kind {
            NodeKind::Leaf { .. } => out.push(&node.rel_path),
            NodeKind::Directory { children } => {
                for &child in children {
                    self.collect_leaves(child, out);
                }
            }
        }
    }

    /// Chain from the root down to `id` (inclusive), for breadcrumbs.
    pub fn ancestors(&self, id: NodeId) -> Vec<NodeId> {
        let mut chain = vec![id];
        let mut current = id;
        while let Some(parent) = self.nodes[current].parent {
            chain.push(parent);
            current = parent;
        }
        chain.reverse();
        chain
    }
}

/// Join two path fragments with `/`, treating an empty base as the root.
pub fn join(base: &str, name: &str) -> String {
    if base.is_empty() {
        name.to_string()
    } else {
        format!("{base}/{name}")
    }
}
