//! Route handling: the persisted "where am I" string and its resolution
//! against the current [`FileTree`].
//!
//! The route is a `/`-joined relative path.  It is authoritative in both
//! directions: route changes drive navigation, and navigating into a
//! directory writes the route back.

use super::media::MediaKind;
use super::tree::{join, FileTree, NodeId, NodeKind};

// ───────────────────────────────────────── events ────────────

/// What a resolved route asks the rest of the app to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteEvent {
    /// Show this directory in the listing.
    Navigate(NodeId),
    /// Open a viewer for this media file.
    Select {
        node: NodeId,
        absolute_path: String,
        media: MediaKind,
    },
}

// ───────────────────────────────────────── resolver ──────────

/// Holds the current route and turns it into [`RouteEvent`]s.
#[derive(Debug, Clone, Default)]
pub struct RouteResolver {
    route: String,
    root_prefix: String,
    /// Tree generation the last event was computed against.
    resolved_generation: Option<u64>,
}

impl RouteResolver {
    pub fn new(route: impl Into<String>, root_prefix: impl Into<String>) -> Self {
        Self {
            route: route.into(),
            root_prefix: root_prefix.into(),
            resolved_generation: None,
        }
    }

    pub fn route(&self) -> &str {
        &self.route
    }

    pub fn root_prefix(&self) -> &str {
        &self.root_prefix
    }

    pub fn set_root_prefix(&mut self, prefix: &str) {
        self.root_prefix = normalize_root_prefix(prefix);
    }

    /// `true` when `tree` was rebuilt since the last emitted event, meaning
    /// any node id the caller holds from that event is invalid.
    pub fn is_stale(&self, tree: &FileTree) -> bool {
        self.resolved_generation != Some(tree.generation())
    }

    /// External route change (address-bar style navigation).
    pub fn set_route(&mut self, route: impl Into<String>, tree: &FileTree) -> RouteEvent {
        self.route = route.into();
        self.emit(tree)
    }

    /// User opened `id` from the listing.  Directories and viewable leaves
    /// write their path back into the route; `other` leaves can't be opened
    /// and leave the route untouched.
    pub fn open(&mut self, id: NodeId, tree: &FileTree) -> Option<RouteEvent> {
        let node = tree.get(id);
        if let NodeKind::Leaf { media } = node.kind {
            if !media.is_viewable() {
                return None;
            }
        }
        self.route = node.rel_path.clone();
        Some(self.emit(tree))
    }

    /// Re-run resolution after the tree changed underneath us.
    pub fn on_rebuild(&mut self, tree: &FileTree) -> RouteEvent {
        self.emit(tree)
    }

    fn emit(&mut self, tree: &FileTree) -> RouteEvent {
        let event = self.resolve(tree);
        self.resolved_generation = Some(tree.generation());
        tracing::debug!(route = %self.route, ?event, "route resolved");
        event
    }

    /// Pure resolution of the current route against `tree`.
    pub fn resolve(&self, tree: &FileTree) -> RouteEvent {
        let id = walk(tree, &self.route);
        let node = tree.get(id);
        match node.kind {
            NodeKind::Directory { .. } => RouteEvent::Navigate(id),
            NodeKind::Leaf { media } if media.is_viewable() => RouteEvent::Select {
                node: id,
                absolute_path: absolute_path(&self.root_prefix, &node.rel_path),
                media,
            },
            NodeKind::Leaf { .. } => RouteEvent::Navigate(node.parent.unwrap_or(tree.root())),
        }
    }
}

/// Walk `path` segment by segment from the root.  Stops at the first
/// segment with no matching child, or on reaching a leaf, and returns the
/// deepest node matched (the root if nothing matched).
pub fn walk(tree: &FileTree, path: &str) -> NodeId {
    let mut current = tree.root();
    for segment in path.split('/').filter(|s| !s.is_empty()) {
        if !tree.get(current).is_dir() {
            break;
        }
        match tree.child_by_name(current, segment) {
            Some(child) => current = child,
            None => break,
        }
    }
    current
}

// ───────────────────────────────────────── paths ─────────────

/// Strip trailing slashes and add a `file://` scheme when none is given.
pub fn normalize_root_prefix(prefix: &str) -> String {
    let trimmed = prefix.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        return String::new();
    }
    if trimmed.contains("://") {
        trimmed.to_string()
    } else {
        format!("file://{trimmed}")
    }
}

/// URI-encoded `root_prefix/rel_path`.
pub fn absolute_path(root_prefix: &str, rel_path: &str) -> String {
    encode_uri(&join(root_prefix, rel_path))
}

// ───────────────────────────────────────── fragment codec ────

/// `""` for the root, otherwise `#` + URI-encoded path.
pub fn encode_fragment(path: &str) -> String {
    if path.is_empty() {
        String::new()
    } else {
        format!("#{}", encode_uri(path))
    }
}

/// Inverse of [`encode_fragment`].  Malformed escapes degrade to the raw text.
pub fn decode_fragment(fragment: &str) -> String {
    let raw = fragment.strip_prefix('#').unwrap_or(fragment);
    decode_uri(raw).unwrap_or_else(|| raw.to_string())
}

fn is_uri_safe(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b";,/?:@&=+$-_.!~*'()#".contains(&b)
}

/// Percent-encode everything outside the URI reserved/unreserved sets.
pub fn encode_uri(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for &b in s.as_bytes() {
        if is_uri_safe(b) {
            out.push(b as char);
        } else {
            out.push_str(&format!("%{b:02X}"));
        }
    }
    out
}

/// Decode `%XX` escapes.  `None` on a truncated/invalid escape or when the
/// decoded bytes are not UTF-8.
pub fn decode_uri(s: &str) -> Option<String> {
    let bytes = s.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            let hex = s.get(i + 1..i + 3)?;
            if !hex.bytes().all(|h| h.is_ascii_hexdigit()) {
                return None;
            }
            out.push(u8::from_str_radix(hex, 16).ok()?);
            i += 3;
        } else {
            out.push(bytes[i]);
            i += 1;
        }
    }
    String::from_utf8(out).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> FileTree {
        FileTree::from_paths(["a/b.mp4", "a/c.jpg", "d.txt", "a/sub/notes.md"])
    }

    #[test]
    fn test_resolve_video_leaf_selects() {
        let tree = sample();
        let mut resolver = RouteResolver::new("", "");
        let event = resolver.set_route("a/b.mp4", &tree);
        assert_eq!(
            event,
            RouteEvent::Select {
                node: tree.find("a/b.mp4").unwrap(),
                absolute_path: "a/b.mp4".to_string(),
                media: MediaKind::Video,
            }
        );
    }

    #[test]
    fn test_resolve_missing_segment_navigates_to_deepest_match() {
        let tree = sample();
        let mut resolver = RouteResolver::new("", "");
        let a = tree.find("a").unwrap();
        assert_eq!(resolver.set_route("a/missing", &tree), RouteEvent::Navigate(a));
        assert_eq!(resolver.set_route("a/missing/deeper", &tree), RouteEvent::Navigate(a));
    }

    #[test]
    fn test_resolve_unknown_first_segment_falls_back_to_root() {
        let tree = sample();
        let resolver = RouteResolver::new("nope/a", "");
        assert_eq!(resolver.resolve(&tree), RouteEvent::Navigate(tree.root()));
        assert_eq!(RouteResolver::new("", "").resolve(&tree), RouteEvent::Navigate(tree.root()));
    }

    #[test]
    fn test_resolve_other_leaf_navigates_to_parent() {
        let tree = sample();
        let resolver = RouteResolver::new("a/sub/notes.md", "");
        let sub = tree.find("a/sub").unwrap();
        assert_eq!(resolver.resolve(&tree), RouteEvent::Navigate(sub));
        let resolver = RouteResolver::new("d.txt", "");
        assert_eq!(resolver.resolve(&tree), RouteEvent::Navigate(tree.root()));
    }

    #[test]
    fn test_walk_stops_at_leaf() {
        let tree = sample();
        assert_eq!(walk(&tree, "a/c.jpg/more"), tree.find("a/c.jpg").unwrap());
    }

    #[test]
    fn test_select_prefixes_root() {
        let tree = sample();
        let mut resolver = RouteResolver::new("", "");
        resolver.set_root_prefix("/home/me/My Videos/");
        match resolver.set_route("a/b.mp4", &tree) {
            RouteEvent::Select { absolute_path, .. } => {
                assert_eq!(absolute_path, "file:///home/me/My%20Videos/a/b.mp4");
            }
            other => panic!("expected select, got {other:?}"),
        }
    }

    #[test]
    fn test_open_directory_writes_route_back() {
        let tree = sample();
        let mut resolver = RouteResolver::new("", "");
        let sub = tree.find("a/sub").unwrap();
        assert_eq!(resolver.open(sub, &tree), Some(RouteEvent::Navigate(sub)));
        assert_eq!(resolver.route(), "a/sub");
        assert_eq!(encode_fragment(resolver.route()), "#a/sub");
    }

    #[test]
    fn test_open_other_leaf_is_ignored() {
        let tree = sample();
        let mut resolver = RouteResolver::new("a", "");
        let d = tree.find("d.txt").unwrap();
        assert_eq!(resolver.open(d, &tree), None);
        assert_eq!(resolver.route(), "a");
    }

    #[test]
    fn test_rebuild_marks_resolution_stale() {
        let mut tree = sample();
        let mut resolver = RouteResolver::new("a/c.jpg", "");
        resolver.on_rebuild(&tree);
        assert!(!resolver.is_stale(&tree));

        tree.rebuild(["a/c.jpg", "e.png"]);
        assert!(resolver.is_stale(&tree));
        let event = resolver.on_rebuild(&tree);
        assert!(!resolver.is_stale(&tree));
        assert!(matches!(
            event,
            RouteEvent::Select { node, .. } if node == tree.find("a/c.jpg").unwrap()
        ));
    }

    #[test]
    fn test_fragment_codec() {
        assert_eq!(encode_fragment(""), "");
        assert_eq!(encode_fragment("a b/ç.mp4"), "#a%20b/%C3%A7.mp4");
        assert_eq!(decode_fragment("#a%20b/%C3%A7.mp4"), "a b/ç.mp4");
        assert_eq!(decode_fragment(""), "");
        assert_eq!(decode_fragment("#100%"), "100%");
        assert_eq!(decode_fragment("#%zz"), "%zz");
    }

    #[test]
    fn test_normalize_root_prefix() {
        assert_eq!(normalize_root_prefix("/srv/media///"), "file:///srv/media");
        assert_eq!(normalize_root_prefix("file:///srv/media/"), "file:///srv/media");
        assert_eq!(normalize_root_prefix("   "), "");
    }
}
