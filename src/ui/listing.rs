//! Directory listing widget: the current directory's children in insertion
//! order, one row each.

use std::ops::Range;

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    text::{Line, Span},
    widgets::{Block, Borders, StatefulWidget, Widget},
};

use crate::core::{
    media::MediaKind,
    thumbnail::{ThumbState, ThumbnailCache},
    tree::{FileTree, NodeId},
};

use super::theme::Theme;

// ───────────────────────────────────────── state ─────────────

/// Persistent state for the listing (selected row, scroll offset).
#[derive(Debug, Default, Clone)]
pub struct ListingState {
    /// Index into the current directory's children.
    pub selected: usize,
    /// First visible row.
    pub offset: usize,
    /// Rows that fit on screen, as of the last render.
    pub height: usize,
}

impl ListingState {
    pub fn select_next(&mut self, max: usize) {
        if max > 0 && self.selected < max - 1 {
            self.selected += 1;
        }
    }

    pub fn select_prev(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }

    /// Keep the selection inside a list of `len` rows.
    pub fn clamp_to(&mut self, len: usize) {
        self.selected = self.selected.min(len.saturating_sub(1));
        self.offset = self.offset.min(self.selected);
    }

    /// Ensure the selected row is visible within the viewport of `height` rows.
    pub fn clamp_scroll(&mut self, height: usize) {
        self.height = height;
        if height == 0 {
            return;
        }
        if self.selected < self.offset {
            self.offset = self.selected;
        } else if self.selected >= self.offset + height {
            self.offset = self.selected - height + 1;
        }
    }

    /// Rows currently on screen, out of `len`.
    pub fn visible_range(&self, len: usize) -> Range<usize> {
        let start = self.offset.min(len);
        start..(start + self.height).min(len)
    }

    /// Row under screen line `line` of the listing body, if any.
    pub fn row_at(&self, line: usize, len: usize) -> Option<usize> {
        let row = self.offset + line;
        (line < self.height && row < len).then_some(row)
    }
}

// ───────────────────────────────────────── widget ────────────

/// Created fresh each frame.
pub struct ListingWidget<'a> {
    tree: &'a FileTree,
    dir: NodeId,
    thumbnails: &'a ThumbnailCache,
    focused: bool,
}

impl<'a> ListingWidget<'a> {
    pub fn new(tree: &'a FileTree, dir: NodeId, thumbnails: &'a ThumbnailCache) -> Self {
        Self {
            tree,
            dir,
            thumbnails,
            focused: true,
        }
    }

    pub fn focused(mut self, focused: bool) -> Self {
        self.focused = focused;
        self
    }

    /// `parent / dir (N)`.
    pub fn header(&self) -> String {
        let node = self.tree.get(self.dir);
        let count = node.children().len();
        match node.parent {
            Some(parent) => format!(" {} / {} ({count}) ", self.tree.get(parent).name, node.name),
            None => format!(" {} ({count}) ", node.name),
        }
    }

    fn row_line(&self, id: NodeId, selected: bool) -> Line<'static> {
        let node = self.tree.get(id);
        let (icon, style) = match node.media() {
            None => ("▸ ", Theme::dir_style()),
            Some(MediaKind::Video) => ("▶ ", Theme::media_style(MediaKind::Video)),
            Some(MediaKind::Image) => ("◆ ", Theme::media_style(MediaKind::Image)),
            Some(MediaKind::Other) => ("  ", Theme::media_style(MediaKind::Other)),
        };
        let style = if selected { Theme::selected_style() } else { style };

        let mut spans = vec![Span::styled(format!("{icon}{}", node.name), style)];
        if node.is_dir() {
            spans.push(Span::styled(
                format!(" {}", node.children().len()),
                Theme::hint_style(),
            ));
        } else if let Some(ThumbState::Pending) = self.thumbnails.get(&node.rel_path) {
            spans.push(Span::styled(" …", Theme::hint_style()));
        }
        Line::from(spans)
    }
}

impl<'a> StatefulWidget for ListingWidget<'a> {
    type State = ListingState;

    fn render(self, area: Rect, buf: &mut Buffer, state: &mut Self::State) {
        let border = if self.focused {
            Theme::title_style()
        } else {
            Theme::border_style()
        };
        let block = Block::default()
            .title(self.header())
            .title_style(Theme::title_style())
            .borders(Borders::ALL)
            .border_style(border);
        let inner = block.inner(area);
        block.render(area, buf);

        let children = self.tree.get(self.dir).children();
        state.clamp_to(children.len());
        state.clamp_scroll(inner.height as usize);

        if children.is_empty() {
            buf.set_line(
                inner.x,
                inner.y,
                &Line::from(Span::styled("(empty)", Theme::hint_style())),
                inner.width,
            );
            return;
        }

        for (i, row) in state.visible_range(children.len()).enumerate() {
            let line = self.row_line(children[row], row == state.selected);
            buf.set_line(inner.x, inner.y + i as u16, &line, inner.width);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scroll_follows_selection() {
        let mut state = ListingState::default();
        for _ in 0..7 {
            state.select_next(10);
        }
        state.clamp_scroll(5);
        assert_eq!(state.selected, 7);
        assert_eq!(state.offset, 3);
        assert_eq!(state.visible_range(10), 3..8);
        assert_eq!(state.row_at(0, 10), Some(3));
        assert_eq!(state.row_at(5, 10), None);
    }

    #[test]
    fn test_clamp_to_shorter_list() {
        let mut state = ListingState {
            selected: 9,
            offset: 8,
            height: 4,
        };
        state.clamp_to(3);
        assert_eq!(state.selected, 2);
        assert_eq!(state.offset, 2);
        assert_eq!(state.visible_range(3), 2..3);
    }

    #[test]
    fn test_header_names_parent_and_count() {
        let tree = FileTree::from_paths(["a/b/c.mp4", "a/b/d.png"]);
        let cache = ThumbnailCache::default();
        let b = tree.find("a/b").unwrap();
        assert_eq!(ListingWidget::new(&tree, b, &cache).header(), " a / b (2) ");
        assert_eq!(ListingWidget::new(&tree, tree.root(), &cache).header(), " Root (1) ");
    }

    #[test]
    fn test_render_lists_children_in_order() {
        let tree = FileTree::from_paths(["z.mp4", "a.png", "m/x.txt"]);
        let cache = ThumbnailCache::default();
        let area = Rect::new(0, 0, 20, 5);
        let mut buf = Buffer::empty(area);
        let mut state = ListingState::default();
        ListingWidget::new(&tree, tree.root(), &cache).render(area, &mut buf, &mut state);

        let line = |y: u16| -> String {
            (1..19).map(|x| buf[(x, y)].symbol().to_string()).collect::<String>()
        };
        assert!(line(1).starts_with("▶ z.mp4"));
        assert!(line(2).starts_with("◆ a.png"));
        assert!(line(3).starts_with("▸ m 1"));
        assert_eq!(state.height, 3);
    }
}
