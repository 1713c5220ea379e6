//! Side pane shown while no viewer is open: details and thumbnail of the
//! selected listing entry.

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Widget},
};

use crate::core::{
    thumbnail::{ThumbState, ThumbnailCache},
    tree::{FileTree, NodeId},
};

use super::{halfblock, theme::Theme};

pub struct PreviewWidget<'a> {
    pub tree: &'a FileTree,
    pub selected: Option<NodeId>,
    pub thumbnails: &'a ThumbnailCache,
}

impl<'a> Widget for PreviewWidget<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let block = Block::default()
            .title(" Preview ")
            .title_style(Theme::title_style())
            .borders(Borders::ALL)
            .border_style(Theme::border_style());
        let inner = block.inner(area);
        block.render(area, buf);

        let Some(id) = self.selected else {
            return;
        };
        let node = self.tree.get(id);
        let kind = match node.media() {
            Some(media) => media.label(),
            None => "directory",
        };
        let lines = vec![
            Line::from(Span::styled(node.name.clone(), Theme::title_style())),
            Line::from(Span::styled(format!("{kind} · {}", node.rel_path), Theme::hint_style())),
        ];
        let text_h = (lines.len() as u16).min(inner.height);
        Paragraph::new(lines).render(Rect::new(inner.x, inner.y, inner.width, text_h), buf);

        let image_area = Rect::new(
            inner.x,
            inner.y + text_h + 1,
            inner.width,
            inner.height.saturating_sub(text_h + 1),
        );
        let message = match self.thumbnails.get(&node.rel_path) {
            Some(ThumbState::Ready(img)) => {
                halfblock::render_fit(img, image_area, buf);
                return;
            }
            Some(ThumbState::Pending) => "Loading…",
            Some(ThumbState::Unsupported) => "No preview",
            None if node.media().is_some_and(|m| m.is_viewable()) => "Loading…",
            None if node.is_dir() => "Enter to open",
            None => "No preview",
        };
        if image_area.height > 0 {
            buf.set_line(
                image_area.x,
                image_area.y,
                &Line::from(Span::styled(message, Theme::hint_style())),
                image_area.width,
            );
        }
    }
}
