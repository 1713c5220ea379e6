//! Layout helpers: split the terminal area into regions.

use ratatui::layout::{Constraint, Direction, Layout, Position, Rect};

/// Primary screen layout: listing on the left, preview or viewer on the
/// right, and a bottom status bar.  Fullscreen gives the right-hand pane
/// the whole screen.
pub struct AppLayout {
    pub listing_area: Option<Rect>,
    pub side_area: Rect,
    pub status_area: Rect,
}

impl AppLayout {
    /// Compute the layout from the full terminal area.
    pub fn from_area(area: Rect, fullscreen: bool) -> Self {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Min(3),    // content (takes all remaining space)
                Constraint::Length(1), // status bar
            ])
            .split(area);

        if fullscreen {
            return Self {
                listing_area: None,
                side_area: chunks[0],
                status_area: chunks[1],
            };
        }

        let panes = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(40), Constraint::Percentage(60)])
            .split(chunks[0]);

        Self {
            listing_area: Some(panes[0]),
            side_area: panes[1],
            status_area: chunks[1],
        }
    }
}

pub fn contains(rect: Rect, column: u16, row: u16) -> bool {
    rect.contains(Position::new(column, row))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fullscreen_hides_listing() {
        let area = Rect::new(0, 0, 100, 30);
        let normal = AppLayout::from_area(area, false);
        assert!(normal.listing_area.is_some());
        assert_eq!(normal.status_area.height, 1);

        let full = AppLayout::from_area(area, true);
        assert!(full.listing_area.is_none());
        assert_eq!(full.side_area.width, 100);
        assert_eq!(full.side_area.height, 29);
    }
}
