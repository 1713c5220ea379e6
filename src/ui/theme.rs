//! Colour palette and text styles used across the UI.

use ratatui::style::{Color, Modifier, Style};

use crate::core::media::MediaKind;

/// Central theme: change colours here and they propagate everywhere.
pub struct Theme;

impl Theme {
    // ── listing ────────────────────────────────────────────────
    pub fn dir_style() -> Style {
        Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD)
    }

    pub fn media_style(media: MediaKind) -> Style {
        match media {
            MediaKind::Video => Style::default().fg(Color::LightMagenta),
            MediaKind::Image => Style::default().fg(Color::LightGreen),
            MediaKind::Other => Style::default().fg(Color::DarkGray),
        }
    }

    pub fn selected_style() -> Style {
        Style::default()
            .bg(Color::DarkGray)
            .add_modifier(Modifier::BOLD)
    }

    pub fn hint_style() -> Style {
        Style::default().fg(Color::DarkGray)
    }

    // ── viewer ─────────────────────────────────────────────────
    pub fn controls_style() -> Style {
        Style::default().bg(Color::Black).fg(Color::White)
    }

    pub fn timeline_style() -> Style {
        Style::default().fg(Color::LightBlue)
    }

    pub fn marker_style() -> Style {
        Style::default()
            .fg(Color::Yellow)
            .add_modifier(Modifier::BOLD)
    }

    // ── chrome ─────────────────────────────────────────────────
    pub fn border_style() -> Style {
        Style::default().fg(Color::Gray)
    }

    pub fn title_style() -> Style {
        Style::default()
            .fg(Color::Green)
            .add_modifier(Modifier::BOLD)
    }

    pub fn status_bar_style() -> Style {
        Style::default().bg(Color::DarkGray).fg(Color::White)
    }
}
