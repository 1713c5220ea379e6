//! Media viewer pane.
//!
//! Images are drawn with the viewport transform applied.  Videos get a
//! transport panel (state, timeline with A/B markers, zoom, speed and
//! volume).  Control bars are only drawn while the controller reports
//! them visible.

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Widget},
};

use crate::app::state::ViewerImage;
use crate::core::{
    playback::{percent, timestamp, PlaybackState},
    slicer::{PlaybackSlicer, SlicePhase},
    viewer::Viewer,
    viewport::{ViewerKind, ViewportState},
};

use super::{halfblock, theme::Theme};

const IMAGE_HINT: &str = " q/e rotate  x/c zoom  wasd pan  z reset  f fullscreen  Esc close ";
const VIDEO_HINT: &str = " space play  ←/→ seek  ↑/↓ volume  b A/B  l loop  ,/. frame  </> speed ";

pub struct ViewerWidget<'a> {
    pub viewer: &'a Viewer,
    pub image: &'a ViewerImage,
}

impl<'a> Widget for ViewerWidget<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        Clear.render(area, buf);

        let view = self.viewer.viewport.state();
        let name = self
            .viewer
            .rel_path
            .rsplit('/')
            .next()
            .unwrap_or(&self.viewer.rel_path);
        let mut block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::LightBlue));
        if view.controls_visible {
            block = block.title(Span::styled(
                format!(" {name} "),
                Style::default()
                    .fg(Color::White)
                    .add_modifier(Modifier::BOLD),
            ));
        }
        let inner = block.inner(area);
        block.render(area, buf);

        let panel_h = match (self.viewer.kind(), view.controls_visible) {
            (ViewerKind::Video, true) => 3,
            (ViewerKind::Image, true) => 1,
            (_, false) => 0,
        };
        let panel_h = panel_h.min(inner.height);
        let content = Rect::new(inner.x, inner.y, inner.width, inner.height - panel_h);
        let panel = Rect::new(inner.x, inner.y + content.height, inner.width, panel_h);

        match &self.viewer.video {
            Some(video) => {
                render_video_placeholder(view, content, buf);
                if panel_h > 0 {
                    render_transport(&video.playback, &video.slicer, view, panel, buf);
                }
            }
            None => {
                match self.image {
                    ViewerImage::Ready(img) => {
                        halfblock::render_transformed(img, content, view, buf)
                    }
                    ViewerImage::Loading => centred(content, "Loading…", buf),
                    ViewerImage::Unsupported => centred(content, "Cannot display this image", buf),
                }
                if panel_h > 0 {
                    let line = Line::from(vec![
                        Span::styled(transform_summary(view), Theme::controls_style()),
                        Span::styled(IMAGE_HINT, Theme::hint_style()),
                    ]);
                    buf.set_line(panel.x, panel.y, &line, panel.width);
                }
            }
        }
    }
}

/// Terminal frames can't show video pixels; show the transform instead.
fn render_video_placeholder(view: &ViewportState, area: Rect, buf: &mut Buffer) {
    let arrow = match view.rotation.degrees() {
        90 => "▶",
        180 => "▼",
        270 => "◀",
        _ => "▲",
    };
    centred(area, &format!("{arrow}  video  {}", transform_summary(view)), buf);
}

fn render_transport(
    playback: &PlaybackState,
    slicer: &PlaybackSlicer,
    view: &ViewportState,
    area: Rect,
    buf: &mut Buffer,
) {
    let state = if playback.playing { "▶ playing" } else { "⏸ paused" };
    let clock = if playback.has_duration() {
        format!(
            "{} / {}  {}",
            timestamp(playback.position),
            timestamp(playback.duration),
            percent(playback.progress_fraction())
        )
    } else {
        format!("{} / --:--", timestamp(playback.position))
    };
    let top = Line::from(vec![
        Span::styled(format!(" {state} "), Theme::controls_style()),
        Span::raw(format!(" {clock}")),
    ]);
    buf.set_line(area.x, area.y, &top, area.width);

    if area.height > 1 {
        let bar = timeline(playback, slicer, area.width.saturating_sub(2) as usize);
        buf.set_line(area.x + 1, area.y + 1, &bar, area.width.saturating_sub(2));
    }

    if area.height > 2 {
        let volume = if playback.muted {
            "muted".to_string()
        } else {
            percent(playback.volume)
        };
        let slice = match slicer.phase() {
            SlicePhase::Unset => String::new(),
            SlicePhase::MarkingStart => format!("  A {}", timestamp(slicer.start())),
            SlicePhase::Looping => format!(
                "  A {} B {}",
                timestamp(slicer.start()),
                timestamp(slicer.end())
            ),
        };
        let bottom = Line::from(vec![
            Span::raw(format!(
                " {}  speed {}  volume {volume}{}{slice} ",
                transform_summary(view),
                percent(playback.speed),
                if playback.loop_enabled { "  loop" } else { "" },
            )),
            Span::styled(VIDEO_HINT, Theme::hint_style()),
        ]);
        buf.set_line(area.x, area.y + 2, &bottom, area.width);
    }
}

/// Progress bar with `A`/`B` marker columns.
fn timeline(playback: &PlaybackState, slicer: &PlaybackSlicer, width: usize) -> Line<'static> {
    if width == 0 {
        return Line::default();
    }
    let column = |t: f64| -> Option<usize> {
        if !playback.has_duration() {
            return None;
        }
        let f = (t / playback.duration).clamp(0.0, 1.0);
        Some(((f * (width - 1) as f64).round() as usize).min(width - 1))
    };
    let filled = (playback.progress_fraction() * width as f64).round() as usize;
    let a = match slicer.phase() {
        SlicePhase::Unset => None,
        _ => column(slicer.start()),
    };
    let b = match slicer.phase() {
        SlicePhase::Looping => column(slicer.end()),
        _ => None,
    };

    let spans: Vec<Span<'static>> = (0..width)
        .map(|i| {
            if Some(i) == a {
                Span::styled("A", Theme::marker_style())
            } else if Some(i) == b {
                Span::styled("B", Theme::marker_style())
            } else if i < filled {
                Span::styled("━", Theme::timeline_style())
            } else {
                Span::styled("─", Theme::hint_style())
            }
        })
        .collect();
    Line::from(spans)
}

fn transform_summary(view: &ViewportState) -> String {
    format!(
        " {}°  zoom {} ",
        view.rotation.degrees(),
        percent(view.zoom)
    )
}

fn centred(area: Rect, text: &str, buf: &mut Buffer) {
    if area.height == 0 {
        return;
    }
    let y = area.y + area.height / 2;
    Paragraph::new(Line::from(Span::styled(text.to_string(), Theme::hint_style())))
        .alignment(ratatui::layout::Alignment::Center)
        .render(Rect::new(area.x, y, area.width, 1), buf);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::media::MediaKind;
    use crate::core::viewer::ViewerSettings;
    use std::time::Instant;

    fn text(buf: &Buffer) -> String {
        let area = buf.area;
        let mut out = String::new();
        for y in 0..area.height {
            for x in 0..area.width {
                out.push_str(buf[(x, y)].symbol());
            }
            out.push('\n');
        }
        out
    }

    fn video() -> Viewer {
        let mut v = Viewer::open(
            "clips/a.mp4",
            "file:///m/clips/a.mp4",
            MediaKind::Video,
            &ViewerSettings::default(),
            0.5,
            false,
        );
        v.on_metadata_loaded(Some(100.0));
        v
    }

    #[test]
    fn test_controls_hidden_until_interaction() {
        let mut v = video();
        let area = Rect::new(0, 0, 120, 10);
        let image = ViewerImage::Loading;

        let mut buf = Buffer::empty(area);
        ViewerWidget { viewer: &v, image: &image }.render(area, &mut buf);
        assert!(!text(&buf).contains("volume"));

        v.viewport.touch(Instant::now());
        let mut buf = Buffer::empty(area);
        ViewerWidget { viewer: &v, image: &image }.render(area, &mut buf);
        let shown = text(&buf);
        assert!(shown.contains("volume 50%"));
        assert!(shown.contains("a.mp4"));
    }

    #[test]
    fn test_timeline_places_markers() {
        let mut v = video();
        let session = v.video.as_mut().unwrap();
        session.slicer.mark(0.0);
        session.slicer.mark(100.0);
        let line = timeline(&session.playback, &session.slicer, 11);
        let s: String = line.spans.iter().map(|s| s.content.as_ref()).collect();
        assert!(s.starts_with('A'));
        assert!(s.ends_with('B'));
    }

    #[test]
    fn test_unsupported_image_shows_fallback() {
        let v = Viewer::open("x.png", "x.png", MediaKind::Image, &ViewerSettings::default(), 1.0, false);
        let area = Rect::new(0, 0, 60, 7);
        let mut buf = Buffer::empty(area);
        ViewerWidget { viewer: &v, image: &ViewerImage::Unsupported }.render(area, &mut buf);
        assert!(text(&buf).contains("Cannot display this image"));
    }
}
