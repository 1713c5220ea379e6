//! Input handling: maps key/mouse events to state mutations.

use std::time::{Duration, Instant};

use crossterm::event::{
    KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
};

use crate::core::viewport::{FullscreenRequest, ViewerKey};
use crate::ui::layout::{contains, AppLayout};

use super::event::AppEvent;
use super::state::{AppState, Request};

/// Apply one event from the shared channel.
pub fn handle_event(state: &mut AppState, event: AppEvent) {
    match event {
        AppEvent::Key(k) => handle_key(state, k),
        AppEvent::Mouse(m) => handle_mouse(state, m),
        AppEvent::Resize(w, h) => state.terminal_area = ratatui::layout::Rect::new(0, 0, w, h),
        AppEvent::Tick => {}
        AppEvent::FsChanged => state.requests.push(Request::Rescan),
        AppEvent::Rescanned(result) => state.on_rescanned(result),
        AppEvent::ThumbnailDecoded { rel_path, result } => state.thumbnails.finish(&rel_path, result),
        AppEvent::ViewerImageLoaded { source, result } => state.on_viewer_image(&source, result),
        AppEvent::MetadataLoaded { source, duration } => state.on_metadata(&source, duration),
        AppEvent::FullscreenChanged(active) => state.on_fullscreen_changed(active),
    }
}

/// Process a key event, dispatching on whether a viewer is open.
pub fn handle_key(state: &mut AppState, key: KeyEvent) {
    if key.kind == KeyEventKind::Release {
        return;
    }
    // Ctrl+c always quits, regardless of view.
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        state.should_quit = true;
        return;
    }
    state.status_message = None;

    if state.viewer.is_some() {
        handle_viewer_key(state, key);
    } else {
        handle_listing_key(state, key);
    }
}

// ── listing ─────────────────────────────────────────────────────

fn handle_listing_key(state: &mut AppState, key: KeyEvent) {
    let len = state.entries().len();
    match key.code {
        KeyCode::Char('q') => state.should_quit = true,
        KeyCode::Up | KeyCode::Char('k') => state.listing.select_prev(),
        KeyCode::Down | KeyCode::Char('j') => state.listing.select_next(len),
        KeyCode::PageUp => {
            let page = state.listing.height.max(1);
            state.listing.selected = state.listing.selected.saturating_sub(page);
        }
        KeyCode::PageDown => {
            let page = state.listing.height.max(1);
            state.listing.selected = (state.listing.selected + page).min(len.saturating_sub(1));
        }
        KeyCode::End => state.listing.selected = len.saturating_sub(1),
        KeyCode::Enter | KeyCode::Right | KeyCode::Char('l') => state.open_selected(),
        KeyCode::Backspace | KeyCode::Left | KeyCode::Char('h') => state.go_up(),
        KeyCode::Home | KeyCode::Char('~') => state.go_root(),
        KeyCode::Char('r') => state.requests.push(Request::Rescan),
        _ => {}
    }
}

// ── viewer ──────────────────────────────────────────────────────

fn handle_viewer_key(state: &mut AppState, key: KeyEvent) {
    let now = Instant::now();
    if key.code == KeyCode::Esc {
        if state.fullscreen {
            state
                .requests
                .push(Request::Fullscreen(FullscreenRequest::Exit));
        } else {
            state.close_viewer();
        }
        return;
    }

    let Some(viewer) = state.viewer.as_mut() else {
        return;
    };
    if let Some(effect) = viewer.handle_key(viewer_key(key.code), now) {
        state.apply_viewer_effect(effect);
    }
}

/// Input-library independent form of a key.
pub fn viewer_key(code: KeyCode) -> ViewerKey {
    match code {
        KeyCode::Char(c) => ViewerKey::Char(c),
        KeyCode::Left => ViewerKey::Left,
        KeyCode::Right => ViewerKey::Right,
        KeyCode::Up => ViewerKey::Up,
        KeyCode::Down => ViewerKey::Down,
        _ => ViewerKey::Other,
    }
}

// ── mouse ───────────────────────────────────────────────────────

pub fn handle_mouse(state: &mut AppState, mouse: MouseEvent) {
    let layout = AppLayout::from_area(state.terminal_area, state.fullscreen);
    let now = Instant::now();
    let double_click = Duration::from_millis(state.config.double_click_ms);

    if let Some(listing) = layout.listing_area {
        if contains(listing, mouse.column, mouse.row) {
            handle_listing_mouse(state, mouse, listing, now, double_click);
            return;
        }
    }

    if state.viewer.is_some() && contains(layout.side_area, mouse.column, mouse.row) {
        handle_viewer_mouse(state, mouse, now, double_click);
    } else if let MouseEventKind::Up(_) = mouse.kind {
        if let Some(viewer) = state.viewer.as_mut() {
            viewer.viewport.end_drag();
        }
        state.drag_anchor = None;
    }
}

fn handle_listing_mouse(
    state: &mut AppState,
    mouse: MouseEvent,
    area: ratatui::layout::Rect,
    now: Instant,
    double_click: Duration,
) {
    let len = state.entries().len();
    match mouse.kind {
        MouseEventKind::Down(MouseButton::Left) => {
            let top = area.y.saturating_add(1);
            if mouse.row < top {
                return;
            }
            let Some(row) = state.listing.row_at((mouse.row - top) as usize, len) else {
                state.last_left_click = None;
                return;
            };
            state.listing.selected = row;
            let repeat = state
                .last_left_click
                .is_some_and(|(last, at)| last == row && now.duration_since(at) <= double_click);
            if repeat {
                state.last_left_click = None;
                state.open_selected();
            } else {
                state.last_left_click = Some((row, now));
            }
        }
        MouseEventKind::ScrollUp => state.listing.select_prev(),
        MouseEventKind::ScrollDown => state.listing.select_next(len),
        _ => {}
    }
}

fn handle_viewer_mouse(state: &mut AppState, mouse: MouseEvent, now: Instant, double_click: Duration) {
    let Some(viewer) = state.viewer.as_mut() else {
        return;
    };
    viewer.viewport.touch(now);
    match mouse.kind {
        MouseEventKind::ScrollUp => viewer.viewport.wheel(true, now),
        MouseEventKind::ScrollDown => viewer.viewport.wheel(false, now),
        MouseEventKind::Down(MouseButton::Middle) => {
            viewer.viewport.start_drag();
            state.drag_anchor = Some((mouse.column, mouse.row));
        }
        MouseEventKind::Drag(MouseButton::Middle) => {
            if let Some((x, y)) = state.drag_anchor {
                // One cell is one pixel wide and two tall.
                let dx = mouse.column as f64 - x as f64;
                let dy = (mouse.row as f64 - y as f64) * 2.0;
                viewer.viewport.pan(dx, dy);
            }
            state.drag_anchor = Some((mouse.column, mouse.row));
        }
        MouseEventKind::Up(MouseButton::Middle) => {
            viewer.viewport.end_drag();
            state.drag_anchor = None;
        }
        MouseEventKind::Down(MouseButton::Left) => {
            let repeat = state
                .last_viewer_click
                .is_some_and(|at| now.duration_since(at) <= double_click);
            if repeat {
                state.last_viewer_click = None;
                let request = viewer.viewport.request_toggle();
                state.requests.push(Request::Fullscreen(request));
            } else {
                state.last_viewer_click = Some(now);
            }
        }
        _ => {}
    }
}
