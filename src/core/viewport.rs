//! Viewport control state shared by the image and video viewers.
//!
//! Keyboard handling is a pure function ([`apply_key`]) over
//! [`ViewportState`]; [`ViewportController`] wraps it with the parts that
//! depend on time and on the platform (auto-hiding controls, fullscreen
//! acknowledgement).

use std::time::{Duration, Instant};

pub const MIN_ZOOM: f64 = 0.1;
pub const ZOOM_STEP: f64 = 0.1;
/// Keyboard pan distance per press, multiplied by the current zoom.
pub const PAN_STEP: f64 = 16.0;
pub const DEFAULT_HIDE_DELAY: Duration = Duration::from_millis(1000);
pub const DEFAULT_IMAGE_MAX_ZOOM: f64 = 10.0;
pub const DEFAULT_VIDEO_MAX_ZOOM: f64 = 5.0;

// ───────────────────────────────────────── rotation ──────────

/// Quarter-turn rotation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Rotation {
    #[default]
    Deg0,
    Deg90,
    Deg180,
    Deg270,
}

impl Rotation {
    pub fn degrees(self) -> i32 {
        match self {
            Rotation::Deg0 => 0,
            Rotation::Deg90 => 90,
            Rotation::Deg180 => 180,
            Rotation::Deg270 => 270,
        }
    }

    /// Snap any angle to the nearest lower quarter turn, wrapping negatives
    /// forward (`-90` → `270`).
    pub fn from_degrees(deg: i32) -> Self {
        match deg.rem_euclid(360) / 90 {
            0 => Rotation::Deg0,
            1 => Rotation::Deg90,
            2 => Rotation::Deg180,
            _ => Rotation::Deg270,
        }
    }

    pub fn rotated(self, delta_deg: i32) -> Self {
        Self::from_degrees(self.degrees() + delta_deg)
    }

    /// Width and height swap at 90° and 270°.
    pub fn is_sideways(self) -> bool {
        matches!(self, Rotation::Deg90 | Rotation::Deg270)
    }
}

// ───────────────────────────────────────── state ─────────────

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Translation {
    pub x: f64,
    pub y: f64,
}

/// Transform and chrome state of one open viewer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewportState {
    pub rotation: Rotation,
    pub zoom: f64,
    /// Stored pan offset in pixels.  See [`ViewportState::rendered_offset`].
    pub translation: Translation,
    pub dragging: bool,
    /// Mirrors the platform; only changed by fullscreen-change notifications.
    pub fullscreen_active: bool,
    pub controls_visible: bool,
}

impl Default for ViewportState {
    fn default() -> Self {
        Self {
            rotation: Rotation::Deg0,
            zoom: 1.0,
            translation: Translation::default(),
            dragging: false,
            fullscreen_active: false,
            controls_visible: false,
        }
    }
}

impl ViewportState {
    /// Offset the renderer should apply.  Content that is not zoomed in is
    /// never shown shifted, whatever is stored in `translation`.
    pub fn rendered_offset(&self) -> Translation {
        if self.zoom > 1.0 {
            self.translation
        } else {
            Translation::default()
        }
    }

    fn zoomed_by(mut self, delta: f64, max_zoom: f64) -> Self {
        self.zoom = clamp_zoom(self.zoom + delta, max_zoom);
        self
    }

    fn shifted(mut self, dx: f64, dy: f64) -> Self {
        self.translation.x += dx;
        self.translation.y += dy;
        self
    }

    fn zoom_reset(mut self) -> Self {
        self.zoom = 1.0;
        self.translation = Translation::default();
        self
    }
}

/// Clamp to `[MIN_ZOOM, max_zoom]`, rounding to the step grid so repeated
/// ±0.1 steps don't drift.
pub fn clamp_zoom(zoom: f64, max_zoom: f64) -> f64 {
    let max_zoom = max_zoom.max(MIN_ZOOM);
    let snapped = (zoom * 100.0).round() / 100.0;
    if snapped.is_nan() {
        return 1.0_f64.clamp(MIN_ZOOM, max_zoom);
    }
    snapped.clamp(MIN_ZOOM, max_zoom)
}

// ───────────────────────────────────────── keys ──────────────

/// Which viewer owns the viewport.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewerKind {
    Image,
    Video,
}

/// Input-library independent key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewerKey {
    Char(char),
    Left,
    Right,
    Up,
    Down,
    Other,
}

/// Side effects a key asks for beyond the viewport transform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewCommand {
    ToggleFullscreen,
    SeekBackward,
    SeekForward,
    VolumeUp,
    VolumeDown,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KeyOutcome {
    pub state: ViewportState,
    /// `false` lets the caller apply its own modality-specific handling.
    pub handled: bool,
    pub command: Option<ViewCommand>,
}

/// The shared viewer key table.
///
/// Letters are matched case-insensitively.  Arrow keys are only claimed in
/// the video context.
pub fn apply_key(
    state: &ViewportState,
    key: ViewerKey,
    kind: ViewerKind,
    max_zoom: f64,
) -> KeyOutcome {
    let s = *state;
    let step = s.zoom * PAN_STEP;
    let done = |state: ViewportState| KeyOutcome {
        state,
        handled: true,
        command: None,
    };
    let command = |command: ViewCommand| KeyOutcome {
        state: s,
        handled: true,
        command: Some(command),
    };

    match key {
        ViewerKey::Char(c) => match c.to_ascii_lowercase() {
            'f' => command(ViewCommand::ToggleFullscreen),
            'q' => done(ViewportState {
                rotation: s.rotation.rotated(-90),
                ..s
            }),
            'e' => done(ViewportState {
                rotation: s.rotation.rotated(90),
                ..s
            }),
            'z' => done(s.zoom_reset()),
            'x' => done(s.zoomed_by(-ZOOM_STEP, max_zoom)),
            'c' => done(s.zoomed_by(ZOOM_STEP, max_zoom)),
            'w' => done(s.shifted(0.0, step)),
            'a' => done(s.shifted(step, 0.0)),
            's' => done(s.shifted(0.0, -step)),
            'd' => done(s.shifted(-step, 0.0)),
            _ => KeyOutcome {
                state: s,
                handled: false,
                command: None,
            },
        },
        ViewerKey::Left if kind == ViewerKind::Video => command(ViewCommand::SeekBackward),
        ViewerKey::Right if kind == ViewerKind::Video => command(ViewCommand::SeekForward),
        ViewerKey::Up if kind == ViewerKind::Video => command(ViewCommand::VolumeUp),
        ViewerKey::Down if kind == ViewerKind::Video => command(ViewCommand::VolumeDown),
        _ => KeyOutcome {
            state: s,
            handled: false,
            command: None,
        },
    }
}

// ───────────────────────────────────────── controller ────────

/// What the controller asks the platform for.  The answer arrives later
/// through [`ViewportController::on_fullscreen_change`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FullscreenRequest {
    Enter,
    Exit,
}

/// Per-viewer state machine.
#[derive(Debug, Clone)]
pub struct ViewportController {
    state: ViewportState,
    kind: ViewerKind,
    max_zoom: f64,
    hide_delay: Duration,
    hide_deadline: Option<Instant>,
    source: Option<String>,
}

impl ViewportController {
    pub fn new(kind: ViewerKind, max_zoom: f64, hide_delay: Duration) -> Self {
        Self {
            state: ViewportState::default(),
            kind,
            max_zoom: max_zoom.max(MIN_ZOOM),
            hide_delay,
            hide_deadline: None,
            source: None,
        }
    }

    pub fn state(&self) -> &ViewportState {
        &self.state
    }

    pub fn kind(&self) -> ViewerKind {
        self.kind
    }

    pub fn source(&self) -> Option<&str> {
        self.source.as_deref()
    }

    /// Bind to a new source.  Resets the transform and drops any pending
    /// hide deadline belonging to the previous source.
    pub fn set_source(&mut self, source: impl Into<String>) {
        self.source = Some(source.into());
        self.hide_deadline = None;
        self.state.controls_visible = false;
        self.reset();
    }

    /// Media metadata (re)loaded.
    pub fn on_metadata_loaded(&mut self) {
        self.reset();
    }

    /// Back to rotation 0, zoom 1, no offset.  Fullscreen is platform
    /// state and is left alone.
    pub fn reset(&mut self) {
        self.state.rotation = Rotation::Deg0;
        self.state.dragging = false;
        self.state = self.state.zoom_reset();
    }

    pub fn zoom(&mut self, delta: f64) {
        self.state = self.state.zoomed_by(delta, self.max_zoom);
    }

    /// Mouse wheel: scrolling up zooms in.
    pub fn wheel(&mut self, scroll_up: bool, now: Instant) {
        self.touch(now);
        self.zoom(if scroll_up { ZOOM_STEP } else { -ZOOM_STEP });
    }

    pub fn start_drag(&mut self) {
        self.state.dragging = true;
    }

    /// Accumulate pointer motion.  Ignored unless a drag is in progress.
    pub fn pan(&mut self, dx: f64, dy: f64) {
        if self.state.dragging {
            self.state = self.state.shifted(dx, dy);
        }
    }

    pub fn end_drag(&mut self) {
        self.state.dragging = false;
    }

    /// Ask the platform to flip fullscreen.  `fullscreen_active` is not
    /// touched here.
    pub fn request_toggle(&self) -> FullscreenRequest {
        if self.state.fullscreen_active {
            FullscreenRequest::Exit
        } else {
            FullscreenRequest::Enter
        }
    }

    /// Platform notification: fullscreen is now `active`.
    pub fn on_fullscreen_change(&mut self, active: bool) {
        self.state.fullscreen_active = active;
    }

    /// Any interaction: show controls and push the hide deadline out.
    pub fn touch(&mut self, now: Instant) {
        self.state.controls_visible = true;
        self.hide_deadline = Some(now + self.hide_delay);
    }

    /// Hide controls once the deadline passes.  Returns `true` if the
    /// visibility changed.
    pub fn tick(&mut self, now: Instant) -> bool {
        match self.hide_deadline {
            Some(deadline) if now >= deadline => {
                self.hide_deadline = None;
                let was_visible = self.state.controls_visible;
                self.state.controls_visible = false;
                was_visible
            }
            _ => false,
        }
    }

    /// Run the key table and adopt its result.  Every key counts as an
    /// interaction, handled or not.
    pub fn handle_key(&mut self, key: ViewerKey, now: Instant) -> KeyOutcome {
        self.touch(now);
        let outcome = apply_key(&self.state, key, self.kind, self.max_zoom);
        self.state = outcome.state;
        outcome
    }
}
