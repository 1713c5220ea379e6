//! An open viewer: one source bound to its viewport controller and, for
//! video, its playback model and loop slicer.

use std::time::{Duration, Instant};

use super::media::MediaKind;
use super::playback::PlaybackState;
use super::slicer::{PlaybackSlicer, SlicePhase};
use super::viewport::{
    FullscreenRequest, ViewCommand, ViewerKey, ViewerKind, ViewportController,
    DEFAULT_HIDE_DELAY, DEFAULT_IMAGE_MAX_ZOOM, DEFAULT_VIDEO_MAX_ZOOM,
};

/// Per-kind tunables, sourced from the user config.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewerSettings {
    pub image_max_zoom: f64,
    pub video_max_zoom: f64,
    pub hide_delay: Duration,
}

impl Default for ViewerSettings {
    fn default() -> Self {
        Self {
            image_max_zoom: DEFAULT_IMAGE_MAX_ZOOM,
            video_max_zoom: DEFAULT_VIDEO_MAX_ZOOM,
            hide_delay: DEFAULT_HIDE_DELAY,
        }
    }
}

/// Something the viewer needs from the outside world.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ViewerEffect {
    Fullscreen(FullscreenRequest),
    VolumeChanged(f64),
    LoopChanged(bool),
}

#[derive(Debug, Clone)]
pub struct VideoSession {
    pub playback: PlaybackState,
    pub slicer: PlaybackSlicer,
}

impl VideoSession {
    /// Time update: jump back to the loop start once past its end.
    fn enforce_slice(&mut self) {
        if let Some(start) = self.slicer.on_time_update(self.playback.position) {
            self.playback.seek_to(start);
        }
    }
}

#[derive(Debug, Clone)]
pub struct Viewer {
    /// Tree-relative path; survives rebuilds, unlike node ids.
    pub rel_path: String,
    pub viewport: ViewportController,
    pub video: Option<VideoSession>,
    /// Metadata has arrived at least once.
    pub loaded: bool,
}

impl Viewer {
    /// Open a viewer for a viewable leaf.  `volume` and `loop_enabled` are
    /// the persisted playback preferences.
    pub fn open(
        rel_path: impl Into<String>,
        source: impl Into<String>,
        media: MediaKind,
        settings: &ViewerSettings,
        volume: f64,
        loop_enabled: bool,
    ) -> Self {
        let (kind, max_zoom) = match media {
            MediaKind::Video => (ViewerKind::Video, settings.video_max_zoom),
            _ => (ViewerKind::Image, settings.image_max_zoom),
        };
        let mut viewport = ViewportController::new(kind, max_zoom, settings.hide_delay);
        viewport.set_source(source);
        let video = (kind == ViewerKind::Video).then(|| VideoSession {
            playback: PlaybackState::new(volume, loop_enabled),
            slicer: PlaybackSlicer::new(),
        });
        Self {
            rel_path: rel_path.into(),
            viewport,
            video,
            loaded: false,
        }
    }

    pub fn kind(&self) -> ViewerKind {
        self.viewport.kind()
    }

    /// Absolute (prefixed, URI-encoded) path the viewer was opened with.
    pub fn source(&self) -> &str {
        self.viewport.source().unwrap_or_default()
    }

    /// Metadata (re)loaded: transform and markers start over.
    pub fn on_metadata_loaded(&mut self, duration: Option<f64>) {
        self.loaded = true;
        self.viewport.on_metadata_loaded();
        if let Some(video) = &mut self.video {
            video.playback.load_metadata(duration);
            video.slicer.reset();
        }
    }

    /// Route a key through the shared table, then the video-only keys.
    pub fn handle_key(&mut self, key: ViewerKey, now: Instant) -> Option<ViewerEffect> {
        let outcome = self.viewport.handle_key(key, now);
        match outcome.command {
            Some(ViewCommand::ToggleFullscreen) => {
                return Some(ViewerEffect::Fullscreen(self.viewport.request_toggle()));
            }
            Some(command) => {
                let video = self.video.as_mut()?;
                let before = video.playback.volume;
                video.playback.apply_command(command);
                video.enforce_slice();
                if video.playback.volume != before {
                    return Some(ViewerEffect::VolumeChanged(video.playback.volume));
                }
                return None;
            }
            None if outcome.handled => return None,
            None => {}
        }

        match key {
            ViewerKey::Char('b') | ViewerKey::Char('B') => {
                self.mark_slice();
                None
            }
            ViewerKey::Char('l') | ViewerKey::Char('L') => self.toggle_loop(),
            _ => {
                if let Some(video) = &mut self.video {
                    video.playback.handle_key(key);
                    video.enforce_slice();
                }
                None
            }
        }
    }

    /// Advance the A/B marker cycle at the current position.
    pub fn mark_slice(&mut self) -> Option<SlicePhase> {
        let video = self.video.as_mut()?;
        Some(video.slicer.mark(video.playback.position))
    }

    pub fn toggle_loop(&mut self) -> Option<ViewerEffect> {
        let video = self.video.as_mut()?;
        video.playback.loop_enabled = !video.playback.loop_enabled;
        Some(ViewerEffect::LoopChanged(video.playback.loop_enabled))
    }

    /// Periodic tick: expire the controls deadline and, for video, advance
    /// the clock and enforce the loop region.  Returns `true` on any change.
    pub fn tick(&mut self, now: Instant, elapsed: Duration) -> bool {
        let mut changed = self.viewport.tick(now);
        if let Some(video) = &mut self.video {
            if video.playback.advance(elapsed) {
                changed = true;
                video.enforce_slice();
            }
        }
        changed
    }
}
