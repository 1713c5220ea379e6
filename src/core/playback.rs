//! Simulated media element for the video viewer.
//!
//! There is no decoder behind this: position advances with wall-clock time
//! while "playing", and every advance is a time-update notification.  All
//! duration-dependent math tolerates an unknown (zero) duration.

use std::time::Duration;

use super::viewport::{ViewCommand, ViewerKey};

pub const MIN_SPEED: f64 = 0.01;
pub const MAX_SPEED: f64 = 5.0;
pub const SPEED_STEP: f64 = 0.1;
pub const VOLUME_STEP: f64 = 0.05;
pub const FRAME_STEP: f64 = 1.0 / 30.0;
pub const MAX_SEEK_OFFSET: f64 = 5.0;

#[derive(Debug, Clone, PartialEq)]
pub struct PlaybackState {
    /// Seconds; `0.0` while unknown.
    pub duration: f64,
    pub position: f64,
    pub volume: f64,
    pub muted: bool,
    pub speed: f64,
    pub playing: bool,
    /// Whole-file loop: restart at end of file.
    pub loop_enabled: bool,
}

impl PlaybackState {
    pub fn new(volume: f64, loop_enabled: bool) -> Self {
        Self {
            duration: 0.0,
            position: 0.0,
            volume: clamp_unit(volume),
            muted: false,
            speed: 1.0,
            playing: false,
            loop_enabled,
        }
    }

    /// Metadata arrived (or re-arrived).  `None` keeps the duration unknown.
    pub fn load_metadata(&mut self, duration: Option<f64>) {
        self.duration = duration.filter(|d| d.is_finite() && *d > 0.0).unwrap_or(0.0);
        self.position = 0.0;
        self.speed = 1.0;
    }

    pub fn has_duration(&self) -> bool {
        self.duration > 0.0
    }

    /// Arrow-key seek distance: a tenth of the file, at most five seconds.
    pub fn seek_offset(&self) -> f64 {
        (self.duration / 10.0).min(MAX_SEEK_OFFSET)
    }

    /// Jump to `t`, clamped to the file.  With an unknown duration only the
    /// lower bound applies.
    pub fn seek_to(&mut self, t: f64) {
        let t = if t.is_nan() { 0.0 } else { t.max(0.0) };
        self.position = if self.has_duration() {
            t.min(self.duration)
        } else {
            t
        };
    }

    pub fn seek_by(&mut self, delta: f64) {
        self.seek_to(self.position + delta);
    }

    pub fn set_volume(&mut self, volume: f64) {
        self.volume = clamp_unit(volume);
    }

    pub fn set_speed(&mut self, speed: f64) {
        self.speed = speed.clamp(MIN_SPEED, MAX_SPEED);
    }

    pub fn toggle_play(&mut self) {
        self.playing = !self.playing;
    }

    /// Step one frame; always pauses first.
    pub fn step_frame(&mut self, forward: bool) {
        self.playing = false;
        self.seek_by(if forward { FRAME_STEP } else { -FRAME_STEP });
    }

    /// `position / duration`, or `0.0` when the duration is unknown.
    pub fn progress_fraction(&self) -> f64 {
        if self.has_duration() {
            (self.position / self.duration).clamp(0.0, 1.0)
        } else {
            0.0
        }
    }

    /// Advance the clock.  Returns `true` when a time-update fired.
    pub fn advance(&mut self, elapsed: Duration) -> bool {
        if !self.playing {
            return false;
        }
        self.position += elapsed.as_secs_f64() * self.speed;
        if self.has_duration() && self.position >= self.duration {
            if self.loop_enabled {
                self.position = 0.0;
            } else {
                self.position = self.duration;
                self.playing = false;
            }
        }
        true
    }

    /// Apply a command from the shared viewer key table.  Returns `false`
    /// for commands that aren't playback concerns.
    pub fn apply_command(&mut self, command: ViewCommand) -> bool {
        match command {
            ViewCommand::SeekBackward => self.seek_by(-self.seek_offset()),
            ViewCommand::SeekForward => self.seek_by(self.seek_offset()),
            ViewCommand::VolumeUp => self.set_volume(self.volume + VOLUME_STEP),
            ViewCommand::VolumeDown => self.set_volume(self.volume - VOLUME_STEP),
            ViewCommand::ToggleFullscreen => return false,
        }
        true
    }

    /// Video-only keys the shared table leaves unhandled.
    pub fn handle_key(&mut self, key: ViewerKey) -> bool {
        let ViewerKey::Char(c) = key else {
            return false;
        };
        match c {
            ',' => self.step_frame(false),
            '.' => self.step_frame(true),
            '<' => self.set_speed(self.speed - SPEED_STEP),
            '>' => self.set_speed(self.speed + SPEED_STEP),
            '?' => self.speed = 1.0,
            ' ' => self.toggle_play(),
            'm' | 'M' => self.muted = !self.muted,
            _ => return false,
        }
        true
    }
}

fn clamp_unit(v: f64) -> f64 {
    if v.is_nan() {
        1.0
    } else {
        v.clamp(0.0, 1.0)
    }
}

/// `mm:ss`, or `hh:mm:ss` from one hour up.
pub fn timestamp(seconds: f64) -> String {
    let total = if seconds.is_finite() && seconds > 0.0 {
        seconds.round() as u64
    } else {
        0
    };
    let (h, m, s) = (total / 3600, (total / 60) % 60, total % 60);
    if h > 0 {
        format!("{h:02}:{m:02}:{s:02}")
    } else {
        format!("{m:02}:{s:02}")
    }
}

/// `0.25` → `"25%"`.
pub fn percent(fraction: f64) -> String {
    format!("{}%", (fraction * 100.0).round() as i64)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn loaded(duration: f64) -> PlaybackState {
        let mut p = PlaybackState::new(0.5, false);
        p.load_metadata(Some(duration));
        p
    }

    #[test]
    fn test_unknown_duration_is_guarded() {
        let mut p = PlaybackState::new(1.0, false);
        p.load_metadata(None);
        assert_eq!(p.seek_offset(), 0.0);
        assert_eq!(p.progress_fraction(), 0.0);
        p.seek_to(12.0);
        assert_eq!(p.position, 12.0);
        p.seek_to(-3.0);
        assert_eq!(p.position, 0.0);

        p.load_metadata(Some(f64::NAN));
        assert!(!p.has_duration());
    }

    #[test]
    fn test_seek_offset_is_tenth_capped_at_five() {
        assert_eq!(loaded(20.0).seek_offset(), 2.0);
        assert_eq!(loaded(600.0).seek_offset(), 5.0);
    }

    #[test]
    fn test_arrow_commands_clamp() {
        let mut p = loaded(20.0);
        p.apply_command(ViewCommand::SeekBackward);
        assert_eq!(p.position, 0.0);
        p.seek_to(19.0);
        p.apply_command(ViewCommand::SeekForward);
        assert_eq!(p.position, 20.0);

        p.set_volume(0.98);
        p.apply_command(ViewCommand::VolumeUp);
        assert_eq!(p.volume, 1.0);
        p.set_volume(0.02);
        p.apply_command(ViewCommand::VolumeDown);
        assert_eq!(p.volume, 0.0);

        assert!(!p.apply_command(ViewCommand::ToggleFullscreen));
    }

    #[test]
    fn test_frame_step_pauses() {
        let mut p = loaded(10.0);
        p.playing = true;
        p.seek_to(1.0);
        assert!(p.handle_key(ViewerKey::Char('.')));
        assert!(!p.playing);
        assert!((p.position - (1.0 + FRAME_STEP)).abs() < 1e-9);
        p.handle_key(ViewerKey::Char(','));
        assert!((p.position - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_speed_keys() {
        let mut p = loaded(10.0);
        for _ in 0..100 {
            p.handle_key(ViewerKey::Char('>'));
        }
        assert_eq!(p.speed, MAX_SPEED);
        for _ in 0..100 {
            p.handle_key(ViewerKey::Char('<'));
        }
        assert_eq!(p.speed, MIN_SPEED);
        p.handle_key(ViewerKey::Char('?'));
        assert_eq!(p.speed, 1.0);
        assert!(!p.handle_key(ViewerKey::Char('k')));
        assert!(!p.handle_key(ViewerKey::Left));
    }

    #[test]
    fn test_advance_stops_or_wraps_at_end() {
        let mut p = loaded(2.0);
        assert!(!p.advance(Duration::from_secs(1)));
        p.toggle_play();
        assert!(p.advance(Duration::from_millis(1500)));
        assert_eq!(p.position, 1.5);
        p.advance(Duration::from_secs(1));
        assert_eq!(p.position, 2.0);
        assert!(!p.playing);

        p.loop_enabled = true;
        p.toggle_play();
        p.seek_to(1.9);
        p.advance(Duration::from_millis(500));
        assert_eq!(p.position, 0.0);
        assert!(p.playing);
    }

    #[test]
    fn test_timestamp_and_percent() {
        assert_eq!(timestamp(0.0), "00:00");
        assert_eq!(timestamp(65.4), "01:05");
        assert_eq!(timestamp(3725.0), "01:02:05");
        assert_eq!(timestamp(f64::NAN), "00:00");
        assert_eq!(percent(0.25), "25%");
        assert_eq!(percent(1.0), "100%");
    }
}
