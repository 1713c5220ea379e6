//! A/B loop markers for the video viewer.
//!
//! One "mark" action cycles `Unset → MarkingStart → Looping → Unset`.
//! While looping, every position notification past `end` seeks back to
//! `start`.  `end < start` is accepted as-is: the check still only looks at
//! `end`, so playback jumps back on every notification once past it.

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SlicePhase {
    #[default]
    Unset,
    MarkingStart,
    Looping,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PlaybackSlicer {
    phase: SlicePhase,
    start: f64,
    end: f64,
}

impl PlaybackSlicer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> SlicePhase {
        self.phase
    }

    pub fn start(&self) -> f64 {
        self.start
    }

    pub fn end(&self) -> f64 {
        self.end
    }

    /// Advance the marker cycle using the current playback position.
    pub fn mark(&mut self, position: f64) -> SlicePhase {
        self.phase = match self.phase {
            SlicePhase::Unset => {
                self.start = position;
                SlicePhase::MarkingStart
            }
            SlicePhase::MarkingStart => {
                self.end = position;
                SlicePhase::Looping
            }
            SlicePhase::Looping => SlicePhase::Unset,
        };
        tracing::debug!(phase = ?self.phase, start = self.start, end = self.end, "slice mark");
        self.phase
    }

    /// Time-update notification.  Returns the position to seek to when the
    /// loop region has been overrun.
    pub fn on_time_update(&self, position: f64) -> Option<f64> {
        if self.phase == SlicePhase::Looping && position > self.end {
            Some(self.start)
        } else {
            None
        }
    }

    /// The source changed; markers no longer mean anything.
    pub fn reset(&mut self) {
        self.phase = SlicePhase::Unset;
    }
}
