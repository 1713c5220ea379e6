//! Terminal and background events.
//!
//! Wraps crossterm events into a simpler enum and runs a background task that
//! forwards them over a channel so the main loop stays non-blocking.  Scans,
//! decodes, probes and fullscreen acknowledgements report back over the same
//! channel.

use std::sync::Arc;
use std::time::Duration;

use crossterm::event::{self, Event as CtEvent, KeyEvent, MouseEvent};
use image::RgbaImage;
use tokio::sync::mpsc;

use crate::core::thumbnail::DecodeError;

pub type EventSender = mpsc::UnboundedSender<AppEvent>;

/// High-level events consumed by the application.
#[derive(Debug)]
pub enum AppEvent {
    Key(KeyEvent),
    Mouse(MouseEvent),
    Resize(u16, u16),
    Tick,
    /// The debounced watcher saw the root directory settle after changes.
    FsChanged,
    Rescanned(anyhow::Result<Vec<String>>),
    ThumbnailDecoded {
        rel_path: String,
        result: Result<RgbaImage, DecodeError>,
    },
    /// Full-size image for the viewer bound to `source`.
    ViewerImageLoaded {
        source: String,
        result: Result<Arc<RgbaImage>, DecodeError>,
    },
    /// Media metadata for the viewer bound to `source`.
    MetadataLoaded {
        source: String,
        duration: Option<f64>,
    },
    /// The terminal switched fullscreen layout on or off.
    FullscreenChanged(bool),
}

/// Spawns a background task that polls the terminal for events and sends them
/// through `tx`.
pub fn spawn_event_reader(tick_rate: Duration, tx: EventSender) {
    tokio::spawn(async move {
        loop {
            // Use crossterm's poll with the tick rate so we can send Tick
            // events even when nothing is happening.
            let has_event = event::poll(tick_rate).unwrap_or(false);
            if has_event {
                if let Ok(ev) = event::read() {
                    let app_event = match ev {
                        CtEvent::Key(k) => AppEvent::Key(k),
                        CtEvent::Mouse(m) => AppEvent::Mouse(m),
                        CtEvent::Resize(w, h) => AppEvent::Resize(w, h),
                        _ => continue,
                    };
                    if tx.send(app_event).is_err() {
                        break; // receiver dropped
                    }
                }
            } else if tx.send(AppEvent::Tick).is_err() {
                break;
            }
        }
    });
}
