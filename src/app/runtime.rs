//! Background jobs to keep the UI thread responsive.
//!
//! Each job reports back as an [`AppEvent`] on the shared channel.  Image
//! decodes go through the injected [`DecodeSlot`], so at most one runs at a
//! time.

use std::path::PathBuf;
use std::sync::Arc;

use crate::core::{
    fs::{self, ScanConfig},
    media::MediaKind,
    probe,
    thumbnail::{DecodeSlot, ThumbnailDecoder, THUMBNAIL_EDGE, VIEWER_EDGE},
    viewport::FullscreenRequest,
};

use super::event::{AppEvent, EventSender};

/// Handles shared by every job.
#[derive(Clone)]
pub struct Runtime {
    pub events: EventSender,
    pub slot: DecodeSlot,
    pub decoder: Arc<dyn ThumbnailDecoder>,
}

impl Runtime {
    pub fn new(events: EventSender, decoder: Arc<dyn ThumbnailDecoder>) -> Self {
        Self {
            events,
            slot: DecodeSlot::new(),
            decoder,
        }
    }

    pub fn spawn_rescan(&self, root: PathBuf, config: ScanConfig) {
        let tx = self.events.clone();
        tokio::task::spawn_blocking(move || {
            let t0 = std::time::Instant::now();
            let result = fs::scan_relative_paths(&root, &config);
            if let Ok(paths) = &result {
                tracing::info!(
                    count = paths.len(),
                    elapsed_ms = t0.elapsed().as_millis() as u64,
                    "rescanned {}",
                    root.display()
                );
            }
            let _ = tx.send(AppEvent::Rescanned(result));
        });
    }

    pub fn spawn_thumbnail(&self, path: PathBuf, rel_path: String, media: MediaKind) {
        let tx = self.events.clone();
        let slot = self.slot.clone();
        let decoder = Arc::clone(&self.decoder);
        tokio::spawn(async move {
            let result = slot
                .run(move || decoder.decode(&path, media, THUMBNAIL_EDGE))
                .await;
            let _ = tx.send(AppEvent::ThumbnailDecoded { rel_path, result });
        });
    }

    /// Load what the viewer needs: pixels for images, duration for videos.
    pub fn spawn_viewer_load(&self, path: PathBuf, source: String, media: MediaKind) {
        let tx = self.events.clone();
        match media {
            MediaKind::Video => {
                tokio::task::spawn_blocking(move || {
                    let duration = probe::video_duration(&path);
                    let _ = tx.send(AppEvent::MetadataLoaded { source, duration });
                });
            }
            _ => {
                let slot = self.slot.clone();
                let decoder = Arc::clone(&self.decoder);
                tokio::spawn(async move {
                    let result = slot
                        .run(move || decoder.decode(&path, media, VIEWER_EDGE))
                        .await
                        .map(Arc::new);
                    let _ = tx.send(AppEvent::ViewerImageLoaded { source, result });
                });
            }
        }
    }

    /// The terminal acts as the fullscreen platform: it switches layout on
    /// the next turn of the loop and then notifies.
    pub fn spawn_fullscreen(&self, request: FullscreenRequest) {
        let tx = self.events.clone();
        tokio::spawn(async move {
            tokio::task::yield_now().await;
            let active = request == FullscreenRequest::Enter;
            let _ = tx.send(AppEvent::FullscreenChanged(active));
        });
    }
}
