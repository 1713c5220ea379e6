//! Thumbnail decoding behind a single shared decode slot.
//!
//! Decodes are serialized system-wide through a [`DecodeSlot`]: a cloneable
//! handle over a one-permit semaphore that is handed to whoever needs to
//! decode.  A failed decode marks the entry unsupported and is never retried.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use image::RgbaImage;
use tokio::sync::Semaphore;

use super::media::MediaKind;

/// Longest edge of a listing thumbnail, in pixels.
pub const THUMBNAIL_EDGE: u32 = 200;
/// Longest edge kept for the full viewer.
pub const VIEWER_EDGE: u32 = 2048;

#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("unsupported format")]
    Unsupported,
    #[error("read failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("decode failed: {0}")]
    Image(#[from] image::ImageError),
    #[error("decode task aborted")]
    Aborted,
}

// ───────────────────────────────────────── decode slot ───────

/// At-most-one-concurrent-decode guard.
#[derive(Debug, Clone)]
pub struct DecodeSlot {
    permits: Arc<Semaphore>,
}

impl Default for DecodeSlot {
    fn default() -> Self {
        Self::new()
    }
}

impl DecodeSlot {
    pub fn new() -> Self {
        Self {
            permits: Arc::new(Semaphore::new(1)),
        }
    }

    /// Wait for the slot, then run `job` on the blocking pool while holding it.
    pub async fn run<F, T>(&self, job: F) -> Result<T, DecodeError>
    where
        F: FnOnce() -> Result<T, DecodeError> + Send + 'static,
        T: Send + 'static,
    {
        let _permit = self
            .permits
            .acquire()
            .await
            .map_err(|_| DecodeError::Aborted)?;
        tokio::task::spawn_blocking(job)
            .await
            .map_err(|_| DecodeError::Aborted)?
    }
}

// ───────────────────────────────────────── decoders ──────────

/// Turns a media file into pixels.
pub trait ThumbnailDecoder: Send + Sync {
    fn decode(&self, path: &Path, media: MediaKind, max_edge: u32) -> Result<RgbaImage, DecodeError>;
}

/// Decodes raster images with the `image` crate.  Video frames need a
/// codec we don't ship, so videos report [`DecodeError::Unsupported`].
#[derive(Debug, Clone, Copy, Default)]
pub struct ImageDecoder;

impl ThumbnailDecoder for ImageDecoder {
    fn decode(&self, path: &Path, media: MediaKind, max_edge: u32) -> Result<RgbaImage, DecodeError> {
        if media != MediaKind::Image {
            return Err(DecodeError::Unsupported);
        }
        let img = image::ImageReader::open(path)?
            .with_guessed_format()?
            .decode()?;
        if img.width() > max_edge || img.height() > max_edge {
            Ok(img.thumbnail(max_edge, max_edge).to_rgba8())
        } else {
            Ok(img.to_rgba8())
        }
    }
}

// ───────────────────────────────────────── cache ─────────────

#[derive(Debug, Clone)]
pub enum ThumbState {
    Pending,
    Ready(Arc<RgbaImage>),
    Unsupported,
}

/// Per-relative-path thumbnail state.
#[derive(Debug, Default)]
pub struct ThumbnailCache {
    entries: HashMap<String, ThumbState>,
}

impl ThumbnailCache {
    pub fn get(&self, rel_path: &str) -> Option<&ThumbState> {
        self.entries.get(rel_path)
    }

    /// Claim a decode for a *visible* entry.  Returns `false` when one is
    /// already pending or finished (including failures).
    pub fn request(&mut self, rel_path: &str, media: MediaKind, visible: bool) -> bool {
        if !visible || !media.is_viewable() || self.entries.contains_key(rel_path) {
            return false;
        }
        self.entries.insert(rel_path.to_string(), ThumbState::Pending);
        true
    }

    pub fn finish(&mut self, rel_path: &str, result: Result<RgbaImage, DecodeError>) {
        let state = match result {
            Ok(img) => ThumbState::Ready(Arc::new(img)),
            Err(e) => {
                tracing::debug!("thumbnail for {rel_path:?} unsupported: {e}");
                ThumbState::Unsupported
            }
        };
        self.entries.insert(rel_path.to_string(), state);
    }

    /// Drop entries whose paths are gone after a rebuild.
    pub fn retain_paths<F: Fn(&str) -> bool>(&mut self, exists: F) {
        self.entries.retain(|path, _| exists(path));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[test]
    fn test_request_only_when_visible_and_once() {
        let mut cache = ThumbnailCache::default();
        assert!(!cache.request("a.png", MediaKind::Image, false));
        assert!(cache.get("a.png").is_none());
        assert!(cache.request("a.png", MediaKind::Image, true));
        assert!(!cache.request("a.png", MediaKind::Image, true));
        assert!(!cache.request("notes.txt", MediaKind::Other, true));
    }

    #[test]
    fn test_failure_is_not_retried() {
        let mut cache = ThumbnailCache::default();
        assert!(cache.request("clip.mp4", MediaKind::Video, true));
        cache.finish("clip.mp4", Err(DecodeError::Unsupported));
        assert!(matches!(cache.get("clip.mp4"), Some(ThumbState::Unsupported)));
        assert!(!cache.request("clip.mp4", MediaKind::Video, true));
    }

    #[test]
    fn test_retain_paths() {
        let mut cache = ThumbnailCache::default();
        cache.finish("keep.png", Ok(RgbaImage::new(1, 1)));
        cache.finish("gone.png", Ok(RgbaImage::new(1, 1)));
        cache.retain_paths(|p| p == "keep.png");
        assert!(cache.get("keep.png").is_some());
        assert!(cache.get("gone.png").is_none());
    }

    #[test]
    fn test_image_decoder_rejects_video() {
        let err = ImageDecoder
            .decode(Path::new("whatever.mp4"), MediaKind::Video, 10)
            .unwrap_err();
        assert!(matches!(err, DecodeError::Unsupported));
    }

    #[test]
    fn test_image_decoder_missing_file_is_io_error() {
        let err = ImageDecoder
            .decode(Path::new("/definitely/not/here.png"), MediaKind::Image, 10)
            .unwrap_err();
        assert!(matches!(err, DecodeError::Io(_)));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_slot_allows_one_decode_at_a_time() {
        let slot = DecodeSlot::new();
        let running = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));

        let mut handles = Vec::new();
        for _ in 0..6 {
            let slot = slot.clone();
            let running = Arc::clone(&running);
            let peak = Arc::clone(&peak);
            handles.push(tokio::spawn(async move {
                slot.run(move || {
                    let now = running.fetch_add(1, Ordering::SeqCst) + 1;
                    peak.fetch_max(now, Ordering::SeqCst);
                    std::thread::sleep(Duration::from_millis(5));
                    running.fetch_sub(1, Ordering::SeqCst);
                    Ok(())
                })
                .await
            }));
        }
        for h in handles {
            h.await.unwrap().unwrap();
        }
        assert_eq!(peak.load(Ordering::SeqCst), 1);
        assert_eq!(slot.permits.available_permits(), 1);
    }
}
