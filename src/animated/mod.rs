// SPDX-License-Identifier: MPL-2.0
//! Animated image source with an adaptive decoded-frame cache.
//!
//! An [`AnimatedImage`] is built from the raw bytes of a GIF or animated WebP.
//! Construction parses the container, decodes the poster frame and spawns a
//! background refill worker. Playback then polls [`AnimatedImage::image_at`]
//! every tick; the call never blocks on decoding, it either returns a resident
//! frame or `None`.
//!
//! # Architecture
//!
//! - [`window`]: pure sizing policy plus wrap-around window geometry
//! - [`metadata`]: per-frame delays and loop count
//! - `store`: index-addressed slots shared with the worker
//! - `worker`: the refill thread
//!
//! # Example
//!
//! ```no_run
//! use animated_frames::animated::{AnimatedImage, CacheOptions};
//! use animated_frames::domain::frame::MemoryBudgetMb;
//!
//! let image = AnimatedImage::open_with_options(
//!     "spinner.gif",
//!     CacheOptions::default().with_memory_budget(MemoryBudgetMb::new(16)),
//! )?;
//!
//! // Poster is always resident right after construction.
//! assert!(image.image_at(0).is_some());
//! # Ok::<(), animated_frames::error::Error>(())
//! ```

pub mod metadata;
mod store;
pub mod window;
mod worker;

pub use metadata::{normalize_delay, FrameMetadata};
pub use store::WorkerState;
pub use window::{optimal_window_size, Window};

use crate::application::port::{AnimationCodec, CacheObserver, CodecError};
use crate::config::Config;
use crate::domain::frame::{CanvasSize, CanvasSized, DecodedFrame, MemoryBudgetMb, WindowOverride};
use crate::error::{Error, Result};
use crate::infrastructure::detect_codec;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};
use store::{FrameStore, StoreSettings};
use worker::RefillWorker;

/// Runtime cache settings for one [`AnimatedImage`].
#[derive(Clone)]
pub struct CacheOptions {
    /// Memory available for decoded frames, in bytes.
    pub memory_budget_bytes: u64,
    pub window_override: WindowOverride,
    /// How long a [`AnimatedImage::memory_warning`] cap stays in force.
    pub memory_warning_reset: Duration,
    pub observer: Option<Arc<dyn CacheObserver>>,
}

impl Default for CacheOptions {
    fn default() -> Self {
        Self::from(&Config::default())
    }
}

impl From<&Config> for CacheOptions {
    fn from(config: &Config) -> Self {
        Self {
            memory_budget_bytes: config.memory_budget().as_bytes(),
            window_override: config.window_override(),
            memory_warning_reset: config.memory_warning_reset(),
            observer: None,
        }
    }
}

impl CacheOptions {
    #[must_use]
    pub fn with_memory_budget(mut self, budget: MemoryBudgetMb) -> Self {
        self.memory_budget_bytes = budget.as_bytes();
        self
    }

    /// Sets the budget in raw bytes, bypassing the megabyte bounds.
    #[must_use]
    pub fn with_memory_budget_bytes(mut self, bytes: u64) -> Self {
        self.memory_budget_bytes = bytes;
        self
    }

    #[must_use]
    pub fn with_window_override(mut self, cap: WindowOverride) -> Self {
        self.window_override = cap;
        self
    }

    #[must_use]
    pub fn with_memory_warning_reset(mut self, reset: Duration) -> Self {
        self.memory_warning_reset = reset;
        self
    }

    #[must_use]
    pub fn with_observer(mut self, observer: Arc<dyn CacheObserver>) -> Self {
        self.observer = Some(observer);
        self
    }
}

impl std::fmt::Debug for CacheOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheOptions")
            .field("memory_budget_bytes", &self.memory_budget_bytes)
            .field("window_override", &self.window_override)
            .field("memory_warning_reset", &self.memory_warning_reset)
            .field("observer", &self.observer.is_some())
            .finish()
    }
}

/// A decoded animation source backed by a frame cache.
///
/// Everything except the cache is immutable after construction. Dropping the
/// image stops the refill worker; once `drop` returns the worker performs no
/// further cache mutation and sends no observer notification.
pub struct AnimatedImage {
    data: Arc<[u8]>,
    codec: Arc<dyn AnimationCodec>,
    canvas: CanvasSize,
    metadata: FrameMetadata,
    poster: Arc<DecodedFrame>,
    store: Arc<FrameStore>,
    worker: RefillWorker,
}

impl AnimatedImage {
    /// Builds an animation from raw container bytes with default cache options.
    ///
    /// # Errors
    ///
    /// Fails when the bytes are not a supported container, hold no frames or
    /// the first frame cannot be decoded.
    pub fn new(data: impl Into<Arc<[u8]>>) -> Result<Self> {
        Self::with_options(data, CacheOptions::default())
    }

    /// Builds an animation, picking the codec from the container signature.
    ///
    /// # Errors
    ///
    /// See [`AnimatedImage::new`].
    pub fn with_options(data: impl Into<Arc<[u8]>>, options: CacheOptions) -> Result<Self> {
        let data: Arc<[u8]> = data.into();
        let codec = detect_codec(&data)?;
        Self::with_codec(data, codec, options)
    }

    /// Builds an animation decoded by `codec`.
    ///
    /// # Errors
    ///
    /// See [`AnimatedImage::new`].
    pub fn with_codec(
        data: impl Into<Arc<[u8]>>,
        codec: Arc<dyn AnimationCodec>,
        options: CacheOptions,
    ) -> Result<Self> {
        let data: Arc<[u8]> = data.into();

        let info = codec.read_info(&data).map_err(|err| match err {
            CodecError::Unrecognized => Error::UnsupportedFormat,
            other => Error::Decode(other),
        })?;
        let metadata = FrameMetadata::from_container(&info)?;

        let poster = codec.decode_frame(&data, 0).map_err(Error::PosterDecode)?;
        if poster.is_empty() {
            return Err(Error::PosterDecode(CodecError::Frame {
                index: 0,
                reason: "empty bitmap".into(),
            }));
        }
        let poster = Arc::new(poster);
        let canvas = poster.size();

        let store = Arc::new(FrameStore::new(
            metadata.frame_count(),
            Arc::clone(&poster),
            StoreSettings {
                frame_bytes: canvas.frame_bytes(),
                budget_bytes: options.memory_budget_bytes,
                window_override: options.window_override,
                memory_warning_reset: options.memory_warning_reset,
            },
            options.observer,
        ));

        tracing::info!(
            codec = codec.name(),
            frames = metadata.frame_count(),
            width = canvas.width,
            height = canvas.height,
            loop_count = metadata.loop_count(),
            window = store.window_size(),
            "animation loaded"
        );

        let worker = RefillWorker::spawn(Arc::clone(&store), Arc::clone(&codec), Arc::clone(&data))?;

        Ok(Self {
            data,
            codec,
            canvas,
            metadata,
            poster,
            store,
            worker,
        })
    }

    /// Reads `path` and builds an animation with default cache options.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] when the file cannot be read, otherwise see
    /// [`AnimatedImage::new`].
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::open_with_options(path, CacheOptions::default())
    }

    /// Reads `path` and builds an animation with `options`.
    ///
    /// # Errors
    ///
    /// See [`AnimatedImage::open`].
    pub fn open_with_options(path: impl AsRef<Path>, options: CacheOptions) -> Result<Self> {
        let data = std::fs::read(path.as_ref())?;
        Self::with_options(data, options)
    }

    // =========================================================================
    // Immutable metadata
    // =========================================================================

    /// The bytes this animation was built from.
    #[must_use]
    pub fn data(&self) -> &Arc<[u8]> {
        &self.data
    }

    #[must_use]
    pub fn canvas_size(&self) -> CanvasSize {
        self.canvas
    }

    #[must_use]
    pub fn frame_count(&self) -> usize {
        self.metadata.frame_count()
    }

    /// Normalised display duration of every frame.
    #[must_use]
    pub fn delay_times(&self) -> &[Duration] {
        self.metadata.delay_times()
    }

    /// Number of times the animation plays; 0 means forever.
    #[must_use]
    pub fn loop_count(&self) -> u32 {
        self.metadata.loop_count()
    }

    #[must_use]
    pub fn metadata(&self) -> &FrameMetadata {
        &self.metadata
    }

    #[must_use]
    pub fn total_duration(&self) -> Duration {
        self.metadata.total_duration()
    }

    /// Frame 0, decoded at construction.
    #[must_use]
    pub fn poster_frame(&self) -> &Arc<DecodedFrame> {
        &self.poster
    }

    #[must_use]
    pub fn codec_name(&self) -> &'static str {
        self.codec.name()
    }

    // =========================================================================
    // Cache
    // =========================================================================

    /// Returns the decoded frame at `index` if it is resident.
    ///
    /// Records `index` as the playback position so the refill worker keeps
    /// the frames that follow it resident. Never blocks on decoding; a `None`
    /// for an in-range index is an ordinary miss and the caller should retry
    /// on its next tick. Out-of-range indices return `None` and leave the
    /// playback position unchanged.
    #[must_use]
    pub fn image_at(&self, index: usize) -> Option<Arc<DecodedFrame>> {
        if index >= self.frame_count() {
            return None;
        }
        let (frame, wake) = self.store.request(index);
        if wake {
            self.worker.wake();
        }
        frame
    }

    /// Number of frames the cache currently aims to keep resident.
    #[must_use]
    pub fn current_window_size(&self) -> usize {
        self.store.window_size()
    }

    /// Indices resident right now, ascending.
    #[must_use]
    pub fn resident_indices(&self) -> Vec<usize> {
        self.store.resident_indices()
    }

    #[must_use]
    pub fn worker_state(&self) -> WorkerState {
        self.store.state()
    }

    #[must_use]
    pub fn max_window_override(&self) -> Option<usize> {
        self.store.window_override().limit()
    }

    /// Caps the window at `max_frames` resident frames (`None` or 0 removes
    /// the cap). Frames falling outside the new window are evicted.
    pub fn set_max_window_override(&self, max_frames: Option<usize>) {
        let cap = WindowOverride::from(max_frames);
        self.store.set_window_override(cap);
        tracing::debug!(cap = ?cap.limit(), "window override changed");
        self.worker.wake();
    }

    /// Current memory budget in bytes.
    #[must_use]
    pub fn memory_budget(&self) -> u64 {
        self.store.budget_bytes()
    }

    /// Replaces the memory budget. The window is recomputed and frames falling
    /// outside it are evicted.
    pub fn set_memory_budget(&self, bytes: u64) {
        self.store.set_budget_bytes(bytes);
        self.worker.wake();
    }

    /// Shrinks the window to the bare minimum until the reset delay elapses.
    pub fn memory_warning(&self) {
        self.store.raise_memory_warning(Instant::now());
        tracing::info!(frames = self.resident_indices().len(), "memory warning received");
        self.worker.wake();
    }
}

impl CanvasSized for AnimatedImage {
    fn canvas_size(&self) -> CanvasSize {
        self.canvas
    }
}

impl Drop for AnimatedImage {
    fn drop(&mut self) {
        self.store.shutdown();
        self.worker.stop();
        tracing::debug!(frames = self.frame_count(), "animation dropped");
    }
}

impl std::fmt::Debug for AnimatedImage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnimatedImage")
            .field("codec", &self.codec.name())
            .field("canvas", &self.canvas)
            .field("frame_count", &self.frame_count())
            .field("loop_count", &self.loop_count())
            .field("data_len", &self.data.len())
            .field("store", &self.store)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::frame::size_for_image;
    use crate::test_utils::{encode_gif, wait_for, ScriptedCodec};
    use image_rs::codecs::gif::Repeat;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread;

    const TIMEOUT: Duration = Duration::from_secs(5);
    const BYTES: &[u8] = b"scripted";

    fn scripted(codec: ScriptedCodec, options: CacheOptions) -> (AnimatedImage, Arc<ScriptedCodec>) {
        let codec = Arc::new(codec);
        let image = AnimatedImage::with_codec(BYTES, codec.clone() as Arc<dyn AnimationCodec>, options)
            .expect("scripted image");
        (image, codec)
    }

    #[derive(Default)]
    struct CountingObserver {
        cached: AtomicUsize,
    }

    impl CacheObserver for CountingObserver {
        fn frames_cached(&self, _resident: &[usize]) {
            self.cached.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn construction_exposes_metadata() {
        let (image, _) = scripted(ScriptedCodec::new(100, 50, 10), CacheOptions::default());

        assert_eq!(image.frame_count(), 10);
        assert_eq!(image.delay_times().len(), image.frame_count());
        assert_eq!(image.loop_count(), 0);
        assert_eq!(image.canvas_size(), CanvasSize::new(100, 50));
        assert_eq!(size_for_image(&image), CanvasSize::new(100, 50));
        assert_eq!(image.total_duration(), Duration::from_secs(1));
        assert_eq!(image.data().as_ref(), BYTES);
        assert_eq!(image.codec_name(), "scripted");
        assert!(!image.poster_frame().is_empty());
    }

    #[test]
    fn poster_hits_immediately() {
        let (image, _) = scripted(
            ScriptedCodec::new(10, 10, 5).with_decode_delay(Duration::from_millis(50)),
            CacheOptions::default(),
        );
        let frame = image.image_at(0).expect("poster resident");
        assert!(Arc::ptr_eq(&frame, image.poster_frame()));
    }

    #[test]
    fn far_frame_misses_then_hits() {
        let (image, _) = scripted(
            ScriptedCodec::new(10, 10, 10).with_decode_delay(Duration::from_millis(20)),
            CacheOptions::default(),
        );

        assert!(image.image_at(9).is_none());
        assert!(wait_for(TIMEOUT, || image.image_at(9).is_some()));
        let frame = image.image_at(9).expect("resident");
        assert_eq!(frame.rgba_data[0], 9);
    }

    #[test]
    fn small_frames_end_up_fully_cached() {
        let (image, codec) = scripted(ScriptedCodec::new(10, 10, 10), CacheOptions::default());

        assert_eq!(image.current_window_size(), 10);
        assert!(wait_for(TIMEOUT, || image.resident_indices().len() == 10));
        assert!(wait_for(TIMEOUT, || image.worker_state() == WorkerState::Idle));

        for _ in 0..3 {
            for index in 0..10 {
                assert!(image.image_at(index).is_some());
            }
        }
        assert_eq!(codec.decode_count(), 10, "each frame decoded once");
    }

    #[test]
    fn override_limits_window() {
        let (image, _) = scripted(
            ScriptedCodec::new(10, 10, 10),
            CacheOptions::default().with_window_override(WindowOverride::new(3)),
        );

        assert_eq!(image.current_window_size(), 3);
        assert_eq!(image.max_window_override(), Some(3));
        assert!(wait_for(TIMEOUT, || image.resident_indices() == vec![0, 1, 2]));
        assert!(wait_for(TIMEOUT, || image.worker_state() == WorkerState::Idle));
        assert!(!image.resident_indices().contains(&7));

        assert!(image.image_at(7).is_none());
        assert!(wait_for(TIMEOUT, || image.resident_indices() == vec![7, 8, 9]));
    }

    #[test]
    fn changing_override_resizes_window() {
        let (image, _) = scripted(ScriptedCodec::new(10, 10, 10), CacheOptions::default());
        assert!(wait_for(TIMEOUT, || image.resident_indices().len() == 10));

        image.set_max_window_override(Some(4));
        assert!(wait_for(TIMEOUT, || image.current_window_size() == 4));
        assert!(wait_for(TIMEOUT, || image.resident_indices() == vec![0, 1, 2, 3]));

        image.set_max_window_override(None);
        assert_eq!(image.max_window_override(), None);
        assert!(wait_for(TIMEOUT, || image.resident_indices().len() == 10));
    }

    #[test]
    fn shrinking_budget_evicts_outside_window() {
        // 10x10 RGBA = 400 bytes per frame.
        let (image, _) = scripted(ScriptedCodec::new(10, 10, 10), CacheOptions::default());
        assert!(wait_for(TIMEOUT, || image.resident_indices().len() == 10));

        let _ = image.image_at(5);
        image.set_memory_budget(400 * 3);
        assert_eq!(image.memory_budget(), 1200);
        assert!(wait_for(TIMEOUT, || image.resident_indices() == vec![5, 6, 7]));
        assert_eq!(image.current_window_size(), 3);
    }

    #[test]
    fn window_size_stays_within_bounds() {
        let (image, _) = scripted(ScriptedCodec::new(10, 10, 6), CacheOptions::default());
        for budget in [0, 1, 400, 4_000, 1 << 30] {
            image.set_memory_budget(budget);
            for _ in 0..20 {
                let size = image.current_window_size();
                assert!((1..=6).contains(&size));
                thread::sleep(Duration::from_millis(1));
            }
        }
    }

    #[test]
    fn memory_warning_caps_window_until_reset() {
        let (image, _) = scripted(
            ScriptedCodec::new(10, 10, 10),
            CacheOptions::default().with_memory_warning_reset(Duration::from_millis(400)),
        );
        assert!(wait_for(TIMEOUT, || image.resident_indices().len() == 10));

        image.memory_warning();
        assert!(wait_for(TIMEOUT, || image.resident_indices() == vec![0, 1]));
        assert_eq!(image.current_window_size(), 2);

        assert!(wait_for(TIMEOUT, || image.resident_indices().len() == 10));
        assert_eq!(image.current_window_size(), 10);
    }

    #[test]
    fn undecodable_frame_never_hits() {
        let (image, _) = scripted(ScriptedCodec::new(10, 10, 10).with_broken(5), CacheOptions::default());

        assert!(wait_for(TIMEOUT, || image.resident_indices().len() == 9));
        for index in (0..10).filter(|i| *i != 5) {
            assert!(wait_for(TIMEOUT, || image.image_at(index).is_some()));
        }
        for _ in 0..10 {
            assert!(image.image_at(5).is_none());
            thread::sleep(Duration::from_millis(2));
        }
    }

    #[test]
    fn out_of_range_index_misses_without_moving_cursor() {
        let (image, _) = scripted(
            ScriptedCodec::new(10, 10, 10),
            CacheOptions::default().with_window_override(WindowOverride::new(2)),
        );
        assert!(image.image_at(10).is_none());
        assert!(image.image_at(usize::MAX).is_none());
        assert!(wait_for(TIMEOUT, || image.resident_indices() == vec![0, 1]));
    }

    #[test]
    fn single_frame_source_keeps_its_poster() {
        let (image, codec) = scripted(ScriptedCodec::new(8, 8, 1), CacheOptions::default());
        assert_eq!(image.current_window_size(), 1);
        image.memory_warning();
        for _ in 0..10 {
            assert!(image.image_at(0).is_some());
        }
        assert_eq!(codec.decode_count(), 1);
    }

    #[test]
    fn no_notifications_after_drop_while_filling() {
        let observer = Arc::new(CountingObserver::default());
        let (image, _) = scripted(
            ScriptedCodec::new(10, 10, 20).with_decode_delay(Duration::from_millis(25)),
            CacheOptions::default().with_observer(observer.clone()),
        );
        assert!(wait_for(TIMEOUT, || image.worker_state() == WorkerState::Filling));

        drop(image);
        let after_drop = observer.cached.load(Ordering::SeqCst);

        thread::sleep(Duration::from_millis(150));
        assert_eq!(observer.cached.load(Ordering::SeqCst), after_drop);
    }

    #[test]
    fn empty_container_is_rejected() {
        let codec = Arc::new(ScriptedCodec::new(10, 10, 0));
        let result = AnimatedImage::with_codec(BYTES, codec, CacheOptions::default());
        assert!(matches!(result, Err(Error::NoFrames)));
    }

    #[test]
    fn broken_poster_is_rejected() {
        let codec = Arc::new(ScriptedCodec::new(10, 10, 3).with_broken(0));
        let result = AnimatedImage::with_codec(BYTES, codec, CacheOptions::default());
        assert!(matches!(result, Err(Error::PosterDecode(_))));
    }

    #[test]
    fn unrecognised_bytes_are_rejected() {
        assert!(matches!(
            AnimatedImage::new(&b"definitely not an image"[..]),
            Err(Error::UnsupportedFormat)
        ));

        let codec = Arc::new(ScriptedCodec::new(10, 10, 3));
        assert!(matches!(
            AnimatedImage::with_codec(&b""[..], codec, CacheOptions::default()),
            Err(Error::UnsupportedFormat)
        ));
    }

    #[test]
    fn missing_file_is_io_error() {
        let dir = tempfile::tempdir().expect("temp dir");
        let result = AnimatedImage::open(dir.path().join("missing.gif"));
        assert!(matches!(result, Err(Error::Io(_))));
    }

    #[test]
    fn real_gif_decodes_every_frame() {
        let bytes = encode_gif(12, 8, 4, 50, Repeat::Infinite);
        let image = AnimatedImage::new(bytes).expect("gif");

        assert_eq!(image.codec_name(), "gif");
        assert_eq!(image.frame_count(), 4);
        assert_eq!(image.canvas_size(), CanvasSize::new(12, 8));
        assert_eq!(image.loop_count(), 0);
        assert!(image
            .delay_times()
            .iter()
            .all(|delay| *delay == Duration::from_millis(50)));
        assert!(wait_for(TIMEOUT, || image.resident_indices().len() == 4));
    }
}
