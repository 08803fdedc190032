// SPDX-License-Identifier: MPL-2.0
//! Observer port for cache introspection.
//!
//! Observers are purely informational. An [`AnimatedImage`](crate::animated::AnimatedImage)
//! without an observer behaves exactly like one with an observer attached.

/// Debug hooks fired by the frame cache.
///
/// Both methods have empty default bodies so implementors only override what
/// they care about.
///
/// # Threading
///
/// - [`frame_requested`](Self::frame_requested) runs on the caller's thread,
///   inside [`image_at`](crate::animated::AnimatedImage::image_at). Keep it
///   cheap and never block in it.
/// - [`frames_cached`](Self::frames_cached) runs on the refill worker thread.
pub trait CacheObserver: Send + Sync {
    /// Called after a refill step changed which frames are resident.
    ///
    /// `resident` lists every resident index in ascending order.
    fn frames_cached(&self, resident: &[usize]) {
        let _ = resident;
    }

    /// Called each time a frame is requested, with whether it was a hit.
    fn frame_requested(&self, index: usize, hit: bool) {
        let _ = (index, hit);
    }
}
