// SPDX-License-Identifier: GPL-3.0-only

//! Capture interface implemented by every video source backend

use crate::errors::VideoResult;
use crate::formats::VideoPixelFormat;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Cloneable stop signal shared with a backend's blocking grab calls
///
/// A blocking `grab_next`/`grab_newest` call checks this flag at a bounded
/// interval and returns `false` once it is raised, so raising the flag from
/// another thread unblocks an in-flight grab without waiting for a frame.
/// [`VideoCapture::stop`] raises the backend's own flag; `start` clears it.
#[derive(Debug, Clone, Default)]
pub struct StopFlag {
    stopped: Arc<AtomicBool>,
}

impl StopFlag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Raise the flag, unblocking in-flight grab calls
    pub fn set(&self) {
        self.stopped.store(true, Ordering::SeqCst);
    }

    /// Check whether the flag has been raised
    pub fn is_set(&self) -> bool {
        self.stopped.load(Ordering::SeqCst)
    }

    pub(crate) fn clear(&self) {
        self.stopped.store(false, Ordering::SeqCst);
    }
}

/// Interface to video capture sources
///
/// Backends move between two states: `Idle` (constructed or stopped) and
/// `Running` (after [`start`](Self::start)). Frame retrieval is only
/// meaningful while `Running`; a grab in `Idle` reports `false`. `start` on
/// a running backend and `stop` on an idle one are no-ops. Dropping a
/// backend releases its resources from either state — producer threads are
/// joined and device/file handles closed.
///
/// Dimensions, byte size and pixel format are fixed once the backend is
/// constructed; there is no on-the-fly resolution change.
///
/// A backend instance is single-owner and not designed for concurrent calls
/// from multiple threads. The one sanctioned cross-thread interaction is
/// raising the [`StopFlag`] to cancel a blocking grab.
pub trait VideoCapture: Send {
    /// Frame width in pixels
    fn width(&self) -> u32;

    /// Frame height in pixels
    fn height(&self) -> u32;

    /// Size in bytes of one frame as copied by the grab calls
    fn size_bytes(&self) -> usize;

    /// Pixel format of grabbed frames
    fn pix_format(&self) -> VideoPixelFormat;

    /// Begin frame acquisition (no-op when already running)
    fn start(&mut self) -> VideoResult<()>;

    /// Halt frame acquisition and return to `Idle` (no-op when already idle)
    ///
    /// Raises the backend's [`StopFlag`], so any blocking grab in flight
    /// returns `false` within a bounded interval.
    fn stop(&mut self) -> VideoResult<()>;

    /// Handle to this backend's stop signal
    ///
    /// The handle stays valid for the backend's lifetime and can be raised
    /// from any thread to cancel a blocking grab.
    fn stop_flag(&self) -> StopFlag;

    /// Copy the next frame in acquisition order into `image`
    ///
    /// `image` must hold at least [`size_bytes`](Self::size_bytes) bytes.
    /// With `wait` the call suspends until a frame arrives or the stop flag
    /// is raised; without it the call returns immediately. Returns `true`
    /// iff a frame was copied. Frames are delivered in strict capture order;
    /// this call never skips.
    fn grab_next(&mut self, image: &mut [u8], wait: bool) -> bool;

    /// Copy the most recently captured frame into `image`, discarding any
    /// buffered older frames
    ///
    /// Same calling contract as [`grab_next`](Self::grab_next); trades
    /// completeness for latency. Backends without a frame backlog (file
    /// playback) treat this as `grab_next`.
    fn grab_newest(&mut self, image: &mut [u8], wait: bool) -> bool;
}
