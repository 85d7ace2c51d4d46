// SPDX-License-Identifier: GPL-3.0-only

//! Producer-thread lifecycle and frame queueing shared by streaming backends
//!
//! Live sources (test pattern, USB video, network MJPEG) run a capture loop
//! on their own thread and hand frames to the grab calls through a bounded
//! queue. This module standardizes the thread lifecycle (start, stop signal,
//! join) and the queue overflow policy (drop oldest, so the newest captured
//! frame is always retrievable).

use crate::capture::StopFlag;
use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, TrySendError, bounded};
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Interval at which blocked receivers re-check the stop flag
const STOP_POLL_INTERVAL: Duration = Duration::from_millis(20);

/// Action returned by the capture loop callback to control loop behavior
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum LoopAction {
    /// Continue running the loop
    Continue,
    /// Stop the loop gracefully
    Stop,
}

/// Controller for a capture loop running on a separate thread
///
/// The loop callback is invoked repeatedly until it returns
/// [`LoopAction::Stop`] or the shared [`StopFlag`] is raised. Dropping the
/// controller stops and joins the thread, so a backend dropped while
/// `Running` still releases its thread.
pub(crate) struct CaptureLoop {
    handle: Option<JoinHandle<()>>,
    stop: StopFlag,
    name: &'static str,
}

impl CaptureLoop {
    /// Spawn a capture loop sharing the backend's stop flag
    pub fn spawn<F>(name: &'static str, stop: StopFlag, mut loop_fn: F) -> Self
    where
        F: FnMut() -> LoopAction + Send + 'static,
    {
        let thread_stop = stop.clone();
        info!(name, "starting capture loop");

        let handle = thread::spawn(move || {
            debug!(name, "capture loop thread started");
            loop {
                if thread_stop.is_set() {
                    debug!(name, "stop signal received");
                    break;
                }
                match loop_fn() {
                    LoopAction::Continue => {}
                    LoopAction::Stop => {
                        debug!(name, "loop requested stop");
                        break;
                    }
                }
            }
            debug!(name, "capture loop thread exiting");
        });

        Self {
            handle: Some(handle),
            stop,
            name,
        }
    }

    /// Raise the stop signal and join the thread
    pub fn stop(&mut self) {
        self.stop.set();
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                warn!(name = self.name, "capture loop thread panicked");
            }
        }
    }
}

impl Drop for CaptureLoop {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Producer half of a frame queue
///
/// The sender keeps a receiver clone so that on overflow it can discard the
/// oldest queued frame before retrying — the queue always holds the most
/// recently captured frames.
pub(crate) struct FrameSender {
    tx: Sender<Vec<u8>>,
    overflow_rx: Receiver<Vec<u8>>,
}

impl FrameSender {
    /// Queue a frame, dropping the oldest buffered one when full
    ///
    /// Returns `false` when the consumer side is gone.
    pub fn push(&self, frame: Vec<u8>) -> bool {
        match self.tx.try_send(frame) {
            Ok(()) => true,
            Err(TrySendError::Full(frame)) => {
                let _ = self.overflow_rx.try_recv();
                // Losing the race for the freed slot drops this frame but
                // keeps the producer alive
                !matches!(self.tx.try_send(frame), Err(TrySendError::Disconnected(_)))
            }
            Err(TrySendError::Disconnected(_)) => false,
        }
    }
}

/// Consumer half of a frame queue
pub(crate) struct FrameQueue {
    rx: Receiver<Vec<u8>>,
}

impl FrameQueue {
    /// Receive the next frame in capture order
    ///
    /// With `wait` the call blocks, re-checking `stop` at a bounded
    /// interval; it returns `None` once the flag is raised (after draining
    /// anything already queued) or the producer is gone.
    pub fn next(&self, wait: bool, stop: &StopFlag) -> Option<Vec<u8>> {
        loop {
            if let Ok(frame) = self.rx.try_recv() {
                return Some(frame);
            }
            if !wait || stop.is_set() {
                return None;
            }
            match self.rx.recv_timeout(STOP_POLL_INTERVAL) {
                Ok(frame) => return Some(frame),
                Err(RecvTimeoutError::Timeout) => continue,
                Err(RecvTimeoutError::Disconnected) => return None,
            }
        }
    }

    /// Receive the most recently captured frame, discarding older ones
    pub fn newest(&self, wait: bool, stop: &StopFlag) -> Option<Vec<u8>> {
        let mut latest = None;
        while let Ok(frame) = self.rx.try_recv() {
            latest = Some(frame);
        }
        if latest.is_some() {
            return latest;
        }
        let mut latest = self.next(wait, stop)?;
        while let Ok(frame) = self.rx.try_recv() {
            latest = frame;
        }
        Some(latest)
    }
}

/// Sleep for `duration`, re-checking the stop flag at a bounded interval
///
/// Returns `false` when the sleep was cut short by the flag.
pub(crate) fn sleep_interruptible(duration: Duration, stop: &StopFlag) -> bool {
    let deadline = std::time::Instant::now() + duration;
    loop {
        if stop.is_set() {
            return false;
        }
        let remaining = deadline.saturating_duration_since(std::time::Instant::now());
        if remaining.is_zero() {
            return true;
        }
        thread::sleep(remaining.min(STOP_POLL_INTERVAL));
    }
}

/// Create a bounded frame queue with drop-oldest overflow
pub(crate) fn frame_queue(capacity: usize) -> (FrameSender, FrameQueue) {
    let (tx, rx) = bounded(capacity.max(1));
    (
        FrameSender {
            tx,
            overflow_rx: rx.clone(),
        },
        FrameQueue { rx },
    )
}
