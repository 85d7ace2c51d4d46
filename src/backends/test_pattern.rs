// SPDX-License-Identifier: GPL-3.0-only

//! Synthetic test-pattern capture source
//!
//! Generates a moving gradient on a paced producer thread, mirroring how a
//! live camera delivers frames. Each frame carries its sequence number in
//! the first 8 bytes (little endian), which makes ordering and freshness
//! observable from outside — the integration tests and `videoio info`
//! diagnostics rely on it.
//!
//! URI examples:
//!
//! ```text
//! test://
//! test:[size=320x240,fps=60,fmt=GRAY8]//
//! ```

use super::capture_loop::{CaptureLoop, FrameQueue, LoopAction, frame_queue, sleep_interruptible};
use crate::capture::{StopFlag, VideoCapture};
use crate::errors::{VideoError, VideoResult};
use crate::formats::{VideoPixelFormat, pixel_format_from_token};
use crate::uri::{Dims, Uri};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tracing::{debug, warn};

/// Count of currently constructed test pattern backends
///
/// Diagnostic counter used to observe facade ownership (a re-open must drop
/// the previous backend before the count settles back).
static LIVE_INSTANCES: AtomicUsize = AtomicUsize::new(0);

/// Synthetic moving-pattern source (`test` scheme)
pub struct TestPatternCapture {
    width: u32,
    height: u32,
    format: VideoPixelFormat,
    fps: f64,
    buffers: usize,
    stop: StopFlag,
    queue: Option<FrameQueue>,
    producer: Option<CaptureLoop>,
}

impl TestPatternCapture {
    /// Construct from a parsed `test` URI
    pub fn open(uri: &Uri) -> VideoResult<Self> {
        let dims = uri.get("size", Dims::new(640, 480))?;
        let fps: f64 = uri.get("fps", 30.0)?;
        let token: String = uri.get("fmt", "RGB24".to_string())?;
        let buffers: usize = uri.get("buffers", 4)?;
        let format = pixel_format_from_token(&token)?;

        if fps < 0.0 {
            return Err(VideoError::Open(format!("negative test fps {}", fps)));
        }
        if dims.width == 0 || dims.height == 0 {
            return Err(VideoError::Open(format!("zero test dimensions {}", dims)));
        }

        LIVE_INSTANCES.fetch_add(1, Ordering::SeqCst);
        debug!(size = %dims, fps, format = %format, "test pattern source ready");

        Ok(Self {
            width: dims.width,
            height: dims.height,
            format,
            fps,
            buffers,
            stop: StopFlag::new(),
            queue: None,
            producer: None,
        })
    }

    /// Number of live test pattern backends (diagnostic)
    pub fn live_instances() -> usize {
        LIVE_INSTANCES.load(Ordering::SeqCst)
    }

    /// Sequence number stamped into a grabbed frame
    pub fn frame_sequence(image: &[u8]) -> u64 {
        let mut stamp = [0u8; 8];
        let n = stamp.len().min(image.len());
        stamp[..n].copy_from_slice(&image[..n]);
        u64::from_le_bytes(stamp)
    }
}

/// Fill one pattern frame: sequence stamp, then a gradient shifted by it
fn render_frame(buf: &mut [u8], width: u32, seq: u64) {
    let stamp = seq.to_le_bytes();
    let n = stamp.len().min(buf.len());
    buf[..n].copy_from_slice(&stamp[..n]);
    for (i, px) in buf.iter_mut().enumerate().skip(n) {
        let x = (i as u64) % width.max(1) as u64;
        *px = ((x + seq) & 0xff) as u8;
    }
}

impl VideoCapture for TestPatternCapture {
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn size_bytes(&self) -> usize {
        self.format.image_size_bytes(self.width, self.height)
    }

    fn pix_format(&self) -> VideoPixelFormat {
        self.format
    }

    fn start(&mut self) -> VideoResult<()> {
        if self.producer.is_some() {
            return Ok(());
        }
        self.stop.clear();

        let (tx, rx) = frame_queue(self.buffers);
        let frame_size = self.size_bytes();
        let width = self.width;
        let fps = self.fps;
        let stop = self.stop.clone();
        let pace_stop = self.stop.clone();
        let mut seq: u64 = 0;

        self.queue = Some(rx);
        self.producer = Some(CaptureLoop::spawn("test-pattern", stop, move || {
            if fps <= 0.0 {
                // No frame rate: idle until stopped
                sleep_interruptible(Duration::from_millis(50), &pace_stop);
                return LoopAction::Continue;
            }
            let mut frame = vec![0u8; frame_size];
            render_frame(&mut frame, width, seq);
            seq += 1;
            if !tx.push(frame) {
                return LoopAction::Stop;
            }
            sleep_interruptible(Duration::from_secs_f64(1.0 / fps), &pace_stop);
            LoopAction::Continue
        }));
        Ok(())
    }

    fn stop(&mut self) -> VideoResult<()> {
        if let Some(mut producer) = self.producer.take() {
            producer.stop();
        }
        self.queue = None;
        Ok(())
    }

    fn stop_flag(&self) -> StopFlag {
        self.stop.clone()
    }

    fn grab_next(&mut self, image: &mut [u8], wait: bool) -> bool {
        self.copy_frame(image, wait, false)
    }

    fn grab_newest(&mut self, image: &mut [u8], wait: bool) -> bool {
        self.copy_frame(image, wait, true)
    }
}

impl TestPatternCapture {
    fn copy_frame(&mut self, image: &mut [u8], wait: bool, newest: bool) -> bool {
        let Some(queue) = &self.queue else {
            return false;
        };
        if image.len() < self.size_bytes() {
            warn!(
                have = image.len(),
                need = self.size_bytes(),
                "grab buffer too small"
            );
            return false;
        }
        let frame = if newest {
            queue.newest(wait, &self.stop)
        } else {
            queue.next(wait, &self.stop)
        };
        match frame {
            Some(frame) => {
                image[..frame.len()].copy_from_slice(&frame);
                true
            }
            None => false,
        }
    }
}

impl Drop for TestPatternCapture {
    fn drop(&mut self) {
        let _ = self.stop();
        LIVE_INSTANCES.fetch_sub(1, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_frame_stamps_sequence() {
        let mut buf = vec![0u8; 32];
        render_frame(&mut buf, 8, 42);
        assert_eq!(TestPatternCapture::frame_sequence(&buf), 42);
    }

    #[test]
    fn test_grab_before_start_is_false() {
        let uri = Uri::parse("test:[size=16x16]//").unwrap();
        let mut src = TestPatternCapture::open(&uri).unwrap();
        let mut buf = vec![0u8; src.size_bytes()];
        assert!(!src.grab_next(&mut buf, false));
    }
}
