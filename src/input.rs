// SPDX-License-Identifier: GPL-3.0-only

//! Generic capture facade
//!
//! [`VideoInput`] gives callers one concrete type regardless of which
//! backend a URI resolves to. It owns exactly one backend at a time and
//! forwards every call; the methods mirror the [`VideoCapture`] trait but
//! return a `NotOpen` error until a URI has been opened successfully.

use crate::backends::open_capture;
use crate::capture::{StopFlag, VideoCapture};
use crate::errors::{VideoError, VideoResult};
use crate::formats::VideoPixelFormat;
use tracing::info;

/// Generic wrapper owning one resolved capture backend
#[derive(Default)]
pub struct VideoInput {
    uri: Option<String>,
    video: Option<Box<dyn VideoCapture>>,
}

impl VideoInput {
    /// Create an unopened facade
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a facade and open `uri` in one step
    pub fn from_uri(uri: &str) -> VideoResult<Self> {
        let mut input = Self::new();
        input.open(uri)?;
        Ok(input)
    }

    /// Resolve `uri` and take ownership of the backend
    ///
    /// Any previously held backend is destroyed first, so repeated opens
    /// never leak a device handle and never double-open. On resolution
    /// failure the facade is left closed.
    pub fn open(&mut self, uri: &str) -> VideoResult<()> {
        // Release the old backend before constructing the new one — the
        // same device may be named by both URIs
        self.video.take();
        self.uri = Some(uri.to_string());
        self.video = Some(open_capture(uri)?);
        info!(uri, "video input open");
        Ok(())
    }

    /// Re-open the last URI, recovering a dead device without losing
    /// configuration
    pub fn reset(&mut self) -> VideoResult<()> {
        let uri = self.uri.clone().ok_or(VideoError::NotOpen)?;
        self.open(&uri)
    }

    /// Whether a backend is currently held
    pub fn is_open(&self) -> bool {
        self.video.is_some()
    }

    /// The URI of the last successful or attempted open
    pub fn uri(&self) -> Option<&str> {
        self.uri.as_deref()
    }

    /// Borrow the held backend as a capture trait object
    pub fn as_capture_mut(&mut self) -> VideoResult<&mut dyn VideoCapture> {
        self.video.as_deref_mut().ok_or(VideoError::NotOpen)
    }

    fn backend(&self) -> VideoResult<&dyn VideoCapture> {
        self.video.as_deref().ok_or(VideoError::NotOpen)
    }

    fn backend_mut(&mut self) -> VideoResult<&mut Box<dyn VideoCapture>> {
        self.video.as_mut().ok_or(VideoError::NotOpen)
    }

    /// Frame width in pixels
    pub fn width(&self) -> VideoResult<u32> {
        Ok(self.backend()?.width())
    }

    /// Frame height in pixels
    pub fn height(&self) -> VideoResult<u32> {
        Ok(self.backend()?.height())
    }

    /// Size in bytes of one grabbed frame
    pub fn size_bytes(&self) -> VideoResult<usize> {
        Ok(self.backend()?.size_bytes())
    }

    /// Pixel format of grabbed frames
    pub fn pix_format(&self) -> VideoResult<VideoPixelFormat> {
        Ok(self.backend()?.pix_format())
    }

    /// Begin frame acquisition
    pub fn start(&mut self) -> VideoResult<()> {
        self.backend_mut()?.start()
    }

    /// Halt frame acquisition
    pub fn stop(&mut self) -> VideoResult<()> {
        self.backend_mut()?.stop()
    }

    /// Handle to the held backend's stop signal
    pub fn stop_flag(&self) -> VideoResult<StopFlag> {
        Ok(self.backend()?.stop_flag())
    }

    /// Copy the next frame in acquisition order (see [`VideoCapture::grab_next`])
    pub fn grab_next(&mut self, image: &mut [u8], wait: bool) -> VideoResult<bool> {
        Ok(self.backend_mut()?.grab_next(image, wait))
    }

    /// Copy the most recent frame, discarding older ones (see
    /// [`VideoCapture::grab_newest`])
    pub fn grab_newest(&mut self, image: &mut [u8], wait: bool) -> VideoResult<bool> {
        Ok(self.backend_mut()?.grab_newest(image, wait))
    }
}
