// SPDX-License-Identifier: GPL-3.0-only

//! Format-converting capture backend (`format-converter` scheme)
//!
//! Wraps one inner backend — named by the nested URI in the resource — and
//! converts its frames to a target pixel format on the CPU. The wrapper owns
//! the inner backend outright and forwards lifecycle calls, so from the
//! caller's side it behaves like any other source.
//!
//! URI example:
//!
//! ```text
//! format-converter:[fmt=GRAY8]//usb-video:///dev/video0
//! ```

use super::converters::{self, ConvertFn};
use crate::capture::{StopFlag, VideoCapture};
use crate::errors::{VideoError, VideoResult};
use crate::formats::{VideoPixelFormat, pixel_format_from_token};
use crate::uri::Uri;
use tracing::{info, warn};

/// Capture backend converting an owned inner backend's pixel format
pub struct ConvertCapture {
    inner: Box<dyn VideoCapture>,
    target: VideoPixelFormat,
    convert: ConvertFn,
    scratch: Vec<u8>,
}

impl ConvertCapture {
    /// Construct around an already resolved inner backend
    ///
    /// The target format comes from the `fmt` parameter (default `RGB24`).
    /// An unsupported conversion pair fails with an open error.
    pub fn open(uri: &Uri, inner: Box<dyn VideoCapture>) -> VideoResult<Self> {
        let token: String = uri.get("fmt", "RGB24".to_string())?;
        let target = pixel_format_from_token(&token)?;
        let source = inner.pix_format();

        let convert = converters::find(source.format, target.format).ok_or_else(|| {
            VideoError::Open(format!(
                "no conversion from {} to {}",
                source.format, target.format
            ))
        })?;

        info!(from = %source, to = %target, "format converter ready");

        let scratch = vec![0u8; inner.size_bytes()];
        Ok(Self {
            inner,
            target,
            convert,
            scratch,
        })
    }

    fn grab_converted(
        &mut self,
        image: &mut [u8],
        wait: bool,
        newest: bool,
    ) -> bool {
        if image.len() < self.size_bytes() {
            warn!(
                have = image.len(),
                need = self.size_bytes(),
                "grab buffer too small"
            );
            return false;
        }
        let grabbed = if newest {
            self.inner.grab_newest(&mut self.scratch, wait)
        } else {
            self.inner.grab_next(&mut self.scratch, wait)
        };
        if !grabbed {
            return false;
        }
        let out_size = self.size_bytes();
        (self.convert)(
            &self.scratch,
            &mut image[..out_size],
            self.inner.width(),
            self.inner.height(),
        );
        true
    }
}

impl VideoCapture for ConvertCapture {
    fn width(&self) -> u32 {
        self.inner.width()
    }

    fn height(&self) -> u32 {
        self.inner.height()
    }

    fn size_bytes(&self) -> usize {
        self.target
            .image_size_bytes(self.inner.width(), self.inner.height())
    }

    fn pix_format(&self) -> VideoPixelFormat {
        self.target
    }

    fn start(&mut self) -> VideoResult<()> {
        self.inner.start()
    }

    fn stop(&mut self) -> VideoResult<()> {
        self.inner.stop()
    }

    fn stop_flag(&self) -> StopFlag {
        self.inner.stop_flag()
    }

    fn grab_next(&mut self, image: &mut [u8], wait: bool) -> bool {
        self.grab_converted(image, wait, false)
    }

    fn grab_newest(&mut self, image: &mut [u8], wait: bool) -> bool {
        self.grab_converted(image, wait, true)
    }
}
