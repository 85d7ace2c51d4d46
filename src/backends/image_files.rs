// SPDX-License-Identifier: GPL-3.0-only

//! Image-sequence playback source (`files` scheme)
//!
//! Streams frames from a printf-style numbered image sequence, decoded with
//! the `image` crate. The first image fixes the dimensions; later images
//! must match or playback ends.
//!
//! URI examples:
//!
//! ```text
//! files:///seq/frame%03d.jpg
//! files:[fmt=GRAY8,fps=25]///seq/frame%d.png
//! ```

use super::capture_loop::sleep_interruptible;
use super::expand_pattern;
use crate::capture::{StopFlag, VideoCapture};
use crate::errors::{VideoError, VideoResult};
use crate::formats::{VideoPixelFormat, pixel_format_from_token};
use crate::uri::Uri;
use std::path::Path;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Printf-style numbered image sequence source
pub struct ImageFilesCapture {
    pattern: String,
    format: VideoPixelFormat,
    width: u32,
    height: u32,
    fps: f64,
    next_index: u64,
    running: bool,
    stop: StopFlag,
    last_frame_at: Option<Instant>,
}

impl ImageFilesCapture {
    /// Construct from a parsed `files` URI
    pub fn open(uri: &Uri) -> VideoResult<Self> {
        let token: String = uri.get("fmt", "RGB24".to_string())?;
        let fps: f64 = uri.get("fps", 0.0)?;
        let format = pixel_format_from_token(&token)?;
        if !matches!(format.format, "RGB24" | "RGBA" | "GRAY8") {
            return Err(VideoError::Open(format!(
                "image sequences decode to RGB24, RGBA or GRAY8, not {}",
                format
            )));
        }

        if expand_pattern(&uri.url, 0).is_none() {
            return Err(VideoError::Open(format!(
                "files scheme needs a %d / %0Nd pattern, got '{}'",
                uri.url
            )));
        }

        // Sequences may start at 0 or 1
        let first_index = [0u64, 1]
            .into_iter()
            .find(|&i| {
                expand_pattern(&uri.url, i).is_some_and(|p| Path::new(&p).exists())
            })
            .ok_or_else(|| {
                VideoError::Open(format!("no file matches sequence pattern '{}'", uri.url))
            })?;

        let first_path = expand_pattern(&uri.url, first_index).expect("pattern checked above");
        let probe = image::open(&first_path)
            .map_err(|e| VideoError::Open(format!("cannot decode '{}': {}", first_path, e)))?;

        info!(
            pattern = %uri.url,
            first_index,
            width = probe.width(),
            height = probe.height(),
            format = %format,
            "opened image sequence"
        );

        Ok(Self {
            pattern: uri.url.clone(),
            format,
            width: probe.width(),
            height: probe.height(),
            fps,
            next_index: first_index,
            running: false,
            stop: StopFlag::new(),
            last_frame_at: None,
        })
    }

    fn decode_into(&self, path: &str, image: &mut [u8]) -> bool {
        let decoded = match image::open(path) {
            Ok(decoded) => decoded,
            Err(e) => {
                warn!(path, error = %e, "image decode failed");
                return false;
            }
        };
        if decoded.width() != self.width || decoded.height() != self.height {
            warn!(
                path,
                width = decoded.width(),
                height = decoded.height(),
                expected_width = self.width,
                expected_height = self.height,
                "sequence image dimensions changed, ending playback"
            );
            return false;
        }
        let raw = match self.format.format {
            "RGB24" => decoded.to_rgb8().into_raw(),
            "RGBA" => decoded.to_rgba8().into_raw(),
            _ => decoded.to_luma8().into_raw(),
        };
        image[..raw.len()].copy_from_slice(&raw);
        true
    }
}

impl VideoCapture for ImageFilesCapture {
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
        self.stop.clear();
        self.running = true;
        Ok(())
    }

    fn stop(&mut self) -> VideoResult<()> {
        self.stop.set();
        self.running = false;
        self.last_frame_at = None;
        Ok(())
    }

    fn stop_flag(&self) -> StopFlag {
        self.stop.clone()
    }

    fn grab_next(&mut self, image: &mut [u8], _wait: bool) -> bool {
        if !self.running {
            return false;
        }
        if image.len() < self.size_bytes() {
            warn!(
                have = image.len(),
                need = self.size_bytes(),
                "grab buffer too small"
            );
            return false;
        }
        let Some(path) = expand_pattern(&self.pattern, self.next_index) else {
            return false;
        };
        if !Path::new(&path).exists() {
            debug!(path = %path, "end of image sequence");
            return false;
        }

        if self.fps > 0.0 {
            let interval = Duration::from_secs_f64(1.0 / self.fps);
            if let Some(last) = self.last_frame_at {
                let due = last + interval;
                let now = Instant::now();
                if due > now {
                    sleep_interruptible(due - now, &self.stop);
                }
            }
            self.last_frame_at = Some(Instant::now());
        }

        if !self.decode_into(&path, image) {
            return false;
        }
        self.next_index += 1;
        true
    }

    /// An image sequence has no frame backlog, so newest is next
    fn grab_newest(&mut self, image: &mut [u8], wait: bool) -> bool {
        self.grab_next(image, wait)
    }
}
