// SPDX-License-Identifier: GPL-3.0-only

//! Image-sequence recording sink (`files` record scheme)
//!
//! Writes each frame as a numbered image file. The resource is a
//! printf-style pattern (`%d` / `%0Nd`) whose extension selects the encoder
//! (PNG, JPEG, anything the `image` crate maps from an extension). Stream 0
//! uses the pattern verbatim; stream `i > 0` gets `-<i>` inserted before
//! the extension.
//!
//! Frame timestamps have no representation in individual image files and
//! are ignored; `base_frame_time` still reports the stream's creation time.
//!
//! URI example:
//!
//! ```text
//! files:///captures/frame%04d.png
//! ```

use super::{expand_pattern, stream_sibling_path};
use crate::errors::{VideoError, VideoResult};
use crate::formats::{VideoPixelFormat, pixel_format_from_token};
use crate::record::{RecordStream, VideoRecord};
use crate::uri::Uri;
use image::ExtendedColorType;
use tracing::{debug, info};

/// One numbered image-sequence output stream
pub struct ImageFilesStream {
    pattern: String,
    width: u32,
    height: u32,
    format: VideoPixelFormat,
    color: ExtendedColorType,
    base_time: f64,
    next_index: u64,
}

fn wall_clock_s() -> f64 {
    chrono::Utc::now().timestamp_micros() as f64 / 1e6
}

impl RecordStream for ImageFilesStream {
    fn write_image(
        &mut self,
        image: &[u8],
        width: u32,
        height: u32,
        format: &str,
        time_s: Option<f64>,
    ) -> VideoResult<()> {
        let format = pixel_format_from_token(format)?;
        if width != self.width || height != self.height || format != self.format {
            return Err(VideoError::FormatMismatch(format!(
                "stream '{}' declared {}x{} {}, got {}x{} {}",
                self.pattern, self.width, self.height, self.format, width, height, format
            )));
        }
        let frame_size = self.format.image_size_bytes(width, height);
        if image.len() < frame_size {
            return Err(VideoError::FormatMismatch(format!(
                "stream '{}' needs {} bytes per frame, got {}",
                self.pattern,
                frame_size,
                image.len()
            )));
        }

        let path = expand_pattern(&self.pattern, self.next_index)
            .expect("pattern validated when the stream was added");
        image::save_buffer(&path, &image[..frame_size], width, height, self.color)
            .map_err(|e| VideoError::Io(format!("cannot write '{}': {}", path, e)))?;

        if let Some(time_s) = time_s {
            debug!(path = %path, time_s, "image files carry no timestamp, ignoring");
        }
        self.next_index += 1;
        Ok(())
    }

    fn base_frame_time(&self) -> f64 {
        self.base_time
    }
}

/// Multi-stream numbered-image recording backend
pub struct ImageFilesOutput {
    base_pattern: String,
    streams: Vec<ImageFilesStream>,
}

impl ImageFilesOutput {
    /// Construct from a parsed `files` record URI
    pub fn open(uri: &Uri) -> VideoResult<Self> {
        if expand_pattern(&uri.url, 0).is_none() {
            return Err(VideoError::Open(format!(
                "files record scheme needs a %d / %0Nd pattern, got '{}'",
                uri.url
            )));
        }
        Ok(Self {
            base_pattern: uri.url.clone(),
            streams: Vec::new(),
        })
    }
}

impl VideoRecord for ImageFilesOutput {
    fn add_stream(&mut self, width: u32, height: u32, encoder_format: &str) -> VideoResult<usize> {
        let format = pixel_format_from_token(encoder_format)?;
        let color = match format.format {
            "RGB24" => ExtendedColorType::Rgb8,
            "RGBA" => ExtendedColorType::Rgba8,
            "GRAY8" => ExtendedColorType::L8,
            "GRAY16LE" => ExtendedColorType::L16,
            other => {
                return Err(VideoError::Open(format!(
                    "image sequences cannot encode {}",
                    other
                )));
            }
        };

        let index = self.streams.len();
        let pattern = stream_sibling_path(&self.base_pattern, index);
        info!(pattern = %pattern, width, height, format = %format, "added image stream");

        self.streams.push(ImageFilesStream {
            pattern,
            width,
            height,
            format,
            color,
            base_time: wall_clock_s(),
            next_index: 0,
        });
        Ok(index)
    }

    fn stream_count(&self) -> usize {
        self.streams.len()
    }

    fn stream(&mut self, index: usize) -> VideoResult<&mut dyn RecordStream> {
        let len = self.streams.len();
        self.streams
            .get_mut(index)
            .map(|s| s as &mut dyn RecordStream)
            .ok_or(VideoError::OutOfRange { index, len })
    }
}
