// SPDX-License-Identifier: GPL-3.0-only

//! Rawvideo file recording sink (`file` record scheme)
//!
//! Writes frames into the native rawvideo container. Stream 0 writes the
//! resource path verbatim; stream `i > 0` writes a sibling file with `-<i>`
//! inserted before the extension. Streams are independent files, so writes
//! to different streams need no external serialization.
//!
//! URI examples:
//!
//! ```text
//! file:///captures/run1.rv
//! file:[fps=60]///captures/run1.rv
//! ```

use super::rawvideo::{RawVideoHeader, write_frame, write_header};
use super::stream_sibling_path;
use crate::errors::{VideoError, VideoResult};
use crate::formats::{VideoPixelFormat, pixel_format_from_token};
use crate::record::{RecordStream, VideoRecord};
use crate::uri::Uri;
use std::fs::File;
use std::io::{BufWriter, Write};
use tracing::{info, warn};

/// One rawvideo output stream
pub struct RawVideoStream {
    writer: BufWriter<File>,
    path: String,
    width: u32,
    height: u32,
    format: VideoPixelFormat,
    base_time: f64,
}

/// Seconds since the Unix epoch
fn wall_clock_s() -> f64 {
    chrono::Utc::now().timestamp_micros() as f64 / 1e6
}

impl RecordStream for RawVideoStream {
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
                self.path, self.width, self.height, self.format, width, height, format
            )));
        }
        let frame_size = self.format.image_size_bytes(width, height);
        if image.len() < frame_size {
            return Err(VideoError::FormatMismatch(format!(
                "stream '{}' needs {} bytes per frame, got {}",
                self.path,
                frame_size,
                image.len()
            )));
        }
        let time_s = time_s.unwrap_or_else(|| wall_clock_s() - self.base_time);
        write_frame(&mut self.writer, time_s, &image[..frame_size])?;
        Ok(())
    }

    fn base_frame_time(&self) -> f64 {
        self.base_time
    }
}

impl Drop for RawVideoStream {
    fn drop(&mut self) {
        if let Err(e) = self.writer.flush() {
            warn!(path = %self.path, error = %e, "rawvideo stream flush failed");
        }
    }
}

/// Multi-stream rawvideo recording backend
pub struct RawVideoOutput {
    base_path: String,
    fps: u32,
    streams: Vec<RawVideoStream>,
}

impl RawVideoOutput {
    /// Construct from a parsed `file` record URI
    ///
    /// Files are created lazily, one per `add_stream` call.
    pub fn open(uri: &Uri) -> VideoResult<Self> {
        if uri.url.is_empty() {
            return Err(VideoError::Open("file record scheme needs a path".into()));
        }
        let fps: u32 = uri.get("fps", 30)?;
        Ok(Self {
            base_path: uri.url.clone(),
            fps,
            streams: Vec::new(),
        })
    }
}

impl VideoRecord for RawVideoOutput {
    fn add_stream(&mut self, width: u32, height: u32, encoder_format: &str) -> VideoResult<usize> {
        let format = pixel_format_from_token(encoder_format)?;
        let index = self.streams.len();
        let path = stream_sibling_path(&self.base_path, index);

        let file = File::create(&path)
            .map_err(|e| VideoError::Open(format!("cannot create '{}': {}", path, e)))?;
        let mut writer = BufWriter::new(file);
        write_header(
            &mut writer,
            &RawVideoHeader {
                format,
                width,
                height,
                fps_num: self.fps,
                fps_den: 1,
            },
        )?;

        info!(path = %path, width, height, format = %format, "added rawvideo stream");

        self.streams.push(RawVideoStream {
            writer,
            path,
            width,
            height,
            format,
            base_time: wall_clock_s(),
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
