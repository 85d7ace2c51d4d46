// SPDX-License-Identifier: GPL-3.0-only

//! Networked motion-JPEG capture (`motion-jpeg-network` scheme)
//!
//! Reads a `multipart/x-mixed-replace` HTTP stream, decodes each JPEG part
//! to RGB24 and queues it for the grab calls. The resource is the full HTTP
//! URL of the stream.
//!
//! Open probes the stream once to learn the frame dimensions; `start` opens
//! the streaming connection on a producer thread.
//!
//! URI example:
//!
//! ```text
//! motion-jpeg-network://http://127.0.0.1:8080/?action=stream
//! ```

use super::capture_loop::{FrameQueue, frame_queue};
use crate::capture::{StopFlag, VideoCapture};
use crate::errors::{VideoError, VideoResult};
use crate::formats::{VideoPixelFormat, pixel_format_from_token};
use crate::uri::Uri;
use std::io::{self, BufRead, BufReader, Read};
use std::thread::JoinHandle;
use std::time::Duration;
use tracing::{debug, info, warn};

const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);
const READ_TIMEOUT: Duration = Duration::from_secs(5);

/// Incremental reader for one multipart/x-mixed-replace stream
///
/// Parts with a `Content-Length` header are read exactly; without one the
/// payload is scanned for the next boundary marker.
pub(crate) struct MjpegStream<R> {
    input: R,
    boundary: Vec<u8>,
    /// Boundary line already consumed by a previous payload scan
    at_boundary: bool,
}

impl<R: BufRead> MjpegStream<R> {
    pub fn new(input: R, boundary: &str) -> Self {
        Self {
            input,
            boundary: format!("--{}", boundary.trim_start_matches('-')).into_bytes(),
            at_boundary: false,
        }
    }

    /// Read the next JPEG part, or `None` when the stream ended
    pub fn next_frame(&mut self) -> io::Result<Option<Vec<u8>>> {
        // Skip to the next boundary line, unless a payload scan already ate it
        if !self.at_boundary {
            loop {
                let Some(line) = self.read_line()? else {
                    return Ok(None);
                };
                if line.starts_with(&self.boundary) {
                    break;
                }
            }
        }
        self.at_boundary = false;

        // Part headers up to the blank line
        let mut content_length: Option<usize> = None;
        loop {
            let Some(line) = self.read_line()? else {
                return Ok(None);
            };
            if line.is_empty() {
                break;
            }
            if let Ok(text) = std::str::from_utf8(&line) {
                if let Some((name, value)) = text.split_once(':') {
                    if name.eq_ignore_ascii_case("content-length") {
                        content_length = value.trim().parse().ok();
                    }
                }
            }
        }

        match content_length {
            Some(len) => {
                let mut payload = vec![0u8; len];
                self.input.read_exact(&mut payload)?;
                Ok(Some(payload))
            }
            None => self.read_until_boundary(),
        }
    }

    /// One CRLF- or LF-terminated line, without the terminator
    fn read_line(&mut self) -> io::Result<Option<Vec<u8>>> {
        let mut line = Vec::new();
        if self.input.read_until(b'\n', &mut line)? == 0 {
            return Ok(None);
        }
        while matches!(line.last(), Some(b'\n') | Some(b'\r')) {
            line.pop();
        }
        Ok(Some(line))
    }

    /// Accumulate payload bytes until the boundary marker appears
    fn read_until_boundary(&mut self) -> io::Result<Option<Vec<u8>>> {
        let mut payload = Vec::new();
        loop {
            let mut line = Vec::new();
            if self.input.read_until(b'\n', &mut line)? == 0 {
                return Ok(if payload.is_empty() { None } else { Some(payload) });
            }
            let trimmed: &[u8] = if line.ends_with(b"\r\n") {
                &line[..line.len() - 2]
            } else if line.ends_with(b"\n") {
                &line[..line.len() - 1]
            } else {
                &line
            };
            if trimmed.starts_with(&self.boundary) {
                self.at_boundary = true;
                // Strip the CRLF that belongs to the boundary, not the payload
                while matches!(payload.last(), Some(b'\n') | Some(b'\r')) {
                    payload.pop();
                }
                return Ok(Some(payload));
            }
            payload.extend_from_slice(&line);
        }
    }
}

/// Extract the multipart boundary token from a Content-Type header value
fn boundary_from_content_type(content_type: &str) -> Option<String> {
    content_type.split(';').find_map(|part| {
        let (name, value) = part.trim().split_once('=')?;
        if name.eq_ignore_ascii_case("boundary") {
            Some(value.trim_matches('"').to_string())
        } else {
            None
        }
    })
}

fn make_agent() -> ureq::Agent {
    ureq::AgentBuilder::new()
        .timeout_connect(CONNECT_TIMEOUT)
        .timeout_read(READ_TIMEOUT)
        .build()
}

type BoxedStream = MjpegStream<BufReader<Box<dyn Read + Send + Sync + 'static>>>;

fn connect(agent: &ureq::Agent, url: &str) -> Result<BoxedStream, String> {
    let response = agent
        .get(url)
        .call()
        .map_err(|e| format!("cannot connect to '{}': {}", url, e))?;
    let content_type = response.header("content-type").unwrap_or_default();
    let boundary = boundary_from_content_type(content_type).ok_or_else(|| {
        format!(
            "'{}' is not a multipart MJPEG stream (content-type '{}')",
            url, content_type
        )
    })?;
    Ok(MjpegStream::new(
        BufReader::new(response.into_reader()),
        &boundary,
    ))
}

/// Motion-JPEG over HTTP capture backend
pub struct MjpegCapture {
    url: String,
    width: u32,
    height: u32,
    format: VideoPixelFormat,
    buffers: usize,
    stop: StopFlag,
    queue: Option<FrameQueue>,
    producer: Option<JoinHandle<()>>,
}

impl MjpegCapture {
    /// Construct from a parsed `motion-jpeg-network` URI
    pub fn open(uri: &Uri) -> VideoResult<Self> {
        if uri.url.is_empty() {
            return Err(VideoError::Open(
                "motion-jpeg-network needs a stream URL".into(),
            ));
        }
        let buffers: usize = uri.get("buffers", 4)?;

        // Probe once for dimensions; the streaming connection is opened by start
        let agent = make_agent();
        let mut stream = connect(&agent, &uri.url).map_err(VideoError::Open)?;
        let first = stream
            .next_frame()
            .map_err(|e| VideoError::Open(format!("reading '{}': {}", uri.url, e)))?
            .ok_or_else(|| {
                VideoError::Open(format!("'{}' ended before the first frame", uri.url))
            })?;
        let decoded = image::load_from_memory(&first)
            .map_err(|e| VideoError::Open(format!("first frame of '{}': {}", uri.url, e)))?;

        info!(
            url = %uri.url,
            width = decoded.width(),
            height = decoded.height(),
            "opened MJPEG stream"
        );

        Ok(Self {
            url: uri.url.clone(),
            width: decoded.width(),
            height: decoded.height(),
            format: pixel_format_from_token("RGB24")?,
            buffers,
            stop: StopFlag::new(),
            queue: None,
            producer: None,
        })
    }

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

impl VideoCapture for MjpegCapture {
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
        self.queue = Some(rx);

        let url = self.url.clone();
        let width = self.width;
        let height = self.height;
        let frame_size = self.size_bytes();
        let stop = self.stop.clone();

        self.producer = Some(std::thread::spawn(move || {
            debug!(url = %url, "MJPEG capture thread started");
            let agent = make_agent();
            let mut stream = match connect(&agent, &url) {
                Ok(stream) => stream,
                Err(e) => {
                    warn!(error = %e, "MJPEG reconnect failed");
                    return;
                }
            };

            while !stop.is_set() {
                let jpeg = match stream.next_frame() {
                    Ok(Some(jpeg)) => jpeg,
                    Ok(None) => {
                        debug!(url = %url, "MJPEG stream ended");
                        break;
                    }
                    Err(e) => {
                        warn!(error = %e, "MJPEG read failed, stopping capture");
                        break;
                    }
                };
                let decoded = match image::load_from_memory(&jpeg) {
                    Ok(decoded) => decoded,
                    Err(e) => {
                        // A corrupt part is a transient miss, keep reading
                        warn!(error = %e, "skipping undecodable MJPEG part");
                        continue;
                    }
                };
                if decoded.width() != width || decoded.height() != height {
                    warn!(
                        width = decoded.width(),
                        height = decoded.height(),
                        "MJPEG frame dimensions changed, stopping capture"
                    );
                    break;
                }
                let mut frame = decoded.to_rgb8().into_raw();
                frame.resize(frame_size, 0);
                if !tx.push(frame) {
                    break;
                }
            }
            debug!(url = %url, "MJPEG capture thread exiting");
        }));
        Ok(())
    }

    fn stop(&mut self) -> VideoResult<()> {
        self.stop.set();
        if let Some(handle) = self.producer.take() {
            if handle.join().is_err() {
                warn!("MJPEG capture thread panicked");
            }
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

impl Drop for MjpegCapture {
    fn drop(&mut self) {
        let _ = self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_boundary_from_content_type() {
        assert_eq!(
            boundary_from_content_type("multipart/x-mixed-replace; boundary=frame").as_deref(),
            Some("frame")
        );
        assert_eq!(
            boundary_from_content_type("multipart/x-mixed-replace;boundary=\"b\"").as_deref(),
            Some("b")
        );
        assert_eq!(boundary_from_content_type("image/jpeg"), None);
    }

    #[test]
    fn test_parts_with_content_length() {
        let raw = b"--frame\r\nContent-Type: image/jpeg\r\nContent-Length: 4\r\n\r\nabcd\r\n--frame\r\nContent-Length: 2\r\n\r\nxy\r\n".to_vec();
        let mut stream = MjpegStream::new(Cursor::new(raw), "frame");
        assert_eq!(stream.next_frame().unwrap().as_deref(), Some(&b"abcd"[..]));
        assert_eq!(stream.next_frame().unwrap().as_deref(), Some(&b"xy"[..]));
        assert_eq!(stream.next_frame().unwrap(), None);
    }

    #[test]
    fn test_parts_without_content_length() {
        let raw =
            b"--frame\r\nContent-Type: image/jpeg\r\n\r\npayload-1\r\n--frame\r\n\r\npayload-2\r\n--frame--\r\n"
                .to_vec();
        let mut stream = MjpegStream::new(Cursor::new(raw), "frame");
        assert_eq!(
            stream.next_frame().unwrap().as_deref(),
            Some(&b"payload-1"[..])
        );
        assert_eq!(
            stream.next_frame().unwrap().as_deref(),
            Some(&b"payload-2"[..])
        );
    }

    #[test]
    fn test_boundary_with_leading_dashes() {
        let raw = b"--frame\r\nContent-Length: 1\r\n\r\nz\r\n".to_vec();
        // Some servers advertise the boundary with its leading dashes
        let mut stream = MjpegStream::new(Cursor::new(raw), "--frame");
        assert_eq!(stream.next_frame().unwrap().as_deref(), Some(&b"z"[..]));
    }
}
