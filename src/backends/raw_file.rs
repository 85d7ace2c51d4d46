// SPDX-License-Identifier: GPL-3.0-only

//! Rawvideo file playback source (`file` scheme)
//!
//! Reads frames from the native rawvideo container in storage order. With
//! `realtime=1` playback is paced by the stored timestamps instead of
//! running as fast as the disk allows.
//!
//! URI examples:
//!
//! ```text
//! file:///captures/run1.rv
//! file:[realtime=1]///captures/run1.rv
//! ```

use super::capture_loop::sleep_interruptible;
use super::rawvideo::{RawVideoHeader, read_frame, read_header};
use crate::capture::{StopFlag, VideoCapture};
use crate::errors::{VideoError, VideoResult};
use crate::formats::VideoPixelFormat;
use crate::uri::Uri;
use std::fs::File;
use std::io::BufReader;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Rawvideo container playback source
pub struct RawFileCapture {
    header: RawVideoHeader,
    reader: BufReader<File>,
    realtime: bool,
    running: bool,
    stop: StopFlag,
    /// Wall-clock anchor and stream time of the first delivered frame
    pace: Option<(Instant, f64)>,
}

impl RawFileCapture {
    /// Construct from a parsed `file` URI
    pub fn open(uri: &Uri) -> VideoResult<Self> {
        if uri.url.is_empty() {
            return Err(VideoError::Open("file scheme needs a path".into()));
        }
        let realtime: bool = uri.get("realtime", false)?;

        let file = File::open(&uri.url)
            .map_err(|e| VideoError::Open(format!("cannot open '{}': {}", uri.url, e)))?;
        let mut reader = BufReader::new(file);
        let header = read_header(&mut reader)?;

        info!(
            path = %uri.url,
            format = %header.format,
            width = header.width,
            height = header.height,
            realtime,
            "opened rawvideo file"
        );

        Ok(Self {
            header,
            reader,
            realtime,
            running: false,
            stop: StopFlag::new(),
            pace: None,
        })
    }

    fn read_next(&mut self, image: &mut [u8]) -> bool {
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
        let frame_size = self.header.frame_size();
        let time_s = match read_frame(&mut self.reader, &mut image[..frame_size]) {
            Ok(Some(time_s)) => time_s,
            Ok(None) => {
                debug!("end of rawvideo file");
                return false;
            }
            Err(e) => {
                warn!(error = %e, "rawvideo read failed");
                return false;
            }
        };

        if self.realtime {
            let (anchor, first_ts) = *self.pace.get_or_insert((Instant::now(), time_s));
            let due = Duration::from_secs_f64((time_s - first_ts).max(0.0));
            let elapsed = anchor.elapsed();
            if due > elapsed && !sleep_interruptible(due - elapsed, &self.stop) {
                // Stopped mid-pace: the frame was already read, deliver it
                return true;
            }
        }
        true
    }
}

impl VideoCapture for RawFileCapture {
    fn width(&self) -> u32 {
        self.header.width
    }

    fn height(&self) -> u32 {
        self.header.height
    }

    fn size_bytes(&self) -> usize {
        self.header.frame_size()
    }

    fn pix_format(&self) -> VideoPixelFormat {
        self.header.format
    }

    fn start(&mut self) -> VideoResult<()> {
        self.stop.clear();
        self.running = true;
        Ok(())
    }

    fn stop(&mut self) -> VideoResult<()> {
        self.stop.set();
        self.running = false;
        self.pace = None;
        Ok(())
    }

    fn stop_flag(&self) -> StopFlag {
        self.stop.clone()
    }

    fn grab_next(&mut self, image: &mut [u8], _wait: bool) -> bool {
        self.read_next(image)
    }

    /// File playback has no frame backlog, so newest is next
    fn grab_newest(&mut self, image: &mut [u8], wait: bool) -> bool {
        self.grab_next(image, wait)
    }
}
