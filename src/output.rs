// SPDX-License-Identifier: GPL-3.0-only

//! Generic record facade
//!
//! [`VideoOutput`] mirrors [`VideoInput`](crate::input::VideoInput) for the
//! recording direction: one concrete type owning one resolved sink backend,
//! with a `NotOpen` error before the first successful open.

use crate::backends::open_record;
use crate::errors::{VideoError, VideoResult};
use crate::record::{RecordStream, VideoRecord};
use tracing::info;

/// Generic wrapper owning one resolved record backend
#[derive(Default)]
pub struct VideoOutput {
    uri: Option<String>,
    recorder: Option<Box<dyn VideoRecord>>,
}

impl VideoOutput {
    /// Create an unopened facade
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a facade and open `uri` in one step
    pub fn from_uri(uri: &str) -> VideoResult<Self> {
        let mut output = Self::new();
        output.open(uri)?;
        Ok(output)
    }

    /// Resolve `uri` and take ownership of the sink backend
    ///
    /// A previously held backend is destroyed first (flushing its streams),
    /// so repeated opens never leak.
    pub fn open(&mut self, uri: &str) -> VideoResult<()> {
        self.recorder.take();
        self.uri = Some(uri.to_string());
        self.recorder = Some(open_record(uri)?);
        info!(uri, "video output open");
        Ok(())
    }

    /// Re-open the last URI
    ///
    /// Recreates the sink from scratch; file-backed sinks truncate their
    /// outputs and previously added streams are gone.
    pub fn reset(&mut self) -> VideoResult<()> {
        let uri = self.uri.clone().ok_or(VideoError::NotOpen)?;
        self.open(&uri)
    }

    /// Whether a backend is currently held
    pub fn is_open(&self) -> bool {
        self.recorder.is_some()
    }

    /// Borrow the held backend as a record trait object
    pub fn as_record_mut(&mut self) -> VideoResult<&mut dyn VideoRecord> {
        self.recorder.as_deref_mut().ok_or(VideoError::NotOpen)
    }

    fn backend_mut(&mut self) -> VideoResult<&mut Box<dyn VideoRecord>> {
        self.recorder.as_mut().ok_or(VideoError::NotOpen)
    }

    /// Register a new output stream (see [`VideoRecord::add_stream`])
    pub fn add_stream(
        &mut self,
        width: u32,
        height: u32,
        encoder_format: &str,
    ) -> VideoResult<usize> {
        self.backend_mut()?.add_stream(width, height, encoder_format)
    }

    /// Number of registered streams
    pub fn stream_count(&self) -> usize {
        self.recorder.as_ref().map_or(0, |r| r.stream_count())
    }

    /// Write interface of the stream at `index` (see [`VideoRecord::stream`])
    pub fn stream(&mut self, index: usize) -> VideoResult<&mut dyn RecordStream> {
        self.backend_mut()?.stream(index)
    }
}
