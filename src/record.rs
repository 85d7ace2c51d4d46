// SPDX-License-Identifier: GPL-3.0-only

//! Record interface implemented by every video sink backend

use crate::errors::VideoResult;

/// Write interface of one output stream within a recording backend
pub trait RecordStream {
    /// Encode and persist one frame
    ///
    /// `width`, `height` and `format` must match what
    /// [`VideoRecord::add_stream`] declared for this stream; a mismatch
    /// fails with `FormatMismatch`. `time_s` is the frame timestamp in
    /// seconds relative to the stream's reference epoch; `None` derives it
    /// from the stream's own base clock (see
    /// [`base_frame_time`](Self::base_frame_time)).
    fn write_image(
        &mut self,
        image: &[u8],
        width: u32,
        height: u32,
        format: &str,
        time_s: Option<f64>,
    ) -> VideoResult<()>;

    /// Reference epoch of this stream, in seconds since the Unix epoch
    ///
    /// Captured when the stream was added. Derived timestamps are the wall
    /// clock elapsed since this base.
    fn base_frame_time(&self) -> f64;
}

/// Interface to video recording destinations
///
/// A recording backend owns zero or more streams, each an independent write
/// target. Streams are append-only for the life of the backend — there is no
/// removal. Streams of one backend may share an underlying resource; whether
/// writes to different streams need external serialization is a per-backend
/// contract (the built-in file sinks write sibling files and are independent).
pub trait VideoRecord: Send {
    /// Register a new output stream and return its stable index
    fn add_stream(&mut self, width: u32, height: u32, encoder_format: &str) -> VideoResult<usize>;

    /// Number of registered streams
    fn stream_count(&self) -> usize;

    /// Write interface of the stream at `index`
    ///
    /// Fails with `OutOfRange` when `index` is not below
    /// [`stream_count`](Self::stream_count).
    fn stream(&mut self, index: usize) -> VideoResult<&mut dyn RecordStream>;
}
