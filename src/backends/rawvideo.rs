// SPDX-License-Identifier: GPL-3.0-only

//! Rawvideo container framing
//!
//! The native uncompressed container written by the `file` record backend
//! and read by the `file` capture backend. One ASCII header line:
//!
//! ```text
//! rawvideo <FORMAT> <W>x<H> <NUM>/<DEN>\n
//! ```
//!
//! followed by frame records, each an 8-byte little-endian `f64` timestamp
//! (seconds relative to the stream base) and exactly
//! `W * H * bpp(FORMAT)` payload bytes.

use crate::errors::{VideoError, VideoResult};
use crate::formats::{VideoPixelFormat, pixel_format_from_token};
use std::io::{self, BufRead, Read, Write};

const MAGIC: &str = "rawvideo";

/// Parsed rawvideo header
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct RawVideoHeader {
    pub format: VideoPixelFormat,
    pub width: u32,
    pub height: u32,
    pub fps_num: u32,
    pub fps_den: u32,
}

impl RawVideoHeader {
    pub fn frame_size(&self) -> usize {
        self.format.image_size_bytes(self.width, self.height)
    }
}

/// Write the header line
pub(crate) fn write_header<W: Write>(out: &mut W, header: &RawVideoHeader) -> io::Result<()> {
    writeln!(
        out,
        "{} {} {}x{} {}/{}",
        MAGIC, header.format.format, header.width, header.height, header.fps_num, header.fps_den
    )
}

/// Read and validate the header line
pub(crate) fn read_header<R: BufRead>(input: &mut R) -> VideoResult<RawVideoHeader> {
    let mut line = String::new();
    input.read_line(&mut line)?;
    let mut fields = line.split_whitespace();

    if fields.next() != Some(MAGIC) {
        return Err(VideoError::Open(
            "not a rawvideo container (bad magic)".into(),
        ));
    }
    let token = fields
        .next()
        .ok_or_else(|| VideoError::Open("rawvideo header missing format token".into()))?;
    let format = pixel_format_from_token(token)?;

    let dims = fields
        .next()
        .ok_or_else(|| VideoError::Open("rawvideo header missing dimensions".into()))?;
    let (w, h) = dims
        .split_once('x')
        .ok_or_else(|| VideoError::Open(format!("bad rawvideo dimensions '{}'", dims)))?;
    let width: u32 = w
        .parse()
        .map_err(|_| VideoError::Open(format!("bad rawvideo width '{}'", w)))?;
    let height: u32 = h
        .parse()
        .map_err(|_| VideoError::Open(format!("bad rawvideo height '{}'", h)))?;
    if width == 0 || height == 0 {
        return Err(VideoError::Open("zero rawvideo dimensions".into()));
    }

    let rate = fields
        .next()
        .ok_or_else(|| VideoError::Open("rawvideo header missing frame rate".into()))?;
    let (num, den) = rate
        .split_once('/')
        .ok_or_else(|| VideoError::Open(format!("bad rawvideo frame rate '{}'", rate)))?;
    let fps_num: u32 = num
        .parse()
        .map_err(|_| VideoError::Open(format!("bad rawvideo frame rate '{}'", rate)))?;
    let fps_den: u32 = den
        .parse()
        .map_err(|_| VideoError::Open(format!("bad rawvideo frame rate '{}'", rate)))?;

    Ok(RawVideoHeader {
        format,
        width,
        height,
        fps_num,
        fps_den: fps_den.max(1),
    })
}

/// Append one frame record
pub(crate) fn write_frame<W: Write>(out: &mut W, time_s: f64, payload: &[u8]) -> io::Result<()> {
    out.write_all(&time_s.to_le_bytes())?;
    out.write_all(payload)
}

/// Read the next frame record into `payload`
///
/// Returns the stored timestamp, or `None` on clean end of file. A record
/// truncated mid-frame is an I/O error, not a clean end.
pub(crate) fn read_frame<R: Read>(input: &mut R, payload: &mut [u8]) -> io::Result<Option<f64>> {
    let mut stamp = [0u8; 8];
    match input.read_exact(&mut stamp) {
        Ok(()) => {}
        Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => return Ok(None),
        Err(e) => return Err(e),
    }
    input.read_exact(payload)?;
    Ok(Some(f64::from_le_bytes(stamp)))
}
