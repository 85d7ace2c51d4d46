// SPDX-License-Identifier: GPL-3.0-only

//! videoio — URI-driven video capture and recording
//!
//! One textual addressing scheme selects, configures and composes video
//! sources and sinks behind a single polymorphic interface:
//!
//! ```text
//! scheme:[param1=value1,param2=value2,...]//resource
//! ```
//!
//! Capture schemes:
//!
//! - `test` — synthetic moving pattern, e.g. `test:[size=320x240,fps=60]//`
//! - `file` — rawvideo container playback, e.g. `file:[realtime=1]///cap/run.rv`
//! - `files` — numbered image sequence, e.g. `files:///seq/frame%03d.jpg`
//! - `usb-video` — V4L2 camera (Linux), e.g. `usb-video:///dev/video0`
//! - `format-converter` — CPU pixel conversion around a nested source,
//!   e.g. `format-converter:[fmt=GRAY8]//usb-video:///dev/video0`
//! - `motion-jpeg-network` — multipart MJPEG over HTTP,
//!   e.g. `motion-jpeg-network://http://127.0.0.1:8080/?action=stream`
//! - `firewire`, `depth-stream` — reserved for SDK-bound device families;
//!   opening reports the missing driver support
//!
//! Record schemes:
//!
//! - `file` — rawvideo container sink
//! - `files` — numbered image sink, e.g. `files:///cap/frame%04d.png`
//!
//! # Architecture
//!
//! - [`uri`]: URI parsing and typed parameter access
//! - [`formats`]: pixel format registry
//! - [`capture`] / [`record`]: the backend interfaces
//! - [`backends`]: concrete backends and the scheme resolver
//! - [`input`] / [`output`]: generic facades owning one resolved backend
//!
//! # Example
//!
//! ```no_run
//! use videoio::VideoInput;
//!
//! let mut video = VideoInput::from_uri("test:[size=320x240,fps=30]//")?;
//! video.start()?;
//! let mut frame = vec![0u8; video.size_bytes()?];
//! while video.grab_next(&mut frame, true)? {
//!     // process the frame
//!     # break;
//! }
//! video.stop()?;
//! # Ok::<(), videoio::VideoError>(())
//! ```

pub mod backends;
pub mod capture;
pub mod errors;
pub mod formats;
pub mod input;
pub mod output;
pub mod record;
pub mod uri;

// Re-export the surface most callers need
pub use backends::{open_capture, open_record};
pub use capture::{StopFlag, VideoCapture};
pub use errors::{VideoError, VideoResult};
pub use formats::{VideoPixelFormat, pixel_format_from_token};
pub use input::VideoInput;
pub use output::VideoOutput;
pub use record::{RecordStream, VideoRecord};
pub use uri::{Dims, FromUriParam, Offset, Uri};
