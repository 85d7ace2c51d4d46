// SPDX-License-Identifier: GPL-3.0-only

//! Error types for video URI resolution and backend I/O

use std::fmt;

/// Result type alias using VideoError
pub type VideoResult<T> = Result<T, VideoError>;

/// Error type shared by the URI parser, the backend resolver and the facades
///
/// Construction-time faults (parse, resolve, open) are reported through this
/// type and carry a human-readable detail string. Steady-state frame-grab
/// failures are reported as `false` from the grab calls instead, so callers
/// can retry or degrade without unwinding.
#[derive(Debug, Clone)]
pub enum VideoError {
    /// URI text could not be parsed (missing scheme separator, unterminated
    /// parameter block, missing `//` resource delimiter)
    MalformedUri(String),
    /// A URI parameter is present but its value does not convert to the
    /// requested type
    ParamConversion {
        /// Parameter key that was looked up
        key: String,
        /// Stored string value that failed to convert
        value: String,
        /// Name of the requested target type
        expected: &'static str,
    },
    /// The resolver has no backend for the URI scheme
    UnsupportedScheme(String),
    /// Pixel format token not present in the registry
    UnknownFormat(String),
    /// Backend construction failed (device absent, permission denied,
    /// unsupported mode, driver support not compiled in)
    Open(String),
    /// Facade used before a successful open
    NotOpen,
    /// Record stream index past the end of the stream table
    OutOfRange {
        /// Index that was requested
        index: usize,
        /// Number of registered streams
        len: usize,
    },
    /// Frame shape handed to a record stream does not match its declaration
    FormatMismatch(String),
    /// Underlying I/O error
    Io(String),
}

impl fmt::Display for VideoError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VideoError::MalformedUri(msg) => write!(f, "Malformed video URI: {}", msg),
            VideoError::ParamConversion {
                key,
                value,
                expected,
            } => write!(
                f,
                "Parameter '{}' value '{}' does not convert to {}",
                key, value, expected
            ),
            VideoError::UnsupportedScheme(scheme) => {
                write!(f, "No video backend for scheme '{}'", scheme)
            }
            VideoError::UnknownFormat(token) => {
                write!(f, "Unknown pixel format '{}'", token)
            }
            VideoError::Open(msg) => write!(f, "Failed to open video: {}", msg),
            VideoError::NotOpen => write!(f, "Video not open"),
            VideoError::OutOfRange { index, len } => {
                write!(f, "Stream index {} out of range ({} streams)", index, len)
            }
            VideoError::FormatMismatch(msg) => write!(f, "Frame format mismatch: {}", msg),
            VideoError::Io(msg) => write!(f, "I/O error: {}", msg),
        }
    }
}

impl std::error::Error for VideoError {}

impl From<std::io::Error> for VideoError {
    fn from(err: std::io::Error) -> Self {
        VideoError::Io(err.to_string())
    }
}
