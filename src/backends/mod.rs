// SPDX-License-Identifier: GPL-3.0-only

//! Backend resolution: URI scheme to concrete capture/record instance
//!
//! The resolver is the single extension point of the crate — supporting a
//! new device family means adding one scheme arm here, never touching the
//! interfaces or the facades. Composing backends (the format converter)
//! re-enter the resolver with their nested resource URI; that recursion is
//! depth-bounded so cyclic or adversarial URIs are rejected instead of
//! recursing away.

pub(crate) mod capture_loop;
mod converters;
pub(crate) mod rawvideo;

pub mod convert;
pub mod image_files;
pub mod image_sink;
pub mod mjpeg;
pub mod raw_file;
pub mod raw_sink;
pub mod test_pattern;
#[cfg(target_os = "linux")]
pub mod usb_video;

use crate::capture::VideoCapture;
use crate::errors::{VideoError, VideoResult};
use crate::record::VideoRecord;
use crate::uri::Uri;
use tracing::debug;

/// Maximum nesting depth for composing-backend URIs
pub const MAX_NESTED_URI_DEPTH: usize = 4;

/// Resolve a capture URI to a running-ready backend instance
///
/// Parses the URI, switches on the scheme and constructs the matching
/// backend. Construction faults propagate immediately; nothing is retried
/// here. The caller owns the returned backend exclusively.
pub fn open_capture(uri: &str) -> VideoResult<Box<dyn VideoCapture>> {
    open_capture_at(uri, 0)
}

fn open_capture_at(text: &str, depth: usize) -> VideoResult<Box<dyn VideoCapture>> {
    if depth >= MAX_NESTED_URI_DEPTH {
        return Err(VideoError::Open(format!(
            "nested video URI exceeds depth {} at '{}'",
            MAX_NESTED_URI_DEPTH, text
        )));
    }
    let uri = Uri::parse(text)?;
    debug!(scheme = %uri.scheme, url = %uri.url, depth, "resolving capture URI");

    match uri.scheme.as_str() {
        "test" => Ok(Box::new(test_pattern::TestPatternCapture::open(&uri)?)),
        "file" => Ok(Box::new(raw_file::RawFileCapture::open(&uri)?)),
        "files" => Ok(Box::new(image_files::ImageFilesCapture::open(&uri)?)),
        "format-converter" => {
            let inner = open_capture_at(&uri.url, depth + 1)?;
            Ok(Box::new(convert::ConvertCapture::open(&uri, inner)?))
        }
        "motion-jpeg-network" => Ok(Box::new(mjpeg::MjpegCapture::open(&uri)?)),
        "usb-video" => {
            #[cfg(target_os = "linux")]
            {
                Ok(Box::new(usb_video::UsbVideoCapture::open(&uri)?))
            }
            #[cfg(not(target_os = "linux"))]
            {
                Err(VideoError::Open(
                    "usb-video capture requires Linux V4L2 support".into(),
                ))
            }
        }
        // Reserved schemes for SDK-bound device families; the scheme slot
        // and parameter conventions are fixed even where the driver
        // bindings are not part of this build
        "firewire" => Err(VideoError::Open(
            "firewire capture support is not compiled into this build".into(),
        )),
        "depth-stream" => Err(VideoError::Open(
            "depth-stream capture support is not compiled into this build".into(),
        )),
        other => Err(VideoError::UnsupportedScheme(other.to_string())),
    }
}

/// Resolve a record URI to a sink backend instance
pub fn open_record(text: &str) -> VideoResult<Box<dyn VideoRecord>> {
    let uri = Uri::parse(text)?;
    debug!(scheme = %uri.scheme, url = %uri.url, "resolving record URI");

    match uri.scheme.as_str() {
        "file" => Ok(Box::new(raw_sink::RawVideoOutput::open(&uri)?)),
        "files" => Ok(Box::new(image_sink::ImageFilesOutput::open(&uri)?)),
        other => Err(VideoError::UnsupportedScheme(other.to_string())),
    }
}

/// Sibling path for record stream `index`: stream 0 keeps the path, later
/// streams get `-<index>` inserted before the extension
pub(crate) fn stream_sibling_path(path: &str, index: usize) -> String {
    if index == 0 {
        return path.to_string();
    }
    let p = std::path::Path::new(path);
    match (
        p.file_stem().and_then(|s| s.to_str()),
        p.extension().and_then(|e| e.to_str()),
    ) {
        (Some(stem), Some(ext)) => p
            .with_file_name(format!("{}-{}.{}", stem, index, ext))
            .to_string_lossy()
            .into_owned(),
        _ => format!("{}-{}", path, index),
    }
}

/// Expand one `%d` / `%0Nd` field in a sequence pattern
///
/// Returns `None` when the pattern has no such field. Shared by the `files`
/// source and sink so both sides agree on the naming.
pub(crate) fn expand_pattern(pattern: &str, index: u64) -> Option<String> {
    let percent = pattern.find('%')?;
    let rest = &pattern[percent + 1..];
    let digits_end = rest.find('d')?;
    let spec = &rest[..digits_end];

    let width: usize = if spec.is_empty() {
        0
    } else if let Some(padded) = spec.strip_prefix('0') {
        padded.parse().ok()?
    } else {
        return None;
    };

    Some(format!(
        "{}{:0>pad$}{}",
        &pattern[..percent],
        index,
        &rest[digits_end + 1..],
        pad = width
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expand_plain_field() {
        assert_eq!(
            expand_pattern("/seq/f%d.png", 7).as_deref(),
            Some("/seq/f7.png")
        );
    }

    #[test]
    fn test_expand_padded_field() {
        assert_eq!(
            expand_pattern("/seq/f%03d.jpg", 7).as_deref(),
            Some("/seq/f007.jpg")
        );
        assert_eq!(
            expand_pattern("/seq/f%03d.jpg", 1234).as_deref(),
            Some("/seq/f1234.jpg")
        );
    }

    #[test]
    fn test_expand_without_field() {
        assert_eq!(expand_pattern("/seq/frame.png", 7), None);
    }

    #[test]
    fn test_sibling_path() {
        assert_eq!(stream_sibling_path("/cap/run.rv", 0), "/cap/run.rv");
        assert_eq!(stream_sibling_path("/cap/run.rv", 2), "/cap/run-2.rv");
        assert_eq!(stream_sibling_path("/cap/run", 1), "/cap/run-1");
    }

    #[test]
    fn test_unknown_scheme() {
        assert!(matches!(
            open_capture("warp-drive://"),
            Err(VideoError::UnsupportedScheme(_))
        ));
        assert!(matches!(
            open_record("warp-drive://"),
            Err(VideoError::UnsupportedScheme(_))
        ));
    }

    #[test]
    fn test_nested_depth_bound() {
        let mut uri = "test://".to_string();
        for _ in 0..MAX_NESTED_URI_DEPTH {
            uri = format!("format-converter:[fmt=RGB24]//{}", uri);
        }
        assert!(matches!(open_capture(&uri), Err(VideoError::Open(_))));
    }
}
