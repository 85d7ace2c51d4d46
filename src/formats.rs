// SPDX-License-Identifier: GPL-3.0-only

//! Pixel format registry
//!
//! Maps textual pixel-format tokens to structured descriptions. Lookup is
//! pure: the same token always yields the same structure, independent of any
//! backend instance.

use crate::errors::{VideoError, VideoResult};
use serde::Serialize;

/// Structured description of a pixel format
///
/// `channel_bits` stores the average number of bits per output pixel for
/// each channel, with chroma subsampling folded in (so YUYV422 is
/// `[8, 4, 4, 0]`, not `[8, 8, 8, 0]`). Unused channels are 0. `bpp` is the
/// per-pixel byte count, the channel bit sum rounded up to whole bytes;
/// subsampled planar layouts round up, so their exact buffer sizes are
/// backend-specific.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct VideoPixelFormat {
    /// Canonical format token
    pub format: &'static str,
    /// Number of channels (1-4)
    pub channels: u32,
    /// Average bits per pixel for each channel, unused channels are 0
    pub channel_bits: [u32; 4],
    /// Bytes per pixel, derived from the channel bit sum
    pub bpp: u32,
    /// Planar (separate channel blocks) vs packed (interleaved) layout
    pub planar: bool,
}

impl VideoPixelFormat {
    /// Byte size of one tightly packed `width` x `height` image in this format
    ///
    /// Exact for packed formats; an upper bound for subsampled planar ones
    /// (see the `bpp` rounding note on the struct).
    pub fn image_size_bytes(&self, width: u32, height: u32) -> usize {
        width as usize * height as usize * self.bpp as usize
    }
}

impl std::fmt::Display for VideoPixelFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.format)
    }
}

const fn packed(
    format: &'static str,
    channels: u32,
    channel_bits: [u32; 4],
    bpp: u32,
) -> VideoPixelFormat {
    VideoPixelFormat {
        format,
        channels,
        channel_bits,
        bpp,
        planar: false,
    }
}

const fn planar(
    format: &'static str,
    channels: u32,
    channel_bits: [u32; 4],
    bpp: u32,
) -> VideoPixelFormat {
    VideoPixelFormat {
        format,
        channels,
        channel_bits,
        bpp,
        planar: true,
    }
}

/// Look up a pixel format by token
///
/// Unrecognized tokens fail with [`VideoError::UnknownFormat`]. A small set
/// of aliases (`GREY`, `Y8`, `GRAY16`) resolves to canonical entries; the
/// `format` field of the result always holds the canonical token.
pub fn pixel_format_from_token(token: &str) -> VideoResult<VideoPixelFormat> {
    let fmt = match token {
        "GRAY8" | "GREY" | "Y8" => packed("GRAY8", 1, [8, 0, 0, 0], 1),
        "GRAY16LE" | "GRAY16" => packed("GRAY16LE", 1, [16, 0, 0, 0], 2),
        "RGB24" => packed("RGB24", 3, [8, 8, 8, 0], 3),
        "BGR24" => packed("BGR24", 3, [8, 8, 8, 0], 3),
        "RGB48LE" => packed("RGB48LE", 3, [16, 16, 16, 0], 6),
        "RGBA" => packed("RGBA", 4, [8, 8, 8, 8], 4),
        "BGRA" => packed("BGRA", 4, [8, 8, 8, 8], 4),
        "ARGB" => packed("ARGB", 4, [8, 8, 8, 8], 4),
        "ABGR" => packed("ABGR", 4, [8, 8, 8, 8], 4),
        "YUYV422" => packed("YUYV422", 3, [8, 4, 4, 0], 2),
        "UYVY422" => packed("UYVY422", 3, [8, 4, 4, 0], 2),
        "YUV420P" => planar("YUV420P", 3, [8, 2, 2, 0], 2),
        "YUV422P" => planar("YUV422P", 3, [8, 4, 4, 0], 2),
        "YUV444P" => planar("YUV444P", 3, [8, 8, 8, 0], 3),
        "NV12" => planar("NV12", 3, [8, 2, 2, 0], 2),
        "NV21" => planar("NV21", 3, [8, 2, 2, 0], 2),
        "RGGB8" => packed("RGGB8", 1, [8, 0, 0, 0], 1),
        "BGGR8" => packed("BGGR8", 1, [8, 0, 0, 0], 1),
        "GRBG8" => packed("GRBG8", 1, [8, 0, 0, 0], 1),
        "GBRG8" => packed("GBRG8", 1, [8, 0, 0, 0], 1),
        _ => return Err(VideoError::UnknownFormat(token.to_string())),
    };
    Ok(fmt)
}

/// All canonical tokens in the registry, in lookup-table order
///
/// Used by the registry invariant tests and by `videoio info` diagnostics.
pub const CANONICAL_TOKENS: &[&str] = &[
    "GRAY8", "GRAY16LE", "RGB24", "BGR24", "RGB48LE", "RGBA", "BGRA", "ARGB", "ABGR", "YUYV422",
    "UYVY422", "YUV420P", "YUV422P", "YUV444P", "NV12", "NV21", "RGGB8", "BGGR8", "GRBG8", "GBRG8",
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aliases_resolve_to_canonical() {
        assert_eq!(pixel_format_from_token("GREY").unwrap().format, "GRAY8");
        assert_eq!(pixel_format_from_token("Y8").unwrap().format, "GRAY8");
        assert_eq!(
            pixel_format_from_token("GRAY16").unwrap().format,
            "GRAY16LE"
        );
    }

    #[test]
    fn test_unknown_token() {
        assert!(matches!(
            pixel_format_from_token("FLOAT128"),
            Err(VideoError::UnknownFormat(_))
        ));
    }

    #[test]
    fn test_image_size_bytes() {
        let rgb = pixel_format_from_token("RGB24").unwrap();
        assert_eq!(rgb.image_size_bytes(640, 480), 640 * 480 * 3);
        let yuyv = pixel_format_from_token("YUYV422").unwrap();
        assert_eq!(yuyv.image_size_bytes(640, 480), 640 * 480 * 2);
    }
}
