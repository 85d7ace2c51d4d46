// SPDX-License-Identifier: GPL-3.0-only

//! Integration tests for the pixel format registry

use videoio::formats::CANONICAL_TOKENS;
use videoio::{VideoError, pixel_format_from_token};

#[test]
fn test_lookup_is_deterministic() {
    for token in CANONICAL_TOKENS {
        let first = pixel_format_from_token(token).unwrap();
        let second = pixel_format_from_token(token).unwrap();
        assert_eq!(first, second, "lookup of {} not stable", token);
        assert_eq!(first.format, *token);
    }
}

#[test]
fn test_bpp_matches_channel_bits() {
    for token in CANONICAL_TOKENS {
        let fmt = pixel_format_from_token(token).unwrap();
        let bit_sum: u32 = fmt.channel_bits.iter().sum();
        assert_eq!(
            fmt.bpp,
            bit_sum.div_ceil(8),
            "bpp inconsistent for {}",
            token
        );
        assert!(fmt.channels >= 1 && fmt.channels <= 4);
        // Unused channels carry zero bits
        for &bits in &fmt.channel_bits[fmt.channels as usize..] {
            assert_eq!(bits, 0, "unused channel bits set for {}", token);
        }
    }
}

#[test]
fn test_common_formats() {
    let rgb = pixel_format_from_token("RGB24").unwrap();
    assert_eq!((rgb.channels, rgb.bpp, rgb.planar), (3, 3, false));

    let gray = pixel_format_from_token("GRAY8").unwrap();
    assert_eq!((gray.channels, gray.bpp, gray.planar), (1, 1, false));

    let yuyv = pixel_format_from_token("YUYV422").unwrap();
    assert_eq!((yuyv.bpp, yuyv.planar), (2, false));

    let i420 = pixel_format_from_token("YUV420P").unwrap();
    assert!(i420.planar);

    let bayer = pixel_format_from_token("RGGB8").unwrap();
    assert_eq!((bayer.channels, bayer.bpp), (1, 1));
}

#[test]
fn test_unknown_token_is_an_error() {
    assert!(matches!(
        pixel_format_from_token("YUV9000"),
        Err(VideoError::UnknownFormat(_))
    ));
    // Tokens are case-sensitive
    assert!(pixel_format_from_token("rgb24").is_err());
}
