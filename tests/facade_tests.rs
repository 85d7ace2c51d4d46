// SPDX-License-Identifier: GPL-3.0-only

//! Facade ownership tests
//!
//! Kept in their own test binary so the test backend's live-instance
//! counter is not disturbed by other tests running in parallel threads.

use videoio::VideoInput;
use videoio::backends::test_pattern::TestPatternCapture;

#[test]
fn test_open_replaces_backend_without_leaking() {
    assert_eq!(TestPatternCapture::live_instances(), 0);

    let mut video = VideoInput::from_uri("test:[size=32x32,fps=100]//").unwrap();
    assert_eq!(TestPatternCapture::live_instances(), 1);

    // Re-open while running: the first backend must be destroyed, so the
    // live count after the second open equals the count after a single one
    video.start().unwrap();
    video.open("test:[size=64x64,fps=100]//").unwrap();
    assert_eq!(TestPatternCapture::live_instances(), 1);
    assert_eq!(video.width().unwrap(), 64);

    // A converter owns its inner backend; both go away with the facade
    video
        .open("format-converter:[fmt=GRAY8]//test:[size=32x32,fps=100]//")
        .unwrap();
    assert_eq!(TestPatternCapture::live_instances(), 1);

    drop(video);
    assert_eq!(TestPatternCapture::live_instances(), 0);
}

#[test]
fn test_failed_open_leaves_facade_closed() {
    let mut video = VideoInput::new();
    assert!(video.open("tachyon-link://nowhere").is_err());
    assert!(!video.is_open());
    assert!(video.width().is_err());
}
