// SPDX-License-Identifier: GPL-3.0-only

//! Integration tests for capture backends and the resolver

use std::time::{Duration, Instant};
use videoio::backends::test_pattern::TestPatternCapture;
use videoio::{VideoError, VideoInput, open_capture};

#[test]
fn test_grab_next_preserves_order() {
    let mut video = VideoInput::from_uri("test:[size=64x48,fps=100,buffers=512]//").unwrap();
    video.start().unwrap();

    let mut frame = vec![0u8; video.size_bytes().unwrap()];
    assert!(video.grab_next(&mut frame, true).unwrap());
    let mut last = TestPatternCapture::frame_sequence(&frame);

    for _ in 0..10 {
        assert!(video.grab_next(&mut frame, true).unwrap());
        let seq = TestPatternCapture::frame_sequence(&frame);
        assert_eq!(seq, last + 1, "grab_next skipped a frame");
        last = seq;
    }
    video.stop().unwrap();
}

#[test]
fn test_grab_newest_discards_backlog() {
    let mut video = VideoInput::from_uri("test:[size=64x48,fps=500,buffers=4]//").unwrap();
    video.start().unwrap();

    let mut frame = vec![0u8; video.size_bytes().unwrap()];
    assert!(video.grab_next(&mut frame, true).unwrap());
    let first = TestPatternCapture::frame_sequence(&frame);

    // Let the producer run well past the queue depth
    std::thread::sleep(Duration::from_millis(100));

    assert!(video.grab_newest(&mut frame, true).unwrap());
    let newest = TestPatternCapture::frame_sequence(&frame);
    assert!(
        newest > first + 4,
        "grab_newest returned a stale frame ({} after {})",
        newest,
        first
    );

    // The next ordered grab is strictly fresher than the newest one
    assert!(video.grab_next(&mut frame, true).unwrap());
    let after = TestPatternCapture::frame_sequence(&frame);
    assert!(after > newest);
    video.stop().unwrap();
}

#[test]
fn test_nonblocking_grab_returns_immediately() {
    // fps=0 produces no frames at all
    let mut video = VideoInput::from_uri("test:[size=32x32,fps=0]//").unwrap();
    video.start().unwrap();

    let mut frame = vec![0u8; video.size_bytes().unwrap()];
    let begin = Instant::now();
    assert!(!video.grab_next(&mut frame, false).unwrap());
    assert!(!video.grab_newest(&mut frame, false).unwrap());
    assert!(begin.elapsed() < Duration::from_millis(200));
    video.stop().unwrap();
}

#[test]
fn test_blocking_grab_unblocks_on_stop() {
    let mut video = VideoInput::from_uri("test:[size=32x32,fps=0]//").unwrap();
    video.start().unwrap();

    let flag = video.stop_flag().unwrap();
    let stopper = std::thread::spawn(move || {
        std::thread::sleep(Duration::from_millis(100));
        flag.set();
    });

    let mut frame = vec![0u8; video.size_bytes().unwrap()];
    let begin = Instant::now();
    let grabbed = video.grab_next(&mut frame, true).unwrap();
    assert!(!grabbed);
    assert!(
        begin.elapsed() < Duration::from_secs(2),
        "blocking grab did not unblock after stop"
    );
    stopper.join().unwrap();
    video.stop().unwrap();
}

#[test]
fn test_grab_before_start_and_after_stop() {
    let mut video = VideoInput::from_uri("test:[size=32x32,fps=100]//").unwrap();
    let mut frame = vec![0u8; video.size_bytes().unwrap()];

    // Not started yet
    assert!(!video.grab_next(&mut frame, false).unwrap());

    video.start().unwrap();
    assert!(video.grab_next(&mut frame, true).unwrap());
    video.stop().unwrap();

    // Stopped again
    assert!(!video.grab_next(&mut frame, false).unwrap());

    // Start and stop are idempotent
    video.start().unwrap();
    video.start().unwrap();
    assert!(video.grab_next(&mut frame, true).unwrap());
    video.stop().unwrap();
    video.stop().unwrap();
}

#[test]
fn test_facade_not_open_errors() {
    let mut video = VideoInput::new();
    assert!(!video.is_open());
    assert!(matches!(video.width(), Err(VideoError::NotOpen)));
    assert!(matches!(video.start(), Err(VideoError::NotOpen)));
    assert!(matches!(video.reset(), Err(VideoError::NotOpen)));
    let mut buf = [0u8; 16];
    assert!(matches!(
        video.grab_next(&mut buf, false),
        Err(VideoError::NotOpen)
    ));
}

#[test]
fn test_facade_reset_reopens_last_uri() {
    let mut video = VideoInput::from_uri("test:[size=48x32,fps=100]//").unwrap();
    video.start().unwrap();
    let mut frame = vec![0u8; video.size_bytes().unwrap()];
    assert!(video.grab_next(&mut frame, true).unwrap());

    video.reset().unwrap();
    assert_eq!(video.width().unwrap(), 48);
    assert_eq!(video.height().unwrap(), 32);

    // A reset backend starts from Idle
    assert!(!video.grab_next(&mut frame, false).unwrap());
    video.start().unwrap();
    assert!(video.grab_next(&mut frame, true).unwrap());
    video.stop().unwrap();
}

#[test]
fn test_unsupported_scheme() {
    assert!(matches!(
        open_capture("tachyon-link:///dev/warp0"),
        Err(VideoError::UnsupportedScheme(_))
    ));
}

#[test]
fn test_reserved_schemes_report_open_error() {
    for uri in [
        "firewire:[fmt=RGB24,size=640x480,fps=30,iso=400,dma=10]//0",
        "depth-stream:[img1=rgb,img2=depth]//",
    ] {
        match open_capture(uri) {
            Err(VideoError::Open(detail)) => {
                assert!(!detail.is_empty(), "open error for '{}' has no detail", uri)
            }
            other => panic!("expected open error for '{}', got {:?}", uri, other.err()),
        }
    }
}

#[test]
fn test_converter_wraps_inner_backend() {
    let mut video =
        VideoInput::from_uri("format-converter:[fmt=GRAY8]//test:[size=64x48,fps=100]//")
            .unwrap();
    assert_eq!(video.width().unwrap(), 64);
    assert_eq!(video.height().unwrap(), 48);
    assert_eq!(video.pix_format().unwrap().format, "GRAY8");
    assert_eq!(video.size_bytes().unwrap(), 64 * 48);

    video.start().unwrap();
    let mut frame = vec![0u8; video.size_bytes().unwrap()];
    assert!(video.grab_next(&mut frame, true).unwrap());
    video.stop().unwrap();
}

#[test]
fn test_converter_rejects_unsupported_pair() {
    assert!(matches!(
        open_capture("format-converter:[fmt=NV12]//test:[size=64x48]//"),
        Err(VideoError::Open(_))
    ));
}

#[test]
fn test_converter_depth_is_bounded() {
    let mut uri = "test:[size=32x32]//".to_string();
    for _ in 0..8 {
        uri = format!("format-converter:[fmt=RGB24]//{}", uri);
    }
    assert!(matches!(open_capture(&uri), Err(VideoError::Open(_))));
}

#[test]
fn test_undersized_buffer_is_a_miss_not_a_fault() {
    let mut video = VideoInput::from_uri("test:[size=64x48,fps=100]//").unwrap();
    video.start().unwrap();
    let mut tiny = vec![0u8; 4];
    assert!(!video.grab_next(&mut tiny, true).unwrap());
    video.stop().unwrap();
}
