// SPDX-License-Identifier: GPL-3.0-only

//! Integration tests for record backends and capture/record round trips

use videoio::{VideoError, VideoInput, VideoOutput, open_record};

#[test]
fn test_rawvideo_sink_source_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("run.rv");
    let uri = format!("file://{}", path.display());

    let frames: Vec<Vec<u8>> = (0..3u8)
        .map(|n| (0..8u8).map(|i| n * 10 + i).collect())
        .collect();

    {
        let mut sink = VideoOutput::from_uri(&uri).unwrap();
        let stream = sink.add_stream(4, 2, "GRAY8").unwrap();
        assert_eq!(stream, 0);
        assert_eq!(sink.stream_count(), 1);
        for (n, frame) in frames.iter().enumerate() {
            sink.stream(stream)
                .unwrap()
                .write_image(frame, 4, 2, "GRAY8", Some(n as f64 * 0.1))
                .unwrap();
        }
        // Dropping the sink flushes the container
    }

    let mut video = VideoInput::from_uri(&uri).unwrap();
    assert_eq!(video.width().unwrap(), 4);
    assert_eq!(video.height().unwrap(), 2);
    assert_eq!(video.pix_format().unwrap().format, "GRAY8");
    assert_eq!(video.size_bytes().unwrap(), 8);

    video.start().unwrap();
    let mut frame = vec![0u8; 8];
    for expected in &frames {
        assert!(video.grab_next(&mut frame, true).unwrap());
        assert_eq!(&frame, expected);
    }
    // Past the last stored frame the grab reports a miss
    assert!(!video.grab_next(&mut frame, true).unwrap());
    video.stop().unwrap();
}

#[test]
fn test_rawvideo_streams_write_sibling_files() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("multi.rv");
    let uri = format!("file://{}", path.display());

    let mut sink = VideoOutput::from_uri(&uri).unwrap();
    assert_eq!(sink.add_stream(4, 2, "GRAY8").unwrap(), 0);
    assert_eq!(sink.add_stream(2, 2, "RGB24").unwrap(), 1);
    assert_eq!(sink.stream_count(), 2);

    sink.stream(0)
        .unwrap()
        .write_image(&[0u8; 8], 4, 2, "GRAY8", None)
        .unwrap();
    sink.stream(1)
        .unwrap()
        .write_image(&[0u8; 12], 2, 2, "RGB24", None)
        .unwrap();
    drop(sink);

    assert!(path.exists());
    assert!(dir.path().join("multi-1.rv").exists());
}

#[test]
fn test_stream_index_out_of_range() {
    let dir = tempfile::tempdir().unwrap();
    let uri = format!("file://{}", dir.path().join("r.rv").display());

    let mut sink = VideoOutput::from_uri(&uri).unwrap();
    assert!(matches!(
        sink.stream(0),
        Err(VideoError::OutOfRange { index: 0, len: 0 })
    ));
    sink.add_stream(4, 2, "GRAY8").unwrap();
    assert!(sink.stream(0).is_ok());
    assert!(matches!(
        sink.stream(5),
        Err(VideoError::OutOfRange { index: 5, len: 1 })
    ));
}

#[test]
fn test_write_shape_mismatch() {
    let dir = tempfile::tempdir().unwrap();
    let uri = format!("file://{}", dir.path().join("m.rv").display());

    let mut sink = VideoOutput::from_uri(&uri).unwrap();
    let stream = sink.add_stream(4, 2, "GRAY8").unwrap();

    // Wrong dimensions
    assert!(matches!(
        sink.stream(stream)
            .unwrap()
            .write_image(&[0u8; 8], 2, 4, "GRAY8", None),
        Err(VideoError::FormatMismatch(_))
    ));
    // Wrong pixel format
    assert!(matches!(
        sink.stream(stream)
            .unwrap()
            .write_image(&[0u8; 24], 4, 2, "RGB24", None),
        Err(VideoError::FormatMismatch(_))
    ));
    // Buffer shorter than one frame
    assert!(matches!(
        sink.stream(stream)
            .unwrap()
            .write_image(&[0u8; 4], 4, 2, "GRAY8", None),
        Err(VideoError::FormatMismatch(_))
    ));
    // Matching shape still writes
    sink.stream(stream)
        .unwrap()
        .write_image(&[0u8; 8], 4, 2, "GRAY8", None)
        .unwrap();
}

#[test]
fn test_derived_timestamps_follow_base_clock() {
    let dir = tempfile::tempdir().unwrap();
    let uri = format!("file://{}", dir.path().join("t.rv").display());

    let mut sink = VideoOutput::from_uri(&uri).unwrap();
    let stream = sink.add_stream(4, 2, "GRAY8").unwrap();
    let base = sink.stream(stream).unwrap().base_frame_time();
    // The base clock is wall time in seconds, captured at stream creation
    assert!(base > 1.0e9, "base {} is not epoch seconds", base);

    sink.stream(stream)
        .unwrap()
        .write_image(&[0u8; 8], 4, 2, "GRAY8", None)
        .unwrap();
}

#[test]
fn test_image_sink_writes_decodable_files() {
    let dir = tempfile::tempdir().unwrap();
    let pattern = dir.path().join("f%02d.png");
    let uri = format!("files://{}", pattern.display());

    let mut sink = VideoOutput::from_uri(&uri).unwrap();
    let stream = sink.add_stream(2, 2, "RGB24").unwrap();

    let pixels: Vec<u8> = vec![
        255, 0, 0, 0, 255, 0, //
        0, 0, 255, 255, 255, 255,
    ];
    sink.stream(stream)
        .unwrap()
        .write_image(&pixels, 2, 2, "RGB24", None)
        .unwrap();
    sink.stream(stream)
        .unwrap()
        .write_image(&pixels, 2, 2, "RGB24", None)
        .unwrap();

    let first = dir.path().join("f00.png");
    let second = dir.path().join("f01.png");
    assert!(first.exists());
    assert!(second.exists());

    let decoded = image::open(&first).unwrap().to_rgb8();
    assert_eq!(decoded.dimensions(), (2, 2));
    assert_eq!(decoded.into_raw(), pixels);
}

#[test]
fn test_image_sink_requires_pattern() {
    assert!(matches!(
        open_record("files:///tmp/frame.png"),
        Err(VideoError::Open(_))
    ));
}

#[test]
fn test_record_facade_not_open() {
    let mut sink = VideoOutput::new();
    assert!(!sink.is_open());
    assert_eq!(sink.stream_count(), 0);
    assert!(matches!(
        sink.add_stream(4, 2, "GRAY8"),
        Err(VideoError::NotOpen)
    ));
    assert!(matches!(sink.reset(), Err(VideoError::NotOpen)));
}

#[test]
fn test_capture_to_record_end_to_end() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("copied.rv");
    let out_uri = format!("file://{}", path.display());

    let mut video = VideoInput::from_uri("test:[size=16x8,fps=200,buffers=32]//").unwrap();
    let format = video.pix_format().unwrap();
    let mut sink = VideoOutput::from_uri(&out_uri).unwrap();
    let stream = sink
        .add_stream(video.width().unwrap(), video.height().unwrap(), format.format)
        .unwrap();

    video.start().unwrap();
    let mut frame = vec![0u8; video.size_bytes().unwrap()];
    let mut written = Vec::new();
    for _ in 0..5 {
        assert!(video.grab_next(&mut frame, true).unwrap());
        sink.stream(stream)
            .unwrap()
            .write_image(&frame, 16, 8, format.format, None)
            .unwrap();
        written.push(frame.clone());
    }
    video.stop().unwrap();
    drop(sink);

    let mut replay = VideoInput::from_uri(&out_uri).unwrap();
    assert_eq!(replay.pix_format().unwrap(), format);
    replay.start().unwrap();
    for expected in &written {
        assert!(replay.grab_next(&mut frame, true).unwrap());
        assert_eq!(&frame, expected);
    }
    assert!(!replay.grab_next(&mut frame, true).unwrap());
    replay.stop().unwrap();
}
