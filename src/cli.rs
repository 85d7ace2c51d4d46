// SPDX-License-Identifier: GPL-3.0-only

//! CLI commands for video URI operations
//!
//! This module provides command-line functionality for:
//! - Probing a URI and printing the resolved properties
//! - Grabbing frames to image files
//! - Copying frames from a capture URI into a record URI

use chrono::Local;
use serde::Serialize;
use videoio::{Uri, VideoInput, VideoOutput};

#[derive(Serialize)]
struct UriInfo {
    scheme: String,
    resource: String,
    width: u32,
    height: u32,
    size_bytes: usize,
    format: videoio::VideoPixelFormat,
}

/// Open a URI and print the resolved capture properties
pub fn info(uri: &str, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let parsed = Uri::parse(uri)?;
    let video = VideoInput::from_uri(uri)?;

    let info = UriInfo {
        scheme: parsed.scheme.clone(),
        resource: parsed.url.clone(),
        width: video.width()?,
        height: video.height()?,
        size_bytes: video.size_bytes()?,
        format: video.pix_format()?,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&info)?);
    } else {
        println!("scheme:     {}", info.scheme);
        println!("resource:   {}", info.resource);
        if !parsed.params.is_empty() {
            let params: Vec<String> = parsed
                .params
                .iter()
                .map(|(k, v)| format!("{}={}", k, v))
                .collect();
            println!("params:     {}", params.join(", "));
        }
        println!("size:       {}x{}", info.width, info.height);
        println!("format:     {}", info.format);
        println!("frame:      {} bytes", info.size_bytes);
    }
    Ok(())
}

/// Grab frames from a capture URI and save them as numbered images
pub fn grab(uri: &str, frames: usize, output: Option<String>) -> Result<(), Box<dyn std::error::Error>> {
    let pattern = output.unwrap_or_else(|| {
        format!("videoio_{}_%04d.png", Local::now().format("%Y%m%d_%H%M%S"))
    });

    let mut video = VideoInput::from_uri(uri)?;
    let format = video.pix_format()?;
    if !matches!(format.format, "RGB24" | "RGBA" | "GRAY8") {
        return Err(format!(
            "cannot save {} frames as images; wrap the source in \
             format-converter:[fmt=RGB24]//{}",
            format, uri
        )
        .into());
    }

    let mut sink = VideoOutput::from_uri(&format!("files://{}", pattern))?;
    let stream = sink.add_stream(video.width()?, video.height()?, format.format)?;

    video.start()?;
    let mut frame = vec![0u8; video.size_bytes()?];
    let mut grabbed = 0usize;
    while grabbed < frames && video.grab_next(&mut frame, true)? {
        sink.stream(stream)?.write_image(
            &frame,
            video.width()?,
            video.height()?,
            format.format,
            None,
        )?;
        grabbed += 1;
    }
    video.stop()?;

    println!("{} frame(s) saved to {}", grabbed, pattern);
    Ok(())
}

/// Copy frames from a capture URI into a record URI
pub fn copy(input: &str, output: &str, frames: usize) -> Result<(), Box<dyn std::error::Error>> {
    let mut video = VideoInput::from_uri(input)?;
    let format = video.pix_format()?;

    let mut sink = VideoOutput::from_uri(output)?;
    let stream = sink.add_stream(video.width()?, video.height()?, format.format)?;

    video.start()?;
    let mut frame = vec![0u8; video.size_bytes()?];
    let mut copied = 0usize;
    while (frames == 0 || copied < frames) && video.grab_next(&mut frame, true)? {
        sink.stream(stream)?.write_image(
            &frame,
            video.width()?,
            video.height()?,
            format.format,
            None,
        )?;
        copied += 1;
    }
    video.stop()?;

    println!("{} frame(s) copied to {}", copied, output);
    Ok(())
}
