// SPDX-License-Identifier: GPL-3.0-only

//! USB camera capture via V4L2 (`usb-video` scheme, Linux)
//!
//! Opens a Video4Linux capture device, negotiates a format and streams
//! memory-mapped buffers from a producer thread. The driver may adjust the
//! requested size or format; the negotiated values are what the queries
//! report.
//!
//! URI examples:
//!
//! ```text
//! usb-video:///dev/video0
//! usb-video:[size=1280x720,fmt=YUYV422]//0
//! ```

use super::capture_loop::{FrameQueue, frame_queue};
use crate::capture::{StopFlag, VideoCapture};
use crate::errors::{VideoError, VideoResult};
use crate::formats::{VideoPixelFormat, pixel_format_from_token};
use crate::uri::{Dims, Uri};
use std::path::PathBuf;
use std::thread::JoinHandle;
use tracing::{debug, info, warn};
use v4l::FourCC;
use v4l::buffer::Type;
use v4l::io::mmap::Stream as MmapStream;
use v4l::io::traits::CaptureStream;
use v4l::video::Capture;

/// Map a registry token to its V4L2 FourCC
fn fourcc_for_token(token: &str) -> Option<FourCC> {
    let code: &[u8; 4] = match token {
        "YUYV422" => b"YUYV",
        "UYVY422" => b"UYVY",
        "GRAY8" => b"GREY",
        "GRAY16LE" => b"Y16 ",
        "RGB24" => b"RGB3",
        "BGR24" => b"BGR3",
        "NV12" => b"NV12",
        "YUV420P" => b"YU12",
        "RGGB8" => b"RGGB",
        "BGGR8" => b"BA81",
        "GRBG8" => b"GRBG",
        "GBRG8" => b"GBRG",
        _ => return None,
    };
    Some(FourCC::new(code))
}

/// Map a negotiated FourCC back to a registry token
fn token_for_fourcc(fourcc: &FourCC) -> Option<&'static str> {
    match &fourcc.repr {
        b"YUYV" => Some("YUYV422"),
        b"UYVY" => Some("UYVY422"),
        b"GREY" => Some("GRAY8"),
        b"Y16 " => Some("GRAY16LE"),
        b"RGB3" => Some("RGB24"),
        b"BGR3" => Some("BGR24"),
        b"NV12" => Some("NV12"),
        b"YU12" => Some("YUV420P"),
        b"RGGB" => Some("RGGB8"),
        b"BA81" => Some("BGGR8"),
        b"GRBG" => Some("GRBG8"),
        b"GBRG" => Some("GBRG8"),
        _ => None,
    }
}

fn device_path(url: &str) -> VideoResult<PathBuf> {
    if url.is_empty() {
        return Err(VideoError::Open(
            "usb-video needs a device path or index".into(),
        ));
    }
    // A bare index addresses /dev/videoN, like the kernel device nodes
    if let Ok(index) = url.parse::<usize>() {
        return Ok(PathBuf::from(format!("/dev/video{}", index)));
    }
    Ok(PathBuf::from(url))
}

/// Open the device and apply the format negotiated at construction time
fn configure_device(
    path: &PathBuf,
    width: u32,
    height: u32,
    fourcc: FourCC,
) -> Result<v4l::Device, String> {
    let dev = v4l::Device::with_path(path)
        .map_err(|e| format!("cannot open '{}': {}", path.display(), e))?;
    let mut fmt = dev
        .format()
        .map_err(|e| format!("cannot query format: {}", e))?;
    fmt.width = width;
    fmt.height = height;
    fmt.fourcc = fourcc;
    dev.set_format(&fmt)
        .map_err(|e| format!("cannot set format: {}", e))?;
    Ok(dev)
}

/// V4L2 capture backend
pub struct UsbVideoCapture {
    path: PathBuf,
    width: u32,
    height: u32,
    format: VideoPixelFormat,
    frame_size: usize,
    buffers: usize,
    stop: StopFlag,
    queue: Option<FrameQueue>,
    producer: Option<JoinHandle<()>>,
}

impl UsbVideoCapture {
    /// Construct from a parsed `usb-video` URI
    ///
    /// The device is opened once here to negotiate the format, then
    /// reopened by the producer thread on `start`.
    pub fn open(uri: &Uri) -> VideoResult<Self> {
        let path = device_path(&uri.url)?;
        let dims = uri.get("size", Dims::new(640, 480))?;
        let token: String = uri.get("fmt", "YUYV422".to_string())?;
        let buffers: usize = uri.get("buffers", 4)?;
        pixel_format_from_token(&token)?;

        let fourcc = fourcc_for_token(&token).ok_or_else(|| {
            VideoError::Open(format!("no V4L2 mapping for pixel format {}", token))
        })?;

        let dev = configure_device(&path, dims.width, dims.height, fourcc)
            .map_err(VideoError::Open)?;
        let actual = dev
            .format()
            .map_err(|e| VideoError::Open(format!("cannot query format: {}", e)))?;

        let actual_token = token_for_fourcc(&actual.fourcc).ok_or_else(|| {
            VideoError::Open(format!(
                "device negotiated unsupported pixel format {}",
                actual.fourcc
            ))
        })?;
        let format = pixel_format_from_token(actual_token)?;
        let frame_size = if actual.size > 0 {
            actual.size as usize
        } else {
            format.image_size_bytes(actual.width, actual.height)
        };

        info!(
            path = %path.display(),
            width = actual.width,
            height = actual.height,
            format = %format,
            frame_size,
            "opened V4L2 device"
        );

        Ok(Self {
            path,
            width: actual.width,
            height: actual.height,
            format,
            frame_size,
            buffers,
            stop: StopFlag::new(),
            queue: None,
            producer: None,
        })
    }

    fn copy_frame(&mut self, image: &mut [u8], wait: bool, newest: bool) -> bool {
        let Some(queue) = &self.queue else {
            return false;
        };
        if image.len() < self.frame_size {
            warn!(
                have = image.len(),
                need = self.frame_size,
                "grab buffer too small"
            );
            return false;
        }
        let frame = if newest {
            queue.newest(wait, &self.stop)
        } else {
            queue.next(wait, &self.stop)
        };
        match frame {
            Some(frame) => {
                image[..frame.len()].copy_from_slice(&frame);
                true
            }
            None => false,
        }
    }
}

impl VideoCapture for UsbVideoCapture {
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn size_bytes(&self) -> usize {
        self.frame_size
    }

    fn pix_format(&self) -> VideoPixelFormat {
        self.format
    }

    fn start(&mut self) -> VideoResult<()> {
        if self.producer.is_some() {
            return Ok(());
        }
        self.stop.clear();

        let (tx, rx) = frame_queue(self.buffers);
        self.queue = Some(rx);

        // The memory-mapped stream borrows the device handle, so both live
        // on the producer thread's stack for the whole capture run.
        let path = self.path.clone();
        let width = self.width;
        let height = self.height;
        let fourcc =
            fourcc_for_token(self.format.format).expect("negotiated format has a FourCC mapping");
        let frame_size = self.frame_size;
        let buffers = self.buffers as u32;
        let stop = self.stop.clone();

        self.producer = Some(std::thread::spawn(move || {
            debug!(path = %path.display(), "V4L2 capture thread started");
            let dev = match configure_device(&path, width, height, fourcc) {
                Ok(dev) => dev,
                Err(e) => {
                    warn!(error = %e, "V4L2 capture init failed");
                    return;
                }
            };
            let mut stream = match MmapStream::with_buffers(&dev, Type::VideoCapture, buffers) {
                Ok(stream) => stream,
                Err(e) => {
                    warn!(error = %e, "cannot map V4L2 capture buffers");
                    return;
                }
            };

            while !stop.is_set() {
                match stream.next() {
                    Ok((buf, _meta)) => {
                        let n = buf.len().min(frame_size);
                        let mut frame = vec![0u8; frame_size];
                        frame[..n].copy_from_slice(&buf[..n]);
                        if !tx.push(frame) {
                            break;
                        }
                    }
                    Err(e) => {
                        warn!(error = %e, "V4L2 dequeue failed, stopping capture");
                        break;
                    }
                }
            }
            debug!(path = %path.display(), "V4L2 capture thread exiting");
        }));
        Ok(())
    }

    fn stop(&mut self) -> VideoResult<()> {
        self.stop.set();
        if let Some(handle) = self.producer.take() {
            if handle.join().is_err() {
                warn!("V4L2 capture thread panicked");
            }
        }
        self.queue = None;
        Ok(())
    }

    fn stop_flag(&self) -> StopFlag {
        self.stop.clone()
    }

    fn grab_next(&mut self, image: &mut [u8], wait: bool) -> bool {
        self.copy_frame(image, wait, false)
    }

    fn grab_newest(&mut self, image: &mut [u8], wait: bool) -> bool {
        self.copy_frame(image, wait, true)
    }
}

impl Drop for UsbVideoCapture {
    fn drop(&mut self) {
        let _ = self.stop();
    }
}
