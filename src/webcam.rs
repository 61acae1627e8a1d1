// thin wrapper around openpnp_capture
use std::time::{Duration, Instant};

use image::{ImageBuffer, RgbImage};
use openpnp_capture::{Device, Format, Stream};
use tracing::{info, warn};

use crate::error::{CaptureError, StartupError};

/// One captured image. Owned by a single loop iteration.
#[derive(Debug, Clone)]
pub struct Frame {
    pub image: RgbImage,
    pub captured_at: Instant,
}

impl Frame {
    pub fn new(image: RgbImage) -> Self {
        Self {
            image,
            captured_at: Instant::now(),
        }
    }
}

/// Successive frames from a live device. `None` means end-of-stream.
pub trait FrameSource {
    fn next_frame(&mut self) -> Option<Frame>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CameraSettings {
    pub index: u32,
    pub width: u32,
    pub height: u32,
    pub fps: u32,
    /// Flip horizontally so the preview behaves like a mirror.
    pub mirror: bool,
    /// How long a read may wait for the next frame before the stream is
    /// considered lost.
    pub frame_timeout: Duration,
}

impl Default for CameraSettings {
    fn default() -> Self {
        Self {
            index: 0,
            width: 640,
            height: 480,
            fps: 30,
            mirror: false,
            frame_timeout: Duration::from_secs(5),
        }
    }
}

pub struct Webcam {
    stream: Stream,
    width: u32,
    height: u32,
    mirror: bool,
    frame_timeout: Duration,
    buffer: Vec<u8>,
}

impl Webcam {
    pub fn open(settings: &CameraSettings) -> Result<Self, StartupError> {
        let open_error = |message: &str| StartupError::CameraOpen {
            index: settings.index,
            message: message.to_string(),
        };

        let devices = Device::enumerate();
        info!("There are {} available cameras.", devices.len());

        let id = devices
            .get(settings.index as usize)
            .copied()
            .ok_or_else(|| open_error("no such device"))?;
        let device = Device::new(id).ok_or_else(|| open_error("device could not be opened"))?;

        let requested = Format::default()
            .width(settings.width)
            .height(settings.height)
            .fps(settings.fps);
        let stream =
            Stream::new(&device, &requested).ok_or_else(|| open_error("stream could not be started"))?;

        let format = stream.format();
        let (width, height) = (format.width, format.height);
        if width == 0 || height == 0 {
            return Err(open_error("device reported an empty frame format"));
        }

        info!(
            "Opened camera {} at {}x{} (requested {}x{}@{})",
            settings.index, width, height, settings.width, settings.height, settings.fps
        );

        Ok(Self {
            stream,
            width,
            height,
            mirror: settings.mirror,
            frame_timeout: settings.frame_timeout,
            buffer: Vec::new(),
        })
    }

    fn read(&mut self) -> Result<RgbImage, CaptureError> {
        wait_for_frame(|| self.stream.poll(), self.frame_timeout, POLL_INTERVAL)?;
        if self.stream.read(&mut self.buffer).is_err() {
            return Err(CaptureError::Read);
        }

        rgb_from_buffer(self.width, self.height, std::mem::take(&mut self.buffer))
    }
}

impl FrameSource for Webcam {
    fn next_frame(&mut self) -> Option<Frame> {
        match self.read() {
            Ok(mut image) => {
                if self.mirror {
                    image::imageops::flip_horizontal_in_place(&mut image);
                }
                Some(Frame::new(image))
            }
            Err(e) => {
                warn!("Camera stream ended: {}", e);
                None
            }
        }
    }
}

impl Drop for Webcam {
    fn drop(&mut self) {
        info!("Camera released.");
    }
}

const POLL_INTERVAL: Duration = Duration::from_millis(2);

/// Calls `poll` until it reports a new frame. Gives up with
/// [`CaptureError::Stalled`] once `timeout` has passed without one, so an
/// unplugged device ends the stream instead of hanging the loop.
pub fn wait_for_frame(
    mut poll: impl FnMut() -> bool,
    timeout: Duration,
    interval: Duration,
) -> Result<(), CaptureError> {
    let deadline = Instant::now() + timeout;
    loop {
        if poll() {
            return Ok(());
        }
        if Instant::now() >= deadline {
            return Err(CaptureError::Stalled(timeout));
        }
        std::thread::sleep(interval);
    }
}

/// Wraps an RGB24 buffer, checking it matches the stream format.
pub fn rgb_from_buffer(width: u32, height: u32, data: Vec<u8>) -> Result<RgbImage, CaptureError> {
    let expected = width as usize * height as usize * 3;
    let actual = data.len();
    ImageBuffer::from_vec(width, height, data)
        .filter(|_| actual == expected)
        .ok_or(CaptureError::BufferSize { expected, actual })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_buffer_of_right_size() {
        let image = rgb_from_buffer(4, 2, vec![7u8; 4 * 2 * 3]).unwrap();
        assert_eq!(image.dimensions(), (4, 2));
        assert_eq!(image.get_pixel(3, 1).0, [7, 7, 7]);
    }

    #[test]
    fn test_short_buffer_is_rejected() {
        assert!(matches!(
            rgb_from_buffer(4, 2, vec![0u8; 10]),
            Err(CaptureError::BufferSize {
                expected: 24,
                actual: 10
            })
        ));
    }

    #[test]
    fn test_long_buffer_is_rejected() {
        assert!(rgb_from_buffer(4, 2, vec![0u8; 30]).is_err());
    }

    #[test]
    fn test_dead_device_stalls_out() {
        let timeout = Duration::from_millis(30);
        let mut polls = 0;
        let start = Instant::now();

        let result = wait_for_frame(
            || {
                polls += 1;
                false
            },
            timeout,
            Duration::from_millis(1),
        );

        assert!(matches!(result, Err(CaptureError::Stalled(t)) if t == timeout));
        assert!(start.elapsed() >= timeout);
        assert!(polls > 1);
    }

    #[test]
    fn test_frame_arrives_before_deadline() {
        let mut polls = 0;
        let result = wait_for_frame(
            || {
                polls += 1;
                polls == 3
            },
            Duration::from_secs(5),
            Duration::from_millis(1),
        );

        assert!(result.is_ok());
        assert_eq!(polls, 3);
    }

    #[test]
    fn test_ready_frame_needs_no_wait() {
        assert!(wait_for_frame(|| true, Duration::ZERO, Duration::from_secs(60)).is_ok());
    }
}
