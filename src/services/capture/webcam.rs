use std::path::PathBuf;
use std::time::{Duration, Instant};

use image::{codecs::jpeg::JpegEncoder, imageops, RgbImage};

use crate::{
    error::{AppError, AppResult},
    services::capture::ImagePayload,
};

pub const CAPTURE_WIDTH: u32 = 640;
pub const CAPTURE_HEIGHT: u32 = 480;
/// Snapshots closer together than this are dropped
pub const MIN_CAPTURE_INTERVAL: Duration = Duration::from_secs(3);
pub const JPEG_QUALITY: u8 = 80;
pub const WEBCAM_FILE_NAME: &str = "webcam-capture.jpg";

pub const CAMERA_ACCESS_MESSAGE: &str = "Failed to access webcam. Please allow permissions.";

/// Stream requested from the camera
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CameraConstraints {
    pub width: u32,
    pub height: u32,
    pub audio: bool,
}

impl Default for CameraConstraints {
    fn default() -> Self {
        Self {
            width: CAPTURE_WIDTH,
            height: CAPTURE_HEIGHT,
            audio: false,
        }
    }
}

/// Platform camera handle
pub trait CameraDevice: Send {
    /// Acquire the device; fails on denied permission or missing hardware
    fn open(&mut self, constraints: &CameraConstraints) -> AppResult<()>;

    /// Current frame as shown in the (mirrored) preview
    fn read_frame(&mut self) -> AppResult<RgbImage>;

    /// Stop all tracks and give the device back
    fn release(&mut self);
}

/// Exclusive owner of a camera while active
///
/// The device is released on [`WebcamCapture::stop`] or when the capture is
/// dropped.
pub struct WebcamCapture<D: CameraDevice> {
    device: D,
    constraints: CameraConstraints,
    active: bool,
    last_capture: Option<Instant>,
}

impl<D: CameraDevice> WebcamCapture<D> {
    pub fn new(device: D) -> Self {
        Self {
            device,
            constraints: CameraConstraints::default(),
            active: false,
            last_capture: None,
        }
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn start(&mut self) -> AppResult<()> {
        if self.active {
            return Ok(());
        }

        self.device.open(&self.constraints).map_err(|e| {
            tracing::warn!(error = %e, "Camera unavailable");
            AppError::Capture(CAMERA_ACCESS_MESSAGE.to_string())
        })?;
        self.active = true;

        tracing::info!(
            width = self.constraints.width,
            height = self.constraints.height,
            "Camera started"
        );
        Ok(())
    }

    pub fn stop(&mut self) {
        if self.active {
            self.device.release();
            self.active = false;
            tracing::info!("Camera stopped");
        }
    }

    /// Takes a snapshot, or `None` when inactive or inside the capture interval
    pub fn capture(&mut self) -> AppResult<Option<ImagePayload>> {
        self.capture_at(Instant::now())
    }

    pub fn capture_at(&mut self, now: Instant) -> AppResult<Option<ImagePayload>> {
        if !self.active {
            tracing::debug!("Capture requested while camera is stopped");
            return Ok(None);
        }

        if let Some(last) = self.last_capture {
            if now.saturating_duration_since(last) < MIN_CAPTURE_INTERVAL {
                tracing::debug!("Capture dropped, too soon after the previous one");
                return Ok(None);
            }
        }

        let frame = self.device.read_frame()?;
        self.last_capture = Some(now);
        encode_snapshot(&frame).map(Some)
    }
}

impl<D: CameraDevice> Drop for WebcamCapture<D> {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Mirrors the preview frame back and encodes it as JPEG
pub fn encode_snapshot(frame: &RgbImage) -> AppResult<ImagePayload> {
    let mirrored = imageops::flip_horizontal(frame);
    let mut bytes = Vec::new();
    JpegEncoder::new_with_quality(&mut bytes, JPEG_QUALITY).encode_image(&mirrored)?;

    Ok(ImagePayload::new(WEBCAM_FILE_NAME, "image/jpeg", bytes))
}

/// Camera stand-in that serves a still image from disk as every frame
///
/// Used for headless runs where no capture hardware is available.
pub struct StillImageDevice {
    path: PathBuf,
    frame: Option<RgbImage>,
}

impl StillImageDevice {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            frame: None,
        }
    }
}

impl CameraDevice for StillImageDevice {
    fn open(&mut self, constraints: &CameraConstraints) -> AppResult<()> {
        let frame = image::open(&self.path)?.to_rgb8();
        if frame.dimensions() != (constraints.width, constraints.height) {
            tracing::debug!(
                width = frame.width(),
                height = frame.height(),
                "Still frame does not match requested resolution"
            );
        }
        self.frame = Some(frame);
        Ok(())
    }

    fn read_frame(&mut self) -> AppResult<RgbImage> {
        self.frame
            .clone()
            .ok_or_else(|| AppError::Capture("Camera is not started".to_string()))
    }

    fn release(&mut self) {
        self.frame = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;
    use std::sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    };

    #[derive(Default, Clone)]
    struct FakeCamera {
        opens: Arc<AtomicUsize>,
        releases: Arc<AtomicUsize>,
        denied: bool,
        /// Number of upcoming frame reads that fail
        failing_reads: usize,
    }

    impl CameraDevice for FakeCamera {
        fn open(&mut self, constraints: &CameraConstraints) -> AppResult<()> {
            assert_eq!(*constraints, CameraConstraints::default());
            if self.denied {
                return Err(AppError::Capture("NotAllowedError".to_string()));
            }
            self.opens.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        fn read_frame(&mut self) -> AppResult<RgbImage> {
            if self.failing_reads > 0 {
                self.failing_reads -= 1;
                return Err(AppError::Capture("frame not ready".to_string()));
            }
            Ok(RgbImage::from_pixel(64, 48, Rgb([200, 200, 200])))
        }

        fn release(&mut self) {
            self.releases.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn test_constraints_request_vga_without_audio() {
        let constraints = CameraConstraints::default();
        assert_eq!((constraints.width, constraints.height), (640, 480));
        assert!(!constraints.audio);
    }

    #[test]
    fn test_capture_requires_started_camera() {
        let mut capture = WebcamCapture::new(FakeCamera::default());
        assert!(capture.capture().unwrap().is_none());
    }

    #[test]
    fn test_capture_interval_enforced() {
        let mut capture = WebcamCapture::new(FakeCamera::default());
        capture.start().unwrap();
        let t0 = Instant::now();

        let first = capture.capture_at(t0).unwrap().unwrap();
        assert_eq!(first.file_name(), WEBCAM_FILE_NAME);
        assert_eq!(first.content_type(), "image/jpeg");
        assert!(first.validate().is_ok());

        assert!(capture
            .capture_at(t0 + Duration::from_millis(2999))
            .unwrap()
            .is_none());
        assert!(capture
            .capture_at(t0 + Duration::from_secs(3))
            .unwrap()
            .is_some());
    }

    #[test]
    fn test_failed_frame_read_does_not_start_interval() {
        let camera = FakeCamera {
            failing_reads: 1,
            ..FakeCamera::default()
        };
        let mut capture = WebcamCapture::new(camera);
        capture.start().unwrap();
        let t0 = Instant::now();

        assert!(capture.capture_at(t0).is_err());
        assert!(capture
            .capture_at(t0 + Duration::from_millis(500))
            .unwrap()
            .is_some());
        assert!(capture
            .capture_at(t0 + Duration::from_millis(1000))
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_permission_denied_is_capture_error() {
        let camera = FakeCamera {
            denied: true,
            ..FakeCamera::default()
        };
        let mut capture = WebcamCapture::new(camera);

        let err = capture.start().unwrap_err();
        assert_eq!(err.to_string(), CAMERA_ACCESS_MESSAGE);
        assert!(!capture.is_active());
    }

    #[test]
    fn test_stop_releases_device_once() {
        let camera = FakeCamera::default();
        let releases = camera.releases.clone();
        let mut capture = WebcamCapture::new(camera);

        capture.start().unwrap();
        capture.stop();
        capture.stop();
        drop(capture);

        assert_eq!(releases.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_drop_releases_active_device() {
        let camera = FakeCamera::default();
        let opens = camera.opens.clone();
        let releases = camera.releases.clone();
        {
            let mut capture = WebcamCapture::new(camera);
            capture.start().unwrap();
            capture.start().unwrap();
        }
        assert_eq!(opens.load(Ordering::SeqCst), 1);
        assert_eq!(releases.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_snapshot_is_mirrored() {
        // Left half red, right half blue
        let frame = RgbImage::from_fn(64, 32, |x, _| {
            if x < 32 {
                Rgb([255, 0, 0])
            } else {
                Rgb([0, 0, 255])
            }
        });

        let payload = encode_snapshot(&frame).unwrap();
        let decoded = image::load_from_memory(payload.bytes()).unwrap().to_rgb8();

        assert_eq!(decoded.dimensions(), (64, 32));
        let left = decoded.get_pixel(8, 16);
        let right = decoded.get_pixel(56, 16);
        assert!(left[2] > left[0], "left side should be blue: {:?}", left);
        assert!(right[0] > right[2], "right side should be red: {:?}", right);
    }

    #[test]
    fn test_still_image_device_serves_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("frame.png");
        RgbImage::from_pixel(640, 480, Rgb([10, 20, 30]))
            .save(&path)
            .unwrap();

        let mut capture = WebcamCapture::new(StillImageDevice::new(&path));
        capture.start().unwrap();
        let payload = capture.capture().unwrap().unwrap();
        assert!(!payload.is_empty());

        capture.stop();
        assert!(capture.capture().unwrap().is_none());
    }

    #[test]
    fn test_still_image_device_missing_file() {
        let mut capture = WebcamCapture::new(StillImageDevice::new("/nonexistent/frame.png"));
        let err = capture.start().unwrap_err();
        assert_eq!(err.to_string(), CAMERA_ACCESS_MESSAGE);
    }
}
