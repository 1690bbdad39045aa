//! Webcam backend built on nokhwa.

use nokhwa::pixel_format::RgbFormat;
use nokhwa::utils::{
    CameraFormat, CameraIndex, FrameFormat as NokhwaFrameFormat, RequestedFormat,
    RequestedFormatType, Resolution,
};
use nokhwa::Camera;

use super::device::list_devices;
use super::{Frame, FrameRead, SourceError};

/// Requested capture resolution and rate. The camera may negotiate something
/// else; frames carry their actual dimensions.
const REQUESTED_WIDTH: u32 = 640;
const REQUESTED_HEIGHT: u32 = 480;
const REQUESTED_FPS: u32 = 30;

/// How many consecutive undecodable buffers to tolerate before giving up.
/// Cameras occasionally deliver a torn MJPEG buffer; the next one is fine.
const MAX_DECODE_SKIPS: u32 = 3;

/// An open webcam with a running stream.
pub struct WebcamSource {
    camera: Camera,
    index: u32,
}

impl WebcamSource {
    /// Open the webcam at `index` and start streaming.
    ///
    /// Validates that the device exists before opening so a bad index fails
    /// here rather than on the first read.
    pub fn open(index: u32) -> Result<Self, SourceError> {
        let devices = list_devices()?;
        if !devices.iter().any(|d| d.index == index) {
            return Err(SourceError::DeviceNotFound(index));
        }

        let mut camera = open_with_fallback(index)?;
        camera
            .open_stream()
            .map_err(|e| SourceError::OpenFailed(e.to_string()))?;

        log::info!(
            "opened webcam {} at {}x{} @ {} fps",
            index,
            camera.resolution().width(),
            camera.resolution().height(),
            camera.frame_rate()
        );

        Ok(Self { camera, index })
    }

    /// Grab and decode the next frame.
    pub fn read(&mut self) -> Result<FrameRead, SourceError> {
        let mut skips = 0;
        loop {
            let buffer = self
                .camera
                .frame()
                .map_err(|e| SourceError::ReadFailed(e.to_string()))?;

            match buffer.decode_image::<RgbFormat>() {
                Ok(decoded) => {
                    let resolution = buffer.resolution();
                    return Ok(FrameRead::Frame(Frame {
                        data: decoded.into_raw(),
                        width: resolution.width(),
                        height: resolution.height(),
                    }));
                }
                Err(e) => {
                    skips += 1;
                    if skips > MAX_DECODE_SKIPS {
                        return Err(SourceError::ReadFailed(format!(
                            "{} consecutive undecodable frames: {}",
                            skips, e
                        )));
                    }
                    log::debug!("skipping undecodable frame: {}", e);
                }
            }
        }
    }

    pub fn describe(&self) -> String {
        format!("webcam {}", self.index)
    }
}

impl Drop for WebcamSource {
    fn drop(&mut self) {
        let _ = self.camera.stop_stream();
    }
}

/// Try to open a camera with multiple format fallback strategies.
///
/// Order of preference: NV12 (native on macOS), MJPEG (widely supported),
/// then whatever the camera offers at its highest resolution.
fn open_with_fallback(index: u32) -> Result<Camera, SourceError> {
    let camera_index = CameraIndex::Index(index);
    let requested_resolution = Resolution::new(REQUESTED_WIDTH, REQUESTED_HEIGHT);

    let format_attempts: Vec<RequestedFormat> = vec![
        RequestedFormat::new::<RgbFormat>(RequestedFormatType::Closest(CameraFormat::new(
            requested_resolution,
            NokhwaFrameFormat::NV12,
            REQUESTED_FPS,
        ))),
        RequestedFormat::new::<RgbFormat>(RequestedFormatType::Closest(CameraFormat::new(
            requested_resolution,
            NokhwaFrameFormat::MJPEG,
            REQUESTED_FPS,
        ))),
        RequestedFormat::new::<RgbFormat>(RequestedFormatType::AbsoluteHighestResolution),
    ];

    let mut last_error = None;
    for requested in format_attempts {
        match Camera::new(camera_index.clone(), requested) {
            Ok(camera) => return Ok(camera),
            Err(e) => {
                last_error = Some(e);
                continue;
            }
        }
    }

    // All attempts failed; permission problems get their own message
    let e = last_error.expect("format_attempts is non-empty");
    let msg = e.to_string().to_lowercase();
    if msg.contains("permission") || msg.contains("denied") || msg.contains("authorization") {
        Err(SourceError::PermissionDenied)
    } else {
        Err(SourceError::OpenFailed(e.to_string()))
    }
}
