//! Frame sources: webcam devices and video files.
//!
//! A [`CaptureSource`] is opened once at startup, read one frame at a time by
//! the capture loop, and released exactly once when dropped. Both backends
//! produce RGB24 [`Frame`]s; everything downstream (preview, JPEG save) is
//! backend-agnostic.

mod device;
mod file;
mod webcam;

pub use device::{list_devices, CameraInfo};

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use file::FileSource;
use webcam::WebcamSource;

/// Identifies where frames come from: a webcam by index, or a video file by path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceSelector {
    Webcam(u32),
    File(PathBuf),
}

impl SourceSelector {
    /// A string of ASCII digits selects a webcam by index; anything else is
    /// treated as a video file path. Total: every string selects something.
    pub fn from_arg(s: &str) -> Self {
        if !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit()) {
            // Indices that overflow u32 are not real devices; fall through to
            // the file branch and let open() report the missing path.
            if let Ok(index) = s.parse::<u32>() {
                return SourceSelector::Webcam(index);
            }
        }
        SourceSelector::File(PathBuf::from(s))
    }
}

impl FromStr for SourceSelector {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::from_arg(s))
    }
}

impl fmt::Display for SourceSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceSelector::Webcam(index) => write!(f, "webcam {}", index),
            SourceSelector::File(path) => write!(f, "file {}", path.display()),
        }
    }
}

/// One still image sampled from the capture source.
///
/// Pixel data is tightly packed RGB24, row-major. Frames are transient: the
/// capture loop displays or saves them and then lets them drop.
#[derive(Debug, Clone)]
pub struct Frame {
    /// Raw pixel data, 3 bytes per pixel
    pub data: Vec<u8>,
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
}

/// Result of a single read from a capture source.
#[derive(Debug)]
pub enum FrameRead {
    /// A decoded frame
    Frame(Frame),
    /// The source has no more frames (video file exhausted)
    EndOfStream,
}

/// Errors from opening or reading a capture source.
#[derive(Debug)]
pub enum SourceError {
    /// Failed to enumerate webcam devices
    QueryFailed(String),
    /// No webcam exists at the requested index
    DeviceNotFound(u32),
    /// Webcam exists but could not be opened or streamed
    OpenFailed(String),
    /// Webcam permission denied (macOS)
    PermissionDenied,
    /// Video file does not exist
    FileNotFound(PathBuf),
    /// ffmpeg or ffprobe executable not found
    FfmpegNotFound(&'static str),
    /// ffprobe ran but its output was unusable
    ProbeFailed { path: PathBuf, message: String },
    /// Reading a frame failed mid-stream
    ReadFailed(String),
}

impl fmt::Display for SourceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceError::QueryFailed(msg) => write!(f, "Failed to query cameras: {}", msg),
            SourceError::DeviceNotFound(index) => {
                write!(
                    f,
                    "Camera {} not found. Run 'framegrab list-cameras' to see available devices",
                    index
                )
            }
            SourceError::OpenFailed(msg) => write!(f, "Failed to open camera: {}", msg),
            SourceError::PermissionDenied => {
                write!(
                    f,
                    "Camera permission denied. On macOS, grant access in System Settings > Privacy & Security > Camera"
                )
            }
            SourceError::FileNotFound(path) => {
                write!(f, "Video file '{}' not found", path.display())
            }
            SourceError::FfmpegNotFound(bin) => {
                write!(
                    f,
                    "{} not found. Video file sources require ffmpeg; install it with your package manager",
                    bin
                )
            }
            SourceError::ProbeFailed { path, message } => {
                write!(f, "Failed to probe '{}': {}", path.display(), message)
            }
            SourceError::ReadFailed(msg) => write!(f, "Failed to read frame: {}", msg),
        }
    }
}

impl std::error::Error for SourceError {}

/// A capture source opened from a [`SourceSelector`].
///
/// Owns the underlying device or decoder process exclusively. Dropping the
/// source releases it; both backends implement `Drop`, so release happens on
/// every exit path without explicit cleanup calls.
pub struct CaptureSource {
    backend: Backend,
}

enum Backend {
    Webcam(WebcamSource),
    File(FileSource),
}

impl CaptureSource {
    /// Open the selected source, failing fast if it is unavailable.
    pub fn open(selector: &SourceSelector) -> Result<Self, SourceError> {
        let backend = match selector {
            SourceSelector::Webcam(index) => Backend::Webcam(WebcamSource::open(*index)?),
            SourceSelector::File(path) => Backend::File(FileSource::open(path)?),
        };
        Ok(Self { backend })
    }

    /// Read the next frame.
    ///
    /// Returns `FrameRead::EndOfStream` when a video file is exhausted.
    /// Webcams never report end of stream; they either produce a frame or fail.
    pub fn read(&mut self) -> Result<FrameRead, SourceError> {
        match &mut self.backend {
            Backend::Webcam(source) => source.read(),
            Backend::File(source) => source.read(),
        }
    }

    /// Human-readable description for the status line.
    pub fn describe(&self) -> String {
        match &self.backend {
            Backend::Webcam(source) => source.describe(),
            Backend::File(source) => source.describe(),
        }
    }
}
