//! Webcam device enumeration.

use std::fmt;

use nokhwa::query;
use nokhwa::utils::ApiBackend;

use super::SourceError;

/// Information about an available webcam.
#[derive(Debug, Clone)]
pub struct CameraInfo {
    /// Device index for the `--source` flag
    pub index: u32,
    /// Human-readable device name
    pub name: String,
    /// Device description
    pub description: String,
}

impl fmt::Display for CameraInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {} ({})", self.index, self.name, self.description)
    }
}

/// List the webcams visible to the native backend.
///
/// No cameras is an empty list, not an error; an error means the backend
/// itself could not be queried.
pub fn list_devices() -> Result<Vec<CameraInfo>, SourceError> {
    let devices = query(ApiBackend::Auto).map_err(|e| SourceError::QueryFailed(e.to_string()))?;

    Ok(devices
        .into_iter()
        .map(|d| CameraInfo {
            index: d.index().as_index().unwrap_or(0),
            name: d.human_name(),
            description: d.description().to_string(),
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_camera_info_display() {
        let info = CameraInfo {
            index: 1,
            name: "USB Camera".to_string(),
            description: "uvcvideo".to_string(),
        };
        assert_eq!(format!("{}", info), "[1] USB Camera (uvcvideo)");
    }
}
