use thiserror::Error;

use crate::types::Facing;

#[derive(Debug, Error)]
pub enum CameraError {
    #[error("No camera found facing {0}")]
    DeviceNotFound(Facing),
    #[error("Session configuration error: {0}")]
    SessionConfiguration(String),
    #[error("Capture error: {0}")]
    Capture(String),
    #[error("Save error: {0}")]
    Save(String),
    #[error("Permission denied error: {0}")]
    PermissionDenied(String),
    #[error("Invalid state: {0}")]
    InvalidState(String),
    #[error("Camera initialization error: {0}")]
    Initialization(String),
    #[error("Encoding error: {0}")]
    Encoding(String),
    #[error("Configuration error: {0}")]
    Config(String),
}

impl CameraError {
    /// Title used when the error is shown to the user in an alert.
    pub fn alert_title(&self) -> &'static str {
        match self {
            CameraError::Capture(_) => "Capture Failed",
            CameraError::Save(_) => "Save Failed",
            CameraError::PermissionDenied(_) => "Camera Access Denied",
            CameraError::DeviceNotFound(_) => "No Camera",
            _ => "Camera Error",
        }
    }
}

impl From<image::ImageError> for CameraError {
    fn from(e: image::ImageError) -> Self {
        CameraError::Encoding(e.to_string())
    }
}
