pub mod capture;
pub mod preview;

pub use capture::{CameraStatus, CaptureController};
pub use preview::PreviewController;
