//! Camera backends.
//!
//! A [`CameraBackend`] enumerates devices and opens [`CameraInput`]s for
//! them. The session only talks to these traits, so the native nokhwa
//! backend and the synthetic test backend are interchangeable.

pub mod native;

pub use native::NativeBackend;

use crate::errors::CameraError;
use crate::permissions::PermissionStatus;
use crate::session::SessionPreset;
use crate::types::{CameraFrame, Device, FlashMode};

/// An opened camera delivering frames to a session.
pub trait CameraInput: Send {
    fn device(&self) -> &Device;

    fn start(&mut self) -> Result<(), CameraError>;

    fn stop(&mut self) -> Result<(), CameraError>;

    fn is_streaming(&self) -> bool;

    /// Block until the next preview frame is available.
    fn next_frame(&mut self) -> Result<CameraFrame, CameraError>;

    /// Take one still. `Ok(None)` means the platform finished the request
    /// without producing a buffer.
    fn capture_still(&mut self, flash: FlashMode) -> Result<Option<CameraFrame>, CameraError> {
        if flash == FlashMode::On {
            log::debug!(
                "{} has no flash unit, capturing without it",
                self.device().name
            );
        }
        self.next_frame().map(Some)
    }
}

pub trait CameraBackend: Send + Sync {
    fn name(&self) -> &'static str;

    /// All capture devices currently known to the platform.
    fn enumerate(&self) -> Result<Vec<Device>, CameraError>;

    /// Open an input for `device`. Fails when the device is busy or gone.
    fn open_input(
        &self,
        device: &Device,
        preset: SessionPreset,
    ) -> Result<Box<dyn CameraInput>, CameraError>;

    fn permission(&self) -> PermissionStatus {
        PermissionStatus::Granted
    }
}
