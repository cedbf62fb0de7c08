//! Camera screen.
//!
//! Owns the capture session for as long as the screen is up and turns
//! button presses (shutter, switch camera, flash) into session work.

use crate::config::SnapcamConfig;
use crate::discovery::DiscoverySession;
use crate::errors::CameraError;
use crate::platform::CameraBackend;
use crate::session::{CaptureSession, PhotoOutput, PhotoTicket, PreviewLayer, SessionStatus};
use crate::types::{Device, DeviceType, Facing, FlashMode, MediaType, PhotoRequest, ViewBounds};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;

const DISCOVERED_TYPES: &[DeviceType] = &[DeviceType::BuiltInWideAngleCamera, DeviceType::External];

/// Snapshot of the camera screen for the UI.
#[derive(Debug, Clone, Serialize)]
pub struct CameraStatus {
    pub facing: Facing,
    pub flash_enabled: bool,
    pub current_device: Option<Device>,
    pub front_available: bool,
    pub back_available: bool,
    pub session: SessionStatus,
}

pub struct CaptureController {
    backend: Arc<dyn CameraBackend>,
    config: SnapcamConfig,
    session: CaptureSession,
    discovery: Option<DiscoverySession>,
    front_camera: Option<Device>,
    back_camera: Option<Device>,
    current_device: Option<Device>,
    facing: Facing,
    flash_enabled: bool,
    preview: Option<PreviewLayer>,
}

impl CaptureController {
    pub fn new(backend: Arc<dyn CameraBackend>, config: SnapcamConfig) -> Self {
        let session = CaptureSession::new()
            .with_stop_timeout(Duration::from_millis(config.camera.stop_timeout_ms));
        Self {
            backend,
            facing: config.camera.default_facing,
            flash_enabled: config.camera.flash_enabled,
            config,
            session,
            discovery: None,
            front_camera: None,
            back_camera: None,
            current_device: None,
            preview: None,
        }
    }

    pub fn facing(&self) -> Facing {
        self.facing
    }

    pub fn flash_enabled(&self) -> bool {
        self.flash_enabled
    }

    pub fn current_device(&self) -> Option<&Device> {
        self.current_device.as_ref()
    }

    pub fn session(&self) -> &CaptureSession {
        &self.session
    }

    pub fn preview_layer(&self) -> Option<&PreviewLayer> {
        self.preview.as_ref()
    }

    pub fn status(&self) -> CameraStatus {
        CameraStatus {
            facing: self.facing,
            flash_enabled: self.flash_enabled,
            current_device: self.current_device.clone(),
            front_available: self.front_camera.is_some(),
            back_available: self.back_camera.is_some(),
            session: self.session.status(),
        }
    }

    /// Apply the configured output preset. Safe to call repeatedly.
    pub fn configure_session(&mut self) {
        self.session.set_preset(self.config.camera.preset);
    }

    /// Pick the first camera at `facing` and make it current.
    ///
    /// On `DeviceNotFound` the current device is left as it was.
    pub fn select_device(&mut self, facing: Facing) -> Result<Device, CameraError> {
        if self.discovery.is_none() {
            let discovery =
                DiscoverySession::new(self.backend.as_ref(), DISCOVERED_TYPES, MediaType::Video)
                    .map_err(|e| {
                        log::error!("Camera discovery failed: {}", e);
                        e
                    })?;
            self.front_camera = discovery.first(Facing::Front).cloned();
            self.back_camera = discovery.first(Facing::Back).cloned();
            self.discovery = Some(discovery);
        }

        let found = match facing {
            Facing::Front => self.front_camera.clone(),
            Facing::Back => self.back_camera.clone(),
        };

        match found {
            Some(device) => {
                log::info!("Selected {} camera {} ({})", facing, device.name, device.id);
                self.current_device = Some(device.clone());
                Ok(device)
            }
            None => {
                log::error!("Can't find a {} camera", facing);
                Err(CameraError::DeviceNotFound(facing))
            }
        }
    }

    /// Open `device` as the session input and attach a photo output.
    ///
    /// When the input cannot be opened the session is left without one and
    /// no output is added.
    pub fn attach_io(&mut self, device: &Device) -> Result<(), CameraError> {
        if self.config.camera.require_permission {
            let permission = self.backend.permission();
            if permission.blocks_capture() {
                log::error!("Camera permission is {}", permission);
                return Err(CameraError::PermissionDenied(format!(
                    "camera access is {}",
                    permission
                )));
            }
        }

        let preset = self.session.preset().unwrap_or(self.config.camera.preset);
        let input = self.backend.open_input(device, preset).map_err(|e| {
            log::error!("Failed to open input for {}: {}", device.name, e);
            match e {
                CameraError::SessionConfiguration(_) => e,
                other => CameraError::SessionConfiguration(other.to_string()),
            }
        })?;

        self.session.add_input(input).map_err(|e| {
            log::error!("Failed to add input {}: {}", device.name, e);
            e
        })?;
        self.session
            .add_output(PhotoOutput::new(self.config.storage.jpeg_quality))
            .map_err(|e| {
                log::error!("Failed to add photo output: {}", e);
                e
            })
    }

    /// Create the live preview surface. A surface that cannot be created is
    /// logged and skipped; the screen keeps working without a viewfinder.
    pub fn attach_preview(&mut self, bounds: ViewBounds) -> Option<PreviewLayer> {
        let layer = match PreviewLayer::new(
            bounds,
            self.config.preview.gravity,
            self.config.preview.orientation,
        ) {
            Ok(layer) => layer,
            Err(e) => {
                log::warn!("Can't create preview layer: {}", e);
                return None;
            }
        };

        if let Some(old) = self.preview.take() {
            self.session.remove_preview_layer(old.id());
        }
        self.session.add_preview_layer(layer.clone());
        self.preview = Some(layer.clone());
        Some(layer)
    }

    pub fn start(&mut self) -> Result<(), CameraError> {
        self.session.start_running()
    }

    pub fn stop(&mut self) -> Result<(), CameraError> {
        self.session.stop_running()
    }

    /// Configure, select the default facing, wire it up, attach the preview
    /// and start. With no camera at the default facing the opposite one is
    /// used and `facing` follows it. Wiring failures are logged and do not
    /// stop the remaining steps; only a failure to start is returned.
    pub fn open(&mut self, bounds: ViewBounds) -> Result<(), CameraError> {
        self.configure_session();
        let selected = match self.select_device(self.facing) {
            Err(CameraError::DeviceNotFound(wanted)) => {
                log::warn!("No {} camera, trying the {} one", wanted, wanted.opposite());
                self.select_device(wanted.opposite()).map(|device| {
                    self.facing = device.facing;
                    device
                })
            }
            other => other,
        };
        if let Ok(device) = selected {
            let _ = self.attach_io(&device);
        }
        self.attach_preview(bounds);
        self.start()
    }

    /// Request one photo with an explicit flash mode.
    pub fn capture(&self, flash_mode: FlashMode) -> Result<PhotoTicket, CameraError> {
        self.session.capture_photo(PhotoRequest::new(flash_mode))
    }

    /// Shutter button: capture with the current flash toggle.
    pub fn capture_photo(&self) -> Result<PhotoTicket, CameraError> {
        self.capture(FlashMode::from_enabled(self.flash_enabled))
    }

    /// Switch between front and back cameras inside one reconfiguration
    /// bracket. The old camera is released either way, so after a failed
    /// switch there is no current device.
    pub fn toggle_facing(&mut self) -> Result<Device, CameraError> {
        self.facing = self.facing.opposite();

        self.session.begin_configuration();
        let inputs = self.session.remove_all_inputs();
        let outputs = self.session.remove_all_outputs();
        self.current_device = None;
        log::debug!(
            "Removed {} input(s) and {} output(s) for switch to {}",
            inputs,
            outputs,
            self.facing
        );

        let result = self
            .select_device(self.facing)
            .and_then(|device| self.attach_io(&device).map(|_| device));

        if let Err(e) = self.session.commit_configuration() {
            log::error!("Failed to commit camera switch: {}", e);
        }
        result
    }

    /// Flash button. Returns the new state.
    pub fn toggle_flash(&mut self) -> bool {
        self.flash_enabled = !self.flash_enabled;
        log::debug!("Flash {}", FlashMode::from_enabled(self.flash_enabled));
        self.flash_enabled
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::SyntheticBackend;

    fn controller(backend: SyntheticBackend) -> CaptureController {
        CaptureController::new(Arc::new(backend), SnapcamConfig::default())
    }

    #[test]
    fn test_toggle_flash_is_pure_state() {
        let mut camera = controller(SyntheticBackend::new());
        assert!(!camera.flash_enabled());
        assert!(camera.toggle_flash());
        assert!(!camera.toggle_flash());
        assert_eq!(camera.session().input_count(), 0);
    }

    #[test]
    fn test_configure_is_idempotent() {
        let mut camera = controller(SyntheticBackend::new());
        camera.configure_session();
        camera.configure_session();
        assert_eq!(
            camera.session().preset(),
            Some(crate::session::SessionPreset::Photo)
        );
    }

    #[test]
    fn test_zero_bounds_preview_is_skipped() {
        let mut camera = controller(SyntheticBackend::new());
        assert!(camera.attach_preview(ViewBounds::new(0, 0)).is_none());
        assert!(camera.preview_layer().is_none());
    }

    #[test]
    fn test_replacing_preview_keeps_one_layer() {
        let mut camera = controller(SyntheticBackend::new());
        camera.attach_preview(ViewBounds::new(30, 40));
        camera.attach_preview(ViewBounds::new(60, 80));
        assert_eq!(camera.status().session.preview_layers, 1);
        assert_eq!(
            camera.preview_layer().unwrap().bounds(),
            ViewBounds::new(60, 80)
        );
    }
}
