//! In-memory camera backend.
//!
//! Behaves like a two-camera phone: a front and a back camera, each of
//! which can be open by only one input at a time. Knobs let tests make
//! opening fail, stills come back empty, or permission be refused.

use super::synthetic_data::synthetic_frame_for;
use crate::errors::CameraError;
use crate::permissions::PermissionStatus;
use crate::platform::{CameraBackend, CameraInput};
use crate::session::SessionPreset;
use crate::types::{CameraFrame, Device, Facing, FlashMode};
use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// What a still capture returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StillBehavior {
    Normal,
    /// The platform completes the request without a buffer.
    NoBuffer,
    Error,
}

#[derive(Debug)]
struct BackendState {
    in_use: HashSet<String>,
    fail_open: HashSet<String>,
    still_behavior: StillBehavior,
    permission: PermissionStatus,
    flash_log: Vec<FlashMode>,
    opened: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct SyntheticBackend {
    devices: Vec<Device>,
    resolution: (u32, u32),
    frame_interval: Duration,
    state: Arc<Mutex<BackendState>>,
    frames: Arc<AtomicU64>,
}

impl Default for SyntheticBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl SyntheticBackend {
    /// A front camera (`front-0`) and a back camera (`back-0`).
    pub fn new() -> Self {
        Self::with_devices(vec![
            Device::new("front-0", "Synthetic Front Camera", Facing::Front),
            Device::new("back-0", "Synthetic Back Camera", Facing::Back),
        ])
    }

    pub fn with_devices(devices: Vec<Device>) -> Self {
        Self {
            devices,
            resolution: (64, 48),
            frame_interval: Duration::from_millis(5),
            state: Arc::new(Mutex::new(BackendState {
                in_use: HashSet::new(),
                fail_open: HashSet::new(),
                still_behavior: StillBehavior::Normal,
                permission: PermissionStatus::Granted,
                flash_log: Vec::new(),
                opened: Vec::new(),
            })),
            frames: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn with_resolution(mut self, width: u32, height: u32) -> Self {
        self.resolution = (width, height);
        self
    }

    pub fn with_frame_interval(mut self, interval: Duration) -> Self {
        self.frame_interval = interval;
        self
    }

    /// Make every open of `device_id` fail.
    pub fn fail_open(&self, device_id: &str) {
        self.lock().fail_open.insert(device_id.to_string());
    }

    /// Pretend another app holds `device_id`.
    pub fn mark_in_use(&self, device_id: &str) {
        self.lock().in_use.insert(device_id.to_string());
    }

    pub fn is_in_use(&self, device_id: &str) -> bool {
        self.lock().in_use.contains(device_id)
    }

    pub fn set_still_behavior(&self, behavior: StillBehavior) {
        self.lock().still_behavior = behavior;
    }

    pub fn set_permission(&self, status: PermissionStatus) {
        self.lock().permission = status;
    }

    /// Flash mode of every still taken, in order.
    pub fn flash_log(&self) -> Vec<FlashMode> {
        self.lock().flash_log.clone()
    }

    /// Device ids in the order they were opened.
    pub fn opened(&self) -> Vec<String> {
        self.lock().opened.clone()
    }

    /// Frames produced by all inputs so far.
    pub fn frames_produced(&self) -> u64 {
        self.frames.load(Ordering::Relaxed)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, BackendState> {
        self.state.lock().expect("lock poisoned")
    }
}

impl CameraBackend for SyntheticBackend {
    fn name(&self) -> &'static str {
        "synthetic"
    }

    fn enumerate(&self) -> Result<Vec<Device>, CameraError> {
        Ok(self.devices.clone())
    }

    fn open_input(
        &self,
        device: &Device,
        preset: SessionPreset,
    ) -> Result<Box<dyn CameraInput>, CameraError> {
        let mut state = self.lock();
        if state.fail_open.contains(&device.id) {
            return Err(CameraError::SessionConfiguration(format!(
                "{} refused to open",
                device.name
            )));
        }
        if !state.in_use.insert(device.id.clone()) {
            return Err(CameraError::SessionConfiguration(format!(
                "{} is already in use",
                device.name
            )));
        }
        state.opened.push(device.id.clone());

        let (width, height) = preset
            .resolution()
            .map(|r| (r.width, r.height))
            .unwrap_or(self.resolution);

        Ok(Box::new(SyntheticInput {
            device: device.clone(),
            width,
            height,
            frame_interval: self.frame_interval,
            streaming: false,
            frame_number: 0,
            state: self.state.clone(),
            frames: self.frames.clone(),
        }))
    }

    fn permission(&self) -> PermissionStatus {
        self.lock().permission
    }
}

pub struct SyntheticInput {
    device: Device,
    width: u32,
    height: u32,
    frame_interval: Duration,
    streaming: bool,
    frame_number: u64,
    state: Arc<Mutex<BackendState>>,
    frames: Arc<AtomicU64>,
}

impl CameraInput for SyntheticInput {
    fn device(&self) -> &Device {
        &self.device
    }

    fn start(&mut self) -> Result<(), CameraError> {
        self.streaming = true;
        Ok(())
    }

    fn stop(&mut self) -> Result<(), CameraError> {
        self.streaming = false;
        Ok(())
    }

    fn is_streaming(&self) -> bool {
        self.streaming
    }

    fn next_frame(&mut self) -> Result<CameraFrame, CameraError> {
        if !self.streaming {
            return Err(CameraError::Capture(format!(
                "{} is not streaming",
                self.device.name
            )));
        }
        std::thread::sleep(self.frame_interval);
        self.frame_number += 1;
        self.frames.fetch_add(1, Ordering::Relaxed);
        Ok(synthetic_frame_for(
            self.frame_number,
            self.width,
            self.height,
            &self.device.id,
        ))
    }

    fn capture_still(&mut self, flash: FlashMode) -> Result<Option<CameraFrame>, CameraError> {
        let behavior = {
            let mut state = self.state.lock().expect("lock poisoned");
            state.flash_log.push(flash);
            state.still_behavior
        };
        match behavior {
            StillBehavior::Normal => self.next_frame().map(Some),
            StillBehavior::NoBuffer => Ok(None),
            StillBehavior::Error => Err(CameraError::Capture(format!(
                "{} failed to take a still",
                self.device.name
            ))),
        }
    }
}

impl Drop for SyntheticInput {
    fn drop(&mut self) {
        if let Ok(mut state) = self.state.lock() {
            state.in_use.remove(&self.device.id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_device_is_exclusive_until_dropped() {
        let backend = SyntheticBackend::new();
        let device = backend.enumerate().unwrap()[0].clone();

        let input = backend.open_input(&device, SessionPreset::Photo).unwrap();
        assert!(backend.is_in_use(&device.id));
        assert!(matches!(
            backend.open_input(&device, SessionPreset::Photo),
            Err(CameraError::SessionConfiguration(_))
        ));

        drop(input);
        assert!(!backend.is_in_use(&device.id));
        assert!(backend.open_input(&device, SessionPreset::Photo).is_ok());
    }

    #[test]
    fn test_preset_sets_frame_size() {
        let backend = SyntheticBackend::new().with_frame_interval(Duration::ZERO);
        let device = backend.enumerate().unwrap()[1].clone();
        let mut input = backend.open_input(&device, SessionPreset::Vga640x480).unwrap();
        input.start().unwrap();

        let frame = input.next_frame().unwrap();
        assert_eq!((frame.width, frame.height), (640, 480));
        assert_eq!(frame.device_id, "back-0");
    }

    #[test]
    fn test_stopped_input_yields_no_frames() {
        let backend = SyntheticBackend::new();
        let device = backend.enumerate().unwrap()[0].clone();
        let mut input = backend.open_input(&device, SessionPreset::Photo).unwrap();
        assert!(input.next_frame().is_err());
    }

    #[test]
    fn test_still_behavior_and_flash_log() {
        let backend = SyntheticBackend::new().with_frame_interval(Duration::ZERO);
        let device = backend.enumerate().unwrap()[0].clone();
        let mut input = backend.open_input(&device, SessionPreset::Photo).unwrap();
        input.start().unwrap();

        assert!(input.capture_still(FlashMode::On).unwrap().is_some());
        backend.set_still_behavior(StillBehavior::NoBuffer);
        assert!(input.capture_still(FlashMode::Off).unwrap().is_none());
        backend.set_still_behavior(StillBehavior::Error);
        assert!(input.capture_still(FlashMode::Off).is_err());

        assert_eq!(
            backend.flash_log(),
            vec![FlashMode::On, FlashMode::Off, FlashMode::Off]
        );
    }
}
