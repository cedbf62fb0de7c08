//! Camera screen behaviour against the synthetic backend.

use snapcam::config::SnapcamConfig;
use snapcam::controllers::CaptureController;
use snapcam::errors::CameraError;
use snapcam::permissions::PermissionStatus;
use snapcam::testing::{StillBehavior, SyntheticBackend};
use snapcam::types::{Device, Facing, FlashMode, ViewBounds};
use std::sync::Arc;

const BOUNDS: ViewBounds = ViewBounds::new(90, 160);

fn controller(backend: &SyntheticBackend) -> CaptureController {
    CaptureController::new(Arc::new(backend.clone()), SnapcamConfig::default())
}

fn opened(backend: &SyntheticBackend) -> CaptureController {
    let mut camera = controller(backend);
    camera.open(BOUNDS).unwrap();
    camera
}

// ═══════════════════════════════════════════════════════════════════════════
// DEVICE SELECTION
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn test_select_device_for_each_facing() {
    let backend = SyntheticBackend::new();
    let mut camera = controller(&backend);

    for facing in [Facing::Front, Facing::Back] {
        let device = camera.select_device(facing).unwrap();
        assert_eq!(device.facing, facing);
        assert_eq!(camera.current_device(), Some(&device));
    }
}

#[test]
fn test_missing_facing_leaves_current_device() {
    let backend = SyntheticBackend::with_devices(vec![Device::new("b", "Back", Facing::Back)]);
    let mut camera = controller(&backend);

    let back = camera.select_device(Facing::Back).unwrap();
    let result = camera.select_device(Facing::Front);
    assert!(matches!(result, Err(CameraError::DeviceNotFound(Facing::Front))));
    assert_eq!(camera.current_device(), Some(&back));
}

#[test]
fn test_no_cameras_at_all() {
    let backend = SyntheticBackend::with_devices(Vec::new());
    let mut camera = controller(&backend);
    assert!(camera.select_device(Facing::Back).is_err());
    assert!(camera.current_device().is_none());
    assert!(!camera.status().front_available);
    assert!(!camera.status().back_available);
}

// ═══════════════════════════════════════════════════════════════════════════
// WIRING
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn test_device_in_use_leaves_session_empty() {
    let backend = SyntheticBackend::new();
    backend.mark_in_use("back-0");
    let mut camera = controller(&backend);
    camera.configure_session();

    let back = camera.select_device(Facing::Back).unwrap();
    let result = camera.attach_io(&back);
    assert!(matches!(result, Err(CameraError::SessionConfiguration(_))));
    assert_eq!(camera.session().input_count(), 0);
    assert_eq!(camera.session().output_count(), 0);
}

#[test]
fn test_denied_permission_blocks_input() {
    let backend = SyntheticBackend::new();
    backend.set_permission(PermissionStatus::Denied);
    let mut camera = controller(&backend);
    camera.configure_session();

    let back = camera.select_device(Facing::Back).unwrap();
    assert!(matches!(
        camera.attach_io(&back),
        Err(CameraError::PermissionDenied(_))
    ));
    assert!(backend.opened().is_empty());
}

#[test]
fn test_open_falls_back_to_only_camera() {
    let backend = SyntheticBackend::with_devices(vec![Device::new("f", "Webcam", Facing::Front)]);
    let mut camera = controller(&backend);
    assert_eq!(camera.facing(), Facing::Back);

    camera.open(BOUNDS).unwrap();
    assert_eq!(camera.session().input_count(), 1);
    assert_eq!(camera.session().output_count(), 1);
    assert_eq!(camera.facing(), Facing::Front);
    assert_eq!(camera.current_device().unwrap().id, "f");
}

#[tokio::test]
async fn test_only_camera_can_take_photo_after_open() {
    let backend = SyntheticBackend::with_devices(vec![Device::new("f", "Webcam", Facing::Front)]);
    let mut camera = controller(&backend);
    camera.open(BOUNDS).unwrap();

    let image = camera.capture_photo().unwrap().await.unwrap();
    assert_eq!(image.facing(), Facing::Front);
}

#[test]
fn test_open_keeps_going_without_camera() {
    let backend = SyntheticBackend::with_devices(Vec::new());
    let mut camera = controller(&backend);

    camera.open(BOUNDS).unwrap();
    assert!(camera.session().is_running());
    assert!(camera.preview_layer().is_some());
    assert_eq!(camera.session().input_count(), 0);
    assert_eq!(camera.facing(), Facing::Back);
    assert!(matches!(
        camera.capture_photo(),
        Err(CameraError::Capture(_))
    ));
}

#[test]
fn test_open_wires_default_back_camera() {
    let backend = SyntheticBackend::new();
    let camera = opened(&backend);

    let status = camera.status();
    assert_eq!(status.facing, Facing::Back);
    assert_eq!(status.current_device.unwrap().id, "back-0");
    assert_eq!(status.session.outputs, 1);
    assert_eq!(status.session.input.unwrap().id, "back-0");
    assert_eq!(status.session.preview_layers, 1);
}

// ═══════════════════════════════════════════════════════════════════════════
// TOGGLES
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn test_toggle_facing_twice_restores_device() {
    let backend = SyntheticBackend::new();
    let mut camera = opened(&backend);
    let first = camera.current_device().cloned().unwrap();

    let front = camera.toggle_facing().unwrap();
    assert_eq!(front.facing, Facing::Front);
    assert_eq!(camera.session().input_device().unwrap().id, "front-0");
    assert!(!backend.is_in_use("back-0"));

    let back = camera.toggle_facing().unwrap();
    assert_eq!(back, first);
    assert_eq!(camera.session().input_count(), 1);
    assert_eq!(camera.session().output_count(), 1);
    assert!(!camera.session().is_reconfiguring());
    assert_eq!(backend.opened(), vec!["back-0", "front-0", "back-0"]);
}

#[test]
fn test_failed_toggle_still_commits() {
    let backend = SyntheticBackend::with_devices(vec![Device::new("b", "Back", Facing::Back)]);
    let mut camera = opened(&backend);

    let result = camera.toggle_facing();
    assert!(matches!(result, Err(CameraError::DeviceNotFound(Facing::Front))));
    assert_eq!(camera.facing(), Facing::Front);
    assert!(!camera.session().is_reconfiguring());
    assert_eq!(camera.session().input_count(), 0);
    assert!(camera.current_device().is_none());
    assert!(camera.status().current_device.is_none());

    // Toggling back recovers the back camera.
    camera.toggle_facing().unwrap();
    assert_eq!(camera.session().input_count(), 1);
}

#[test]
fn test_toggle_flash_does_not_touch_session() {
    let backend = SyntheticBackend::new();
    let mut camera = opened(&backend);
    let before = camera.status().session;

    assert!(camera.toggle_flash());
    let after = camera.status().session;
    assert_eq!(before.input, after.input);
    assert_eq!(before.outputs, after.outputs);
    assert_eq!(backend.opened().len(), 1);
}

// ═══════════════════════════════════════════════════════════════════════════
// CAPTURE
// ═══════════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn test_flash_metadata_follows_each_request() {
    let backend = SyntheticBackend::new();
    let camera = opened(&backend);

    let with_flash = camera.capture(FlashMode::On).unwrap();
    let without_flash = camera.capture(FlashMode::Off).unwrap();

    let (first, second) = futures::future::join(with_flash, without_flash).await;
    let (first, second) = (first.unwrap(), second.unwrap());
    assert_eq!(first.flash_mode(), FlashMode::On);
    assert_eq!(second.flash_mode(), FlashMode::Off);
    assert_ne!(first.request_id(), second.request_id());

    let mut used = backend.flash_log();
    used.sort_by_key(|m| m.as_str());
    assert_eq!(used, vec![FlashMode::Off, FlashMode::On]);
}

#[tokio::test]
async fn test_capture_photo_uses_flash_toggle() {
    let backend = SyntheticBackend::new();
    let mut camera = opened(&backend);
    camera.toggle_flash();

    let ticket = camera.capture_photo().unwrap();
    assert_eq!(ticket.request().flash_mode, FlashMode::On);
    assert_eq!(ticket.await.unwrap().flash_mode(), FlashMode::On);
}

#[tokio::test]
async fn test_missing_buffer_is_a_capture_error() {
    let backend = SyntheticBackend::new();
    backend.set_still_behavior(StillBehavior::NoBuffer);
    let camera = opened(&backend);

    let result = camera.capture(FlashMode::Off).unwrap().await;
    assert!(matches!(result, Err(CameraError::Capture(_))));
}

#[tokio::test]
async fn test_platform_error_is_a_capture_error() {
    let backend = SyntheticBackend::new();
    backend.set_still_behavior(StillBehavior::Error);
    let camera = opened(&backend);

    let result = camera.capture(FlashMode::Off).unwrap().await;
    assert!(matches!(result, Err(CameraError::Capture(_))));
}

#[test]
fn test_blocking_wait_from_plain_thread() {
    let backend = SyntheticBackend::new();
    let camera = opened(&backend);
    let image = camera.capture(FlashMode::Off).unwrap().wait().unwrap();
    assert_eq!(image.facing(), Facing::Back);
}
