use super::state::SnapcamState;
use crate::controllers::CameraStatus;
use crate::photo::PhotoInfo;
use crate::presenter::Screen;
use crate::session::PreviewFrame;
use crate::types::{Device, ViewBounds};
use serde::Serialize;
use std::time::Duration;
use tauri::{command, State};

const PREVIEW_WAIT: Duration = Duration::from_millis(500);

#[derive(Debug, Clone, Serialize)]
pub struct ScreenStatus {
    pub screen: Screen,
    pub camera: CameraStatus,
    pub photo: Option<PhotoInfo>,
}

/// Bring up the camera screen with a preview of the given size
#[command]
pub async fn open_camera(
    state: State<'_, SnapcamState>,
    width: u32,
    height: u32,
) -> Result<CameraStatus, String> {
    log::info!("Opening camera with {}x{} preview", width, height);
    let mut app = state.app.clone().lock_owned().await;

    tokio::task::spawn_blocking(move || {
        app.open(ViewBounds::new(width, height))
            .map(|_| app.camera().status())
    })
    .await
    .map_err(|e| format!("Task join error: {}", e))?
    .map_err(|e| {
        log::error!("Failed to open camera: {}", e);
        format!("Failed to open camera: {}", e)
    })
}

#[command]
pub async fn close_camera(state: State<'_, SnapcamState>) -> Result<(), String> {
    let mut app = state.app.clone().lock_owned().await;
    tokio::task::spawn_blocking(move || app.close())
        .await
        .map_err(|e| format!("Task join error: {}", e))?
        .map_err(|e| format!("Failed to close camera: {}", e))
}

/// Shutter button. On success the preview screen is showing the photo.
#[command]
pub async fn capture_photo(state: State<'_, SnapcamState>) -> Result<PhotoInfo, String> {
    let ticket = state.app.lock().await.camera().capture_photo();

    // The session lock is released while the photo is taken, so the UI can
    // keep polling status and preview frames.
    let result = match ticket {
        Ok(ticket) => ticket.await,
        Err(e) => Err(e),
    };

    state
        .app
        .lock()
        .await
        .on_capture_result(result)
        .map_err(|e| format!("Failed to capture photo: {}", e))
}

/// Switch between front and back cameras
#[command]
pub async fn toggle_facing(state: State<'_, SnapcamState>) -> Result<Device, String> {
    let mut app = state.app.clone().lock_owned().await;
    tokio::task::spawn_blocking(move || app.camera_mut().toggle_facing())
        .await
        .map_err(|e| format!("Task join error: {}", e))?
        .map_err(|e| {
            log::error!("Failed to switch camera: {}", e);
            format!("Failed to switch camera: {}", e)
        })
}

/// Flip the flash setting; returns whether flash is now on
#[command]
pub async fn toggle_flash(state: State<'_, SnapcamState>) -> Result<bool, String> {
    Ok(state.app.lock().await.camera_mut().toggle_flash())
}

#[command]
pub async fn camera_status(state: State<'_, SnapcamState>) -> Result<ScreenStatus, String> {
    let app = state.app.lock().await;
    Ok(ScreenStatus {
        screen: app.screen(),
        camera: app.camera().status(),
        photo: app
            .preview()
            .and_then(|p| p.image())
            .map(|image| image.info()),
    })
}

/// Latest preview frame, or the first one newer than `after`.
#[command]
pub async fn get_preview_frame(
    state: State<'_, SnapcamState>,
    after: Option<u64>,
) -> Result<Option<PreviewFrame>, String> {
    let layer = state
        .app
        .lock()
        .await
        .camera()
        .preview_layer()
        .cloned()
        .ok_or_else(|| "No preview layer attached".to_string())?;

    match after {
        Some(sequence) => tokio::task::spawn_blocking(move || layer.wait_for_frame(sequence, PREVIEW_WAIT))
            .await
            .map_err(|e| format!("Task join error: {}", e)),
        None => Ok(layer.latest_frame()),
    }
}
