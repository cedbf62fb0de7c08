use super::state::SnapcamState;
use crate::discovery::DiscoverySession;
use crate::permissions::{check_permission_detailed, PermissionInfo};
use crate::platform::NativeBackend;
use crate::types::{Device, DeviceType, MediaType};
use tauri::{command, State};

/// Get list of available cameras on the current platform
#[command]
pub async fn get_available_cameras(state: State<'_, SnapcamState>) -> Result<Vec<Device>, String> {
    let backend = NativeBackend::from_config(&state.config.camera);
    let devices = tokio::task::spawn_blocking(move || {
        DiscoverySession::new(
            &backend,
            &[DeviceType::BuiltInWideAngleCamera, DeviceType::External],
            MediaType::Video,
        )
        .map(|discovery| discovery.devices().to_vec())
    })
    .await
    .map_err(|e| format!("Task join error: {}", e))?;

    match devices {
        Ok(cameras) => {
            log::info!("Found {} cameras", cameras.len());
            for camera in &cameras {
                log::debug!("Camera: {} - {} ({})", camera.id, camera.name, camera.facing);
            }
            Ok(cameras)
        }
        Err(e) => {
            log::error!("Failed to list cameras: {}", e);
            Err(format!("Failed to list cameras: {}", e))
        }
    }
}

/// Camera permission as reported by the operating system
#[command]
pub async fn check_camera_permission() -> Result<PermissionInfo, String> {
    let info = tokio::task::spawn_blocking(check_permission_detailed)
        .await
        .map_err(|e| format!("Task join error: {}", e))?;
    log::info!("Camera permission: {} ({})", info.status, info.message);
    Ok(info)
}
