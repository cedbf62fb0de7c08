use super::state::SnapcamState;
use crate::library::SavedPhoto;
use tauri::{command, State};

/// Save the previewed photo to the library and close the preview screen
#[command]
pub async fn save_photo(state: State<'_, SnapcamState>) -> Result<SavedPhoto, String> {
    let mut app = state.app.lock().await;
    match app.save().await {
        Ok(saved) => {
            log::info!("Saved photo: {} ({} bytes)", saved.location, saved.size_bytes);
            Ok(saved)
        }
        Err(e) => {
            log::error!("Failed to save photo: {}", e);
            Err(format!("Failed to save photo: {}", e))
        }
    }
}

/// Discard the previewed photo
#[command]
pub async fn cancel_photo(state: State<'_, SnapcamState>) -> Result<(), String> {
    state
        .app
        .lock()
        .await
        .cancel()
        .map_err(|e| format!("Failed to discard photo: {}", e))
}
