//! Snapcam: two-screen photo capture for Tauri applications
//!
//! A camera screen shows a live preview and takes a still photo; a preview
//! screen shows that photo and saves it to the photo library or throws it
//! away.
//!
//! # Features
//! - Front/back camera switching inside one reconfiguration bracket
//! - Flash toggle carried on every photo request
//! - Aspect-fill live preview, with photos framed to match
//! - JPEG photos saved into date-organized folders
//! - Synthetic camera backend for running without hardware
//!
//! # Usage
//! Add this to your `Cargo.toml`:
//! ```toml
//! [dependencies]
//! snapcam = "0.1"
//! tauri = { version = "2.0", features = ["protocol-asset"] }
//! ```
//!
//! Then in your Tauri app:
//! ```rust,ignore
//! fn main() {
//!     tauri::Builder::default()
//!         .plugin(snapcam::init())
//!         .run(tauri::generate_context!())
//!         .expect("error while running tauri application");
//! }
//! ```
pub mod app;
pub mod commands;
pub mod config;
pub mod controllers;
pub mod discovery;
pub mod errors;
pub mod library;
pub mod permissions;
pub mod photo;
pub mod platform;
pub mod presenter;
pub mod session;
pub mod types;

// Testing utilities - synthetic backend and recording doubles for offline use
pub mod testing;

// Re-exports for convenience
pub use app::CameraApp;
pub use config::SnapcamConfig;
pub use controllers::{CameraStatus, CaptureController, PreviewController};
pub use errors::CameraError;
pub use library::{FileSystemLibrary, PhotoLibrary, SavedPhoto};
pub use photo::{CapturedImage, PhotoInfo};
pub use platform::{CameraBackend, CameraInput, NativeBackend};
pub use presenter::{Alert, AlertKind, LogPresenter, Presenter, Screen};
pub use session::{
    CaptureSession, PhotoTicket, PreviewLayer, SessionPreset, VideoGravity, VideoOrientation,
};
pub use types::{Device, Facing, FlashMode, Platform, ViewBounds};

use std::sync::Arc;
use tauri::{
    plugin::{Builder, TauriPlugin},
    Manager, Runtime,
};

/// Initialize the Snapcam plugin with all commands
pub fn init<R: Runtime>() -> TauriPlugin<R> {
    Builder::new("snapcam")
        .invoke_handler(tauri::generate_handler![
            // Camera screen
            commands::camera::open_camera,
            commands::camera::close_camera,
            commands::camera::capture_photo,
            commands::camera::toggle_facing,
            commands::camera::toggle_flash,
            commands::camera::camera_status,
            commands::camera::get_preview_frame,
            // Preview screen
            commands::preview::save_photo,
            commands::preview::cancel_photo,
            // Devices and permissions
            commands::init::get_available_cameras,
            commands::init::check_camera_permission,
        ])
        .setup(|app, _api| {
            let config = SnapcamConfig::load_or_default();
            let presenter = Arc::new(commands::TauriPresenter::new(app.clone()));
            let camera_app = CameraApp::native(config.clone(), presenter);
            app.manage(commands::SnapcamState::new(camera_app, config));
            log::info!("Snapcam plugin ready");
            Ok(())
        })
        .build()
}

/// Initialize logging for the camera system
pub fn init_logging() {
    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", "snapcam=info");
    }
    let _ = env_logger::try_init();
}

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
pub const DESCRIPTION: &str = env!("CARGO_PKG_DESCRIPTION");

/// Get crate information
pub fn get_info() -> CrateInfo {
    CrateInfo {
        name: NAME.to_string(),
        version: VERSION.to_string(),
        description: DESCRIPTION.to_string(),
        platform: Platform::current(),
    }
}

/// Crate information structure
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct CrateInfo {
    pub name: String,
    pub version: String,
    pub description: String,
    pub platform: Platform,
}

#[cfg(test)]
mod lib_tests {
    use super::*;

    #[test]
    fn test_crate_info() {
        let info = get_info();
        assert_eq!(info.name, "snapcam");
        assert!(!info.version.is_empty());
        assert!(!info.description.is_empty());
        assert_eq!(info.platform, Platform::current());
    }

    #[test]
    fn test_init_logging_is_repeatable() {
        init_logging();
        init_logging();
    }
}
