//! Plugin state and the presenter that talks to the webview.

use crate::app::CameraApp;
use crate::config::SnapcamConfig;
use crate::presenter::{Alert, Presenter, Screen};
use std::sync::Arc;
use tauri::{AppHandle, Emitter, Runtime};
use tokio::sync::Mutex;

pub const ALERT_EVENT: &str = "snapcam://alert";
pub const DISMISS_EVENT: &str = "snapcam://dismiss";

/// Managed by the plugin; one camera app per Tauri application.
pub struct SnapcamState {
    pub(crate) app: Arc<Mutex<CameraApp>>,
    pub(crate) config: SnapcamConfig,
}

impl SnapcamState {
    pub fn new(app: CameraApp, config: SnapcamConfig) -> Self {
        Self {
            app: Arc::new(Mutex::new(app)),
            config,
        }
    }
}

/// Forwards alerts and dismissals to the frontend as events.
pub struct TauriPresenter<R: Runtime> {
    handle: AppHandle<R>,
}

impl<R: Runtime> TauriPresenter<R> {
    pub fn new(handle: AppHandle<R>) -> Self {
        Self { handle }
    }
}

impl<R: Runtime> Presenter for TauriPresenter<R> {
    fn present_alert(&self, alert: Alert) {
        if let Err(e) = self.handle.emit(ALERT_EVENT, &alert) {
            log::error!("Failed to emit alert '{}': {}", alert.title, e);
        }
    }

    fn dismiss(&self, screen: Screen) {
        if let Err(e) = self.handle.emit(DISMISS_EVENT, screen) {
            log::error!("Failed to emit dismissal of {:?}: {}", screen, e);
        }
    }
}
