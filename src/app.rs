//! Two-screen navigation: the camera screen, and the preview screen pushed
//! on top of it after a successful capture.

use crate::config::SnapcamConfig;
use crate::controllers::{CaptureController, PreviewController};
use crate::errors::CameraError;
use crate::library::{FileSystemLibrary, PhotoLibrary, SavedPhoto};
use crate::photo::{CapturedImage, PhotoInfo};
use crate::platform::{CameraBackend, NativeBackend};
use crate::presenter::{Alert, Presenter, Screen};
use crate::types::ViewBounds;
use std::sync::Arc;

pub struct CameraApp {
    capture: CaptureController,
    preview: Option<PreviewController>,
    library: Arc<dyn PhotoLibrary>,
    presenter: Arc<dyn Presenter>,
}

impl CameraApp {
    pub fn new(
        config: SnapcamConfig,
        backend: Arc<dyn CameraBackend>,
        library: Arc<dyn PhotoLibrary>,
        presenter: Arc<dyn Presenter>,
    ) -> Self {
        Self {
            capture: CaptureController::new(backend, config),
            preview: None,
            library,
            presenter,
        }
    }

    /// Real cameras, photos written under the configured directory.
    pub fn native(config: SnapcamConfig, presenter: Arc<dyn Presenter>) -> Self {
        let backend = Arc::new(NativeBackend::from_config(&config.camera));
        let library = Arc::new(FileSystemLibrary::from_config(&config.storage));
        Self::new(config, backend, library, presenter)
    }

    pub fn screen(&self) -> Screen {
        if self.preview.is_some() {
            Screen::Preview
        } else {
            Screen::Camera
        }
    }

    pub fn camera(&self) -> &CaptureController {
        &self.capture
    }

    pub fn camera_mut(&mut self) -> &mut CaptureController {
        &mut self.capture
    }

    pub fn preview(&self) -> Option<&PreviewController> {
        self.preview.as_ref()
    }

    /// Bring up the camera screen.
    pub fn open(&mut self, bounds: ViewBounds) -> Result<(), CameraError> {
        self.capture.open(bounds)
    }

    /// Shutter press: capture, then route the outcome.
    pub async fn capture(&mut self) -> Result<PhotoInfo, CameraError> {
        let result = match self.capture.capture_photo() {
            Ok(ticket) => ticket.await,
            Err(e) => Err(e),
        };
        self.on_capture_result(result)
    }

    /// A successful capture opens the preview screen with the photo; a
    /// failure raises an alert and stays on the camera screen.
    pub fn on_capture_result(
        &mut self,
        result: Result<CapturedImage, CameraError>,
    ) -> Result<PhotoInfo, CameraError> {
        match result {
            Ok(image) => {
                let info = image.info();
                let mut preview =
                    PreviewController::new(self.library.clone(), self.presenter.clone());
                preview.show(image);
                self.preview = Some(preview);
                Ok(info)
            }
            Err(e) => {
                log::error!("Capture failed: {}", e);
                self.presenter.present_alert(Alert::from_error(&e));
                Err(e)
            }
        }
    }

    pub async fn save(&mut self) -> Result<SavedPhoto, CameraError> {
        let preview = self
            .preview
            .as_mut()
            .ok_or_else(|| CameraError::InvalidState("no photo is being previewed".to_string()))?;
        let result = preview.save().await;
        if preview.is_closed() {
            self.preview = None;
        }
        result
    }

    pub fn cancel(&mut self) -> Result<(), CameraError> {
        let preview = self
            .preview
            .as_mut()
            .ok_or_else(|| CameraError::InvalidState("no photo is being previewed".to_string()))?;
        preview.cancel()?;
        self.preview = None;
        Ok(())
    }

    /// Tear down the camera screen.
    pub fn close(&mut self) -> Result<(), CameraError> {
        self.preview = None;
        self.capture.stop()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::presenter::AlertKind;
    use crate::testing::{sample_photo, MemoryLibrary, RecordingPresenter, SyntheticBackend};

    fn app(presenter: Arc<RecordingPresenter>) -> CameraApp {
        CameraApp::new(
            SnapcamConfig::default(),
            Arc::new(SyntheticBackend::new()),
            Arc::new(MemoryLibrary::new()),
            presenter,
        )
    }

    #[test]
    fn test_failed_capture_stays_on_camera() {
        let presenter = Arc::new(RecordingPresenter::default());
        let mut app = app(presenter.clone());

        let result = app.on_capture_result(Err(CameraError::Capture("no buffer".to_string())));
        assert!(result.is_err());
        assert_eq!(app.screen(), Screen::Camera);
        let alerts = presenter.alerts();
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].kind, AlertKind::Error);
        assert_eq!(alerts[0].title, "Capture Failed");
    }

    #[test]
    fn test_successful_capture_pushes_preview() {
        let presenter = Arc::new(RecordingPresenter::default());
        let mut app = app(presenter);

        let photo = sample_photo();
        let info = app.on_capture_result(Ok(photo.clone())).unwrap();
        assert_eq!(info.request_id, photo.request_id());
        assert_eq!(app.screen(), Screen::Preview);

        let second = sample_photo();
        app.on_capture_result(Ok(second.clone())).unwrap();
        assert_eq!(
            app.preview().unwrap().image().unwrap().request_id(),
            second.request_id()
        );

        app.cancel().unwrap();
        assert_eq!(app.screen(), Screen::Camera);
        assert!(matches!(app.cancel(), Err(CameraError::InvalidState(_))));
    }
}
