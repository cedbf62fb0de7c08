//! Preview screen: shows one captured photo and saves or discards it.

use crate::errors::CameraError;
use crate::library::{PhotoLibrary, SavedPhoto};
use crate::photo::CapturedImage;
use crate::presenter::{Alert, Presenter, Screen};
use std::sync::Arc;

pub struct PreviewController {
    image: Option<CapturedImage>,
    library: Arc<dyn PhotoLibrary>,
    presenter: Arc<dyn Presenter>,
    closed: bool,
}

impl PreviewController {
    pub fn new(library: Arc<dyn PhotoLibrary>, presenter: Arc<dyn Presenter>) -> Self {
        Self {
            image: None,
            library,
            presenter,
            closed: false,
        }
    }

    /// Display `image`, replacing anything shown before.
    pub fn show(&mut self, image: CapturedImage) {
        log::debug!(
            "Showing {}x{} photo {}",
            image.width(),
            image.height(),
            image.request_id()
        );
        self.image = Some(image);
    }

    pub fn image(&self) -> Option<&CapturedImage> {
        self.image.as_ref()
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Persist the photo, tell the user how it went, then close.
    ///
    /// The alert reflects the real outcome; a failed write is reported as
    /// such and returned as `CameraError::Save`.
    pub async fn save(&mut self) -> Result<SavedPhoto, CameraError> {
        let image = self.shown_image()?.clone();
        let library = self.library.clone();

        let outcome = tokio::task::spawn_blocking(move || library.save(&image))
            .await
            .unwrap_or_else(|e| Err(CameraError::Save(format!("save task failed: {}", e))));

        match &outcome {
            Ok(saved) => {
                log::info!("Photo saved to {}", saved.location);
                self.presenter.present_alert(Alert::saved());
            }
            Err(e) => {
                log::error!("Failed to save photo: {}", e);
                self.presenter.present_alert(Alert::from_error(e));
            }
        }

        self.close();
        outcome
    }

    /// Close without saving.
    pub fn cancel(&mut self) -> Result<(), CameraError> {
        if self.closed {
            return Err(closed());
        }
        self.close();
        Ok(())
    }

    fn shown_image(&self) -> Result<&CapturedImage, CameraError> {
        if self.closed {
            return Err(closed());
        }
        self.image
            .as_ref()
            .ok_or_else(|| CameraError::InvalidState("no photo to save".to_string()))
    }

    fn close(&mut self) {
        self.image = None;
        self.closed = true;
        self.presenter.dismiss(Screen::Preview);
    }
}

fn closed() -> CameraError {
    CameraError::InvalidState("preview screen is closed".to_string())
}
