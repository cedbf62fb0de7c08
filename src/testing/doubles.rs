//! Photo library and presenter that record instead of acting.

use crate::errors::CameraError;
use crate::library::{PhotoLibrary, SavedPhoto};
use crate::photo::CapturedImage;
use crate::presenter::{Alert, Presenter, Screen};
use crate::types::{Device, Facing, FlashMode, PhotoRequest};
use chrono::Utc;
use image::{Rgb, RgbImage};
use std::sync::Mutex;
use uuid::Uuid;

/// Keeps saved photos in memory. A failing library rejects every save.
#[derive(Debug, Default)]
pub struct MemoryLibrary {
    saved: Mutex<Vec<CapturedImage>>,
    failure: Option<String>,
}

impl MemoryLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing(reason: &str) -> Self {
        Self {
            saved: Mutex::new(Vec::new()),
            failure: Some(reason.to_string()),
        }
    }

    pub fn saved(&self) -> Vec<CapturedImage> {
        self.saved.lock().expect("lock poisoned").clone()
    }
}

impl PhotoLibrary for MemoryLibrary {
    fn save(&self, image: &CapturedImage) -> Result<SavedPhoto, CameraError> {
        if let Some(reason) = &self.failure {
            return Err(CameraError::Save(reason.clone()));
        }
        self.saved.lock().expect("lock poisoned").push(image.clone());
        Ok(SavedPhoto {
            location: format!("memory://{}", image.request_id()),
            size_bytes: image.jpeg().len(),
            saved_at: Utc::now(),
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum PresenterEvent {
    Alert(Alert),
    Dismissed(Screen),
}

#[derive(Debug, Default)]
pub struct RecordingPresenter {
    events: Mutex<Vec<PresenterEvent>>,
}

impl RecordingPresenter {
    pub fn events(&self) -> Vec<PresenterEvent> {
        self.events.lock().expect("lock poisoned").clone()
    }

    pub fn alerts(&self) -> Vec<Alert> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                PresenterEvent::Alert(alert) => Some(alert),
                PresenterEvent::Dismissed(_) => None,
            })
            .collect()
    }
}

impl Presenter for RecordingPresenter {
    fn present_alert(&self, alert: Alert) {
        self.events
            .lock()
            .expect("lock poisoned")
            .push(PresenterEvent::Alert(alert));
    }

    fn dismiss(&self, screen: Screen) {
        self.events
            .lock()
            .expect("lock poisoned")
            .push(PresenterEvent::Dismissed(screen));
    }
}

/// Small encoded photo from a synthetic back camera.
pub fn sample_photo() -> CapturedImage {
    let bitmap = RgbImage::from_fn(24, 32, |x, y| Rgb([x as u8 * 10, y as u8 * 8, 128]));
    let request = PhotoRequest {
        id: Uuid::new_v4(),
        flash_mode: FlashMode::Off,
        requested_at: Utc::now(),
    };
    CapturedImage::encode(
        &request,
        &Device::new("back-0", "Synthetic Back Camera", Facing::Back),
        bitmap,
        85,
    )
    .expect("encoding a synthetic photo")
}
