//! Modal alerts and screen dismissal.

use crate::errors::CameraError;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Screen {
    Camera,
    Preview,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertKind {
    Info,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Alert {
    pub title: String,
    pub message: String,
    pub kind: AlertKind,
}

impl Alert {
    pub fn saved() -> Self {
        Self {
            title: "Image Saved!".to_string(),
            message: "Your picture was successfully saved.".to_string(),
            kind: AlertKind::Info,
        }
    }

    pub fn from_error(error: &CameraError) -> Self {
        Self {
            title: error.alert_title().to_string(),
            message: error.to_string(),
            kind: AlertKind::Error,
        }
    }
}

pub trait Presenter: Send + Sync {
    fn present_alert(&self, alert: Alert);

    fn dismiss(&self, screen: Screen);
}

/// Presenter for headless use: alerts go to the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogPresenter;

impl Presenter for LogPresenter {
    fn present_alert(&self, alert: Alert) {
        match alert.kind {
            AlertKind::Info => log::info!("{}: {}", alert.title, alert.message),
            AlertKind::Error => log::error!("{}: {}", alert.title, alert.message),
        }
    }

    fn dismiss(&self, screen: Screen) {
        log::debug!("Dismissed {:?} screen", screen);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_save_failure_alert_does_not_claim_success() {
        let alert = Alert::from_error(&CameraError::Save("disk full".to_string()));
        assert_eq!(alert.title, "Save Failed");
        assert!(alert.message.contains("disk full"));
        assert_eq!(alert.kind, AlertKind::Error);
        assert_ne!(alert, Alert::saved());
    }

    #[test]
    fn test_alert_serializes_kind_lowercase() {
        let json = serde_json::to_string(&Alert::saved()).unwrap();
        assert!(json.contains("\"kind\":\"info\""));
    }
}
