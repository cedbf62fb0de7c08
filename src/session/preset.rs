use crate::types::Resolution;
use serde::{Deserialize, Serialize};

/// Output quality requested from the input when a device is opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionPreset {
    /// Highest resolution the device offers, for stills
    #[default]
    Photo,
    High,
    /// Suitable for sharing over WiFi
    Medium,
    /// Suitable for sharing over slow mobile links
    Low,
    Vga640x480,
    Hd1280x720,
    Hd1920x1080,
    Uhd3840x2160,
}

impl SessionPreset {
    /// Resolution to request, or `None` for "highest available".
    pub fn resolution(&self) -> Option<Resolution> {
        match self {
            SessionPreset::Photo => None,
            SessionPreset::High | SessionPreset::Hd1920x1080 => Some(Resolution::new(1920, 1080)),
            SessionPreset::Medium => Some(Resolution::new(480, 360)),
            SessionPreset::Low => Some(Resolution::new(192, 144)),
            SessionPreset::Vga640x480 => Some(Resolution::new(640, 480)),
            SessionPreset::Hd1280x720 => Some(Resolution::new(1280, 720)),
            SessionPreset::Uhd3840x2160 => Some(Resolution::new(3840, 2160)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_photo_requests_highest() {
        assert_eq!(SessionPreset::Photo.resolution(), None);
        assert_eq!(SessionPreset::default(), SessionPreset::Photo);
    }

    #[test]
    fn test_fixed_presets() {
        assert_eq!(
            SessionPreset::Hd1280x720.resolution(),
            Some(Resolution::new(1280, 720))
        );
        assert_eq!(
            SessionPreset::Vga640x480.resolution(),
            Some(Resolution::new(640, 480))
        );
    }
}
