//! Core value types shared by the session, the controllers and the commands.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Physical position of a camera relative to the screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Facing {
    Front,
    Back,
}

impl Facing {
    pub fn opposite(self) -> Self {
        match self {
            Facing::Front => Facing::Back,
            Facing::Back => Facing::Front,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Facing::Front => "front",
            Facing::Back => "back",
        }
    }
}

impl fmt::Display for Facing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind of capture hardware a device represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeviceType {
    BuiltInWideAngleCamera,
    External,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MediaType {
    Video,
    Audio,
}

/// A camera as reported by the backend at enumeration time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Device {
    pub id: String,
    pub name: String,
    pub facing: Facing,
    pub device_type: DeviceType,
    pub media_types: Vec<MediaType>,
}

impl Device {
    pub fn new(id: impl Into<String>, name: impl Into<String>, facing: Facing) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            facing,
            device_type: DeviceType::BuiltInWideAngleCamera,
            media_types: vec![MediaType::Video],
        }
    }

    pub fn with_device_type(mut self, device_type: DeviceType) -> Self {
        self.device_type = device_type;
        self
    }

    pub fn with_media_types(mut self, media_types: Vec<MediaType>) -> Self {
        self.media_types = media_types;
        self
    }

    pub fn supports(&self, media_type: MediaType) -> bool {
        self.media_types.contains(&media_type)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlashMode {
    On,
    #[default]
    Off,
}

impl FlashMode {
    pub fn from_enabled(enabled: bool) -> Self {
        if enabled {
            FlashMode::On
        } else {
            FlashMode::Off
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FlashMode::On => "on",
            FlashMode::Off => "off",
        }
    }
}

impl fmt::Display for FlashMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Settings for one still capture. Created per button press.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhotoRequest {
    pub id: Uuid,
    pub flash_mode: FlashMode,
    pub requested_at: DateTime<Utc>,
}

impl PhotoRequest {
    pub fn new(flash_mode: FlashMode) -> Self {
        Self {
            id: Uuid::new_v4(),
            flash_mode,
            requested_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resolution {
    pub width: u32,
    pub height: u32,
}

impl Resolution {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

/// Size of the view a preview layer fills.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewBounds {
    pub width: u32,
    pub height: u32,
}

impl ViewBounds {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    pub fn aspect_ratio(&self) -> f64 {
        self.width as f64 / self.height as f64
    }
}

/// Raw RGB8 frame produced by a camera input.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CameraFrame {
    pub id: String,
    pub data: Vec<u8>,
    pub width: u32,
    pub height: u32,
    pub format: String,
    pub timestamp: DateTime<Utc>,
    pub device_id: String,
    pub size_bytes: usize,
}

impl CameraFrame {
    pub fn new(data: Vec<u8>, width: u32, height: u32, device_id: String) -> Self {
        let size_bytes = data.len();
        Self {
            id: Uuid::new_v4().to_string(),
            data,
            width,
            height,
            format: "RGB8".to_string(),
            timestamp: Utc::now(),
            device_id,
            size_bytes,
        }
    }

    pub fn with_format(mut self, format: String) -> Self {
        self.format = format;
        self
    }

    /// Frame data length matches an RGB8 buffer of the stated size.
    pub fn is_valid(&self) -> bool {
        self.width > 0
            && self.height > 0
            && self.data.len() == (self.width as usize) * (self.height as usize) * 3
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Platform {
    Windows,
    MacOS,
    Linux,
    Unknown,
}

impl Platform {
    pub fn current() -> Self {
        if cfg!(target_os = "windows") {
            Platform::Windows
        } else if cfg!(target_os = "macos") {
            Platform::MacOS
        } else if cfg!(target_os = "linux") {
            Platform::Linux
        } else {
            Platform::Unknown
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Windows => "windows",
            Platform::MacOS => "macos",
            Platform::Linux => "linux",
            Platform::Unknown => "unknown",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_facing_opposite() {
        assert_eq!(Facing::Front.opposite(), Facing::Back);
        assert_eq!(Facing::Back.opposite().opposite(), Facing::Back);
    }

    #[test]
    fn test_flash_mode_from_enabled() {
        assert_eq!(FlashMode::from_enabled(true), FlashMode::On);
        assert_eq!(FlashMode::from_enabled(false), FlashMode::Off);
        assert_eq!(FlashMode::default(), FlashMode::Off);
    }

    #[test]
    fn test_photo_requests_are_unique() {
        let a = PhotoRequest::new(FlashMode::On);
        let b = PhotoRequest::new(FlashMode::On);
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn test_frame_validity() {
        let frame = CameraFrame::new(vec![0; 4 * 2 * 3], 4, 2, "cam".to_string());
        assert!(frame.is_valid());
        assert_eq!(frame.size_bytes, 24);

        let short = CameraFrame::new(vec![0; 5], 4, 2, "cam".to_string());
        assert!(!short.is_valid());
    }

    #[test]
    fn test_empty_bounds() {
        assert!(ViewBounds::new(0, 100).is_empty());
        assert!(!ViewBounds::new(390, 844).is_empty());
    }
}
