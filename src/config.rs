//! Configuration management for snapcam
//!
//! Provides loading, saving and validation for the camera screen, the
//! live preview and photo storage. Values come from `snapcam.toml` with
//! `SNAPCAM_*` environment overrides layered on top.

use crate::errors::CameraError;
use crate::session::{SessionPreset, VideoGravity, VideoOrientation};
use crate::types::Facing;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Root configuration structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapcamConfig {
    pub camera: CameraConfig,
    pub preview: PreviewConfig,
    pub storage: StorageConfig,
}

/// Camera screen configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CameraConfig {
    /// Output quality preset applied by `configure_session`
    pub preset: SessionPreset,
    /// Facing selected when the camera screen opens
    pub default_facing: Facing,
    /// Initial state of the flash toggle
    pub flash_enabled: bool,
    /// Device id forced to the front position, overriding name detection
    pub front_device: Option<String>,
    /// Device id forced to the back position, overriding name detection
    pub back_device: Option<String>,
    /// How long `stop` waits for the frame pump to exit
    pub stop_timeout_ms: u64,
    /// Refuse to open inputs when the OS reports camera access denied
    pub require_permission: bool,
}

/// Live preview configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PreviewConfig {
    pub gravity: VideoGravity,
    pub orientation: VideoOrientation,
}

/// Photo library configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Directory saved photos are written to
    pub output_directory: String,
    /// Put each photo in a per-day subdirectory
    pub auto_organize_by_date: bool,
    /// chrono format string for the per-day subdirectory
    pub date_format: String,
    /// JPEG quality (1-100)
    pub jpeg_quality: u8,
    /// File name prefix for saved photos
    pub file_prefix: String,
}

impl Default for SnapcamConfig {
    fn default() -> Self {
        Self {
            camera: CameraConfig {
                preset: SessionPreset::Photo,
                default_facing: Facing::Back,
                flash_enabled: false,
                front_device: None,
                back_device: None,
                stop_timeout_ms: 2000,
                require_permission: true,
            },
            preview: PreviewConfig {
                gravity: VideoGravity::ResizeAspectFill,
                orientation: VideoOrientation::Portrait,
            },
            storage: StorageConfig {
                output_directory: default_output_directory(),
                auto_organize_by_date: true,
                date_format: "%Y-%m-%d".to_string(),
                jpeg_quality: 92,
                file_prefix: "IMG".to_string(),
            },
        }
    }
}

fn default_output_directory() -> String {
    dirs::picture_dir()
        .map(|dir| dir.join("Snapcam"))
        .unwrap_or_else(|| PathBuf::from("./captures"))
        .to_string_lossy()
        .to_string()
}

impl SnapcamConfig {
    /// Load configuration from a TOML file, then apply `SNAPCAM_*` overrides.
    ///
    /// A missing file is not an error: defaults are used for every key the
    /// environment does not set. Nested keys use a double underscore, e.g.
    /// `SNAPCAM_STORAGE__JPEG_QUALITY=80`.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, CameraError> {
        let path = path.as_ref();

        if !path.exists() {
            log::info!("Config file not found at {:?}, using defaults", path);
        }

        let defaults = config::Config::try_from(&Self::default())
            .map_err(|e| CameraError::Config(format!("Failed to build defaults: {}", e)))?;

        let loaded: SnapcamConfig = config::Config::builder()
            .add_source(defaults)
            .add_source(config::File::from(path).format(config::FileFormat::Toml).required(false))
            .add_source(
                config::Environment::with_prefix("SNAPCAM")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .and_then(|c| c.try_deserialize())
            .map_err(|e| CameraError::Config(format!("Failed to parse config file: {}", e)))?;

        loaded.validate().map_err(CameraError::Config)?;
        log::debug!("Loaded configuration from {:?}", path);
        Ok(loaded)
    }

    /// Save configuration to TOML file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), CameraError> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                CameraError::Config(format!("Failed to create config directory: {}", e))
            })?;
        }

        let toml_string = toml::to_string_pretty(self)
            .map_err(|e| CameraError::Config(format!("Failed to serialize config: {}", e)))?;

        fs::write(path, toml_string)
            .map_err(|e| CameraError::Config(format!("Failed to write config file: {}", e)))?;

        log::info!("Saved configuration to {:?}", path);
        Ok(())
    }

    /// Get default config file path
    pub fn default_path() -> PathBuf {
        PathBuf::from("snapcam.toml")
    }

    /// Load from default location or fall back to defaults
    pub fn load_or_default() -> Self {
        Self::load_from_file(Self::default_path()).unwrap_or_else(|e| {
            log::warn!("Failed to load config, using defaults: {}", e);
            Self::default()
        })
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), String> {
        if self.camera.stop_timeout_ms == 0 {
            return Err("Stop timeout must be greater than zero".to_string());
        }
        if let (Some(front), Some(back)) = (&self.camera.front_device, &self.camera.back_device) {
            if front == back {
                return Err(format!(
                    "Device {} cannot be both the front and the back camera",
                    front
                ));
            }
        }

        if self.storage.output_directory.trim().is_empty() {
            return Err("Output directory must not be empty".to_string());
        }
        if self.storage.jpeg_quality == 0 || self.storage.jpeg_quality > 100 {
            return Err("JPEG quality must be between 1 and 100".to_string());
        }
        if self.storage.file_prefix.contains(['/', '\\']) {
            return Err("File prefix must not contain path separators".to_string());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = SnapcamConfig::default();
        assert_eq!(config.camera.preset, SessionPreset::Photo);
        assert_eq!(config.camera.default_facing, Facing::Back);
        assert!(!config.camera.flash_enabled);
        assert_eq!(config.preview.gravity, VideoGravity::ResizeAspectFill);
        assert_eq!(config.preview.orientation, VideoOrientation::Portrait);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation() {
        let mut bad_quality = SnapcamConfig::default();
        bad_quality.storage.jpeg_quality = 0;
        assert!(bad_quality.validate().is_err());

        let mut same_device = SnapcamConfig::default();
        same_device.camera.front_device = Some("0".to_string());
        same_device.camera.back_device = Some("0".to_string());
        assert!(same_device.validate().is_err());

        let mut bad_prefix = SnapcamConfig::default();
        bad_prefix.storage.file_prefix = "a/b".to_string();
        assert!(bad_prefix.validate().is_err());
    }

    #[test]
    fn test_config_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let config_path = dir.path().join("snapcam.toml");

        let mut config = SnapcamConfig::default();
        config.camera.flash_enabled = true;
        config.storage.jpeg_quality = 75;
        config.camera.front_device = Some("2".to_string());
        assert!(config.save_to_file(&config_path).is_ok());

        let loaded = SnapcamConfig::load_from_file(&config_path).unwrap();
        assert!(loaded.camera.flash_enabled);
        assert_eq!(loaded.storage.jpeg_quality, 75);
        assert_eq!(loaded.camera.front_device.as_deref(), Some("2"));
    }

    #[test]
    fn test_config_toml_format() {
        let config = SnapcamConfig::default();
        let toml_string = toml::to_string_pretty(&config).unwrap();

        assert!(toml_string.contains("[camera]"));
        assert!(toml_string.contains("[preview]"));
        assert!(toml_string.contains("[storage]"));
        assert!(toml_string.contains("preset = \"photo\""));
        assert!(toml_string.contains("gravity = \"resize_aspect_fill\""));
    }

    #[test]
    fn test_load_nonexistent_file() {
        let result = SnapcamConfig::load_from_file("nonexistent_snapcam.toml");
        assert!(result.is_ok());
        assert_eq!(result.unwrap().storage.jpeg_quality, 92);
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config_path = dir.path().join("partial.toml");
        fs::write(&config_path, "[camera]\ndefault_facing = \"front\"\n").unwrap();

        let loaded = SnapcamConfig::load_from_file(&config_path).unwrap();
        assert_eq!(loaded.camera.default_facing, Facing::Front);
        assert_eq!(loaded.camera.preset, SessionPreset::Photo);
        assert_eq!(loaded.storage.file_prefix, "IMG");
    }

    #[test]
    fn test_invalid_file_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let config_path = dir.path().join("bad.toml");
        fs::write(&config_path, "[storage]\njpeg_quality = 0\n").unwrap();

        assert!(matches!(
            SnapcamConfig::load_from_file(&config_path),
            Err(CameraError::Config(_))
        ));
    }
}
