//! Photo library: where saved photos end up.

use crate::config::StorageConfig;
use crate::errors::CameraError;
use crate::photo::CapturedImage;
use chrono::{DateTime, Local, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Receipt for a persisted photo.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedPhoto {
    pub location: String,
    pub size_bytes: usize,
    pub saved_at: DateTime<Utc>,
}

pub trait PhotoLibrary: Send + Sync {
    /// Persist the photo's JPEG bytes. Blocking.
    fn save(&self, image: &CapturedImage) -> Result<SavedPhoto, CameraError>;
}

/// Writes photos as JPEG files under a root directory.
#[derive(Debug, Clone)]
pub struct FileSystemLibrary {
    root: PathBuf,
    organize_by_date: bool,
    date_format: String,
    file_prefix: String,
}

impl FileSystemLibrary {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            organize_by_date: false,
            date_format: "%Y-%m-%d".to_string(),
            file_prefix: "IMG".to_string(),
        }
    }

    pub fn from_config(config: &StorageConfig) -> Self {
        Self {
            root: PathBuf::from(&config.output_directory),
            organize_by_date: config.auto_organize_by_date,
            date_format: config.date_format.clone(),
            file_prefix: config.file_prefix.clone(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Destination for `image`; unique per capture request.
    pub fn path_for(&self, image: &CapturedImage) -> PathBuf {
        let taken = image.captured_at().with_timezone(&Local);
        let dir = if self.organize_by_date {
            self.root.join(taken.format(&self.date_format).to_string())
        } else {
            self.root.clone()
        };

        let id = image.request_id().simple().to_string();
        dir.join(format!(
            "{}_{}_{}.jpg",
            self.file_prefix,
            taken.format("%Y%m%d_%H%M%S"),
            &id[..8]
        ))
    }
}

impl PhotoLibrary for FileSystemLibrary {
    fn save(&self, image: &CapturedImage) -> Result<SavedPhoto, CameraError> {
        let path = self.path_for(image);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                CameraError::Save(format!("Cannot create {}: {}", parent.display(), e))
            })?;
        }

        // Write next to the target and rename, so a failed write never
        // leaves a truncated photo behind.
        let partial = path.with_extension("jpg.part");
        fs::write(&partial, image.jpeg())
            .and_then(|_| fs::rename(&partial, &path))
            .map_err(|e| {
                let _ = fs::remove_file(&partial);
                CameraError::Save(format!("Cannot write {}: {}", path.display(), e))
            })?;

        log::info!("Saved photo to {}", path.display());
        Ok(SavedPhoto {
            location: path.to_string_lossy().to_string(),
            size_bytes: image.jpeg().len(),
            saved_at: Utc::now(),
        })
    }
}
