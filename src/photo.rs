//! Captured photos and their JPEG encoding.

use crate::errors::CameraError;
use crate::types::{Device, Facing, FlashMode, PhotoRequest};
use bytes::Bytes;
use chrono::{DateTime, Utc};
use image::{codecs::jpeg::JpegEncoder, DynamicImage, ImageFormat, RgbImage};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

/// One still: encoded JPEG bytes plus the bitmap decoded from them.
///
/// Cloning is cheap; both buffers are shared.
#[derive(Clone)]
pub struct CapturedImage {
    request_id: Uuid,
    jpeg: Bytes,
    bitmap: Arc<RgbImage>,
    flash_mode: FlashMode,
    device_id: String,
    facing: Facing,
    captured_at: DateTime<Utc>,
}

impl std::fmt::Debug for CapturedImage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CapturedImage")
            .field("request_id", &self.request_id)
            .field("size", &(self.width(), self.height()))
            .field("jpeg_bytes", &self.jpeg.len())
            .field("flash_mode", &self.flash_mode)
            .field("device_id", &self.device_id)
            .finish()
    }
}

/// Serializable summary of a [`CapturedImage`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhotoInfo {
    pub request_id: Uuid,
    pub width: u32,
    pub height: u32,
    pub size_bytes: usize,
    pub flash_mode: FlashMode,
    pub device_id: String,
    pub facing: Facing,
    pub captured_at: DateTime<Utc>,
}

impl CapturedImage {
    /// Encode `still` and decode it back, so the bitmap is exactly what the
    /// bytes hold.
    pub fn encode(
        request: &PhotoRequest,
        device: &Device,
        still: RgbImage,
        jpeg_quality: u8,
    ) -> Result<Self, CameraError> {
        let jpeg = encode_jpeg(still, jpeg_quality)?;
        Self::from_jpeg(request, device, Bytes::from(jpeg))
    }

    /// Wrap a buffer that is already JPEG encoded.
    pub fn from_jpeg(
        request: &PhotoRequest,
        device: &Device,
        jpeg: Bytes,
    ) -> Result<Self, CameraError> {
        if !is_jpeg(&jpeg) {
            return Err(CameraError::Capture(
                "photo buffer is not a JPEG image".to_string(),
            ));
        }
        let bitmap = decode_jpeg(&jpeg)?;
        if bitmap.width() == 0 || bitmap.height() == 0 {
            return Err(CameraError::Capture("photo decoded to an empty bitmap".to_string()));
        }

        Ok(Self {
            request_id: request.id,
            jpeg,
            bitmap: Arc::new(bitmap),
            flash_mode: request.flash_mode,
            device_id: device.id.clone(),
            facing: device.facing,
            captured_at: Utc::now(),
        })
    }

    pub fn request_id(&self) -> Uuid {
        self.request_id
    }

    pub fn jpeg(&self) -> &Bytes {
        &self.jpeg
    }

    pub fn bitmap(&self) -> &RgbImage {
        &self.bitmap
    }

    pub fn width(&self) -> u32 {
        self.bitmap.width()
    }

    pub fn height(&self) -> u32 {
        self.bitmap.height()
    }

    pub fn aspect_ratio(&self) -> f64 {
        self.width() as f64 / self.height() as f64
    }

    pub fn flash_mode(&self) -> FlashMode {
        self.flash_mode
    }

    pub fn device_id(&self) -> &str {
        &self.device_id
    }

    pub fn facing(&self) -> Facing {
        self.facing
    }

    pub fn captured_at(&self) -> DateTime<Utc> {
        self.captured_at
    }

    pub fn info(&self) -> PhotoInfo {
        PhotoInfo {
            request_id: self.request_id,
            width: self.width(),
            height: self.height(),
            size_bytes: self.jpeg.len(),
            flash_mode: self.flash_mode,
            device_id: self.device_id.clone(),
            facing: self.facing,
            captured_at: self.captured_at,
        }
    }
}

pub fn encode_jpeg(image: RgbImage, quality: u8) -> Result<Vec<u8>, CameraError> {
    let mut buf = Vec::new();
    let encoder = JpegEncoder::new_with_quality(&mut buf, quality.clamp(1, 100));
    DynamicImage::ImageRgb8(image).write_with_encoder(encoder)?;
    Ok(buf)
}

pub fn decode_jpeg(bytes: &[u8]) -> Result<RgbImage, CameraError> {
    Ok(image::load_from_memory_with_format(bytes, ImageFormat::Jpeg)?.to_rgb8())
}

/// SOI marker at the start and EOI marker at the end.
pub fn is_jpeg(bytes: &[u8]) -> bool {
    bytes.len() >= 4 && bytes.starts_with(&[0xFF, 0xD8, 0xFF]) && bytes.ends_with(&[0xFF, 0xD9])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gradient(width: u32, height: u32) -> RgbImage {
        RgbImage::from_fn(width, height, |x, y| {
            image::Rgb([(x % 256) as u8, (y % 256) as u8, ((x + y) % 256) as u8])
        })
    }

    #[test]
    fn test_encode_produces_valid_jpeg() {
        let request = PhotoRequest::new(FlashMode::On);
        let device = Device::new("0", "Test", Facing::Back);
        let image = CapturedImage::encode(&request, &device, gradient(64, 96), 90).unwrap();

        assert!(is_jpeg(image.jpeg()));
        assert_eq!((image.width(), image.height()), (64, 96));
        assert_eq!(image.flash_mode(), FlashMode::On);
        assert_eq!(image.request_id(), request.id);
        assert_eq!(image.facing(), Facing::Back);
    }

    #[test]
    fn test_non_jpeg_buffer_rejected() {
        let request = PhotoRequest::new(FlashMode::Off);
        let device = Device::new("0", "Test", Facing::Front);
        let result = CapturedImage::from_jpeg(&request, &device, Bytes::from_static(b"not a photo"));
        assert!(matches!(result, Err(CameraError::Capture(_))));
    }

    #[test]
    fn test_info_reports_size() {
        let request = PhotoRequest::new(FlashMode::Off);
        let device = Device::new("1", "Test", Facing::Front);
        let image = CapturedImage::encode(&request, &device, gradient(32, 32), 80).unwrap();
        let info = image.info();
        assert_eq!(info.size_bytes, image.jpeg().len());
        assert_eq!(info.device_id, "1");
        assert_eq!(info.flash_mode, FlashMode::Off);
    }
}
