//! Live preview surface.
//!
//! A [`PreviewLayer`] is fed by the session's frame pump and holds the most
//! recent frame already scaled to the view bounds. The UI polls it (or
//! waits on it) to paint the viewfinder.

use crate::errors::CameraError;
use crate::types::{CameraFrame, ViewBounds};
use image::{imageops, RgbImage};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Condvar, Mutex};
use std::time::{Duration, Instant};
use uuid::Uuid;

/// How frames are fitted into the layer bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VideoGravity {
    /// Fill the bounds, cropping whatever overflows
    ResizeAspectFill,
    /// Fit inside the bounds, letterboxing the remainder
    ResizeAspect,
    /// Stretch to the bounds
    Resize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VideoOrientation {
    Portrait,
    Landscape,
}

/// A frame as displayed by a preview layer.
#[derive(Debug, Clone, Serialize)]
pub struct PreviewFrame {
    pub sequence: u64,
    pub width: u32,
    pub height: u32,
    pub device_id: String,
    pub data: Vec<u8>,
}

struct LayerState {
    latest: Option<PreviewFrame>,
    rendered: u64,
}

struct LayerInner {
    id: Uuid,
    bounds: ViewBounds,
    gravity: VideoGravity,
    orientation: VideoOrientation,
    state: Mutex<LayerState>,
    cv: Condvar,
}

#[derive(Clone)]
pub struct PreviewLayer {
    inner: Arc<LayerInner>,
}

impl std::fmt::Debug for PreviewLayer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PreviewLayer")
            .field("id", &self.inner.id)
            .field("bounds", &self.inner.bounds)
            .field("gravity", &self.inner.gravity)
            .field("orientation", &self.inner.orientation)
            .finish()
    }
}

impl PreviewLayer {
    pub fn new(
        bounds: ViewBounds,
        gravity: VideoGravity,
        orientation: VideoOrientation,
    ) -> Result<Self, CameraError> {
        if bounds.is_empty() {
            return Err(CameraError::Initialization(format!(
                "Cannot create a {}x{} preview surface",
                bounds.width, bounds.height
            )));
        }

        Ok(Self {
            inner: Arc::new(LayerInner {
                id: Uuid::new_v4(),
                bounds,
                gravity,
                orientation,
                state: Mutex::new(LayerState {
                    latest: None,
                    rendered: 0,
                }),
                cv: Condvar::new(),
            }),
        })
    }

    pub fn id(&self) -> Uuid {
        self.inner.id
    }

    pub fn bounds(&self) -> ViewBounds {
        self.inner.bounds
    }

    pub fn gravity(&self) -> VideoGravity {
        self.inner.gravity
    }

    pub fn orientation(&self) -> VideoOrientation {
        self.inner.orientation
    }

    pub fn frames_rendered(&self) -> u64 {
        self.inner.state.lock().expect("lock poisoned").rendered
    }

    pub fn latest_frame(&self) -> Option<PreviewFrame> {
        self.inner.state.lock().expect("lock poisoned").latest.clone()
    }

    /// Wait for a frame newer than `after` (a previous `sequence`).
    pub fn wait_for_frame(&self, after: u64, timeout: Duration) -> Option<PreviewFrame> {
        let deadline = Instant::now() + timeout;
        let mut g = self.inner.state.lock().expect("lock poisoned");
        loop {
            if g.rendered > after {
                return g.latest.clone();
            }
            let now = Instant::now();
            if now >= deadline {
                return None;
            }
            let (ng, _) = self
                .inner
                .cv
                .wait_timeout(g, deadline - now)
                .expect("lock poisoned");
            g = ng;
        }
    }

    /// Scale `frame` into the bounds and publish it.
    pub(crate) fn render(&self, frame: &CameraFrame) {
        let source = RgbImage::from_raw(frame.width, frame.height, frame.data.clone())
            .filter(|image| image.width() > 0 && image.height() > 0);
        let Some(source) = source else {
            log::warn!(
                "Dropping malformed {}x{} frame from {}",
                frame.width,
                frame.height,
                frame.device_id
            );
            return;
        };

        let oriented = orient(source, self.inner.orientation);
        let bounds = self.inner.bounds;
        let fitted = match self.inner.gravity {
            VideoGravity::ResizeAspectFill => {
                let cropped = crop_to_aspect(&oriented, bounds.aspect_ratio());
                imageops::resize(&cropped, bounds.width, bounds.height, imageops::FilterType::Triangle)
            }
            VideoGravity::ResizeAspect => letterbox(&oriented, bounds),
            VideoGravity::Resize => {
                imageops::resize(&oriented, bounds.width, bounds.height, imageops::FilterType::Triangle)
            }
        };

        let mut g = self.inner.state.lock().expect("lock poisoned");
        g.rendered = g.rendered.saturating_add(1);
        g.latest = Some(PreviewFrame {
            sequence: g.rendered,
            width: fitted.width(),
            height: fitted.height(),
            device_id: frame.device_id.clone(),
            data: fitted.into_raw(),
        });
        self.inner.cv.notify_all();
    }

    /// Shape a still the way this layer shows it, at full resolution.
    pub(crate) fn frame_still(&self, still: RgbImage) -> RgbImage {
        let oriented = orient(still, self.inner.orientation);
        match self.inner.gravity {
            VideoGravity::ResizeAspectFill => crop_to_aspect(&oriented, self.inner.bounds.aspect_ratio()),
            VideoGravity::ResizeAspect | VideoGravity::Resize => oriented,
        }
    }
}

/// Rotate landscape sources upright for portrait, and vice versa.
pub fn orient(image: RgbImage, orientation: VideoOrientation) -> RgbImage {
    let landscape = image.width() > image.height();
    match orientation {
        VideoOrientation::Portrait if landscape => imageops::rotate90(&image),
        VideoOrientation::Landscape if image.height() > image.width() => imageops::rotate270(&image),
        _ => image,
    }
}

/// Centered `(x, y, width, height)` of the largest `aspect` rectangle inside
/// a `width` x `height` source.
pub fn fill_crop_rect(width: u32, height: u32, aspect: f64) -> (u32, u32, u32, u32) {
    if width == 0 || height == 0 {
        return (0, 0, width, height);
    }
    let source_aspect = width as f64 / height as f64;
    if source_aspect > aspect {
        let w = ((height as f64 * aspect).round() as u32).clamp(1, width);
        ((width - w) / 2, 0, w, height)
    } else {
        let h = ((width as f64 / aspect).round() as u32).clamp(1, height);
        (0, (height - h) / 2, width, h)
    }
}

fn crop_to_aspect(image: &RgbImage, aspect: f64) -> RgbImage {
    let (x, y, w, h) = fill_crop_rect(image.width(), image.height(), aspect);
    imageops::crop_imm(image, x, y, w, h).to_image()
}

fn letterbox(image: &RgbImage, bounds: ViewBounds) -> RgbImage {
    let scale = f64::min(
        bounds.width as f64 / image.width() as f64,
        bounds.height as f64 / image.height() as f64,
    );
    let w = ((image.width() as f64 * scale).round() as u32).clamp(1, bounds.width);
    let h = ((image.height() as f64 * scale).round() as u32).clamp(1, bounds.height);
    let scaled = imageops::resize(image, w, h, imageops::FilterType::Triangle);

    let mut canvas = RgbImage::new(bounds.width, bounds.height);
    imageops::overlay(
        &mut canvas,
        &scaled,
        ((bounds.width - w) / 2) as i64,
        ((bounds.height - h) / 2) as i64,
    );
    canvas
}
