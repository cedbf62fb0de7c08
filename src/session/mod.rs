//! Capture session: one input, one photo output, any number of preview
//! layers, and the pump thread that moves frames between them.
//!
//! Changes made between [`CaptureSession::begin_configuration`] and
//! [`CaptureSession::commit_configuration`] are invisible to frame
//! delivery: the pump parks while a bracket is open, and photo requests
//! that arrive meanwhile wait for the commit.

pub mod layer;
pub mod output;
pub mod preset;

pub use layer::{PreviewFrame, PreviewLayer, VideoGravity, VideoOrientation};
pub use output::{PhotoOutput, PhotoTicket};
pub use preset::SessionPreset;

use crate::errors::CameraError;
use crate::photo::CapturedImage;
use crate::platform::CameraInput;
use crate::types::{Device, PhotoRequest};
use image::RgbImage;
use output::PhotoCompletion;
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Condvar, Mutex, MutexGuard};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};
use uuid::Uuid;

const PARK_INTERVAL: Duration = Duration::from_millis(50);
const FRAME_ERROR_BACKOFF: Duration = Duration::from_millis(20);
const PUMP_YIELD: Duration = Duration::from_millis(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SessionState {
    Unconfigured,
    Configured,
    Running,
    Stopped,
}

#[derive(Debug, Clone, Serialize)]
pub struct SessionStatus {
    pub state: SessionState,
    pub preset: Option<SessionPreset>,
    pub input: Option<Device>,
    pub outputs: usize,
    pub preview_layers: usize,
    pub reconfiguring: bool,
    pub frames_delivered: u64,
}

struct SessionInner {
    state: SessionState,
    preset: Option<SessionPreset>,
    inputs: Vec<Box<dyn CameraInput>>,
    outputs: Vec<PhotoOutput>,
    layers: Vec<PreviewLayer>,
    config_depth: u32,
    frames_delivered: u64,
}

struct Shared {
    inner: Mutex<SessionInner>,
    cv: Condvar,
    stop_flag: AtomicBool,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, SessionInner> {
        self.inner.lock().expect("lock poisoned")
    }
}

pub struct CaptureSession {
    shared: Arc<Shared>,
    pump: Option<JoinHandle<()>>,
    stop_timeout: Duration,
}

impl Default for CaptureSession {
    fn default() -> Self {
        Self::new()
    }
}

impl CaptureSession {
    pub fn new() -> Self {
        Self {
            shared: Arc::new(Shared {
                inner: Mutex::new(SessionInner {
                    state: SessionState::Unconfigured,
                    preset: None,
                    inputs: Vec::new(),
                    outputs: Vec::new(),
                    layers: Vec::new(),
                    config_depth: 0,
                    frames_delivered: 0,
                }),
                cv: Condvar::new(),
                stop_flag: AtomicBool::new(false),
            }),
            pump: None,
            stop_timeout: Duration::from_secs(2),
        }
    }

    pub fn with_stop_timeout(mut self, timeout: Duration) -> Self {
        self.stop_timeout = timeout;
        self
    }

    pub fn state(&self) -> SessionState {
        self.shared.lock().state
    }

    pub fn is_running(&self) -> bool {
        self.state() == SessionState::Running
    }

    pub fn preset(&self) -> Option<SessionPreset> {
        self.shared.lock().preset
    }

    pub fn set_preset(&mut self, preset: SessionPreset) {
        let mut g = self.shared.lock();
        g.preset = Some(preset);
        if g.state == SessionState::Unconfigured {
            g.state = SessionState::Configured;
        }
        log::debug!("Session preset set to {:?}", preset);
    }

    pub fn status(&self) -> SessionStatus {
        let g = self.shared.lock();
        SessionStatus {
            state: g.state,
            preset: g.preset,
            input: g.inputs.first().map(|i| i.device().clone()),
            outputs: g.outputs.len(),
            preview_layers: g.layers.len(),
            reconfiguring: g.config_depth > 0,
            frames_delivered: g.frames_delivered,
        }
    }

    pub fn input_count(&self) -> usize {
        self.shared.lock().inputs.len()
    }

    pub fn output_count(&self) -> usize {
        self.shared.lock().outputs.len()
    }

    pub fn input_device(&self) -> Option<Device> {
        self.shared.lock().inputs.first().map(|i| i.device().clone())
    }

    pub fn can_add_input(&self) -> bool {
        self.shared.lock().inputs.is_empty()
    }

    pub fn can_add_output(&self) -> bool {
        self.shared.lock().outputs.is_empty()
    }

    pub fn frames_delivered(&self) -> u64 {
        self.shared.lock().frames_delivered
    }

    pub fn add_input(&mut self, mut input: Box<dyn CameraInput>) -> Result<(), CameraError> {
        let mut g = self.shared.lock();
        if !g.inputs.is_empty() {
            return Err(CameraError::SessionConfiguration(format!(
                "cannot add {}: session already has an input",
                input.device().name
            )));
        }
        if g.state == SessionState::Running {
            input.start()?;
        }
        log::debug!("Added input {}", input.device().name);
        g.inputs.push(input);
        self.shared.cv.notify_all();
        Ok(())
    }

    /// Detach every input, stopping its stream. Returns how many were removed.
    pub fn remove_all_inputs(&mut self) -> usize {
        let mut removed: Vec<_> = self.shared.lock().inputs.drain(..).collect();
        for input in removed.iter_mut() {
            stop_input(input);
        }
        removed.len()
    }

    pub fn add_output(&mut self, output: PhotoOutput) -> Result<(), CameraError> {
        let mut g = self.shared.lock();
        if !g.outputs.is_empty() {
            return Err(CameraError::SessionConfiguration(
                "session already has a photo output".to_string(),
            ));
        }
        g.outputs.push(output);
        Ok(())
    }

    pub fn remove_all_outputs(&mut self) -> usize {
        let mut g = self.shared.lock();
        let count = g.outputs.len();
        g.outputs.clear();
        count
    }

    pub fn add_preview_layer(&mut self, layer: PreviewLayer) {
        let mut g = self.shared.lock();
        if g.layers.iter().all(|l| l.id() != layer.id()) {
            g.layers.push(layer);
        }
    }

    pub fn remove_preview_layer(&mut self, id: Uuid) -> bool {
        let mut g = self.shared.lock();
        let before = g.layers.len();
        g.layers.retain(|l| l.id() != id);
        g.layers.len() != before
    }

    /// Open a reconfiguration bracket. Brackets nest.
    pub fn begin_configuration(&mut self) {
        let mut g = self.shared.lock();
        g.config_depth += 1;
        log::debug!("Begin configuration (depth {})", g.config_depth);
    }

    /// Close the innermost bracket; the outermost commit resumes delivery.
    pub fn commit_configuration(&mut self) -> Result<(), CameraError> {
        let mut g = self.shared.lock();
        if g.config_depth == 0 {
            return Err(CameraError::InvalidState(
                "commit without a matching begin".to_string(),
            ));
        }
        g.config_depth -= 1;
        log::debug!("Commit configuration (depth {})", g.config_depth);
        if g.config_depth == 0 {
            self.shared.cv.notify_all();
        }
        Ok(())
    }

    pub fn is_reconfiguring(&self) -> bool {
        self.shared.lock().config_depth > 0
    }

    pub fn start_running(&mut self) -> Result<(), CameraError> {
        {
            let mut g = self.shared.lock();
            match g.state {
                SessionState::Unconfigured => {
                    return Err(CameraError::InvalidState(
                        "session has no preset; configure it before starting".to_string(),
                    ))
                }
                SessionState::Running => return Ok(()),
                SessionState::Configured | SessionState::Stopped => {}
            }

            for input in g.inputs.iter_mut() {
                input.start()?;
            }
            g.state = SessionState::Running;
        }

        self.shared.stop_flag.store(false, Ordering::Relaxed);
        let shared = self.shared.clone();
        let handle = std::thread::Builder::new()
            .name("snapcam-frame-pump".to_string())
            .spawn(move || frame_pump(shared))
            .map_err(|e| {
                self.shared.lock().state = SessionState::Stopped;
                CameraError::SessionConfiguration(format!("spawn failed: {e}"))
            })?;
        self.pump = Some(handle);

        log::info!("Capture session running");
        Ok(())
    }

    pub fn stop_running(&mut self) -> Result<(), CameraError> {
        if self.state() != SessionState::Running {
            return Ok(());
        }

        self.shared.stop_flag.store(true, Ordering::Relaxed);
        self.shared.cv.notify_all();

        if let Some(handle) = self.pump.take() {
            let start = Instant::now();
            while !handle.is_finished() {
                if start.elapsed() >= self.stop_timeout {
                    // Keep the handle so a later stop can retry.
                    self.pump = Some(handle);
                    return Err(CameraError::InvalidState(
                        "frame pump did not stop in time".to_string(),
                    ));
                }
                std::thread::sleep(Duration::from_millis(5));
            }
            let _ = handle.join();
        }

        let mut g = self.shared.lock();
        for input in g.inputs.iter_mut() {
            stop_input(input);
        }
        g.state = SessionState::Stopped;
        log::info!("Capture session stopped");
        Ok(())
    }

    /// Queue one still. The ticket resolves once the photo is encoded, or
    /// with a `Capture` error.
    pub fn capture_photo(&self, request: PhotoRequest) -> Result<PhotoTicket, CameraError> {
        {
            let g = self.shared.lock();
            if g.state != SessionState::Running {
                return Err(CameraError::Capture("session is not running".to_string()));
            }
            // Mid-bracket the wiring is in flux; the worker checks after commit.
            if g.config_depth == 0 {
                check_capture_wiring(&g)?;
            }
        }

        let (completion, ticket) = PhotoTicket::channel(request.clone());
        let shared = self.shared.clone();
        std::thread::Builder::new()
            .name("snapcam-photo".to_string())
            .spawn(move || completion.complete(take_photo(&shared, &request)))
            .map_err(|e| CameraError::Capture(format!("spawn failed: {e}")))?;

        Ok(ticket)
    }
}

impl Drop for CaptureSession {
    fn drop(&mut self) {
        if let Err(e) = self.stop_running() {
            log::warn!("Error stopping session in drop: {}", e);
        }
        self.remove_all_inputs();
    }
}

fn stop_input(input: &mut Box<dyn CameraInput>) {
    if input.is_streaming() {
        if let Err(e) = input.stop() {
            log::warn!("Failed to stop input {}: {}", input.device().name, e);
        }
    }
}

fn check_capture_wiring(g: &SessionInner) -> Result<(), CameraError> {
    if g.outputs.is_empty() {
        return Err(CameraError::Capture("no photo output attached".to_string()));
    }
    if g.inputs.is_empty() {
        return Err(CameraError::Capture("no camera input attached".to_string()));
    }
    Ok(())
}

fn take_photo(shared: &Shared, request: &PhotoRequest) -> Result<CapturedImage, CameraError> {
    let (device, still, quality) = {
        let mut g = shared.lock();
        while g.config_depth > 0 {
            g = shared.cv.wait(g).expect("lock poisoned");
        }
        check_capture_wiring(&g)?;

        let quality = g.outputs[0].jpeg_quality();
        let layer = g.layers.first().cloned();
        let input = &mut g.inputs[0];
        let device = input.device().clone();
        let frame = input
            .capture_still(request.flash_mode)?
            .ok_or_else(|| CameraError::Capture("platform returned no photo buffer".to_string()))?;

        let still = RgbImage::from_raw(frame.width, frame.height, frame.data)
            .filter(|image| image.width() > 0 && image.height() > 0)
            .ok_or_else(|| {
                CameraError::Capture(format!(
                    "unusable {}x{} photo buffer",
                    frame.width, frame.height
                ))
            })?;
        let still = match layer {
            Some(layer) => layer.frame_still(still),
            None => still,
        };
        (device, still, quality)
    };

    let image = CapturedImage::encode(request, &device, still, quality)?;
    log::info!(
        "Captured {}x{} photo from {} (flash {})",
        image.width(),
        image.height(),
        device.name,
        request.flash_mode
    );
    Ok(image)
}

fn frame_pump(shared: Arc<Shared>) {
    loop {
        let mut g = shared.lock();
        loop {
            if shared.stop_flag.load(Ordering::Relaxed) {
                return;
            }
            if g.config_depth == 0 && !g.inputs.is_empty() {
                break;
            }
            g = shared
                .cv
                .wait_timeout(g, PARK_INTERVAL)
                .expect("lock poisoned")
                .0;
        }

        let next = g.inputs[0].next_frame();
        match next {
            Ok(frame) => {
                // Rendered under the session lock so a bracket opened after
                // this point never sees the frame land.
                for layer in g.layers.iter() {
                    layer.render(&frame);
                }
                g.frames_delivered = g.frames_delivered.saturating_add(1);
                drop(g);
                // Let configuration and photo threads at the lock.
                std::thread::sleep(PUMP_YIELD);
            }
            Err(e) => {
                drop(g);
                log::warn!("Frame pump: {}", e);
                std::thread::sleep(FRAME_ERROR_BACKOFF);
            }
        }
    }
}
