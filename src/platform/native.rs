use super::{CameraBackend, CameraInput};
use crate::config::CameraConfig;
use crate::errors::CameraError;
use crate::permissions::{self, PermissionStatus};
use crate::session::SessionPreset;
use crate::types::{CameraFrame, Device, DeviceType, Facing, MediaType};
use nokhwa::{
    pixel_format::RgbFormat,
    query,
    utils::{ApiBackend, CameraIndex, RequestedFormat, RequestedFormatType, Resolution},
    CallbackCamera,
};

const FRONT_HINTS: &[&str] = &["front", "user", "facetime", "integrated", "built-in", "internal"];
const BACK_HINTS: &[&str] = &["back", "rear", "environment", "world"];
const BUILT_IN_HINTS: &[&str] = &["integrated", "built-in", "facetime", "internal"];

/// Backend over the OS camera stack through nokhwa.
///
/// Desktop cameras do not report a position, so facing is taken from the
/// config overrides first, then from the device name, and finally the
/// first remaining device is treated as front-facing and the rest as back.
#[derive(Debug, Clone, Default)]
pub struct NativeBackend {
    front_device: Option<String>,
    back_device: Option<String>,
}

impl NativeBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(config: &CameraConfig) -> Self {
        Self {
            front_device: config.front_device.clone(),
            back_device: config.back_device.clone(),
        }
    }

    fn api() -> ApiBackend {
        #[cfg(target_os = "linux")]
        {
            ApiBackend::Video4Linux
        }
        #[cfg(not(target_os = "linux"))]
        {
            ApiBackend::Auto
        }
    }
}

impl CameraBackend for NativeBackend {
    fn name(&self) -> &'static str {
        "native"
    }

    fn enumerate(&self) -> Result<Vec<Device>, CameraError> {
        let cameras = query(Self::api())
            .map_err(|e| CameraError::Initialization(format!("Failed to query cameras: {}", e)))?;

        let listed: Vec<(String, String)> = cameras
            .iter()
            .map(|info| (info.index().to_string(), info.human_name()))
            .collect();

        let devices = assign_facings(
            &listed,
            self.front_device.as_deref(),
            self.back_device.as_deref(),
        );
        log::debug!("Enumerated {} native cameras", devices.len());
        Ok(devices)
    }

    fn open_input(
        &self,
        device: &Device,
        preset: SessionPreset,
    ) -> Result<Box<dyn CameraInput>, CameraError> {
        let index = match device.id.parse::<u32>() {
            Ok(i) => CameraIndex::Index(i),
            Err(_) => CameraIndex::String(device.id.clone()),
        };

        let format_type = match preset.resolution() {
            Some(res) => RequestedFormatType::HighestResolution(Resolution::new(res.width, res.height)),
            None => RequestedFormatType::AbsoluteHighestResolution,
        };
        let requested = RequestedFormat::new::<RgbFormat>(format_type);

        let camera = CallbackCamera::new(index, requested, |_| {}).map_err(|e| {
            CameraError::SessionConfiguration(format!("Cannot open {}: {}", device.name, e))
        })?;

        log::info!("Opened native input {} ({})", device.name, device.id);
        Ok(Box::new(NativeInput {
            camera,
            device: device.clone(),
        }))
    }

    fn permission(&self) -> PermissionStatus {
        permissions::check_permission()
    }
}

/// Work out which listed camera faces which way.
pub(crate) fn assign_facings(
    listed: &[(String, String)],
    front_override: Option<&str>,
    back_override: Option<&str>,
) -> Vec<Device> {
    let mut have_front = false;
    let mut devices: Vec<Device> = Vec::with_capacity(listed.len());
    let mut undecided = Vec::new();

    for (idx, (id, name)) in listed.iter().enumerate() {
        let lower = name.to_lowercase();
        let device_type = if BUILT_IN_HINTS.iter().any(|h| lower.contains(h)) {
            DeviceType::BuiltInWideAngleCamera
        } else {
            DeviceType::External
        };

        let facing = if Some(id.as_str()) == front_override {
            Some(Facing::Front)
        } else if Some(id.as_str()) == back_override {
            Some(Facing::Back)
        } else if BACK_HINTS.iter().any(|h| lower.contains(h)) {
            Some(Facing::Back)
        } else if FRONT_HINTS.iter().any(|h| lower.contains(h)) {
            Some(Facing::Front)
        } else {
            None
        };

        if facing == Some(Facing::Front) {
            have_front = true;
        }
        if facing.is_none() {
            undecided.push(idx);
        }

        devices.push(
            Device::new(id.clone(), name.clone(), facing.unwrap_or(Facing::Back))
                .with_device_type(device_type)
                .with_media_types(vec![MediaType::Video]),
        );
    }

    if !have_front {
        if let Some(&first) = undecided.first() {
            devices[first].facing = Facing::Front;
        }
    }

    devices
}

struct NativeInput {
    camera: CallbackCamera,
    device: Device,
}

// The camera handle is only touched through `&mut self`, behind the
// session lock.
unsafe impl Send for NativeInput {}

impl CameraInput for NativeInput {
    fn device(&self) -> &Device {
        &self.device
    }

    fn start(&mut self) -> Result<(), CameraError> {
        if self.camera.is_stream_open() {
            return Ok(());
        }
        self.camera.open_stream().map_err(|e| {
            CameraError::SessionConfiguration(format!("Failed to start stream: {}", e))
        })
    }

    fn stop(&mut self) -> Result<(), CameraError> {
        self.camera.stop_stream().map_err(|e| {
            CameraError::SessionConfiguration(format!("Failed to stop stream: {}", e))
        })
    }

    fn is_streaming(&self) -> bool {
        self.camera.is_stream_open()
    }

    fn next_frame(&mut self) -> Result<CameraFrame, CameraError> {
        let buffer = self
            .camera
            .poll_frame()
            .map_err(|e| CameraError::Capture(format!("Failed to capture frame: {}", e)))?;

        let decoded = buffer
            .decode_image::<RgbFormat>()
            .map_err(|e| CameraError::Capture(format!("Failed to decode frame: {}", e)))?;

        let (width, height) = (decoded.width(), decoded.height());
        Ok(CameraFrame::new(
            decoded.into_raw(),
            width,
            height,
            self.device.id.clone(),
        ))
    }
}

impl Drop for NativeInput {
    fn drop(&mut self) {
        if self.camera.is_stream_open() {
            let _ = self.camera.stop_stream();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn listed(names: &[&str]) -> Vec<(String, String)> {
        names
            .iter()
            .enumerate()
            .map(|(i, n)| (i.to_string(), n.to_string()))
            .collect()
    }

    #[test]
    fn test_name_hints_decide_facing() {
        let devices = assign_facings(
            &listed(&["Integrated Webcam", "Rear Document Camera"]),
            None,
            None,
        );
        assert_eq!(devices[0].facing, Facing::Front);
        assert_eq!(devices[0].device_type, DeviceType::BuiltInWideAngleCamera);
        assert_eq!(devices[1].facing, Facing::Back);
        assert_eq!(devices[1].device_type, DeviceType::External);
    }

    #[test]
    fn test_first_unnamed_device_becomes_front() {
        let devices = assign_facings(&listed(&["USB Camera", "HD Pro Webcam C920"]), None, None);
        assert_eq!(devices[0].facing, Facing::Front);
        assert_eq!(devices[1].facing, Facing::Back);
    }

    #[test]
    fn test_overrides_win_over_names() {
        let devices = assign_facings(
            &listed(&["Integrated Webcam", "USB Camera"]),
            Some("1"),
            Some("0"),
        );
        assert_eq!(devices[0].facing, Facing::Back);
        assert_eq!(devices[1].facing, Facing::Front);
    }

    #[test]
    fn test_single_unknown_device_is_front() {
        let devices = assign_facings(&listed(&["Camera"]), None, None);
        assert_eq!(devices.len(), 1);
        assert_eq!(devices[0].facing, Facing::Front);
    }
}
