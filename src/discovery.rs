use crate::errors::CameraError;
use crate::platform::CameraBackend;
use crate::types::{Device, DeviceType, Facing, MediaType};

/// Snapshot of the devices matching a set of types and a media type.
///
/// The backend is queried once, when the session is created.
#[derive(Debug, Clone)]
pub struct DiscoverySession {
    devices: Vec<Device>,
}

impl DiscoverySession {
    pub fn new(
        backend: &dyn CameraBackend,
        device_types: &[DeviceType],
        media_type: MediaType,
    ) -> Result<Self, CameraError> {
        let devices: Vec<Device> = backend
            .enumerate()?
            .into_iter()
            .filter(|d| device_types.contains(&d.device_type) && d.supports(media_type))
            .collect();

        log::debug!(
            "Discovery on {} backend found {} device(s) for {:?}",
            backend.name(),
            devices.len(),
            device_types
        );
        Ok(Self { devices })
    }

    pub fn devices(&self) -> &[Device] {
        &self.devices
    }

    /// First device at the given position.
    pub fn first(&self, facing: Facing) -> Option<&Device> {
        self.devices.iter().find(|d| d.facing == facing)
    }

    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::SyntheticBackend;

    #[test]
    fn test_filters_by_type_and_media() {
        let backend = SyntheticBackend::with_devices(vec![
            Device::new("0", "Front", Facing::Front),
            Device::new("1", "Mic", Facing::Back).with_media_types(vec![MediaType::Audio]),
            Device::new("2", "USB", Facing::Back).with_device_type(DeviceType::External),
            Device::new("3", "Back", Facing::Back),
        ]);

        let discovery = DiscoverySession::new(
            &backend,
            &[DeviceType::BuiltInWideAngleCamera],
            MediaType::Video,
        )
        .unwrap();

        let ids: Vec<_> = discovery.devices().iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, vec!["0", "3"]);
        assert_eq!(discovery.first(Facing::Back).unwrap().id, "3");
        assert_eq!(discovery.first(Facing::Front).unwrap().id, "0");
    }

    #[test]
    fn test_first_match_wins() {
        let backend = SyntheticBackend::with_devices(vec![
            Device::new("a", "Back A", Facing::Back),
            Device::new("b", "Back B", Facing::Back),
        ]);
        let discovery = DiscoverySession::new(
            &backend,
            &[DeviceType::BuiltInWideAngleCamera],
            MediaType::Video,
        )
        .unwrap();
        assert_eq!(discovery.first(Facing::Back).unwrap().id, "a");
        assert!(discovery.first(Facing::Front).is_none());
    }
}
