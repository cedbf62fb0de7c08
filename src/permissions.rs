/// Camera access as reported by the operating system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum PermissionStatus {
    Granted,
    Denied,
    /// The user has not been asked yet
    NotDetermined,
    /// Blocked by policy (parental controls, MDM)
    Restricted,
}

impl PermissionStatus {
    /// Whether opening a camera input should be refused outright.
    pub fn blocks_capture(&self) -> bool {
        matches!(self, PermissionStatus::Denied | PermissionStatus::Restricted)
    }
}

impl std::fmt::Display for PermissionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PermissionStatus::Granted => write!(f, "granted"),
            PermissionStatus::Denied => write!(f, "denied"),
            PermissionStatus::NotDetermined => write!(f, "not_determined"),
            PermissionStatus::Restricted => write!(f, "restricted"),
        }
    }
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct PermissionInfo {
    pub status: PermissionStatus,
    pub message: String,
}

pub fn check_permission() -> PermissionStatus {
    check_permission_detailed().status
}

pub fn check_permission_detailed() -> PermissionInfo {
    #[cfg(target_os = "windows")]
    {
        check_permission_windows()
    }

    #[cfg(target_os = "macos")]
    {
        check_permission_macos()
    }

    #[cfg(target_os = "linux")]
    {
        check_permission_linux()
    }

    #[cfg(not(any(target_os = "windows", target_os = "macos", target_os = "linux")))]
    {
        PermissionInfo {
            status: PermissionStatus::NotDetermined,
            message: "Platform not supported".to_string(),
        }
    }
}

#[cfg(target_os = "windows")]
fn check_permission_windows() -> PermissionInfo {
    // Privacy settings hide devices from enumeration instead of failing opens.
    match nokhwa::query(nokhwa::utils::ApiBackend::Auto) {
        Ok(devices) if !devices.is_empty() => PermissionInfo {
            status: PermissionStatus::Granted,
            message: format!("{} camera(s) visible", devices.len()),
        },
        Ok(_) => PermissionInfo {
            status: PermissionStatus::NotDetermined,
            message: "No cameras visible - check Privacy > Camera settings".to_string(),
        },
        Err(e) => PermissionInfo {
            status: PermissionStatus::Denied,
            message: format!("Camera access denied: {}", e),
        },
    }
}

#[cfg(target_os = "macos")]
fn check_permission_macos() -> PermissionInfo {
    use cocoa::base::{id, nil};
    use cocoa::foundation::NSString;
    use objc::runtime::Class;
    use objc::{msg_send, sel, sel_impl};

    let Some(capture_device) = Class::get("AVCaptureDevice") else {
        return PermissionInfo {
            status: PermissionStatus::NotDetermined,
            message: "AVFoundation not available".to_string(),
        };
    };

    // AVAuthorizationStatus: 0 not determined, 1 restricted, 2 denied, 3 authorized
    let status: i64 = unsafe {
        let media_type: id = NSString::alloc(nil).init_str("vide");
        msg_send![capture_device, authorizationStatusForMediaType: media_type]
    };

    match status {
        3 => PermissionInfo {
            status: PermissionStatus::Granted,
            message: "Camera access authorized".to_string(),
        },
        2 => PermissionInfo {
            status: PermissionStatus::Denied,
            message: "Camera access denied - enable it in System Settings > Privacy & Security > Camera"
                .to_string(),
        },
        1 => PermissionInfo {
            status: PermissionStatus::Restricted,
            message: "Camera access restricted by system policy".to_string(),
        },
        _ => PermissionInfo {
            status: PermissionStatus::NotDetermined,
            message: "Camera permission not yet requested".to_string(),
        },
    }
}

#[cfg(target_os = "linux")]
fn check_permission_linux() -> PermissionInfo {
    let nodes: Vec<usize> = (0..10)
        .filter(|i| std::path::Path::new(&format!("/dev/video{}", i)).exists())
        .collect();

    let Some(&first) = nodes.first() else {
        return PermissionInfo {
            status: PermissionStatus::NotDetermined,
            message: "No video devices found at /dev/video*".to_string(),
        };
    };

    // Opening the node is the real access check; group membership is only a hint.
    match v4l::Device::new(first) {
        Ok(_) => PermissionInfo {
            status: PermissionStatus::Granted,
            message: format!("Camera access granted ({} node(s) found)", nodes.len()),
        },
        Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => PermissionInfo {
            status: PermissionStatus::Denied,
            message: format!(
                "/dev/video{} exists but cannot be opened - run: sudo usermod -a -G video $USER",
                first
            ),
        },
        // Busy or otherwise unusable nodes say nothing about access rights.
        Err(e) => PermissionInfo {
            status: PermissionStatus::Granted,
            message: format!("/dev/video{} is present ({})", first, e),
        },
    }
}
