//! Synthetic frames for running the camera without hardware.

use crate::types::CameraFrame;

/// Frame with a gradient that shifts every frame, so consecutive frames
/// never compare equal.
pub fn synthetic_video_frame(frame_number: u64, width: u32, height: u32) -> CameraFrame {
    synthetic_frame_for(frame_number, width, height, "synthetic")
}

/// Same as [`synthetic_video_frame`], tagged with a device id.
pub fn synthetic_frame_for(
    frame_number: u64,
    width: u32,
    height: u32,
    device_id: &str,
) -> CameraFrame {
    let mut data = vec![0u8; (width * height * 3) as usize];

    let base = (frame_number % 256) as u8;
    for y in 0..height {
        for x in 0..width {
            let idx = ((y * width + x) * 3) as usize;
            data[idx] = base.wrapping_add((x % 256) as u8);
            data[idx + 1] = base.wrapping_add((y % 256) as u8);
            data[idx + 2] = base.wrapping_add(((x + y) % 256) as u8);
        }
    }

    CameraFrame::new(data, width, height, device_id.to_string())
}
