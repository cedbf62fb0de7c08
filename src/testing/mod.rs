//! Testing utilities for Snapcam
//!
//! A synthetic camera backend plus in-memory stand-ins for the photo
//! library and presenter, so the whole app runs offline without hardware.

pub mod backend;
pub mod doubles;
pub mod synthetic_data;

pub use backend::{StillBehavior, SyntheticBackend, SyntheticInput};
pub use doubles::{sample_photo, MemoryLibrary, PresenterEvent, RecordingPresenter};
pub use synthetic_data::{synthetic_frame_for, synthetic_video_frame};
