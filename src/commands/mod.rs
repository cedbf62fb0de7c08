pub mod camera;
pub mod init;
pub mod preview;
pub mod state;

pub use camera::*;
pub use init::*;
pub use preview::*;
pub use state::{SnapcamState, TauriPresenter, ALERT_EVENT, DISMISS_EVENT};
