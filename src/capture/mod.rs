//! Photo acquisition and the on-disk photo areas.
//!
//! The camera is an external collaborator: it is handed a freshly allocated
//! file in the transient area and reports whether it filled it. Photos that
//! are kept get copied into the saved area, which the moment store owns.

mod area;
mod camera;
mod config;
#[cfg(feature = "camera")]
mod native;
mod photo;

pub use area::{AreaError, PhotoArea};
pub use camera::{CameraCapture, CameraError, CaptureOutcome, FileCamera, MockCamera, MockShot};
pub use config::{CaptureConfig, ConfigError, FileConfig, StorageConfig};
#[cfg(feature = "camera")]
pub use native::NativeCamera;
pub use photo::{CapturedPhoto, PhotoError};
