//! Interfaces to the user-facing side of the cycle.

use super::result::SeedResult;
use async_trait::async_trait;

/// A capability that may need the user's permission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    Camera,
    Storage,
}

impl std::fmt::Display for Capability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Capability::Camera => write!(f, "camera"),
            Capability::Storage => write!(f, "storage"),
        }
    }
}

/// Permission checks.
///
/// `request` is fire-and-forget: the answer arrives out of band and the user
/// retries the action once it is granted.
pub trait PermissionGate: Send + Sync {
    fn has_permission(&self, capability: Capability) -> bool;
    fn request(&self, capability: Capability);
}

/// Permission gate for platforms without runtime permissions.
#[derive(Debug, Clone, Copy, Default)]
pub struct GrantAll;

impl PermissionGate for GrantAll {
    fn has_permission(&self, _capability: Capability) -> bool {
        true
    }

    fn request(&self, _capability: Capability) {}
}

/// User-visible status of the cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusMessage {
    Capturing,
    Canceled,
    Error,
    NoCamera,
    PermissionRequired(Capability),
    InvalidInput(String),
    Processing,
    Outcome(String),
    Saving,
    Saved,
    SaveError,
}

impl std::fmt::Display for StatusMessage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StatusMessage::Capturing => write!(f, "Waiting for photo"),
            StatusMessage::Canceled => write!(f, "Capture canceled"),
            StatusMessage::Error => write!(f, "Could not read the photo, try again"),
            StatusMessage::NoCamera => write!(f, "No camera available"),
            StatusMessage::PermissionRequired(capability) => {
                write!(f, "Permission required: {}", capability)
            }
            StatusMessage::InvalidInput(reason) => write!(f, "{}", reason),
            StatusMessage::Processing => write!(f, "Processing"),
            StatusMessage::Outcome(text) => write!(f, "{}", text),
            StatusMessage::Saving => write!(f, "Saving"),
            StatusMessage::Saved => write!(f, "Saved"),
            StatusMessage::SaveError => write!(f, "Could not save, try again"),
        }
    }
}

/// Feedback surface driven by the lifecycle.
#[async_trait]
pub trait UiFeedback: Send + Sync {
    fn show_status(&self, message: StatusMessage);

    fn show_result(&self, result: &SeedResult);

    /// Clears any mode-specific result display.
    fn clear_result(&self) {}

    /// Asks the user for an annotation of at most `max_chars` characters.
    /// `None` means the prompt was dismissed.
    async fn prompt_annotation(&self, max_chars: usize) -> Option<String>;

    fn set_save_available(&self, available: bool);
}
