//! Camera abstraction for photo capture.
//!
//! The camera is asked to fill one target file per request and reports
//! how that went. It never sees the generator or the store.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use thiserror::Error;

/// Errors that can occur inside camera implementations.
#[derive(Debug, Error)]
pub enum CameraError {
    #[error("camera device not available: {0}")]
    Unavailable(String),
    #[error("failed to capture photo: {0}")]
    CaptureFailed(String),
    #[error("failed to encode photo: {0}")]
    Encode(#[from] image::ImageError),
    #[error("failed to write photo: {0}")]
    Io(#[from] std::io::Error),
}

/// Result of one capture request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureOutcome {
    /// The target file was written.
    Success,
    /// The user declined to take a photo.
    Canceled,
    /// The capture did not complete.
    Failed(String),
}

/// Trait for capture collaborators.
///
/// A request is single-shot: it resolves exactly once.
#[async_trait]
pub trait CameraCapture: Send + Sync {
    /// Returns false when no capture device can be reached.
    fn is_available(&self) -> bool {
        true
    }

    /// Captures one photo into `target`.
    async fn request(&self, target: &Path) -> CaptureOutcome;
}

/// Uses an existing image file as the captured photo.
#[derive(Debug, Clone)]
pub struct FileCamera {
    source: PathBuf,
}

impl FileCamera {
    pub fn new(source: impl Into<PathBuf>) -> Self {
        Self {
            source: source.into(),
        }
    }
}

#[async_trait]
impl CameraCapture for FileCamera {
    fn is_available(&self) -> bool {
        self.source.is_file()
    }

    async fn request(&self, target: &Path) -> CaptureOutcome {
        match std::fs::copy(&self.source, target) {
            Ok(bytes) => {
                tracing::debug!(source = %self.source.display(), bytes, "Copied source photo");
                CaptureOutcome::Success
            }
            Err(e) => CaptureOutcome::Failed(format!("{}: {}", self.source.display(), e)),
        }
    }
}

/// One scripted response of a [`MockCamera`].
#[derive(Debug, Clone)]
pub enum MockShot {
    /// Writes these bytes and reports success.
    Photo(Vec<u8>),
    /// Writes a generated frame and reports success.
    Generated,
    /// Reports success without writing anything.
    SuccessWithoutOutput,
    /// Reports the user declined.
    Canceled,
    /// Reports a failure.
    Failed,
}

/// Mock camera that generates synthetic PNG frames or follows a script.
#[derive(Debug)]
pub struct MockCamera {
    width: u32,
    height: u32,
    available: bool,
    sequence: AtomicU64,
    script: Mutex<VecDeque<MockShot>>,
}

impl MockCamera {
    /// Creates a camera that always produces a generated frame.
    pub fn new() -> Self {
        Self::with_dimensions(64, 48)
    }

    /// Creates a generating camera with the given frame size.
    pub fn with_dimensions(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            available: true,
            sequence: AtomicU64::new(0),
            script: Mutex::new(VecDeque::new()),
        }
    }

    /// Creates a camera that replays `shots` in order, then generates frames.
    pub fn scripted(shots: impl IntoIterator<Item = MockShot>) -> Self {
        let camera = Self::new();
        if let Ok(mut script) = camera.script.lock() {
            script.extend(shots);
        }
        camera
    }

    /// Creates a camera that reports no device.
    pub fn unavailable() -> Self {
        Self {
            available: false,
            ..Self::new()
        }
    }

    /// Number of capture requests received so far.
    pub fn requests(&self) -> u64 {
        self.sequence.load(Ordering::SeqCst)
    }

    /// Renders a grayscale PNG whose pixels depend on `sequence`.
    ///
    /// Deterministic per sequence. NOT a source of entropy.
    pub fn render_frame(width: u32, height: u32, sequence: u64) -> Result<Vec<u8>, CameraError> {
        let frame = image::GrayImage::from_fn(width, height, |x, y| {
            let mixed = (u64::from(x) * 31 + u64::from(y) * 17) ^ sequence.wrapping_mul(0x9E37_79B9);
            image::Luma([(mixed % 256) as u8])
        });
        let mut buffer = Vec::new();
        frame.write_to(&mut Cursor::new(&mut buffer), image::ImageFormat::Png)?;
        Ok(buffer)
    }

    fn next_shot(&self) -> MockShot {
        match self.script.lock() {
            Ok(mut script) => script.pop_front().unwrap_or(MockShot::Generated),
            Err(poisoned) => poisoned.into_inner().pop_front().unwrap_or(MockShot::Generated),
        }
    }

    fn write_target(target: &Path, bytes: &[u8]) -> CaptureOutcome {
        match std::fs::write(target, bytes) {
            Ok(()) => CaptureOutcome::Success,
            Err(e) => CaptureOutcome::Failed(e.to_string()),
        }
    }
}

impl Default for MockCamera {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CameraCapture for MockCamera {
    fn is_available(&self) -> bool {
        self.available
    }

    async fn request(&self, target: &Path) -> CaptureOutcome {
        let sequence = self.sequence.fetch_add(1, Ordering::SeqCst) + 1;
        let outcome = match self.next_shot() {
            MockShot::Photo(bytes) => Self::write_target(target, &bytes),
            MockShot::Generated => match Self::render_frame(self.width, self.height, sequence) {
                Ok(bytes) => Self::write_target(target, &bytes),
                Err(e) => CaptureOutcome::Failed(e.to_string()),
            },
            MockShot::SuccessWithoutOutput => CaptureOutcome::Success,
            MockShot::Canceled => CaptureOutcome::Canceled,
            MockShot::Failed => CaptureOutcome::Failed("mock capture failure".to_string()),
        };
        tracing::debug!(sequence, ?outcome, "MockCamera request");
        outcome
    }
}
