//! Native camera capture through `nokhwa`.

use super::camera::{CameraCapture, CameraError, CaptureOutcome};
use super::config::CaptureConfig;
use async_trait::async_trait;
use nokhwa::pixel_format::RgbFormat;
use nokhwa::utils::{ApiBackend, CameraIndex, RequestedFormat, RequestedFormatType};
use nokhwa::Camera;
use std::path::{Path, PathBuf};

/// Captures a single still from a local camera device.
#[derive(Debug, Clone)]
pub struct NativeCamera {
    device_id: u32,
    warmup_frames: u32,
}

impl NativeCamera {
    pub fn new(config: &CaptureConfig) -> Self {
        Self {
            device_id: config.device_id,
            warmup_frames: config.warmup_frames,
        }
    }

    fn capture_blocking(device_id: u32, warmup_frames: u32, target: &Path) -> Result<(), CameraError> {
        let format = RequestedFormat::new::<RgbFormat>(RequestedFormatType::AbsoluteHighestResolution);
        let mut camera = Camera::new(CameraIndex::Index(device_id), format)
            .map_err(|e| CameraError::Unavailable(e.to_string()))?;
        camera
            .open_stream()
            .map_err(|e| CameraError::CaptureFailed(e.to_string()))?;

        // Early frames are often dark while exposure settles.
        for _ in 0..warmup_frames {
            camera
                .frame()
                .map_err(|e| CameraError::CaptureFailed(e.to_string()))?;
        }

        let frame = camera
            .frame()
            .map_err(|e| CameraError::CaptureFailed(e.to_string()))?;
        let decoded = frame
            .decode_image::<RgbFormat>()
            .map_err(|e| CameraError::CaptureFailed(e.to_string()))?;
        let _ = camera.stop_stream();

        decoded
            .save(target)
            .map_err(|e| CameraError::CaptureFailed(e.to_string()))?;
        Ok(())
    }
}

#[async_trait]
impl CameraCapture for NativeCamera {
    fn is_available(&self) -> bool {
        nokhwa::query(ApiBackend::Auto)
            .map(|devices| !devices.is_empty())
            .unwrap_or(false)
    }

    async fn request(&self, target: &Path) -> CaptureOutcome {
        let device_id = self.device_id;
        let warmup_frames = self.warmup_frames;
        let target: PathBuf = target.to_path_buf();

        let result = tokio::task::spawn_blocking(move || {
            Self::capture_blocking(device_id, warmup_frames, &target)
        })
        .await;

        match result {
            Ok(Ok(())) => CaptureOutcome::Success,
            Ok(Err(e)) => {
                tracing::warn!(device_id, error = %e, "Native capture failed");
                CaptureOutcome::Failed(e.to_string())
            }
            Err(e) => CaptureOutcome::Failed(format!("capture task failed: {}", e)),
        }
    }
}
