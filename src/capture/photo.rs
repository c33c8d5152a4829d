//! A captured photo read back from the transient area.

use image::ImageFormat;
use std::path::Path;
use thiserror::Error;

/// Errors reading a captured photo.
#[derive(Debug, Error)]
pub enum PhotoError {
    #[error("failed to read photo: {0}")]
    Read(#[from] std::io::Error),
    #[error("photo is not a decodable image: {0}")]
    Decode(#[from] image::ImageError),
}

/// Raw photo bytes that have been verified to decode as an image.
///
/// The generator consumes [`bytes`](Self::bytes) unchanged: the file
/// content, not the decoded pixels, is the seed material.
#[derive(Clone)]
pub struct CapturedPhoto {
    bytes: Vec<u8>,
    width: u32,
    height: u32,
    format: Option<ImageFormat>,
}

impl CapturedPhoto {
    /// Reads a photo file and checks that it decodes.
    pub fn read(path: impl AsRef<Path>) -> Result<Self, PhotoError> {
        let bytes = std::fs::read(path.as_ref())?;
        Self::from_bytes(bytes)
    }

    /// Wraps in-memory bytes, checking that they decode.
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self, PhotoError> {
        let format = image::guess_format(&bytes).ok();
        let decoded = image::load_from_memory(&bytes)?;
        Ok(Self {
            width: decoded.width(),
            height: decoded.height(),
            format,
            bytes,
        })
    }

    /// Returns the full file content.
    #[inline]
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Returns the decoded width in pixels.
    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Returns the decoded height in pixels.
    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Returns the detected container format.
    #[inline]
    pub fn format(&self) -> Option<ImageFormat> {
        self.format
    }
}

impl std::fmt::Debug for CapturedPhoto {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CapturedPhoto")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("format", &self.format)
            .field("bytes", &self.bytes.len())
            .finish()
    }
}
