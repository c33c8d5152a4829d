//! Transient and saved photo areas.
//!
//! Transient photos are named `<prefix><yyyyMMdd_HHmmss>_<nonce>.jpg` and
//! live only as long as the cycle that allocated them. Saved photos are named
//! `<prefix>Saved_<yyyyMMdd_HHmmss>_<suffix>.<ext>` and are referenced by
//! moments.

use chrono::Local;
use std::fs::{self, OpenOptions};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use thiserror::Error;
use uuid::Uuid;

const TRANSIENT_EXTENSION: &str = "jpg";
const SAVED_MARKER: &str = "Saved_";
const ALLOCATE_ATTEMPTS: usize = 8;

/// Errors managing photo files.
#[derive(Debug, Error)]
pub enum AreaError {
    #[error("photo file I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("photo {0} does not exist")]
    MissingPhoto(PathBuf),
}

/// The two directories photos move through.
#[derive(Debug, Clone)]
pub struct PhotoArea {
    temp_dir: PathBuf,
    saved_dir: PathBuf,
    prefix: String,
}

impl PhotoArea {
    /// Creates an area description. Directories are created lazily.
    pub fn new(temp_dir: impl Into<PathBuf>, saved_dir: impl Into<PathBuf>, prefix: impl Into<String>) -> Self {
        Self {
            temp_dir: temp_dir.into(),
            saved_dir: saved_dir.into(),
            prefix: prefix.into(),
        }
    }

    /// Returns the transient directory.
    pub fn temp_dir(&self) -> &Path {
        &self.temp_dir
    }

    /// Returns the saved directory.
    pub fn saved_dir(&self) -> &Path {
        &self.saved_dir
    }

    /// Creates a new, empty transient file for the camera to fill.
    pub fn allocate_transient(&self) -> Result<PathBuf, AreaError> {
        fs::create_dir_all(&self.temp_dir)?;
        let stamp = timestamp();

        for _ in 0..ALLOCATE_ATTEMPTS {
            let name = format!(
                "{}{}_{}.{}",
                self.prefix,
                stamp,
                short_suffix(),
                TRANSIENT_EXTENSION
            );
            let path = self.temp_dir.join(name);
            match OpenOptions::new().write(true).create_new(true).open(&path) {
                Ok(_) => {
                    tracing::debug!(path = %path.display(), "Allocated transient photo");
                    return Ok(path);
                }
                Err(e) if e.kind() == ErrorKind::AlreadyExists => continue,
                Err(e) => return Err(e.into()),
            }
        }

        Err(AreaError::Io(std::io::Error::new(
            ErrorKind::AlreadyExists,
            "could not allocate a unique transient photo name",
        )))
    }

    /// Returns true if `path` follows the transient naming convention.
    pub fn is_transient(&self, path: &Path) -> bool {
        let name_matches = path
            .file_name()
            .and_then(|n| n.to_str())
            .map(|n| n.starts_with(&self.prefix))
            .unwrap_or(false);
        let extension_matches = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.eq_ignore_ascii_case(TRANSIENT_EXTENSION))
            .unwrap_or(false);
        name_matches && extension_matches
    }

    /// Deletes every transient photo except `keep`. Returns the number removed.
    pub fn sweep_stale(&self, keep: Option<&Path>) -> usize {
        let entries = match fs::read_dir(&self.temp_dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return 0,
            Err(e) => {
                tracing::warn!(dir = %self.temp_dir.display(), error = %e, "Cannot list transient photos");
                return 0;
            }
        };

        let mut removed = 0;
        for entry in entries.flatten() {
            let path = entry.path();
            if !path.is_file() || !self.is_transient(&path) || Some(path.as_path()) == keep {
                continue;
            }
            match fs::remove_file(&path) {
                Ok(()) => removed += 1,
                Err(e) => tracing::warn!(path = %path.display(), error = %e, "Failed to remove stale photo"),
            }
        }

        if removed > 0 {
            tracing::info!(removed, "Removed stale transient photos");
        }
        removed
    }

    /// Deletes a photo file if it exists.
    pub fn discard(&self, path: &Path) {
        match fs::remove_file(path) {
            Ok(()) => tracing::debug!(path = %path.display(), "Discarded photo"),
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => tracing::warn!(path = %path.display(), error = %e, "Failed to discard photo"),
        }
    }

    /// Copies a transient photo into the saved area under a fresh name.
    pub fn copy_to_saved(&self, transient: &Path) -> Result<PathBuf, AreaError> {
        if !transient.is_file() {
            return Err(AreaError::MissingPhoto(transient.to_path_buf()));
        }
        fs::create_dir_all(&self.saved_dir)?;

        let extension = transient
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or(TRANSIENT_EXTENSION);
        let name = format!(
            "{}{}{}_{}.{}",
            self.prefix,
            SAVED_MARKER,
            timestamp(),
            short_suffix(),
            extension
        );
        let destination = self.saved_dir.join(name);

        if let Err(e) = fs::copy(transient, &destination) {
            let _ = fs::remove_file(&destination);
            return Err(e.into());
        }

        tracing::debug!(
            from = %transient.display(),
            to = %destination.display(),
            "Copied photo to saved area"
        );
        Ok(destination)
    }
}

fn timestamp() -> String {
    Local::now().format("%Y%m%d_%H%M%S").to_string()
}

fn short_suffix() -> String {
    Uuid::new_v4().simple().to_string()[..8].to_string()
}
