//! JSON-file backed moment store.
//!
//! # Write discipline
//!
//! Every mutation loads the full collection, applies the change in memory,
//! serializes the whole collection into one buffer and only then touches the
//! disk: the buffer goes to a sibling `.tmp` file which is renamed over the
//! backing file. A failed write leaves the previous file in place.

use super::moment::SavedMoment;
use serde_json::{Map, Value};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Default cap on annotation length, in characters.
pub const DEFAULT_MAX_ANNOTATION_CHARS: usize = 140;

/// Errors returned by store mutations.
///
/// Reads never fail: see [`MomentStore::load`].
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to write moment store: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to serialize moments: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("no moment with id {0}")]
    NotFound(String),
    #[error("moment has no id")]
    MissingId,
    #[error("a moment with id {0} already exists")]
    DuplicateId(String),
    #[error("photo {0} is outside the saved photo area")]
    PhotoOutsideSavedArea(PathBuf),
}

/// Storage operations the capture lifecycle depends on.
pub trait MomentRepository: Send + Sync {
    /// Returns all moments, most recent first. Never fails.
    fn load(&self) -> Vec<SavedMoment>;

    /// Inserts a moment at the front of the collection.
    fn add(&self, moment: SavedMoment) -> Result<(), StoreError>;

    /// Replaces the annotation of one moment and returns the updated record.
    fn update_annotation(&self, id: &str, annotation: &str) -> Result<SavedMoment, StoreError>;
}

/// Moment store backed by a single JSON file.
#[derive(Debug, Clone)]
pub struct MomentStore {
    path: PathBuf,
    saved_dir: Option<PathBuf>,
    max_annotation_chars: usize,
}

impl MomentStore {
    /// Creates a store over the given backing file. The file need not exist.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            saved_dir: None,
            max_annotation_chars: DEFAULT_MAX_ANNOTATION_CHARS,
        }
    }

    /// Restricts accepted photo paths to files under `saved_dir`.
    pub fn with_saved_dir(mut self, saved_dir: impl Into<PathBuf>) -> Self {
        self.saved_dir = Some(saved_dir.into());
        self
    }

    /// Sets the annotation length cap applied by [`MomentRepository::update_annotation`].
    pub fn with_annotation_limit(mut self, max_chars: usize) -> Self {
        self.max_annotation_chars = max_chars;
        self
    }

    /// Returns the backing file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_all(&self) -> Vec<SavedMoment> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Vec::new(),
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "Unreadable moment store, treating as empty");
                return Vec::new();
            }
        };
        if content.trim().is_empty() {
            return Vec::new();
        }
        parse_moments(&content)
    }

    fn write_all(&self, moments: &[SavedMoment]) -> Result<(), StoreError> {
        let buffer = serde_json::to_vec_pretty(moments)?;

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let tmp = self.temp_path();
        if let Err(e) = fs::write(&tmp, &buffer).and_then(|()| fs::rename(&tmp, &self.path)) {
            let _ = fs::remove_file(&tmp);
            return Err(e.into());
        }

        tracing::debug!(
            path = %self.path.display(),
            moments = moments.len(),
            bytes = buffer.len(),
            "Rewrote moment store"
        );
        Ok(())
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    fn check_photo_path(&self, moment: &SavedMoment) -> Result<(), StoreError> {
        if let Some(saved_dir) = &self.saved_dir {
            let photo = Path::new(&moment.photo_path);
            if !photo.starts_with(saved_dir) {
                return Err(StoreError::PhotoOutsideSavedArea(photo.to_path_buf()));
            }
        }
        Ok(())
    }
}

impl MomentRepository for MomentStore {
    /// Reads the backing file.
    ///
    /// A missing, blank or malformed file reads as an empty history. Entries
    /// that are not objects or that lack an id are skipped individually.
    fn load(&self) -> Vec<SavedMoment> {
        self.read_all()
    }

    fn add(&self, moment: SavedMoment) -> Result<(), StoreError> {
        if moment.id.trim().is_empty() {
            return Err(StoreError::MissingId);
        }
        self.check_photo_path(&moment)?;

        let mut moments = self.read_all();
        if moments.iter().any(|m| m.id == moment.id) {
            return Err(StoreError::DuplicateId(moment.id));
        }

        let id = moment.id.clone();
        moments.insert(0, moment);
        self.write_all(&moments)?;

        tracing::info!(id = %id, total = moments.len(), "Saved moment");
        Ok(())
    }

    fn update_annotation(&self, id: &str, annotation: &str) -> Result<SavedMoment, StoreError> {
        let mut moments = self.read_all();
        let existing = moments
            .iter_mut()
            .find(|m| m.id == id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;

        existing.annotation = annotation
            .trim()
            .chars()
            .take(self.max_annotation_chars)
            .collect();
        let updated = existing.clone();

        self.write_all(&moments)?;
        tracing::info!(id = %id, "Updated moment annotation");
        Ok(updated)
    }
}

fn parse_moments(content: &str) -> Vec<SavedMoment> {
    let entries: Vec<Value> = match serde_json::from_str(content) {
        Ok(entries) => entries,
        Err(e) => {
            tracing::warn!(error = %e, "Malformed moment store, treating as empty");
            return Vec::new();
        }
    };

    entries
        .into_iter()
        .enumerate()
        .filter_map(|(index, entry)| {
            let Some(object) = entry.as_object() else {
                tracing::debug!(index, "Skipping non-object moment entry");
                return None;
            };
            let moment = moment_from_object(object);
            if moment.id.trim().is_empty() {
                tracing::debug!(index, "Skipping moment without id");
                return None;
            }
            Some(moment)
        })
        .collect()
}

/// Reads one record field by field. A field that is absent, null or of an
/// unexpected type takes its default; the record itself is kept.
fn moment_from_object(object: &Map<String, Value>) -> SavedMoment {
    SavedMoment {
        id: text_field(object, "id"),
        created_at: integer_field(object, "createdAt"),
        mode: text_field(object, "mode"),
        result_title: text_field(object, "resultTitle"),
        result_value: text_field(object, "resultValue"),
        annotation: text_field(object, "annotation"),
        photo_path: text_field(object, "photoPath"),
    }
}

fn text_field(object: &Map<String, Value>, key: &str) -> String {
    match object.get(key) {
        Some(Value::String(text)) => text.clone(),
        Some(Value::Number(number)) => number.to_string(),
        Some(Value::Bool(flag)) => flag.to_string(),
        _ => String::new(),
    }
}

fn integer_field(object: &Map<String, Value>, key: &str) -> i64 {
    let parsed = match object.get(key) {
        Some(Value::Number(number)) => number
            .as_i64()
            .or_else(|| number.as_f64().map(|f| f as i64)),
        Some(Value::String(text)) => {
            let text = text.trim();
            text.parse::<i64>()
                .ok()
                .or_else(|| text.parse::<f64>().ok().filter(|f| f.is_finite()).map(|f| f as i64))
        }
        _ => None,
    };
    parsed.unwrap_or(0)
}
