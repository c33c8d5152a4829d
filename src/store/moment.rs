//! The saved moment record.

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// A durable record of one generated result and its archived photo.
///
/// Everything except `annotation` is fixed once the record is written.
/// Field names on disk are camelCase; absent fields read back as empty/zero
/// and unknown fields are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct SavedMoment {
    /// Unique identifier, generated at save time.
    pub id: String,
    /// Save timestamp in epoch milliseconds.
    pub created_at: i64,
    /// Identifier of the mode that produced the result.
    pub mode: String,
    /// Display title of the result.
    pub result_title: String,
    /// Display value of the result.
    pub result_value: String,
    /// Free-form user text.
    pub annotation: String,
    /// Absolute path of the archived photo.
    pub photo_path: String,
}

impl SavedMoment {
    /// Returns the creation time, or `None` if the stored value is out of range.
    pub fn created_at_utc(&self) -> Option<DateTime<Utc>> {
        Utc.timestamp_millis_opt(self.created_at).single()
    }

    /// Formats the creation date for history listings, e.g. `Mar 4, 2024`.
    pub fn display_date(&self) -> String {
        self.created_at_utc()
            .map(|t| t.format("%b %-d, %Y").to_string())
            .unwrap_or_default()
    }
}

/// One-line summary of a moment's result.
///
/// Shows `title: value` when the value adds information, otherwise just the
/// title (a coin flip's value repeats its title).
pub fn result_line(moment: &SavedMoment) -> String {
    let title = moment.result_title.trim();
    let value = moment.result_value.trim();
    if !value.is_empty() && value != title {
        format!("{}: {}", title, value)
    } else {
        title.to_string()
    }
}

/// Finds a moment by id.
pub fn find<'a>(moments: &'a [SavedMoment], id: &str) -> Option<&'a SavedMoment> {
    moments.iter().find(|m| m.id == id)
}
