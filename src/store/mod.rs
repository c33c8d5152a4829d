//! Durable history of saved moments.
//!
//! A moment pairs a generated result with an archived copy of the photo it
//! came from and a user annotation. Moments are kept most-recent-first in a
//! single JSON file. The store is single-writer: it takes no locks, and two
//! processes rewriting the same file concurrently may lose updates. Callers
//! serialize their own access.

mod file;
mod moment;

pub use file::{MomentRepository, MomentStore, StoreError};
pub use moment::{find, result_line, SavedMoment};
