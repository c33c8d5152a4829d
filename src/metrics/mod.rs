//! Prometheus metrics for the capture lifecycle.
//!
//! Counters mirror [`LifecycleStats`](crate::lifecycle::LifecycleStats) and
//! are rendered in the Prometheus text format, e.g. for `photo-seed capture
//! --metrics`.
//!
//! # Metrics Exposed
//!
//! ## Cycle Metrics
//! - `photo_seed_result_ready` - Whether a result awaits saving (1=ready, 0=not ready)
//! - `photo_seed_cycles_started_total` - Capture cycles launched
//! - `photo_seed_starts_ignored_total` - Starts ignored while a cycle was in flight
//! - `photo_seed_validation_rejections_total` - Starts rejected by input validation
//! - `photo_seed_results_derived_total` - Results derived from photos
//! - `photo_seed_captures_canceled_total` - Captures canceled by the user
//! - `photo_seed_cycles_failed_total` - Cycles that ended in an error
//!
//! ## Save Metrics
//! - `photo_seed_saves_succeeded_total` - Moments saved
//! - `photo_seed_saves_failed_total` - Failed save attempts
//!
//! ## Storage Metrics
//! - `photo_seed_stale_photos_removed_total` - Stale transient photos removed
//! - `photo_seed_moments_stored` - Moments currently in the store
//!
//! # Example
//!
//! ```no_run
//! use photo_seed::lifecycle::{CyclePhase, LifecycleStats};
//! use photo_seed::metrics::{MetricsRegistry, MetricsSnapshot};
//!
//! let registry = MetricsRegistry::new().expect("Failed to create registry");
//!
//! let stats = LifecycleStats::default();
//! let snapshot = MetricsSnapshot::from_components(&stats, CyclePhase::Idle, 0);
//! registry.update(&snapshot);
//!
//! println!("{}", registry.encode().expect("Failed to encode metrics"));
//! ```

mod collector;

pub use collector::{MetricsError, MetricsRegistry, MetricsSnapshot};
