//! Metrics collection and registry.

use crate::lifecycle::{CyclePhase, LifecycleStats};
use prometheus::{Encoder, IntCounter, IntGauge, Registry, TextEncoder};
use thiserror::Error;

/// Errors that can occur during metrics operations.
#[derive(Debug, Error)]
pub enum MetricsError {
    #[error("prometheus error: {0}")]
    Prometheus(#[from] prometheus::Error),
}

/// A snapshot of lifecycle and store state for metrics update.
#[derive(Debug, Clone, Default)]
pub struct MetricsSnapshot {
    /// Whether a result is ready to be saved.
    pub result_ready: bool,
    /// Capture cycles launched.
    pub cycles_started: u64,
    /// Start requests ignored because a cycle was in flight.
    pub starts_ignored: u64,
    /// Starts rejected by mode validation.
    pub validation_rejections: u64,
    /// Results derived from captured photos.
    pub results_derived: u64,
    /// Captures the user canceled.
    pub captures_canceled: u64,
    /// Cycles that ended in an error.
    pub cycles_failed: u64,
    /// Moments saved.
    pub saves_succeeded: u64,
    /// Save attempts that failed.
    pub saves_failed: u64,
    /// Stale transient photos removed.
    pub stale_photos_removed: u64,
    /// Moments currently in the store.
    pub moments_stored: usize,
}

/// Prometheus metrics registry for the capture lifecycle.
pub struct MetricsRegistry {
    registry: Registry,

    // Cycle metrics
    result_ready: IntGauge,
    cycles_started: IntCounter,
    starts_ignored: IntCounter,
    validation_rejections: IntCounter,
    results_derived: IntCounter,
    captures_canceled: IntCounter,
    cycles_failed: IntCounter,

    // Save metrics
    saves_succeeded: IntCounter,
    saves_failed: IntCounter,

    // Storage metrics
    stale_photos_removed: IntCounter,
    moments_stored: IntGauge,
}

impl MetricsRegistry {
    /// Creates a new registry with all lifecycle metrics registered.
    pub fn new() -> Result<Self, MetricsError> {
        let registry = Registry::new();

        let result_ready = IntGauge::new(
            "photo_seed_result_ready",
            "Whether a result is ready to be saved (1=ready, 0=not ready)",
        )?;
        let cycles_started = IntCounter::new(
            "photo_seed_cycles_started_total",
            "Total capture cycles launched",
        )?;
        let starts_ignored = IntCounter::new(
            "photo_seed_starts_ignored_total",
            "Start requests ignored while a cycle was in flight",
        )?;
        let validation_rejections = IntCounter::new(
            "photo_seed_validation_rejections_total",
            "Starts rejected by mode input validation",
        )?;
        let results_derived = IntCounter::new(
            "photo_seed_results_derived_total",
            "Results derived from captured photos",
        )?;
        let captures_canceled = IntCounter::new(
            "photo_seed_captures_canceled_total",
            "Captures canceled by the user",
        )?;
        let cycles_failed = IntCounter::new(
            "photo_seed_cycles_failed_total",
            "Capture cycles that ended in an error",
        )?;

        let saves_succeeded = IntCounter::new(
            "photo_seed_saves_succeeded_total",
            "Moments saved successfully",
        )?;
        let saves_failed = IntCounter::new(
            "photo_seed_saves_failed_total",
            "Save attempts that failed",
        )?;

        let stale_photos_removed = IntCounter::new(
            "photo_seed_stale_photos_removed_total",
            "Stale transient photos removed",
        )?;
        let moments_stored = IntGauge::new(
            "photo_seed_moments_stored",
            "Moments currently in the store",
        )?;

        registry.register(Box::new(result_ready.clone()))?;
        registry.register(Box::new(cycles_started.clone()))?;
        registry.register(Box::new(starts_ignored.clone()))?;
        registry.register(Box::new(validation_rejections.clone()))?;
        registry.register(Box::new(results_derived.clone()))?;
        registry.register(Box::new(captures_canceled.clone()))?;
        registry.register(Box::new(cycles_failed.clone()))?;
        registry.register(Box::new(saves_succeeded.clone()))?;
        registry.register(Box::new(saves_failed.clone()))?;
        registry.register(Box::new(stale_photos_removed.clone()))?;
        registry.register(Box::new(moments_stored.clone()))?;

        Ok(Self {
            registry,
            result_ready,
            cycles_started,
            starts_ignored,
            validation_rejections,
            results_derived,
            captures_canceled,
            cycles_failed,
            saves_succeeded,
            saves_failed,
            stale_photos_removed,
            moments_stored,
        })
    }

    /// Updates all metrics from a snapshot.
    ///
    /// Snapshot counters are lifetime totals; each Prometheus counter is
    /// advanced by the difference to its current value.
    pub fn update(&self, snapshot: &MetricsSnapshot) {
        self.result_ready.set(i64::from(snapshot.result_ready));
        self.moments_stored.set(snapshot.moments_stored as i64);

        advance(&self.cycles_started, snapshot.cycles_started);
        advance(&self.starts_ignored, snapshot.starts_ignored);
        advance(&self.validation_rejections, snapshot.validation_rejections);
        advance(&self.results_derived, snapshot.results_derived);
        advance(&self.captures_canceled, snapshot.captures_canceled);
        advance(&self.cycles_failed, snapshot.cycles_failed);
        advance(&self.saves_succeeded, snapshot.saves_succeeded);
        advance(&self.saves_failed, snapshot.saves_failed);
        advance(&self.stale_photos_removed, snapshot.stale_photos_removed);
    }

    /// Returns the underlying Prometheus registry.
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Encodes all metrics in Prometheus text format.
    pub fn encode(&self) -> Result<String, MetricsError> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        Ok(String::from_utf8_lossy(&buffer).into_owned())
    }
}

fn advance(counter: &IntCounter, total: u64) {
    let current = counter.get();
    if total > current {
        counter.inc_by(total - current);
    }
}

impl MetricsSnapshot {
    /// Creates a snapshot from lifecycle counters and the stored moment count.
    pub fn from_components(stats: &LifecycleStats, phase: CyclePhase, moments_stored: usize) -> Self {
        Self {
            result_ready: phase == CyclePhase::ResultReady,
            cycles_started: stats.cycles_started,
            starts_ignored: stats.starts_ignored,
            validation_rejections: stats.validation_rejections,
            results_derived: stats.results_derived,
            captures_canceled: stats.captures_canceled,
            cycles_failed: stats.cycles_failed,
            saves_succeeded: stats.saves_succeeded,
            saves_failed: stats.saves_failed,
            stale_photos_removed: stats.stale_photos_removed,
            moments_stored,
        }
    }
}
