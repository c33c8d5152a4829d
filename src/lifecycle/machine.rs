//! The capture lifecycle state machine.

use super::collaborators::{Capability, PermissionGate, StatusMessage, UiFeedback};
use super::result::SeedResult;
use super::state::{CyclePhase, CycleState};
use super::strategy::{ModeStrategy, ValidationError};
use crate::capture::{
    AreaError, CameraCapture, CaptureConfig, CaptureOutcome, CapturedPhoto, PhotoArea, PhotoError,
};
use crate::seed::SeedGenerator;
use crate::store::{MomentRepository, SavedMoment, StoreError};
use chrono::Utc;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::mpsc;
use uuid::Uuid;

/// Why a cycle step did not complete.
///
/// None of these are fatal: by the time one is returned the lifecycle has
/// settled in `Idle` or `ResultReady` and the UI has been told.
#[derive(Debug, Error)]
pub enum CycleError {
    #[error("invalid input: {0}")]
    Validation(#[from] ValidationError),
    #[error("no capture device available")]
    CaptureUnavailable,
    #[error("{0} permission required")]
    PermissionRequired(Capability),
    #[error("capture failed: {0}")]
    CaptureFailed(String),
    #[error("capture canceled")]
    CaptureCanceled,
    #[error("unusable photo: {0}")]
    Photo(#[from] PhotoError),
    #[error("photo file error: {0}")]
    Area(#[from] AreaError),
    #[error("failed to store moment: {0}")]
    Persistence(#[from] StoreError),
    #[error("no result to save")]
    NothingToSave,
    #[error("photo for the ready result is gone: {}", .0.display())]
    SavePhotoMissing(PathBuf),
}

impl CycleError {
    fn status(&self) -> StatusMessage {
        match self {
            CycleError::Validation(e) => StatusMessage::InvalidInput(e.to_string()),
            CycleError::CaptureUnavailable => StatusMessage::NoCamera,
            CycleError::PermissionRequired(capability) => {
                StatusMessage::PermissionRequired(*capability)
            }
            CycleError::CaptureCanceled => StatusMessage::Canceled,
            CycleError::CaptureFailed(_) | CycleError::Photo(_) | CycleError::Area(_) => {
                StatusMessage::Error
            }
            CycleError::Persistence(_)
            | CycleError::NothingToSave
            | CycleError::SavePhotoMissing(_) => StatusMessage::SaveError,
        }
    }
}

/// Events fed back to the lifecycle by its spawned steps.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LifecycleEvent {
    CaptureReturned { cycle: u64, outcome: CaptureOutcome },
    ProcessingElapsed { cycle: u64 },
}

/// Result of a start request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartOutcome {
    /// A new cycle was launched.
    Started { cycle: u64 },
    /// A cycle was already in flight; nothing changed.
    Ignored,
}

/// Result of a save request that did not fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveOutcome {
    Saved(SavedMoment),
    /// The user dismissed the annotation prompt.
    Dismissed,
}

/// Counters over the lifetime of a lifecycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LifecycleStats {
    pub cycles_started: u64,
    pub starts_ignored: u64,
    pub validation_rejections: u64,
    pub results_derived: u64,
    pub captures_canceled: u64,
    pub cycles_failed: u64,
    pub saves_succeeded: u64,
    pub saves_failed: u64,
    pub stale_photos_removed: u64,
}

/// External collaborators of a lifecycle.
pub struct Collaborators {
    pub camera: Arc<dyn CameraCapture>,
    pub permissions: Arc<dyn PermissionGate>,
    pub ui: Arc<dyn UiFeedback>,
}

/// Drives capture cycles for one mode.
///
/// Must be used from within a Tokio runtime: starting a capture spawns the
/// camera request and entering processing spawns the delay timer.
pub struct CaptureLifecycle<M: ModeStrategy> {
    state: CycleState,
    strategy: M,
    generator: SeedGenerator,
    store: Arc<dyn MomentRepository>,
    area: PhotoArea,
    camera: Arc<dyn CameraCapture>,
    permissions: Arc<dyn PermissionGate>,
    ui: Arc<dyn UiFeedback>,
    processing_delay: Duration,
    max_annotation_chars: usize,
    next_cycle: u64,
    stats: LifecycleStats,
    events_tx: mpsc::UnboundedSender<LifecycleEvent>,
    events_rx: mpsc::UnboundedReceiver<LifecycleEvent>,
}

impl<M: ModeStrategy> CaptureLifecycle<M> {
    /// Creates an idle lifecycle and clears photos left by earlier runs.
    pub fn new(
        strategy: M,
        store: Arc<dyn MomentRepository>,
        area: PhotoArea,
        collaborators: Collaborators,
        config: &CaptureConfig,
    ) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let mut lifecycle = Self {
            state: CycleState::Idle,
            strategy,
            generator: SeedGenerator::new(config.hash_algorithm),
            store,
            area,
            camera: collaborators.camera,
            permissions: collaborators.permissions,
            ui: collaborators.ui,
            processing_delay: Duration::from_millis(config.processing_delay_ms),
            max_annotation_chars: config.max_annotation_chars,
            next_cycle: 1,
            stats: LifecycleStats::default(),
            events_tx,
            events_rx,
        };
        lifecycle.sweep_stale();
        lifecycle.ui.set_save_available(false);
        tracing::info!(mode = lifecycle.strategy.mode_id(), "Capture lifecycle ready");
        lifecycle
    }

    pub fn state(&self) -> &CycleState {
        &self.state
    }

    pub fn phase(&self) -> CyclePhase {
        self.state.phase()
    }

    pub fn stats(&self) -> LifecycleStats {
        self.stats
    }

    pub fn strategy(&self) -> &M {
        &self.strategy
    }

    pub fn strategy_mut(&mut self) -> &mut M {
        &mut self.strategy
    }

    /// Deletes transient photos other than the one the current cycle owns.
    pub fn sweep_stale(&mut self) -> usize {
        let removed = self.area.sweep_stale(self.state.photo());
        self.stats.stale_photos_removed += removed as u64;
        removed
    }

    /// Starts a new cycle.
    ///
    /// Ignored while a capture, processing delay or save is in flight. A
    /// finished but unsaved result is discarded.
    pub fn start_capture(&mut self) -> Result<StartOutcome, CycleError> {
        if !self.state.accepts_start() {
            self.stats.starts_ignored += 1;
            tracing::debug!(phase = %self.phase(), "Capture already in flight, ignoring start");
            return Ok(StartOutcome::Ignored);
        }

        if let Err(e) = self.strategy.prepare_capture() {
            // A ready result stays on screen while it can still be saved.
            if self.state.result().is_none() {
                self.strategy.reset_ui(self.ui.as_ref());
            }
            self.stats.validation_rejections += 1;
            tracing::info!(error = %e, "Capture input rejected");
            let error = CycleError::Validation(e);
            self.ui.show_status(error.status());
            return Err(error);
        }

        if !self.permissions.has_permission(Capability::Camera) {
            self.permissions.request(Capability::Camera);
            let error = CycleError::PermissionRequired(Capability::Camera);
            self.ui.show_status(error.status());
            return Err(error);
        }

        self.strategy.reset_ui(self.ui.as_ref());
        if let Some(previous) = std::mem::take(&mut self.state).photo() {
            self.area.discard(previous);
        }
        self.ui.set_save_available(false);

        if !self.camera.is_available() {
            return Err(self.fail(CycleError::CaptureUnavailable, None));
        }

        let photo = match self.area.allocate_transient() {
            Ok(photo) => photo,
            Err(e) => return Err(self.fail(e.into(), None)),
        };

        let cycle = self.next_cycle;
        self.next_cycle += 1;
        self.stats.cycles_started += 1;
        self.state = CycleState::AwaitingCapture {
            cycle,
            photo: photo.clone(),
        };
        self.ui.show_status(StatusMessage::Capturing);

        let camera = Arc::clone(&self.camera);
        let events = self.events_tx.clone();
        tokio::spawn(async move {
            let outcome = camera.request(&photo).await;
            let _ = events.send(LifecycleEvent::CaptureReturned { cycle, outcome });
        });

        tracing::info!(cycle, mode = self.strategy.mode_id(), "Capture cycle started");
        Ok(StartOutcome::Started { cycle })
    }

    /// Waits for the next event of the in-flight cycle.
    ///
    /// Returns `None` when nothing is pending.
    pub async fn next_event(&mut self) -> Option<LifecycleEvent> {
        match self.state {
            CycleState::AwaitingCapture { .. } | CycleState::Processing { .. } => {
                self.events_rx.recv().await
            }
            _ => None,
        }
    }

    /// Applies one event. Events from other cycles are dropped.
    pub fn handle_event(&mut self, event: LifecycleEvent) -> Result<(), CycleError> {
        match event {
            LifecycleEvent::CaptureReturned { cycle, outcome } => {
                let photo = match &self.state {
                    CycleState::AwaitingCapture { cycle: current, photo } if *current == cycle => {
                        photo.clone()
                    }
                    _ => {
                        tracing::debug!(cycle, "Dropping stale capture result");
                        return Ok(());
                    }
                };
                self.on_capture_returned(cycle, photo, outcome)
            }
            LifecycleEvent::ProcessingElapsed { cycle } => {
                match std::mem::take(&mut self.state) {
                    CycleState::Processing {
                        cycle: current,
                        photo,
                        result,
                    } if current == cycle => {
                        self.strategy.render_seed_result(&result, self.ui.as_ref());
                        self.state = CycleState::ResultReady { photo, result };
                        tracing::info!(cycle, "Result ready");
                    }
                    other => {
                        self.state = other;
                        tracing::debug!(cycle, "Dropping stale processing timer");
                    }
                }
                Ok(())
            }
        }
    }

    /// Processes events until nothing is pending and returns the settled phase.
    pub async fn run_until_settled(&mut self) -> Result<CyclePhase, CycleError> {
        while let Some(event) = self.next_event().await {
            self.handle_event(event)?;
        }
        Ok(self.phase())
    }

    /// Saves the ready result as a moment.
    ///
    /// Collects an annotation, copies the photo into the saved area and adds
    /// the moment to the store. If the store rejects it the copied photo is
    /// deleted again and the result stays ready for another attempt.
    pub async fn request_save(&mut self) -> Result<SaveOutcome, CycleError> {
        let (photo, result) = match std::mem::take(&mut self.state) {
            CycleState::ResultReady { photo, result } => (photo, result),
            other => {
                tracing::debug!(phase = %other.phase(), "Nothing to save");
                self.state = other;
                let error = CycleError::NothingToSave;
                self.ui.show_status(error.status());
                return Err(error);
            }
        };

        if !photo.is_file() {
            let error = CycleError::SavePhotoMissing(photo.clone());
            return Err(self.fail(error, Some(photo)));
        }

        if !self.permissions.has_permission(Capability::Storage) {
            self.permissions.request(Capability::Storage);
            self.state = CycleState::ResultReady { photo, result };
            let error = CycleError::PermissionRequired(Capability::Storage);
            self.ui.show_status(error.status());
            return Err(error);
        }

        self.state = CycleState::SavingPrompt {
            photo: photo.clone(),
            result: result.clone(),
        };
        let annotation = match self.ui.prompt_annotation(self.max_annotation_chars).await {
            Some(text) => text
                .trim()
                .chars()
                .take(self.max_annotation_chars)
                .collect::<String>(),
            None => {
                tracing::debug!("Annotation prompt dismissed");
                self.state = CycleState::ResultReady { photo, result };
                return Ok(SaveOutcome::Dismissed);
            }
        };

        self.state = CycleState::Saving {
            photo: photo.clone(),
            result: result.clone(),
        };
        self.ui.set_save_available(false);
        self.ui.show_status(StatusMessage::Saving);

        let saved_photo = match self.area.copy_to_saved(&photo) {
            Ok(path) => path,
            Err(e) => return Err(self.save_failed(photo, result, e.into())),
        };

        let moment = self.build_moment(&result, annotation, &saved_photo);
        if let Err(e) = self.store.add(moment.clone()) {
            self.area.discard(&saved_photo);
            return Err(self.save_failed(photo, result, e.into()));
        }

        self.area.discard(&photo);
        self.state = CycleState::Idle;
        self.stats.saves_succeeded += 1;
        self.ui.show_status(StatusMessage::Saved);
        tracing::info!(id = %moment.id, photo = %moment.photo_path, "Moment saved");
        Ok(SaveOutcome::Saved(moment))
    }

    fn on_capture_returned(
        &mut self,
        cycle: u64,
        photo: PathBuf,
        outcome: CaptureOutcome,
    ) -> Result<(), CycleError> {
        match outcome {
            CaptureOutcome::Canceled => {
                self.area.discard(&photo);
                self.state = CycleState::Idle;
                self.stats.captures_canceled += 1;
                self.ui.set_save_available(false);
                self.ui.show_status(StatusMessage::Canceled);
                self.strategy.reset_ui(self.ui.as_ref());
                tracing::info!(cycle, "Capture canceled");
                Err(CycleError::CaptureCanceled)
            }
            CaptureOutcome::Failed(reason) => {
                Err(self.fail(CycleError::CaptureFailed(reason), Some(photo)))
            }
            CaptureOutcome::Success => {
                let captured = match CapturedPhoto::read(&photo) {
                    Ok(captured) => captured,
                    Err(e) => return Err(self.fail(e.into(), Some(photo))),
                };
                tracing::debug!(cycle, photo = ?captured, "Photo captured");

                self.ui.set_save_available(true);
                let result = self
                    .strategy
                    .build_seed_result(&self.generator, captured.bytes());
                self.stats.results_derived += 1;
                self.state = CycleState::Processing {
                    cycle,
                    photo,
                    result,
                };
                self.ui.show_status(StatusMessage::Processing);

                let delay = self.processing_delay;
                let events = self.events_tx.clone();
                tokio::spawn(async move {
                    tokio::time::sleep(delay).await;
                    let _ = events.send(LifecycleEvent::ProcessingElapsed { cycle });
                });
                Ok(())
            }
        }
    }

    /// Ends the current cycle: discards its photo and returns to `Idle`.
    fn fail(&mut self, error: CycleError, photo: Option<PathBuf>) -> CycleError {
        if let Some(photo) = photo {
            self.area.discard(&photo);
        }
        self.state = CycleState::Idle;
        self.stats.cycles_failed += 1;
        self.ui.set_save_available(false);
        self.ui.show_status(error.status());
        self.strategy.reset_ui(self.ui.as_ref());
        tracing::warn!(error = %error, "Capture cycle failed");
        error
    }

    /// Keeps the result ready after a failed save attempt.
    fn save_failed(&mut self, photo: PathBuf, result: SeedResult, error: CycleError) -> CycleError {
        self.state = CycleState::ResultReady { photo, result };
        self.stats.saves_failed += 1;
        self.ui.show_status(StatusMessage::SaveError);
        self.ui.set_save_available(true);
        tracing::warn!(error = %error, "Save failed");
        error
    }

    fn build_moment(
        &self,
        result: &SeedResult,
        annotation: String,
        saved_photo: &std::path::Path,
    ) -> SavedMoment {
        SavedMoment {
            id: Uuid::new_v4().to_string(),
            created_at: Utc::now().timestamp_millis(),
            mode: self.strategy.mode_id().to_string(),
            result_title: result.title().to_string(),
            result_value: result.value().to_string(),
            annotation,
            photo_path: saved_photo.display().to_string(),
        }
    }
}
