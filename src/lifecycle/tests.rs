use super::*;
use crate::capture::{CaptureConfig, CaptureOutcome, MockCamera, MockShot, PhotoArea};
use crate::seed::SeedGenerator;
use crate::store::{MomentRepository, MomentStore, SavedMoment, StoreError};
use async_trait::async_trait;
use std::collections::{HashSet, VecDeque};
use std::fs;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;

#[derive(Default)]
struct RecordingUi {
    statuses: Mutex<Vec<StatusMessage>>,
    results: Mutex<Vec<SeedResult>>,
    save_available: Mutex<Vec<bool>>,
    answers: Mutex<VecDeque<Option<String>>>,
    clears: AtomicUsize,
    prompts: AtomicUsize,
}

impl RecordingUi {
    fn answering(answers: impl IntoIterator<Item = Option<&'static str>>) -> Self {
        let ui = Self::default();
        ui.answers
            .lock()
            .unwrap()
            .extend(answers.into_iter().map(|a| a.map(String::from)));
        ui
    }

    fn statuses(&self) -> Vec<StatusMessage> {
        self.statuses.lock().unwrap().clone()
    }

    fn last_status(&self) -> Option<StatusMessage> {
        self.statuses.lock().unwrap().last().cloned()
    }

    fn save_available(&self) -> Option<bool> {
        self.save_available.lock().unwrap().last().copied()
    }

    fn results(&self) -> Vec<SeedResult> {
        self.results.lock().unwrap().clone()
    }
}

#[async_trait]
impl UiFeedback for RecordingUi {
    fn show_status(&self, message: StatusMessage) {
        self.statuses.lock().unwrap().push(message);
    }

    fn show_result(&self, result: &SeedResult) {
        self.results.lock().unwrap().push(result.clone());
    }

    fn clear_result(&self) {
        self.clears.fetch_add(1, Ordering::SeqCst);
    }

    async fn prompt_annotation(&self, _max_chars: usize) -> Option<String> {
        self.prompts.fetch_add(1, Ordering::SeqCst);
        self.answers
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Some(String::new()))
    }

    fn set_save_available(&self, available: bool) {
        self.save_available.lock().unwrap().push(available);
    }
}

#[derive(Default)]
struct Permissions {
    denied: Mutex<HashSet<Capability>>,
    requested: Mutex<Vec<Capability>>,
}

impl Permissions {
    fn denying(capability: Capability) -> Self {
        let permissions = Self::default();
        permissions.denied.lock().unwrap().insert(capability);
        permissions
    }
}

impl PermissionGate for Permissions {
    fn has_permission(&self, capability: Capability) -> bool {
        !self.denied.lock().unwrap().contains(&capability)
    }

    fn request(&self, capability: Capability) {
        self.requested.lock().unwrap().push(capability);
    }
}

struct FailingStore;

impl MomentRepository for FailingStore {
    fn load(&self) -> Vec<SavedMoment> {
        Vec::new()
    }

    fn add(&self, _moment: SavedMoment) -> Result<(), StoreError> {
        Err(StoreError::Io(std::io::Error::new(
            std::io::ErrorKind::Other,
            "disk full",
        )))
    }

    fn update_annotation(&self, id: &str, _annotation: &str) -> Result<SavedMoment, StoreError> {
        Err(StoreError::NotFound(id.to_string()))
    }
}

struct Harness<M: ModeStrategy> {
    _dir: TempDir,
    lifecycle: CaptureLifecycle<M>,
    ui: Arc<RecordingUi>,
    camera: Arc<MockCamera>,
    permissions: Arc<Permissions>,
    store: Arc<MomentStore>,
    area: PhotoArea,
}

struct Setup {
    camera: MockCamera,
    ui: RecordingUi,
    permissions: Permissions,
    failing_store: bool,
    config: CaptureConfig,
}

impl Default for Setup {
    fn default() -> Self {
        Self {
            camera: MockCamera::new(),
            ui: RecordingUi::default(),
            permissions: Permissions::default(),
            failing_store: false,
            config: CaptureConfig::default(),
        }
    }
}

fn area_in(dir: &TempDir) -> PhotoArea {
    PhotoArea::new(dir.path().join("captures"), dir.path().join("saved"), "CAMRNG_")
}

fn harness_in<M: ModeStrategy>(dir: TempDir, mode: M, setup: Setup) -> Harness<M> {
    let area = area_in(&dir);
    let store = Arc::new(
        MomentStore::new(dir.path().join("saved_moments.json")).with_saved_dir(area.saved_dir()),
    );
    let repository: Arc<dyn MomentRepository> = if setup.failing_store {
        Arc::new(FailingStore)
    } else {
        store.clone() as Arc<dyn MomentRepository>
    };
    let ui = Arc::new(setup.ui);
    let camera = Arc::new(setup.camera);
    let permissions = Arc::new(setup.permissions);

    let lifecycle = CaptureLifecycle::new(
        mode,
        repository,
        area.clone(),
        Collaborators {
            camera: camera.clone(),
            permissions: permissions.clone(),
            ui: ui.clone(),
        },
        &setup.config,
    );

    Harness {
        _dir: dir,
        lifecycle,
        ui,
        camera,
        permissions,
        store,
        area,
    }
}

fn harness<M: ModeStrategy>(mode: M, setup: Setup) -> Harness<M> {
    harness_in(TempDir::new().unwrap(), mode, setup)
}

fn lucky(input: &str) -> LuckyDigitsMode {
    let mut mode = LuckyDigitsMode::new(12);
    mode.set_requested(input);
    mode
}

fn files_in(dir: &std::path::Path) -> Vec<PathBuf> {
    match fs::read_dir(dir) {
        Ok(entries) => entries.flatten().map(|e| e.path()).collect(),
        Err(_) => Vec::new(),
    }
}

fn sample_photo() -> Vec<u8> {
    MockCamera::render_frame(32, 24, 7).unwrap()
}

async fn ready<M: ModeStrategy>(h: &mut Harness<M>) {
    assert!(matches!(
        h.lifecycle.start_capture(),
        Ok(StartOutcome::Started { .. })
    ));
    assert_eq!(h.lifecycle.run_until_settled().await.unwrap(), CyclePhase::ResultReady);
}

#[tokio::test(start_paused = true)]
async fn test_coin_flip_cycle_reaches_result_ready() {
    let mut h = harness(CoinFlipMode, Setup::default());
    assert_eq!(h.lifecycle.phase(), CyclePhase::Idle);

    let started = h.lifecycle.start_capture().unwrap();
    assert_eq!(started, StartOutcome::Started { cycle: 1 });
    assert_eq!(h.lifecycle.phase(), CyclePhase::AwaitingExternalCapture);

    assert_eq!(h.lifecycle.run_until_settled().await.unwrap(), CyclePhase::ResultReady);
    assert_eq!(h.camera.requests(), 1);
    assert_eq!(h.ui.results().len(), 1);
    assert_eq!(h.ui.save_available(), Some(true));

    let statuses = h.ui.statuses();
    assert_eq!(statuses[0], StatusMessage::Capturing);
    assert!(statuses.contains(&StatusMessage::Processing));
    assert!(matches!(h.ui.last_status(), Some(StatusMessage::Outcome(_))));

    let photo = h.lifecycle.state().photo().unwrap().to_path_buf();
    assert!(photo.exists());
    assert!(photo.starts_with(h.area.temp_dir()));
}

#[tokio::test(start_paused = true)]
async fn test_lucky_digits_deterministic_for_photo() {
    let bytes = sample_photo();
    let expected = SeedGenerator::default().lucky_digits(&bytes, 6);

    for _ in 0..2 {
        let setup = Setup {
            camera: MockCamera::scripted([MockShot::Photo(bytes.clone())]),
            ..Default::default()
        };
        let mut h = harness(lucky("6"), setup);
        ready(&mut h).await;

        let result = h.lifecycle.state().result().unwrap().clone();
        let text = result.result_text().unwrap();
        assert_eq!(text.len(), 6);
        assert!(text.chars().all(|c| c.is_ascii_digit()));
        assert_eq!(text, expected);
        assert_eq!(h.ui.results(), vec![result]);
    }
}

#[tokio::test(start_paused = true)]
async fn test_processing_delay_precedes_result() {
    let mut h = harness(CoinFlipMode, Setup::default());
    let begin = tokio::time::Instant::now();

    h.lifecycle.start_capture().unwrap();
    let event = h.lifecycle.next_event().await.unwrap();
    h.lifecycle.handle_event(event).unwrap();

    assert_eq!(h.lifecycle.phase(), CyclePhase::Processing);
    assert!(h.lifecycle.state().result().is_some());
    assert!(h.ui.results().is_empty());
    assert_eq!(h.ui.save_available(), Some(true));

    h.lifecycle.run_until_settled().await.unwrap();
    assert!(begin.elapsed() >= Duration::from_millis(1200));
    assert_eq!(h.ui.results().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_start_while_in_flight_is_noop() {
    let mut h = harness(CoinFlipMode, Setup::default());
    h.lifecycle.start_capture().unwrap();

    let state = h.lifecycle.state().clone();
    let temp_files = files_in(h.area.temp_dir());
    let save_toggles = h.ui.save_available.lock().unwrap().len();

    assert_eq!(h.lifecycle.start_capture().unwrap(), StartOutcome::Ignored);
    assert_eq!(h.lifecycle.state(), &state);
    assert_eq!(files_in(h.area.temp_dir()), temp_files);
    assert_eq!(h.ui.save_available.lock().unwrap().len(), save_toggles);

    // Still ignored while processing.
    let event = h.lifecycle.next_event().await.unwrap();
    h.lifecycle.handle_event(event).unwrap();
    assert_eq!(h.lifecycle.start_capture().unwrap(), StartOutcome::Ignored);

    h.lifecycle.run_until_settled().await.unwrap();
    assert_eq!(h.camera.requests(), 1);
    assert_eq!(h.lifecycle.stats().starts_ignored, 2);
    assert_eq!(h.lifecycle.stats().cycles_started, 1);
}

#[tokio::test(start_paused = true)]
async fn test_validation_failure_skips_camera() {
    let mut h = harness(lucky("0"), Setup::default());

    let err = h.lifecycle.start_capture().unwrap_err();
    assert!(matches!(
        err,
        CycleError::Validation(ValidationError::InvalidDigitCount { max: 12 })
    ));
    tokio::task::yield_now().await;

    assert_eq!(h.lifecycle.phase(), CyclePhase::Idle);
    assert_eq!(h.camera.requests(), 0);
    assert!(files_in(h.area.temp_dir()).is_empty());
    assert_eq!(
        h.ui.last_status(),
        Some(StatusMessage::InvalidInput(
            "enter a digit count from 1 to 12".to_string()
        ))
    );
    assert!(h.ui.clears.load(Ordering::SeqCst) >= 1);
    assert_eq!(h.lifecycle.stats().validation_rejections, 1);
}

#[tokio::test(start_paused = true)]
async fn test_rejected_restart_keeps_ready_result_displayed() {
    let mut h = harness(lucky("6"), Setup::default());
    ready(&mut h).await;
    let state = h.lifecycle.state().clone();
    let clears = h.ui.clears.load(Ordering::SeqCst);

    h.lifecycle.strategy_mut().set_requested("0");
    let err = h.lifecycle.start_capture().unwrap_err();
    assert!(matches!(err, CycleError::Validation(_)));

    h.lifecycle.strategy_mut().set_requested("6");
    h.permissions.denied.lock().unwrap().insert(Capability::Camera);
    let err = h.lifecycle.start_capture().unwrap_err();
    assert!(matches!(err, CycleError::PermissionRequired(Capability::Camera)));

    assert_eq!(h.ui.clears.load(Ordering::SeqCst), clears);
    assert_eq!(h.lifecycle.state(), &state);
    assert!(state.photo().unwrap().exists());
    assert_eq!(h.ui.save_available(), Some(true));
}

#[tokio::test(start_paused = true)]
async fn test_cancel_deletes_transient_photo() {
    let setup = Setup {
        camera: MockCamera::scripted([MockShot::Canceled]),
        ..Default::default()
    };
    let mut h = harness(CoinFlipMode, setup);
    h.lifecycle.start_capture().unwrap();
    assert_eq!(files_in(h.area.temp_dir()).len(), 1);

    let err = h.lifecycle.run_until_settled().await.unwrap_err();
    assert!(matches!(err, CycleError::CaptureCanceled));
    assert_eq!(h.lifecycle.phase(), CyclePhase::Idle);
    assert!(files_in(h.area.temp_dir()).is_empty());
    assert_eq!(h.ui.last_status(), Some(StatusMessage::Canceled));
    assert_eq!(h.ui.save_available(), Some(false));
    assert_eq!(h.lifecycle.stats().captures_canceled, 1);
}

#[tokio::test(start_paused = true)]
async fn test_capture_failure_paths_return_to_idle() {
    let shots = [
        MockShot::Failed,
        MockShot::SuccessWithoutOutput,
        MockShot::Photo(b"not an image".to_vec()),
    ];
    for shot in shots {
        let setup = Setup {
            camera: MockCamera::scripted([shot.clone()]),
            ..Default::default()
        };
        let mut h = harness(lucky("4"), setup);
        h.lifecycle.start_capture().unwrap();

        let err = h.lifecycle.run_until_settled().await.unwrap_err();
        assert!(
            matches!(err, CycleError::CaptureFailed(_) | CycleError::Photo(_)),
            "{:?} -> {:?}",
            shot,
            err
        );
        assert_eq!(h.lifecycle.phase(), CyclePhase::Idle);
        assert!(files_in(h.area.temp_dir()).is_empty());
        assert_eq!(h.ui.last_status(), Some(StatusMessage::Error));
        assert_eq!(h.ui.save_available(), Some(false));
        assert!(h.ui.results().is_empty());
        assert_eq!(h.lifecycle.stats().cycles_failed, 1);
    }
}

#[tokio::test(start_paused = true)]
async fn test_unavailable_camera() {
    let setup = Setup {
        camera: MockCamera::unavailable(),
        ..Default::default()
    };
    let mut h = harness(CoinFlipMode, setup);

    let err = h.lifecycle.start_capture().unwrap_err();
    assert!(matches!(err, CycleError::CaptureUnavailable));
    assert_eq!(h.lifecycle.phase(), CyclePhase::Idle);
    assert_eq!(h.ui.last_status(), Some(StatusMessage::NoCamera));
    assert!(files_in(h.area.temp_dir()).is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_missing_camera_permission_requests_it() {
    let setup = Setup {
        permissions: Permissions::denying(Capability::Camera),
        ..Default::default()
    };
    let mut h = harness(CoinFlipMode, setup);

    let err = h.lifecycle.start_capture().unwrap_err();
    assert!(matches!(err, CycleError::PermissionRequired(Capability::Camera)));
    tokio::task::yield_now().await;

    assert_eq!(h.camera.requests(), 0);
    assert_eq!(h.lifecycle.phase(), CyclePhase::Idle);
    assert_eq!(
        h.permissions.requested.lock().unwrap().as_slice(),
        &[Capability::Camera]
    );
    assert_eq!(
        h.ui.last_status(),
        Some(StatusMessage::PermissionRequired(Capability::Camera))
    );
}

#[tokio::test(start_paused = true)]
async fn test_save_success_persists_moment() {
    let setup = Setup {
        ui: RecordingUi::answering([Some("  lucky day  ")]),
        ..Default::default()
    };
    let mut h = harness(CoinFlipMode, setup);
    ready(&mut h).await;

    let transient = h.lifecycle.state().photo().unwrap().to_path_buf();
    let result = h.lifecycle.state().result().unwrap().clone();

    let moment = match h.lifecycle.request_save().await.unwrap() {
        SaveOutcome::Saved(moment) => moment,
        other => panic!("unexpected outcome {:?}", other),
    };

    assert_eq!(h.lifecycle.phase(), CyclePhase::Idle);
    assert!(!transient.exists());
    assert!(files_in(h.area.temp_dir()).is_empty());

    let saved_photo = PathBuf::from(&moment.photo_path);
    assert!(saved_photo.exists());
    assert!(saved_photo.starts_with(h.area.saved_dir()));

    assert_eq!(moment.annotation, "lucky day");
    assert_eq!(moment.mode, "coin_flip");
    assert_eq!(moment.result_title, result.title());
    assert_eq!(moment.result_value, result.value());
    assert_eq!(h.store.load(), vec![moment]);

    assert_eq!(h.ui.last_status(), Some(StatusMessage::Saved));
    assert_eq!(h.ui.save_available(), Some(false));
    assert_eq!(h.lifecycle.stats().saves_succeeded, 1);
}

#[tokio::test(start_paused = true)]
async fn test_annotation_capped_at_limit() {
    let setup = Setup {
        ui: RecordingUi::answering([Some("abcdefghij")]),
        config: CaptureConfig {
            max_annotation_chars: 4,
            ..Default::default()
        },
        ..Default::default()
    };
    let mut h = harness(CoinFlipMode, setup);
    ready(&mut h).await;

    match h.lifecycle.request_save().await.unwrap() {
        SaveOutcome::Saved(moment) => assert_eq!(moment.annotation, "abcd"),
        other => panic!("unexpected outcome {:?}", other),
    }
}

#[tokio::test(start_paused = true)]
async fn test_dismissed_prompt_keeps_result() {
    let setup = Setup {
        ui: RecordingUi::answering([None]),
        ..Default::default()
    };
    let mut h = harness(CoinFlipMode, setup);
    ready(&mut h).await;
    let state = h.lifecycle.state().clone();

    assert_eq!(h.lifecycle.request_save().await.unwrap(), SaveOutcome::Dismissed);
    assert_eq!(h.lifecycle.state(), &state);
    assert!(state.photo().unwrap().exists());
    assert!(h.store.load().is_empty());
    assert_eq!(h.ui.prompts.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn test_save_without_result_reports_error() {
    let mut h = harness(CoinFlipMode, Setup::default());

    let err = h.lifecycle.request_save().await.unwrap_err();
    assert!(matches!(err, CycleError::NothingToSave));
    assert_eq!(h.ui.last_status(), Some(StatusMessage::SaveError));
    assert_eq!(h.ui.prompts.load(Ordering::SeqCst), 0);
    assert_eq!(h.lifecycle.phase(), CyclePhase::Idle);
}

#[tokio::test(start_paused = true)]
async fn test_save_with_vanished_photo_reports_save_error() {
    let mut h = harness(CoinFlipMode, Setup::default());
    ready(&mut h).await;
    let transient = h.lifecycle.state().photo().unwrap().to_path_buf();
    fs::remove_file(&transient).unwrap();

    let err = h.lifecycle.request_save().await.unwrap_err();
    assert!(matches!(err, CycleError::SavePhotoMissing(ref path) if *path == transient));
    assert_eq!(h.ui.last_status(), Some(StatusMessage::SaveError));
    assert_eq!(h.lifecycle.phase(), CyclePhase::Idle);
    assert_eq!(h.ui.save_available(), Some(false));
    assert_eq!(h.ui.prompts.load(Ordering::SeqCst), 0);
    assert!(h.store.load().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_store_failure_rolls_back_copied_photo() {
    let setup = Setup {
        failing_store: true,
        ..Default::default()
    };
    let mut h = harness(CoinFlipMode, setup);
    ready(&mut h).await;
    let state = h.lifecycle.state().clone();

    let err = h.lifecycle.request_save().await.unwrap_err();
    assert!(matches!(err, CycleError::Persistence(_)));

    assert_eq!(h.lifecycle.state(), &state);
    assert!(state.photo().unwrap().exists());
    assert!(files_in(h.area.saved_dir()).is_empty());
    assert_eq!(h.ui.last_status(), Some(StatusMessage::SaveError));
    assert_eq!(h.ui.save_available(), Some(true));
    assert_eq!(h.lifecycle.stats().saves_failed, 1);
}

#[tokio::test(start_paused = true)]
async fn test_copy_failure_keeps_result() {
    let dir = TempDir::new().unwrap();
    // A regular file where the saved directory should be.
    fs::write(dir.path().join("saved"), b"blocker").unwrap();
    let mut h = harness_in(dir, CoinFlipMode, Setup::default());
    ready(&mut h).await;

    let err = h.lifecycle.request_save().await.unwrap_err();
    assert!(matches!(err, CycleError::Area(_)));
    assert_eq!(h.lifecycle.phase(), CyclePhase::ResultReady);
    assert!(h.store.load().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_missing_storage_permission_keeps_result() {
    let setup = Setup {
        permissions: Permissions::denying(Capability::Storage),
        ..Default::default()
    };
    let mut h = harness(CoinFlipMode, setup);
    ready(&mut h).await;

    let err = h.lifecycle.request_save().await.unwrap_err();
    assert!(matches!(err, CycleError::PermissionRequired(Capability::Storage)));
    assert_eq!(h.lifecycle.phase(), CyclePhase::ResultReady);
    assert_eq!(h.ui.prompts.load(Ordering::SeqCst), 0);
}

#[tokio::test(start_paused = true)]
async fn test_new_cycle_discards_unsaved_result() {
    let mut h = harness(CoinFlipMode, Setup::default());
    ready(&mut h).await;
    let first_photo = h.lifecycle.state().photo().unwrap().to_path_buf();

    assert_eq!(
        h.lifecycle.start_capture().unwrap(),
        StartOutcome::Started { cycle: 2 }
    );
    assert!(!first_photo.exists());
    assert_eq!(h.ui.save_available(), Some(false));

    assert_eq!(h.lifecycle.run_until_settled().await.unwrap(), CyclePhase::ResultReady);
    assert_eq!(files_in(h.area.temp_dir()).len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_stale_events_dropped() {
    let mut h = harness(CoinFlipMode, Setup::default());

    h.lifecycle
        .handle_event(LifecycleEvent::CaptureReturned {
            cycle: 42,
            outcome: CaptureOutcome::Success,
        })
        .unwrap();
    h.lifecycle
        .handle_event(LifecycleEvent::ProcessingElapsed { cycle: 42 })
        .unwrap();

    assert_eq!(h.lifecycle.phase(), CyclePhase::Idle);
    assert!(h.ui.results().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_startup_sweeps_stale_photos() {
    let dir = TempDir::new().unwrap();
    let area = area_in(&dir);
    fs::create_dir_all(area.temp_dir()).unwrap();
    let stale = area.temp_dir().join("CAMRNG_20240101_120000_deadbeef.jpg");
    let unrelated = area.temp_dir().join("keep-me.png");
    fs::write(&stale, b"old").unwrap();
    fs::write(&unrelated, b"other").unwrap();

    let h = harness_in(dir, CoinFlipMode, Setup::default());

    assert!(!stale.exists());
    assert!(unrelated.exists());
    assert_eq!(h.lifecycle.stats().stale_photos_removed, 1);
    assert_eq!(h.ui.save_available(), Some(false));
}
