//! Lifecycle state.

use super::result::SeedResult;
use std::path::{Path, PathBuf};

/// State of the capture lifecycle.
///
/// Each variant carries exactly the data valid in it: a result never exists
/// without its transient photo, and no photo exists while idle.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum CycleState {
    #[default]
    Idle,
    /// The camera has been handed `photo` and has not answered yet.
    AwaitingCapture { cycle: u64, photo: PathBuf },
    /// The result is derived; the processing delay is running.
    Processing {
        cycle: u64,
        photo: PathBuf,
        result: SeedResult,
    },
    ResultReady { photo: PathBuf, result: SeedResult },
    /// Waiting for the user's annotation.
    SavingPrompt { photo: PathBuf, result: SeedResult },
    Saving { photo: PathBuf, result: SeedResult },
}

impl CycleState {
    pub fn phase(&self) -> CyclePhase {
        match self {
            CycleState::Idle => CyclePhase::Idle,
            CycleState::AwaitingCapture { .. } => CyclePhase::AwaitingExternalCapture,
            CycleState::Processing { .. } => CyclePhase::Processing,
            CycleState::ResultReady { .. } => CyclePhase::ResultReady,
            CycleState::SavingPrompt { .. } => CyclePhase::SavingPrompt,
            CycleState::Saving { .. } => CyclePhase::Saving,
        }
    }

    /// The transient photo owned by the current cycle, if any.
    pub fn photo(&self) -> Option<&Path> {
        match self {
            CycleState::Idle => None,
            CycleState::AwaitingCapture { photo, .. }
            | CycleState::Processing { photo, .. }
            | CycleState::ResultReady { photo, .. }
            | CycleState::SavingPrompt { photo, .. }
            | CycleState::Saving { photo, .. } => Some(photo),
        }
    }

    /// The derived result, if any.
    pub fn result(&self) -> Option<&SeedResult> {
        match self {
            CycleState::Idle | CycleState::AwaitingCapture { .. } => None,
            CycleState::Processing { result, .. }
            | CycleState::ResultReady { result, .. }
            | CycleState::SavingPrompt { result, .. }
            | CycleState::Saving { result, .. } => Some(result),
        }
    }

    /// True when a new cycle may begin: nothing is in flight.
    pub fn accepts_start(&self) -> bool {
        matches!(self, CycleState::Idle | CycleState::ResultReady { .. })
    }
}

/// Data-free view of [`CycleState`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CyclePhase {
    Idle,
    AwaitingExternalCapture,
    Processing,
    ResultReady,
    SavingPrompt,
    Saving,
}

impl std::fmt::Display for CyclePhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            CyclePhase::Idle => "idle",
            CyclePhase::AwaitingExternalCapture => "awaiting_capture",
            CyclePhase::Processing => "processing",
            CyclePhase::ResultReady => "result_ready",
            CyclePhase::SavingPrompt => "saving_prompt",
            CyclePhase::Saving => "saving",
        };
        f.write_str(name)
    }
}
