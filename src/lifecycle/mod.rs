//! The capture-to-result-to-save cycle.
//!
//! # Architecture
//!
//! ```text
//! start ─► AwaitingExternalCapture ─► Processing ─► ResultReady ─► SavingPrompt ─► Saving ─► Idle
//!   │              │ canceled/failed                    ▲               │ dismissed      │ failed
//!   ▼              ▼                                    └───────────────┴────────────────┘
//! (rejected)      Idle
//! ```
//!
//! One cycle is in flight at a time. The camera request and the processing
//! delay run as spawned tasks that report back through an event channel;
//! the lifecycle consumes those events one by one, so steps of a cycle never
//! overlap and events from an earlier cycle are recognised and dropped.
//! Every failure resolves to `Idle` or `ResultReady` plus one status message.

mod collaborators;
mod machine;
mod result;
mod state;
mod strategy;

#[cfg(test)]
mod tests;

pub use collaborators::{Capability, GrantAll, PermissionGate, StatusMessage, UiFeedback};
pub use machine::{
    CaptureLifecycle, Collaborators, CycleError, LifecycleEvent, LifecycleStats, SaveOutcome,
    StartOutcome,
};
pub use result::{Outcome, SeedResult};
pub use state::{CyclePhase, CycleState};
pub use strategy::{CoinFlipMode, LuckyDigitsMode, ModeStrategy, ValidationError};
