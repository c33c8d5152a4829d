//! Photo Seed Library
//!
//! Turns a captured photograph into a reproducible coin flip or string of
//! lucky digits, and keeps a history of the moments worth remembering.
//!
//! # Architecture
//!
//! ```text
//! capture → seed → lifecycle → store
//!    ↓                 ↓
//!  photo area        metrics
//! ```
//!
//! # Design Principles
//!
//! - **Deterministic**: identical photo bytes always yield identical results
//! - **Crash-safe history**: the moment file is replaced atomically and read leniently
//! - **Nothing leaks**: transient photos are deleted on cancel, failure, save or restart
//! - **No cryptographic claims**: outputs are as unpredictable as the photo, no more
//!
//! # Example
//!
//! ```no_run
//! use photo_seed::{
//!     capture::{CaptureConfig, MockCamera, PhotoArea},
//!     lifecycle::{CaptureLifecycle, CoinFlipMode, Collaborators, GrantAll},
//!     store::MomentStore,
//! };
//! # use photo_seed::lifecycle::{SeedResult, StatusMessage, UiFeedback};
//! # struct Console;
//! # #[async_trait::async_trait]
//! # impl UiFeedback for Console {
//! #     fn show_status(&self, message: StatusMessage) { println!("{}", message); }
//! #     fn show_result(&self, _result: &SeedResult) {}
//! #     async fn prompt_annotation(&self, _max: usize) -> Option<String> { None }
//! #     fn set_save_available(&self, _available: bool) {}
//! # }
//! use std::sync::Arc;
//!
//! # async fn run() {
//! let area = PhotoArea::new("data/captures", "data/saved", "CAMRNG_");
//! let store = Arc::new(MomentStore::new("data/saved_moments.json").with_saved_dir("data/saved"));
//! let collaborators = Collaborators {
//!     camera: Arc::new(MockCamera::new()),
//!     permissions: Arc::new(GrantAll),
//!     ui: Arc::new(Console),
//! };
//!
//! let mut lifecycle =
//!     CaptureLifecycle::new(CoinFlipMode, store, area, collaborators, &CaptureConfig::default());
//! lifecycle.start_capture().unwrap();
//! lifecycle.run_until_settled().await.unwrap();
//! # }
//! ```

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]
#![deny(unsafe_code)]

pub mod capture;
pub mod lifecycle;
pub mod metrics;
pub mod seed;
pub mod store;

// Re-export commonly used types at crate root
pub use capture::{CameraCapture, CaptureConfig, FileConfig, MockCamera, PhotoArea};
pub use lifecycle::{CaptureLifecycle, CoinFlipMode, CyclePhase, LuckyDigitsMode, SeedResult};
pub use seed::{HashAlgorithm, SeedGenerator};
pub use store::{MomentRepository, MomentStore, SavedMoment};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
