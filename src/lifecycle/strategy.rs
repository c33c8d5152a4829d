//! Mode-specific hooks of the capture cycle.

use super::collaborators::{StatusMessage, UiFeedback};
use super::result::SeedResult;
use crate::seed::SeedGenerator;
use thiserror::Error;

/// Rejected mode input.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("enter a digit count from 1 to {max}")]
    InvalidDigitCount { max: u32 },
}

/// What a mode contributes to the shared cycle.
pub trait ModeStrategy: Send {
    /// Identifier stored with saved moments.
    fn mode_id(&self) -> &'static str;

    /// Validates mode input before the camera is involved.
    fn prepare_capture(&mut self) -> Result<(), ValidationError> {
        Ok(())
    }

    /// Derives this mode's result from the photo bytes.
    fn build_seed_result(&self, generator: &SeedGenerator, photo: &[u8]) -> SeedResult;

    /// Presents a finished result.
    fn render_seed_result(&self, result: &SeedResult, ui: &dyn UiFeedback) {
        ui.show_status(StatusMessage::Outcome(result.value().to_string()));
        ui.show_result(result);
    }

    /// Clears mode-specific display after a reset, cancel or failure.
    fn reset_ui(&mut self, _ui: &dyn UiFeedback) {}
}

/// Heads or tails.
#[derive(Debug, Clone, Copy, Default)]
pub struct CoinFlipMode;

impl ModeStrategy for CoinFlipMode {
    fn mode_id(&self) -> &'static str {
        "coin_flip"
    }

    fn build_seed_result(&self, generator: &SeedGenerator, photo: &[u8]) -> SeedResult {
        SeedResult::coin_flip(generator.coin_flip(photo))
    }
}

/// A user-chosen number of decimal digits.
///
/// The requested count is kept as the raw text the user typed and parsed
/// when a capture starts.
#[derive(Debug, Clone)]
pub struct LuckyDigitsMode {
    max_digits: u32,
    requested: String,
    pending_length: usize,
}

impl LuckyDigitsMode {
    pub fn new(max_digits: u32) -> Self {
        Self {
            max_digits,
            requested: String::new(),
            pending_length: 0,
        }
    }

    /// Sets the digit count input.
    pub fn set_requested(&mut self, input: impl Into<String>) {
        self.requested = input.into();
    }

    /// The digit count accepted by the last successful `prepare_capture`.
    pub fn pending_length(&self) -> usize {
        self.pending_length
    }

    pub fn max_digits(&self) -> u32 {
        self.max_digits
    }

    fn parse_requested(&self) -> Option<u32> {
        let length: u32 = self.requested.trim().parse().ok()?;
        (1..=self.max_digits).contains(&length).then_some(length)
    }
}

impl ModeStrategy for LuckyDigitsMode {
    fn mode_id(&self) -> &'static str {
        "lucky_digits"
    }

    fn prepare_capture(&mut self) -> Result<(), ValidationError> {
        let length = self
            .parse_requested()
            .ok_or(ValidationError::InvalidDigitCount {
                max: self.max_digits,
            })?;
        self.pending_length = length as usize;
        Ok(())
    }

    fn build_seed_result(&self, generator: &SeedGenerator, photo: &[u8]) -> SeedResult {
        SeedResult::lucky_digits(generator.lucky_digits(photo, self.pending_length))
    }

    fn render_seed_result(&self, result: &SeedResult, ui: &dyn UiFeedback) {
        ui.show_status(StatusMessage::Outcome("Your lucky digits".to_string()));
        ui.show_result(result);
    }

    fn reset_ui(&mut self, ui: &dyn UiFeedback) {
        ui.clear_result();
    }
}
