//! The result of one capture cycle.

/// What the generator produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Heads,
    Tails,
    LuckyDigits,
}

/// A generated result, created once per cycle and never modified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeedResult {
    outcome: Outcome,
    result_text: Option<String>,
    title: String,
    value: String,
}

impl SeedResult {
    /// Result of a coin flip.
    pub fn coin_flip(heads: bool) -> Self {
        let (outcome, value) = if heads {
            (Outcome::Heads, "Heads")
        } else {
            (Outcome::Tails, "Tails")
        };
        Self {
            outcome,
            result_text: None,
            title: "Coin flip".to_string(),
            value: value.to_string(),
        }
    }

    /// Result of a lucky digits draw.
    pub fn lucky_digits(digits: String) -> Self {
        Self {
            outcome: Outcome::LuckyDigits,
            value: digits.clone(),
            result_text: Some(digits),
            title: "Lucky digits".to_string(),
        }
    }

    pub fn outcome(&self) -> Outcome {
        self.outcome
    }

    /// Free-form result text, e.g. the digit string.
    pub fn result_text(&self) -> Option<&str> {
        self.result_text.as_deref()
    }

    /// Title shown in history.
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Value shown in history.
    pub fn value(&self) -> &str {
        &self.value
    }
}
