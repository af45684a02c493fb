// src/core/risk.rs
//! Sliding-window risk model for clipboard activity.
//!
//! Risk for a clipboard change is a word-count-based base score scaled by an
//! exponential multiplier keyed on how many qualifying events landed within
//! the trailing window (60 seconds by default). The model is kept free of
//! clocks and threads so the scoring rules can be tested with explicit
//! timestamps.

use std::time::{Duration, Instant};

/// Default width of the trailing event-frequency window.
pub const DEFAULT_RISK_WINDOW: Duration = Duration::from_secs(60);

/// Fixed risk increment for every simulated peripheral event.
pub const PERIPHERAL_RISK_INCREMENT: u64 = 35;

/// Scoring breakdown for one clipboard change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RiskAssessment {
    pub base_risk: u64,
    pub multiplier: u64,
    pub increment: u64,
}

/// Tracks event frequency within a trailing window.
///
/// The count resets to 1 whenever the gap since the previous event reaches
/// the window width; otherwise it increments. The exponential multiplier
/// derived from the count has no specified ceiling, so arithmetic saturates
/// rather than wrapping once the count grows past 64.
#[derive(Debug)]
pub struct RiskWindow {
    window: Duration,
    last_event: Option<Instant>,
    count: u32,
}

impl RiskWindow {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            last_event: None,
            count: 0,
        }
    }

    /// Register a qualifying event at `at` and return the updated
    /// window count.
    pub fn observe(&mut self, at: Instant) -> u32 {
        let within_window = self
            .last_event
            .map(|prev| at.saturating_duration_since(prev) < self.window)
            .unwrap_or(false);

        self.count = if within_window {
            self.count.saturating_add(1)
        } else {
            1
        };
        self.last_event = Some(at);
        self.count
    }

    pub fn count(&self) -> u32 {
        self.count
    }
}

impl Default for RiskWindow {
    fn default() -> Self {
        Self::new(DEFAULT_RISK_WINDOW)
    }
}

/// Compute the scoring formula: base is 10 points per full 10 words, scaled
/// by `2^(window_count - 1)`.
pub fn assess(word_count: usize, window_count: u32) -> RiskAssessment {
    let base_risk = (word_count as u64 / 10) * 10;
    let multiplier = match window_count.saturating_sub(1) {
        shift if shift < 64 => 1u64 << shift,
        _ => u64::MAX,
    };
    RiskAssessment {
        base_risk,
        multiplier,
        increment: base_risk.saturating_mul(multiplier),
    }
}
