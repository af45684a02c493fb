// src/core/error.rs
//! Error taxonomy for the monitoring core.
//!
//! Nothing in here is fatal: the monitors favor availability over strict
//! correctness, so every variant is either recovered locally or surfaced to
//! the caller as a degraded-but-working mode.

use thiserror::Error;

/// Errors raised by the monitoring components.
#[derive(Debug, Error)]
pub enum MonitorError {
    /// The clipboard source failed to produce text. Transient; the polling
    /// loop recovers by substituting an empty string and logging.
    #[error("failed to read clipboard: {0}")]
    ClipboardRead(String),

    /// No low-level input hook capability is available in this environment.
    /// Shortcut blocking degrades to a logged no-op instead of failing.
    #[error("input hook unavailable: {0}")]
    InputHookUnavailable(String),
}
