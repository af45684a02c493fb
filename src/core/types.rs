// src/core/types.rs
//! Event records and shared plumbing for the monitors.
//!
//! Both monitors follow the same shape: a background loop appends typed
//! event records to an ordered log, bumps a monotonically non-decreasing
//! risk accumulator, and invokes an optional callback synchronously on the
//! loop thread.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Condvar, Mutex};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::error;

/// Discriminator kept in serialized clipboard records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ClipboardEventKind {
    CopyPaste,
}

/// A detected clipboard change with its risk assessment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClipboardEvent {
    pub timestamp: DateTime<Utc>,
    pub kind: ClipboardEventKind,
    /// First 50 characters of the new clipboard text.
    pub content_preview: String,
    pub word_count: usize,
    pub base_risk: u64,
    pub multiplier: u64,
    pub risk_increment: u64,
    /// Number of qualifying events within the trailing risk window,
    /// this one included.
    pub window_count: u32,
}

/// The kind of simulated peripheral change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PeripheralKind {
    DeviceAttach,
    MonitorChange,
}

/// A simulated peripheral change event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PeripheralEvent {
    pub timestamp: DateTime<Utc>,
    pub kind: PeripheralKind,
    pub description: String,
    pub risk_increment: u64,
}

/// Callback invoked synchronously for every emitted event.
pub type EventCallback<E> = Arc<dyn Fn(&E) + Send + Sync>;

/// Run a callback, containing any panic so the polling loop survives.
pub(crate) fn invoke_callback<E>(callback: &EventCallback<E>, event: &E, target: &str) {
    let result = catch_unwind(AssertUnwindSafe(|| callback(event)));
    if result.is_err() {
        error!("{}: event callback panicked; event dropped by consumer", target);
    }
}

/// Shared log + risk accumulator for one monitor.
///
/// The loop thread is the only writer; other threads read snapshots. The
/// accumulator is atomic so `risk_score()` never blocks on the log lock.
#[derive(Debug)]
pub(crate) struct MonitorState<E> {
    log: Mutex<Vec<E>>,
    risk_score: AtomicU64,
}

impl<E: Clone> MonitorState<E> {
    pub fn new() -> Self {
        Self {
            log: Mutex::new(Vec::new()),
            risk_score: AtomicU64::new(0),
        }
    }

    /// Append an event and accumulate its risk.
    pub fn record(&self, event: E, risk_increment: u64) {
        let mut log = self.log.lock().unwrap();
        self.risk_score.fetch_add(risk_increment, Ordering::SeqCst);
        log.push(event);
    }

    pub fn risk_score(&self) -> u64 {
        self.risk_score.load(Ordering::SeqCst)
    }

    /// Snapshot of the ordered event log.
    pub fn events(&self) -> Vec<E> {
        self.log.lock().unwrap().clone()
    }

    pub fn event_count(&self) -> usize {
        self.log.lock().unwrap().len()
    }
}

impl<E: Clone + Serialize> MonitorState<E> {
    pub fn export_json(&self) -> Result<String, serde_json::Error> {
        let log = self.log.lock().unwrap();
        serde_json::to_string_pretty(&*log)
    }
}

/// Cooperative shutdown signal shared between `stop()` and the loop threads.
///
/// Loops block in [`Shutdown::wait_timeout`] instead of a plain sleep, so
/// `stop()` wakes them immediately rather than waiting out a full interval.
#[derive(Debug)]
pub(crate) struct Shutdown {
    running: Mutex<bool>,
    cvar: Condvar,
}

impl Shutdown {
    pub fn new() -> Self {
        Self {
            running: Mutex::new(true),
            cvar: Condvar::new(),
        }
    }

    pub fn is_running(&self) -> bool {
        *self.running.lock().unwrap()
    }

    /// Block for up to `interval` or until `trip()` is called.
    /// Returns `true` while the monitor should keep running.
    pub fn wait_timeout(&self, interval: Duration) -> bool {
        let mut running = self.running.lock().unwrap();
        let deadline = std::time::Instant::now() + interval;
        while *running {
            let now = std::time::Instant::now();
            if now >= deadline {
                return true;
            }
            let (guard, _timeout) = self.cvar.wait_timeout(running, deadline - now).unwrap();
            running = guard;
        }
        false
    }

    /// Signal all waiting loops to exit.
    pub fn trip(&self) {
        *self.running.lock().unwrap() = false;
        self.cvar.notify_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    #[test]
    fn state_accumulates_risk_and_orders_events() {
        let state: MonitorState<u32> = MonitorState::new();
        state.record(1, 10);
        state.record(2, 25);

        assert_eq!(state.risk_score(), 35);
        assert_eq!(state.events(), vec![1, 2]);
        assert_eq!(state.event_count(), 2);
    }

    #[test]
    fn tripped_shutdown_wakes_waiters_immediately() {
        let shutdown = Arc::new(Shutdown::new());
        let waiter = Arc::clone(&shutdown);
        let handle = std::thread::spawn(move || waiter.wait_timeout(Duration::from_secs(30)));

        // Give the waiter a moment to block, then trip.
        std::thread::sleep(Duration::from_millis(20));
        shutdown.trip();

        let started = std::time::Instant::now();
        assert!(!handle.join().unwrap());
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[test]
    fn wait_timeout_elapses_while_running() {
        let shutdown = Shutdown::new();
        assert!(shutdown.wait_timeout(Duration::from_millis(5)));
        assert!(shutdown.is_running());
    }

    #[test]
    fn clipboard_kind_serializes_as_copy_paste() {
        let json = serde_json::to_string(&ClipboardEventKind::CopyPaste).unwrap();
        assert_eq!(json, "\"copy-paste\"");
    }

    #[test]
    fn panicking_callback_is_contained() {
        let calls = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&calls);
        let callback: EventCallback<u32> = Arc::new(move |_| {
            seen.fetch_add(1, Ordering::SeqCst);
            panic!("consumer bug");
        });

        invoke_callback(&callback, &7, "test");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
