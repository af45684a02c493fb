// src/core/clipboard.rs
//! Clipboard copy/paste tracking with cumulative risk scoring.
//!
//! [`ClipboardRiskMonitor`] polls a [`ClipboardSource`] on a background
//! thread, detects content changes, scores each change through the
//! sliding-window risk model, and reports events to an optional callback.
//! It also owns the [`ShortcutBlocker`] used to suppress copy/paste chords
//! while an assessment is in progress.

use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use chrono::Utc;
use tracing::{error, info, warn};

use crate::core::error::MonitorError;
use crate::core::risk::{self, RiskWindow, DEFAULT_RISK_WINDOW};
use crate::core::shortcuts::{InputHookBackend, NullHook, ShortcutBlocker};
use crate::core::types::{
    invoke_callback, ClipboardEvent, ClipboardEventKind, EventCallback, MonitorState, Shutdown,
};

/// Number of characters of clipboard text kept in the event preview.
const PREVIEW_CHARS: usize = 50;

/// Source of clipboard text. Implementations wrap whatever the host
/// platform provides; reads are expected to be fast and bounded.
pub trait ClipboardSource: Send + Sync {
    fn read(&self) -> Result<String, MonitorError>;
}

/// In-process clipboard cell, useful for tests and the demo harness.
/// Writers call [`SharedClipboard::set`]; the monitor polls `read`.
#[derive(Debug, Clone, Default)]
pub struct SharedClipboard {
    contents: Arc<Mutex<String>>,
}

impl SharedClipboard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, text: impl Into<String>) {
        *self.contents.lock().unwrap() = text.into();
    }
}

impl ClipboardSource for SharedClipboard {
    fn read(&self) -> Result<String, MonitorError> {
        Ok(self.contents.lock().unwrap().clone())
    }
}

/// Clipboard monitor configuration.
#[derive(Debug, Clone)]
pub struct ClipboardMonitorConfig {
    /// How often the clipboard is polled.
    pub poll_interval: Duration,
    /// Width of the trailing window driving the exponential multiplier.
    pub risk_window: Duration,
    /// Whether a real input hook may be installed. When false the shortcut
    /// blocker always degrades to a no-op, regardless of backend.
    pub input_hook_enabled: bool,
}

impl Default for ClipboardMonitorConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(1),
            risk_window: DEFAULT_RISK_WINDOW,
            input_hook_enabled: true,
        }
    }
}

/// Polls the clipboard and accumulates copy/paste risk.
pub struct ClipboardRiskMonitor {
    config: ClipboardMonitorConfig,
    source: Arc<dyn ClipboardSource>,
    callback: Option<EventCallback<ClipboardEvent>>,
    state: Arc<MonitorState<ClipboardEvent>>,
    blocker: Arc<Mutex<ShortcutBlocker>>,
    shutdown: Option<Arc<Shutdown>>,
    handle: Option<JoinHandle<()>>,
}

impl ClipboardRiskMonitor {
    pub fn new(config: ClipboardMonitorConfig, source: Arc<dyn ClipboardSource>) -> Self {
        let blocker = ShortcutBlocker::new(Box::new(NullHook));
        Self {
            config,
            source,
            callback: None,
            state: Arc::new(MonitorState::new()),
            blocker: Arc::new(Mutex::new(blocker)),
            shutdown: None,
            handle: None,
        }
    }

    /// Register a callback invoked synchronously for every clipboard event.
    pub fn with_callback(mut self, callback: EventCallback<ClipboardEvent>) -> Self {
        self.callback = Some(callback);
        self
    }

    /// Provide a platform input-hook backend for shortcut blocking.
    ///
    /// Honored only when the config enables input hooking; otherwise the
    /// monitor keeps the [`NullHook`] and blocking stays a logged no-op.
    pub fn with_hook_backend(self, backend: Box<dyn InputHookBackend>) -> Self {
        if self.config.input_hook_enabled {
            *self.blocker.lock().unwrap() = ShortcutBlocker::new(backend);
        } else {
            info!("input hook disabled by configuration; keeping no-op blocker");
        }
        self
    }

    /// Begin polling on a background thread. Returns whether the monitor
    /// actually started; a second call while running is a no-op.
    pub fn start(&mut self) -> bool {
        if self.handle.is_some() {
            warn!("clipboard monitor already running; ignoring start()");
            return false;
        }

        let shutdown = Arc::new(Shutdown::new());
        let source = Arc::clone(&self.source);
        let state = Arc::clone(&self.state);
        let callback = self.callback.clone();
        let config = self.config.clone();
        let loop_shutdown = Arc::clone(&shutdown);

        let handle = std::thread::spawn(move || {
            poll_loop(config, source, state, callback, loop_shutdown);
        });

        self.shutdown = Some(shutdown);
        self.handle = Some(handle);
        info!("clipboard monitor started");
        true
    }

    /// Stop the polling loop and wait for it to exit. Any active shortcut
    /// blocking is lifted before returning. No event is appended after
    /// this method returns.
    pub fn stop(&mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            shutdown.trip();
        }
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                error!("clipboard polling thread panicked");
            }
        }
        self.blocker.lock().unwrap().enable_shortcuts();
        info!("clipboard monitor stopped");
    }

    pub fn is_running(&self) -> bool {
        self.handle.is_some()
    }

    /// Activate shortcut suppression. Returns whether a state transition
    /// occurred.
    pub fn disable_shortcuts(&self) -> bool {
        self.blocker.lock().unwrap().disable_shortcuts()
    }

    /// Deactivate shortcut suppression. Returns whether a state transition
    /// occurred.
    pub fn enable_shortcuts(&self) -> bool {
        self.blocker.lock().unwrap().enable_shortcuts()
    }

    /// Shared handle to the blocker, for hosts wiring a real input hook's
    /// key-event callbacks.
    pub fn shortcut_blocker(&self) -> Arc<Mutex<ShortcutBlocker>> {
        Arc::clone(&self.blocker)
    }

    /// Cumulative risk score. Monotonically non-decreasing for the
    /// lifetime of the monitor.
    pub fn risk_score(&self) -> u64 {
        self.state.risk_score()
    }

    /// Snapshot of the ordered event log.
    pub fn events(&self) -> Vec<ClipboardEvent> {
        self.state.events()
    }

    pub fn event_count(&self) -> usize {
        self.state.event_count()
    }

    /// Export the event log as pretty-printed JSON.
    pub fn export_json(&self) -> Result<String, serde_json::Error> {
        self.state.export_json()
    }
}

impl Drop for ClipboardRiskMonitor {
    fn drop(&mut self) {
        if self.handle.is_some() {
            self.stop();
        }
    }
}

fn poll_loop(
    config: ClipboardMonitorConfig,
    source: Arc<dyn ClipboardSource>,
    state: Arc<MonitorState<ClipboardEvent>>,
    callback: Option<EventCallback<ClipboardEvent>>,
    shutdown: Arc<Shutdown>,
) {
    let mut last_clipboard = String::new();
    let mut window = RiskWindow::new(config.risk_window);

    while shutdown.is_running() {
        let text = match source.read() {
            Ok(text) => text,
            Err(err) => {
                // Transient by contract: log and carry on with empty text.
                error!("error reading clipboard: {}", err);
                String::new()
            }
        };

        if text != last_clipboard && !text.trim().is_empty() {
            let window_count = window.observe(Instant::now());
            let word_count = text.split_whitespace().count();
            let assessment = risk::assess(word_count, window_count);

            let event = ClipboardEvent {
                timestamp: Utc::now(),
                kind: ClipboardEventKind::CopyPaste,
                content_preview: text.chars().take(PREVIEW_CHARS).collect(),
                word_count,
                base_risk: assessment.base_risk,
                multiplier: assessment.multiplier,
                risk_increment: assessment.increment,
                window_count,
            };

            state.record(event.clone(), assessment.increment);
            info!(
                "copy detected: words={} base={} multiplier={} increment={}",
                word_count, assessment.base_risk, assessment.multiplier, assessment.increment
            );

            if let Some(callback) = &callback {
                invoke_callback(callback, &event, "clipboard");
            }
            last_clipboard = text;
        }

        if !shutdown.wait_timeout(config.poll_interval) {
            break;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn fast_config() -> ClipboardMonitorConfig {
        ClipboardMonitorConfig {
            poll_interval: Duration::from_millis(5),
            ..Default::default()
        }
    }

    /// Poll until the monitor has recorded `n` events or the deadline hits.
    fn wait_for_events(monitor: &ClipboardRiskMonitor, n: usize) {
        let deadline = Instant::now() + Duration::from_secs(5);
        while monitor.event_count() < n && Instant::now() < deadline {
            std::thread::sleep(Duration::from_millis(5));
        }
        assert!(monitor.event_count() >= n, "timed out waiting for events");
    }

    #[test]
    fn detects_change_and_scores_it() {
        let clipboard = SharedClipboard::new();
        let mut monitor =
            ClipboardRiskMonitor::new(fast_config(), Arc::new(clipboard.clone()));
        assert!(monitor.start());

        clipboard.set("one two three four five six seven eight nine ten");
        wait_for_events(&monitor, 1);
        monitor.stop();

        let events = monitor.events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].word_count, 10);
        assert_eq!(events[0].base_risk, 10);
        assert_eq!(events[0].multiplier, 1);
        assert_eq!(events[0].risk_increment, 10);
        assert_eq!(events[0].window_count, 1);
        assert_eq!(monitor.risk_score(), 10);
    }

    #[test]
    fn ignores_whitespace_and_duplicate_text() {
        let clipboard = SharedClipboard::new();
        let mut monitor =
            ClipboardRiskMonitor::new(fast_config(), Arc::new(clipboard.clone()));
        monitor.start();

        clipboard.set("   \t\n  ");
        std::thread::sleep(Duration::from_millis(50));
        assert_eq!(monitor.event_count(), 0);

        clipboard.set("hello world");
        wait_for_events(&monitor, 1);
        // Same text again: no new event however long we wait.
        std::thread::sleep(Duration::from_millis(50));
        monitor.stop();

        assert_eq!(monitor.event_count(), 1);
        assert_eq!(monitor.risk_score(), 0); // two words, base risk 0
    }

    #[test]
    fn rapid_changes_raise_the_multiplier() {
        let clipboard = SharedClipboard::new();
        let mut monitor =
            ClipboardRiskMonitor::new(fast_config(), Arc::new(clipboard.clone()));
        monitor.start();

        clipboard.set("a b c d e f g h i j");
        wait_for_events(&monitor, 1);
        clipboard.set("k l m n o p q r s t");
        wait_for_events(&monitor, 2);
        monitor.stop();

        let events = monitor.events();
        assert_eq!(events[1].window_count, 2);
        assert_eq!(events[1].multiplier, 2);
        assert_eq!(events[1].risk_increment, 20);
        assert_eq!(monitor.risk_score(), 30);
    }

    #[test]
    fn preview_is_capped_at_fifty_chars() {
        let clipboard = SharedClipboard::new();
        let mut monitor =
            ClipboardRiskMonitor::new(fast_config(), Arc::new(clipboard.clone()));
        monitor.start();

        clipboard.set("word ".repeat(40));
        wait_for_events(&monitor, 1);
        monitor.stop();

        let events = monitor.events();
        assert_eq!(events[0].content_preview.chars().count(), 50);
    }

    struct FailingClipboard;

    impl ClipboardSource for FailingClipboard {
        fn read(&self) -> Result<String, MonitorError> {
            Err(MonitorError::ClipboardRead("no backend".into()))
        }
    }

    #[test]
    fn read_errors_are_swallowed() {
        let mut monitor = ClipboardRiskMonitor::new(fast_config(), Arc::new(FailingClipboard));
        monitor.start();
        std::thread::sleep(Duration::from_millis(50));
        monitor.stop();

        assert_eq!(monitor.event_count(), 0);
        assert_eq!(monitor.risk_score(), 0);
    }

    #[test]
    fn callback_panic_does_not_kill_the_loop() {
        let calls = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&calls);
        let clipboard = SharedClipboard::new();
        let mut monitor = ClipboardRiskMonitor::new(fast_config(), Arc::new(clipboard.clone()))
            .with_callback(Arc::new(move |_event| {
                seen.fetch_add(1, Ordering::SeqCst);
                panic!("broken consumer");
            }));
        monitor.start();

        clipboard.set("first batch of words");
        wait_for_events(&monitor, 1);
        clipboard.set("second batch of words");
        wait_for_events(&monitor, 2);
        monitor.stop();

        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(monitor.event_count(), 2);
    }

    #[test]
    fn double_start_is_rejected() {
        let clipboard = SharedClipboard::new();
        let mut monitor = ClipboardRiskMonitor::new(fast_config(), Arc::new(clipboard));
        assert!(monitor.start());
        assert!(!monitor.start());
        monitor.stop();
        assert!(!monitor.is_running());
    }

    #[test]
    fn stop_joins_and_lifts_shortcut_blocking() {
        let clipboard = SharedClipboard::new();
        let mut monitor =
            ClipboardRiskMonitor::new(fast_config(), Arc::new(clipboard.clone()));
        monitor.start();
        monitor.disable_shortcuts();
        monitor.stop();

        // The loop has exited: later clipboard writes change nothing.
        let count = monitor.event_count();
        clipboard.set("text appearing after stop");
        std::thread::sleep(Duration::from_millis(50));
        assert_eq!(monitor.event_count(), count);
    }
}
