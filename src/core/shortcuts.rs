// src/core/shortcuts.rs
//! Keyboard shortcut blocking.
//!
//! While blocking is active, a low-level input filter watches every key-down
//! and suppresses it if the currently held keys contain one of a fixed set of
//! chords (Ctrl+C, Ctrl+V, Alt+Tab, ...). Hosts without input-hook capability
//! degrade to a logged no-op instead of failing.

use std::collections::HashSet;

use tracing::{debug, info};

use crate::core::error::MonitorError;

/// A logical key identity, hashable so chords can be expressed as sets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    Ctrl,
    Alt,
    Shift,
    Tab,
    F4,
    Char(char),
}

/// What the input filter tells the hook to do with a physical key event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterDecision {
    /// Swallow the event; it must not reach other applications.
    Suppress,
    /// Deliver the event normally.
    PassThrough,
}

/// Seam for the platform input hook.
///
/// A real backend installs an OS-level hook that routes key events through
/// [`ShortcutBlocker::on_key_down`] / [`ShortcutBlocker::on_key_up`] and
/// honors the returned [`FilterDecision`]. Installation failures surface as
/// [`MonitorError::InputHookUnavailable`].
pub trait InputHookBackend: Send {
    fn install(&mut self) -> Result<(), MonitorError>;
    fn uninstall(&mut self);
    /// Whether this backend can actually intercept input.
    fn is_available(&self) -> bool {
        true
    }
}

/// Backend for environments where input hooking is disabled or impossible.
/// Install and uninstall log and succeed; no key event is ever intercepted.
#[derive(Debug, Default)]
pub struct NullHook;

impl InputHookBackend for NullHook {
    fn install(&mut self) -> Result<(), MonitorError> {
        info!("input hook unavailable; shortcut blocking is a no-op");
        Ok(())
    }

    fn uninstall(&mut self) {}

    fn is_available(&self) -> bool {
        false
    }
}

fn blocked_chords() -> Vec<HashSet<Key>> {
    [
        [Key::Ctrl, Key::Char('c')],
        [Key::Ctrl, Key::Char('v')],
        [Key::Ctrl, Key::Char('x')],
        [Key::Ctrl, Key::Char('a')],
        [Key::Ctrl, Key::Char('z')],
        [Key::Alt, Key::Tab],
        [Key::Alt, Key::F4],
    ]
    .iter()
    .map(|chord| chord.iter().copied().collect())
    .collect()
}

/// Toggleable filter that suppresses a fixed set of modifier+key chords.
pub struct ShortcutBlocker {
    backend: Box<dyn InputHookBackend>,
    chords: Vec<HashSet<Key>>,
    held: HashSet<Key>,
    blocking: bool,
}

impl ShortcutBlocker {
    pub fn new(backend: Box<dyn InputHookBackend>) -> Self {
        Self {
            backend,
            chords: blocked_chords(),
            held: HashSet::new(),
            blocking: false,
        }
    }

    /// Whether suppression is currently active.
    pub fn is_blocking(&self) -> bool {
        self.blocking
    }

    /// Activate suppression. Returns whether a state transition occurred;
    /// a second call while already blocking is a no-op returning `false`.
    ///
    /// Without hook capability this logs and reports success, matching the
    /// graceful-degradation contract.
    pub fn disable_shortcuts(&mut self) -> bool {
        if !self.backend.is_available() {
            // NullHook install only logs.
            let _ = self.backend.install();
            return true;
        }
        if self.blocking {
            return false;
        }
        self.blocking = true;
        self.held.clear();
        if let Err(err) = self.backend.install() {
            info!("degrading shortcut blocking: {}", err);
            self.blocking = false;
            return true;
        }
        info!("keyboard shortcuts disabled");
        true
    }

    /// Deactivate suppression and tear down the hook. Returns whether a
    /// state transition occurred.
    pub fn enable_shortcuts(&mut self) -> bool {
        if !self.backend.is_available() {
            info!("input hook unavailable; skipping enable_shortcuts");
            return true;
        }
        if !self.blocking {
            return false;
        }
        self.blocking = false;
        self.held.clear();
        self.backend.uninstall();
        info!("keyboard shortcuts enabled");
        true
    }

    /// Filter callback for a physical key-down event.
    pub fn on_key_down(&mut self, key: Key) -> FilterDecision {
        if !self.blocking {
            return FilterDecision::PassThrough;
        }
        self.held.insert(key);
        for chord in &self.chords {
            if chord.is_subset(&self.held) {
                debug!("blocked shortcut: {:?}", chord);
                return FilterDecision::Suppress;
            }
        }
        FilterDecision::PassThrough
    }

    /// Filter callback for a physical key-up event. Always passes through.
    pub fn on_key_up(&mut self, key: Key) -> FilterDecision {
        self.held.remove(&key);
        FilterDecision::PassThrough
    }
}

impl std::fmt::Debug for ShortcutBlocker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShortcutBlocker")
            .field("blocking", &self.blocking)
            .field("held", &self.held)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    /// Backend that records install/uninstall calls.
    #[derive(Default)]
    struct CountingHook {
        installs: Arc<AtomicUsize>,
        uninstalls: Arc<AtomicUsize>,
    }

    impl InputHookBackend for CountingHook {
        fn install(&mut self) -> Result<(), MonitorError> {
            self.installs.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        fn uninstall(&mut self) {
            self.uninstalls.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn blocker() -> ShortcutBlocker {
        ShortcutBlocker::new(Box::<CountingHook>::default())
    }

    #[test]
    fn inactive_filter_passes_everything_through() {
        let mut b = blocker();
        assert_eq!(b.on_key_down(Key::Ctrl), FilterDecision::PassThrough);
        assert_eq!(b.on_key_down(Key::Char('c')), FilterDecision::PassThrough);
    }

    #[test]
    fn active_filter_suppresses_ctrl_c_on_the_c_press() {
        let mut b = blocker();
        assert!(b.disable_shortcuts());

        assert_eq!(b.on_key_down(Key::Ctrl), FilterDecision::PassThrough);
        assert_eq!(b.on_key_down(Key::Char('c')), FilterDecision::Suppress);
    }

    #[test]
    fn key_up_always_passes_and_clears_held_state() {
        let mut b = blocker();
        b.disable_shortcuts();

        b.on_key_down(Key::Ctrl);
        assert_eq!(b.on_key_up(Key::Ctrl), FilterDecision::PassThrough);
        // Ctrl no longer held, so C alone is fine.
        assert_eq!(b.on_key_down(Key::Char('c')), FilterDecision::PassThrough);
    }

    #[test]
    fn alt_tab_and_alt_f4_are_blocked() {
        let mut b = blocker();
        b.disable_shortcuts();

        b.on_key_down(Key::Alt);
        assert_eq!(b.on_key_down(Key::Tab), FilterDecision::Suppress);
        b.on_key_up(Key::Tab);
        assert_eq!(b.on_key_down(Key::F4), FilterDecision::Suppress);
    }

    #[test]
    fn toggling_is_idempotent() {
        let mut b = blocker();
        assert!(b.disable_shortcuts());
        assert!(!b.disable_shortcuts());
        assert!(b.enable_shortcuts());
        assert!(!b.enable_shortcuts());
    }

    #[test]
    fn hook_installed_once_per_activation() {
        let installs = Arc::new(AtomicUsize::new(0));
        let uninstalls = Arc::new(AtomicUsize::new(0));
        let hook = CountingHook {
            installs: Arc::clone(&installs),
            uninstalls: Arc::clone(&uninstalls),
        };
        let mut b = ShortcutBlocker::new(Box::new(hook));

        b.disable_shortcuts();
        b.disable_shortcuts();
        b.enable_shortcuts();
        b.enable_shortcuts();

        assert_eq!(installs.load(Ordering::SeqCst), 1);
        assert_eq!(uninstalls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn blocker_can_be_reactivated_after_enable() {
        let mut b = blocker();
        b.disable_shortcuts();
        b.enable_shortcuts();
        assert!(!b.is_blocking());

        assert!(b.disable_shortcuts());
        assert!(b.is_blocking());
        b.on_key_down(Key::Ctrl);
        assert_eq!(b.on_key_down(Key::Char('v')), FilterDecision::Suppress);
    }

    #[test]
    fn null_hook_degrades_to_successful_no_ops() {
        let mut b = ShortcutBlocker::new(Box::new(NullHook));

        assert!(b.disable_shortcuts());
        assert!(!b.is_blocking());
        assert_eq!(b.on_key_down(Key::Ctrl), FilterDecision::PassThrough);
        assert_eq!(b.on_key_down(Key::Char('c')), FilterDecision::PassThrough);
        assert!(b.enable_shortcuts());
    }
}
