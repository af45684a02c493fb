//! Proctor Monitor Library
//!
//! Monitoring utilities for proctoring-style applications: a clipboard
//! copy/paste tracker with a cumulative risk score, a keyboard
//! shortcut-blocking filter, and a simulated peripheral change detector.
//!
//! Each monitor runs its polling loop on background threads, appends typed
//! event records to an ordered log, and invokes an optional callback
//! synchronously for every event. `start()`/`stop()` give every monitor an
//! explicit lifecycle; `stop()` joins the loop threads before returning.
//!
//! OS integration (clipboard access, input hooks, device enumeration) is
//! deliberately abstracted behind traits: [`core::clipboard::ClipboardSource`]
//! and [`core::shortcuts::InputHookBackend`]. The peripheral detector is
//! entirely simulated.

pub mod core;

pub use core::clipboard::{
    ClipboardMonitorConfig, ClipboardRiskMonitor, ClipboardSource, SharedClipboard,
};
pub use core::error::MonitorError;
pub use core::peripheral::{DisplayState, PeripheralMonitor, PeripheralMonitorConfig};
pub use core::shortcuts::{FilterDecision, InputHookBackend, Key, NullHook, ShortcutBlocker};
pub use core::types::{
    ClipboardEvent, ClipboardEventKind, EventCallback, PeripheralEvent, PeripheralKind,
};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::core::clipboard::{
        ClipboardMonitorConfig, ClipboardRiskMonitor, ClipboardSource, SharedClipboard,
    };
    pub use crate::core::error::MonitorError;
    pub use crate::core::peripheral::{PeripheralMonitor, PeripheralMonitorConfig};
    pub use crate::core::risk::{assess, RiskAssessment, RiskWindow};
    pub use crate::core::shortcuts::{FilterDecision, InputHookBackend, Key, ShortcutBlocker};
    pub use crate::core::types::{
        ClipboardEvent, ClipboardEventKind, EventCallback, PeripheralEvent, PeripheralKind,
    };
}
