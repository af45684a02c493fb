// src/core/peripheral.rs
//! Simulated peripheral change detection.
//!
//! No real hardware is enumerated. Two independent generators fabricate
//! events on their own schedules: a device-attach generator that fires with
//! fixed probability each tick, and a monitor-count generator that samples a
//! synthetic display count and fires on multi-monitor transitions. Every
//! event carries the same fixed risk increment.

use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use chrono::Utc;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{error, info, warn};

use crate::core::risk::PERIPHERAL_RISK_INCREMENT;
use crate::core::types::{
    invoke_callback, EventCallback, MonitorState, PeripheralEvent, PeripheralKind, Shutdown,
};

/// Peripheral monitor configuration.
#[derive(Debug, Clone)]
pub struct PeripheralMonitorConfig {
    /// Tick interval of the device-attach generator.
    pub device_interval: Duration,
    /// Tick interval of the monitor-count generator.
    pub display_interval: Duration,
    /// Per-tick probability of a simulated device attach.
    pub attach_probability: f64,
    /// Seed for the generators' RNGs. `None` seeds from the OS.
    pub rng_seed: Option<u64>,
}

impl Default for PeripheralMonitorConfig {
    fn default() -> Self {
        Self {
            device_interval: Duration::from_secs(10),
            display_interval: Duration::from_secs(15),
            attach_probability: 0.2,
            rng_seed: None,
        }
    }
}

/// Tracks the previously observed monitor count and decides whether a
/// sampled count produces an event.
///
/// An event fires only when the count changed and the new count is more
/// than one monitor; the stored count updates on every change either way.
#[derive(Debug)]
pub struct DisplayState {
    last_count: u32,
}

impl DisplayState {
    /// One monitor is assumed at startup.
    pub fn new() -> Self {
        Self { last_count: 1 }
    }

    pub fn last_count(&self) -> u32 {
        self.last_count
    }

    /// Record a sampled count; returns whether an event should fire.
    pub fn observe(&mut self, new_count: u32) -> bool {
        if new_count == self.last_count {
            return false;
        }
        self.last_count = new_count;
        new_count > 1
    }
}

impl Default for DisplayState {
    fn default() -> Self {
        Self::new()
    }
}

/// Runs the two simulated generators and accumulates peripheral risk.
pub struct PeripheralMonitor {
    config: PeripheralMonitorConfig,
    callback: Option<EventCallback<PeripheralEvent>>,
    state: Arc<MonitorState<PeripheralEvent>>,
    shutdown: Option<Arc<Shutdown>>,
    handles: Vec<JoinHandle<()>>,
}

impl PeripheralMonitor {
    pub fn new(config: PeripheralMonitorConfig) -> Self {
        Self {
            config,
            callback: None,
            state: Arc::new(MonitorState::new()),
            shutdown: None,
            handles: Vec::new(),
        }
    }

    /// Register a callback invoked synchronously for every peripheral event.
    pub fn with_callback(mut self, callback: EventCallback<PeripheralEvent>) -> Self {
        self.callback = Some(callback);
        self
    }

    /// Start both generators. Returns whether the monitor actually started;
    /// a second call while running is a no-op.
    pub fn start(&mut self) -> bool {
        if !self.handles.is_empty() {
            warn!("peripheral monitor already running; ignoring start()");
            return false;
        }

        let shutdown = Arc::new(Shutdown::new());
        let (device_rng, display_rng) = match self.config.rng_seed {
            Some(seed) => (StdRng::seed_from_u64(seed), StdRng::seed_from_u64(seed ^ 1)),
            None => (StdRng::from_entropy(), StdRng::from_entropy()),
        };

        let config = self.config.clone();
        let state = Arc::clone(&self.state);
        let callback = self.callback.clone();
        let loop_shutdown = Arc::clone(&shutdown);
        self.handles.push(std::thread::spawn(move || {
            device_loop(config, device_rng, state, callback, loop_shutdown);
        }));

        let config = self.config.clone();
        let state = Arc::clone(&self.state);
        let callback = self.callback.clone();
        let loop_shutdown = Arc::clone(&shutdown);
        self.handles.push(std::thread::spawn(move || {
            display_loop(config, display_rng, state, callback, loop_shutdown);
        }));

        self.shutdown = Some(shutdown);
        info!("peripheral monitor (simulated) started");
        true
    }

    /// Stop both generators and wait for them to exit. No event is appended
    /// after this method returns.
    pub fn stop(&mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            shutdown.trip();
        }
        for handle in self.handles.drain(..) {
            if handle.join().is_err() {
                error!("peripheral generator thread panicked");
            }
        }
        info!("peripheral monitor (simulated) stopped");
    }

    pub fn is_running(&self) -> bool {
        !self.handles.is_empty()
    }

    /// Cumulative risk score. Monotonically non-decreasing for the
    /// lifetime of the monitor.
    pub fn risk_score(&self) -> u64 {
        self.state.risk_score()
    }

    /// Snapshot of the ordered event log. No relative ordering is
    /// guaranteed between the two generators' events.
    pub fn events(&self) -> Vec<PeripheralEvent> {
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

impl Drop for PeripheralMonitor {
    fn drop(&mut self) {
        if !self.handles.is_empty() {
            self.stop();
        }
    }
}

fn emit(
    state: &MonitorState<PeripheralEvent>,
    callback: &Option<EventCallback<PeripheralEvent>>,
    kind: PeripheralKind,
    description: String,
) {
    let event = PeripheralEvent {
        timestamp: Utc::now(),
        kind,
        description,
        risk_increment: PERIPHERAL_RISK_INCREMENT,
    };
    state.record(event.clone(), PERIPHERAL_RISK_INCREMENT);
    info!(
        "simulated peripheral event: {}; risk increased by {}",
        event.description, PERIPHERAL_RISK_INCREMENT
    );
    if let Some(callback) = callback {
        invoke_callback(callback, &event, "peripheral");
    }
}

fn device_loop(
    config: PeripheralMonitorConfig,
    mut rng: StdRng,
    state: Arc<MonitorState<PeripheralEvent>>,
    callback: Option<EventCallback<PeripheralEvent>>,
    shutdown: Arc<Shutdown>,
) {
    while shutdown.is_running() {
        if rng.gen::<f64>() < config.attach_probability {
            let description = format!("Simulated peripheral {}", rng.gen_range(1..=100));
            emit(&state, &callback, PeripheralKind::DeviceAttach, description);
        }
        if !shutdown.wait_timeout(config.device_interval) {
            break;
        }
    }
}

fn display_loop(
    config: PeripheralMonitorConfig,
    mut rng: StdRng,
    state: Arc<MonitorState<PeripheralEvent>>,
    callback: Option<EventCallback<PeripheralEvent>>,
    shutdown: Arc<Shutdown>,
) {
    let mut displays = DisplayState::new();

    while shutdown.is_running() {
        let new_count = rng.gen_range(1..=3);
        if displays.observe(new_count) {
            let description = format!("Multiple monitors detected: {}", new_count);
            emit(&state, &callback, PeripheralKind::MonitorChange, description);
        }
        if !shutdown.wait_timeout(config.display_interval) {
            break;
        }
    }
}
