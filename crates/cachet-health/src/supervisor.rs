//! Supervisor: one independent periodic task per monitor.
//!
//! Each task owns its [`Monitor`] outright, so cycles of one monitor never
//! overlap and no state is shared between monitors. Stop requests are
//! observed only between cycles; a running cycle always finishes.

use std::sync::Arc;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, error, info};

use crate::monitor::Monitor;

/// One-shot stop flag shared by a supervisor and its loops.
#[derive(Debug, Clone)]
pub struct StopSignal {
    tx: Arc<watch::Sender<bool>>,
}

impl Default for StopSignal {
    fn default() -> Self {
        Self::new()
    }
}

impl StopSignal {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(false);
        Self { tx: Arc::new(tx) }
    }

    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.tx.subscribe()
    }

    /// Raise the flag. Returns `true` only for the call that raised it.
    pub fn stop(&self) -> bool {
        self.tx.send_if_modified(|stopped| {
            if *stopped {
                false
            } else {
                *stopped = true;
                true
            }
        })
    }

    pub fn is_stopped(&self) -> bool {
        *self.tx.borrow()
    }
}

/// Drive `monitor` until `shutdown` is raised, then hand it back.
///
/// With `immediate`, one cycle runs before the first interval elapses. A
/// slow cycle delays the following ticks instead of bunching them up.
pub async fn run_monitor(
    mut monitor: Monitor,
    immediate: bool,
    mut shutdown: watch::Receiver<bool>,
) -> Monitor {
    let name = monitor.name().to_string();
    let interval = monitor.config().interval();
    info!(monitor = %name, interval_secs = interval.as_secs(), "monitor started");

    if immediate && !*shutdown.borrow_and_update() {
        monitor.tick().await;
    }

    let mut ticker = tokio::time::interval_at(Instant::now() + interval, interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        if *shutdown.borrow_and_update() {
            break;
        }
        tokio::select! {
            biased;
            changed = shutdown.changed() => {
                if changed.is_err() {
                    debug!(monitor = %name, "stop signal dropped");
                    break;
                }
            }
            _ = ticker.tick() => {
                monitor.tick().await;
            }
        }
    }

    info!(monitor = %name, "monitor stopped");
    monitor
}

struct MonitorSlot {
    name: String,
    stop: StopSignal,
    handle: JoinHandle<Monitor>,
}

/// Starts monitor loops and waits for all of them on shutdown.
pub struct Supervisor {
    immediate: bool,
    slots: Vec<MonitorSlot>,
}

impl Supervisor {
    pub fn new(immediate: bool) -> Self {
        Self {
            immediate,
            slots: Vec::new(),
        }
    }

    /// Spawn the loop of an initialized monitor.
    pub fn start(&mut self, monitor: Monitor) {
        let name = monitor.name().to_string();
        let stop = StopSignal::new();
        let handle = tokio::spawn(run_monitor(monitor, self.immediate, stop.subscribe()));
        debug!(monitor = %name, "monitor loop spawned");
        self.slots.push(MonitorSlot { name, stop, handle });
    }

    /// Ask every loop to stop. Safe to call more than once.
    pub fn stop(&self) {
        let mut raised = 0;
        for slot in &self.slots {
            if slot.stop.stop() {
                raised += 1;
            }
        }
        info!(raised, total = self.slots.len(), "stopping monitors");
    }

    /// Ask one loop to stop. Returns `false` for unknown names.
    pub fn stop_monitor(&self, name: &str) -> bool {
        match self.slots.iter().find(|s| s.name == name) {
            Some(slot) => {
                slot.stop.stop();
                true
            }
            None => false,
        }
    }

    pub fn names(&self) -> Vec<String> {
        self.slots.iter().map(|s| s.name.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Wait for every loop to exit and collect the monitors back.
    ///
    /// Loops only exit once stopped, so call [`stop`](Self::stop) first.
    pub async fn join(self) -> Vec<Monitor> {
        let mut monitors = Vec::with_capacity(self.slots.len());
        for slot in self.slots {
            match slot.handle.await {
                Ok(monitor) => monitors.push(monitor),
                Err(e) => error!(monitor = %slot.name, error = %e, "monitor task failed"),
            }
        }
        info!(count = monitors.len(), "all monitors drained");
        monitors
    }
}
