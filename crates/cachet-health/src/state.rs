//! Mutable per-monitor state, owned by that monitor's loop.

use cachet_core::{ComponentStatus, Incident};

use crate::resync::ResyncCounter;
use crate::window::HistoryWindow;

#[derive(Debug, Clone)]
pub struct MonitorState {
    pub window: HistoryWindow,
    /// Last known status of the component on the status page.
    pub status: ComponentStatus,
    /// Mirrors the component's `enabled` flag; disabled monitors skip probing.
    pub enabled: bool,
    pub up_count: usize,
    pub down_count: usize,
    pub last_failure: Option<String>,
    /// The open incident, if any.
    pub incident: Option<Incident>,
    pub resync: ResyncCounter,
}

impl MonitorState {
    pub fn new(history_size: usize, resync_every: u32) -> Self {
        Self {
            window: HistoryWindow::new(history_size),
            status: ComponentStatus::Unknown,
            enabled: true,
            up_count: 0,
            down_count: 0,
            last_failure: None,
            incident: None,
            resync: ResyncCounter::new(resync_every),
        }
    }

    pub fn is_up(&self) -> bool {
        self.status.is_up()
    }
}
