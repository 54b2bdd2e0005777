//! Periodic reload of authoritative status-page state.

/// Modulo counter deciding when a monitor reloads its component and
/// incident from the status page. `every == 0` disables resyncing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResyncCounter {
    every: u32,
    progress: u32,
}

impl ResyncCounter {
    pub fn new(every: u32) -> Self {
        Self { every, progress: 0 }
    }

    pub fn is_enabled(&self) -> bool {
        self.every > 0
    }

    /// Count one completed cycle; `true` when a reload is due.
    pub fn advance(&mut self) -> bool {
        if self.every == 0 {
            return false;
        }
        self.progress = (self.progress + 1) % self.every;
        self.progress == 0
    }

    /// `(progress, every)` for logging.
    pub fn progress(&self) -> (u32, u32) {
        (self.progress, self.every)
    }
}
