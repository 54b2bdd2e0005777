//! Mock probe, for dry runs and tests.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use cachet_core::MonitorConfig;

use super::{Probe, ProbeFuture, ProbeResult};

/// Reports a fixed outcome that can be flipped through [`MockProbe::handle`].
#[derive(Debug, Clone)]
pub struct MockProbe {
    up: Arc<AtomicBool>,
}

impl MockProbe {
    pub fn new(up: bool) -> Self {
        Self {
            up: Arc::new(AtomicBool::new(up)),
        }
    }

    /// Shared switch; `true` means the next check reports up.
    pub fn handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.up)
    }
}

impl Probe for MockProbe {
    fn check<'a>(&'a self, _target: &'a str, _timeout: Duration, _strict: bool) -> ProbeFuture<'a> {
        let up = self.up.load(Ordering::SeqCst);
        Box::pin(async move {
            if up {
                ProbeResult::Up
            } else {
                ProbeResult::down("mock probe reported down")
            }
        })
    }

    fn describe(&self) -> Vec<String> {
        let outcome = if self.up.load(Ordering::SeqCst) {
            "up"
        } else {
            "down"
        };
        vec![format!("Mock outcome: {outcome}")]
    }

    fn validate(&self, _config: &MonitorConfig) -> Vec<String> {
        Vec::new()
    }
}
