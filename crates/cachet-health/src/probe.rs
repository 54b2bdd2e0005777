//! Probe capability and executor.
//!
//! A probe is the only per-variant piece of a monitor: it runs the check,
//! describes itself and validates its own configuration. Everything else
//! (history, thresholds, incidents) lives in the shared engine.

pub mod dns;
pub mod http;
pub mod mock;
pub mod tcp;

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use tokio::time::Instant;
use tracing::debug;

use cachet_api::HttpTransport;
use cachet_core::{CheckKind, MonitorConfig};

pub use dns::DnsProbe;
pub use http::HttpProbe;
pub use mock::MockProbe;
pub use tcp::TcpProbe;

/// Result of a single check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeResult {
    Up,
    /// Down, with a human-readable reason.
    Down(String),
}

impl ProbeResult {
    pub fn is_up(&self) -> bool {
        matches!(self, Self::Up)
    }

    pub fn down(reason: impl Into<String>) -> Self {
        Self::Down(reason.into())
    }
}

/// Boxed future returned by [`Probe::check`].
pub type ProbeFuture<'a> = Pin<Box<dyn Future<Output = ProbeResult> + Send + 'a>>;

/// A health check variant.
pub trait Probe: Send + Sync {
    /// Run one check against `target`.
    fn check<'a>(&'a self, target: &'a str, timeout: Duration, strict: bool) -> ProbeFuture<'a>;

    /// Variant-specific feature lines, appended to the monitor description.
    fn describe(&self) -> Vec<String> {
        Vec::new()
    }

    /// Variant-specific configuration problems.
    fn validate(&self, config: &MonitorConfig) -> Vec<String>;
}

/// Build the probe selected by `config.kind`.
pub fn build_probe(config: &MonitorConfig, transport: &HttpTransport) -> Box<dyn Probe> {
    match config.kind {
        CheckKind::Http => Box::new(HttpProbe::from_config(config, transport.clone())),
        CheckKind::Tcp => Box::new(TcpProbe),
        CheckKind::Dns => Box::new(DnsProbe::from_config(config)),
        CheckKind::Mock => Box::new(MockProbe::new(!config.mock_down)),
    }
}

/// A timed probe run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Execution {
    pub result: ProbeResult,
    pub elapsed: Duration,
}

impl Execution {
    pub fn lag_ms(&self) -> u64 {
        u64::try_from(self.elapsed.as_millis()).unwrap_or(u64::MAX)
    }
}

/// Run a probe under a deadline of `timeout`, measuring wall-clock time.
///
/// A probe that does not finish in time counts as down.
pub async fn execute(
    probe: &dyn Probe,
    target: &str,
    timeout: Duration,
    strict: bool,
) -> Execution {
    let started = Instant::now();
    let result = match tokio::time::timeout(timeout, probe.check(target, timeout, strict)).await {
        Ok(result) => result,
        Err(_) => ProbeResult::Down(format!("timed out after {}ms", timeout.as_millis())),
    };
    let elapsed = started.elapsed();
    debug!(%target, up = result.is_up(), elapsed_ms = elapsed.as_millis() as u64, "probe finished");
    Execution { result, elapsed }
}
