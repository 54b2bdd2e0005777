//! cachet-health: per-monitor health evaluation and incident lifecycle.
//!
//! Every monitor runs its own periodic loop. A cycle probes the target,
//! records the outcome in a bounded history window, classifies the window
//! against the configured thresholds and lets the incident lifecycle open,
//! maintain or resolve the monitor's incident on the status page.
//!
//! # Architecture
//!
//! ```text
//! Supervisor
//!   └── run_monitor (one task per monitor, stop via watch channel)
//!         └── Monitor::tick
//!               ├── probe::execute → Probe (http | tcp | dns | mock)
//!               ├── HistoryWindow::record
//!               ├── classifier::classify → Verdict
//!               ├── incident::apply → StatusPage
//!               ├── hook::dispatch (detached)
//!               ├── report::spawn_metric(s) (detached)
//!               └── ResyncCounter → Monitor::reload
//! ```
//!
//! # Escalation
//!
//! The plain threshold leg, when configured, is the only one evaluated and
//! marks the component as a major outage. Otherwise the critical leg (major
//! outage) is tried before the partial leg (partial outage).

pub mod classifier;
pub mod error;
pub mod hook;
pub mod incident;
pub mod monitor;
pub mod probe;
pub mod report;
pub mod resync;
pub mod state;
pub mod supervisor;
pub mod window;

pub use classifier::{Classification, Leg, Thresholds, Verdict, classify};
pub use error::{HealthError, HealthResult};
pub use incident::Transition;
pub use monitor::{Monitor, TickReport};
pub use probe::{Execution, MockProbe, Probe, ProbeFuture, ProbeResult, build_probe, execute};
pub use state::MonitorState;
pub use supervisor::{StopSignal, Supervisor, run_monitor};
pub use window::HistoryWindow;
