//! A monitor: one validated config, its probe, and the state its loop owns.
//!
//! One cycle ([`Monitor::tick`]) runs, in order:
//!
//! ```text
//! probe ─→ window.record ─→ classify ─→ incident::apply ─→ hooks ─→ metrics ─→ resync
//! ```
//!
//! Metrics and hooks are detached tasks; everything else is awaited inline
//! so a cycle never overlaps the next one.

use std::sync::Arc;

use tracing::{debug, info, warn};

use cachet_api::{HttpTransport, StatusPage};
use cachet_core::MonitorConfig;

use crate::classifier::{Classification, Thresholds, classify};
use crate::error::{HealthError, HealthResult};
use crate::hook::{self, HookKind};
use crate::incident::{self, Transition};
use crate::probe::{Execution, Probe, ProbeResult, build_probe, execute};
use crate::report;
use crate::state::MonitorState;

/// Everything one cycle produced.
#[derive(Debug, Clone, PartialEq)]
pub struct TickReport {
    pub execution: Execution,
    pub classification: Classification,
    pub transition: Transition,
}

pub struct Monitor {
    config: Arc<MonitorConfig>,
    probe: Box<dyn Probe>,
    api: Arc<dyn StatusPage>,
    thresholds: Thresholds,
    state: MonitorState,
}

impl Monitor {
    /// Validate `config` and build the probe its `type` selects.
    pub fn new(
        config: MonitorConfig,
        api: Arc<dyn StatusPage>,
        transport: &HttpTransport,
    ) -> Result<Self, Vec<String>> {
        let probe = build_probe(&config, transport);
        Self::with_probe(config, probe, api)
    }

    /// Validate `config` and pair it with an explicit probe.
    pub fn with_probe(
        mut config: MonitorConfig,
        probe: Box<dyn Probe>,
        api: Arc<dyn StatusPage>,
    ) -> Result<Self, Vec<String>> {
        let mut errs = config.validate();
        errs.extend(probe.validate(&config));
        if !errs.is_empty() {
            return Err(errs);
        }

        let state = MonitorState::new(config.history_size(), config.resync);
        Ok(Self {
            thresholds: Thresholds::from_config(&config),
            config: Arc::new(config),
            probe,
            api,
            state,
        })
    }

    pub fn name(&self) -> &str {
        &self.config.name
    }

    pub fn config(&self) -> &MonitorConfig {
        &self.config
    }

    pub fn state(&self) -> &MonitorState {
        &self.state
    }

    pub fn thresholds(&self) -> Thresholds {
        self.thresholds
    }

    /// Feature lines: the shared ones followed by the probe's own.
    pub fn describe(&self) -> Vec<String> {
        let mut features = self.config.describe();
        features.extend(self.probe.describe());
        features
    }

    /// Seed the runtime state from the status page.
    ///
    /// Loads the component and any open incident, then records one outcome
    /// matching the component's current status.
    pub async fn init(&mut self) -> HealthResult<()> {
        if self.config.component_id == 0 {
            return Err(HealthError::NoComponent(self.config.name.clone()));
        }
        self.reload().await?;
        self.state.window.record(self.state.is_up());
        Ok(())
    }

    /// Overwrite the cached component status, enabled flag and incident with
    /// what the status page currently holds.
    pub async fn reload(&mut self) -> HealthResult<()> {
        let monitor = self.config.name.as_str();
        debug!(%monitor, "reloading component data");

        let component = self.api.component(self.config.component_id).await?;
        info!(
            %monitor,
            component_id = component.id,
            component = %component.name,
            enabled = component.enabled,
            status = %component.status,
            thresholds = ?self.thresholds,
            "component loaded"
        );
        self.state.status = component.status;
        self.state.enabled = component.enabled;

        match self.api.current_incident(self.config.component_id).await {
            Ok(Some(incident)) => {
                info!(%monitor, incident_id = ?incident.id, "current incident loaded");
                self.state.incident = Some(incident);
            }
            Ok(None) => {
                info!(%monitor, "no current incident");
                self.state.incident = None;
            }
            Err(e) => warn!(%monitor, error = %e, "failed to load current incident"),
        }
        Ok(())
    }

    /// Run one full cycle. Returns `None` when the component is disabled.
    ///
    /// A disabled cycle skips the check but still counts towards resync, so
    /// re-enabling the component on the status page is picked up.
    pub async fn tick(&mut self) -> Option<TickReport> {
        let monitor = self.config.name.clone();

        if !self.state.enabled {
            debug!(%monitor, "monitor is disabled");
            self.resync().await;
            return None;
        }

        let execution = execute(
            self.probe.as_ref(),
            &self.config.target,
            self.config.timeout(),
            self.config.strict,
        )
        .await;
        if let ProbeResult::Down(reason) = &execution.result {
            self.state.last_failure = Some(reason.clone());
        }

        let window = &mut self.state.window;
        if window.len() + 1 == window.capacity() {
            debug!(%monitor, "history window is now saturated");
        }
        window.record(execution.result.is_up());

        let classification = classify(&self.state.window, &self.thresholds);
        self.state.up_count = classification.up_count;
        self.state.down_count = classification.down_count;
        self.log_classification(&classification);

        if classification.fully_available() {
            debug!(%monitor, "monitor is fully up");
            report::spawn_metrics(&self.api, "availability", &self.config.metrics.availability, 1.0);
        }
        if classification.verdict.is_triggered() {
            report::spawn_metrics(
                &self.api,
                "incident count",
                &self.config.metrics.incident_count,
                1.0,
            );
        }

        let transition =
            incident::apply(&self.config, self.api.as_ref(), &mut self.state, &classification).await;

        match &execution.result {
            ProbeResult::Up => {
                hook::dispatch(&self.config, &self.state, HookKind::OnSuccess, "");
            }
            ProbeResult::Down(reason) => {
                hook::dispatch(&self.config, &self.state, HookKind::OnFailure, reason);
            }
        }

        let lag = execution.lag_ms() as f64;
        if self.config.metric_id > 0 {
            report::spawn_metric(&self.api, &monitor, self.config.metric_id, lag);
        }
        report::spawn_metrics(&self.api, "response time", &self.config.metrics.response_time, lag);

        self.resync().await;

        Some(TickReport {
            execution,
            classification,
            transition,
        })
    }

    fn log_classification(&self, c: &Classification) {
        let monitor = self.config.name.as_str();
        if !c.saturated {
            debug!(
                %monitor,
                len = self.state.window.len(),
                capacity = self.state.window.capacity(),
                "history window not saturated yet"
            );
            return;
        }
        debug!(
            %monitor,
            down = c.down_count,
            up = c.up_count,
            down_percent = c.down_percent,
            verdict = ?c.verdict,
            "window evaluated"
        );
    }

    async fn resync(&mut self) {
        if !self.state.resync.advance() {
            if self.state.resync.is_enabled() {
                let (progress, every) = self.state.resync.progress();
                debug!(monitor = %self.config.name, progress, every, "resync progress");
            }
            return;
        }
        if let Err(e) = self.reload().await {
            warn!(monitor = %self.config.name, error = %e, "resync failed");
        }
    }
}
