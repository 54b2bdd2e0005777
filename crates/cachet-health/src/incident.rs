//! Incident lifecycle manager.
//!
//! ```text
//!            triggered                 cleared
//!   NONE ───────────────► INVESTIGATING ───────► FIXED ──► NONE
//!    ▲                        │  still triggered:
//!    │ drift: status != up    │  re-issue status only if it differs
//!    └── forced back to up ───┘
//! ```
//!
//! Nothing happens before the history window is saturated. External calls
//! are attempted once; the local state is kept optimistically and the next
//! cycle (or resync) corrects any drift.

use chrono::Local;
use tracing::{debug, info, warn};

use cachet_api::StatusPage;
use cachet_core::{ComponentStatus, Incident, IncidentId, MonitorConfig, TemplateContext};

use crate::classifier::Classification;
use crate::state::MonitorState;

/// What a cycle did to the incident and component status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Window not saturated yet.
    Accumulating,
    /// No trigger, no incident, component already up.
    Healthy,
    /// A new incident was opened, forcing the component to this status.
    Opened(ComponentStatus),
    /// Still triggered; the component status had drifted and was re-issued.
    Reissued(ComponentStatus),
    /// Still triggered; nothing to change.
    Steady,
    /// The incident was marked fixed and dropped.
    Resolved(Option<IncidentId>),
    /// No incident but the component was not up; it was forced back.
    StatusReset,
}

/// Values available to incident templates.
pub fn template_context(config: &MonitorConfig, state: &MonitorState) -> TemplateContext {
    TemplateContext::new()
        .with("Name", &config.name)
        .with("Target", &config.target)
        .with("Type", config.kind)
        .with("Strict", config.strict)
        .with("ComponentId", config.component_id)
        .with("FailReason", state.last_failure.as_deref().unwrap_or_default())
        .with("Now", Local::now().format("%H:%M:%S %b %-d %Z"))
        .with("UpCount", state.up_count)
        .with("DownCount", state.down_count)
}

/// Drive the incident state machine for one evaluated window.
pub async fn apply(
    config: &MonitorConfig,
    api: &dyn StatusPage,
    state: &mut MonitorState,
    classification: &Classification,
) -> Transition {
    if !classification.saturated {
        return Transition::Accumulating;
    }

    if let Some(desired) = classification.verdict.desired_status() {
        if state.incident.is_none() {
            open(config, api, state, desired).await;
            return Transition::Opened(desired);
        }
        if state.status != desired {
            set_status(config, api, state, desired).await;
            return Transition::Reissued(desired);
        }
        return Transition::Steady;
    }

    match state.incident.take() {
        Some(incident) => Transition::Resolved(resolve(config, api, state, incident).await),
        None if !state.is_up() => {
            info!(monitor = %config.name, status = %state.status, "resetting component status");
            state.last_failure = None;
            set_status(config, api, state, ComponentStatus::Operational).await;
            Transition::StatusReset
        }
        None => Transition::Healthy,
    }
}

async fn open(
    config: &MonitorConfig,
    api: &dyn StatusPage,
    state: &mut MonitorState,
    desired: ComponentStatus,
) {
    let ctx = template_context(config, state);
    let (subject, message) = config.template.investigating.render(&ctx);
    let mut incident = Incident::new(config.component_id, subject, message, desired);
    incident.set_investigating();

    warn!(
        monitor = %config.name,
        reason = state.last_failure.as_deref().unwrap_or_default(),
        status = %desired,
        "creating incident, monitor is down"
    );

    match api.send_incident(&incident).await {
        Ok(id) => {
            incident.id = Some(id);
            // The status page applies the incident's component status.
            state.status = desired;
            debug!(monitor = %config.name, incident_id = id, "incident created");
        }
        Err(e) => warn!(monitor = %config.name, error = %e, "failed to send incident"),
    }
    state.incident = Some(incident);
}

async fn resolve(
    config: &MonitorConfig,
    api: &dyn StatusPage,
    state: &mut MonitorState,
    mut incident: Incident,
) -> Option<IncidentId> {
    info!(monitor = %config.name, incident_id = ?incident.id, "resolving incident");

    let mut ctx = template_context(config, state);
    if let Some(id) = incident.id {
        ctx.insert("IncidentId", id);
    }
    let (subject, message) = config.template.fixed.render(&ctx);
    incident.name = subject;
    incident.message = message;
    incident.set_fixed();

    if let Err(e) = api.send_incident(&incident).await {
        warn!(monitor = %config.name, error = %e, "failed to update incident");
    }

    state.last_failure = None;
    state.status = ComponentStatus::Operational;
    incident.id
}

/// Push `status` to the component; the cache only follows a confirmed update.
async fn set_status(
    config: &MonitorConfig,
    api: &dyn StatusPage,
    state: &mut MonitorState,
    status: ComponentStatus,
) {
    match api.set_component_status(config.component_id, status).await {
        Ok(()) => {
            debug!(monitor = %config.name, %status, "component status updated");
            state.status = status;
        }
        Err(e) => warn!(monitor = %config.name, %status, error = %e, "failed to update component status"),
    }
}
