//! In-memory [`StatusPage`] that records every call.
//!
//! Enabled by the `test-util` feature so the engine's tests can observe
//! exactly which external effects a cycle produced.

use std::sync::{Mutex, MutexGuard};

use cachet_core::{ComponentData, ComponentId, ComponentStatus, Incident, IncidentId, MetricId};

use crate::client::{ApiFuture, StatusPage};
use crate::error::ApiError;

/// One observed call.
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Component(ComponentId),
    SetComponentStatus(ComponentId, ComponentStatus),
    CurrentIncident(ComponentId),
    SendIncident(Incident),
    Metric(MetricId, f64),
}

#[derive(Debug)]
struct Inner {
    component: ComponentData,
    open_incident: Option<Incident>,
    next_incident_id: IncidentId,
    fail: bool,
    calls: Vec<Call>,
}

/// Fake status page holding a single component.
#[derive(Debug)]
pub struct FakeStatusPage {
    inner: Mutex<Inner>,
}

impl FakeStatusPage {
    pub fn new(component_id: ComponentId, status: ComponentStatus) -> Self {
        Self {
            inner: Mutex::new(Inner {
                component: ComponentData {
                    id: component_id,
                    name: format!("component-{component_id}"),
                    enabled: true,
                    status,
                },
                open_incident: None,
                next_incident_id: 1,
                fail: false,
                calls: Vec::new(),
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Make every subsequent call fail with a 500.
    pub fn set_failing(&self, fail: bool) {
        self.lock().fail = fail;
    }

    /// Change the component behind the engine's back (a manual edit).
    pub fn set_status(&self, status: ComponentStatus) {
        self.lock().component.status = status;
    }

    pub fn set_enabled(&self, enabled: bool) {
        self.lock().component.enabled = enabled;
    }

    pub fn set_open_incident(&self, incident: Option<Incident>) {
        self.lock().open_incident = incident;
    }

    pub fn status(&self) -> ComponentStatus {
        self.lock().component.status
    }

    pub fn open_incident(&self) -> Option<Incident> {
        self.lock().open_incident.clone()
    }

    pub fn calls(&self) -> Vec<Call> {
        self.lock().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.lock().calls.clear();
    }

    pub fn status_updates(&self) -> Vec<ComponentStatus> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::SetComponentStatus(_, status) => Some(status),
                _ => None,
            })
            .collect()
    }

    pub fn sent_incidents(&self) -> Vec<Incident> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::SendIncident(incident) => Some(incident),
                _ => None,
            })
            .collect()
    }

    pub fn metrics(&self) -> Vec<(MetricId, f64)> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Metric(id, value) => Some((id, value)),
                _ => None,
            })
            .collect()
    }

    fn record(&self, call: Call) -> Result<MutexGuard<'_, Inner>, ApiError> {
        let mut inner = self.lock();
        inner.calls.push(call);
        if inner.fail {
            return Err(ApiError::Status {
                status: 500,
                body: "fake failure".to_string(),
            });
        }
        Ok(inner)
    }
}

impl StatusPage for FakeStatusPage {
    fn component(&self, id: ComponentId) -> ApiFuture<'_, ComponentData> {
        let result = self.record(Call::Component(id)).and_then(|inner| {
            if inner.component.id == id {
                Ok(inner.component.clone())
            } else {
                Err(ApiError::NotFound(id))
            }
        });
        Box::pin(async move { result })
    }

    fn set_component_status(
        &self,
        id: ComponentId,
        status: ComponentStatus,
    ) -> ApiFuture<'_, ()> {
        let result = self
            .record(Call::SetComponentStatus(id, status))
            .map(|mut inner| inner.component.status = status);
        Box::pin(async move { result })
    }

    fn current_incident(&self, component_id: ComponentId) -> ApiFuture<'_, Option<Incident>> {
        let result = self
            .record(Call::CurrentIncident(component_id))
            .map(|inner| inner.open_incident.clone());
        Box::pin(async move { result })
    }

    fn send_incident<'a>(&'a self, incident: &'a Incident) -> ApiFuture<'a, IncidentId> {
        let result = self.record(Call::SendIncident(incident.clone())).map(|mut inner| {
            let id = match incident.id {
                Some(id) => id,
                None => {
                    let id = inner.next_incident_id;
                    inner.next_incident_id += 1;
                    id
                }
            };
            inner.component.status = incident.component_status;
            inner.open_incident = if incident.is_fixed() {
                None
            } else {
                Some(Incident {
                    id: Some(id),
                    ..incident.clone()
                })
            };
            id
        });
        Box::pin(async move { result })
    }

    fn send_metric(&self, metric_id: MetricId, value: f64) -> ApiFuture<'_, ()> {
        let result = self.record(Call::Metric(metric_id, value)).map(|_| ());
        Box::pin(async move { result })
    }
}
