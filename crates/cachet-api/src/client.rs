//! The status-page capability consumed by the monitoring engine.

use std::future::Future;
use std::pin::Pin;

use tracing::{debug, warn};

use cachet_core::{ComponentData, ComponentId, ComponentStatus, Incident, IncidentId, MetricId};

use crate::error::ApiResult;

/// Boxed future returned by [`StatusPage`] methods.
pub type ApiFuture<'a, T> = Pin<Box<dyn Future<Output = ApiResult<T>> + Send + 'a>>;

/// Operations the engine performs against the status page.
///
/// Every call is attempted once; callers log failures and rely on the next
/// cycle (or the next resync) to correct any drift.
pub trait StatusPage: Send + Sync {
    /// Fetch the authoritative state of a component.
    fn component(&self, id: ComponentId) -> ApiFuture<'_, ComponentData>;

    fn set_component_status(&self, id: ComponentId, status: ComponentStatus)
    -> ApiFuture<'_, ()>;

    /// The most recent incident of a component that is not fixed yet.
    fn current_incident(&self, component_id: ComponentId) -> ApiFuture<'_, Option<Incident>>;

    /// Create the incident (no id yet) or update it, returning its id.
    fn send_incident<'a>(&'a self, incident: &'a Incident) -> ApiFuture<'a, IncidentId>;

    fn send_metric(&self, metric_id: MetricId, value: f64) -> ApiFuture<'_, ()>;

    /// Send one value to every metric of a category, logging failures.
    fn send_metrics<'a>(
        &'a self,
        category: &'a str,
        metric_ids: &'a [MetricId],
        value: f64,
    ) -> Pin<Box<dyn Future<Output = ()> + Send + 'a>> {
        Box::pin(async move {
            for &metric_id in metric_ids {
                match self.send_metric(metric_id, value).await {
                    Ok(()) => debug!(%category, metric_id, value, "metric sent"),
                    Err(e) => warn!(%category, metric_id, error = %e, "failed to send metric"),
                }
            }
        })
    }
}
