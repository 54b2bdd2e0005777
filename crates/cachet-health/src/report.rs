//! Fire-and-forget metric reporting.
//!
//! Each report is its own task; the owning cycle never waits for it.

use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::warn;

use cachet_api::StatusPage;
use cachet_core::MetricId;

/// Send one value to a single metric in the background.
pub fn spawn_metric(
    api: &Arc<dyn StatusPage>,
    monitor: &str,
    metric_id: MetricId,
    value: f64,
) -> JoinHandle<()> {
    let api = Arc::clone(api);
    let monitor = monitor.to_string();
    tokio::spawn(async move {
        if let Err(e) = api.send_metric(metric_id, value).await {
            warn!(%monitor, metric_id, error = %e, "failed to send metric");
        }
    })
}

/// Send one value to every metric of a category in the background.
pub fn spawn_metrics(
    api: &Arc<dyn StatusPage>,
    category: &'static str,
    metric_ids: &[MetricId],
    value: f64,
) -> Option<JoinHandle<()>> {
    if metric_ids.is_empty() {
        return None;
    }
    let api = Arc::clone(api);
    let metric_ids = metric_ids.to_vec();
    Some(tokio::spawn(async move {
        api.send_metrics(category, &metric_ids, value).await;
    }))
}
