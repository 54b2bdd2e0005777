//! Cachet-compatible implementation of [`StatusPage`].

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use http::Method;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use tracing::{debug, info};

use cachet_core::{
    ApiConfig, ComponentData, ComponentId, ComponentStatus, Incident, IncidentId, IncidentStatus,
    MetricId,
};

use crate::client::{ApiFuture, StatusPage};
use crate::error::{ApiError, ApiResult};
use crate::transport::{HttpResponse, HttpTransport};

const TOKEN_HEADER: &str = "X-Cachet-Token";

/// Number of recent incidents inspected when looking for an open one.
const INCIDENT_LOOKBACK: u32 = 10;

/// HTTP client for the Cachet v1 API.
#[derive(Debug, Clone)]
pub struct CachetClient {
    base_url: String,
    token: String,
    insecure: bool,
    timeout: Duration,
    transport: HttpTransport,
}

impl CachetClient {
    pub fn new(config: &ApiConfig, transport: HttpTransport) -> Self {
        Self {
            base_url: config.url.trim_end_matches('/').to_string(),
            token: config.token.clone(),
            insecure: config.insecure,
            timeout: config.timeout(),
            transport,
        }
    }

    /// Check connectivity and credentials.
    pub async fn ping(&self) -> ApiResult<()> {
        self.request(Method::GET, "/ping", None).await?;
        info!(url = %self.base_url, "status page reachable");
        Ok(())
    }

    async fn request(
        &self,
        method: Method,
        path: &str,
        body: Option<Vec<u8>>,
    ) -> ApiResult<HttpResponse> {
        let url = format!("{}{path}", self.base_url);
        let mut headers = vec![(TOKEN_HEADER.to_string(), self.token.clone())];
        if body.is_some() {
            headers.push(("Content-Type".to_string(), "application/json".to_string()));
        }

        debug!(%method, %url, "status page request");
        let resp = self
            .transport
            .send(method, &url, &headers, body, !self.insecure, self.timeout)
            .await?;

        if !resp.is_success() {
            return Err(ApiError::Status {
                status: resp.status,
                body: resp.text(),
            });
        }
        Ok(resp)
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> ApiResult<T> {
        let resp = self.request(Method::GET, path, None).await?;
        decode(&resp)
    }

    async fn send_json<B: Serialize, T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: &B,
    ) -> ApiResult<T> {
        let payload = serde_json::to_vec(body).map_err(|e| ApiError::Decode(e.to_string()))?;
        let resp = self.request(method, path, Some(payload)).await?;
        decode(&resp)
    }

    async fn fetch_component(&self, id: ComponentId) -> ApiResult<ComponentData> {
        let env: Envelope<ComponentWire> = self
            .get_json(&format!("/components/{id}"))
            .await
            .map_err(|e| match e {
                ApiError::Status { status: 404, .. } => ApiError::NotFound(id),
                other => other,
            })?;
        Ok(env.data.into())
    }

    async fn put_component_status(
        &self,
        id: ComponentId,
        status: ComponentStatus,
    ) -> ApiResult<()> {
        let body = ComponentStatusBody {
            status: status.code(),
        };
        let _: Envelope<ComponentWire> = self
            .send_json(Method::PUT, &format!("/components/{id}"), &body)
            .await?;
        info!(component_id = id, %status, "component status updated");
        Ok(())
    }

    async fn fetch_current_incident(
        &self,
        component_id: ComponentId,
    ) -> ApiResult<Option<Incident>> {
        let env: Envelope<Vec<IncidentWire>> = self
            .get_json(&format!(
                "/incidents?component_id={component_id}&sort=id&order=desc&per_page={INCIDENT_LOOKBACK}"
            ))
            .await?;
        Ok(current_incident(env.data, component_id))
    }

    async fn put_incident(&self, incident: &Incident) -> ApiResult<IncidentId> {
        let body = IncidentBody::from(incident);
        let env: Envelope<IncidentWire> = match incident.id {
            Some(id) => {
                self.send_json(Method::PUT, &format!("/incidents/{id}"), &body)
                    .await?
            }
            None => self.send_json(Method::POST, "/incidents", &body).await?,
        };
        debug!(incident_id = env.data.id, status = body.status, "incident sent");
        Ok(env.data.id)
    }

    async fn post_metric_point(&self, metric_id: MetricId, value: f64) -> ApiResult<()> {
        let body = MetricPointBody {
            value,
            timestamp: epoch_secs(),
        };
        let _: serde_json::Value = self
            .send_json(Method::POST, &format!("/metrics/{metric_id}/points"), &body)
            .await?;
        Ok(())
    }
}

impl StatusPage for CachetClient {
    fn component(&self, id: ComponentId) -> ApiFuture<'_, ComponentData> {
        Box::pin(self.fetch_component(id))
    }

    fn set_component_status(
        &self,
        id: ComponentId,
        status: ComponentStatus,
    ) -> ApiFuture<'_, ()> {
        Box::pin(self.put_component_status(id, status))
    }

    fn current_incident(&self, component_id: ComponentId) -> ApiFuture<'_, Option<Incident>> {
        Box::pin(self.fetch_current_incident(component_id))
    }

    fn send_incident<'a>(&'a self, incident: &'a Incident) -> ApiFuture<'a, IncidentId> {
        Box::pin(self.put_incident(incident))
    }

    fn send_metric(&self, metric_id: MetricId, value: f64) -> ApiFuture<'_, ()> {
        Box::pin(self.post_metric_point(metric_id, value))
    }
}

// ── Wire format ─────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    data: T,
}

#[derive(Debug, Deserialize)]
struct ComponentWire {
    id: ComponentId,
    #[serde(default)]
    name: String,
    #[serde(default = "default_enabled")]
    enabled: bool,
    #[serde(deserialize_with = "status_code")]
    status: u8,
}

fn default_enabled() -> bool {
    true
}

impl From<ComponentWire> for ComponentData {
    fn from(wire: ComponentWire) -> Self {
        Self {
            id: wire.id,
            name: wire.name,
            enabled: wire.enabled,
            status: ComponentStatus::from_code(wire.status).unwrap_or_default(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct IncidentWire {
    id: IncidentId,
    #[serde(default)]
    name: String,
    #[serde(default)]
    message: String,
    #[serde(default, deserialize_with = "status_code")]
    status: u8,
    #[serde(default)]
    component_id: Option<ComponentId>,
}

#[derive(Debug, Serialize)]
struct ComponentStatusBody {
    status: u8,
}

#[derive(Debug, Serialize)]
struct IncidentBody<'a> {
    name: &'a str,
    message: &'a str,
    status: u8,
    visible: u8,
    component_id: ComponentId,
    component_status: u8,
    notify: bool,
}

impl<'a> From<&'a Incident> for IncidentBody<'a> {
    fn from(incident: &'a Incident) -> Self {
        Self {
            name: &incident.name,
            message: &incident.message,
            status: incident.status.code(),
            visible: u8::from(incident.visible),
            component_id: incident.component_id,
            component_status: incident.component_status.code(),
            notify: incident.notify,
        }
    }
}

#[derive(Debug, Serialize)]
struct MetricPointBody {
    value: f64,
    timestamp: u64,
}

/// Cachet reports status codes either as numbers or numeric strings.
fn status_code<'de, D>(deserializer: D) -> Result<u8, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Code {
        Number(u8),
        Text(String),
    }

    match Code::deserialize(deserializer)? {
        Code::Number(n) => Ok(n),
        Code::Text(s) => s.trim().parse().map_err(serde::de::Error::custom),
    }
}

fn decode<T: DeserializeOwned>(resp: &HttpResponse) -> ApiResult<T> {
    serde_json::from_slice(&resp.body).map_err(|e| ApiError::Decode(e.to_string()))
}

/// Pick the newest open incident of `component_id` from a newest-first list.
fn current_incident(incidents: Vec<IncidentWire>, component_id: ComponentId) -> Option<Incident> {
    incidents
        .into_iter()
        .filter(|i| i.component_id.is_none_or(|c| c == component_id))
        .find_map(|i| {
            let status = IncidentStatus::from_code(i.status)?;
            if status == IncidentStatus::Fixed {
                return None;
            }
            Some(Incident {
                id: Some(i.id),
                component_id,
                name: i.name,
                message: i.message,
                notify: true,
                visible: true,
                status,
                // The status page does not echo the forced status back.
                component_status: ComponentStatus::MajorOutage,
            })
        })
}

fn epoch_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_server::serve_once;

    #[test]
    fn component_wire_accepts_string_status() {
        let env: Envelope<ComponentWire> =
            serde_json::from_str(r#"{"data":{"id":3,"name":"web","enabled":true,"status":"4"}}"#)
                .unwrap();
        let data = ComponentData::from(env.data);
        assert_eq!(data.id, 3);
        assert_eq!(data.status, ComponentStatus::MajorOutage);
        assert!(data.enabled);
    }

    #[test]
    fn component_wire_defaults() {
        let env: Envelope<ComponentWire> =
            serde_json::from_str(r#"{"data":{"id":1,"status":9}}"#).unwrap();
        let data = ComponentData::from(env.data);
        assert!(data.enabled);
        assert_eq!(data.status, ComponentStatus::Unknown);
    }

    #[test]
    fn current_incident_skips_fixed_and_foreign() {
        let incidents: Vec<IncidentWire> = serde_json::from_str(
            r#"[
                {"id": 9, "name": "other", "status": 1, "component_id": 2},
                {"id": 8, "name": "old", "status": 4, "component_id": 1},
                {"id": 7, "name": "open", "message": "m", "status": 2, "component_id": 1},
                {"id": 6, "name": "older", "status": 1, "component_id": 1}
            ]"#,
        )
        .unwrap();

        let incident = current_incident(incidents, 1).unwrap();
        assert_eq!(incident.id, Some(7));
        assert_eq!(incident.name, "open");
        assert_eq!(incident.status, IncidentStatus::Identified);
    }

    #[test]
    fn current_incident_none_when_all_fixed() {
        let incidents: Vec<IncidentWire> =
            serde_json::from_str(r#"[{"id": 1, "status": 4, "component_id": 1}]"#).unwrap();
        assert!(current_incident(incidents, 1).is_none());
    }

    #[test]
    fn incident_body_uses_codes() {
        let mut incident = Incident::new(
            5,
            "subject".to_string(),
            "body".to_string(),
            ComponentStatus::PartialOutage,
        );
        let json = serde_json::to_value(IncidentBody::from(&incident)).unwrap();
        assert_eq!(json["status"], 1);
        assert_eq!(json["component_status"], 3);
        assert_eq!(json["visible"], 1);
        assert_eq!(json["notify"], true);

        incident.set_fixed();
        let json = serde_json::to_value(IncidentBody::from(&incident)).unwrap();
        assert_eq!(json["status"], 4);
        assert_eq!(json["component_status"], 1);
    }

    fn client(base: String) -> CachetClient {
        let config = ApiConfig {
            url: format!("{base}/api/v1"),
            token: "secret".to_string(),
            insecure: false,
            timeout: 5,
        };
        CachetClient::new(&config, HttpTransport::new().unwrap())
    }

    #[tokio::test]
    async fn component_request_sends_token() {
        let (url, server) =
            serve_once("200 OK", r#"{"data":{"id":4,"name":"api","enabled":false,"status":1}}"#).await;
        let data = client(url).component(4).await.unwrap();
        assert_eq!(data.name, "api");
        assert!(!data.enabled);
        assert_eq!(data.status, ComponentStatus::Operational);

        let raw = server.await.unwrap();
        assert!(raw.starts_with("GET /api/v1/components/4 HTTP/1.1"));
        assert!(raw.to_ascii_lowercase().contains("x-cachet-token: secret"));
    }

    #[tokio::test]
    async fn missing_component_maps_to_not_found() {
        let (url, _server) = serve_once("404 Not Found", r#"{"errors":[]}"#).await;
        let err = client(url).component(12).await.unwrap_err();
        assert!(matches!(err, ApiError::NotFound(12)));
    }

    #[tokio::test]
    async fn new_incident_is_posted() {
        let (url, server) = serve_once("200 OK", r#"{"data":{"id":42,"status":1}}"#).await;
        let incident = Incident::new(
            4,
            "web down".to_string(),
            "timeout".to_string(),
            ComponentStatus::MajorOutage,
        );
        let id = client(url).send_incident(&incident).await.unwrap();
        assert_eq!(id, 42);

        let raw = server.await.unwrap();
        assert!(raw.starts_with("POST /api/v1/incidents HTTP/1.1"));
        assert!(raw.contains(r#""component_status":4"#));
    }
}
