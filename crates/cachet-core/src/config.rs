//! Configuration file parser and monitor validation.

use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, ConfigResult};
use crate::template::MonitorTemplates;
use crate::types::{ComponentId, MetricId};

/// Check interval, in seconds, used when none (or less than 1) is configured.
pub const DEFAULT_INTERVAL: i64 = 60;
/// Probe timeout, in seconds, used when none (or less than 1) is configured.
pub const DEFAULT_TIMEOUT: i64 = 1;
pub const DEFAULT_HISTORY_SIZE: i64 = 10;
/// Plain percent threshold applied when every threshold leg is disabled.
pub const DEFAULT_THRESHOLD_PERCENT: i64 = 100;
/// Status-page request timeout, in seconds.
pub const DEFAULT_API_TIMEOUT: u64 = 10;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CachetConfig {
    /// Run one check per monitor before waiting for the first tick.
    #[serde(default)]
    pub immediate: bool,
    pub api: ApiConfig,
    #[serde(default)]
    pub monitors: Vec<MonitorConfig>,
}

impl CachetConfig {
    pub fn from_file(path: &Path) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> ConfigResult<Self> {
        Ok(toml::from_str(content)?)
    }
}

/// Status-page endpoint settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Base URL of the API, e.g. `https://status.example.com/api/v1`.
    pub url: String,
    pub token: String,
    /// Skip TLS certificate verification.
    #[serde(default)]
    pub insecure: bool,
    /// Per-request timeout in seconds.
    #[serde(default = "default_api_timeout")]
    pub timeout: u64,
}

fn default_api_timeout() -> u64 {
    DEFAULT_API_TIMEOUT
}

impl ApiConfig {
    pub fn validate(&self) -> Vec<String> {
        let mut errs = Vec::new();
        if !(self.url.starts_with("http://") || self.url.starts_with("https://")) {
            errs.push(format!("api url '{}' must be an http(s) URL", self.url));
        }
        if self.token.trim().is_empty() {
            errs.push("api token is required".to_string());
        }
        errs
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout.max(1))
    }
}

/// The kind of check a monitor performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckKind {
    #[default]
    Http,
    Tcp,
    Dns,
    Mock,
}

impl std::fmt::Display for CheckKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Http => "http",
            Self::Tcp => "tcp",
            Self::Dns => "dns",
            Self::Mock => "mock",
        })
    }
}

/// Metric ids a monitor reports to, per category.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricIds {
    pub response_time: Vec<MetricId>,
    pub availability: Vec<MetricId>,
    pub incident_count: Vec<MetricId>,
}

/// One monitor, as written in the configuration file.
///
/// Durations and thresholds are raw until [`validate`](Self::validate) has
/// normalized them; the engine only consumes validated configs.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    pub name: String,
    pub target: String,
    #[serde(rename = "type")]
    pub kind: CheckKind,
    pub strict: bool,

    /// Seconds between checks.
    pub interval: i64,
    /// Seconds a single check may take.
    pub timeout: i64,
    /// Reload status-page state every this many cycles (0 disables).
    pub resync: u32,

    pub component_id: ComponentId,
    /// Legacy single response-time metric.
    pub metric_id: MetricId,
    pub metrics: MetricIds,

    pub on_success: Option<String>,
    pub on_failure: Option<String>,

    pub template: MonitorTemplates,

    pub history_size: i64,
    /// Plain leg, percent of down outcomes.
    pub threshold: i64,
    pub threshold_count: i64,
    pub threshold_critical: i64,
    pub threshold_critical_count: i64,
    pub threshold_partial: i64,
    pub threshold_partial_count: i64,

    // http
    pub method: Option<String>,
    pub expected_status_code: Option<u16>,
    pub expected_body: Option<String>,
    pub headers: BTreeMap<String, String>,

    // dns
    pub expected_addresses: Vec<String>,

    // mock
    pub mock_down: bool,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            name: String::new(),
            target: String::new(),
            kind: CheckKind::default(),
            strict: true,
            interval: 0,
            timeout: 0,
            resync: 0,
            component_id: 0,
            metric_id: 0,
            metrics: MetricIds::default(),
            on_success: None,
            on_failure: None,
            template: MonitorTemplates::default(),
            history_size: 0,
            threshold: 0,
            threshold_count: 0,
            threshold_critical: 0,
            threshold_critical_count: 0,
            threshold_partial: 0,
            threshold_partial_count: 0,
            method: None,
            expected_status_code: None,
            expected_body: None,
            headers: BTreeMap::new(),
            expected_addresses: Vec::new(),
            mock_down: false,
        }
    }
}

impl MonitorConfig {
    /// Normalize defaults in place and collect every problem found.
    ///
    /// An empty list means the monitor is usable. Probe-specific fields are
    /// checked by the probe itself.
    pub fn validate(&mut self) -> Vec<String> {
        let mut errs = Vec::new();

        if self.name.trim().is_empty() {
            errs.push("name is required".to_string());
        }

        if self.interval < 1 {
            self.interval = DEFAULT_INTERVAL;
        }
        if self.timeout < 1 {
            self.timeout = DEFAULT_TIMEOUT;
        }
        if self.timeout > self.interval {
            errs.push(format!(
                "timeout ({}s) is greater than interval ({}s)",
                self.timeout, self.interval
            ));
        }

        if self.component_id == 0 && self.metric_id == 0 {
            errs.push("component_id & metric_id are unset".to_string());
        }

        if self.history_size < 1 {
            self.history_size = DEFAULT_HISTORY_SIZE;
        }

        let max = self.history_size;
        for value in [
            &mut self.threshold,
            &mut self.threshold_count,
            &mut self.threshold_critical,
            &mut self.threshold_critical_count,
            &mut self.threshold_partial,
            &mut self.threshold_partial_count,
        ] {
            *value = (*value).clamp(0, max);
        }

        if self.thresholds_disabled() {
            self.threshold = DEFAULT_THRESHOLD_PERCENT;
        }

        if let Err(e) = self.template.investigating.compile() {
            errs.push(format!("could not compile \"investigating\" template: {e}"));
        }
        if let Err(e) = self.template.fixed.compile() {
            errs.push(format!("could not compile \"fixed\" template: {e}"));
        }

        errs
    }

    fn thresholds_disabled(&self) -> bool {
        [
            self.threshold,
            self.threshold_count,
            self.threshold_critical,
            self.threshold_critical_count,
            self.threshold_partial,
            self.threshold_partial_count,
        ]
        .iter()
        .all(|v| *v == 0)
    }

    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval.max(1) as u64)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout.max(1) as u64)
    }

    pub fn history_size(&self) -> usize {
        self.history_size.max(1) as usize
    }

    /// Human-readable summary of the monitor's features.
    pub fn describe(&self) -> Vec<String> {
        let mut features = vec![format!("Type: {}", self.kind)];

        if !self.name.is_empty() {
            features.push(format!("Name: {}", self.name));
        }
        if self.target.is_empty() {
            features.push("Target: <mock>".to_string());
        } else {
            features.push(format!("Target: {}", self.target));
        }
        features.push(format!(
            "Availability count metrics: {}",
            self.metrics.availability.len()
        ));
        features.push(format!(
            "Incident count metrics: {}",
            self.metrics.incident_count.len()
        ));
        features.push(format!(
            "Response time metrics: {}",
            self.metrics.response_time.len()
        ));
        if self.resync > 0 {
            features.push(format!("Resyncs cycle: {}", self.resync));
        }
        if self.on_success.as_deref().is_some_and(|h| !h.is_empty()) {
            features.push("Has a 'on_success' shellhook".to_string());
        }
        if self.on_failure.as_deref().is_some_and(|h| !h.is_empty()) {
            features.push("Has a 'on_failure' shellhook".to_string());
        }

        features
    }
}
