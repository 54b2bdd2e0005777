//! HTTP(S) probe.
//!
//! Sends one request to the target URL. The target is up when the response
//! status matches `expected_status_code` (any 2xx if unset) and, when
//! `expected_body` is set, the body matches that regex. Non-strict monitors
//! accept any TLS certificate.

use std::collections::BTreeMap;
use std::time::Duration;

use http::Method;
use regex::Regex;

use cachet_api::HttpTransport;
use cachet_core::MonitorConfig;

use super::{Probe, ProbeFuture, ProbeResult};

pub struct HttpProbe {
    method: String,
    expected_status: Option<u16>,
    expected_body: Option<String>,
    body_pattern: Option<Regex>,
    headers: Vec<(String, String)>,
    transport: HttpTransport,
}

impl HttpProbe {
    pub fn from_config(config: &MonitorConfig, transport: HttpTransport) -> Self {
        let expected_body = config
            .expected_body
            .clone()
            .filter(|body| !body.is_empty());
        Self {
            method: config
                .method
                .clone()
                .unwrap_or_else(|| "GET".to_string())
                .to_ascii_uppercase(),
            expected_status: config.expected_status_code,
            body_pattern: expected_body.as_deref().and_then(|re| Regex::new(re).ok()),
            expected_body,
            headers: headers(&config.headers),
            transport,
        }
    }

    fn evaluate(&self, status: u16, body: &str) -> ProbeResult {
        match self.expected_status {
            Some(expected) if status != expected => {
                return ProbeResult::Down(format!(
                    "unexpected status code: {status} (expected {expected})"
                ));
            }
            None if !(200..300).contains(&status) => {
                return ProbeResult::Down(format!("unexpected status code: {status}"));
            }
            _ => {}
        }

        if let Some(pattern) = &self.body_pattern {
            if !pattern.is_match(body) {
                return ProbeResult::Down(format!(
                    "unexpected body: does not match /{}/",
                    pattern.as_str()
                ));
            }
        }
        ProbeResult::Up
    }
}

fn headers(map: &BTreeMap<String, String>) -> Vec<(String, String)> {
    map.iter().map(|(k, v)| (k.clone(), v.clone())).collect()
}

impl Probe for HttpProbe {
    fn check<'a>(&'a self, target: &'a str, timeout: Duration, strict: bool) -> ProbeFuture<'a> {
        Box::pin(async move {
            let method = match Method::from_bytes(self.method.as_bytes()) {
                Ok(m) => m,
                Err(e) => return ProbeResult::Down(format!("invalid method: {e}")),
            };
            match self
                .transport
                .send(method, target, &self.headers, None, strict, timeout)
                .await
            {
                Ok(resp) => self.evaluate(resp.status, &resp.text()),
                Err(e) => ProbeResult::Down(e.to_string()),
            }
        })
    }

    fn describe(&self) -> Vec<String> {
        let mut features = vec![format!("Method: {}", self.method)];
        match self.expected_status {
            Some(code) => features.push(format!("Expected status code: {code}")),
            None => features.push("Expected status code: any 2xx".to_string()),
        }
        if let Some(body) = &self.expected_body {
            features.push(format!("Expected body: /{body}/"));
        }
        if !self.headers.is_empty() {
            features.push(format!("Headers: {}", self.headers.len()));
        }
        features
    }

    fn validate(&self, config: &MonitorConfig) -> Vec<String> {
        let mut errs = Vec::new();

        if !(config.target.starts_with("http://") || config.target.starts_with("https://")) {
            errs.push(format!(
                "target '{}' must be an http:// or https:// URL",
                config.target
            ));
        }
        if Method::from_bytes(self.method.as_bytes()).is_err() {
            errs.push(format!("invalid http method '{}'", self.method));
        }
        if let Some(code) = self.expected_status {
            if !(100..=599).contains(&code) {
                errs.push(format!("expected_status_code {code} is not an http status"));
            }
        }
        if let Some(body) = &self.expected_body {
            if let Err(e) = Regex::new(body) {
                errs.push(format!("expected_body is not a valid regex: {e}"));
            }
        }

        errs
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    fn config(target: &str) -> MonitorConfig {
        MonitorConfig {
            name: "web".to_string(),
            target: target.to_string(),
            component_id: 1,
            ..Default::default()
        }
    }

    fn probe(config: &MonitorConfig) -> HttpProbe {
        HttpProbe::from_config(config, HttpTransport::new().unwrap())
    }

    #[test]
    fn any_2xx_by_default() {
        let p = probe(&config("http://x"));
        assert!(p.evaluate(204, "").is_up());
        assert_eq!(
            p.evaluate(503, ""),
            ProbeResult::down("unexpected status code: 503")
        );
    }

    #[test]
    fn exact_status_and_body() {
        let mut c = config("http://x");
        c.expected_status_code = Some(301);
        c.expected_body = Some("^ok$".to_string());
        let p = probe(&c);

        assert!(p.evaluate(301, "ok").is_up());
        assert!(!p.evaluate(200, "ok").is_up());
        assert!(!p.evaluate(301, "nope").is_up());
    }

    #[test]
    fn validation_reports_bad_fields() {
        let mut c = config("example.com");
        c.method = Some("GE T".to_string());
        c.expected_status_code = Some(42);
        c.expected_body = Some("(".to_string());

        let errs = probe(&c).validate(&c);
        assert_eq!(errs.len(), 4, "{errs:?}");
    }

    #[test]
    fn describe_includes_expectations() {
        let mut c = config("http://x");
        c.method = Some("head".to_string());
        let lines = probe(&c).describe();
        assert_eq!(lines[0], "Method: HEAD");
        assert_eq!(lines[1], "Expected status code: any 2xx");
    }

    #[tokio::test]
    async fn checks_live_endpoint() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 1024];
            let _ = socket.read(&mut buf).await.unwrap();
            socket
                .write_all(b"HTTP/1.1 500 Internal Server Error\r\nContent-Length: 0\r\nConnection: close\r\n\r\n")
                .await
                .unwrap();
            socket.shutdown().await.unwrap();
        });

        let c = config(&format!("http://{addr}/healthz"));
        let result = probe(&c)
            .check(&c.target, Duration::from_secs(5), true)
            .await;
        assert_eq!(result, ProbeResult::down("unexpected status code: 500"));
    }

    #[tokio::test]
    async fn closed_port_is_down() {
        let c = config("http://127.0.0.1:1/");
        let result = probe(&c)
            .check(&c.target, Duration::from_secs(2), true)
            .await;
        assert!(!result.is_up());
    }
}
