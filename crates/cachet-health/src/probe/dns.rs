//! DNS probe.
//!
//! Resolves the target host through the system resolver. With
//! `expected_addresses` configured, a strict monitor needs every resolved
//! address to be expected; a non-strict one needs at least one.

use std::net::IpAddr;
use std::time::Duration;

use tracing::debug;

use cachet_core::MonitorConfig;

use super::{Probe, ProbeFuture, ProbeResult};

pub struct DnsProbe {
    expected: Vec<IpAddr>,
}

impl DnsProbe {
    /// Unparseable addresses are dropped here and reported by `validate`.
    pub fn from_config(config: &MonitorConfig) -> Self {
        Self {
            expected: config
                .expected_addresses
                .iter()
                .filter_map(|a| a.parse().ok())
                .collect(),
        }
    }

    fn evaluate(&self, resolved: &[IpAddr], strict: bool) -> ProbeResult {
        if resolved.is_empty() {
            return ProbeResult::down("no addresses resolved");
        }
        if self.expected.is_empty() {
            return ProbeResult::Up;
        }

        let expected = |ip: &IpAddr| self.expected.contains(ip);
        let ok = if strict {
            resolved.iter().all(expected)
        } else {
            resolved.iter().any(expected)
        };
        if ok {
            ProbeResult::Up
        } else {
            ProbeResult::Down(format!("unexpected addresses: {resolved:?}"))
        }
    }
}

fn host_of(target: &str) -> &str {
    match target.rsplit_once(':') {
        Some((host, port)) if port.parse::<u16>().is_ok() && !host.contains(':') => host,
        _ => target,
    }
}

impl Probe for DnsProbe {
    fn check<'a>(&'a self, target: &'a str, _timeout: Duration, strict: bool) -> ProbeFuture<'a> {
        Box::pin(async move {
            let host = host_of(target);
            match tokio::net::lookup_host((host, 0)).await {
                Ok(addrs) => {
                    let mut resolved: Vec<IpAddr> = addrs.map(|a| a.ip()).collect();
                    resolved.sort();
                    resolved.dedup();
                    debug!(%host, ?resolved, "dns lookup");
                    self.evaluate(&resolved, strict)
                }
                Err(e) => ProbeResult::Down(format!("lookup of {host} failed: {e}")),
            }
        })
    }

    fn describe(&self) -> Vec<String> {
        if self.expected.is_empty() {
            return vec!["Expected addresses: any".to_string()];
        }
        let list: Vec<String> = self.expected.iter().map(ToString::to_string).collect();
        vec![format!("Expected addresses: {}", list.join(", "))]
    }

    fn validate(&self, config: &MonitorConfig) -> Vec<String> {
        let mut errs = Vec::new();
        if config.target.trim().is_empty() {
            errs.push("dns target must not be empty".to_string());
        }
        for addr in &config.expected_addresses {
            if addr.parse::<IpAddr>().is_err() {
                errs.push(format!("expected address '{addr}' is not an IP address"));
            }
        }
        errs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn probe(expected: &[&str]) -> DnsProbe {
        DnsProbe::from_config(&MonitorConfig {
            expected_addresses: expected.iter().map(|s| s.to_string()).collect(),
            ..Default::default()
        })
    }

    fn ips(list: &[&str]) -> Vec<IpAddr> {
        list.iter().map(|s| s.parse().unwrap()).collect()
    }

    #[test]
    fn strict_needs_all_expected() {
        let p = probe(&["10.0.0.1", "10.0.0.2"]);
        assert!(p.evaluate(&ips(&["10.0.0.1"]), true).is_up());
        assert!(!p.evaluate(&ips(&["10.0.0.1", "10.0.0.9"]), true).is_up());
        assert!(p.evaluate(&ips(&["10.0.0.1", "10.0.0.9"]), false).is_up());
        assert!(!p.evaluate(&ips(&["10.0.0.9"]), false).is_up());
    }

    #[test]
    fn empty_answer_is_down() {
        assert_eq!(
            probe(&[]).evaluate(&[], false),
            ProbeResult::down("no addresses resolved")
        );
    }

    #[test]
    fn strips_port() {
        assert_eq!(host_of("example.com:53"), "example.com");
        assert_eq!(host_of("example.com"), "example.com");
        assert_eq!(host_of("::1"), "::1");
    }

    #[test]
    fn validate_reports_bad_addresses() {
        let config = MonitorConfig {
            target: "example.com".to_string(),
            expected_addresses: vec!["10.0.0.1".to_string(), "nope".to_string()],
            ..Default::default()
        };
        let errs = DnsProbe::from_config(&config).validate(&config);
        assert_eq!(errs, vec!["expected address 'nope' is not an IP address"]);
    }

    #[tokio::test]
    async fn resolves_localhost() {
        let result = probe(&[]).check("127.0.0.1", Duration::from_secs(1), true).await;
        assert!(result.is_up());
    }
}
