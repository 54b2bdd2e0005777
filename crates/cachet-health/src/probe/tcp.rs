//! TCP connect probe. Up when a connection to `host:port` is accepted.

use std::time::Duration;

use tokio::net::TcpStream;
use tracing::debug;

use cachet_core::MonitorConfig;

use super::{Probe, ProbeFuture, ProbeResult};

pub struct TcpProbe;

impl Probe for TcpProbe {
    fn check<'a>(&'a self, target: &'a str, _timeout: Duration, _strict: bool) -> ProbeFuture<'a> {
        Box::pin(async move {
            match TcpStream::connect(target).await {
                Ok(stream) => {
                    debug!(%target, peer = ?stream.peer_addr().ok(), "tcp connect ok");
                    ProbeResult::Up
                }
                Err(e) => ProbeResult::Down(format!("tcp connect to {target} failed: {e}")),
            }
        })
    }

    fn validate(&self, config: &MonitorConfig) -> Vec<String> {
        match split_host_port(&config.target) {
            Some(_) => Vec::new(),
            None => vec![format!(
                "target '{}' must be in host:port form",
                config.target
            )],
        }
    }
}

fn split_host_port(target: &str) -> Option<(&str, u16)> {
    let (host, port) = target.rsplit_once(':')?;
    let host = host.trim_start_matches('[').trim_end_matches(']');
    if host.is_empty() {
        return None;
    }
    let port = port.parse::<u16>().ok().filter(|p| *p > 0)?;
    Some((host, port))
}
