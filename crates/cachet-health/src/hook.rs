//! Shell hooks, external commands fired after a check.
//!
//! A hook receives fixed positional arguments:
//!
//! ```text
//! <monitor name> <component id> <target> <hook type> <data> <status code> <up count> <down count>
//! ```
//!
//! Hooks run detached. Their exit status and output are only logged.

use tokio::process::Command;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use cachet_core::MonitorConfig;

use crate::state::MonitorState;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookKind {
    OnSuccess,
    OnFailure,
}

impl HookKind {
    pub fn tag(self) -> &'static str {
        match self {
            Self::OnSuccess => "on_success",
            Self::OnFailure => "on_failure",
        }
    }

    fn command(self, config: &MonitorConfig) -> Option<&str> {
        let hook = match self {
            Self::OnSuccess => config.on_success.as_deref(),
            Self::OnFailure => config.on_failure.as_deref(),
        };
        hook.filter(|h| !h.trim().is_empty())
    }
}

/// Positional arguments passed to a hook.
pub fn hook_args(
    config: &MonitorConfig,
    state: &MonitorState,
    kind: HookKind,
    data: &str,
) -> Vec<String> {
    vec![
        config.name.clone(),
        config.component_id.to_string(),
        config.target.clone(),
        kind.tag().to_string(),
        data.to_string(),
        state.status.code().to_string(),
        state.up_count.to_string(),
        state.down_count.to_string(),
    ]
}

/// Launch the configured hook of `kind`, if any, without waiting for it.
///
/// The returned handle may be dropped; it only exists so callers can wait
/// for completion when they need to (tests, shutdown).
pub fn dispatch(
    config: &MonitorConfig,
    state: &MonitorState,
    kind: HookKind,
    data: &str,
) -> Option<JoinHandle<()>> {
    let program = kind.command(config)?.to_string();
    let args = hook_args(config, state, kind, data);
    let monitor = config.name.clone();

    info!(%monitor, hook = kind.tag(), "sending shellhook");
    debug!(%monitor, %data, "shellhook data");

    Some(tokio::spawn(async move {
        match Command::new(&program).args(&args).output().await {
            Ok(output) if output.status.success() => {
                debug!(%monitor, hook = kind.tag(), "shellhook finished");
            }
            Ok(output) => {
                warn!(
                    %monitor,
                    hook = kind.tag(),
                    status = %output.status,
                    "error when processing shellhook"
                );
                warn!(
                    %monitor,
                    output = %String::from_utf8_lossy(&output.stdout),
                    "shellhook output"
                );
            }
            Err(e) => {
                warn!(%monitor, hook = kind.tag(), %program, error = %e, "failed to launch shellhook");
            }
        }
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use cachet_core::ComponentStatus;

    fn config() -> MonitorConfig {
        MonitorConfig {
            name: "web".to_string(),
            target: "https://example.com".to_string(),
            component_id: 7,
            ..Default::default()
        }
    }

    fn state() -> MonitorState {
        let mut state = MonitorState::new(3, 0);
        state.status = ComponentStatus::MajorOutage;
        state.up_count = 1;
        state.down_count = 2;
        state
    }

    #[test]
    fn args_are_positional() {
        let args = hook_args(&config(), &state(), HookKind::OnFailure, "timed out");
        assert_eq!(
            args,
            vec![
                "web",
                "7",
                "https://example.com",
                "on_failure",
                "timed out",
                "4",
                "1",
                "2"
            ]
        );
    }

    #[test]
    fn unconfigured_hook_is_skipped() {
        let mut config = config();
        config.on_success = Some("  ".to_string());
        assert!(dispatch(&config, &state(), HookKind::OnFailure, "").is_none());
        assert!(dispatch(&config, &state(), HookKind::OnSuccess, "").is_none());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn hook_receives_arguments() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("args.txt");
        let script = dir.path().join("hook.sh");
        std::fs::write(
            &script,
            format!("#!/bin/sh\necho \"$@\" > {}\n", out.display()),
        )
        .unwrap();
        std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();

        let mut config = config();
        config.on_failure = Some(script.display().to_string());

        let handle = dispatch(&config, &state(), HookKind::OnFailure, "boom").unwrap();
        handle.await.unwrap();

        let written = std::fs::read_to_string(&out).unwrap();
        assert_eq!(
            written.trim(),
            "web 7 https://example.com on_failure boom 4 1 2"
        );
    }

    #[tokio::test]
    async fn launch_failure_is_contained() {
        let mut config = config();
        config.on_failure = Some("/nonexistent/cachet-hook".to_string());

        let handle = dispatch(&config, &state(), HookKind::OnFailure, "").unwrap();
        assert!(handle.await.is_ok());
    }
}
