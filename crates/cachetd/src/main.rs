//! cachetd: the status-page monitoring daemon.
//!
//! Loads a TOML configuration, starts one periodic loop per valid monitor
//! and mirrors their health onto a Cachet status page until interrupted.
//!
//! # Usage
//!
//! ```text
//! cachetd --config /etc/cachet-monitor.toml --immediate --log-format json
//! ```

mod daemon;

use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "cachetd", about = "Status-page monitoring daemon", version)]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(long, short)]
    config: PathBuf,

    /// Run one check per monitor before waiting for the first interval.
    #[arg(long)]
    immediate: bool,

    /// Log output format.
    #[arg(long, value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,cachetd=debug,cachet=debug"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    match format {
        LogFormat::Text => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_format);

    daemon::run(&cli.config, cli.immediate).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_flags() {
        let cli = Cli::parse_from(["cachetd", "--config", "/tmp/c.toml", "--log-format", "json"]);
        assert_eq!(cli.config, PathBuf::from("/tmp/c.toml"));
        assert!(!cli.immediate);
        assert_eq!(cli.log_format, LogFormat::Json);
    }

    #[test]
    fn config_is_required() {
        assert!(Cli::try_parse_from(["cachetd"]).is_err());
    }
}
