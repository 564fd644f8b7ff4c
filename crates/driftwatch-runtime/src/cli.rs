//! CLI definition using clap derive.

use std::time::Duration;

use clap::{Parser, Subcommand};
use driftwatch_core::DriftConfig;
use driftwatch_core::config::DEFAULT_DEBOUNCE_MS;

#[derive(Parser)]
#[command(name = "driftwatch", about = "backend drift watcher")]
pub struct Cli {
    /// UDS socket path (default: /tmp/driftwatch-$USER/driftwatch.sock)
    #[arg(long, short = 's', global = true, env = "DRIFTWATCH_SOCKET")]
    pub socket_path: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Start the daemon (baseline capture + reconnect reconciliation + UDS server)
    Daemon(DaemonOpts),
    /// Show baseline, capture phase and notification (JSON)
    Status,
    /// Report a transport reconnect to the daemon
    Signal,
    /// Dismiss the active drift notification
    Dismiss,
    /// Single-line output for a status bar
    Banner,
}

#[derive(clap::Args)]
pub struct DaemonOpts {
    /// Backend identity endpoint returning {"version", "instanceId"}
    #[arg(long, env = "DRIFTWATCH_IDENTITY_URL")]
    pub url: String,

    /// Quiet period after the last reconnect before probing, in milliseconds
    #[arg(long, default_value_t = DEFAULT_DEBOUNCE_MS)]
    pub debounce_ms: u64,

    /// Identity request timeout in milliseconds
    #[arg(long, default_value = "5000")]
    pub probe_timeout_ms: u64,
}

impl DaemonOpts {
    pub fn drift_config(&self) -> DriftConfig {
        DriftConfig {
            debounce_ms: self.debounce_ms,
            ..DriftConfig::default()
        }
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_millis(self.probe_timeout_ms)
    }
}

/// Default socket path using $USER for per-user isolation.
pub fn default_socket_path() -> String {
    if let Ok(dir) = std::env::var("XDG_RUNTIME_DIR") {
        return format!("{dir}/driftwatch/driftwatch.sock");
    }
    let user = std::env::var("USER").unwrap_or_else(|_| "unknown".to_string());
    format!("/tmp/driftwatch-{user}/driftwatch.sock")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn daemon_defaults() {
        let cli = Cli::try_parse_from([
            "driftwatch",
            "daemon",
            "--url",
            "http://localhost:3000/api/identity",
        ])
        .expect("parse");
        let Command::Daemon(opts) = cli.command else {
            panic!("expected daemon subcommand");
        };
        assert_eq!(opts.url, "http://localhost:3000/api/identity");
        assert_eq!(opts.drift_config(), DriftConfig::default());
        assert_eq!(opts.probe_timeout(), Duration::from_secs(5));
    }

    #[test]
    fn daemon_overrides_debounce() {
        let cli = Cli::try_parse_from([
            "driftwatch",
            "daemon",
            "--url",
            "http://x/identity",
            "--debounce-ms",
            "250",
        ])
        .expect("parse");
        let Command::Daemon(opts) = cli.command else {
            panic!("expected daemon subcommand");
        };
        assert_eq!(opts.drift_config().debounce_ms, 250);
    }

    #[test]
    fn socket_path_is_global() {
        let cli = Cli::try_parse_from(["driftwatch", "status", "-s", "/tmp/dw.sock"])
            .expect("parse");
        assert_eq!(cli.socket_path.as_deref(), Some("/tmp/dw.sock"));
        assert!(matches!(cli.command, Command::Status));
    }

    #[test]
    fn default_socket_path_ends_with_socket_name() {
        assert!(default_socket_path().ends_with("driftwatch.sock"));
    }
}
