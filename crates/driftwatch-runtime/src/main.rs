//! driftwatch: backend drift watcher runtime binary.
//! Daemon mode embeds the reconciliation controller and serves its state over
//! a Unix socket; the other subcommands are thin RPC clients.

use clap::Parser;

mod cli;
mod client;
mod daemon;
mod server;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = cli::Cli::parse();
    let socket_path = args.socket_path.unwrap_or_else(cli::default_socket_path);

    match args.command {
        cli::Command::Daemon(opts) => {
            let filter = std::env::var("DRIFTWATCH_LOG")
                .or_else(|_| std::env::var("RUST_LOG"))
                .unwrap_or_else(|_| "info".to_string());
            tracing_subscriber::fmt()
                .with_env_filter(tracing_subscriber::EnvFilter::new(filter))
                .init();

            tracing::info!("driftwatch daemon starting");
            daemon::run_daemon(opts, &socket_path).await?;
        }
        cli::Command::Status => client::cmd_status(&socket_path).await?,
        cli::Command::Signal => client::cmd_signal(&socket_path).await?,
        cli::Command::Dismiss => client::cmd_dismiss(&socket_path).await?,
        cli::Command::Banner => client::cmd_banner(&socket_path).await?,
    }

    Ok(())
}
