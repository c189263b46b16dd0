//! agentctl: control & telemetry console binary.
//! Single-process binary wiring the client library to a line-oriented CLI.

use clap::Parser;

mod cli;
mod cmd_ctl;
mod cmd_status;
mod cmd_watch;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = cli::Cli::parse();

    let command = args
        .command
        .unwrap_or_else(|| cli::Command::Watch(cli::WatchOpts::default()));

    match command {
        cli::Command::Watch(opts) => {
            let filter = std::env::var("AGENTCTL_LOG")
                .or_else(|_| std::env::var("RUST_LOG"))
                .unwrap_or_else(|_| "info".to_string());
            tracing_subscriber::fmt()
                .with_env_filter(tracing_subscriber::EnvFilter::new(filter))
                .with_writer(std::io::stderr)
                .init();

            tracing::info!("agentctl console starting");
            cmd_watch::cmd_watch(&args.url, opts).await?;
        }
        cli::Command::Status(opts) => {
            cmd_status::cmd_status(&args.url, opts.json).await?;
        }
        cli::Command::Start => {
            cmd_ctl::cmd_start(&args.url).await?;
        }
        cli::Command::Stop => {
            cmd_ctl::cmd_stop(&args.url).await?;
        }
        cli::Command::Auth => {
            cmd_ctl::cmd_auth(&args.url).await?;
        }
    }

    Ok(())
}
