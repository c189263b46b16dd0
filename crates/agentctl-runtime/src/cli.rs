//! CLI definition using clap derive.

use clap::{Parser, Subcommand};

use agentctl_client::config::DEFAULT_BASE_URL;
use agentctl_core::reconcile::DEFAULT_LOG_CAPACITY;

#[derive(Parser)]
#[command(name = "agentctl", about = "control & telemetry console for the automation agent")]
pub struct Cli {
    /// Backend base URL
    #[arg(long, short = 'u', global = true, env = "AGENTCTL_URL", default_value = DEFAULT_BASE_URL)]
    pub url: String,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Live console: derived state plus streaming log (default)
    Watch(WatchOpts),
    /// One-shot status snapshot
    Status(StatusOpts),
    /// Start an automation cycle
    Start,
    /// Stop the running cycle
    Stop,
    /// Trigger the backend authentication flow
    Auth,
}

#[derive(clap::Args)]
pub struct WatchOpts {
    /// Log buffer capacity (0 = unbounded)
    #[arg(long, default_value_t = DEFAULT_LOG_CAPACITY)]
    pub log_capacity: usize,

    /// Skip the automatic snapshot re-fetch after a reconnect
    #[arg(long)]
    pub no_refetch: bool,
}

impl Default for WatchOpts {
    fn default() -> Self {
        Self {
            log_capacity: DEFAULT_LOG_CAPACITY,
            no_refetch: false,
        }
    }
}

#[derive(clap::Args)]
pub struct StatusOpts {
    /// Print the raw snapshot as JSON
    #[arg(long)]
    pub json: bool,
}

// ─── Tests ────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_watch_opts_use_capped_buffer() {
        let opts = WatchOpts::default();
        assert_eq!(opts.log_capacity, DEFAULT_LOG_CAPACITY);
        assert!(!opts.no_refetch);
    }

    #[test]
    fn parses_watch_with_overrides() {
        let cli = Cli::parse_from([
            "agentctl",
            "--url",
            "http://10.0.0.5:8000",
            "watch",
            "--log-capacity",
            "50",
            "--no-refetch",
        ]);
        assert_eq!(cli.url, "http://10.0.0.5:8000");
        match cli.command {
            Some(Command::Watch(opts)) => {
                assert_eq!(opts.log_capacity, 50);
                assert!(opts.no_refetch);
            }
            _ => panic!("expected watch subcommand"),
        }
    }

    #[test]
    fn no_subcommand_is_allowed() {
        let cli = Cli::parse_from(["agentctl"]);
        assert!(cli.command.is_none());
        assert_eq!(cli.url, DEFAULT_BASE_URL);
    }
}
