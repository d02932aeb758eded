use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;

use chaddi_console::Settings;
use clap::{Args, Parser, Subcommand};
use eyre::Result;
use tracing_subscriber::EnvFilter;

mod cmd {
    pub(crate) mod bakchod;
    pub(crate) mod console;
    pub(crate) mod report;
}

use cmd::bakchod::{SendArgs, SetMetadataArgs, SetRokdaArgs};
use cmd::console::ConsoleArgs;
use cmd::report::{DashboardArgs, MessagesArgs};

#[derive(Debug, Parser)]
#[command(
    name = "chaddi-console",
    version,
    about = "Admin console for the chaddi bot server"
)]
struct Cli {
    #[command(flatten)]
    connection: ConnectionArgs,

    #[command(flatten)]
    console: ConsoleArgs,

    /// Append tracing output to this file
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Interactive dashboard, group browser and live stream (default)
    Console(ConsoleArgs),
    /// Print the dashboard metrics once
    Dashboard(DashboardArgs),
    /// Print one page of a group's message history
    Messages(MessagesArgs),
    /// Set a bakchod's rokda balance
    SetRokda(SetRokdaArgs),
    /// Replace a bakchod's metadata
    SetMetadata(SetMetadataArgs),
    /// Send a message as the bot
    Send(SendArgs),
}

/// Server connection flags; unset flags fall back to `CHADDI_CONSOLE_*` variables.
#[derive(Debug, Clone, Args)]
pub(crate) struct ConnectionArgs {
    /// Base URL of the chaddi server
    #[arg(long, global = true)]
    base_url: Option<String>,

    /// Socket.IO mount point, e.g. /socket.io or /ws/socket.io
    #[arg(long, global = true)]
    socket_path: Option<String>,

    /// Maximum items kept in the live feed and an open conversation
    #[arg(long, global = true)]
    feed_limit: Option<usize>,

    /// Timeout for every REST request, in milliseconds
    #[arg(long, global = true)]
    timeout_ms: Option<u64>,
}

impl ConnectionArgs {
    fn settings(&self) -> Settings {
        let mut settings = Settings::from_env();
        if let Some(base_url) = &self.base_url {
            settings.base_url = base_url.clone();
        }
        if let Some(socket_path) = &self.socket_path {
            settings.socket_path = socket_path.clone();
        }
        if let Some(feed_limit) = self.feed_limit {
            settings.feed_limit = feed_limit.max(1);
        }
        if let Some(timeout_ms) = self.timeout_ms {
            settings.timeout = Duration::from_millis(timeout_ms);
        }
        settings
    }
}

/// The console owns the terminal, so it only logs when `--log-file` is given.
/// One-shot commands log warnings to stderr by default.
fn init_logging(log_file: Option<&Path>, interactive: bool) -> Result<()> {
    match log_file {
        Some(path) => {
            let file = File::options().create(true).append(true).open(path)?;
            let filter =
                EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(Mutex::new(file))
                .with_ansi(false)
                .try_init()
                .map_err(|e| eyre::eyre!("Logging error: {}", e))
        }
        None if interactive => Ok(()),
        None => {
            let filter =
                EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .try_init()
                .map_err(|e| eyre::eyre!("Logging error: {}", e))
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let interactive = matches!(cli.command, None | Some(Command::Console(_)));
    init_logging(cli.log_file.as_deref(), interactive)?;
    let settings = cli.connection.settings();

    match cli.command {
        None => cli.console.run(&settings),
        Some(Command::Console(args)) => args.run(&settings),
        Some(Command::Dashboard(args)) => args.run(&settings),
        Some(Command::Messages(args)) => args.run(&settings),
        Some(Command::SetRokda(args)) => args.run(&settings),
        Some(Command::SetMetadata(args)) => args.run(&settings),
        Some(Command::Send(args)) => args.run(&settings),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_flags_before_subcommand() {
        let cli = Cli::try_parse_from([
            "chaddi-console",
            "--base-url",
            "http://10.0.0.2:5000",
            "--timeout-ms",
            "250",
            "--feed-limit",
            "20",
            "--socket-path",
            "/ws/socket.io",
            "dashboard",
        ])
        .expect("global flags before the subcommand should parse");

        assert!(matches!(cli.command, Some(Command::Dashboard(_))));
        let settings = cli.connection.settings();
        assert_eq!(settings.base_url, "http://10.0.0.2:5000");
        assert_eq!(settings.timeout, Duration::from_millis(250));
        assert_eq!(settings.feed_limit, 20);
        assert_eq!(settings.socket_path, "/ws/socket.io");
    }

    #[test]
    fn test_connection_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "chaddi-console",
            "--log-file",
            "/tmp/chaddi.log",
            "set-rokda",
            "--id",
            "1",
            "--rokda",
            "5",
            "--base-url",
            "http://10.0.0.3:5000",
        ])
        .expect("global flags after the subcommand should parse");

        assert!(matches!(cli.command, Some(Command::SetRokda(_))));
        assert_eq!(cli.log_file, Some(PathBuf::from("/tmp/chaddi.log")));
        assert_eq!(cli.connection.base_url.as_deref(), Some("http://10.0.0.3:5000"));
    }

    #[test]
    fn test_group_id_without_subcommand_opens_console() {
        let cli = Cli::try_parse_from(["chaddi-console", "--group-id", "-1001234567890"])
            .expect("--group-id should be accepted without a subcommand");

        assert!(cli.command.is_none());
        assert_eq!(cli.console.group_id.as_deref(), Some("-1001234567890"));
    }
}
