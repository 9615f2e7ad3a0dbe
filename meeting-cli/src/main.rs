mod commands;
mod render;
mod utils;

use anyhow::Result;
use clap::{Parser, Subcommand};
use meeting_core::time::MeetingTimeRange;
use tracing_subscriber::EnvFilter;

/// Environment variable holding the log filter, e.g. `MEETFB_LOG=meeting_core=debug`
const LOG_ENV: &str = "MEETFB_LOG";

#[derive(Parser)]
#[command(name = "meetfb")]
#[command(about = "Look up when meeting attendees are busy")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show busy periods for one or more attendees
    Busy {
        /// Attendee addresses (with or without mailto:)
        #[arg(required = true)]
        addresses: Vec<String>,

        /// Show busy time from this date (YYYY-MM-DD, default today)
        #[arg(long)]
        from: Option<String>,

        /// Show busy time until this date (YYYY-MM-DD)
        #[arg(long)]
        to: Option<String>,

        /// Free/busy URL for one attendee
        #[arg(long = "url", value_name = "ADDR=URL")]
        urls: Vec<String>,
    },
    /// Show the config file, creating a default one if missing
    Config,
}

#[tokio::main]
async fn main() -> Result<()> {
    init_logging();
    let cli = Cli::parse();

    match cli.command {
        Commands::Busy {
            addresses,
            from,
            to,
            urls,
        } => {
            let range = MeetingTimeRange::from_args(from.as_deref(), to.as_deref())
                .map_err(|e| anyhow::anyhow!(e))?;
            let urls = parse_url_overrides(&urls)?;
            commands::busy::run(addresses, range, urls).await
        }
        Commands::Config => commands::config::run(),
    }
}

fn init_logging() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn parse_url_overrides(args: &[String]) -> Result<Vec<(String, String)>> {
    args.iter()
        .map(|arg| match arg.split_once('=') {
            Some((address, url)) if !address.trim().is_empty() && !url.trim().is_empty() => {
                Ok((address.trim().to_string(), url.trim().to_string()))
            }
            _ => anyhow::bail!("Invalid --url '{}'. Expected ADDR=URL", arg),
        })
        .collect()
}
