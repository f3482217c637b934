// ABOUTME: CLI entry point: loads configuration, runs one backup, reports the outcome
// ABOUTME: The outcome code becomes the process exit code; startup failures exit 10

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use truenas_wake_backup::backup::{run_backup, RunOutcome};
use truenas_wake_backup::config::Config;
use truenas_wake_backup::notify;
use truenas_wake_backup::remote::NasClient;
use truenas_wake_backup::wol::WolSender;

/// Exit code when the run could not start at all (bad config, client setup).
const STARTUP_FAILURE: u8 = 10;

#[derive(Parser)]
#[command(name = "truenas-wake-backup")]
#[command(about = "Wake a TrueNAS box, run replication tasks against it, shut it back down")]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(short, long, default_value = "backup.toml")]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match run(&cli).await {
        Ok(outcome) => {
            info!(
                code = outcome.code.as_code(),
                label = outcome.code.as_label(),
                "backup run finished"
            );
            ExitCode::from(outcome.code.as_code())
        }
        Err(err) => {
            error!("{:#}", err);
            ExitCode::from(STARTUP_FAILURE)
        }
    }
}

async fn run(cli: &Cli) -> Result<RunOutcome> {
    let config = Config::load(&cli.config)?;

    let source = NasClient::new(&config.source).context("Failed to build source client")?;
    let destination =
        NasClient::new(&config.destination).context("Failed to build destination client")?;
    let wake = WolSender::new(
        config.wake.mac_address.clone(),
        config.wake.broadcast_address.clone(),
        config.wake.port,
    );

    let outcome = run_backup(
        &source,
        &destination,
        &wake,
        &config.backup.task_names,
        &config.backup.timing(),
    )
    .await;

    if let Err(err) = notify::send(config.notify.as_ref(), &outcome).await {
        warn!(error = %err, "failed to deliver outcome notification");
    }

    Ok(outcome)
}
