//! `sfs` - command-line client for Students-for-Students.

use anyhow::Result;
use clap::Parser;
use sfs_runtime::{run_command, Cli, HostedContainer, OfflineContainer, RunOutput};
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = cli.app_config();

    sfs_telemetry::init_telemetry(&config.telemetry)?;
    config.validate()?;
    info!(offline = config.offline, user = ?config.user, "sfs starting");

    let RunOutput { result, notices } = if config.offline {
        let container = OfflineContainer::offline(&config);
        run_command(&container, &config, cli.command).await
    } else {
        let container = HostedContainer::connect(&config)?;
        run_command(&container, &config, cli.command).await
    };

    for notice in &notices {
        eprintln!("notice [{:?}]: {}", notice.kind, notice.message);
    }
    if cli.print_metrics {
        eprintln!("{}", sfs_telemetry::encode_metrics()?);
    }

    let value = result?;
    println!("{}", serde_json::to_string_pretty(&value)?);
    Ok(())
}
