//! Command handlers and shared plumbing.

pub mod link;
pub mod monitor;
pub mod scan;
pub mod status;

use std::time::Duration;

use airlink_api::sim::{demo_aps, SimNet};
use airlink_core::{DeviceState, WifiClient};

use crate::cli::{Cli, Command};
use crate::config;
use crate::error::CliError;

/// Every command runs against the simulator backend.
pub type Client = WifiClient<SimNet, SimNet>;

/// Ceiling on waiting for asynchronous completions.
const WAIT: Duration = Duration::from_secs(30);

pub async fn run(cli: Cli) -> Result<(), CliError> {
    let config = config::load()?;

    let sim = SimNet::new()
        .with_aps(demo_aps())
        .with_latency(config.sim_latency());
    let client = WifiClient::new(sim.clone(), sim.clone(), config.session_config());
    client.initialize().await?;

    tracing::debug!(command = ?cli.command, "dispatching command");
    let result = match cli.command {
        Command::Status => status::handle(&client, &cli.global).await,
        Command::Scan(args) => scan::handle(&client, args, &cli.global).await,
        Command::Connect(args) => link::connect(&client, args, &cli.global).await,
        Command::Disconnect => link::disconnect(&client, &cli.global).await,
        Command::Monitor(args) => monitor::handle(&client, &sim, args, &cli.global).await,
    };

    // Best-effort teardown; the command result is what matters.
    let _ = client.deinitialize().await;
    result
}

/// Activate the radio (if needed) and wait for the confirmation.
pub async fn ensure_activated(client: &Client) -> Result<(), CliError> {
    if client.device_state().await? == DeviceState::Activated {
        return Ok(());
    }
    client.activate().await?;

    let mut rx = client.watch_device_state().await?;
    let confirmed = tokio::time::timeout(WAIT, rx.wait_for(|s| *s == DeviceState::Activated)).await;
    match confirmed {
        Ok(Ok(_)) => Ok(()),
        _ => Err(CliError::Timeout {
            what: "radio activation",
        }),
    }
}

/// Run a scan and wait for its one-shot completion.
pub async fn scan_once(client: &Client) -> Result<(), CliError> {
    let (tx, rx) = tokio::sync::oneshot::channel();
    client
        .scan(move |err| {
            let _ = tx.send(err);
        })
        .await?;

    match tokio::time::timeout(WAIT, rx).await {
        Ok(Ok(None)) => Ok(()),
        Ok(Ok(Some(err))) => Err(err.into()),
        _ => Err(CliError::Timeout {
            what: "scan completion",
        }),
    }
}
