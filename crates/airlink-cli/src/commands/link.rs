//! `airlink connect` / `airlink disconnect`.

use std::ops::ControlFlow;

use secrecy::SecretString;
use tokio::sync::mpsc;

use airlink_core::{ConnectionEvent, ConnectionState, WifiError, WpsMode};

use crate::cli::{ConnectArgs, GlobalOpts, WpsArg};
use crate::error::CliError;

use super::{Client, WAIT};

pub async fn connect(
    client: &Client,
    args: ConnectArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    super::ensure_activated(client).await?;
    super::scan_once(client).await?;

    // Find the target among the scan results.
    let wanted_bssid = args.bssid.as_deref().map(str::to_lowercase);
    let mut target = None;
    client
        .foreach_found_ap(|handle, ap| {
            let essid_match = ap.essid.as_str() == args.essid;
            let bssid_match = wanted_bssid.as_deref().is_none_or(|want| {
                ap.bssid.as_ref().is_some_and(|have| have.as_str() == want)
            });
            if essid_match && bssid_match {
                target = Some(handle);
                ControlFlow::Break(())
            } else {
                ControlFlow::Continue(())
            }
        })
        .await?;
    let handle = target.ok_or_else(|| CliError::ApNotFound {
        essid: args.essid.clone(),
    })?;

    if let Some(passphrase) = args.passphrase {
        client
            .update_ap(handle, |ap| {
                ap.set_passphrase(SecretString::from(passphrase));
            })
            .await?;
    }

    let mut events = subscribe_link_events(client).await?;
    match args.wps {
        None => client.connect(handle).await?,
        Some(WpsArg::Pbc) => client.connect_wps(handle, WpsMode::Pbc, None).await?,
        Some(WpsArg::Pin) => {
            client
                .connect_wps(handle, WpsMode::Pin, args.pin.as_deref())
                .await?;
        }
    }

    let settled = wait_link_settled(&mut events).await?;
    match settled.state {
        ConnectionState::Connected => {
            if !global.quiet {
                eprintln!("connected to {}", args.essid);
            }
            Ok(())
        }
        _ => Err(settled
            .error
            .unwrap_or_else(|| WifiError::OperationFailed {
                reason: "connection did not come up".into(),
            })
            .into()),
    }
}

pub async fn disconnect(client: &Client, global: &GlobalOpts) -> Result<(), CliError> {
    let handle = client.connected_ap().await?;
    let essid = client.ap(handle).await?.essid.to_string();

    let mut events = subscribe_link_events(client).await?;
    client.disconnect(handle).await?;

    let settled = wait_link_settled(&mut events).await?;
    client.destroy_ap(handle).await?;

    match settled.state {
        ConnectionState::Disconnected if settled.error.is_none() => {
            if !global.quiet {
                eprintln!("disconnected from {essid}");
            }
            Ok(())
        }
        _ => Err(settled
            .error
            .unwrap_or_else(|| WifiError::OperationFailed {
                reason: "disconnect did not complete".into(),
            })
            .into()),
    }
}

// ── Completion plumbing ─────────────────────────────────────────────

async fn subscribe_link_events(
    client: &Client,
) -> Result<mpsc::UnboundedReceiver<ConnectionEvent>, CliError> {
    let (tx, rx) = mpsc::unbounded_channel();
    client
        .set_connection_state_cb(move |event| {
            let _ = tx.send(event);
        })
        .await?;
    Ok(rx)
}

/// Wait for the first non-transitional connection event.
async fn wait_link_settled(
    events: &mut mpsc::UnboundedReceiver<ConnectionEvent>,
) -> Result<ConnectionEvent, CliError> {
    let settled = tokio::time::timeout(WAIT, async {
        while let Some(event) = events.recv().await {
            if !event.state.is_transitional() {
                return Some(event);
            }
        }
        None
    })
    .await;

    match settled {
        Ok(Some(event)) => Ok(event),
        _ => Err(CliError::Timeout {
            what: "link state change",
        }),
    }
}
