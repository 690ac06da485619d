//! `airlink monitor` -- stream state-change notifications to stdout.
//!
//! Registers all four callback slots and prints each notification as a
//! line. With `--demo` a scripted sequence of external events is played
//! against the simulator so there is something to watch.

use std::time::Duration;

use owo_colors::OwoColorize;

use airlink_api::SimNet;

use crate::cli::{GlobalOpts, MonitorArgs};
use crate::error::CliError;

use super::Client;

pub async fn handle(
    client: &Client,
    sim: &SimNet,
    args: MonitorArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    if !global.quiet {
        eprintln!(
            "watching for {}s (ctrl-c to stop early)",
            args.duration_secs
        );
    }

    client
        .set_device_state_cb(|ev| {
            println!(
                "{} {:?} (requested: {})",
                "device".cyan(),
                ev.state,
                ev.is_requested
            );
        })
        .await?;

    client
        .set_connection_state_cb(|ev| {
            let essid = ev
                .ap
                .as_ref()
                .map(|ap| ap.essid.to_string())
                .unwrap_or_default();
            match &ev.error {
                Some(error) => println!(
                    "{} {} {} ({error})",
                    "link".cyan(),
                    ev.state,
                    essid.red()
                ),
                None => println!("{} {} {}", "link".cyan(), ev.state, essid),
            }
        })
        .await?;

    client
        .set_scan_cb(|ev| {
            println!(
                "{} finished (background: {})",
                "scan".cyan(),
                !ev.is_requested
            );
        })
        .await?;

    client.set_rssi_level_cb(|level| {
        println!("{} level {level}", "rssi".cyan());
    })?;

    if args.demo {
        tokio::spawn(demo_script(sim.clone()));
    }

    tokio::time::sleep(Duration::from_secs(args.duration_secs)).await;
    Ok(())
}

/// External-world activity for the monitor to observe.
async fn demo_script(sim: SimNet) {
    let step = Duration::from_millis(600);

    tokio::time::sleep(step).await;
    sim.toggle_power_externally(true);

    tokio::time::sleep(step).await;
    sim.background_scan();

    for level in [3, 4, 2, 1] {
        tokio::time::sleep(step).await;
        sim.set_signal_level(level);
    }

    tokio::time::sleep(step).await;
    sim.toggle_power_externally(false);
}
