//! `airlink status` -- radio and link summary.

use owo_colors::OwoColorize;
use serde::Serialize;

use airlink_core::{ConnectionState, DeviceState};

use crate::cli::GlobalOpts;
use crate::error::CliError;
use crate::output;

use super::Client;

#[derive(Serialize)]
struct Status {
    device: &'static str,
    link: String,
    essid: Option<String>,
    bssid: Option<String>,
    rssi_dbm: Option<i32>,
    frequency_mhz: Option<u32>,
    interface: String,
}

pub async fn handle(client: &Client, global: &GlobalOpts) -> Result<(), CliError> {
    let device = client.device_state().await?;
    let link = client.connection_state().await?;
    let interface = client.interface_name().await?;

    // Snapshot of the connected AP, released right after reading.
    let connected = match client.connected_ap().await {
        Ok(handle) => {
            let ap = client.ap(handle).await?;
            client.destroy_ap(handle).await?;
            Some(ap)
        }
        Err(_) => None,
    };

    let status = Status {
        device: match device {
            DeviceState::Activated => "activated",
            DeviceState::Deactivated => "deactivated",
        },
        link: link.to_string(),
        essid: connected.as_ref().map(|ap| ap.essid.to_string()),
        bssid: connected
            .as_ref()
            .and_then(|ap| ap.bssid.as_ref())
            .map(ToString::to_string),
        rssi_dbm: connected.as_ref().map(|ap| ap.rssi_dbm),
        frequency_mhz: connected.as_ref().map(|ap| ap.frequency_mhz),
        interface,
    };

    let out = output::render_single(global.output, &status, |s| {
        let mut lines = vec![
            format!("device:    {}", s.device),
            format!(
                "link:      {}",
                if link == ConnectionState::Connected {
                    s.link.green().to_string()
                } else {
                    s.link.clone()
                }
            ),
            format!("interface: {}", s.interface),
        ];
        if let Some(essid) = &s.essid {
            lines.push(format!("network:   {essid}"));
        }
        if let Some(bssid) = &s.bssid {
            lines.push(format!("bssid:     {bssid}"));
        }
        if let (Some(rssi), Some(freq)) = (s.rssi_dbm, s.frequency_mhz) {
            lines.push(format!("signal:    {rssi} dBm @ {freq} MHz"));
        }
        lines.join("\n")
    });
    output::print_output(&out, global.quiet);
    Ok(())
}
