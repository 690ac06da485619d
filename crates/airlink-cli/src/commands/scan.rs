//! `airlink scan` -- trigger a scan and list the results.

use std::ops::ControlFlow;

use serde::Serialize;
use tabled::Tabled;

use airlink_core::{AccessPoint, SecurityType};

use crate::cli::{GlobalOpts, ScanArgs};
use crate::error::CliError;
use crate::output;

use super::Client;

#[derive(Serialize)]
struct ApListing {
    essid: String,
    bssid: Option<String>,
    rssi_dbm: i32,
    level: u8,
    frequency_mhz: u32,
    max_speed_mbit: u32,
    security: &'static str,
    favorite: bool,
    state: String,
}

#[derive(Tabled)]
struct ApRow {
    #[tabled(rename = "ESSID")]
    essid: String,
    #[tabled(rename = "BSSID")]
    bssid: String,
    #[tabled(rename = "Signal")]
    signal: String,
    #[tabled(rename = "Freq")]
    freq: String,
    #[tabled(rename = "Security")]
    security: &'static str,
    #[tabled(rename = "State")]
    state: String,
}

fn listing_from(ap: &AccessPoint) -> ApListing {
    ApListing {
        essid: ap.essid.to_string(),
        bssid: ap.bssid.as_ref().map(ToString::to_string),
        rssi_dbm: ap.rssi_dbm,
        level: ap.rssi_level().value(),
        frequency_mhz: ap.frequency_mhz,
        max_speed_mbit: ap.max_speed_mbit,
        security: security_label(ap.security.security_type),
        favorite: ap.favorite,
        state: ap.state.to_string(),
    }
}

fn row_from(listing: &ApListing) -> ApRow {
    ApRow {
        essid: if listing.favorite {
            format!("{} *", listing.essid)
        } else {
            listing.essid.clone()
        },
        bssid: listing.bssid.clone().unwrap_or_default(),
        signal: format!(
            "{} {} dBm",
            output::signal_bars(listing.level),
            listing.rssi_dbm
        ),
        freq: format!("{} MHz", listing.frequency_mhz),
        security: listing.security,
        state: listing.state.clone(),
    }
}

fn security_label(security: SecurityType) -> &'static str {
    match security {
        SecurityType::None => "open",
        SecurityType::Wep => "WEP",
        SecurityType::WpaPsk => "WPA-PSK",
        SecurityType::Wpa2Psk => "WPA2-PSK",
        SecurityType::Eap => "802.1x",
    }
}

pub async fn handle(client: &Client, args: ScanArgs, global: &GlobalOpts) -> Result<(), CliError> {
    if !args.no_activate {
        super::ensure_activated(client).await?;
    }
    super::scan_once(client).await?;

    let mut listings = Vec::new();
    client
        .foreach_found_ap(|_, ap| {
            listings.push(listing_from(ap));
            ControlFlow::Continue(())
        })
        .await?;

    let out = output::render_list(global.output, &listings, row_from, |l| l.essid.clone());
    output::print_output(&out, global.quiet);
    Ok(())
}
