// ── Wire-record conversion ──
//
// airlink-api delivers wire-shaped records; everything downstream works
// on the domain model. All ingestion goes through here so the parsing
// of the daemon's string-coded attributes lives in exactly one place.

use airlink_api::{ApInfo, IpSummary, LinkState, ProfileTarget};

use crate::model::{
    AccessPoint, Bssid, ConnectionState, EncryptionType, Essid, IpConfig, IpConfigType, ProxyType,
    Security, SecurityType,
};

impl From<LinkState> for ConnectionState {
    fn from(state: LinkState) -> Self {
        match state {
            LinkState::Disconnected => Self::Disconnected,
            LinkState::Connecting => Self::Connecting,
            LinkState::Connected => Self::Connected,
            LinkState::Disconnecting => Self::Disconnecting,
        }
    }
}

impl From<&ApInfo> for AccessPoint {
    fn from(info: &ApInfo) -> Self {
        let security_type = parse_security(&info.security);

        Self {
            essid: Essid::new(&info.essid),
            bssid: Some(Bssid::new(&info.bssid)),
            rssi_dbm: info.rssi_dbm,
            frequency_mhz: info.frequency_mhz,
            max_speed_mbit: info.max_rate_mbit,
            favorite: info.favorite,
            state: ConnectionState::Disconnected,
            ipv4: info
                .ipv4
                .as_ref()
                .map_or_else(IpConfig::default, ip_config_from_summary),
            ipv6: info.ipv6.as_ref().map(ip_config_from_summary),
            security: Security {
                security_type,
                encryption: parse_encryption(&info.encryption),
                // A favorite already has its key stored daemon-side.
                passphrase_required: security_type != SecurityType::None && !info.favorite,
                wps_supported: info.wps_supported,
                passphrase: None,
            },
            eap: None,
        }
    }
}

/// The request identity the daemon expects for this record.
pub(crate) fn profile_target(ap: &AccessPoint) -> ProfileTarget {
    ProfileTarget::new(
        ap.essid.as_str(),
        ap.bssid.as_ref().map(|b| b.as_str().to_owned()),
    )
}

fn parse_security(raw: &str) -> SecurityType {
    match raw {
        "wep" => SecurityType::Wep,
        "psk" => SecurityType::WpaPsk,
        "psk2" => SecurityType::Wpa2Psk,
        "eap" => SecurityType::Eap,
        _ => SecurityType::None,
    }
}

fn parse_encryption(raw: &str) -> EncryptionType {
    match raw {
        "wep" => EncryptionType::Wep,
        "tkip" => EncryptionType::Tkip,
        "aes" => EncryptionType::Aes,
        "mixed" => EncryptionType::TkipAesMixed,
        _ => EncryptionType::None,
    }
}

fn parse_ip_method(raw: &str) -> IpConfigType {
    match raw {
        "static" => IpConfigType::Static,
        "dhcp" => IpConfigType::Dynamic,
        "auto" => IpConfigType::Auto,
        "fixed" => IpConfigType::Fixed,
        _ => IpConfigType::None,
    }
}

fn ip_config_from_summary(summary: &IpSummary) -> IpConfig {
    IpConfig {
        config_type: parse_ip_method(&summary.method),
        address: summary.address,
        netmask: summary.netmask,
        gateway: summary.gateway,
        dns: summary.dns,
        // Proxy settings are a client-side concern; the daemon does not
        // report them.
        proxy_type: ProxyType::default(),
        proxy_address: None,
    }
}
