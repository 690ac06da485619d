// ── Access point domain type ──
//
// The full client-side picture of one candidate or active network:
// identity, radio attributes, per-family IP configuration, security
// descriptor, and the optional enterprise (EAP) descriptor. Records are
// either owned by the registry (scan results, the connected-AP slot) or
// by the caller (created/cloned); the type itself carries no ownership
// information -- that lives in `crate::registry`.

use std::net::IpAddr;
use std::path::PathBuf;

use secrecy::SecretString;
use serde::{Deserialize, Serialize};

use super::ident::{Bssid, Essid};
use super::state::{AddressFamily, ConnectionState, RssiLevel};
use crate::error::WifiError;

// ── IP configuration ────────────────────────────────────────────────

/// How addresses for one family are assigned.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum IpConfigType {
    /// Not configured.
    #[default]
    None,
    /// Manual addressing.
    Static,
    /// DHCP.
    Dynamic,
    /// Auto-IP pool (169.254/16), upgraded to DHCP when available.
    Auto,
    /// Platform-assigned, not modifiable.
    Fixed,
}

/// Proxy resolution strategy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProxyType {
    #[default]
    Direct,
    Auto,
    Manual,
}

/// Per-address-family IP settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IpConfig {
    pub config_type: IpConfigType,
    pub address: Option<IpAddr>,
    pub netmask: Option<IpAddr>,
    pub gateway: Option<IpAddr>,
    /// Primary and secondary DNS. Addressed 1-based through
    /// [`AccessPoint::dns`] / [`AccessPoint::set_dns`].
    pub dns: [Option<IpAddr>; 2],
    pub proxy_type: ProxyType,
    pub proxy_address: Option<String>,
}

// ── Security ────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SecurityType {
    #[default]
    None,
    Wep,
    WpaPsk,
    Wpa2Psk,
    Eap,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum EncryptionType {
    #[default]
    None,
    Wep,
    Tkip,
    Aes,
    TkipAesMixed,
}

/// Security descriptor for an access point.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Security {
    pub security_type: SecurityType,
    pub encryption: EncryptionType,
    /// True when the network needs a key the daemon does not already
    /// hold. Cleared by [`AccessPoint::set_passphrase`].
    pub passphrase_required: bool,
    pub wps_supported: bool,
    /// Key supplied by the caller for the next connect. Never
    /// serialized, never logged.
    #[serde(skip)]
    pub passphrase: Option<SecretString>,
}

// ── EAP ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum EapType {
    #[default]
    Peap,
    Tls,
    Ttls,
    Sim,
    Aka,
}

/// Phase-2 (inner) authentication for tunneled EAP methods.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum EapAuthType {
    #[default]
    None,
    Pap,
    Mschap,
    Mschapv2,
    Gtc,
    Md5,
}

/// Enterprise authentication descriptor.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EapConfig {
    pub eap_type: EapType,
    pub auth_type: EapAuthType,
    pub identity: Option<String>,
    #[serde(skip)]
    pub password: Option<SecretString>,
    pub ca_cert_file: Option<PathBuf>,
    pub client_cert_file: Option<PathBuf>,
    pub private_key_file: Option<PathBuf>,
    #[serde(skip)]
    pub private_key_password: Option<SecretString>,
}

// ── AccessPoint ─────────────────────────────────────────────────────

/// One candidate or active Wi-Fi network.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessPoint {
    pub essid: Essid,
    /// Absent on records built from a bare ESSID (hidden network
    /// connect) until the daemon reports the concrete AP.
    pub bssid: Option<Bssid>,

    /// Signal strength in dBm (negative; closer to zero is stronger).
    pub rssi_dbm: i32,
    pub frequency_mhz: u32,
    pub max_speed_mbit: u32,

    /// The daemon holds stored credentials for this network.
    pub favorite: bool,

    pub state: ConnectionState,

    pub ipv4: IpConfig,
    /// `None` means the platform does not support IPv6 on this link;
    /// family-specific accessors answer `AddressFamilyNotSupported`.
    pub ipv6: Option<IpConfig>,

    pub security: Security,
    pub eap: Option<EapConfig>,
}

impl AccessPoint {
    /// A blank record for `essid` with every attribute unset, the way
    /// explicit construction (as opposed to scan ingestion) starts out.
    pub fn new(essid: Essid) -> Self {
        Self {
            essid,
            bssid: None,
            rssi_dbm: 0,
            frequency_mhz: 0,
            max_speed_mbit: 0,
            favorite: false,
            state: ConnectionState::Disconnected,
            ipv4: IpConfig::default(),
            ipv6: None,
            security: Security::default(),
            eap: None,
        }
    }

    /// Bucketed signal level derived from the dBm reading.
    pub fn rssi_level(&self) -> RssiLevel {
        RssiLevel::from_dbm(self.rssi_dbm)
    }

    /// Identity comparison: ESSID + BSSID pair. A record without a
    /// BSSID matches on ESSID alone (hidden-network connect records).
    pub fn same_identity(&self, other: &AccessPoint) -> bool {
        if self.essid != other.essid {
            return false;
        }
        match (&self.bssid, &other.bssid) {
            (Some(a), Some(b)) => a == b,
            _ => true,
        }
    }

    // ── Per-family accessors ────────────────────────────────────────

    pub fn ip_config(&self, family: AddressFamily) -> Result<&IpConfig, WifiError> {
        match family {
            AddressFamily::Ipv4 => Ok(&self.ipv4),
            AddressFamily::Ipv6 => self
                .ipv6
                .as_ref()
                .ok_or(WifiError::AddressFamilyNotSupported { family }),
        }
    }

    pub fn ip_config_mut(&mut self, family: AddressFamily) -> Result<&mut IpConfig, WifiError> {
        match family {
            AddressFamily::Ipv4 => Ok(&mut self.ipv4),
            AddressFamily::Ipv6 => self
                .ipv6
                .as_mut()
                .ok_or(WifiError::AddressFamilyNotSupported { family }),
        }
    }

    /// DNS server in slot `order` (1 or 2) for `family`.
    pub fn dns(&self, family: AddressFamily, order: usize) -> Result<Option<IpAddr>, WifiError> {
        let config = self.ip_config(family)?;
        match order {
            1 | 2 => Ok(config.dns[order - 1]),
            _ => Err(WifiError::invalid_parameter(format!(
                "DNS slot must be 1 or 2, got {order}"
            ))),
        }
    }

    /// Set DNS server in slot `order` (1 or 2) for `family`.
    pub fn set_dns(
        &mut self,
        family: AddressFamily,
        order: usize,
        address: Option<IpAddr>,
    ) -> Result<(), WifiError> {
        let config = self.ip_config_mut(family)?;
        match order {
            1 | 2 => {
                config.dns[order - 1] = address;
                Ok(())
            }
            _ => Err(WifiError::invalid_parameter(format!(
                "DNS slot must be 1 or 2, got {order}"
            ))),
        }
    }

    /// Store the key for the next connect and drop the requirement flag.
    pub fn set_passphrase(&mut self, passphrase: SecretString) {
        self.security.passphrase = Some(passphrase);
        self.security.passphrase_required = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ap(essid: &str, bssid: &str) -> AccessPoint {
        let mut ap = AccessPoint::new(Essid::new(essid));
        ap.bssid = Some(Bssid::new(bssid));
        ap
    }

    #[test]
    fn new_record_has_unset_fields() {
        let ap = AccessPoint::new(Essid::new("corp-main"));
        assert_eq!(ap.bssid, None);
        assert_eq!(ap.state, ConnectionState::Disconnected);
        assert_eq!(ap.security.security_type, SecurityType::None);
        assert!(ap.ipv6.is_none());
        assert!(ap.eap.is_none());
    }

    #[test]
    fn identity_is_essid_plus_bssid() {
        let a = ap("corp-main", "3c:22:fb:10:aa:01");
        let b = ap("corp-main", "3c:22:fb:10:aa:01");
        let c = ap("corp-main", "3c:22:fb:10:aa:02");
        let d = ap("corp-guest", "3c:22:fb:10:aa:01");

        assert!(a.same_identity(&b));
        assert!(!a.same_identity(&c));
        assert!(!a.same_identity(&d));
    }

    #[test]
    fn bssid_less_record_matches_on_essid() {
        let hidden = AccessPoint::new(Essid::new("corp-main"));
        let concrete = ap("corp-main", "3c:22:fb:10:aa:01");
        assert!(hidden.same_identity(&concrete));
    }

    #[test]
    fn ipv6_accessor_reports_unsupported_family() {
        let mut record = ap("lab-2g", "90:4d:4a:77:03:1c");
        assert!(matches!(
            record.ip_config(AddressFamily::Ipv6),
            Err(WifiError::AddressFamilyNotSupported { .. })
        ));

        record.ipv6 = Some(IpConfig::default());
        assert!(record.ip_config(AddressFamily::Ipv6).is_ok());
    }

    #[test]
    fn dns_slots_are_one_based() {
        let mut record = ap("lab-2g", "90:4d:4a:77:03:1c");
        let addr: IpAddr = "10.0.0.53".parse().expect("addr");

        record
            .set_dns(AddressFamily::Ipv4, 1, Some(addr))
            .expect("slot 1");
        assert_eq!(record.dns(AddressFamily::Ipv4, 1).expect("slot 1"), Some(addr));
        assert_eq!(record.dns(AddressFamily::Ipv4, 2).expect("slot 2"), None);

        assert!(matches!(
            record.set_dns(AddressFamily::Ipv4, 0, None),
            Err(WifiError::InvalidParameter { .. })
        ));
        assert!(matches!(
            record.dns(AddressFamily::Ipv4, 3),
            Err(WifiError::InvalidParameter { .. })
        ));
    }

    #[test]
    fn set_passphrase_clears_requirement() {
        let mut record = ap("corp-main", "3c:22:fb:10:aa:01");
        record.security.passphrase_required = true;

        record.set_passphrase(SecretString::from("hunter2".to_owned()));
        assert!(!record.security.passphrase_required);
        assert!(record.security.passphrase.is_some());
    }
}
