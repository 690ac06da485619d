// ── Network daemon capability ──
//
// The daemon owns the radio: activation, scanning, and profile
// (connection) management. Requests are submit-only -- the call returns
// once the daemon has accepted the request, and the outcome arrives
// later on the event stream. Every event carries a `requested` flag set
// by the daemon: `true` when the transition answers a request from this
// client, `false` for transitions initiated elsewhere (settings UI,
// another client, the radio itself).

use std::net::IpAddr;

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::error::Error;

/// Identity of the profile a request targets.
///
/// The ESSID alone is ambiguous in a mesh (several BSSIDs broadcast the
/// same network name); the BSSID pins the request to one access point
/// when the caller has it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileTarget {
    pub essid: String,
    pub bssid: Option<String>,
}

impl ProfileTarget {
    pub fn new(essid: impl Into<String>, bssid: Option<String>) -> Self {
        Self {
            essid: essid.into(),
            bssid,
        }
    }
}

/// WPS pairing mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WpsMode {
    /// Push-button configuration.
    Pbc,
    /// 8-digit PIN entry. The PIN travels separately.
    Pin,
}

/// Link state as the daemon reports it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LinkState {
    Disconnected,
    Connecting,
    Connected,
    Disconnecting,
}

/// Failure code attached to a completion event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[non_exhaustive]
pub enum DaemonFault {
    /// The request was abandoned (power-off mid-operation, shutdown).
    OperationAborted,
    /// Wrong passphrase or WPS PIN.
    InvalidKey,
    /// Association/authentication with the AP failed.
    ConnectFailed,
    /// Associated, but address configuration failed.
    DhcpFailed,
    /// Daemon-internal failure with no finer classification.
    Unknown,
}

/// Per-family address summary for a profile, as the daemon knows it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IpSummary {
    /// `"dhcp"`, `"static"`, `"auto"`, or `"fixed"`.
    pub method: String,
    pub address: Option<IpAddr>,
    pub netmask: Option<IpAddr>,
    pub gateway: Option<IpAddr>,
    pub dns: [Option<IpAddr>; 2],
}

/// A scan/connection record as delivered by the daemon.
///
/// Wire-shaped: plain data, no behavior. `airlink-core` converts this
/// into its domain `AccessPoint` type on ingestion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApInfo {
    pub essid: String,
    pub bssid: String,

    /// Signal strength in dBm (negative; closer to zero is stronger).
    pub rssi_dbm: i32,
    pub frequency_mhz: u32,
    pub max_rate_mbit: u32,

    /// A profile the daemon has stored credentials for.
    pub favorite: bool,

    /// `"none"`, `"wep"`, `"psk"`, `"psk2"`, or `"eap"`.
    pub security: String,
    /// `"none"`, `"wep"`, `"tkip"`, `"aes"`, or `"mixed"`.
    pub encryption: String,
    pub wps_supported: bool,

    /// IPv6 summary is absent on platforms without IPv6 support.
    pub ipv4: Option<IpSummary>,
    pub ipv6: Option<IpSummary>,
}

/// Asynchronous notification from the daemon.
#[derive(Debug, Clone)]
pub enum DaemonEvent {
    /// Radio power completed a transition (or was toggled externally).
    PowerChanged {
        powered: bool,
        fault: Option<DaemonFault>,
        requested: bool,
    },

    /// The link moved to a new state. `ap` is present whenever the
    /// state concerns a concrete profile. Boxed to keep the event
    /// small; most events are not link events.
    LinkChanged {
        state: LinkState,
        ap: Option<Box<ApInfo>>,
        fault: Option<DaemonFault>,
        requested: bool,
    },

    /// A scan finished; `aps` is the complete result set, in the order
    /// the daemon reported them.
    ScanFinished {
        aps: Vec<ApInfo>,
        fault: Option<DaemonFault>,
        requested: bool,
    },
}

/// The network daemon capability.
///
/// Implementations submit requests to the platform's connection manager
/// and deliver completions on the broadcast stream returned by
/// [`attach`](WifiDaemon::attach). All request methods are submit-only:
/// a returned `Ok(())` means accepted, not done.
#[trait_variant::make(WifiDaemon: Send)]
pub trait LocalWifiDaemon {
    /// Open the event stream. Called once per session.
    async fn attach(&self) -> Result<broadcast::Receiver<DaemonEvent>, Error>;

    /// Request radio activation. Completion: [`DaemonEvent::PowerChanged`].
    async fn power_on(&self) -> Result<(), Error>;

    /// Request radio deactivation. Completion: [`DaemonEvent::PowerChanged`].
    async fn power_off(&self) -> Result<(), Error>;

    /// Request a scan. Completion: [`DaemonEvent::ScanFinished`].
    async fn request_scan(&self) -> Result<(), Error>;

    /// Open (connect) a profile. Completion: [`DaemonEvent::LinkChanged`].
    async fn open_profile(&self, target: &ProfileTarget) -> Result<(), Error>;

    /// Close (disconnect) a profile. Completion: [`DaemonEvent::LinkChanged`].
    async fn close_profile(&self, target: &ProfileTarget) -> Result<(), Error>;

    /// Open a profile via WPS negotiation. `pin` must be present in
    /// [`WpsMode::Pin`] mode; the facade validates this before calling.
    async fn connect_wps(
        &self,
        target: &ProfileTarget,
        mode: WpsMode,
        pin: Option<&str>,
    ) -> Result<(), Error>;

    /// Drop stored credentials and the favorite flag for a profile.
    async fn forget_profile(&self, target: &ProfileTarget) -> Result<(), Error>;

    /// Name of the wireless network interface (e.g. `wlan0`).
    async fn interface_name(&self) -> Result<String, Error>;
}
