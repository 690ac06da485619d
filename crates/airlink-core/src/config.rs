// ── Runtime session configuration ──
//
// Built by the consumer and handed to `WifiClient` -- core never reads
// config files. Property key names default to the platform's well-known
// keys but can be overridden for test fixtures or vendor forks.

use std::time::Duration;

use airlink_api::keys;

/// Tuning for a single client session.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Ceiling on request *submission* (not completion -- completions
    /// are asynchronous and unbounded by design).
    pub request_timeout: Duration,

    /// Property key for the radio power state.
    pub power_state_key: String,

    /// Property key for the active link's BSSID.
    pub bssid_key: String,

    /// Property key for the bucketed signal level.
    pub rssi_level_key: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(10),
            power_state_key: keys::POWER_STATE.into(),
            bssid_key: keys::BSSID.into(),
            rssi_level_key: keys::RSSI_LEVEL.into(),
        }
    }
}
