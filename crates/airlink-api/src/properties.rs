// ── Platform property store capability ──
//
// A handful of Wi-Fi facts are published by the platform as named
// properties rather than delivered over the daemon stream: current
// power state, the BSSID of the active link, and the bucketed signal
// level. Consumers poll with the getters or subscribe with `watch_int`;
// dropping the returned receiver ends the subscription.

use tokio::sync::watch;

use crate::error::Error;

/// Well-known property keys.
pub mod keys {
    /// Radio power state: 0 = off, anything else = on.
    pub const POWER_STATE: &str = "net.wifi.power";

    /// BSSID of the active link, colon-separated hex. Absent when
    /// disconnected.
    pub const BSSID: &str = "net.wifi.bssid";

    /// Bucketed signal level of the active link, 0..=4.
    pub const RSSI_LEVEL: &str = "net.wifi.rssi_level";
}

/// The platform property store capability.
#[trait_variant::make(PropertyStore: Send)]
pub trait LocalPropertyStore {
    /// Read an integer property.
    async fn get_int(&self, key: &str) -> Result<i64, Error>;

    /// Read a string property.
    async fn get_string(&self, key: &str) -> Result<String, Error>;

    /// Subscribe to changes of an integer property. The receiver's
    /// initial value is the current one; dropping it unsubscribes.
    fn watch_int(&self, key: &str) -> Result<watch::Receiver<i64>, Error>;
}
