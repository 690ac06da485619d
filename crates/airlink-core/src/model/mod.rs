// ── Domain model ──
//
// Canonical client-side representation of everything the daemon and
// property store report. Wire-shaped records from airlink-api are
// converted into these types on ingestion (see `crate::convert`).

pub mod ap;
pub mod ident;
pub mod state;

// ── Re-exports ──────────────────────────────────────────────────────

// Identity
pub use ident::{Bssid, Essid};

// State
pub use state::{AddressFamily, ConnectionState, DeviceState, RssiLevel};

// Access point
pub use ap::{
    AccessPoint, EapAuthType, EapConfig, EapType, EncryptionType, IpConfig, IpConfigType,
    ProxyType, Security, SecurityType,
};
