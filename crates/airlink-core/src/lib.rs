// airlink-core: Client-side access layer for Wi-Fi station management.
//
// The radio lives behind an external network daemon (see airlink-api);
// this crate keeps the client-local state that daemon does not: the
// found-AP registry, the four notification slots, the synchronized
// device/connection state pair, and the initialize/deinitialize
// lifecycle guard around it all.

pub mod client;
pub mod config;
mod convert;
pub mod error;
pub mod events;
pub mod model;
pub mod registry;
pub mod session;
mod slots;

// ── Primary re-exports ──────────────────────────────────────────────
pub use client::WifiClient;
pub use config::SessionConfig;
pub use error::WifiError;
pub use events::{ConnectionEvent, DeviceStateEvent, ScanEvent};
pub use registry::{ApHandle, ApRegistry};
pub use session::Session;

// Re-export model types at the crate root for ergonomics.
pub use model::{
    // Identity
    Bssid, Essid,
    // State
    AddressFamily, ConnectionState, DeviceState, RssiLevel,
    // Access point
    AccessPoint, EapAuthType, EapConfig, EapType, EncryptionType, IpConfig, IpConfigType,
    ProxyType, Security, SecurityType,
};

// WPS pairing mode comes straight from the capability boundary.
pub use airlink_api::WpsMode;
