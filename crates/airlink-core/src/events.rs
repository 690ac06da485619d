// ── Notification payloads ──
//
// What the four callback slots deliver. Every payload carries the
// `is_requested` flag copied from the daemon event that caused it:
// `true` for transitions this client asked for, `false` for ones that
// happened behind its back. The error field is the only channel through
// which an asynchronous failure reaches the caller -- the submitting
// call itself has long since returned.

use crate::error::WifiError;
use crate::model::{AccessPoint, ConnectionState, DeviceState};

/// Radio power transition completed (or failed).
#[derive(Debug, Clone)]
pub struct DeviceStateEvent {
    pub state: DeviceState,
    pub error: Option<WifiError>,
    pub is_requested: bool,
}

/// A scan finished. The found-AP list has already been replaced when
/// this fires; iterate it for the results.
#[derive(Debug, Clone)]
pub struct ScanEvent {
    pub error: Option<WifiError>,
    pub is_requested: bool,
}

/// The link moved to a new state.
#[derive(Debug, Clone)]
pub struct ConnectionEvent {
    pub state: ConnectionState,
    /// Snapshot of the AP the transition concerns, when the daemon
    /// named one. An owned copy: keeping it past the callback is fine.
    pub ap: Option<AccessPoint>,
    pub error: Option<WifiError>,
    pub is_requested: bool,
}
