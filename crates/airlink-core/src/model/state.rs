// ── Device and connection state ──

use std::fmt;

use serde::{Deserialize, Serialize};

/// Radio power state. Separate from [`ConnectionState`]: the device can
/// be activated with no AP connected.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeviceState {
    #[default]
    Deactivated,
    Activated,
}

/// Link state, meaningful only while the device is activated.
///
/// Transitions happen exclusively in response to daemon events -- the
/// client never infers one from having issued a request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Connecting,
    Connected,
    Disconnecting,
}

impl ConnectionState {
    /// A request for this link is still in flight.
    pub fn is_transitional(self) -> bool {
        matches!(self, Self::Connecting | Self::Disconnecting)
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Disconnected => "disconnected",
            Self::Connecting => "connecting",
            Self::Connected => "connected",
            Self::Disconnecting => "disconnecting",
        };
        write!(f, "{s}")
    }
}

/// IP address family selector for per-family accessors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AddressFamily {
    Ipv4,
    Ipv6,
}

impl fmt::Display for AddressFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ipv4 => write!(f, "IPv4"),
            Self::Ipv6 => write!(f, "IPv6"),
        }
    }
}

/// Bucketed signal level, 0 (none) to 4 (excellent), as published on
/// the platform property store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RssiLevel(u8);

impl RssiLevel {
    pub const NONE: Self = Self(0);
    pub const MAX: Self = Self(4);

    /// Clamp an arbitrary integer (e.g. a raw property value) into the
    /// valid bucket range.
    pub fn from_raw(raw: i64) -> Self {
        Self(raw.clamp(0, 4) as u8)
    }

    /// Bucket a dBm reading the way the platform does.
    pub fn from_dbm(dbm: i32) -> Self {
        match dbm {
            d if d >= -55 => Self(4),
            d if d >= -65 => Self(3),
            d if d >= -75 => Self(2),
            d if d >= -85 => Self(1),
            _ => Self(0),
        }
    }

    pub fn value(self) -> u8 {
        self.0
    }
}

impl fmt::Display for RssiLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rssi_level_buckets() {
        assert_eq!(RssiLevel::from_dbm(-48), RssiLevel::MAX);
        assert_eq!(RssiLevel::from_dbm(-60).value(), 3);
        assert_eq!(RssiLevel::from_dbm(-70).value(), 2);
        assert_eq!(RssiLevel::from_dbm(-80).value(), 1);
        assert_eq!(RssiLevel::from_dbm(-95), RssiLevel::NONE);
    }

    #[test]
    fn rssi_level_from_raw_clamps() {
        assert_eq!(RssiLevel::from_raw(-3), RssiLevel::NONE);
        assert_eq!(RssiLevel::from_raw(9), RssiLevel::MAX);
        assert_eq!(RssiLevel::from_raw(2).value(), 2);
    }

    #[test]
    fn transitional_states() {
        assert!(ConnectionState::Connecting.is_transitional());
        assert!(ConnectionState::Disconnecting.is_transitional());
        assert!(!ConnectionState::Connected.is_transitional());
        assert!(!ConnectionState::Disconnected.is_transitional());
    }
}
