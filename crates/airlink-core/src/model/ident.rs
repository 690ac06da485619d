// ── Identity types ──
//
// An access point is identified by its ESSID + BSSID pair everywhere
// membership or "currently connected" checks happen. Handles are a
// registry concern; identity comparison never goes through them.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

// ── Essid ───────────────────────────────────────────────────────────

/// Network name (ESSID).
///
/// Carried verbatim; the facade rejects empty names at creation time
/// rather than making emptiness unrepresentable, because scan results
/// from hidden networks legitimately arrive with a blank name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Essid(String);

impl Essid {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for Essid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for Essid {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for Essid {
    fn from(s: String) -> Self {
        Self(s)
    }
}

// ── Bssid ───────────────────────────────────────────────────────────

/// Access point hardware address, normalized to lowercase
/// colon-separated form (`aa:bb:cc:dd:ee:ff`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Bssid(String);

impl Bssid {
    /// Create a normalized BSSID from any common format.
    /// Accepts colon-separated, dash-separated, or bare hex.
    pub fn new(raw: impl AsRef<str>) -> Self {
        let raw = raw.as_ref().to_lowercase().replace('-', ":");
        if raw.contains(':') {
            return Self(raw);
        }
        // Bare hex: insert separators every two digits.
        let grouped = raw
            .as_bytes()
            .chunks(2)
            .map(String::from_utf8_lossy)
            .collect::<Vec<_>>()
            .join(":");
        Self(grouped)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Bssid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Bssid {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::new(s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bssid_normalizes_dashes_and_case() {
        let b = Bssid::new("3C-22-FB-10-AA-01");
        assert_eq!(b.as_str(), "3c:22:fb:10:aa:01");
    }

    #[test]
    fn bssid_normalizes_bare_hex() {
        let b = Bssid::new("3c22fb10aa01");
        assert_eq!(b.as_str(), "3c:22:fb:10:aa:01");
    }

    #[test]
    fn bssid_already_normalized_is_unchanged() {
        let b = Bssid::new("90:4d:4a:77:03:1c");
        assert_eq!(b.as_str(), "90:4d:4a:77:03:1c");
    }

    #[test]
    fn essid_keeps_blank_names() {
        let e = Essid::new("");
        assert!(e.is_empty());
    }
}
