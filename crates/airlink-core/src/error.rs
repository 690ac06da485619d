// ── Public error taxonomy ──
//
// Consumers see exactly six failure classes, matching the platform's
// error contract for the Wi-Fi client surface. Capability-boundary
// errors (airlink_api::Error) and daemon fault codes are translated
// here and never leak through the public API. Validation failures are
// always returned synchronously, before any daemon request is issued;
// asynchronous failures travel only in callback payloads.

use thiserror::Error;

use crate::model::AddressFamily;

/// Unified error type for the Wi-Fi client surface.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WifiError {
    /// Malformed input: empty ESSID, stale handle, bad DNS slot, or a
    /// handle that does not name the entity the operation requires.
    #[error("invalid parameter: {reason}")]
    InvalidParameter { reason: String },

    /// Lifecycle or policy guard violated: not initialized, already
    /// initialized, duplicate exclusive registration, unregistering an
    /// empty slot, or a conflicting request already in flight.
    #[error("invalid operation: {reason}")]
    InvalidOperation { reason: String },

    /// The daemon reported resource exhaustion. (Client-side allocation
    /// failure aborts the process; it never surfaces here.)
    #[error("out of memory")]
    OutOfMemory,

    /// A daemon or property-store interaction failed.
    #[error("operation failed: {reason}")]
    OperationFailed { reason: String },

    /// A connection-dependent query was issued with no active link.
    #[error("no connection")]
    NoConnection,

    /// An IP-family-specific accessor was given a family this access
    /// point does not carry.
    #[error("address family not supported: {family}")]
    AddressFamilyNotSupported { family: AddressFamily },
}

impl WifiError {
    pub(crate) fn invalid_parameter(reason: impl Into<String>) -> Self {
        Self::InvalidParameter {
            reason: reason.into(),
        }
    }

    pub(crate) fn invalid_operation(reason: impl Into<String>) -> Self {
        Self::InvalidOperation {
            reason: reason.into(),
        }
    }

    pub(crate) fn operation_failed(reason: impl Into<String>) -> Self {
        Self::OperationFailed {
            reason: reason.into(),
        }
    }

    /// Translate a completion fault delivered inside a daemon event.
    pub(crate) fn from_fault(fault: airlink_api::DaemonFault) -> Self {
        use airlink_api::DaemonFault;

        match fault {
            DaemonFault::OperationAborted => Self::operation_failed("operation aborted"),
            DaemonFault::InvalidKey => Self::operation_failed("invalid passphrase or PIN"),
            DaemonFault::ConnectFailed => Self::operation_failed("association failed"),
            DaemonFault::DhcpFailed => Self::operation_failed("address configuration failed"),
            _ => Self::operation_failed("daemon-internal failure"),
        }
    }
}

// ── Conversion from capability-boundary errors ───────────────────────

impl From<airlink_api::Error> for WifiError {
    fn from(err: airlink_api::Error) -> Self {
        use airlink_api::Error;

        match err {
            Error::DaemonUnavailable { reason } => {
                Self::operation_failed(format!("daemon unavailable: {reason}"))
            }
            Error::Rejected { reason } => {
                Self::operation_failed(format!("rejected by daemon: {reason}"))
            }
            Error::Timeout { timeout_secs } => {
                Self::operation_failed(format!("request timed out after {timeout_secs}s"))
            }
            Error::StreamClosed => Self::operation_failed("daemon event stream closed"),
            Error::PropertyNotFound { key } => {
                Self::operation_failed(format!("property not found: {key}"))
            }
            Error::InvalidProperty { key, reason } => {
                Self::operation_failed(format!("invalid value for property {key}: {reason}"))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn boundary_errors_map_to_operation_failed() {
        let err: WifiError = airlink_api::Error::Rejected {
            reason: "radio is powered off".into(),
        }
        .into();
        assert!(matches!(err, WifiError::OperationFailed { .. }));
    }

    #[test]
    fn fault_mapping_keeps_the_reason() {
        let err = WifiError::from_fault(airlink_api::DaemonFault::InvalidKey);
        assert_eq!(
            err,
            WifiError::OperationFailed {
                reason: "invalid passphrase or PIN".into()
            }
        );
    }
}
