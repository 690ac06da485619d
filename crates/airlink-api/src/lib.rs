// airlink-api: Capability boundary for the airlink Wi-Fi station client.
//
// The actual radio and connection management lives in an external
// network daemon. This crate defines the traits that daemon (and the
// platform property store) must satisfy, the asynchronous event model
// they deliver, and an in-memory simulator backend for development
// and testing. No wire protocol is defined here.

pub mod daemon;
pub mod error;
pub mod properties;
pub mod sim;

pub use daemon::{ApInfo, DaemonEvent, DaemonFault, IpSummary, LinkState, ProfileTarget, WifiDaemon, WpsMode};
pub use error::Error;
pub use properties::{keys, PropertyStore};
pub use sim::SimNet;
