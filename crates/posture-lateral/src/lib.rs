//! Lateral-movement reachability probing.
//!
//! For each host, four protocol checks run in a fixed order:
//!
//! ```text
//! Ping --fail--> RemoteManagement, FileShare, RemoteProcedureCall = Skipped
//!   |
//!   +--ok--> RemoteManagement (open + release session)
//!            FileShare        (admin share exists)
//!            RemoteProcedureCall (single property query)
//! ```
//!
//! Each check is bounded by its own timeout and a failure never skips the
//! checks after it, except for the ping gate. [`Sweep`] fans the per-host
//! [`Prober`] out over a host list with bounded concurrency and cancellation.

pub mod checks;
pub mod config;
pub mod network;
pub mod probe;
pub mod sweep;

pub use checks::{ConnectivityChecks, RemoteSession};
pub use config::{PortConfig, ProbeConfig};
pub use network::NetworkChecks;
pub use probe::Prober;
pub use sweep::{Sweep, SweepOutcome};
