//! Concrete sources: the live system (via OS tooling) and offline snapshots.

mod command;
pub mod icacls;
pub mod powershell;
pub mod reg;
mod snapshot;
mod system;

pub use snapshot::{PolicySnapshot, SnapshotSource};
pub use system::{SystemSources, DEFAULT_COMMAND_TIMEOUT};
