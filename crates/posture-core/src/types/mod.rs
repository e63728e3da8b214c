//! Strongly-typed records exchanged between sources, the detector, the
//! prober and the report sink.

pub mod acl;
pub mod finding;
pub mod probe;
pub mod service;

pub use acl::{AccessControlEntry, AccessControlList, Right};
pub use finding::{Finding, FindingCategory, Severity, HKCU_ENABLED, HKLM_ENABLED};
pub use probe::{HostProbeResult, ProbeStatus, Protocol, ProtocolResult};
pub use service::{ServiceRecord, StartMode};
