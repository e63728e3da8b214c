//! Core types and error taxonomy for posturescan.
//!
//! This crate provides the foundational types shared by the detector, the
//! reachability prober and the CLI:
//!
//! - **Types**: service records, access-control entries, findings and
//!   per-host probe results
//! - **Errors**: the per-lookup [`SourceError`] taxonomy, the per-check
//!   [`ProbeError`] and the run-level [`ScanError`]
//!
//! # Example
//!
//! ```rust,ignore
//! use posture_core::{HostProbeResult, ProbeStatus, Protocol};
//!
//! let result = HostProbeResult::unreachable("dc01");
//! assert_eq!(result.status(Protocol::Ping), ProbeStatus::Fail);
//! assert_eq!(result.status(Protocol::FileShare), ProbeStatus::Skipped);
//! ```

#![doc(html_root_url = "https://docs.rs/posture-core/0.3.0")]

mod error;
pub mod types;

pub use error::{ProbeError, Result, ScanError, SourceError};
pub use types::*;
