//! # posture-privesc
//!
//! Local privilege-escalation detector.
//!
//! Three independent rules run against read-only sources:
//!
//! - **Unquoted service path** -- auto-start services whose space-containing
//!   executable path is not quoted
//! - **Modifiable service binary** -- service binaries a broad principal
//!   (`Everyone`, `BUILTIN\Users`, ...) can modify or fully control
//! - **AlwaysInstallElevated** -- raw machine- and user-scope policy flags
//!
//! ## Data Flow
//!
//! ```text
//! ServiceInventory --> rule 1 (unquoted path) ---------+
//!                  \-> rule 2 (ACL per binary) --------+--> DetectionReport
//! PolicySource ------> rule 3 (both policy scopes) ----+
//! ```
//!
//! Sources are traits so the detector runs against the live system
//! ([`adapters::SystemSources`]) or an exported snapshot
//! ([`adapters::SnapshotSource`]) alike.

pub mod adapters;
pub mod detector;
pub mod principals;
pub mod rules;
pub mod source;

pub use detector::{detect, DetectionReport, Detector, Unevaluated};
pub use principals::PrincipalMatcher;
pub use source::{AclSource, PolicyScope, PolicySource, ServiceInventory};
