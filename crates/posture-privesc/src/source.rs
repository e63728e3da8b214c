//! Read-only collaborators the detector consumes.

use async_trait::async_trait;
use posture_core::{AccessControlList, ServiceRecord, SourceError};
use serde::{Deserialize, Serialize};

/// Supplies the installed services of the target host.
#[async_trait]
pub trait ServiceInventory: Send + Sync {
    /// Enumerate services. Malformed individual records are dropped by the
    /// source; only total failure is an error.
    async fn services(&self) -> Result<Vec<ServiceRecord>, SourceError>;
}

/// Supplies the discretionary ACL of a filesystem path.
#[async_trait]
pub trait AclSource: Send + Sync {
    /// Look up the entries for `path`.
    async fn acl(&self, path: &str) -> Result<AccessControlList, SourceError>;
}

/// Scope of a policy value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum PolicyScope {
    /// Machine-wide (`HKLM`)
    Machine,
    /// Current user (`HKCU`)
    User,
}

impl PolicyScope {
    /// Registry hive prefix for this scope
    #[must_use]
    pub const fn hive(&self) -> &'static str {
        match self {
            Self::Machine => "HKLM",
            Self::User => "HKCU",
        }
    }
}

impl std::fmt::Display for PolicyScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.hive())
    }
}

/// Supplies named integer policy values.
#[async_trait]
pub trait PolicySource: Send + Sync {
    /// Read `value` under `key` in `scope`. `Ok(None)` means the value is not set.
    async fn dword(
        &self,
        scope: PolicyScope,
        key: &str,
        value: &str,
    ) -> Result<Option<u32>, SourceError>;
}
