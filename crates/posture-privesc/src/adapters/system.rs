//! Live sources backed by Windows tooling.
//!
//! On hosts without that tooling every lookup reports
//! [`SourceError::Unavailable`], which the detector treats as a degraded
//! (or, if nothing answers, empty) scan.

use async_trait::async_trait;
use posture_core::{AccessControlList, ServiceRecord, SourceError};
use std::time::Duration;
use tracing::debug;

use super::command;
use super::{icacls, powershell, reg};
use crate::source::{AclSource, PolicyScope, PolicySource, ServiceInventory};

/// Default bound for a single helper command.
pub const DEFAULT_COMMAND_TIMEOUT: Duration = Duration::from_secs(30);

/// Service manager, filesystem ACLs and registry of the local machine.
#[derive(Debug, Clone)]
pub struct SystemSources {
    timeout: Duration,
}

impl Default for SystemSources {
    fn default() -> Self {
        Self::new()
    }
}

impl SystemSources {
    /// Create sources with the default command timeout
    #[must_use]
    pub const fn new() -> Self {
        Self::with_timeout(DEFAULT_COMMAND_TIMEOUT)
    }

    /// Create sources with a custom command timeout
    #[must_use]
    pub const fn with_timeout(timeout: Duration) -> Self {
        Self { timeout }
    }
}

#[async_trait]
impl ServiceInventory for SystemSources {
    async fn services(&self) -> Result<Vec<ServiceRecord>, SourceError> {
        let out = command::run(
            "powershell",
            &["-NoProfile", "-NonInteractive", "-Command", powershell::SERVICE_QUERY],
            self.timeout,
        )
        .await?;

        if !out.success {
            return Err(SourceError::Unavailable(format!(
                "service query failed: {}",
                out.stderr.trim()
            )));
        }

        let services = powershell::parse_services(&out.stdout)?;
        debug!(count = services.len(), "enumerated services");
        Ok(services)
    }
}

#[async_trait]
impl AclSource for SystemSources {
    async fn acl(&self, path: &str) -> Result<AccessControlList, SourceError> {
        let out = command::run("icacls", &[path], self.timeout).await?;
        if out.success {
            Ok(icacls::parse_acl(path, &out.stdout))
        } else {
            Err(icacls::classify_failure(path, &out.combined()))
        }
    }
}

#[async_trait]
impl PolicySource for SystemSources {
    async fn dword(
        &self,
        scope: PolicyScope,
        key: &str,
        value: &str,
    ) -> Result<Option<u32>, SourceError> {
        let full_key = format!(r"{}\{}", scope.hive(), key);
        let out = command::run("reg", &["query", &full_key, "/v", value], self.timeout).await?;
        if out.success {
            reg::parse_dword(&out.stdout, value)
        } else {
            reg::classify_failure(&full_key, &out.combined())
        }
    }
}
