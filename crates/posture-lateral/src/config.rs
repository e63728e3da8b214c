//! Probe timing and port configuration.

use std::time::Duration;

/// Ports used by [`crate::NetworkChecks`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PortConfig {
    /// WS-Management (remote-management sessions)
    pub remote_management: u16,
    /// SMB (administrative shares)
    pub file_share: u16,
    /// RPC endpoint mapper
    pub rpc: u16,
}

impl Default for PortConfig {
    fn default() -> Self {
        Self {
            remote_management: 5985,
            file_share: 445,
            rpc: 135,
        }
    }
}

/// Connectivity probe configuration
#[derive(Debug, Clone)]
pub struct ProbeConfig {
    /// Bound on the ping check
    pub ping_timeout: Duration,
    /// Bound on opening (and separately, releasing) a remote-management session
    pub session_timeout: Duration,
    /// Bound on the file-share check
    pub share_timeout: Duration,
    /// Bound on the RPC query
    pub rpc_timeout: Duration,
    /// Maximum hosts probed concurrently
    pub concurrency: usize,
    /// Administrative share checked on each host
    pub admin_share: String,
    /// Ports for the network checks
    pub ports: PortConfig,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            ping_timeout: Duration::from_secs(2),
            session_timeout: Duration::from_secs(5),
            share_timeout: Duration::from_secs(5),
            rpc_timeout: Duration::from_secs(5),
            concurrency: 16,
            admin_share: String::from("C$"),
            ports: PortConfig::default(),
        }
    }
}

impl ProbeConfig {
    /// Set the ping timeout
    #[must_use]
    pub const fn ping_timeout(mut self, timeout: Duration) -> Self {
        self.ping_timeout = timeout;
        self
    }

    /// Set the same timeout for the session, share and RPC checks
    #[must_use]
    pub const fn step_timeout(mut self, timeout: Duration) -> Self {
        self.session_timeout = timeout;
        self.share_timeout = timeout;
        self.rpc_timeout = timeout;
        self
    }

    /// Set the maximum number of concurrently probed hosts
    #[must_use]
    pub const fn concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency;
        self
    }

    /// Set the administrative share
    #[must_use]
    pub fn admin_share(mut self, share: impl Into<String>) -> Self {
        self.admin_share = share.into();
        self
    }
}

pub(crate) fn millis(timeout: Duration) -> u64 {
    u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX)
}
