//! The protocol checks a [`crate::Prober`] drives.

use async_trait::async_trait;
use posture_core::ProbeError;

/// An open remote-management session.
///
/// [`crate::Prober`] always calls [`RemoteSession::close`]; implementations
/// should still release their handle on drop.
#[async_trait]
pub trait RemoteSession: Send {
    /// Release the session
    async fn close(&mut self) -> Result<(), ProbeError>;
}

/// One attempt of each protocol against a host. No retries.
#[async_trait]
pub trait ConnectivityChecks: Send + Sync {
    /// Single reachability probe
    async fn ping(&self, host: &str) -> Result<(), ProbeError>;

    /// Open a remote-management session
    async fn open_session(&self, host: &str) -> Result<Box<dyn RemoteSession>, ProbeError>;

    /// Check that the administrative share exists
    async fn share_exists(&self, host: &str, share: &str) -> Result<(), ProbeError>;

    /// Fetch a single remote system property
    async fn query_property(&self, host: &str) -> Result<(), ProbeError>;
}
