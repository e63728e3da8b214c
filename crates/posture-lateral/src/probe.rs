//! Per-host connectivity probe.

use posture_core::{HostProbeResult, ProbeError, ProbeStatus};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

use crate::checks::ConnectivityChecks;
use crate::config::{millis, ProbeConfig};

/// Await `check`, turning an elapsed bound into [`ProbeError::Timeout`].
async fn bounded<T, F>(timeout: Duration, check: F) -> Result<T, ProbeError>
where
    F: Future<Output = Result<T, ProbeError>>,
{
    tokio::time::timeout(timeout, check)
        .await
        .unwrap_or_else(|_| Err(ProbeError::Timeout(millis(timeout))))
}

fn status<T>(host: &str, step: &'static str, outcome: &Result<T, ProbeError>) -> ProbeStatus {
    if let Err(e) = outcome {
        debug!(host, step, error = %e, "check failed");
    }
    ProbeStatus::from_outcome(outcome)
}

/// Runs the four checks for one host, strictly in order
#[derive(Clone)]
pub struct Prober {
    checks: Arc<dyn ConnectivityChecks>,
    config: ProbeConfig,
}

impl Prober {
    /// Create a prober over the given checks
    pub fn new(checks: Arc<dyn ConnectivityChecks>, config: ProbeConfig) -> Self {
        Self { checks, config }
    }

    /// Probe configuration
    #[must_use]
    pub const fn config(&self) -> &ProbeConfig {
        &self.config
    }

    /// Probe a host. Never fails: every problem becomes a `Fail` status.
    pub async fn probe(&self, host: &str) -> HostProbeResult {
        let cfg = &self.config;

        let ping = bounded(cfg.ping_timeout, self.checks.ping(host)).await;
        if status(host, "ping", &ping) != ProbeStatus::Success {
            info!(host, "host unreachable, remaining checks skipped");
            return HostProbeResult::unreachable(host);
        }

        let remote_management = self.remote_management(host).await;

        let share = bounded(
            cfg.share_timeout,
            self.checks.share_exists(host, &cfg.admin_share),
        )
        .await;
        let file_share = status(host, "file_share", &share);

        let rpc = bounded(cfg.rpc_timeout, self.checks.query_property(host)).await;
        let rpc = status(host, "rpc", &rpc);

        let result = HostProbeResult::reachable(host, remote_management, file_share, rpc);
        info!(
            host,
            remote_management = %remote_management,
            file_share = %file_share,
            rpc = %rpc,
            "host probed"
        );
        result
    }

    /// Open a session and release it straight away
    async fn remote_management(&self, host: &str) -> ProbeStatus {
        let timeout = self.config.session_timeout;
        let opened = bounded(timeout, self.checks.open_session(host)).await;
        let outcome = status(host, "remote_management", &opened);

        if let Ok(mut session) = opened {
            if let Err(e) = bounded(timeout, session.close()).await {
                debug!(host, error = %e, "session release failed");
            }
        }
        outcome
    }
}
