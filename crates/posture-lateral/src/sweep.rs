//! Fan the per-host probe out over a host list.

use futures_util::future::join_all;
use posture_core::{HostProbeResult, ProbeStatus, Protocol};
use std::sync::Arc;
use tokio::sync::{watch, Semaphore};
use tracing::{info, warn};

use crate::checks::ConnectivityChecks;
use crate::config::ProbeConfig;
use crate::probe::Prober;

/// Results of a sweep, one per requested host, in request order
#[derive(Debug, Clone, Default)]
pub struct SweepOutcome {
    /// Per-host results
    pub results: Vec<HostProbeResult>,
    /// True if the sweep was cancelled; unfinished hosts are all `Skipped`
    pub cancelled: bool,
}

/// Reachability orchestrator
#[derive(Clone)]
pub struct Sweep {
    prober: Prober,
}

/// Resolve once `cancel` turns true. Never resolves if the sender is gone.
async fn wait_cancelled(mut cancel: watch::Receiver<bool>) {
    let sender_alive = cancel.wait_for(|c| *c).await.is_ok();
    if !sender_alive {
        std::future::pending::<()>().await;
    }
}

impl Sweep {
    /// Create a sweep over the given checks
    pub fn new(checks: Arc<dyn ConnectivityChecks>, config: ProbeConfig) -> Self {
        Self {
            prober: Prober::new(checks, config),
        }
    }

    /// Create a sweep around an existing prober
    #[must_use]
    pub const fn from_prober(prober: Prober) -> Self {
        Self { prober }
    }

    /// Probe every host. Duplicates are probed as given.
    pub async fn probe_all(&self, hosts: &[String]) -> SweepOutcome {
        let (_keep, cancel) = watch::channel(false);
        self.probe_all_until(hosts, cancel).await
    }

    /// Probe every host until `cancel` turns true.
    ///
    /// At most `concurrency` hosts are in flight. On cancellation in-flight
    /// probes are dropped (releasing their sessions and helper processes)
    /// and the partial results are returned.
    pub async fn probe_all_until(
        &self,
        hosts: &[String],
        cancel: watch::Receiver<bool>,
    ) -> SweepOutcome {
        if hosts.is_empty() {
            return SweepOutcome::default();
        }

        let concurrency = self.prober.config().concurrency.max(1);
        let semaphore = Arc::new(Semaphore::new(concurrency));
        info!(hosts = hosts.len(), concurrency, "starting reachability sweep");

        let handles: Vec<_> = hosts
            .iter()
            .map(|host| {
                let sem = semaphore.clone();
                let prober = self.prober.clone();
                let host = host.clone();
                let cancel = cancel.clone();

                tokio::spawn(async move {
                    let probe = async {
                        let _permit = sem.acquire_owned().await.ok()?;
                        Some(prober.probe(&host).await)
                    };
                    tokio::select! {
                        biased;
                        () = wait_cancelled(cancel) => None,
                        result = probe => result,
                    }
                })
            })
            .collect();

        let mut cancelled = *cancel.borrow();
        let results: Vec<_> = hosts
            .iter()
            .zip(join_all(handles).await)
            .map(|(host, joined)| match joined {
                Ok(Some(result)) => result,
                Ok(None) => {
                    cancelled = true;
                    HostProbeResult::abandoned(host.as_str())
                }
                Err(e) => {
                    warn!(host = %host, error = %e, "probe task failed");
                    HostProbeResult::abandoned(host.as_str())
                }
            })
            .collect();

        let reachable = results
            .iter()
            .filter(|r| r.status(Protocol::Ping) == ProbeStatus::Success)
            .count();
        info!(hosts = results.len(), reachable, cancelled, "reachability sweep complete");

        SweepOutcome { results, cancelled }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checks::RemoteSession;
    use crate::probe::tests::ScriptedChecks;
    use async_trait::async_trait;
    use posture_core::ProbeError;
    use std::collections::HashSet;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    fn hosts(names: &[&str]) -> Vec<String> {
        names.iter().map(ToString::to_string).collect()
    }

    fn config() -> ProbeConfig {
        ProbeConfig::default()
            .ping_timeout(Duration::from_millis(200))
            .step_timeout(Duration::from_millis(200))
            .concurrency(2)
    }

    #[tokio::test]
    async fn empty_host_list() {
        let sweep = Sweep::new(Arc::new(ScriptedChecks::default()), config());
        let outcome = sweep.probe_all(&[]).await;
        assert!(outcome.results.is_empty());
        assert!(!outcome.cancelled);
    }

    #[tokio::test]
    async fn one_result_per_host_in_input_order() {
        let checks = ScriptedChecks {
            down: HashSet::from(["B".to_string()]),
            // A finishes last even though it starts first
            slow: HashSet::from([("A".to_string(), "rpc")]),
            ..Default::default()
        };
        let sweep = Sweep::new(Arc::new(checks), config());

        let outcome = sweep.probe_all(&hosts(&["A", "B", "C"])).await;
        let names: Vec<_> = outcome.results.iter().map(HostProbeResult::host_name).collect();
        assert_eq!(names, ["A", "B", "C"]);
        assert_eq!(
            outcome.results[0].status(Protocol::RemoteProcedureCall),
            ProbeStatus::Fail
        );
        assert_eq!(outcome.results[1].status(Protocol::Ping), ProbeStatus::Fail);
        assert_eq!(outcome.results[2].status(Protocol::Ping), ProbeStatus::Success);
    }

    #[tokio::test]
    async fn duplicate_hosts_are_kept() {
        let sweep = Sweep::new(Arc::new(ScriptedChecks::default()), config());
        let outcome = sweep.probe_all(&hosts(&["dc01", "dc01"])).await;
        assert_eq!(outcome.results.len(), 2);
    }

    #[tokio::test]
    async fn cancellation_returns_partial_results() {
        let checks = ScriptedChecks {
            // no step timeout will save us from a hung ping here
            slow: HashSet::from([("stuck".to_string(), "ping")]),
            ..Default::default()
        };
        let config = ProbeConfig::default()
            .ping_timeout(Duration::from_secs(3600))
            .concurrency(4);
        let sweep = Sweep::new(Arc::new(checks), config);

        let (tx, rx) = watch::channel(false);
        let canceller = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(100)).await;
            tx.send(true).unwrap();
        });

        let outcome = sweep
            .probe_all_until(&hosts(&["fast", "stuck"]), rx)
            .await;
        canceller.await.unwrap();

        assert!(outcome.cancelled);
        assert_eq!(outcome.results.len(), 2);
        assert_eq!(outcome.results[0].status(Protocol::Ping), ProbeStatus::Success);
        assert_eq!(outcome.results[1].host_name(), "stuck");
        assert_eq!(outcome.results[1].status(Protocol::Ping), ProbeStatus::Skipped);
    }

    /// Counts hosts whose ping is in progress and remembers the peak.
    #[derive(Default)]
    struct GaugedChecks {
        in_flight: AtomicUsize,
        peak: AtomicUsize,
    }

    struct NoopSession;

    #[async_trait]
    impl RemoteSession for NoopSession {
        async fn close(&mut self) -> Result<(), ProbeError> {
            Ok(())
        }
    }

    #[async_trait]
    impl ConnectivityChecks for GaugedChecks {
        async fn ping(&self, _host: &str) -> Result<(), ProbeError> {
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(20)).await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            Ok(())
        }

        async fn open_session(&self, _host: &str) -> Result<Box<dyn RemoteSession>, ProbeError> {
            Ok(Box::new(NoopSession))
        }

        async fn share_exists(&self, _host: &str, _share: &str) -> Result<(), ProbeError> {
            Ok(())
        }

        async fn query_property(&self, _host: &str) -> Result<(), ProbeError> {
            Ok(())
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn in_flight_hosts_never_exceed_concurrency() {
        let checks = Arc::new(GaugedChecks::default());
        let sweep = Sweep::new(checks.clone(), config().concurrency(3));

        let names: Vec<String> = (0..20).map(|i| format!("host{i:02}")).collect();
        let outcome = sweep.probe_all(&names).await;

        assert_eq!(outcome.results.len(), 20);
        let peak = checks.peak.load(Ordering::SeqCst);
        assert!(peak <= 3, "peak in-flight was {peak}");
        assert!(peak >= 1);
    }
}
