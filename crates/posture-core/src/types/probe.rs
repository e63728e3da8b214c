use serde::{Deserialize, Serialize};

/// Remote-access protocol checked by the connectivity probe, in probe order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Protocol {
    /// ICMP echo
    Ping,
    /// Remote-management session (WS-Management)
    RemoteManagement,
    /// Administrative file share
    FileShare,
    /// Remote-procedure-call style property query
    RemoteProcedureCall,
}

impl Protocol {
    /// All protocols in the fixed probe order
    pub const ALL: [Self; 4] = [
        Self::Ping,
        Self::RemoteManagement,
        Self::FileShare,
        Self::RemoteProcedureCall,
    ];

    /// Column name used by tabular sinks
    #[must_use]
    pub const fn column(&self) -> &'static str {
        match self {
            Self::Ping => "ping",
            Self::RemoteManagement => "remote_management",
            Self::FileShare => "file_share",
            Self::RemoteProcedureCall => "rpc",
        }
    }

    const fn index(self) -> usize {
        match self {
            Self::Ping => 0,
            Self::RemoteManagement => 1,
            Self::FileShare => 2,
            Self::RemoteProcedureCall => 3,
        }
    }
}

impl std::fmt::Display for Protocol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Ping => write!(f, "Ping"),
            Self::RemoteManagement => write!(f, "RemoteManagement"),
            Self::FileShare => write!(f, "FileShare"),
            Self::RemoteProcedureCall => write!(f, "RemoteProcedureCall"),
        }
    }
}

/// Outcome of one protocol check
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProbeStatus {
    /// The check completed
    Success,
    /// The check was attempted and failed or timed out
    Fail,
    /// The check was never attempted
    Skipped,
}

impl ProbeStatus {
    /// Map a check outcome to a status
    pub const fn from_outcome<T, E>(outcome: &Result<T, E>) -> Self {
        if outcome.is_ok() {
            Self::Success
        } else {
            Self::Fail
        }
    }
}

impl std::fmt::Display for ProbeStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Success => write!(f, "Success"),
            Self::Fail => write!(f, "Fail"),
            Self::Skipped => write!(f, "Skipped"),
        }
    }
}

/// Status of one protocol for one host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProtocolResult {
    /// Protocol checked
    pub protocol: Protocol,
    /// Outcome
    pub status: ProbeStatus,
}

/// Per-host reachability record.
///
/// Always holds exactly one result per protocol in [`Protocol::ALL`] order.
/// Unless ping succeeded, the three remaining protocols are `Skipped`; the
/// constructors are the only way to build one, so the rule always holds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HostProbeResult {
    host_name: String,
    results: [ProtocolResult; 4],
}

impl HostProbeResult {
    fn build(host_name: impl Into<String>, statuses: [ProbeStatus; 4]) -> Self {
        let mut results = Protocol::ALL.map(|protocol| ProtocolResult {
            protocol,
            status: ProbeStatus::Skipped,
        });
        for (slot, status) in results.iter_mut().zip(statuses) {
            slot.status = status;
        }
        Self {
            host_name: host_name.into(),
            results,
        }
    }

    /// Ping failed: everything else was never attempted
    pub fn unreachable(host_name: impl Into<String>) -> Self {
        Self::build(
            host_name,
            [
                ProbeStatus::Fail,
                ProbeStatus::Skipped,
                ProbeStatus::Skipped,
                ProbeStatus::Skipped,
            ],
        )
    }

    /// Probe abandoned before ping completed (cancellation)
    pub fn abandoned(host_name: impl Into<String>) -> Self {
        Self::build(host_name, [ProbeStatus::Skipped; 4])
    }

    /// Ping succeeded and the remaining checks were each attempted
    pub fn reachable(
        host_name: impl Into<String>,
        remote_management: ProbeStatus,
        file_share: ProbeStatus,
        rpc: ProbeStatus,
    ) -> Self {
        Self::build(
            host_name,
            [ProbeStatus::Success, remote_management, file_share, rpc],
        )
    }

    /// Host name as supplied by the caller
    #[must_use]
    pub fn host_name(&self) -> &str {
        &self.host_name
    }

    /// All four results in probe order
    #[must_use]
    pub const fn results(&self) -> &[ProtocolResult; 4] {
        &self.results
    }

    /// Status of a single protocol
    #[must_use]
    pub const fn status(&self, protocol: Protocol) -> ProbeStatus {
        self.results[protocol.index()].status
    }

    /// Protocols that completed successfully, ping excluded
    #[must_use]
    pub fn viable_protocols(&self) -> Vec<Protocol> {
        self.results
            .iter()
            .filter(|r| r.protocol != Protocol::Ping && r.status == ProbeStatus::Success)
            .map(|r| r.protocol)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn count(result: &HostProbeResult, status: ProbeStatus) -> usize {
        result.results().iter().filter(|r| r.status == status).count()
    }

    #[test]
    fn unreachable_skips_everything_after_ping() {
        let r = HostProbeResult::unreachable("ws01");
        assert_eq!(r.status(Protocol::Ping), ProbeStatus::Fail);
        assert_eq!(count(&r, ProbeStatus::Fail), 1);
        assert_eq!(count(&r, ProbeStatus::Skipped), 3);
        assert!(r.viable_protocols().is_empty());
    }

    #[test]
    fn results_follow_protocol_order() {
        let r = HostProbeResult::reachable(
            "ws01",
            ProbeStatus::Fail,
            ProbeStatus::Success,
            ProbeStatus::Success,
        );
        let order: Vec<_> = r.results().iter().map(|p| p.protocol).collect();
        assert_eq!(order, Protocol::ALL.to_vec());
        assert_eq!(
            r.viable_protocols(),
            vec![Protocol::FileShare, Protocol::RemoteProcedureCall]
        );
    }

    #[test]
    fn abandoned_is_all_skipped() {
        let r = HostProbeResult::abandoned("ws01");
        assert_eq!(count(&r, ProbeStatus::Skipped), 4);
    }
}
