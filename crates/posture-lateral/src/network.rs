//! Checks over the real network.
//!
//! - **Ping**: one echo request through the system `ping` binary
//! - **Remote management**: TCP session to the WS-Management port
//! - **File share**: UNC metadata lookup on Windows, SMB port elsewhere
//! - **RPC**: connection to the RPC endpoint mapper

use async_trait::async_trait;
use posture_core::ProbeError;
use std::process::Stdio;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tokio::process::Command;
use tracing::debug;

use crate::checks::{ConnectivityChecks, RemoteSession};
use crate::config::{PortConfig, ProbeConfig};

/// Whether `ping` saw an echo reply.
///
/// Windows `ping` exits 0 on "Destination host unreachable" replies from a
/// router, so there a reply also needs a `TTL=` line.
fn echo_replied(exit_ok: bool, stdout: &str, windows: bool) -> bool {
    exit_ok && (!windows || stdout.to_ascii_uppercase().contains("TTL="))
}

/// TCP-backed remote-management session.
struct TcpSession {
    stream: Option<TcpStream>,
}

#[async_trait]
impl RemoteSession for TcpSession {
    async fn close(&mut self) -> Result<(), ProbeError> {
        if let Some(mut stream) = self.stream.take() {
            stream.shutdown().await?;
        }
        Ok(())
    }
}

/// Live network implementation of [`ConnectivityChecks`]
#[derive(Debug, Clone)]
pub struct NetworkChecks {
    ports: PortConfig,
    ping_wait: Duration,
}

impl Default for NetworkChecks {
    fn default() -> Self {
        Self::from_config(&ProbeConfig::default())
    }
}

impl NetworkChecks {
    /// Build checks using the ports and ping timeout of `config`
    #[must_use]
    pub fn from_config(config: &ProbeConfig) -> Self {
        Self {
            ports: config.ports,
            ping_wait: config.ping_timeout,
        }
    }

    /// Arguments for a single echo request, per platform
    fn ping_args(&self, host: &str) -> Vec<String> {
        let wait_ms = self.ping_wait.as_millis().max(1);
        if cfg!(windows) {
            vec!["-n".into(), "1".into(), "-w".into(), wait_ms.to_string(), host.into()]
        } else if cfg!(target_os = "macos") {
            vec!["-c".into(), "1".into(), "-W".into(), wait_ms.to_string(), host.into()]
        } else {
            let wait_secs = self.ping_wait.as_secs().max(1);
            vec!["-c".into(), "1".into(), "-W".into(), wait_secs.to_string(), host.into()]
        }
    }

    /// Reject names the `ping` binary would read as options or split.
    fn check_host_name(host: &str) -> Result<(), ProbeError> {
        if host.is_empty()
            || host.starts_with('-')
            || host.chars().any(|c| c.is_whitespace() || c.is_control())
        {
            return Err(ProbeError::Command(format!("invalid host name {host:?}")));
        }
        Ok(())
    }

    async fn connect(host: &str, port: u16) -> Result<TcpStream, ProbeError> {
        let stream = TcpStream::connect((host, port)).await?;
        debug!(host, port, "tcp connect ok");
        Ok(stream)
    }
}

#[async_trait]
impl ConnectivityChecks for NetworkChecks {
    async fn ping(&self, host: &str) -> Result<(), ProbeError> {
        Self::check_host_name(host)?;
        let output = Command::new("ping")
            .args(self.ping_args(host))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| ProbeError::Command(format!("ping: {e}")))?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        if echo_replied(output.status.success(), &stdout, cfg!(windows)) {
            Ok(())
        } else {
            Err(ProbeError::Unreachable(format!("no echo reply from {host}")))
        }
    }

    async fn open_session(&self, host: &str) -> Result<Box<dyn RemoteSession>, ProbeError> {
        let stream = Self::connect(host, self.ports.remote_management).await?;
        Ok(Box::new(TcpSession {
            stream: Some(stream),
        }))
    }

    async fn share_exists(&self, host: &str, share: &str) -> Result<(), ProbeError> {
        if cfg!(windows) {
            let unc = format!(r"\\{host}\{share}");
            tokio::fs::metadata(&unc).await?;
        } else {
            Self::connect(host, self.ports.file_share).await?;
        }
        Ok(())
    }

    async fn query_property(&self, host: &str) -> Result<(), ProbeError> {
        Self::connect(host, self.ports.rpc).await?;
        Ok(())
    }
}
