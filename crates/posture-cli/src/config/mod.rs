//! Configuration management.

use anyhow::{Context as _, Result};
use directories::ProjectDirs;
use posture_lateral::{PortConfig, ProbeConfig};
use posture_privesc::PrincipalMatcher;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::output::OutputFormat;

/// CLI configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Base directory for timestamped result directories.
    pub results_dir: Option<PathBuf>,

    /// Default output format.
    pub output_format: Option<OutputFormat>,

    /// Reachability probe settings.
    #[serde(default)]
    pub probe: ProbeSettings,

    /// Privilege-escalation detector settings.
    #[serde(default)]
    pub privesc: PrivescSettings,
}

/// `[probe]` table. Timeouts are in milliseconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProbeSettings {
    pub ping_timeout_ms: u64,
    pub session_timeout_ms: u64,
    pub share_timeout_ms: u64,
    pub rpc_timeout_ms: u64,
    pub concurrency: usize,
    pub admin_share: String,
    pub remote_management_port: u16,
    pub file_share_port: u16,
    pub rpc_port: u16,
}

impl Default for ProbeSettings {
    fn default() -> Self {
        let probe = ProbeConfig::default();
        Self {
            ping_timeout_ms: millis(probe.ping_timeout),
            session_timeout_ms: millis(probe.session_timeout),
            share_timeout_ms: millis(probe.share_timeout),
            rpc_timeout_ms: millis(probe.rpc_timeout),
            concurrency: probe.concurrency,
            admin_share: probe.admin_share,
            remote_management_port: probe.ports.remote_management,
            file_share_port: probe.ports.file_share,
            rpc_port: probe.ports.rpc,
        }
    }
}

impl ProbeSettings {
    /// Convert to the prober's configuration.
    pub fn to_probe_config(&self) -> ProbeConfig {
        ProbeConfig {
            ping_timeout: Duration::from_millis(self.ping_timeout_ms),
            session_timeout: Duration::from_millis(self.session_timeout_ms),
            share_timeout: Duration::from_millis(self.share_timeout_ms),
            rpc_timeout: Duration::from_millis(self.rpc_timeout_ms),
            concurrency: self.concurrency,
            admin_share: self.admin_share.clone(),
            ports: PortConfig {
                remote_management: self.remote_management_port,
                file_share: self.file_share_port,
                rpc: self.rpc_port,
            },
        }
    }
}

/// `[privesc]` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PrivescSettings {
    /// Identities treated as broad/unprivileged principals.
    pub broad_principals: Vec<String>,

    /// Bound on each OS helper command, in milliseconds.
    pub command_timeout_ms: u64,

    /// Maximum concurrent ACL lookups.
    pub acl_concurrency: usize,
}

impl Default for PrivescSettings {
    fn default() -> Self {
        Self {
            broad_principals: posture_privesc::principals::DEFAULT_BROAD_PRINCIPALS
                .iter()
                .map(ToString::to_string)
                .collect(),
            command_timeout_ms: millis(posture_privesc::adapters::DEFAULT_COMMAND_TIMEOUT),
            acl_concurrency: posture_privesc::detector::DEFAULT_ACL_CONCURRENCY,
        }
    }
}

impl PrivescSettings {
    /// Principal matcher from the configured identities.
    pub fn principals(&self) -> PrincipalMatcher {
        PrincipalMatcher::new(&self.broad_principals)
    }

    /// Helper command timeout.
    pub const fn command_timeout(&self) -> Duration {
        Duration::from_millis(self.command_timeout_ms)
    }
}

fn millis(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}

impl Config {
    /// Get the default config file path.
    pub fn path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("org", "posturescan", "posturescan")
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?;

        Ok(dirs.config_dir().join("config.toml"))
    }

    /// Load configuration from a file, falling back to defaults if it does not exist.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        let config: Self =
            toml::from_str(&content).with_context(|| format!("parsing {}", path.display()))?;

        Ok(config)
    }

    /// Save configuration to a file.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;

        Ok(())
    }

    /// Results base directory, `./posture-results` unless configured.
    pub fn results_dir(&self) -> PathBuf {
        self.results_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from("posture-results"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempdir().unwrap();
        let config = Config::load_from(&dir.path().join("none.toml")).unwrap();
        assert_eq!(config.probe, ProbeSettings::default());
        assert_eq!(config.results_dir(), PathBuf::from("posture-results"));
    }

    #[test]
    fn partial_tables_fill_in_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "output_format = \"json\"\n\
             [probe]\n\
             concurrency = 4\n\
             ping_timeout_ms = 750\n\
             [privesc]\n\
             broad_principals = [\"Everyone\", \"Guests\"]\n",
        )
        .unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.output_format, Some(OutputFormat::Json));
        assert_eq!(config.probe.concurrency, 4);
        assert_eq!(config.probe.rpc_port, 135);

        let probe = config.probe.to_probe_config();
        assert_eq!(probe.ping_timeout, Duration::from_millis(750));
        assert_eq!(probe.admin_share, "C$");

        let principals = config.privesc.principals();
        assert!(principals.is_broad(r"WS01\Guests"));
        assert!(!principals.is_broad(r"BUILTIN\Users"));
    }

    #[test]
    fn save_and_reload() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let mut config = Config::default();
        config.probe.admin_share = "ADMIN$".into();
        config.save_to(&path).unwrap();

        let reloaded = Config::load_from(&path).unwrap();
        assert_eq!(reloaded.probe.admin_share, "ADMIN$");
        assert_eq!(reloaded.privesc, PrivescSettings::default());
    }
}
