//! Command-line argument definitions using clap.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::output::OutputFormat;

/// Host and domain security-posture scanner
///
/// Looks for local privilege-escalation paths on this machine and measures
/// how far an attacker could move laterally across a list of hosts.
#[derive(Parser, Debug)]
#[command(name = "posturescan")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Config file (defaults to the per-user config path)
    #[arg(long, env = "POSTURESCAN_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Output format
    #[arg(short, long, global = true, value_enum)]
    pub output: Option<OutputFormat>,

    /// Base directory for saved reports
    #[arg(long, global = true)]
    pub results_dir: Option<PathBuf>,

    /// Print results without saving a report directory
    #[arg(long, global = true)]
    pub no_save: bool,

    /// Increase verbosity
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Detect local privilege-escalation opportunities
    Privesc(PrivescArgs),

    /// Probe lateral-movement reachability across hosts
    Lateral(LateralArgs),

    /// Run the detector and the reachability sweep
    All(AllArgs),

    /// Manage CLI configuration
    Config(ConfigArgs),
}

// ============================================================================
// Privesc command
// ============================================================================

#[derive(Args, Debug, Clone, Default)]
pub struct PrivescArgs {
    /// Evaluate an exported JSON snapshot instead of the live system
    #[arg(long, value_name = "FILE")]
    pub snapshot: Option<PathBuf>,

    /// Treat this identity as a broad principal (repeatable, replaces config)
    #[arg(long = "principal", value_name = "IDENTITY")]
    pub principals: Vec<String>,
}

// ============================================================================
// Lateral command
// ============================================================================

/// Where the host list comes from.
#[derive(Args, Debug, Clone, Default)]
pub struct HostArgs {
    /// Comma-separated host names
    #[arg(long, value_name = "HOSTS")]
    pub hosts: Option<String>,

    /// File with one host per line
    #[arg(long, value_name = "FILE")]
    pub hosts_file: Option<PathBuf>,

    /// Directory computer-object export (CSV with Name/DNSHostName/Enabled)
    #[arg(long, value_name = "CSV")]
    pub computers: Option<PathBuf>,
}

#[derive(Args, Debug, Clone, Default)]
pub struct LateralArgs {
    #[command(flatten)]
    pub hosts: HostArgs,

    /// Hosts probed at the same time
    #[arg(short = 'j', long)]
    pub concurrency: Option<usize>,

    /// Ping timeout in milliseconds
    #[arg(long, value_name = "MS")]
    pub ping_timeout_ms: Option<u64>,

    /// Timeout for each remote-management, share and RPC check in milliseconds
    #[arg(long, value_name = "MS")]
    pub timeout_ms: Option<u64>,

    /// Administrative share to look for
    #[arg(long, value_name = "SHARE")]
    pub admin_share: Option<String>,
}

// ============================================================================
// All command
// ============================================================================

#[derive(Args, Debug, Clone, Default)]
pub struct AllArgs {
    #[command(flatten)]
    pub privesc: PrivescArgs,

    #[command(flatten)]
    pub lateral: LateralArgs,
}

// ============================================================================
// Config command
// ============================================================================

#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommands,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show current configuration
    Show,

    /// Set a configuration value
    Set {
        /// Configuration key (e.g., output_format, results_dir, probe.concurrency)
        key: String,
        /// Value to set
        value: String,
    },

    /// Write a config file with default values
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Show configuration file path
    Path,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn all_accepts_both_flag_sets() {
        let cli = Cli::try_parse_from([
            "posturescan",
            "all",
            "--snapshot",
            "host.json",
            "--hosts",
            "a,b",
            "-j",
            "4",
            "-o",
            "json",
        ])
        .unwrap();
        let Commands::All(args) = cli.command else {
            panic!("expected all");
        };
        assert_eq!(args.privesc.snapshot, Some(PathBuf::from("host.json")));
        assert_eq!(args.lateral.hosts.hosts.as_deref(), Some("a,b"));
        assert_eq!(args.lateral.concurrency, Some(4));
        assert_eq!(cli.output, Some(OutputFormat::Json));
    }
}
