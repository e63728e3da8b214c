//! Command implementations.

pub mod all;
pub mod config;
pub mod lateral;
pub mod privesc;

use anyhow::Result;
use colored::Colorize;
use std::path::PathBuf;

use crate::config::Config;
use crate::output::OutputFormat;
use crate::report::ReportSink;

/// Shared context for all commands.
#[derive(Debug, Clone)]
pub struct Context {
    /// Loaded configuration
    pub config: Config,

    /// File the configuration was loaded from
    pub config_path: PathBuf,

    /// Output format
    pub output_format: OutputFormat,

    /// Base directory for reports, `None` with `--no-save`
    pub results_dir: Option<PathBuf>,

    /// Verbose output
    pub verbose: bool,

    /// Disable colors
    pub no_color: bool,
}

impl Context {
    /// Open a fresh report directory unless saving is disabled.
    pub fn report_sink(&self) -> Result<Option<ReportSink>> {
        self.results_dir
            .as_deref()
            .map(ReportSink::create)
            .transpose()
    }

    /// Tell the user where the report went. Only for pretty output so that
    /// machine-readable stdout stays parseable.
    pub fn announce_report(&self, sink: &ReportSink) {
        tracing::info!(dir = %sink.dir().display(), "report saved");
        if self.output_format == OutputFormat::Pretty {
            println!();
            println!("{} {}", "Report saved to".bold(), sink.dir().display());
        }
    }
}
