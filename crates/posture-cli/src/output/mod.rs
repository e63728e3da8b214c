//! Output formatting for different formats.

use clap::ValueEnum;
use colored::Colorize;
use posture_core::{Finding, HostProbeResult, ProbeStatus, Protocol, Severity};
use posture_privesc::{DetectionReport, Unevaluated};
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::str::FromStr;
use tabled::{settings::Style, Table, Tabled};

/// Available output formats.
#[derive(Debug, Clone, Copy, Default, ValueEnum, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Pretty-printed tables with colors
    #[default]
    Pretty,
    /// JSON output
    Json,
    /// CSV output
    Csv,
    /// YAML output
    Yaml,
}

impl FromStr for OutputFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pretty" | "table" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            "csv" => Ok(Self::Csv),
            "yaml" | "yml" => Ok(Self::Yaml),
            _ => anyhow::bail!(
                "Unknown output format: {}\n\
                 Valid formats: pretty, json, csv, yaml",
                s
            ),
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pretty => write!(f, "pretty"),
            Self::Json => write!(f, "json"),
            Self::Csv => write!(f, "csv"),
            Self::Yaml => write!(f, "yaml"),
        }
    }
}

/// One finding as a table/CSV row.
#[derive(Debug, Clone, Tabled, Serialize)]
pub struct FindingRow {
    #[tabled(rename = "Category")]
    pub category: String,
    #[tabled(rename = "Severity")]
    pub severity: String,
    #[tabled(rename = "Subject")]
    pub subject: String,
    #[tabled(rename = "Detail")]
    pub detail: String,
}

impl From<&Finding> for FindingRow {
    fn from(f: &Finding) -> Self {
        Self {
            category: f.category().to_string(),
            severity: f.severity().to_string(),
            subject: f.subject_name().to_string(),
            detail: f.detail_line(),
        }
    }
}

/// One skipped item as a table/CSV row.
#[derive(Debug, Clone, Tabled, Serialize)]
pub struct UnevaluatedRow {
    #[tabled(rename = "Rule")]
    pub rule: String,
    #[tabled(rename = "Subject")]
    pub subject: String,
    #[tabled(rename = "Kind")]
    pub kind: String,
    #[tabled(rename = "Reason")]
    pub reason: String,
}

impl From<&Unevaluated> for UnevaluatedRow {
    fn from(u: &Unevaluated) -> Self {
        Self {
            rule: u.category.to_string(),
            subject: u.subject.clone(),
            kind: u.kind.clone(),
            reason: u.reason.clone(),
        }
    }
}

/// One host as a table/CSV row.
#[derive(Debug, Clone, Tabled, Serialize)]
pub struct ReachabilityRow {
    #[tabled(rename = "Host")]
    pub host: String,
    #[tabled(rename = "Ping")]
    pub ping: String,
    #[tabled(rename = "RemoteManagement")]
    pub remote_management: String,
    #[tabled(rename = "FileShare")]
    pub file_share: String,
    #[tabled(rename = "RPC")]
    pub rpc: String,
}

impl ReachabilityRow {
    /// Build a row, optionally colouring the statuses.
    pub fn new(result: &HostProbeResult, colorize: bool) -> Self {
        let cell = |protocol| {
            let status = result.status(protocol);
            if !colorize {
                return status.to_string();
            }
            match status {
                ProbeStatus::Success => status.to_string().green().to_string(),
                ProbeStatus::Fail => status.to_string().red().to_string(),
                ProbeStatus::Skipped => status.to_string().dimmed().to_string(),
            }
        };
        Self {
            host: result.host_name().to_string(),
            ping: cell(Protocol::Ping),
            remote_management: cell(Protocol::RemoteManagement),
            file_share: cell(Protocol::FileShare),
            rpc: cell(Protocol::RemoteProcedureCall),
        }
    }
}

/// Write rows as CSV with a header line.
pub fn write_csv<W: Write, T: Serialize>(writer: W, rows: &[T]) -> anyhow::Result<()> {
    let mut csv = csv::Writer::from_writer(writer);
    for row in rows {
        csv.serialize(row)?;
    }
    csv.flush()?;
    Ok(())
}

/// Print a detection report.
pub fn print_detection(report: &DetectionReport, format: OutputFormat) -> anyhow::Result<()> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(report)?),
        OutputFormat::Yaml => println!("{}", serde_yaml::to_string(report)?),
        OutputFormat::Csv => {
            let rows: Vec<FindingRow> = report.findings.iter().map(FindingRow::from).collect();
            write_csv(std::io::stdout().lock(), &rows)?;
        }
        OutputFormat::Pretty => print_detection_pretty(report),
    }
    Ok(())
}

fn severity_label(severity: Severity) -> String {
    match severity {
        Severity::High => "high".red().bold().to_string(),
        Severity::Medium => "medium".yellow().to_string(),
    }
}

fn print_detection_pretty(report: &DetectionReport) {
    println!("{}", "Privilege Escalation".bold().underline());
    if report.degraded {
        println!(
            "  {} some sources were unavailable; results are partial",
            "Degraded:".yellow().bold()
        );
    }
    println!();

    let rows: Vec<FindingRow> = report
        .findings
        .iter()
        .map(|f| FindingRow {
            severity: severity_label(f.severity()),
            ..FindingRow::from(f)
        })
        .collect();
    println!("{}", Table::new(&rows).with(Style::rounded()));

    if let Some(exploitable) = report
        .findings
        .iter()
        .find_map(Finding::always_install_elevated_exploitable)
    {
        let verdict = if exploitable {
            "enabled in both scopes (exploitable)".red().bold().to_string()
        } else {
            "not enabled in both scopes".green().to_string()
        };
        println!("  {} {}", "AlwaysInstallElevated:".bold(), verdict);
    }

    if !report.unevaluated.is_empty() {
        println!();
        println!("{}", "Could not evaluate:".bold());
        let rows: Vec<UnevaluatedRow> =
            report.unevaluated.iter().map(UnevaluatedRow::from).collect();
        println!("{}", Table::new(&rows).with(Style::rounded()));
    }
}

/// Machine-readable form of a sweep.
#[derive(Debug, Serialize)]
pub struct SweepView<'a> {
    pub cancelled: bool,
    pub hosts: &'a [HostProbeResult],
}

/// Print sweep results.
pub fn print_reachability(
    results: &[HostProbeResult],
    cancelled: bool,
    format: OutputFormat,
) -> anyhow::Result<()> {
    let view = SweepView {
        cancelled,
        hosts: results,
    };
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&view)?),
        OutputFormat::Yaml => println!("{}", serde_yaml::to_string(&view)?),
        OutputFormat::Csv => {
            let rows: Vec<ReachabilityRow> = results
                .iter()
                .map(|r| ReachabilityRow::new(r, false))
                .collect();
            write_csv(std::io::stdout().lock(), &rows)?;
        }
        OutputFormat::Pretty => {
            println!("{}", "Lateral Movement Reachability".bold().underline());
            if cancelled {
                println!(
                    "  {} sweep interrupted; unfinished hosts are Skipped",
                    "Cancelled:".yellow().bold()
                );
            }
            println!();
            let rows: Vec<ReachabilityRow> = results
                .iter()
                .map(|r| ReachabilityRow::new(r, true))
                .collect();
            println!("{}", Table::new(&rows).with(Style::rounded()));
        }
    }
    Ok(())
}

/// Machine-readable form of an `all` run: one document for both parts.
#[derive(Debug, Serialize)]
pub struct CombinedView<'a> {
    pub privesc: &'a DetectionReport,
    pub lateral: Option<SweepView<'a>>,
}

impl<'a> CombinedView<'a> {
    pub fn new(
        report: &'a DetectionReport,
        sweep: Option<(&'a [HostProbeResult], bool)>,
    ) -> Self {
        Self {
            privesc: report,
            lateral: sweep.map(|(hosts, cancelled)| SweepView { cancelled, hosts }),
        }
    }
}

/// Print an `all` run as a single JSON or YAML document.
pub fn print_combined(view: &CombinedView<'_>, format: OutputFormat) -> anyhow::Result<()> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(view)?),
        OutputFormat::Yaml => println!("{}", serde_yaml::to_string(view)?),
        OutputFormat::Csv | OutputFormat::Pretty => {
            print_detection(view.privesc, format)?;
            if let Some(sweep) = &view.lateral {
                println!();
                print_reachability(sweep.hosts, sweep.cancelled, format)?;
            }
        }
    }
    Ok(())
}
