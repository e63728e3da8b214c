//! Results directory writer.
//!
//! Each run gets a fresh `<base>/posture-<YYYYmmdd-HHMMSS>/` directory. A
//! numeric suffix is added if two runs land on the same second.

use anyhow::{Context as _, Result};
use chrono::{DateTime, Local};
use posture_core::{Finding, FindingCategory, HostProbeResult, ProbeStatus, Protocol};
use posture_privesc::DetectionReport;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::output::{write_csv, FindingRow, ReachabilityRow, UnevaluatedRow};

pub const FINDINGS_FILE: &str = "privesc_findings.csv";
pub const UNEVALUATED_FILE: &str = "privesc_unevaluated.csv";
pub const LATERAL_FILE: &str = "lateral_movement.csv";
pub const SUMMARY_FILE: &str = "summary.json";

/// Privilege-escalation part of `summary.json`.
#[derive(Debug, Serialize)]
pub struct PrivescSummary {
    pub findings: BTreeMap<String, usize>,
    pub unevaluated: usize,
    pub degraded: bool,
    pub always_install_elevated_exploitable: Option<bool>,
}

impl From<&DetectionReport> for PrivescSummary {
    fn from(report: &DetectionReport) -> Self {
        let findings = [
            FindingCategory::UnquotedServicePath,
            FindingCategory::ModifiableServiceBinary,
            FindingCategory::AlwaysInstallElevated,
        ]
        .into_iter()
        .map(|c| (c.to_string(), report.by_category(c).count()))
        .collect();

        Self {
            findings,
            unevaluated: report.unevaluated.len(),
            degraded: report.degraded,
            always_install_elevated_exploitable: report
                .findings
                .iter()
                .find_map(Finding::always_install_elevated_exploitable),
        }
    }
}

/// Lateral-movement part of `summary.json`.
#[derive(Debug, Serialize)]
pub struct LateralSummary {
    pub hosts: usize,
    pub cancelled: bool,
    /// Hosts with a Success per protocol column.
    pub reachable: BTreeMap<&'static str, usize>,
}

impl LateralSummary {
    pub fn new(results: &[HostProbeResult], cancelled: bool) -> Self {
        let reachable = Protocol::ALL
            .iter()
            .map(|&p| {
                let count = results
                    .iter()
                    .filter(|r| r.status(p) == ProbeStatus::Success)
                    .count();
                (p.column(), count)
            })
            .collect();
        Self {
            hosts: results.len(),
            cancelled,
            reachable,
        }
    }
}

/// Contents of `summary.json`.
#[derive(Debug, Serialize)]
pub struct Summary {
    pub generated_at: DateTime<Local>,
    pub version: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub privesc: Option<PrivescSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lateral: Option<LateralSummary>,
}

impl Summary {
    pub fn new() -> Self {
        Self {
            generated_at: Local::now(),
            version: env!("CARGO_PKG_VERSION"),
            privesc: None,
            lateral: None,
        }
    }
}

impl Default for Summary {
    fn default() -> Self {
        Self::new()
    }
}

/// Writes one run's report files into a single directory.
#[derive(Debug)]
pub struct ReportSink {
    dir: PathBuf,
}

impl ReportSink {
    /// Create a fresh timestamped directory under `base`.
    pub fn create(base: &Path) -> Result<Self> {
        Self::create_at(base, Local::now())
    }

    fn create_at(base: &Path, now: DateTime<Local>) -> Result<Self> {
        std::fs::create_dir_all(base)
            .with_context(|| format!("creating results directory {}", base.display()))?;

        let stem = format!("posture-{}", now.format("%Y%m%d-%H%M%S"));
        let mut dir = base.join(&stem);
        let mut suffix = 1;
        loop {
            match std::fs::create_dir(&dir) {
                Ok(()) => break,
                Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                    dir = base.join(format!("{stem}-{suffix}"));
                    suffix += 1;
                }
                Err(e) => {
                    return Err(e).with_context(|| format!("creating {}", dir.display()));
                }
            }
        }

        tracing::debug!(dir = %dir.display(), "created results directory");
        Ok(Self { dir })
    }

    /// Directory holding this run's files.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn write_rows<T: Serialize>(&self, name: &str, rows: &[T]) -> Result<PathBuf> {
        let path = self.dir.join(name);
        let file = std::fs::File::create(&path)
            .with_context(|| format!("creating {}", path.display()))?;
        write_csv(file, rows)?;
        Ok(path)
    }

    /// Write the findings and unevaluated CSV files.
    pub fn write_detection(&self, report: &DetectionReport) -> Result<()> {
        let findings: Vec<FindingRow> = report.findings.iter().map(FindingRow::from).collect();
        self.write_rows(FINDINGS_FILE, &findings)?;

        let unevaluated: Vec<UnevaluatedRow> =
            report.unevaluated.iter().map(UnevaluatedRow::from).collect();
        self.write_rows(UNEVALUATED_FILE, &unevaluated)?;
        Ok(())
    }

    /// Write the per-host reachability CSV.
    pub fn write_reachability(&self, results: &[HostProbeResult]) -> Result<()> {
        let rows: Vec<ReachabilityRow> = results
            .iter()
            .map(|r| ReachabilityRow::new(r, false))
            .collect();
        self.write_rows(LATERAL_FILE, &rows)?;
        Ok(())
    }

    /// Write `summary.json`.
    pub fn write_summary(&self, summary: &Summary) -> Result<()> {
        let path = self.dir.join(SUMMARY_FILE);
        let json = serde_json::to_string_pretty(summary)?;
        std::fs::write(&path, json).with_context(|| format!("writing {}", path.display()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tempfile::tempdir;

    fn fixed_time() -> DateTime<Local> {
        Local.with_ymd_and_hms(2024, 3, 9, 14, 5, 7).single().unwrap()
    }

    #[test]
    fn directory_name_is_timestamped_and_unique() {
        let base = tempdir().unwrap();
        let first = ReportSink::create_at(base.path(), fixed_time()).unwrap();
        let second = ReportSink::create_at(base.path(), fixed_time()).unwrap();

        assert_eq!(first.dir(), base.path().join("posture-20240309-140507"));
        assert_eq!(second.dir(), base.path().join("posture-20240309-140507-1"));
    }

    #[test]
    fn writes_all_files_into_one_directory() {
        let base = tempdir().unwrap();
        let sink = ReportSink::create(&base.path().join("results")).unwrap();

        let report = DetectionReport {
            findings: vec![Finding::new(
                FindingCategory::UnquotedServicePath,
                "Foo",
                [("path", r"C:\Program Files\Foo\foo.exe")],
            )],
            ..DetectionReport::default()
        };
        let results = vec![
            HostProbeResult::unreachable("dc01"),
            HostProbeResult::reachable(
                "ws02",
                ProbeStatus::Success,
                ProbeStatus::Success,
                ProbeStatus::Fail,
            ),
        ];

        sink.write_detection(&report).unwrap();
        sink.write_reachability(&results).unwrap();
        let summary = Summary {
            privesc: Some(PrivescSummary::from(&report)),
            lateral: Some(LateralSummary::new(&results, false)),
            ..Summary::new()
        };
        sink.write_summary(&summary).unwrap();

        let mut names: Vec<_> = std::fs::read_dir(sink.dir())
            .unwrap()
            .map(|e| e.unwrap().file_name().into_string().unwrap())
            .collect();
        names.sort();
        assert_eq!(
            names,
            vec![LATERAL_FILE, FINDINGS_FILE, UNEVALUATED_FILE, SUMMARY_FILE]
        );

        let findings = std::fs::read_to_string(sink.dir().join(FINDINGS_FILE)).unwrap();
        assert!(findings.starts_with("category,severity,subject,detail\n"));
        assert!(findings.contains("Foo"));

        let summary: serde_json::Value = serde_json::from_str(
            &std::fs::read_to_string(sink.dir().join(SUMMARY_FILE)).unwrap(),
        )
        .unwrap();
        assert_eq!(summary["lateral"]["hosts"], 2);
        assert_eq!(summary["lateral"]["reachable"]["ping"], 1);
        assert_eq!(summary["lateral"]["reachable"]["rpc"], 0);
        assert_eq!(summary["privesc"]["unevaluated"], 0);
    }
}
