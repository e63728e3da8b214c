//! Host list derivation for the lateral-movement sweep.
//!
//! Hosts come from `--hosts a,b,c`, a plain `--hosts-file`, or a directory
//! computer-object export (`--computers`). Order is kept and nothing is
//! deduplicated; the sweep reports one row per listed host.

use anyhow::{Context as _, Result};
use std::path::Path;

/// Split a comma-separated host list, dropping empty entries.
pub fn parse_host_list(list: &str) -> Vec<String> {
    list.split(',')
        .map(str::trim)
        .filter(|h| !h.is_empty())
        .map(String::from)
        .collect()
}

/// One host per line; blank lines and `#` comments are ignored.
pub fn parse_hosts_file(content: &str) -> Vec<String> {
    content
        .lines()
        .map(|line| line.split('#').next().unwrap_or_default().trim())
        .filter(|h| !h.is_empty())
        .map(String::from)
        .collect()
}

/// Read a hosts file from disk.
pub fn read_hosts_file(path: &Path) -> Result<Vec<String>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("reading hosts file {}", path.display()))?;
    Ok(parse_hosts_file(&content))
}

fn is_enabled(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "true" | "1" | "yes"
    )
}

/// Parse a computer-object export.
///
/// Needs a `Name` or `DNSHostName` column; `DNSHostName` is preferred when
/// non-empty. Rows whose `Enabled` column is not true are dropped. Without an
/// `Enabled` column every row is used.
pub fn parse_computer_export<R: std::io::Read>(reader: R) -> Result<Vec<String>> {
    let mut csv = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(reader);

    let headers = csv.headers().context("reading export header")?.clone();
    let column = |name: &str| headers.iter().position(|h| h.eq_ignore_ascii_case(name));
    let name_col = column("Name");
    let dns_col = column("DNSHostName");
    let enabled_col = column("Enabled");

    if name_col.is_none() && dns_col.is_none() {
        anyhow::bail!("computer export needs a Name or DNSHostName column");
    }

    let mut hosts = Vec::new();
    for (line, record) in csv.records().enumerate() {
        let record = record.with_context(|| format!("reading export row {}", line + 2))?;
        let field = |col: Option<usize>| {
            col.and_then(|c| record.get(c))
                .filter(|v| !v.is_empty())
                .map(String::from)
        };

        if let Some(enabled) = enabled_col {
            if !record.get(enabled).is_some_and(is_enabled) {
                tracing::debug!(row = line + 2, "skipping disabled computer");
                continue;
            }
        }

        if let Some(host) = field(dns_col).or_else(|| field(name_col)) {
            hosts.push(host);
        }
    }
    Ok(hosts)
}

/// Read a computer-object export from disk.
pub fn read_computer_export(path: &Path) -> Result<Vec<String>> {
    let file = std::fs::File::open(path)
        .with_context(|| format!("opening computer export {}", path.display()))?;
    parse_computer_export(file).with_context(|| format!("parsing {}", path.display()))
}

/// Combine the host sources: explicit hosts and the hosts file first, then
/// the computer export only if neither gave anything.
pub fn resolve(
    hosts: Option<&str>,
    hosts_file: Option<&Path>,
    computers: Option<&Path>,
) -> Result<Vec<String>> {
    let mut list = hosts.map(parse_host_list).unwrap_or_default();
    if let Some(path) = hosts_file {
        list.extend(read_hosts_file(path)?);
    }
    if list.is_empty() {
        if let Some(path) = computers {
            list = read_computer_export(path)?;
        }
    }
    Ok(list)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn host_list_trims_and_keeps_duplicates() {
        assert_eq!(
            parse_host_list(" dc01, ws02,,dc01 "),
            vec!["dc01", "ws02", "dc01"]
        );
        assert!(parse_host_list("").is_empty());
    }

    #[test]
    fn hosts_file_skips_comments() {
        let hosts = parse_hosts_file("# lab\ndc01\n\n  ws02  # finance\n#ws03\n");
        assert_eq!(hosts, vec!["dc01", "ws02"]);
    }

    #[test]
    fn computer_export_keeps_enabled_rows() {
        let export = "\
Name,DNSHostName,Enabled
DC01,dc01.corp.local,True
WS02,,True
OLD03,old03.corp.local,False
WS04,ws04.corp.local,true
";
        let hosts = parse_computer_export(export.as_bytes()).unwrap();
        assert_eq!(hosts, vec!["dc01.corp.local", "WS02", "ws04.corp.local"]);
    }

    #[test]
    fn computer_export_without_name_columns_fails() {
        let export = "Hostname,Enabled\nfoo,True\n";
        assert!(parse_computer_export(export.as_bytes()).is_err());
    }

    #[test]
    fn computer_export_without_enabled_uses_all_rows() {
        let export = "Name\nA\nB\n";
        assert_eq!(parse_computer_export(export.as_bytes()).unwrap(), vec!["A", "B"]);
    }

    #[test]
    fn explicit_hosts_win_over_export() {
        let dir = tempdir().unwrap();
        let export = dir.path().join("computers.csv");
        std::fs::write(&export, "Name,Enabled\nEXPORTED,True\n").unwrap();
        let file = dir.path().join("hosts.txt");
        std::fs::write(&file, "fromfile\n").unwrap();

        let hosts = resolve(Some("a"), Some(&file), Some(&export)).unwrap();
        assert_eq!(hosts, vec!["a", "fromfile"]);

        let hosts = resolve(None, None, Some(&export)).unwrap();
        assert_eq!(hosts, vec!["EXPORTED"]);

        assert!(resolve(None, None, None).unwrap().is_empty());
    }
}
