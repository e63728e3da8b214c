//! Parsing `icacls <path>` output into access-control entries.

use posture_core::{AccessControlEntry, AccessControlList, Right, SourceError};
use std::collections::BTreeSet;

/// Inheritance and propagation flags; they say nothing about rights.
const FLAGS: &[&str] = &["I", "OI", "CI", "IO", "NP"];

fn rights_for(token: &str) -> &'static [Right] {
    match token {
        "F" | "GA" => &[Right::FullControl],
        "M" => &[Right::Modify],
        "RX" => &[Right::Read, Right::Execute],
        "R" | "RD" | "RA" | "REA" | "GR" => &[Right::Read],
        "W" | "WD" | "AD" | "WA" | "WEA" | "GW" => &[Right::Write],
        "X" | "GE" => &[Right::Execute],
        _ => &[Right::Other],
    }
}

/// Parse one `IDENTITY:(flags)(rights)` line. Deny entries yield `None`.
fn parse_entry(line: &str) -> Option<AccessControlEntry> {
    let split = line.find(":(")?;
    let identity = line[..split].trim();
    if identity.is_empty() {
        return None;
    }

    let mut rights = BTreeSet::new();
    let groups = line[split + 1..]
        .split(')')
        .map(|g| g.trim().trim_start_matches('('))
        .filter(|g| !g.is_empty());
    for group in groups {
        for token in group.split(',').map(str::trim) {
            if token == "DENY" {
                return None;
            }
            if !FLAGS.contains(&token) {
                rights.extend(rights_for(token).iter().copied());
            }
        }
    }

    Some(AccessControlEntry {
        identity: identity.to_string(),
        rights,
    })
}

/// Parse the listing icacls prints for `path`.
///
/// The first line is prefixed with the path itself; continuation lines are
/// indented; the trailer (`Successfully processed ...`) is ignored.
#[must_use]
pub fn parse_acl(path: &str, output: &str) -> AccessControlList {
    output
        .lines()
        .map(|line| {
            let line = line.trim();
            line.get(..path.len())
                .filter(|prefix| prefix.eq_ignore_ascii_case(path))
                .map_or(line, |_| line[path.len()..].trim())
        })
        .filter(|line| !line.is_empty() && !line.starts_with("Successfully processed"))
        .filter_map(parse_entry)
        .collect()
}

/// Map a failed icacls run to a lookup error.
#[must_use]
pub fn classify_failure(path: &str, text: &str) -> SourceError {
    let lower = text.to_lowercase();
    if lower.contains("cannot find") || lower.contains("not found") {
        SourceError::NotFound(path.to_string())
    } else if lower.contains("access is denied") {
        SourceError::AccessDenied(path.to_string())
    } else {
        SourceError::Unavailable(format!("icacls {path}: {}", text.trim()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LISTING: &str = r"C:\Program Files\Foo\foo.exe NT AUTHORITY\SYSTEM:(I)(F)
                             BUILTIN\Administrators:(I)(F)
                             BUILTIN\Users:(I)(RX)
                             Everyone:(M)
                             CORP\intern:(DENY)(W)
                             APPLICATION PACKAGE AUTHORITY\ALL APPLICATION PACKAGES:(I)(RD,WD,AD)

Successfully processed 1 files; Failed processing 0 files
";

    #[test]
    fn parses_listing() {
        let acl = parse_acl(r"C:\Program Files\Foo\foo.exe", LISTING);
        let identities: Vec<_> = acl.iter().map(|a| a.identity.as_str()).collect();
        assert_eq!(
            identities,
            [
                r"NT AUTHORITY\SYSTEM",
                r"BUILTIN\Administrators",
                r"BUILTIN\Users",
                "Everyone",
                r"APPLICATION PACKAGE AUTHORITY\ALL APPLICATION PACKAGES",
            ]
        );

        assert!(acl[0].rights.contains(&Right::FullControl));
        assert_eq!(
            acl[2].rights.iter().copied().collect::<Vec<_>>(),
            [Right::Read, Right::Execute]
        );
        assert!(acl[3].grants_write_class());
        assert!(!acl[4].grants_write_class());
    }

    #[test]
    fn path_prefix_is_case_insensitive() {
        let acl = parse_acl(r"c:\apps\x.exe", r"C:\Apps\x.exe Everyone:(F)");
        assert_eq!(acl.len(), 1);
        assert_eq!(acl[0].identity, "Everyone");
    }

    #[test]
    fn failures_are_classified() {
        let p = r"C:\x.exe";
        assert_eq!(
            classify_failure(p, "C:\\x.exe: The system cannot find the file specified."),
            SourceError::NotFound(p.into())
        );
        assert_eq!(
            classify_failure(p, "C:\\x.exe: Access is denied."),
            SourceError::AccessDenied(p.into())
        );
        assert!(classify_failure(p, "something odd").is_unavailable());
    }
}
