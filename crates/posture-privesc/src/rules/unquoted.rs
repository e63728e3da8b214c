//! Rule 1: auto-start services with an unquoted, space-containing path.

use posture_core::{Finding, FindingCategory, ServiceRecord};

/// Returns true if the command line starts with a quoted token.
///
/// `"C:\Program Files\x.exe" -k svc` counts as quoted: the executable part
/// is delimited even though arguments follow.
#[must_use]
pub fn is_quoted(path: &str) -> bool {
    path.trim()
        .strip_prefix('"')
        .is_some_and(|rest| rest.contains('"'))
}

/// Returns true if the service path is exploitable through path resolution
#[must_use]
pub fn is_unquoted_with_spaces(path: &str) -> bool {
    path.contains(' ') && !is_quoted(path)
}

/// Emit a finding for every auto-start service with an unquoted path
#[must_use]
pub fn check(services: &[ServiceRecord]) -> Vec<Finding> {
    services
        .iter()
        .filter(|svc| svc.start_mode.is_auto())
        .filter(|svc| is_unquoted_with_spaces(&svc.executable_path))
        .map(|svc| {
            Finding::new(
                FindingCategory::UnquotedServicePath,
                svc.name.clone(),
                [
                    ("path", svc.executable_path.clone()),
                    ("start_mode", svc.start_mode.to_string()),
                ],
            )
        })
        .collect()
}
