//! Rule 2: service binaries a broad principal can modify or fully control.

use futures_util::stream::{self, StreamExt};
use posture_core::{AccessControlEntry, Finding, FindingCategory, ServiceRecord, SourceError};
use tracing::debug;

use crate::detector::Unevaluated;
use crate::principals::PrincipalMatcher;
use crate::source::AclSource;

/// Marker ending the executable part of a service command line.
const EXE_MARKER: &str = ".exe";

/// Derive the binary path from a service command line.
///
/// Takes everything up to and including the first `.exe` (any case), then
/// strips surrounding quotes. Returns `None` when there is no marker.
#[must_use]
pub fn binary_path(command_line: &str) -> Option<String> {
    // ASCII lowercasing keeps byte offsets stable
    let end = command_line.to_ascii_lowercase().find(EXE_MARKER)? + EXE_MARKER.len();
    let path = command_line[..end].trim().trim_matches('"').trim();
    (!path.is_empty()).then(|| path.to_string())
}

/// Entries granting a broad principal Modify or FullControl
pub fn qualifying_entries<'a>(
    acl: &'a [AccessControlEntry],
    principals: &PrincipalMatcher,
) -> Vec<&'a AccessControlEntry> {
    acl.iter()
        .filter(|ace| ace.grants_write_class() && principals.is_broad(&ace.identity))
        .collect()
}

/// Why a service was skipped.
enum Skip {
    /// No executable path to look up
    NoBinary(Unevaluated),
    /// The ACL lookup failed; the flag is set when the source was unreachable
    Lookup(Unevaluated, bool),
}

/// Result of rule 2 over all services.
#[derive(Debug, Default)]
pub struct ModifiableOutcome {
    /// At most one finding per service, in service order
    pub findings: Vec<Finding>,
    /// Services that could not be evaluated
    pub unevaluated: Vec<Unevaluated>,
    /// True if lookups were attempted and every one found the source unreachable
    pub source_unavailable: bool,
}

/// Evaluate one service; `Err` means it could not be evaluated.
async fn evaluate(
    service: &ServiceRecord,
    acl: &dyn AclSource,
    principals: &PrincipalMatcher,
) -> Result<Option<Finding>, Skip> {
    let unevaluated = |err: &SourceError| {
        Unevaluated::new(
            FindingCategory::ModifiableServiceBinary,
            service.name.clone(),
            err,
        )
    };

    let Some(path) = binary_path(&service.executable_path) else {
        let err = SourceError::Malformed(format!(
            "no executable marker in {:?}",
            service.executable_path
        ));
        debug!(service = %service.name, "skipping service without executable path");
        return Err(Skip::NoBinary(unevaluated(&err)));
    };

    let entries = match acl.acl(&path).await {
        Ok(entries) => entries,
        Err(err) => {
            debug!(service = %service.name, path = %path, error = %err, "ACL lookup failed");
            return Err(Skip::Lookup(unevaluated(&err), err.is_unavailable()));
        }
    };

    let hits = qualifying_entries(&entries, principals);
    if hits.is_empty() {
        return Ok(None);
    }

    let identities = hits
        .iter()
        .map(|ace| ace.identity.as_str())
        .collect::<Vec<_>>()
        .join("; ");
    let rights = hits
        .iter()
        .map(|ace| ace.rights_label())
        .collect::<Vec<_>>()
        .join("; ");

    Ok(Some(Finding::new(
        FindingCategory::ModifiableServiceBinary,
        service.name.clone(),
        [
            ("path", path),
            ("identities", identities),
            ("rights", rights),
        ],
    )))
}

/// Check every service, at most `concurrency` ACL lookups in flight.
///
/// Findings keep the order of `services`. At most one finding per service.
pub async fn check(
    services: &[ServiceRecord],
    acl: &dyn AclSource,
    principals: &PrincipalMatcher,
    concurrency: usize,
) -> ModifiableOutcome {
    let outcomes: Vec<_> = stream::iter(services)
        .map(|svc| evaluate(svc, acl, principals))
        .buffered(concurrency.max(1))
        .collect()
        .await;

    let mut result = ModifiableOutcome::default();
    let mut lookups = 0usize;
    let mut unreachable = 0usize;
    for outcome in outcomes {
        match outcome {
            Ok(Some(finding)) => {
                lookups += 1;
                result.findings.push(finding);
            }
            Ok(None) => lookups += 1,
            Err(Skip::NoBinary(skipped)) => result.unevaluated.push(skipped),
            Err(Skip::Lookup(skipped, source_down)) => {
                lookups += 1;
                unreachable += usize::from(source_down);
                result.unevaluated.push(skipped);
            }
        }
    }
    result.source_unavailable = lookups > 0 && unreachable == lookups;
    result
}
