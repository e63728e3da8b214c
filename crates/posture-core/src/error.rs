use thiserror::Error;

/// Result type alias for scan-level operations
pub type Result<T> = std::result::Result<T, ScanError>;

/// Why a single lookup against a collaborator did not produce data.
///
/// None of these abort a scan: the affected rule skips the item and the
/// run carries on.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SourceError {
    /// The collaborator could not be reached at all
    #[error("source unavailable: {0}")]
    Unavailable(String),

    /// The lookup was denied
    #[error("access denied: {0}")]
    AccessDenied(String),

    /// The object being looked up does not exist
    #[error("not found: {0}")]
    NotFound(String),

    /// The lookup exceeded its time bound
    #[error("lookup timed out after {0} ms")]
    Timeout(u64),

    /// The source returned data of an unexpected shape
    #[error("malformed input: {0}")]
    Malformed(String),
}

impl SourceError {
    /// Short machine-friendly label for reports
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Unavailable(_) => "unavailable",
            Self::AccessDenied(_) => "access_denied",
            Self::NotFound(_) => "not_found",
            Self::Timeout(_) => "timeout",
            Self::Malformed(_) => "malformed",
        }
    }

    /// Returns true if the source itself could not be reached
    #[must_use]
    pub const fn is_unavailable(&self) -> bool {
        matches!(self, Self::Unavailable(_))
    }
}

/// Errors from a single connectivity check against a remote host
#[derive(Error, Debug)]
pub enum ProbeError {
    /// The check exceeded its time bound
    #[error("check timed out after {0} ms")]
    Timeout(u64),

    /// Network I/O error
    #[error("network error: {0}")]
    Io(#[from] std::io::Error),

    /// The host answered negatively (no echo reply, share missing, ...)
    #[error("host unreachable: {0}")]
    Unreachable(String),

    /// A helper command could not be run
    #[error("command failed: {0}")]
    Command(String),
}

/// Errors that abort a whole scan run
#[derive(Error, Debug)]
pub enum ScanError {
    /// Every source was unavailable up front, there is nothing to evaluate
    #[error("nothing to scan: all sources unavailable ({0})")]
    NothingToScan(String),

    /// Configuration is invalid
    #[error("configuration error: {0}")]
    Config(String),

    /// Filesystem I/O error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing/serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ScanError {
    /// Returns true if the run failed because nothing could be scanned
    #[must_use]
    pub const fn is_nothing_to_scan(&self) -> bool {
        matches!(self, Self::NothingToScan(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn source_error_kinds_are_distinct() {
        let kinds = [
            SourceError::Unavailable(String::new()).kind(),
            SourceError::AccessDenied(String::new()).kind(),
            SourceError::NotFound(String::new()).kind(),
            SourceError::Timeout(0).kind(),
            SourceError::Malformed(String::new()).kind(),
        ];
        for (i, a) in kinds.iter().enumerate() {
            for b in &kinds[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }

    #[test]
    fn only_unavailable_counts_as_unavailable() {
        assert!(SourceError::Unavailable("wmi".into()).is_unavailable());
        assert!(!SourceError::AccessDenied("acl".into()).is_unavailable());
    }
}
