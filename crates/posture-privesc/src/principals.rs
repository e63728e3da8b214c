//! Matching identities against the set of broad, unprivileged principals.

use serde::{Deserialize, Serialize};

/// Identities treated as "anyone on the box" by default.
pub const DEFAULT_BROAD_PRINCIPALS: &[&str] = &[
    "Everyone",
    r"BUILTIN\Users",
    "Users",
    "Authenticated Users",
    r"NT AUTHORITY\Authenticated Users",
    "Domain Users",
];

/// Configurable set of broad/unprivileged principal patterns.
///
/// Comparison is case-insensitive. A pattern with a domain part
/// (`BUILTIN\Users`) must match the whole identity; a bare pattern
/// (`Users`) also matches the account part of a qualified identity
/// (`WS01\Users`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PrincipalMatcher {
    patterns: Vec<String>,
}

impl Default for PrincipalMatcher {
    fn default() -> Self {
        Self::new(DEFAULT_BROAD_PRINCIPALS.iter().copied())
    }
}

impl PrincipalMatcher {
    /// Build a matcher from patterns; blank patterns are ignored
    pub fn new<I, S>(patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            patterns: patterns
                .into_iter()
                .map(|p| p.as_ref().trim().to_lowercase())
                .filter(|p| !p.is_empty())
                .collect(),
        }
    }

    /// Patterns in normalised (lowercase) form
    #[must_use]
    pub fn patterns(&self) -> &[String] {
        &self.patterns
    }

    /// Returns true if `identity` is a broad principal
    #[must_use]
    pub fn is_broad(&self, identity: &str) -> bool {
        let identity = identity.trim().to_lowercase();
        let account = identity.rsplit('\\').next().unwrap_or(identity.as_str());

        self.patterns.iter().any(|pattern| {
            if pattern.contains('\\') {
                *pattern == identity
            } else {
                *pattern == identity || pattern == account
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_cover_windows_groups() {
        let m = PrincipalMatcher::default();
        assert!(m.is_broad("Everyone"));
        assert!(m.is_broad(r"BUILTIN\Users"));
        assert!(m.is_broad(r"builtin\users"));
        assert!(m.is_broad(r"NT AUTHORITY\Authenticated Users"));
        assert!(m.is_broad(r"CORP\Domain Users"));
    }

    #[test]
    fn privileged_identities_do_not_match() {
        let m = PrincipalMatcher::default();
        assert!(!m.is_broad(r"NT AUTHORITY\SYSTEM"));
        assert!(!m.is_broad(r"BUILTIN\Administrators"));
        assert!(!m.is_broad(r"CORP\svc_backup"));
    }

    #[test]
    fn qualified_pattern_needs_full_identity() {
        let m = PrincipalMatcher::new([r"BUILTIN\Guests"]);
        assert!(m.is_broad(r"BUILTIN\Guests"));
        assert!(!m.is_broad(r"WS01\Guests"));
        assert!(!m.is_broad("Guests"));
    }

    #[test]
    fn custom_unix_style_principals() {
        let m = PrincipalMatcher::new(["others", " ", "nogroup"]);
        assert_eq!(m.patterns().len(), 2);
        assert!(m.is_broad("Others"));
        assert!(!m.is_broad("root"));
    }
}
