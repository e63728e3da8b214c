use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Detail key carrying the machine-scope AlwaysInstallElevated flag
pub const HKLM_ENABLED: &str = "HKLM_Enabled";

/// Detail key carrying the user-scope AlwaysInstallElevated flag
pub const HKCU_ENABLED: &str = "HKCU_Enabled";

/// Kind of privilege-escalation vector
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum FindingCategory {
    /// Auto-start service with a space-containing, unquoted path
    UnquotedServicePath,
    /// Service binary writable by a broad principal
    ModifiableServiceBinary,
    /// Raw state of the AlwaysInstallElevated policy in both scopes
    AlwaysInstallElevated,
}

impl FindingCategory {
    /// Severity implied by the category
    #[must_use]
    pub const fn severity(&self) -> Severity {
        match self {
            Self::UnquotedServicePath => Severity::Medium,
            Self::ModifiableServiceBinary | Self::AlwaysInstallElevated => Severity::High,
        }
    }
}

impl std::fmt::Display for FindingCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnquotedServicePath => write!(f, "UnquotedServicePath"),
            Self::ModifiableServiceBinary => write!(f, "ModifiableServiceBinary"),
            Self::AlwaysInstallElevated => write!(f, "AlwaysInstallElevated"),
        }
    }
}

/// Finding severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Worth fixing, limited by preconditions
    Medium,
    /// Directly exploitable by an unprivileged user
    High,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Medium => write!(f, "medium"),
            Self::High => write!(f, "high"),
        }
    }
}

/// A detected privilege-escalation vector. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Finding {
    category: FindingCategory,
    subject_name: String,
    #[serde(default)]
    detail: BTreeMap<String, String>,
}

impl Finding {
    /// Build a finding from its category, subject and detail pairs
    pub fn new<K, V>(
        category: FindingCategory,
        subject_name: impl Into<String>,
        detail: impl IntoIterator<Item = (K, V)>,
    ) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            category,
            subject_name: subject_name.into(),
            detail: detail
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Finding category
    #[must_use]
    pub const fn category(&self) -> FindingCategory {
        self.category
    }

    /// Name of the affected service or policy
    #[must_use]
    pub fn subject_name(&self) -> &str {
        &self.subject_name
    }

    /// Detail fields
    #[must_use]
    pub const fn detail(&self) -> &BTreeMap<String, String> {
        &self.detail
    }

    /// Single detail value
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.detail.get(key).map(String::as_str)
    }

    /// Severity implied by the category
    #[must_use]
    pub const fn severity(&self) -> Severity {
        self.category.severity()
    }

    /// Detail rendered as `k=v; k=v` for tabular sinks
    #[must_use]
    pub fn detail_line(&self) -> String {
        self.detail
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join("; ")
    }

    /// For an AlwaysInstallElevated finding, whether both scopes are enabled.
    ///
    /// Returns `None` for any other category.
    #[must_use]
    pub fn always_install_elevated_exploitable(&self) -> Option<bool> {
        if self.category != FindingCategory::AlwaysInstallElevated {
            return None;
        }
        let flag = |key| self.get(key) == Some("true");
        Some(flag(HKLM_ENABLED) && flag(HKCU_ENABLED))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exploitable_needs_both_scopes() {
        let half = Finding::new(
            FindingCategory::AlwaysInstallElevated,
            "AlwaysInstallElevated",
            [(HKLM_ENABLED, "true"), (HKCU_ENABLED, "false")],
        );
        assert_eq!(half.always_install_elevated_exploitable(), Some(false));

        let both = Finding::new(
            FindingCategory::AlwaysInstallElevated,
            "AlwaysInstallElevated",
            [(HKLM_ENABLED, "true"), (HKCU_ENABLED, "true")],
        );
        assert_eq!(both.always_install_elevated_exploitable(), Some(true));
    }

    #[test]
    fn exploitable_is_none_for_other_categories() {
        let f = Finding::new(
            FindingCategory::UnquotedServicePath,
            "Foo",
            [("path", r"C:\Program Files\Foo\foo.exe")],
        );
        assert_eq!(f.always_install_elevated_exploitable(), None);
        assert_eq!(f.severity(), Severity::Medium);
    }

    #[test]
    fn detail_line_is_sorted_by_key() {
        let f = Finding::new(
            FindingCategory::ModifiableServiceBinary,
            "Foo",
            [("rights", "Modify"), ("identities", "Everyone")],
        );
        assert_eq!(f.detail_line(), "identities=Everyone; rights=Modify");
    }
}
