//! Offline sources loaded from an exported JSON snapshot.

use async_trait::async_trait;
use posture_core::{AccessControlList, ServiceRecord, SourceError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

use crate::source::{AclSource, PolicyScope, PolicySource, ServiceInventory};

/// Policy values per scope, keyed by value name.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PolicySnapshot {
    /// Machine-scope values
    #[serde(default, alias = "Machine")]
    pub machine: BTreeMap<String, u32>,
    /// User-scope values
    #[serde(default, alias = "User")]
    pub user: BTreeMap<String, u32>,
}

/// Previously exported host state.
///
/// ```json
/// {
///   "host": "ws01",
///   "services": [{"name": "Foo", "executable_path": "C:\\Foo\\foo.exe", "start_mode": "Auto"}],
///   "acls": {"C:\\Foo\\foo.exe": [{"identity": "Everyone", "rights": ["Modify"]}]},
///   "denied": ["C:\\Locked\\svc.exe"],
///   "policies": {"machine": {"AlwaysInstallElevated": 1}, "user": {}}
/// }
/// ```
///
/// A missing `services` or `policies` section models an unreachable source.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SnapshotSource {
    /// Host the snapshot was taken on
    #[serde(default)]
    pub host: Option<String>,
    /// Service inventory
    #[serde(default)]
    pub services: Option<Vec<ServiceRecord>>,
    /// ACL per binary path
    #[serde(default)]
    pub acls: BTreeMap<String, AccessControlList>,
    /// Paths whose ACL could not be read
    #[serde(default)]
    pub denied: Vec<String>,
    /// Policy store
    #[serde(default)]
    pub policies: Option<PolicySnapshot>,
}

impl SnapshotSource {
    /// Parse a snapshot from JSON
    pub fn from_json(json: &str) -> posture_core::Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load a snapshot file
    pub async fn load(path: &Path) -> posture_core::Result<Self> {
        let content = tokio::fs::read_to_string(path).await?;
        Self::from_json(&content)
    }
}

#[async_trait]
impl ServiceInventory for SnapshotSource {
    async fn services(&self) -> Result<Vec<ServiceRecord>, SourceError> {
        self.services
            .clone()
            .ok_or_else(|| SourceError::Unavailable("snapshot has no service inventory".into()))
    }
}

#[async_trait]
impl AclSource for SnapshotSource {
    async fn acl(&self, path: &str) -> Result<AccessControlList, SourceError> {
        if self.denied.iter().any(|p| p.eq_ignore_ascii_case(path)) {
            return Err(SourceError::AccessDenied(path.to_string()));
        }
        self.acls
            .get(path)
            .or_else(|| {
                self.acls
                    .iter()
                    .find(|(p, _)| p.eq_ignore_ascii_case(path))
                    .map(|(_, acl)| acl)
            })
            .cloned()
            .ok_or_else(|| SourceError::NotFound(path.to_string()))
    }
}

#[async_trait]
impl PolicySource for SnapshotSource {
    async fn dword(
        &self,
        scope: PolicyScope,
        _key: &str,
        value: &str,
    ) -> Result<Option<u32>, SourceError> {
        let policies = self
            .policies
            .as_ref()
            .ok_or_else(|| SourceError::Unavailable("snapshot has no policy store".into()))?;
        let values = match scope {
            PolicyScope::Machine => &policies.machine,
            PolicyScope::User => &policies.user,
        };
        Ok(values.get(value).copied())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detector::Detector;
    use crate::rules::install_elevated::{ALWAYS_INSTALL_ELEVATED, INSTALLER_POLICY_KEY};
    use posture_core::{FindingCategory, HKCU_ENABLED, HKLM_ENABLED};
    use std::io::Write;
    use std::sync::Arc;
    use tempfile::NamedTempFile;

    const SNAPSHOT: &str = r#"{
        "host": "ws01",
        "services": [
            {"name": "Foo", "executable_path": "C:\\Program Files\\Foo\\foo.exe", "start_mode": "Auto"},
            {"name": "Bar", "executable_path": "\"C:\\Program Files\\Bar\\bar.exe\"", "start_mode": "Auto"},
            {"name": "Locked", "executable_path": "C:\\Locked\\svc.exe", "start_mode": "Manual"}
        ],
        "acls": {
            "C:\\Program Files\\Bar\\bar.exe": [
                {"identity": "BUILTIN\\Users", "rights": ["FullControl"]}
            ]
        },
        "denied": ["c:\\locked\\svc.exe"],
        "policies": {"machine": {"AlwaysInstallElevated": 1}}
    }"#;

    #[tokio::test]
    async fn snapshot_drives_all_rules() {
        let mut tmp = NamedTempFile::new().unwrap();
        write!(tmp, "{SNAPSHOT}").unwrap();
        tmp.flush().unwrap();

        let snapshot = SnapshotSource::load(tmp.path()).await.unwrap();
        assert_eq!(snapshot.host.as_deref(), Some("ws01"));

        let report = Detector::from_sources(Arc::new(snapshot)).run().await.unwrap();

        let unquoted: Vec<_> = report
            .by_category(FindingCategory::UnquotedServicePath)
            .map(|f| f.subject_name())
            .collect();
        assert_eq!(unquoted, ["Foo"]);

        let modifiable: Vec<_> = report
            .by_category(FindingCategory::ModifiableServiceBinary)
            .map(|f| f.subject_name())
            .collect();
        assert_eq!(modifiable, ["Bar"]);

        let policy = report
            .by_category(FindingCategory::AlwaysInstallElevated)
            .next()
            .unwrap();
        assert_eq!(policy.get(HKLM_ENABLED), Some("true"));
        assert_eq!(policy.get(HKCU_ENABLED), Some("false"));

        let skipped: Vec<_> = report
            .unevaluated
            .iter()
            .map(|u| (u.subject.as_str(), u.kind.as_str()))
            .collect();
        assert_eq!(skipped, [("Foo", "not_found"), ("Locked", "access_denied")]);
    }

    #[tokio::test]
    async fn policy_scopes_accept_capitalised_keys() {
        let snapshot = SnapshotSource::from_json(
            r#"{"policies": {"Machine": {"AlwaysInstallElevated": 1}, "User": {"AlwaysInstallElevated": 0}}}"#,
        )
        .unwrap();
        let machine = snapshot
            .dword(PolicyScope::Machine, INSTALLER_POLICY_KEY, ALWAYS_INSTALL_ELEVATED)
            .await
            .unwrap();
        let user = snapshot
            .dword(PolicyScope::User, INSTALLER_POLICY_KEY, ALWAYS_INSTALL_ELEVATED)
            .await
            .unwrap();
        assert_eq!(machine, Some(1));
        assert_eq!(user, Some(0));
    }

    #[tokio::test]
    async fn missing_sections_are_unavailable() {
        let snapshot = SnapshotSource::from_json("{}").unwrap();
        assert!(snapshot.services().await.unwrap_err().is_unavailable());
        assert!(snapshot
            .dword(PolicyScope::User, INSTALLER_POLICY_KEY, ALWAYS_INSTALL_ELEVATED)
            .await
            .unwrap_err()
            .is_unavailable());

        let err = Detector::from_sources(Arc::new(snapshot))
            .run()
            .await
            .unwrap_err();
        assert!(err.is_nothing_to_scan());
    }

    #[test]
    fn invalid_json_is_an_error() {
        assert!(SnapshotSource::from_json("{").is_err());
    }
}
