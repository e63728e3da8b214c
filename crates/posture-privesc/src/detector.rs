//! Detector entry points: run all three rules and assemble a report.

use posture_core::{Finding, FindingCategory, ScanError, ServiceRecord, SourceError};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};

use crate::principals::PrincipalMatcher;
use crate::rules::{install_elevated, modifiable, unquoted};
use crate::source::{AclSource, PolicySource, ServiceInventory};

/// Default number of concurrent ACL lookups.
pub const DEFAULT_ACL_CONCURRENCY: usize = 8;

/// An item a rule could not evaluate. Distinct from "no finding".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Unevaluated {
    /// Rule that skipped the item
    pub category: FindingCategory,
    /// Service name or policy key
    pub subject: String,
    /// Failure kind (`not_found`, `access_denied`, ...)
    pub kind: String,
    /// Human-readable reason
    pub reason: String,
}

impl Unevaluated {
    /// Record that `subject` was skipped by `category` because of `err`
    pub fn new(category: FindingCategory, subject: impl Into<String>, err: &SourceError) -> Self {
        Self {
            category,
            subject: subject.into(),
            kind: err.kind().to_string(),
            reason: err.to_string(),
        }
    }
}

/// Everything one detection pass produced.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DetectionReport {
    /// Findings, grouped by rule in rule order
    pub findings: Vec<Finding>,
    /// Items that could not be evaluated
    pub unevaluated: Vec<Unevaluated>,
    /// True if a whole source was unavailable and rules were skipped
    pub degraded: bool,
}

impl DetectionReport {
    /// Findings of one category
    pub fn by_category(&self, category: FindingCategory) -> impl Iterator<Item = &Finding> {
        self.findings
            .iter()
            .filter(move |f| f.category() == category)
    }
}

/// Run all three rules.
///
/// `services` is the outcome of the service inventory. If it failed, rules 1
/// and 2 are skipped and the report is marked degraded; rule 3 still runs.
/// The only error is [`ScanError::NothingToScan`], returned when the
/// inventory and both policy scopes were all unreachable.
pub async fn detect(
    services: Result<Vec<ServiceRecord>, SourceError>,
    acl: &dyn AclSource,
    policy: &dyn PolicySource,
    principals: &PrincipalMatcher,
) -> posture_core::Result<DetectionReport> {
    detect_with_concurrency(services, acl, policy, principals, DEFAULT_ACL_CONCURRENCY).await
}

async fn detect_with_concurrency(
    services: Result<Vec<ServiceRecord>, SourceError>,
    acl: &dyn AclSource,
    policy: &dyn PolicySource,
    principals: &PrincipalMatcher,
    concurrency: usize,
) -> posture_core::Result<DetectionReport> {
    let mut report = DetectionReport::default();

    let services = match services {
        Ok(services) => Some(services),
        Err(err) => {
            warn!(error = %err, "service inventory unavailable, skipping service rules");
            for category in [
                FindingCategory::UnquotedServicePath,
                FindingCategory::ModifiableServiceBinary,
            ] {
                report
                    .unevaluated
                    .push(Unevaluated::new(category, "service inventory", &err));
            }
            report.degraded = true;
            if err.is_unavailable() {
                None
            } else {
                Some(Vec::new())
            }
        }
    };
    let inventory_reachable = services.is_some();
    let services = services.unwrap_or_default();

    // Rule 1 is pure; rules 2 and 3 wait on their sources concurrently.
    let unquoted = unquoted::check(&services);
    let (modifiable, policy_outcome) = tokio::join!(
        modifiable::check(&services, acl, principals, concurrency),
        install_elevated::check(policy),
    );

    if !inventory_reachable && policy_outcome.source_unavailable {
        return Err(ScanError::NothingToScan(
            "service inventory and policy store".to_string(),
        ));
    }
    if policy_outcome.source_unavailable {
        warn!("policy store unavailable, AlwaysInstallElevated reported as disabled");
        report.degraded = true;
    }
    if modifiable.source_unavailable {
        warn!("ACL source unavailable, modifiable service binaries not evaluated");
        report.degraded = true;
    }

    info!(
        services = services.len(),
        unquoted = unquoted.len(),
        modifiable = modifiable.findings.len(),
        skipped = modifiable.unevaluated.len(),
        "privilege-escalation rules complete"
    );

    report.findings.extend(unquoted);
    report.findings.extend(modifiable.findings);
    report.findings.push(policy_outcome.finding);
    report.unevaluated.extend(modifiable.unevaluated);
    report.unevaluated.extend(policy_outcome.unevaluated);

    Ok(report)
}

/// Detector bound to its sources.
#[derive(Clone)]
pub struct Detector {
    inventory: Arc<dyn ServiceInventory>,
    acl: Arc<dyn AclSource>,
    policy: Arc<dyn PolicySource>,
    principals: PrincipalMatcher,
    concurrency: usize,
}

impl Detector {
    /// Create a detector with the default principal set
    pub fn new(
        inventory: Arc<dyn ServiceInventory>,
        acl: Arc<dyn AclSource>,
        policy: Arc<dyn PolicySource>,
    ) -> Self {
        Self {
            inventory,
            acl,
            policy,
            principals: PrincipalMatcher::default(),
            concurrency: DEFAULT_ACL_CONCURRENCY,
        }
    }

    /// Create a detector whose three sources are one object
    pub fn from_sources<S>(sources: Arc<S>) -> Self
    where
        S: ServiceInventory + AclSource + PolicySource + 'static,
    {
        Self::new(sources.clone(), sources.clone(), sources)
    }

    /// Set the broad principals
    #[must_use]
    pub fn principals(mut self, principals: PrincipalMatcher) -> Self {
        self.principals = principals;
        self
    }

    /// Set the maximum number of concurrent ACL lookups
    #[must_use]
    pub const fn concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency;
        self
    }

    /// Enumerate services and run all rules
    pub async fn run(&self) -> posture_core::Result<DetectionReport> {
        let services = self.inventory.services().await;
        detect_with_concurrency(
            services,
            self.acl.as_ref(),
            self.policy.as_ref(),
            &self.principals,
            self.concurrency,
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use posture_core::{
        AccessControlEntry, AccessControlList, Right, StartMode, HKCU_ENABLED, HKLM_ENABLED,
    };

    use crate::source::PolicyScope;

    struct Fixture {
        services: Result<Vec<ServiceRecord>, SourceError>,
        policy: Result<Option<u32>, SourceError>,
    }

    #[async_trait]
    impl ServiceInventory for Fixture {
        async fn services(&self) -> Result<Vec<ServiceRecord>, SourceError> {
            self.services.clone()
        }
    }

    #[async_trait]
    impl AclSource for Fixture {
        async fn acl(&self, path: &str) -> Result<AccessControlList, SourceError> {
            if path.ends_with("weak.exe") {
                Ok(vec![AccessControlEntry::new(
                    r"BUILTIN\Users",
                    [Right::Modify],
                )])
            } else {
                Err(SourceError::NotFound(path.to_string()))
            }
        }
    }

    #[async_trait]
    impl PolicySource for Fixture {
        async fn dword(
            &self,
            scope: PolicyScope,
            _key: &str,
            _value: &str,
        ) -> Result<Option<u32>, SourceError> {
            match scope {
                PolicyScope::Machine => self.policy.clone(),
                PolicyScope::User => self.policy.clone().map(|_| None),
            }
        }
    }

    fn services() -> Vec<ServiceRecord> {
        vec![
            ServiceRecord::new("Foo", r"C:\Program Files\Foo\foo.exe", StartMode::Auto),
            ServiceRecord::new("Bar", r#""C:\Program Files\Bar\bar.exe""#, StartMode::Auto),
            ServiceRecord::new("Weak", r"C:\Apps\weak.exe", StartMode::Manual),
        ]
    }

    #[tokio::test]
    async fn findings_are_grouped_by_rule() {
        let fixture = Arc::new(Fixture {
            services: Ok(services()),
            policy: Ok(Some(1)),
        });
        let report = Detector::from_sources(fixture).run().await.unwrap();

        let categories: Vec<_> = report.findings.iter().map(Finding::category).collect();
        assert_eq!(
            categories,
            [
                FindingCategory::UnquotedServicePath,
                FindingCategory::ModifiableServiceBinary,
                FindingCategory::AlwaysInstallElevated,
            ]
        );
        assert!(!report.degraded);

        let policy = report
            .by_category(FindingCategory::AlwaysInstallElevated)
            .next()
            .unwrap();
        assert_eq!(policy.get(HKLM_ENABLED), Some("true"));
        assert_eq!(policy.get(HKCU_ENABLED), Some("false"));

        // Foo and Bar have no ACL in the fixture
        assert_eq!(report.unevaluated.len(), 2);
    }

    #[tokio::test]
    async fn inventory_failure_degrades_but_policy_rule_runs() {
        let fixture = Arc::new(Fixture {
            services: Err(SourceError::Unavailable("service manager".into())),
            policy: Ok(None),
        });
        let report = Detector::from_sources(fixture).run().await.unwrap();

        assert!(report.degraded);
        assert_eq!(report.findings.len(), 1);
        assert_eq!(
            report.findings[0].category(),
            FindingCategory::AlwaysInstallElevated
        );
    }

    #[tokio::test]
    async fn all_sources_unavailable_is_fatal() {
        let fixture = Fixture {
            services: Err(SourceError::Unavailable("service manager".into())),
            policy: Err(SourceError::Unavailable("registry".into())),
        };
        let err = detect(
            fixture.services.clone(),
            &fixture,
            &fixture,
            &PrincipalMatcher::default(),
        )
        .await
        .unwrap_err();
        assert!(err.is_nothing_to_scan());
    }

    struct NoAcl;

    #[async_trait]
    impl AclSource for NoAcl {
        async fn acl(&self, _path: &str) -> Result<AccessControlList, SourceError> {
            Err(SourceError::Unavailable("icacls could not be started".into()))
        }
    }

    #[tokio::test]
    async fn unreachable_acl_source_degrades_report() {
        let fixture = Fixture {
            services: Ok(vec![
                ServiceRecord::new("A", r"C:\Apps\a.exe", StartMode::Auto),
                ServiceRecord::new("B", r"C:\Apps\b.exe", StartMode::Manual),
            ]),
            policy: Ok(None),
        };
        let report = detect(
            fixture.services.clone(),
            &NoAcl,
            &fixture,
            &PrincipalMatcher::default(),
        )
        .await
        .unwrap();

        assert!(report.degraded);
        let kinds: Vec<_> = report.unevaluated.iter().map(|u| u.kind.as_str()).collect();
        assert_eq!(kinds, ["unavailable", "unavailable"]);
        assert_eq!(report.findings.len(), 1);
    }
}
