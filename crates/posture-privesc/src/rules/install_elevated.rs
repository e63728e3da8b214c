//! Rule 3: AlwaysInstallElevated policy state in both scopes.

use posture_core::{Finding, FindingCategory, SourceError, HKCU_ENABLED, HKLM_ENABLED};
use tracing::debug;

use crate::detector::Unevaluated;
use crate::source::{PolicyScope, PolicySource};

/// Policy key holding the installer flags.
pub const INSTALLER_POLICY_KEY: &str = r"SOFTWARE\Policies\Microsoft\Windows\Installer";

/// Value name of the flag.
pub const ALWAYS_INSTALL_ELEVATED: &str = "AlwaysInstallElevated";

/// Outcome of the policy rule.
#[derive(Debug, Clone)]
pub struct PolicyOutcome {
    /// The combined finding, always present
    pub finding: Finding,
    /// Scopes whose lookup failed
    pub unevaluated: Vec<Unevaluated>,
    /// True if both lookups reported the source as unreachable
    pub source_unavailable: bool,
}

/// Read one scope; anything but a set, non-zero value counts as disabled.
async fn scope_enabled(
    policy: &dyn PolicySource,
    scope: PolicyScope,
) -> Result<bool, SourceError> {
    let value = policy
        .dword(scope, INSTALLER_POLICY_KEY, ALWAYS_INSTALL_ELEVATED)
        .await?;
    Ok(value.is_some_and(|v| v != 0))
}

/// Query both scopes independently and report the raw flags.
///
/// The finding always carries `HKLM_Enabled` and `HKCU_Enabled`; deciding
/// whether the combination is exploitable is left to the consumer.
pub async fn check(policy: &dyn PolicySource) -> PolicyOutcome {
    let (machine, user) = tokio::join!(
        scope_enabled(policy, PolicyScope::Machine),
        scope_enabled(policy, PolicyScope::User),
    );

    let mut unevaluated = Vec::new();
    let mut unavailable = 0;
    let mut flag = |scope: PolicyScope, outcome: Result<bool, SourceError>| match outcome {
        Ok(enabled) => enabled,
        Err(err) => {
            debug!(scope = %scope, error = %err, "policy lookup failed, treating as disabled");
            if err.is_unavailable() {
                unavailable += 1;
            }
            unevaluated.push(Unevaluated::new(
                FindingCategory::AlwaysInstallElevated,
                format!(r"{}\{}", scope.hive(), INSTALLER_POLICY_KEY),
                &err,
            ));
            false
        }
    };
    let hklm = flag(PolicyScope::Machine, machine);
    let hkcu = flag(PolicyScope::User, user);

    let finding = Finding::new(
        FindingCategory::AlwaysInstallElevated,
        ALWAYS_INSTALL_ELEVATED,
        [
            (HKLM_ENABLED, hklm.to_string()),
            (HKCU_ENABLED, hkcu.to_string()),
        ],
    );

    PolicyOutcome {
        finding,
        unevaluated,
        source_unavailable: unavailable == 2,
    }
}
