// crates/logforward-core/src/core/application_filter.rs
// ============================================================================
// Module: Application Filter
// Description: Decides whether an application is eligible under a
//              delivery configuration.
// Purpose: Shared group table plus the admission policy used by the
//          tenant resolver's config selection step.
// Dependencies: none (pure)
// ============================================================================

use std::collections::BTreeSet;

use crate::core::model::DeliveryConfig;

/// Static group name → member application list table.
///
/// Group lookup is case-insensitive; see [`expand_group`].
pub const APPLICATION_GROUPS: &[(&str, &[&str])] = &[
    ("API", &["api-gateway", "public-api", "internal-api"]),
    ("Authentication", &["auth-service", "identity-provider", "token-issuer"]),
    ("Controller Manager", &["controller-manager", "operator"]),
    ("Scheduler", &["scheduler", "cron-dispatcher"]),
];

/// Expands a group name to its member applications, case-insensitively.
/// Unknown group names expand to an empty list.
fn expand_group(name: &str) -> &'static [&'static str] {
    APPLICATION_GROUPS
        .iter()
        .find(|(group_name, _)| group_name.eq_ignore_ascii_case(name))
        .map_or(&[], |(_, members)| *members)
}

/// Computes the allowed application set for a configuration: the union of
/// its explicit `desired_logs` and the expansion of its `groups`.
fn allowed_set(config: &DeliveryConfig) -> BTreeSet<String> {
    let mut set: BTreeSet<String> = config.desired_logs.iter().cloned().collect();
    for group in &config.groups {
        set.extend(expand_group(group).iter().map(|s| (*s).to_owned()));
    }
    set
}

/// Decides whether `application` is admitted under `config`.
///
/// Policy:
/// 1. If both lists are empty, admit all.
/// 2. Otherwise compute the union of `desired_logs` and the group
///    expansion; matching against it is case-sensitive and exact.
/// 3. If the expanded set is empty despite non-empty inputs (e.g. all
///    group names were unknown), admit all as a defensive fallback.
/// 4. Otherwise admit iff `application` is a member.
#[must_use]
pub fn is_application_admitted(config: &DeliveryConfig, application: &str) -> bool {
    if config.desired_logs.is_empty() && config.groups.is_empty() {
        return true;
    }
    let allowed = allowed_set(config);
    if allowed.is_empty() {
        return true;
    }
    allowed.contains(application)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::identifiers::ConfigId;
    use crate::core::identifiers::TenantId;
    use crate::core::model::DeliveryConfigKind;

    fn base_config() -> DeliveryConfig {
        DeliveryConfig {
            id: ConfigId::new("cfg-1"),
            tenant_id: TenantId::new("acme"),
            kind: DeliveryConfigKind::ManagedLogGroup,
            enabled: true,
            target_region: None,
            desired_logs: vec![],
            groups: vec![],
            log_distribution_role_arn: Some("arn:aws:iam::1:role/dist".to_owned()),
            log_group_name: Some("acme-logs".to_owned()),
            bucket_name: None,
            bucket_prefix: None,
        }
    }

    #[test]
    fn admits_all_when_no_filters_configured() {
        let config = base_config();
        assert!(is_application_admitted(&config, "payment"));
    }

    #[test]
    fn matches_explicit_desired_log_case_sensitively() {
        let mut config = base_config();
        config.desired_logs = vec!["payment".to_owned()];
        assert!(is_application_admitted(&config, "payment"));
        assert!(!is_application_admitted(&config, "Payment"));
        assert!(!is_application_admitted(&config, "user-service"));
    }

    #[test]
    fn expands_group_case_insensitively() {
        let mut config = base_config();
        config.groups = vec!["api".to_owned()];
        assert!(is_application_admitted(&config, "api-gateway"));
        assert!(!is_application_admitted(&config, "scheduler"));
    }

    #[test]
    fn falls_back_to_admit_all_when_expansion_is_empty() {
        let mut config = base_config();
        config.groups = vec!["nonexistent-group".to_owned()];
        assert!(is_application_admitted(&config, "anything"));
    }
}
