// crates/logforward-broker/src/tenant_resolver.rs
// ============================================================================
// Module: Tenant Resolver
// Description: Resolves a tenant id into its validated, enabled delivery
//              configurations.
// Purpose: Turn raw backing-store rows into logforward_core::DeliveryConfig
//          values the orchestrator can hand to deliverers.
// Dependencies: logforward-core
// ============================================================================

use std::sync::Arc;

use logforward_core::ConfigId;
use logforward_core::DeliveryConfig;
use logforward_core::DeliveryConfigKind;
use logforward_core::ProcessingError;
use logforward_core::RawDeliveryConfigRow;
use logforward_core::TenantConfigStore;
use logforward_core::TenantId;

/// Resolves tenant identity into the configurations eligible for
/// delivery.
pub struct TenantResolver {
    store: Arc<dyn TenantConfigStore>,
}

impl TenantResolver {
    /// Builds a resolver over the given backing store.
    #[must_use]
    pub fn new(store: Arc<dyn TenantConfigStore>) -> Self {
        Self { store }
    }

    /// Returns the enabled, validated delivery configurations for
    /// `tenant_id`.
    ///
    /// # Errors
    /// Returns a non-recoverable [`ProcessingError`] when `tenant_id` is
    /// empty, the store returns zero rows, every row is disabled, or an
    /// enabled row fails type validation. Any other backing-store error
    /// is propagated as recoverable.
    pub async fn resolve(&self, tenant_id: &str) -> Result<Vec<DeliveryConfig>, ProcessingError> {
        if tenant_id.is_empty() {
            return Err(ProcessingError::non_recoverable("TenantNotFound: empty tenant id"));
        }

        let rows = self.store.configs_for(tenant_id).await?;
        if rows.is_empty() {
            return Err(ProcessingError::non_recoverable(format!(
                "TenantNotFound: no configuration rows for tenant '{tenant_id}'"
            )));
        }

        let mut configs = Vec::new();
        for row in rows {
            let config = parse_row(row)?;
            if config.enabled {
                config.validate()?;
                configs.push(config);
            }
        }

        if configs.is_empty() {
            return Err(ProcessingError::non_recoverable(format!(
                "TenantNotFound: no enabled configurations for tenant '{tenant_id}'"
            )));
        }

        Ok(configs)
    }
}

fn parse_row(row: RawDeliveryConfigRow) -> Result<DeliveryConfig, ProcessingError> {
    let kind = match row.kind.as_str() {
        "managed-log-group" => DeliveryConfigKind::ManagedLogGroup,
        "object-store" => DeliveryConfigKind::ObjectStore,
        other => {
            return Err(ProcessingError::non_recoverable(format!(
                "unknown delivery configuration type '{other}'"
            )))
        }
    };

    Ok(DeliveryConfig {
        id: ConfigId::new(row.id),
        tenant_id: TenantId::new(row.tenant_id),
        kind,
        // Missing `enabled` defaults to disabled, the safe default.
        enabled: row.enabled.unwrap_or(false),
        target_region: row.target_region,
        desired_logs: row.desired_logs.unwrap_or_default(),
        groups: row.groups.unwrap_or_default(),
        log_distribution_role_arn: row.log_distribution_role_arn,
        log_group_name: row.log_group_name,
        bucket_name: row.bucket_name,
        bucket_prefix: row.bucket_prefix,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use logforward_providers::InMemoryTenantConfigStore;

    fn row(enabled: Option<bool>) -> RawDeliveryConfigRow {
        RawDeliveryConfigRow {
            id: "cfg-1".to_owned(),
            tenant_id: "acme".to_owned(),
            kind: "managed-log-group".to_owned(),
            enabled,
            target_region: None,
            desired_logs: None,
            groups: None,
            log_distribution_role_arn: Some("arn:aws:iam::1:role/dist".to_owned()),
            log_group_name: Some("acme-logs".to_owned()),
            bucket_name: None,
            bucket_prefix: None,
        }
    }

    #[tokio::test]
    async fn rejects_empty_tenant_id() {
        let store = Arc::new(InMemoryTenantConfigStore::new());
        let resolver = TenantResolver::new(store);
        assert!(resolver.resolve("").await.is_err());
    }

    #[tokio::test]
    async fn rejects_tenant_with_no_rows() {
        let store = Arc::new(InMemoryTenantConfigStore::new());
        let resolver = TenantResolver::new(store);
        assert!(resolver.resolve("acme").await.is_err());
    }

    #[tokio::test]
    async fn rejects_tenant_with_all_rows_disabled() {
        let store = Arc::new(InMemoryTenantConfigStore::new());
        store.set_rows("acme", vec![row(Some(false)), row(None)]).await;
        let resolver = TenantResolver::new(store);
        assert!(resolver.resolve("acme").await.is_err());
    }

    #[tokio::test]
    async fn resolves_enabled_validated_configs() {
        let store = Arc::new(InMemoryTenantConfigStore::new());
        store.set_rows("acme", vec![row(Some(true)), row(Some(false))]).await;
        let resolver = TenantResolver::new(store);
        let configs = resolver.resolve("acme").await.unwrap();
        assert_eq!(configs.len(), 1);
        assert!(configs[0].enabled);
    }
}
