// crates/logforward-providers/src/tenant_config_store.rs
// ============================================================================
// Module: In-Memory Tenant Config Store
// Description: A TenantConfigStore backed by a process-local map.
// Purpose: Back the scanner front end's local development mode and the
//          orchestrator's test suite; the production-backing key-value
//          store is an external collaborator out of scope for this crate.
// Dependencies: logforward-core, tokio
// ============================================================================

use std::collections::HashMap;

use async_trait::async_trait;
use logforward_core::ProcessingError;
use logforward_core::RawDeliveryConfigRow;
use logforward_core::TenantConfigStore;
use tokio::sync::RwLock;

/// [`TenantConfigStore`] backed by an in-process map, keyed by tenant id.
///
/// # Invariants
/// - Never errors on a missing tenant; an absent key simply yields an
///   empty row list, matching what a real backing store returns for an
///   unknown tenant.
#[derive(Default)]
pub struct InMemoryTenantConfigStore {
    rows: RwLock<HashMap<String, Vec<RawDeliveryConfigRow>>>,
}

impl InMemoryTenantConfigStore {
    /// Builds an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the row set for a tenant, for test setup.
    pub async fn set_rows(&self, tenant_id: impl Into<String>, rows: Vec<RawDeliveryConfigRow>) {
        self.rows.write().await.insert(tenant_id.into(), rows);
    }
}

#[async_trait]
impl TenantConfigStore for InMemoryTenantConfigStore {
    async fn configs_for(&self, tenant_id: &str) -> Result<Vec<RawDeliveryConfigRow>, ProcessingError> {
        Ok(self.rows.read().await.get(tenant_id).cloned().unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn unknown_tenant_yields_empty_row_list() {
        let store = InMemoryTenantConfigStore::new();
        let rows = store.configs_for("nonexistent").await.unwrap();
        assert!(rows.is_empty());
    }

    #[tokio::test]
    async fn returns_rows_set_for_a_tenant() {
        let store = InMemoryTenantConfigStore::new();
        store
            .set_rows(
                "acme",
                vec![RawDeliveryConfigRow {
                    id: "cfg-1".to_owned(),
                    tenant_id: "acme".to_owned(),
                    kind: "managed-log-group".to_owned(),
                    enabled: Some(true),
                    target_region: None,
                    desired_logs: None,
                    groups: None,
                    log_distribution_role_arn: Some("arn:aws:iam::1:role/dist".to_owned()),
                    log_group_name: Some("acme-logs".to_owned()),
                    bucket_name: None,
                    bucket_prefix: None,
                }],
            )
            .await;

        let rows = store.configs_for("acme").await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].tenant_id, "acme");
    }
}
