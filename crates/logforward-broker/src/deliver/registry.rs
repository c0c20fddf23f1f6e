// crates/logforward-broker/src/deliver/registry.rs
// ============================================================================
// Module: Deliverer Registry
// Description: Builds the concrete Deliverer for one DeliveryConfig.
// Purpose: Keep the orchestrator free of AWS SDK knowledge; it only ever
//          sees `Arc<dyn Deliverer>`.
// Dependencies: logforward-core, logforward-providers
// ============================================================================

//! ## Overview
//! One registry instance is built once at startup from the processor's
//! configuration and the credential provider; the orchestrator asks it
//! for a deliverer per admitted configuration, per object. This mirrors
//! the teacher's `ProviderRegistry`/`CompositeBroker` pattern of a single
//! long-lived registry handing out per-call capability objects, adapted
//! here to build a fresh deliverer (since each carries object-specific
//! state such as the source key and log stream name) rather than reuse a
//! cached one.

use std::sync::Arc;

use logforward_core::CredentialProvider;
use logforward_core::Deliverer;
use logforward_core::DeliveryConfig;
use logforward_core::DeliveryConfigKind;
use logforward_core::ProcessingError;
use logforward_core::TenantKey;
use logforward_providers::ManagedLogGroupDeliverer;
use logforward_providers::ObjectStoreDeliverer;

/// Builds deliverers from validated [`DeliveryConfig`] values.
pub struct DelivererRegistry {
    credential_provider: Arc<dyn CredentialProvider>,
    central_distribution_role_id: String,
    central_account_id: String,
    default_region: String,
    max_batch_size: u32,
    retry_attempts: u32,
}

impl DelivererRegistry {
    /// Builds a registry from processor-wide settings.
    #[must_use]
    pub fn new(
        credential_provider: Arc<dyn CredentialProvider>,
        central_distribution_role_id: String,
        central_account_id: String,
        default_region: String,
        max_batch_size: u32,
        retry_attempts: u32,
    ) -> Self {
        Self {
            credential_provider,
            central_distribution_role_id,
            central_account_id,
            default_region,
            max_batch_size,
            retry_attempts,
        }
    }

    /// Builds the deliverer named by `config.kind`, scoped to the object
    /// named by `tenant_key`/`source_bucket`.
    ///
    /// # Errors
    /// Returns a non-recoverable [`ProcessingError`] when `config` lacks
    /// the fields required for its kind (should not happen for an
    /// already-validated config; defensive here regardless).
    pub fn build(
        &self,
        config: &DeliveryConfig,
        tenant_key: &TenantKey,
        source_bucket: &str,
    ) -> Result<Arc<dyn Deliverer>, ProcessingError> {
        let region = config.target_region.clone().unwrap_or_else(|| self.default_region.clone());

        match config.kind {
            DeliveryConfigKind::ManagedLogGroup => {
                let role_arn = config.log_distribution_role_arn.clone().ok_or_else(|| {
                    ProcessingError::non_recoverable("managed-log-group config missing log_distribution_role_arn")
                })?;
                let log_group_name = config
                    .log_group_name
                    .clone()
                    .ok_or_else(|| ProcessingError::non_recoverable("managed-log-group config missing log_group_name"))?;
                let log_stream_name = format!("{}/{}", tenant_key.application, tenant_key.pod_name);

                Ok(Arc::new(ManagedLogGroupDeliverer::new(
                    Arc::clone(&self.credential_provider),
                    self.central_distribution_role_id.clone(),
                    role_arn,
                    region,
                    config.tenant_id.to_string(),
                    log_group_name,
                    log_stream_name,
                    self.max_batch_size,
                    self.retry_attempts,
                )))
            }
            DeliveryConfigKind::ObjectStore => {
                let bucket_name = config
                    .bucket_name
                    .clone()
                    .ok_or_else(|| ProcessingError::non_recoverable("object-store config missing bucket_name"))?;

                // The tenant-config record fields carry a single
                // distribution role shared by both delivery kinds; an
                // object-store config without one falls back to a
                // by-convention role derived from the bucket name.
                let role_arn = config
                    .log_distribution_role_arn
                    .clone()
                    .unwrap_or_else(|| format!("arn:aws:iam::unknown:role/{bucket_name}-dist"));

                Ok(Arc::new(ObjectStoreDeliverer::new(
                    Arc::clone(&self.credential_provider),
                    self.central_account_id.clone(),
                    role_arn,
                    region,
                    config.tenant_id.to_string(),
                    source_bucket.to_owned(),
                    tenant_key.object_key(),
                    bucket_name,
                    config.bucket_prefix.as_deref(),
                    false,
                )))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use logforward_core::ConfigId;
    use logforward_core::CredentialBundle;
    use logforward_core::TenantId;

    struct UnusedCredentialProvider;

    #[async_trait::async_trait]
    impl CredentialProvider for UnusedCredentialProvider {
        async fn credentials_for(
            &self,
            _role_id: &str,
            _external_id: Option<&str>,
            _region: &str,
        ) -> Result<CredentialBundle, ProcessingError> {
            unreachable!()
        }

        async fn chained(
            &self,
            _role_a: &str,
            _external_id_a: Option<&str>,
            _role_b: &str,
            _region: &str,
        ) -> Result<CredentialBundle, ProcessingError> {
            unreachable!()
        }
    }

    fn registry() -> DelivererRegistry {
        DelivererRegistry::new(
            Arc::new(UnusedCredentialProvider),
            "arn:aws:iam::1:role/central".to_owned(),
            "111111111111".to_owned(),
            "us-east-1".to_owned(),
            1000,
            3,
        )
    }

    fn tenant_key() -> TenantKey {
        TenantKey::parse("cluster1/acme/payment/pod1/a.json.gz").unwrap()
    }

    #[test]
    fn builds_managed_log_group_deliverer_for_matching_kind() {
        let config = DeliveryConfig {
            id: ConfigId::new("cfg-1"),
            tenant_id: TenantId::new("acme"),
            kind: DeliveryConfigKind::ManagedLogGroup,
            enabled: true,
            target_region: None,
            desired_logs: vec![],
            groups: vec![],
            log_distribution_role_arn: Some("arn:aws:iam::2:role/acme-dist".to_owned()),
            log_group_name: Some("acme-logs".to_owned()),
            bucket_name: None,
            bucket_prefix: None,
        };
        assert!(registry().build(&config, &tenant_key(), "source-bucket").is_ok());
    }

    #[test]
    fn builds_object_store_deliverer_for_matching_kind() {
        let config = DeliveryConfig {
            id: ConfigId::new("cfg-2"),
            tenant_id: TenantId::new("acme"),
            kind: DeliveryConfigKind::ObjectStore,
            enabled: true,
            target_region: None,
            desired_logs: vec![],
            groups: vec![],
            log_distribution_role_arn: Some("arn:aws:iam::2:role/acme-dist".to_owned()),
            log_group_name: None,
            bucket_name: Some("acme-logs".to_owned()),
            bucket_prefix: Some("raw".to_owned()),
        };
        assert!(registry().build(&config, &tenant_key(), "source-bucket").is_ok());
    }
}
