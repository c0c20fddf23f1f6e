// crates/logforward-broker/src/deliver/mod.rs
// ============================================================================
// Module: Deliver
// Description: Deliverer construction and per-object fan-out.
// Purpose: Let the orchestrator depend on a `DelivererFactory` trait
//          rather than the concrete, AWS-backed registry, so tests can
//          substitute an in-memory factory.
// Dependencies: logforward-core
// ============================================================================

pub mod registry;

use std::sync::Arc;

use logforward_core::Deliverer;
use logforward_core::DeliveryConfig;
use logforward_core::ProcessingError;
use logforward_core::TenantKey;

pub use crate::deliver::registry::DelivererRegistry;

/// Builds the concrete [`Deliverer`] for one admitted configuration.
pub trait DelivererFactory: Send + Sync {
    /// Builds a deliverer scoped to `config` and the object named by
    /// `tenant_key`/`source_bucket`.
    ///
    /// # Errors
    /// Returns a non-recoverable [`ProcessingError`] when `config` lacks
    /// a field required for its kind.
    fn build(
        &self,
        config: &DeliveryConfig,
        tenant_key: &TenantKey,
        source_bucket: &str,
    ) -> Result<Arc<dyn Deliverer>, ProcessingError>;
}

impl DelivererFactory for DelivererRegistry {
    fn build(
        &self,
        config: &DeliveryConfig,
        tenant_key: &TenantKey,
        source_bucket: &str,
    ) -> Result<Arc<dyn Deliverer>, ProcessingError> {
        DelivererRegistry::build(self, config, tenant_key, source_bucket)
    }
}
