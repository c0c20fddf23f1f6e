// crates/logforward-core/src/interfaces/mod.rs
// ============================================================================
// Module: Interfaces
// Description: Backend-agnostic traits implemented by logforward-providers
//              and wired together by logforward-broker.
// Purpose: Keep the orchestrator and deliverers testable against in-memory
//          fakes without pulling in AWS SDK crates.
// Dependencies: async-trait
// ============================================================================

//! ## Overview
//! Every external collaborator named as out-of-scope by the processor's
//! purpose statement (the tenant-configuration store, the object store,
//! the credential-issuance service, the destination log-group service,
//! the metrics sink, the notification queue) is represented here as a
//! trait. `logforward-providers` supplies the AWS-backed implementations;
//! tests supply in-memory ones.
//!
//! Invariants:
//! - Every trait method returns `Result<_, ProcessingError>` (or a type
//!   that implements [`Into<ProcessingError>`]) so callers never have to
//!   special-case a backend's own error type.
//! - Traits that are stored as `Arc<dyn Trait>` in a registry are
//!   `Send + Sync`.

use async_trait::async_trait;

use crate::core::error::ProcessingError;
use crate::core::model::CredentialBundle;
use crate::core::model::DeliveryOutcome;
use crate::core::model::LogRecord;

// ============================================================================
// SECTION: Tenant Configuration Store
// ============================================================================

/// One raw tenant-configuration record as read from the backing store,
/// before type-specific validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawDeliveryConfigRow {
    /// Row identifier, opaque to this crate.
    pub id: String,
    /// Owning tenant id.
    pub tenant_id: String,
    /// Delivery kind as a wire string (`"managed-log-group"` /
    /// `"object-store"`).
    pub kind: String,
    /// Missing `enabled` defaults to `false` at the call site, not here;
    /// this field reflects exactly what the store returned.
    pub enabled: Option<bool>,
    /// Destination region override.
    pub target_region: Option<String>,
    /// Explicit application allow-list.
    pub desired_logs: Option<Vec<String>>,
    /// Application group names.
    pub groups: Option<Vec<String>>,
    /// Managed-log-group only.
    pub log_distribution_role_arn: Option<String>,
    /// Managed-log-group only.
    pub log_group_name: Option<String>,
    /// Object-store only.
    pub bucket_name: Option<String>,
    /// Object-store only.
    pub bucket_prefix: Option<String>,
}

/// Backing store for tenant delivery configurations.
///
/// # Invariants
/// - `configs_for` never caches; the tenant resolver fetches fresh rows on
///   every invocation (a stale config would silently mis-route traffic).
#[async_trait]
pub trait TenantConfigStore: Send + Sync {
    /// Returns every configuration row for `tenant_id`, enabled or not.
    ///
    /// # Errors
    /// Returns a recoverable [`ProcessingError`] on any backing-store
    /// I/O failure; an empty result is not itself an error (the tenant
    /// resolver turns zero enabled rows into `TenantNotFound`).
    async fn configs_for(&self, tenant_id: &str) -> Result<Vec<RawDeliveryConfigRow>, ProcessingError>;
}

// ============================================================================
// SECTION: Object Fetcher
// ============================================================================

/// Fetches a source object's raw bytes from the object store.
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Fetches the full contents of `bucket`/`key`.
    ///
    /// # Errors
    /// Returns a recoverable [`ProcessingError`] on transient fetch
    /// failure; a non-recoverable one when the object does not exist.
    async fn fetch(&self, bucket: &str, key: &str) -> Result<Vec<u8>, ProcessingError>;
}

// ============================================================================
// SECTION: Credential Provider
// ============================================================================

/// Issues short-lived credentials by (chained) role assumption.
///
/// # Invariants
/// - Implementations cache by the full `(role_id, external_id, region)`
///   triple with monotonic, wall-clock-independent expiry.
#[async_trait]
pub trait CredentialProvider: Send + Sync {
    /// Assumes a single role.
    ///
    /// # Errors
    /// Returns a recoverable [`ProcessingError`] on assumption failure.
    async fn credentials_for(
        &self,
        role_id: &str,
        external_id: Option<&str>,
        region: &str,
    ) -> Result<CredentialBundle, ProcessingError>;

    /// Assumes `role_a` (no external id), then from that identity assumes
    /// `role_b` with `external_id_a` if provided.
    ///
    /// # Errors
    /// Returns a recoverable [`ProcessingError`] when either hop fails.
    async fn chained(
        &self,
        role_a: &str,
        external_id_a: Option<&str>,
        role_b: &str,
        region: &str,
    ) -> Result<CredentialBundle, ProcessingError>;
}

// ============================================================================
// SECTION: Deliverer
// ============================================================================

/// A delivery backend: managed-log-group or object-store.
///
/// # Invariants
/// - `deliver` never mutates `records`; it only reads a suffix starting
///   at `offset`.
#[async_trait]
pub trait Deliverer: Send + Sync {
    /// Delivers `records[offset..]` to this deliverer's destination.
    ///
    /// # Errors
    /// Returns a recoverable [`ProcessingError`] for role-assumption
    /// failures and exhausted-retry transient failures; non-recoverable
    /// for bad tenant/config data.
    async fn deliver(&self, records: &[LogRecord], offset: u64) -> Result<DeliveryOutcome, ProcessingError>;
}

// ============================================================================
// SECTION: Metrics Sink
// ============================================================================

/// Publishes count metrics keyed by tenant and method.
#[async_trait]
pub trait MetricsSink: Send + Sync {
    /// Emits one count metric. Failures here are logged by the caller
    /// and never propagate into the orchestrator's outcome.
    ///
    /// # Errors
    /// Returns a recoverable [`ProcessingError`] on publish failure; the
    /// caller is expected to log and continue rather than abort.
    async fn emit_count(
        &self,
        tenant_id: &str,
        method: &str,
        dimension: &str,
        value: u64,
    ) -> Result<(), ProcessingError>;
}

// ============================================================================
// SECTION: Object Lister
// ============================================================================

/// Lists object keys under a bucket, used only by the development-only
/// scan front end.
#[async_trait]
pub trait ObjectLister: Send + Sync {
    /// Lists every key currently in `bucket`.
    ///
    /// # Errors
    /// Returns a recoverable [`ProcessingError`] on listing failure.
    async fn list(&self, bucket: &str) -> Result<Vec<String>, ProcessingError>;
}

// ============================================================================
// SECTION: Queue Client
// ============================================================================

/// The notification queue, as seen by the poller front end and the
/// re-queue protocol.
#[async_trait]
pub trait QueueClient: Send + Sync {
    /// Long-polls for up to `max_messages` messages, waiting at most
    /// `wait_seconds` (capped at 20 by callers, per the destination's
    /// long-poll limit).
    ///
    /// # Errors
    /// Returns a recoverable [`ProcessingError`] on transient receive
    /// failure.
    async fn receive(&self, max_messages: u32, wait_seconds: u32) -> Result<Vec<QueueMessage>, ProcessingError>;

    /// Deletes a message, acknowledging successful (or non-recoverably
    /// failed) processing.
    ///
    /// # Errors
    /// Returns a recoverable [`ProcessingError`] on transient delete
    /// failure.
    async fn delete(&self, receipt_handle: &str) -> Result<(), ProcessingError>;

    /// Enqueues a new message body with the given initial visibility
    /// delay in seconds.
    ///
    /// # Errors
    /// Returns a recoverable [`ProcessingError`] on transient send
    /// failure.
    async fn send(&self, body: &str, delay_seconds: u32) -> Result<(), ProcessingError>;
}

/// One message as received from the queue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueMessage {
    /// Opaque receipt handle used to delete or (implicitly) abandon the
    /// message.
    pub receipt_handle: String,
    /// Raw message body (a notification or continuation envelope).
    pub body: String,
}
