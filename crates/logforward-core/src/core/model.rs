// crates/logforward-core/src/core/model.rs
// ============================================================================
// Module: Domain Model
// Description: Data types shared by every stage of the forwarding pipeline.
// Purpose: Give the tenant key, delivery configuration, decoded record, and
//          delivery-outcome shapes a single canonical definition.
// Dependencies: serde, serde_json
// ============================================================================

//! ## Overview
//! These types are read-only once constructed and are shared across the
//! orchestrator and every deliverer for the lifetime of one queue message.
//! Invariants:
//! - A `TenantKey` only ever comes from `TenantKey::parse`; there is no
//!   public constructor that skips validation.
//! - A `LogRecord`'s `timestamp_ms` is always `> 0` by the time it leaves
//!   the object decoder.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

use crate::core::error::ProcessingError;
use crate::core::identifiers::ApplicationName;
use crate::core::identifiers::ConfigId;
use crate::core::identifiers::TenantId;

// ============================================================================
// SECTION: Tenant Key
// ============================================================================

/// Identity derived from the object key path
/// `<cluster_id>/<namespace>/<application>/<pod_name>/<filename>`.
///
/// # Invariants
/// - All five segments are present and non-empty.
/// - `namespace` is the tenant id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TenantKey {
    /// Cluster identifier segment.
    pub cluster_id: String,
    /// Tenant identifier; the `namespace` segment.
    pub tenant_id: TenantId,
    /// Application name segment.
    pub application: ApplicationName,
    /// Pod name segment.
    pub pod_name: String,
    /// Filename segment, used for gzip-suffix detection and destination
    /// key construction.
    pub filename: String,
}

impl TenantKey {
    /// Parses an object key of the form
    /// `<cluster_id>/<namespace>/<application>/<pod_name>/<filename>`.
    ///
    /// # Errors
    /// Returns [`ProcessingError::non_recoverable`] when the key has a
    /// segment count other than five, or any segment is empty.
    pub fn parse(object_key: &str) -> Result<Self, ProcessingError> {
        let segments: Vec<&str> = object_key.split('/').collect();
        if segments.len() != 5 {
            return Err(ProcessingError::non_recoverable(format!(
                "object key '{object_key}' must have exactly 5 segments, found {}",
                segments.len()
            )));
        }
        if segments.iter().any(|segment| segment.is_empty()) {
            return Err(ProcessingError::non_recoverable(format!(
                "object key '{object_key}' contains an empty segment"
            )));
        }
        Ok(Self {
            cluster_id: segments[0].to_owned(),
            tenant_id: TenantId::new(segments[1]),
            application: ApplicationName::new(segments[2]),
            pod_name: segments[3].to_owned(),
            filename: segments[4].to_owned(),
        })
    }

    /// Reconstructs the original object key.
    #[must_use]
    pub fn object_key(&self) -> String {
        format!(
            "{}/{}/{}/{}/{}",
            self.cluster_id,
            self.tenant_id,
            self.application,
            self.pod_name,
            self.filename
        )
    }

    /// True when the filename suggests gzip compression.
    #[must_use]
    pub fn is_gzip(&self) -> bool {
        self.filename.ends_with(".gz")
    }
}

// ============================================================================
// SECTION: Delivery Configuration
// ============================================================================

/// Discriminates the two delivery backends a tenant can configure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DeliveryConfigKind {
    /// Deliver normalized records to a managed log group/stream.
    ManagedLogGroup,
    /// Copy the source object into a tenant-owned bucket.
    ObjectStore,
}

impl DeliveryConfigKind {
    /// Returns the method name used in metric names and log fields
    /// (`managed-log-group` / `object-store`).
    #[must_use]
    pub fn method_name(self) -> &'static str {
        match self {
            Self::ManagedLogGroup => "managed-log-group",
            Self::ObjectStore => "object-store",
        }
    }
}

/// A single per-tenant delivery rule.
///
/// # Invariants
/// - When `enabled`, type-specific required fields are non-blank (checked
///   by the tenant resolver, not by this type).
/// - The allowed-application set is the union of `desired_logs` and the
///   expansion of `groups` through the static group table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryConfig {
    /// Identifier of this configuration row, for logging and dedupe.
    pub id: ConfigId,
    /// Owning tenant.
    pub tenant_id: TenantId,
    /// Delivery backend kind.
    pub kind: DeliveryConfigKind,
    /// Whether this configuration is active; missing data defaults to
    /// `false` (spec open question, resolved in favor of the safe
    /// default).
    pub enabled: bool,
    /// Destination region override.
    pub target_region: Option<String>,
    /// Explicit application allow-list.
    pub desired_logs: Vec<String>,
    /// Application group names, expanded via the static group table.
    pub groups: Vec<String>,
    /// Managed-log-group only: the role assumed after the central
    /// distribution role.
    pub log_distribution_role_arn: Option<String>,
    /// Managed-log-group only: destination log group name.
    pub log_group_name: Option<String>,
    /// Object-store only: destination bucket name.
    pub bucket_name: Option<String>,
    /// Object-store only: destination key prefix.
    pub bucket_prefix: Option<String>,
}

impl DeliveryConfig {
    /// Validates the type-specific required fields for an enabled
    /// configuration.
    ///
    /// # Errors
    /// Returns [`ProcessingError::non_recoverable`] when a required field
    /// for this configuration's kind is missing or blank.
    pub fn validate(&self) -> Result<(), ProcessingError> {
        if !self.enabled {
            return Ok(());
        }
        match self.kind {
            DeliveryConfigKind::ManagedLogGroup => {
                require_non_blank(self.log_distribution_role_arn.as_deref(), "log_distribution_role_arn")?;
                require_non_blank(self.log_group_name.as_deref(), "log_group_name")?;
            }
            DeliveryConfigKind::ObjectStore => {
                require_non_blank(self.bucket_name.as_deref(), "bucket_name")?;
            }
        }
        Ok(())
    }
}

fn require_non_blank(value: Option<&str>, field: &str) -> Result<(), ProcessingError> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(()),
        _ => Err(ProcessingError::non_recoverable(format!(
            "required field '{field}' is missing or blank"
        ))),
    }
}

// ============================================================================
// SECTION: Log Record
// ============================================================================

/// A record's human-readable payload: either free text or a JSON document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Message {
    /// Plain text, serialized verbatim.
    Text(String),
    /// Structured payload, serialized as compact JSON.
    Json(serde_json::Value),
}

impl Message {
    /// Renders the message as it would be written to a destination: text
    /// verbatim, JSON as compact JSON.
    #[must_use]
    pub fn render(&self) -> String {
        match self {
            Self::Text(text) => text.clone(),
            Self::Json(value) => value.to_string(),
        }
    }
}

/// A normalized log entry produced by the object decoder.
///
/// # Invariants
/// - `timestamp_ms > 0`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogRecord {
    /// Milliseconds since the Unix epoch, UTC.
    pub timestamp_ms: i64,
    /// The record's payload.
    pub message: Message,
}

// ============================================================================
// SECTION: Processing Metadata / Continuation
// ============================================================================

/// Carried on re-queued continuation messages.
///
/// # Invariants
/// - On a fresh message this is absent; `offset` and `retry_count` are
///   both conceptually 0 in that case.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessingMetadata {
    /// Records already delivered for this object.
    pub offset: u64,
    /// Number of times this object has been continued.
    pub retry_count: u32,
    /// Receipt handle of the message that first produced this object.
    pub original_receipt_handle: String,
    /// Wall-clock time the continuation was enqueued, epoch milliseconds.
    pub requeued_at_ms: i64,
}

// ============================================================================
// SECTION: Delivery Results
// ============================================================================

/// Accumulated delivery counters across all configs for one object.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeliveryStats {
    /// Records successfully accepted by a destination.
    pub successful_events: u64,
    /// Records that failed to be delivered (excluding rejections).
    pub failed_events: u64,
    /// Delivery operations that completed without a fatal error.
    pub successful_deliveries: u64,
    /// Delivery operations that failed fatally.
    pub failed_deliveries: u64,
}

impl DeliveryStats {
    /// Folds another stats accumulator into this one.
    pub fn merge(&mut self, other: Self) {
        self.successful_events += other.successful_events;
        self.failed_events += other.failed_events;
        self.successful_deliveries += other.successful_deliveries;
        self.failed_deliveries += other.failed_deliveries;
    }
}

/// Destination-side rejection counters, named per the destination's
/// rejection window semantics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RejectionSummary {
    /// Records older than the destination's retention window.
    pub too_old: u32,
    /// Records timestamped too far in the future.
    pub too_new: u32,
    /// Records rejected for any other expiry reason the destination
    /// reports.
    pub expired: u32,
}

impl RejectionSummary {
    /// Total number of rejected records across all categories.
    #[must_use]
    pub fn total(&self) -> u32 {
        self.too_old + self.too_new + self.expired
    }
}

/// Result of one `Deliverer::deliver` call.
///
/// # Invariants
/// - `next_offset == delivered` when the whole batch succeeded.
/// - `next_offset` is in `(0, total)` when a mid-object failure occurred.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeliveryOutcome {
    /// Records accepted by the destination.
    pub delivered: u64,
    /// Records that failed to be delivered (excludes rejections).
    pub failed: u64,
    /// Absolute index of the first record not yet accepted.
    pub next_offset: u64,
    /// Destination-side rejection counters; always zero for the
    /// object-store deliverer.
    pub rejections: RejectionSummary,
}

// ============================================================================
// SECTION: Notification Envelope
// ============================================================================

/// A single object reference inside a notification record.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ObjectReference {
    /// Source bucket name.
    pub bucket: String,
    /// Source object key.
    pub key: String,
}

/// Topic-wrapped object-store event.
///
/// # Invariants
/// - Contains at least one object reference.
#[derive(Debug, Clone, PartialEq)]
pub struct NotificationEnvelope {
    /// One object reference per affected object.
    pub records: Vec<ObjectReference>,
}

impl NotificationEnvelope {
    /// Constructs an envelope, rejecting an empty record list.
    ///
    /// # Errors
    /// Returns [`ProcessingError::non_recoverable`] when `records` is
    /// empty.
    pub fn new(records: Vec<ObjectReference>) -> Result<Self, ProcessingError> {
        if records.is_empty() {
            return Err(ProcessingError::non_recoverable(
                "notification envelope has no records",
            ));
        }
        Ok(Self { records })
    }
}

// ============================================================================
// SECTION: Credentials
// ============================================================================

/// Short-lived credential bundle returned by the credential broker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CredentialBundle {
    /// Access key id.
    pub access_key_id: String,
    /// Secret access key.
    pub secret_access_key: String,
    /// Session token.
    pub session_token: String,
    /// Wall-clock expiry reported by the issuer, epoch milliseconds.
    pub expires_at_ms: i64,
}

// ============================================================================
// SECTION: Managed-Log-Group Wire Shape
// ============================================================================

/// The event shape submitted to the managed-log-group destination.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DestinationEvent {
    /// Event timestamp, epoch milliseconds.
    pub timestamp_ms: i64,
    /// Event body, already rendered to its final string form.
    pub message: String,
}

impl DestinationEvent {
    /// Size this event occupies against a destination's byte cap,
    /// including its 26-byte per-record overhead.
    #[must_use]
    pub fn accounted_bytes(&self) -> usize {
        self.message.len() + 26
    }
}

impl From<&LogRecord> for DestinationEvent {
    fn from(record: &LogRecord) -> Self {
        Self {
            timestamp_ms: record.timestamp_ms,
            message: record.message.render(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tenant_key_parses_well_formed_object_key() {
        let key = TenantKey::parse("cluster1/acme/payment/pod1/a.json.gz").unwrap();
        assert_eq!(key.cluster_id, "cluster1");
        assert_eq!(key.tenant_id.as_str(), "acme");
        assert_eq!(key.application.as_str(), "payment");
        assert_eq!(key.pod_name, "pod1");
        assert_eq!(key.filename, "a.json.gz");
        assert!(key.is_gzip());
        assert_eq!(key.object_key(), "cluster1/acme/payment/pod1/a.json.gz");
    }

    #[test]
    fn tenant_key_rejects_wrong_segment_count() {
        assert!(TenantKey::parse("cluster1/acme/payment").is_err());
        assert!(TenantKey::parse("cluster1/acme/payment/pod1/a.json/extra").is_err());
    }

    #[test]
    fn tenant_key_rejects_empty_segment() {
        assert!(TenantKey::parse("cluster1//payment/pod1/a.json.gz").is_err());
    }

    #[test]
    fn destination_event_accounts_overhead() {
        let record = LogRecord {
            timestamp_ms: 1,
            message: Message::Text("hello".to_owned()),
        };
        let event = DestinationEvent::from(&record);
        assert_eq!(event.accounted_bytes(), 5 + 26);
    }

    #[test]
    fn delivery_config_requires_fields_only_when_enabled() {
        let mut config = DeliveryConfig {
            id: ConfigId::new("cfg-1"),
            tenant_id: TenantId::new("acme"),
            kind: DeliveryConfigKind::ManagedLogGroup,
            enabled: false,
            target_region: None,
            desired_logs: vec![],
            groups: vec![],
            log_distribution_role_arn: None,
            log_group_name: None,
            bucket_name: None,
            bucket_prefix: None,
        };
        assert!(config.validate().is_ok());
        config.enabled = true;
        assert!(config.validate().is_err());
        config.log_distribution_role_arn = Some("arn:aws:iam::1:role/dist".to_owned());
        config.log_group_name = Some("acme-logs".to_owned());
        assert!(config.validate().is_ok());
    }
}
