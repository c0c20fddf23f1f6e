// crates/logforward-core/src/lib.rs
// ============================================================================
// Module: Log Forwarder Core
// Description: Domain types, backend-agnostic interfaces, and the error
//              taxonomy shared by every crate in this workspace.
// Purpose: Give the tenant resolver, application filter, object decoder,
//          deliverers, and orchestrator one canonical vocabulary.
// Dependencies: async-trait, serde, serde_json, thiserror, time
// ============================================================================

//! ## Overview
//! This crate has no knowledge of AWS, queues, or HTTP; it defines what a
//! tenant key, a delivery configuration, a log record, and a delivery
//! outcome *are*, and the traits ([`interfaces`]) that every backend
//! implementation (`logforward-providers`) and the orchestration layer
//! (`logforward-broker`) are written against.
//!
//! Invariants:
//! - No module in this crate performs I/O.
//! - No module in this crate reads the wall clock directly; see
//!   [`core::time::Clock`].

pub mod core;
pub mod interfaces;

pub use crate::core::application_filter::is_application_admitted;
pub use crate::core::application_filter::APPLICATION_GROUPS;
pub use crate::core::error::ErrorClass;
pub use crate::core::error::ProcessingError;
pub use crate::core::identifiers::ApplicationName;
pub use crate::core::identifiers::ConfigId;
pub use crate::core::identifiers::TenantId;
pub use crate::core::model::CredentialBundle;
pub use crate::core::model::DeliveryConfig;
pub use crate::core::model::DeliveryConfigKind;
pub use crate::core::model::DeliveryOutcome;
pub use crate::core::model::DeliveryStats;
pub use crate::core::model::DestinationEvent;
pub use crate::core::model::LogRecord;
pub use crate::core::model::Message;
pub use crate::core::model::NotificationEnvelope;
pub use crate::core::model::ObjectReference;
pub use crate::core::model::ProcessingMetadata;
pub use crate::core::model::RejectionSummary;
pub use crate::core::model::TenantKey;
pub use crate::core::time::Clock;
pub use crate::core::time::EpochMillis;
pub use crate::core::time::FixedClock;
pub use crate::core::time::SystemClock;
pub use crate::interfaces::CredentialProvider;
pub use crate::interfaces::Deliverer;
pub use crate::interfaces::Fetcher;
pub use crate::interfaces::MetricsSink;
pub use crate::interfaces::ObjectLister;
pub use crate::interfaces::QueueClient;
pub use crate::interfaces::QueueMessage;
pub use crate::interfaces::RawDeliveryConfigRow;
pub use crate::interfaces::TenantConfigStore;
