// crates/logforward-providers/src/lib.rs
// ============================================================================
// Module: Log Forwarder Providers
// Description: Concrete backend adapters implementing logforward-core's
//              interfaces against AWS services.
// Purpose: Isolate every AWS SDK dependency behind the trait boundary
//          logforward-broker and logforward-core's tests are written
//          against.
// Dependencies: aws-sdk-cloudwatch, aws-sdk-cloudwatchlogs, aws-sdk-s3,
//               aws-sdk-sqs, aws-sdk-sts, flate2, logforward-core
// ============================================================================

//! ## Overview
//! Each module here implements exactly one trait from
//! `logforward_core::interfaces`: [`credential_broker::StsCredentialBroker`]
//! implements `CredentialProvider`, [`object_decoder::S3Fetcher`]
//! implements `Fetcher`, [`managed_log_group_deliverer::ManagedLogGroupDeliverer`]
//! and [`object_store_deliverer::ObjectStoreDeliverer`] implement
//! `Deliverer`, [`metrics_publisher::CloudWatchMetricsPublisher`]
//! implements `MetricsSink`, and
//! [`tenant_config_store::InMemoryTenantConfigStore`] implements
//! `TenantConfigStore` for development and tests.

pub mod credential_broker;
pub mod managed_log_group_deliverer;
pub mod metrics_publisher;
pub mod object_decoder;
pub mod object_store_deliverer;
pub mod sqs_queue_client;
pub mod tenant_config_store;

pub use crate::credential_broker::StsCredentialBroker;
pub use crate::managed_log_group_deliverer::ManagedLogGroupDeliverer;
pub use crate::metrics_publisher::CloudWatchMetricsPublisher;
pub use crate::object_decoder::decode_object;
pub use crate::object_decoder::S3Fetcher;
pub use crate::object_decoder::S3ObjectLister;
pub use crate::object_store_deliverer::ObjectStoreDeliverer;
pub use crate::sqs_queue_client::SqsQueueClient;
pub use crate::tenant_config_store::InMemoryTenantConfigStore;
