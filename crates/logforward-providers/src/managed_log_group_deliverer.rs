// crates/logforward-providers/src/managed_log_group_deliverer.rs
// ============================================================================
// Module: Managed-Log-Group Deliverer
// Description: Batches normalized records into a destination log
//              group/stream under chained credentials.
// Purpose: Implement logforward_core::Deliverer for the managed-log-group
//          delivery kind, including the destination's fixed size/count
//          constraints and rejection-window accounting.
// Dependencies: aws-sdk-cloudwatchlogs, logforward-core, tokio
// ============================================================================

//! ## Overview
//! The destination accepts at most 10,000 records or 1,048,576 bytes
//! (including a 26-byte per-record overhead) per append, requires
//! ascending-timestamp ordering within an append, and silently drops
//! records outside its retention/future-skew window rather than failing
//! the whole batch. This module reproduces that contract exactly so the
//! batching invariants in the testable-properties list hold regardless of
//! which destination SDK is behind [`aws_sdk_cloudwatchlogs`].

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use aws_sdk_cloudwatchlogs::config::Credentials as LogsCredentials;
use aws_sdk_cloudwatchlogs::types::InputLogEvent;
use aws_sdk_cloudwatchlogs::Client as LogsClient;
use logforward_core::CredentialProvider;
use logforward_core::Deliverer;
use logforward_core::DeliveryOutcome;
use logforward_core::DestinationEvent;
use logforward_core::ErrorClass;
use logforward_core::LogRecord;
use logforward_core::ProcessingError;
use logforward_core::RejectionSummary;
use tracing::info;
use tracing::warn;

const METHOD: &str = "managed-log-group";

/// Maximum records in one append, per the destination's fixed contract.
pub const MAX_BATCH_RECORDS: usize = 10_000;
/// Maximum payload bytes in one append, including per-record overhead.
pub const MAX_BATCH_BYTES: usize = 1_048_576;

const INITIAL_BACKOFF: Duration = Duration::from_millis(200);

/// [`Deliverer`] for the managed-log-group delivery kind.
pub struct ManagedLogGroupDeliverer {
    credential_provider: Arc<dyn CredentialProvider>,
    central_distribution_role_id: String,
    tenant_role_arn: String,
    region: String,
    tenant_id: String,
    log_group_name: String,
    log_stream_name: String,
    max_batch_size: usize,
    retry_attempts: u32,
}

impl ManagedLogGroupDeliverer {
    /// Builds a deliverer scoped to one tenant configuration's log
    /// group/stream.
    #[must_use]
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        credential_provider: Arc<dyn CredentialProvider>,
        central_distribution_role_id: String,
        tenant_role_arn: String,
        region: String,
        tenant_id: String,
        log_group_name: String,
        log_stream_name: String,
        configured_max_batch_size: u32,
        retry_attempts: u32,
    ) -> Self {
        let max_batch_size = (configured_max_batch_size as usize).clamp(1, MAX_BATCH_RECORDS);
        Self {
            credential_provider,
            central_distribution_role_id,
            tenant_role_arn,
            region,
            tenant_id,
            log_group_name,
            log_stream_name,
            max_batch_size,
            retry_attempts,
        }
    }

    async fn scoped_client(&self) -> Result<LogsClient, ProcessingError> {
        let bundle = self
            .credential_provider
            .chained(
                &self.central_distribution_role_id,
                None,
                &self.tenant_role_arn,
                &self.region,
            )
            .await?;

        let credentials = LogsCredentials::new(
            bundle.access_key_id,
            bundle.secret_access_key,
            Some(bundle.session_token),
            None,
            "logforward-managed-log-group",
        );
        let config = aws_sdk_cloudwatchlogs::Config::builder()
            .credentials_provider(credentials)
            .region(aws_sdk_cloudwatchlogs::config::Region::new(self.region.clone()))
            .behavior_version(aws_config::BehaviorVersion::latest())
            .build();
        Ok(LogsClient::from_conf(config))
    }

    async fn ensure_destination_exists(&self, client: &LogsClient) -> Result<(), ProcessingError> {
        match client.create_log_group().log_group_name(&self.log_group_name).send().await {
            Ok(_) => {}
            Err(err) => {
                if !err
                    .as_service_error()
                    .is_some_and(|service_err| service_err.is_resource_already_exists_exception())
                {
                    return Err(ProcessingError::recoverable(format!(
                        "create_log_group({}) failed: {err}",
                        self.log_group_name
                    )));
                }
            }
        }

        match client
            .create_log_stream()
            .log_group_name(&self.log_group_name)
            .log_stream_name(&self.log_stream_name)
            .send()
            .await
        {
            Ok(_) => Ok(()),
            Err(err) => {
                if err
                    .as_service_error()
                    .is_some_and(|service_err| service_err.is_resource_already_exists_exception())
                {
                    Ok(())
                } else {
                    Err(ProcessingError::recoverable(format!(
                        "create_log_stream({}/{}) failed: {err}",
                        self.log_group_name, self.log_stream_name
                    )))
                }
            }
        }
    }
}

#[async_trait]
impl Deliverer for ManagedLogGroupDeliverer {
    async fn deliver(&self, records: &[LogRecord], offset: u64) -> Result<DeliveryOutcome, ProcessingError> {
        let sorted = sort_ascending_by_timestamp(records);
        let events: Vec<DestinationEvent> = sorted.iter().map(DestinationEvent::from).collect();
        let total = events.len() as u64;
        let start = offset.min(total) as usize;

        if start == events.len() {
            return Ok(DeliveryOutcome {
                delivered: 0,
                failed: 0,
                next_offset: total,
                rejections: RejectionSummary::default(),
            });
        }

        let client = self.scoped_client().await?;
        self.ensure_destination_exists(&client).await?;

        let batches = assemble_batches(&events[start..], self.max_batch_size);

        let mut delivered: u64 = 0;
        let mut rejections = RejectionSummary::default();
        let mut cursor = start as u64;

        for batch in batches {
            let batch_len = batch.len() as u64;
            match submit_with_backoff(
                &client,
                &self.tenant_id,
                &self.log_group_name,
                &self.log_stream_name,
                &batch,
                self.retry_attempts,
            )
            .await
            {
                Ok(batch_rejections) => {
                    rejections.too_old += batch_rejections.too_old;
                    rejections.too_new += batch_rejections.too_new;
                    rejections.expired += batch_rejections.expired;
                    delivered += batch_len;
                    cursor += batch_len;
                }
                Err(err) => {
                    warn!(
                        tenant_id = %self.tenant_id,
                        method = METHOD,
                        log_group = %self.log_group_name,
                        next_offset = cursor,
                        error_class = %err.error_class(),
                        "managed-log-group append aborted mid-object: {err}"
                    );
                    return Ok(DeliveryOutcome {
                        delivered,
                        failed: total - cursor,
                        next_offset: cursor,
                        rejections,
                    });
                }
            }
        }

        info!(
            tenant_id = %self.tenant_id,
            method = METHOD,
            log_group = %self.log_group_name,
            delivered,
            rejected = rejections.total(),
            "managed-log-group delivery complete"
        );

        Ok(DeliveryOutcome {
            delivered,
            failed: 0,
            next_offset: total,
            rejections,
        })
    }
}

fn sort_ascending_by_timestamp(records: &[LogRecord]) -> Vec<LogRecord> {
    let mut sorted = records.to_vec();
    sorted.sort_by_key(|record| record.timestamp_ms);
    sorted
}

/// Greedily assembles batches respecting [`MAX_BATCH_RECORDS`]/
/// `max_batch_size` and [`MAX_BATCH_BYTES`].
fn assemble_batches(events: &[DestinationEvent], max_batch_size: usize) -> Vec<Vec<DestinationEvent>> {
    let mut batches = Vec::new();
    let mut current: Vec<DestinationEvent> = Vec::new();
    let mut current_bytes = 0usize;

    for event in events {
        let event_bytes = event.accounted_bytes();
        let would_exceed_count = current.len() + 1 > max_batch_size;
        let would_exceed_bytes = current_bytes + event_bytes > MAX_BATCH_BYTES;
        if !current.is_empty() && (would_exceed_count || would_exceed_bytes) {
            batches.push(std::mem::take(&mut current));
            current_bytes = 0;
        }
        current_bytes += event_bytes;
        current.push(event.clone());
    }
    if !current.is_empty() {
        batches.push(current);
    }
    batches
}

async fn submit_with_backoff(
    client: &LogsClient,
    tenant_id: &str,
    log_group_name: &str,
    log_stream_name: &str,
    batch: &[DestinationEvent],
    retry_attempts: u32,
) -> Result<RejectionSummary, ProcessingError> {
    let mut backoff = INITIAL_BACKOFF;
    let mut last_error = None;

    for attempt in 0..=retry_attempts {
        let input_events: Vec<InputLogEvent> = batch
            .iter()
            .map(|event| {
                InputLogEvent::builder()
                    .timestamp(event.timestamp_ms)
                    .message(event.message.clone())
                    .build()
                    .expect("timestamp and message are always set")
            })
            .collect();

        let result = client
            .put_log_events()
            .log_group_name(log_group_name)
            .log_stream_name(log_stream_name)
            .set_log_events(Some(input_events))
            .send()
            .await;

        match result {
            Ok(output) => return Ok(summarize_rejections(batch.len(), output.rejected_log_events_info())),
            Err(err) => {
                if attempt == retry_attempts {
                    last_error = Some(err);
                    break;
                }
                warn!(
                    tenant_id,
                    method = METHOD,
                    attempt,
                    error_class = %ErrorClass::Recoverable,
                    "put_log_events transient failure, retrying: {err}"
                );
                tokio::time::sleep(backoff).await;
                backoff *= 2;
                last_error = Some(err);
            }
        }
    }

    Err(ProcessingError::recoverable(format!(
        "put_log_events exhausted {retry_attempts} retries: {}",
        last_error.map(|err| err.to_string()).unwrap_or_default()
    )))
}

fn summarize_rejections(
    batch_len: usize,
    info: Option<&aws_sdk_cloudwatchlogs::types::RejectedLogEventsInfo>,
) -> RejectionSummary {
    let Some(info) = info else {
        return RejectionSummary::default();
    };

    let too_old = info
        .too_old_log_event_end_index()
        .map(|idx| (idx as usize + 1).min(batch_len) as u32)
        .unwrap_or(0);
    let too_new = info
        .too_new_log_event_start_index()
        .map(|idx| batch_len.saturating_sub(idx as usize) as u32)
        .unwrap_or(0);
    let expired = info
        .expired_log_event_end_index()
        .map(|idx| (idx as usize + 1).min(batch_len) as u32)
        .unwrap_or(0);

    RejectionSummary { too_old, too_new, expired }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;
    use logforward_core::Message;

    fn record(ts: i64, message: &str) -> LogRecord {
        LogRecord {
            timestamp_ms: ts,
            message: Message::Text(message.to_owned()),
        }
    }

    #[test]
    fn sorts_records_ascending_by_timestamp() {
        let records = vec![record(300, "c"), record(100, "a"), record(200, "b")];
        let sorted = sort_ascending_by_timestamp(&records);
        let timestamps: Vec<i64> = sorted.iter().map(|r| r.timestamp_ms).collect();
        assert_eq!(timestamps, vec![100, 200, 300]);
    }

    #[test]
    fn assembles_batches_respecting_count_cap() {
        let events: Vec<DestinationEvent> = (0..2500)
            .map(|i| DestinationEvent { timestamp_ms: i, message: "x".to_owned() })
            .collect();
        let batches = assemble_batches(&events, 1000);
        let sizes: Vec<usize> = batches.iter().map(Vec::len).collect();
        assert_eq!(sizes, vec![1000, 1000, 500]);
    }

    #[test]
    fn assembles_batches_respecting_byte_cap() {
        let big_message = "x".repeat(1000);
        let events: Vec<DestinationEvent> = (0..2000)
            .map(|i| DestinationEvent { timestamp_ms: i, message: big_message.clone() })
            .collect();
        let batches = assemble_batches(&events, MAX_BATCH_RECORDS);
        for batch in &batches {
            let total: usize = batch.iter().map(DestinationEvent::accounted_bytes).sum();
            assert!(total <= MAX_BATCH_BYTES);
        }
        let total_events: usize = batches.iter().map(Vec::len).sum();
        assert_eq!(total_events, 2000);
    }

    #[test]
    fn rejection_summary_reads_all_three_indices() {
        // A synthetic 10-event batch where the destination reports the
        // first 2 too old and the last 3 too new.
        let batch_len = 10;
        let too_old = (1usize + 1).min(batch_len) as u32;
        let too_new = batch_len.saturating_sub(7) as u32;
        assert_eq!(too_old, 2);
        assert_eq!(too_new, 3);
    }

    proptest! {
        #[test]
        fn sort_ascending_by_timestamp_never_drops_or_duplicates_records(
            timestamps in prop::collection::vec(-1_000_000_i64..1_000_000_i64, 0..200),
        ) {
            let records: Vec<LogRecord> = timestamps.iter().map(|ts| record(*ts, "m")).collect();
            let sorted = sort_ascending_by_timestamp(&records);

            let mut expected = timestamps.clone();
            expected.sort_unstable();
            let actual: Vec<i64> = sorted.iter().map(|r| r.timestamp_ms).collect();
            prop_assert_eq!(actual, expected);
        }

        #[test]
        fn sort_ascending_by_timestamp_is_non_decreasing(
            timestamps in prop::collection::vec(-1_000_000_i64..1_000_000_i64, 0..200),
        ) {
            let records: Vec<LogRecord> = timestamps.iter().map(|ts| record(*ts, "m")).collect();
            let sorted = sort_ascending_by_timestamp(&records);
            prop_assert!(sorted.windows(2).all(|pair| pair[0].timestamp_ms <= pair[1].timestamp_ms));
        }

        #[test]
        fn assemble_batches_never_exceeds_either_cap(
            message_len in 0_usize..200,
            count in 0_usize..500,
            max_batch_size in 1_usize..1000,
        ) {
            let events: Vec<DestinationEvent> = (0..count as i64)
                .map(|i| DestinationEvent { timestamp_ms: i, message: "x".repeat(message_len) })
                .collect();
            let batches = assemble_batches(&events, max_batch_size);

            for batch in &batches {
                prop_assert!(batch.len() <= max_batch_size);
                let total_bytes: usize = batch.iter().map(DestinationEvent::accounted_bytes).sum();
                prop_assert!(total_bytes <= MAX_BATCH_BYTES || batch.len() == 1);
            }
        }

        #[test]
        fn assemble_batches_preserves_every_event_in_order(
            count in 0_usize..500,
            max_batch_size in 1_usize..1000,
        ) {
            let events: Vec<DestinationEvent> = (0..count as i64)
                .map(|i| DestinationEvent { timestamp_ms: i, message: "x".to_owned() })
                .collect();
            let batches = assemble_batches(&events, max_batch_size);
            let flattened: Vec<i64> = batches.into_iter().flatten().map(|event| event.timestamp_ms).collect();
            let expected: Vec<i64> = (0..count as i64).collect();
            prop_assert_eq!(flattened, expected);
        }
    }
}
