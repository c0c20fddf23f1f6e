// crates/logforward-broker/src/requeue.rs
// ============================================================================
// Module: Re-queue / Offset Protocol
// Description: Builds and enqueues continuation messages for mid-object
//              partial progress.
// Purpose: Separate the continuation transformer and enqueue side effect
//          from the orchestrator, for testability.
// Dependencies: logforward-core
// ============================================================================

//! ## Overview
//! Triggered only when a managed-log-group delivery returns
//! `next_offset > 0` with `delivered < total`. The continuation carries
//! the original envelope verbatim plus updated offset/retry-count
//! metadata and is enqueued with zero visibility delay so it is
//! immediately eligible for redelivery. `retry_count` is capped at 3;
//! beyond the cap the protocol refuses to continue and the caller must
//! surface a non-recoverable failure.

use logforward_core::ProcessingError;
use logforward_core::ProcessingMetadata;
use logforward_core::QueueClient;

use crate::envelope::encode_continuation;
use crate::envelope::DecodedMessage;

/// Hard cap on continuation attempts per object, per spec §4.9.
pub const MAX_RETRY_COUNT: u32 = 3;

/// Outcome of attempting to continue a partially delivered object.
pub enum RequeueOutcome {
    /// A continuation was built and enqueued; the current message should
    /// be reported successful.
    Continued,
    /// `retry_count` would exceed [`MAX_RETRY_COUNT`]; the caller must
    /// treat this as a non-recoverable failure and rely on the queue's
    /// dead-letter policy.
    RetryCapExceeded,
}

/// Builds a continuation from `decoded` and `next_offset`, enqueues it,
/// and reports whether the retry cap was exceeded.
///
/// # Errors
/// Returns a recoverable [`ProcessingError`] when the enqueue itself
/// fails.
pub async fn requeue_continuation(
    queue: &dyn QueueClient,
    decoded: &DecodedMessage,
    receipt_handle: &str,
    next_offset: u64,
    requeued_at_ms: i64,
) -> Result<RequeueOutcome, ProcessingError> {
    let prev_retry_count = decoded.processing_metadata.as_ref().map_or(0, |m| m.retry_count);
    let retry_count = prev_retry_count + 1;

    if retry_count > MAX_RETRY_COUNT {
        return Ok(RequeueOutcome::RetryCapExceeded);
    }

    let metadata = ProcessingMetadata {
        offset: next_offset,
        retry_count,
        original_receipt_handle: decoded
            .processing_metadata
            .as_ref()
            .map_or_else(|| receipt_handle.to_owned(), |m| m.original_receipt_handle.clone()),
        requeued_at_ms,
    };

    let body = encode_continuation(decoded, &metadata);
    queue
        .send(&body, 0)
        .await
        .map_err(|err| ProcessingError::recoverable(format!("re-queue enqueue failed: {err}")))?;

    Ok(RequeueOutcome::Continued)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::envelope::decode_message_body;
    use async_trait::async_trait;
    use logforward_core::QueueMessage;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingQueue {
        sent: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl QueueClient for RecordingQueue {
        async fn receive(&self, _max_messages: u32, _wait_seconds: u32) -> Result<Vec<QueueMessage>, ProcessingError> {
            Ok(vec![])
        }

        async fn delete(&self, _receipt_handle: &str) -> Result<(), ProcessingError> {
            Ok(())
        }

        async fn send(&self, body: &str, _delay_seconds: u32) -> Result<(), ProcessingError> {
            self.sent.lock().unwrap().push(body.to_owned());
            Ok(())
        }
    }

    fn sample_body() -> String {
        r#"{"Message":"{\"Records\":[{\"s3\":{\"bucket\":{\"name\":\"b\"},\"object\":{\"key\":\"k\"}}}]}"}"#.to_owned()
    }

    #[tokio::test]
    async fn continues_and_increments_retry_count() {
        let decoded = decode_message_body(&sample_body()).unwrap();
        let queue = RecordingQueue::default();
        let outcome = requeue_continuation(&queue, &decoded, "rh-1", 1400, 1_700_000_000_000)
            .await
            .unwrap();
        assert!(matches!(outcome, RequeueOutcome::Continued));
        assert_eq!(queue.sent.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn refuses_to_continue_past_retry_cap() {
        let mut decoded = decode_message_body(&sample_body()).unwrap();
        decoded.processing_metadata = Some(ProcessingMetadata {
            offset: 1400,
            retry_count: 3,
            original_receipt_handle: "rh-0".to_owned(),
            requeued_at_ms: 0,
        });
        let queue = RecordingQueue::default();
        let outcome = requeue_continuation(&queue, &decoded, "rh-3", 1500, 0).await.unwrap();
        assert!(matches!(outcome, RequeueOutcome::RetryCapExceeded));
        assert!(queue.sent.lock().unwrap().is_empty());
    }
}
