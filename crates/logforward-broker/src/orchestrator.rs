// crates/logforward-broker/src/orchestrator.rs
// ============================================================================
// Module: Orchestrator
// Description: Drives one queue message end-to-end: decode, resolve,
//              filter, decode the object, fan out, re-queue, meter.
// Purpose: The single place that sequences every other component for one
//          notification.
// Dependencies: logforward-core, logforward-providers, tokio
// ============================================================================

//! ## Overview
//! One [`Orchestrator::process`] call owns everything for the lifetime of
//! one queue message, per the data model's ownership note. Deliveries for
//! distinct destinations of the same tenant run concurrently on a
//! `tokio::task::JoinSet`, sharing the decoded record list through an
//! `Arc<[LogRecord]>`; cancellation is bounded by a deadline tighter than
//! the message's visibility timeout.

use std::sync::Arc;
use std::time::Duration;

use logforward_core::Clock;
use logforward_core::DeliveryConfigKind;
use logforward_core::DeliveryStats;
use logforward_core::Fetcher;
use logforward_core::LogRecord;
use logforward_core::MetricsSink;
use logforward_core::ProcessingError;
use logforward_core::QueueClient;
use logforward_core::SystemClock;
use logforward_core::TenantKey;
use logforward_providers::decode_object;
use tokio::task::JoinSet;
use tracing::error;
use tracing::info;
use tracing::warn;

use crate::deliver::DelivererFactory;
use crate::envelope::decode_message_body;
use crate::envelope::DecodedMessage;
use crate::requeue::requeue_continuation;
use crate::requeue::RequeueOutcome;
use crate::tenant_resolver::TenantResolver;

/// Outcome of running one message through the orchestrator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageOutcome {
    /// The message (or a continuation covering the rest of it) was fully
    /// handled; delete it.
    Delivered,
    /// A continuation now owns the remaining work; delete the current
    /// message.
    Continued,
    /// Non-recoverable failure; delete the message and rely on the
    /// dead-letter policy.
    NonRecoverable,
    /// Recoverable failure; leave the message for redelivery.
    Recoverable,
}

/// Drives notification envelopes through resolution, filtering,
/// decoding, delivery, re-queue, and metrics.
pub struct Orchestrator {
    tenant_resolver: TenantResolver,
    deliverer_factory: Arc<dyn DelivererFactory>,
    fetcher: Arc<dyn Fetcher>,
    metrics: Arc<dyn MetricsSink>,
    queue: Arc<dyn QueueClient>,
    visibility_timeout: Duration,
}

impl Orchestrator {
    /// Builds an orchestrator from its collaborators.
    #[must_use]
    pub fn new(
        tenant_resolver: TenantResolver,
        deliverer_factory: Arc<dyn DelivererFactory>,
        fetcher: Arc<dyn Fetcher>,
        metrics: Arc<dyn MetricsSink>,
        queue: Arc<dyn QueueClient>,
        visibility_timeout: Duration,
    ) -> Self {
        Self {
            tenant_resolver,
            deliverer_factory,
            fetcher,
            metrics,
            queue,
            visibility_timeout,
        }
    }

    /// Processes one raw queue message body.
    ///
    /// Step numbers in comments below follow the orchestrator's 8-step
    /// sequence: decode envelope, derive tenant key, resolve tenant,
    /// filter by application, decode the object once, deliver per
    /// config, aggregate and re-queue on partial progress, emit metrics.
    pub async fn process(&self, body: &str, receipt_handle: &str) -> MessageOutcome {
        let decoded = match decode_message_body(body) {
            Ok(decoded) => decoded,
            Err(err) => return self.classify(&err),
        };

        // Deadline tighter than the message's visibility timeout, per
        // the concurrency model (recommended visibility - 30s).
        let deadline = self.visibility_timeout.saturating_sub(Duration::from_secs(30));

        match tokio::time::timeout(deadline, self.process_decoded(&decoded, receipt_handle)).await {
            Ok(result) => match result {
                Ok(outcome) => outcome,
                Err(err) => self.classify(&err),
            },
            Err(_elapsed) => {
                warn!("orchestration exceeded its deadline; awaiting in-flight batches was cut short");
                MessageOutcome::Recoverable
            }
        }
    }

    async fn process_decoded(
        &self,
        decoded: &DecodedMessage,
        receipt_handle: &str,
    ) -> Result<MessageOutcome, ProcessingError> {
        let mut _stats = DeliveryStats::default();

        for object_ref in &decoded.envelope.records {
            // Step 2: derive TenantKey.
            let tenant_key = TenantKey::parse(&object_ref.key)?;

            // Step 3: resolve tenant configurations.
            let configs = self.tenant_resolver.resolve(tenant_key.tenant_id.as_str()).await?;

            // Step 4: application filter.
            let admitted: Vec<_> = configs
                .into_iter()
                .filter(|config| {
                    logforward_core::is_application_admitted(config, tenant_key.application.as_str())
                })
                .collect();

            if admitted.is_empty() {
                info!(
                    tenant_id = %tenant_key.tenant_id,
                    application = %tenant_key.application,
                    "no configuration admits this application; skipping object"
                );
                continue;
            }

            // Step 5: decode the object once; shared read-only.
            let clock = SystemClock;
            let records: Arc<[LogRecord]> = decode_object(
                self.fetcher.as_ref(),
                &clock,
                &object_ref.bucket,
                &object_ref.key,
                tenant_key.is_gzip(),
            )
            .await?
            .into();

            let starting_offset = decoded.processing_metadata.as_ref().map_or(0, |m| m.offset);

            // Step 6: deliver to every admitted config, concurrently.
            let mut join_set = JoinSet::new();
            for config in admitted {
                let deliverer = self.deliverer_factory.build(&config, &tenant_key, &object_ref.bucket)?;
                let records = Arc::clone(&records);
                let kind = config.kind;
                let tenant_id = tenant_key.tenant_id.to_string();
                join_set.spawn(async move {
                    let outcome = deliverer.deliver(&records, starting_offset).await;
                    (tenant_id, kind, outcome)
                });
            }

            let mut max_next_offset: Option<u64> = None;
            let total = records.len() as u64;

            while let Some(joined) = join_set.join_next().await {
                let (tenant_id, kind, outcome) = joined
                    .map_err(|err| ProcessingError::recoverable(format!("delivery task panicked: {err}")))?;
                match outcome {
                    Ok(result) => {
                        _stats.successful_events += result.delivered;
                        _stats.failed_events += result.failed + u64::from(result.rejections.total());
                        _stats.successful_deliveries += 1;

                        self.emit_delivery_metrics(&tenant_id, kind, &result).await;

                        if result.next_offset > 0 && result.delivered < total {
                            max_next_offset = Some(max_next_offset.map_or(result.next_offset, |o| o.min(result.next_offset)));
                        }
                    }
                    Err(err) if err.is_non_recoverable() => return Err(err),
                    Err(err) => {
                        _stats.failed_deliveries += 1;
                        error!(
                            tenant_id,
                            method = kind.method_name(),
                            config_type = ?kind,
                            error_class = %err.error_class(),
                            "delivery failed: {err}"
                        );
                        return Err(err);
                    }
                }
            }

            // Step 7: partial progress triggers the re-queue protocol.
            if let Some(next_offset) = max_next_offset {
                let requeued_at_ms = SystemClock.now_millis();
                match requeue_continuation(self.queue.as_ref(), decoded, receipt_handle, next_offset, requeued_at_ms)
                    .await?
                {
                    RequeueOutcome::Continued => return Ok(MessageOutcome::Continued),
                    RequeueOutcome::RetryCapExceeded => {
                        return Err(ProcessingError::non_recoverable(
                            "retry_count cap exceeded on continuation",
                        ))
                    }
                }
            }
        }

        Ok(MessageOutcome::Delivered)
    }

    async fn emit_delivery_metrics(
        &self,
        tenant_id: &str,
        kind: DeliveryConfigKind,
        outcome: &logforward_core::DeliveryOutcome,
    ) {
        let method = kind.method_name();

        // Delivery-level counters for the managed-log-group path are
        // emitted only when at least one event was processed; event-count
        // dimensions only make sense for that path at all.
        let gate_for_events = kind != DeliveryConfigKind::ManagedLogGroup || outcome.delivered > 0 || outcome.failed > 0;

        if kind == DeliveryConfigKind::ManagedLogGroup && gate_for_events {
            let _ = self.metrics.emit_count(tenant_id, method, "successful_events", outcome.delivered).await;
            let _ = self
                .metrics
                .emit_count(tenant_id, method, "failed_events", outcome.failed + u64::from(outcome.rejections.total()))
                .await;
        }

        if gate_for_events {
            let success = u64::from(outcome.next_offset >= outcome.delivered && outcome.failed == 0);
            let _ = self.metrics.emit_count(tenant_id, method, "successful_delivery", success).await;
            let _ = self.metrics.emit_count(tenant_id, method, "failed_delivery", 1 - success).await;
        }
    }

    fn classify(&self, err: &ProcessingError) -> MessageOutcome {
        if err.is_non_recoverable() {
            MessageOutcome::NonRecoverable
        } else {
            MessageOutcome::Recoverable
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;
    use logforward_core::Deliverer;
    use logforward_core::DeliveryConfig;
    use logforward_core::DeliveryOutcome;
    use logforward_core::QueueMessage;
    use logforward_core::RawDeliveryConfigRow;
    use logforward_providers::InMemoryTenantConfigStore;

    use super::*;
    use crate::deliver::DelivererFactory;

    struct FixedFetcher {
        body: Vec<u8>,
    }

    #[async_trait]
    impl Fetcher for FixedFetcher {
        async fn fetch(&self, _bucket: &str, _key: &str) -> Result<Vec<u8>, ProcessingError> {
            Ok(self.body.clone())
        }
    }

    #[derive(Default)]
    struct RecordingMetrics {
        emitted: Mutex<Vec<(String, String, String, u64)>>,
    }

    #[async_trait]
    impl MetricsSink for RecordingMetrics {
        async fn emit_count(
            &self,
            tenant_id: &str,
            method: &str,
            dimension: &str,
            value: u64,
        ) -> Result<(), ProcessingError> {
            self.emitted.lock().unwrap().push((tenant_id.to_owned(), method.to_owned(), dimension.to_owned(), value));
            Ok(())
        }
    }

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

    struct ScriptedDeliverer {
        outcome: DeliveryOutcome,
    }

    #[async_trait]
    impl Deliverer for ScriptedDeliverer {
        async fn deliver(&self, _records: &[LogRecord], _offset: u64) -> Result<DeliveryOutcome, ProcessingError> {
            Ok(self.outcome)
        }
    }

    struct FixedDelivererFactory {
        deliverer: Arc<dyn Deliverer>,
    }

    impl DelivererFactory for FixedDelivererFactory {
        fn build(
            &self,
            _config: &DeliveryConfig,
            _tenant_key: &TenantKey,
            _source_bucket: &str,
        ) -> Result<Arc<dyn Deliverer>, ProcessingError> {
            Ok(Arc::clone(&self.deliverer))
        }
    }

    fn records_body(count: usize) -> Vec<u8> {
        let rows: Vec<_> = (0..count)
            .map(|i| serde_json::json!({"timestamp": 1_700_000_000_000i64 + i as i64, "message": format!("line-{i}")}))
            .collect();
        serde_json::to_vec(&rows).unwrap()
    }

    fn notification_body(bucket: &str, key: &str) -> String {
        let inner = serde_json::json!({
            "Records": [{"s3": {"bucket": {"name": bucket}, "object": {"key": key}}}],
        });
        serde_json::json!({"Message": inner.to_string()}).to_string()
    }

    fn managed_config(desired_logs: Vec<String>) -> RawDeliveryConfigRow {
        RawDeliveryConfigRow {
            id: "cfg-1".to_owned(),
            tenant_id: "acme".to_owned(),
            kind: "managed-log-group".to_owned(),
            enabled: Some(true),
            target_region: None,
            desired_logs: Some(desired_logs),
            groups: None,
            log_distribution_role_arn: Some("arn:aws:iam::1:role/acme-dist".to_owned()),
            log_group_name: Some("acme-logs".to_owned()),
            bucket_name: None,
            bucket_prefix: None,
        }
    }

    fn full_success(total: u64) -> DeliveryOutcome {
        DeliveryOutcome { delivered: total, failed: 0, next_offset: total, rejections: Default::default() }
    }

    async fn tenant_store_with(rows: Vec<RawDeliveryConfigRow>) -> Arc<InMemoryTenantConfigStore> {
        let store = Arc::new(InMemoryTenantConfigStore::new());
        store.set_rows("acme", rows).await;
        store
    }

    fn orchestrator(
        store: Arc<InMemoryTenantConfigStore>,
        deliverer: Arc<dyn Deliverer>,
        fetcher_body: Vec<u8>,
        metrics: Arc<RecordingMetrics>,
        queue: Arc<RecordingQueue>,
    ) -> Orchestrator {
        Orchestrator::new(
            TenantResolver::new(store),
            Arc::new(FixedDelivererFactory { deliverer }),
            Arc::new(FixedFetcher { body: fetcher_body }),
            metrics,
            queue,
            Duration::from_secs(900),
        )
    }

    #[tokio::test]
    async fn fresh_delivery_succeeds_and_emits_metrics() {
        let store = tenant_store_with(vec![managed_config(vec![])]).await;
        let metrics = Arc::new(RecordingMetrics::default());
        let queue = Arc::new(RecordingQueue::default());
        let orchestrator = orchestrator(
            store,
            Arc::new(ScriptedDeliverer { outcome: full_success(2500) }),
            records_body(2500),
            Arc::clone(&metrics),
            queue,
        );

        let body = notification_body("source-bucket", "cluster1/acme/payment/pod1/a.json");
        let outcome = orchestrator.process(&body, "rh-1").await;

        assert_eq!(outcome, MessageOutcome::Delivered);
        let emitted = metrics.emitted.lock().unwrap();
        assert!(emitted.iter().any(|(tenant, _, dim, value)| tenant == "acme" && dim == "successful_delivery" && *value == 1));
        assert!(emitted.iter().any(|(_, _, dim, value)| dim == "successful_events" && *value == 2500));
    }

    #[tokio::test]
    async fn application_filter_miss_skips_object_without_error() {
        let store = tenant_store_with(vec![managed_config(vec!["user-service".to_owned()])]).await;
        let metrics = Arc::new(RecordingMetrics::default());
        let queue = Arc::new(RecordingQueue::default());
        let orchestrator = orchestrator(
            store,
            Arc::new(ScriptedDeliverer { outcome: full_success(2500) }),
            records_body(2500),
            Arc::clone(&metrics),
            queue,
        );

        let body = notification_body("source-bucket", "cluster1/acme/payment/pod1/a.json");
        let outcome = orchestrator.process(&body, "rh-1").await;

        assert_eq!(outcome, MessageOutcome::Delivered);
        assert!(metrics.emitted.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn partial_progress_enqueues_a_continuation() {
        let store = tenant_store_with(vec![managed_config(vec![])]).await;
        let metrics = Arc::new(RecordingMetrics::default());
        let queue = Arc::new(RecordingQueue::default());
        let outcome = DeliveryOutcome { delivered: 1400, failed: 0, next_offset: 1400, rejections: Default::default() };
        let orchestrator = orchestrator(
            store,
            Arc::new(ScriptedDeliverer { outcome }),
            records_body(2500),
            Arc::clone(&metrics),
            Arc::clone(&queue),
        );

        let body = notification_body("source-bucket", "cluster1/acme/payment/pod1/a.json");
        let result = orchestrator.process(&body, "rh-1").await;

        assert_eq!(result, MessageOutcome::Continued);
        let sent = queue.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert!(sent[0].contains("\"offset\":1400"));
        assert!(sent[0].contains("\"retry_count\":1"));
    }

    #[tokio::test]
    async fn retry_cap_exceeded_is_non_recoverable() {
        let store = tenant_store_with(vec![managed_config(vec![])]).await;
        let metrics = Arc::new(RecordingMetrics::default());
        let queue = Arc::new(RecordingQueue::default());
        let outcome = DeliveryOutcome { delivered: 1400, failed: 0, next_offset: 1400, rejections: Default::default() };
        let orchestrator = orchestrator(
            store,
            Arc::new(ScriptedDeliverer { outcome }),
            records_body(2500),
            metrics,
            Arc::clone(&queue),
        );

        let inner = serde_json::json!({
            "Records": [{"s3": {"bucket": {"name": "source-bucket"}, "object": {"key": "cluster1/acme/payment/pod1/a.json"}}}],
        });
        let body = serde_json::json!({
            "Message": inner.to_string(),
            "processing_metadata": {
                "offset": 1000,
                "retry_count": 3,
                "original_receipt_handle": "rh-0",
                "requeued_at": 0,
            },
        })
        .to_string();

        let result = orchestrator.process(&body, "rh-3").await;

        assert_eq!(result, MessageOutcome::NonRecoverable);
        assert!(queue.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn unknown_tenant_is_non_recoverable() {
        let store = Arc::new(InMemoryTenantConfigStore::new());
        let metrics = Arc::new(RecordingMetrics::default());
        let queue = Arc::new(RecordingQueue::default());
        let orchestrator = orchestrator(
            store,
            Arc::new(ScriptedDeliverer { outcome: full_success(1) }),
            records_body(1),
            metrics,
            queue,
        );

        let body = notification_body("source-bucket", "cluster1/acme/payment/pod1/a.json");
        let outcome = orchestrator.process(&body, "rh-1").await;

        assert_eq!(outcome, MessageOutcome::NonRecoverable);
    }

    #[tokio::test]
    async fn malformed_envelope_is_non_recoverable() {
        let store = Arc::new(InMemoryTenantConfigStore::new());
        let metrics = Arc::new(RecordingMetrics::default());
        let queue = Arc::new(RecordingQueue::default());
        let orchestrator = orchestrator(
            store,
            Arc::new(ScriptedDeliverer { outcome: full_success(1) }),
            records_body(1),
            metrics,
            queue,
        );

        let outcome = orchestrator.process("not json", "rh-1").await;

        assert_eq!(outcome, MessageOutcome::NonRecoverable);
    }
}
