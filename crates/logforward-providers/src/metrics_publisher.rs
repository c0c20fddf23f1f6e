// crates/logforward-providers/src/metrics_publisher.rs
// ============================================================================
// Module: Metrics Publisher
// Description: Emits count metrics keyed by tenant and delivery method.
// Purpose: Implement logforward_core::MetricsSink against the metrics
//          backing service.
// Dependencies: aws-sdk-cloudwatch, logforward-core
// ============================================================================

//! ## Overview
//! Metric names follow `LogCount/<method>/<dimension>` under a single
//! stable namespace. Publish failures are logged, never propagated as a
//! processing failure — spec §4.10: "Publish failures are logged but do
//! not fail the overall message."

use async_trait::async_trait;
use aws_sdk_cloudwatch::types::Dimension;
use aws_sdk_cloudwatch::types::MetricDatum;
use aws_sdk_cloudwatch::types::StandardUnit;
use aws_sdk_cloudwatch::Client as CloudWatchClient;
use logforward_core::ErrorClass;
use logforward_core::MetricsSink;
use logforward_core::ProcessingError;
use tracing::warn;

/// Default metric namespace, per spec §6.
pub const DEFAULT_NAMESPACE: &str = "LogForwarding";

/// [`MetricsSink`] backed by the metrics backing service.
pub struct CloudWatchMetricsPublisher {
    client: CloudWatchClient,
    namespace: String,
}

impl CloudWatchMetricsPublisher {
    /// Builds a publisher against the given namespace.
    #[must_use]
    pub fn new(client: CloudWatchClient, namespace: impl Into<String>) -> Self {
        Self {
            client,
            namespace: namespace.into(),
        }
    }
}

#[async_trait]
impl MetricsSink for CloudWatchMetricsPublisher {
    async fn emit_count(
        &self,
        tenant_id: &str,
        method: &str,
        dimension: &str,
        value: u64,
    ) -> Result<(), ProcessingError> {
        let metric_name = format!("LogCount/{method}/{dimension}");
        let datum = MetricDatum::builder()
            .metric_name(&metric_name)
            .unit(StandardUnit::Count)
            .value(value as f64)
            .dimensions(Dimension::builder().name("tenant_id").value(tenant_id).build())
            .build();

        let result = self
            .client
            .put_metric_data()
            .namespace(&self.namespace)
            .metric_data(datum)
            .send()
            .await;

        if let Err(err) = result {
            // Publish failures never fail the overall message, so they are
            // always recoverable from the pipeline's point of view.
            warn!(
                tenant_id,
                method,
                dimension,
                error_class = %ErrorClass::Recoverable,
                "metric publish failed: {err}"
            );
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    #[test]
    fn metric_name_follows_method_dimension_convention() {
        let name = format!("LogCount/{}/{}", "managed-log-group", "successful_events");
        assert_eq!(name, "LogCount/managed-log-group/successful_events");
    }
}
