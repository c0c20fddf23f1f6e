// crates/logforward-broker/src/ingestion/scanner.rs
// ============================================================================
// Module: Scanner Front End
// Description: Lists a bucket on an interval, synthesizes notification
//              envelopes, and invokes the orchestrator directly.
// Purpose: Development-only front end for environments with no queue
//          wired up yet.
// Dependencies: logforward-core, tokio
// ============================================================================

//! ## Overview
//! There is no queue to delete from or abandon, so outcomes are only
//! logged. This front end exists purely so the rest of the pipeline can
//! be exercised against a populated bucket without standing up a
//! notification topic.

use std::sync::Arc;
use std::time::Duration;

use logforward_core::ObjectLister;
use serde_json::json;
use tracing::error;
use tracing::info;
use tracing::warn;

use crate::orchestrator::MessageOutcome;
use crate::orchestrator::Orchestrator;

/// Scans `bucket` every `interval` until `shutdown` resolves, running
/// every listed key through `orchestrator`.
pub async fn run_scan(
    orchestrator: Arc<Orchestrator>,
    lister: Arc<dyn ObjectLister>,
    bucket: String,
    interval: Duration,
    shutdown: impl std::future::Future<Output = ()>,
) {
    tokio::pin!(shutdown);
    let mut ticker = tokio::time::interval(interval);

    loop {
        tokio::select! {
            () = &mut shutdown => {
                info!("scanner received shutdown signal");
                break;
            }
            _ = ticker.tick() => {
                scan_once(&orchestrator, lister.as_ref(), &bucket).await;
            }
        }
    }
}

async fn scan_once(orchestrator: &Orchestrator, lister: &dyn ObjectLister, bucket: &str) {
    let keys = match lister.list(bucket).await {
        Ok(keys) => keys,
        Err(err) => {
            warn!("bucket scan failed: {err}");
            return;
        }
    };

    for key in keys {
        let body = synthesize_envelope(bucket, &key);
        match orchestrator.process(&body, &key).await {
            MessageOutcome::Delivered | MessageOutcome::Continued => {
                info!(bucket, key, "scan-triggered delivery complete");
            }
            MessageOutcome::NonRecoverable => {
                error!(bucket, key, "scan-triggered delivery failed non-recoverably");
            }
            MessageOutcome::Recoverable => {
                warn!(bucket, key, "scan-triggered delivery failed recoverably; will retry next scan");
            }
        }
    }
}

/// Builds the same wire envelope shape the queue would have delivered,
/// so the orchestrator never needs to know its caller was a scan.
fn synthesize_envelope(bucket: &str, key: &str) -> String {
    let inner = json!({
        "Records": [{"s3": {"bucket": {"name": bucket}, "object": {"key": key}}}],
    });
    json!({"Message": inner.to_string()}).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn synthesizes_a_valid_notification_envelope() {
        let body = synthesize_envelope("source-bucket", "cluster1/acme/payment/pod1/a.json");
        let decoded = crate::envelope::decode_message_body(&body).unwrap();
        assert_eq!(decoded.envelope.records[0].bucket, "source-bucket");
        assert_eq!(decoded.envelope.records[0].key, "cluster1/acme/payment/pod1/a.json");
    }
}
