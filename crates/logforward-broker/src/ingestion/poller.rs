// crates/logforward-broker/src/ingestion/poller.rs
// ============================================================================
// Module: Poller Front End
// Description: Long-polls the queue, runs the orchestrator per message,
//              and acknowledges or abandons according to outcome.
// Purpose: The long-running process mode; the one front end with its own
//          shutdown signal handling.
// Dependencies: logforward-core, tokio
// ============================================================================

//! ## Overview
//! On [`crate::orchestrator::MessageOutcome::Delivered`] or `Continued`
//! the message is deleted. On `NonRecoverable` it is also deleted (after
//! a failure metric) so it never blocks the queue; the dead-letter
//! policy, configured outside this crate, is what catches it. On
//! `Recoverable` nothing is done: the message becomes visible again once
//! its visibility timeout elapses.

use std::sync::Arc;

use logforward_core::MetricsSink;
use logforward_core::QueueClient;
use tracing::error;
use tracing::info;
use tracing::warn;

use crate::orchestrator::MessageOutcome;
use crate::orchestrator::Orchestrator;

const RECEIVE_BATCH_SIZE: u32 = 10;
const LONG_POLL_WAIT_SECONDS: u32 = 20;

/// Runs the long-poll loop until `shutdown` resolves.
///
/// The loop never returns an error: receive failures are logged and
/// retried on the next iteration, matching the "recoverable, redeliver"
/// philosophy applied to the queue itself.
pub async fn run_poller(
    orchestrator: Arc<Orchestrator>,
    queue: Arc<dyn QueueClient>,
    metrics: Arc<dyn MetricsSink>,
    shutdown: impl std::future::Future<Output = ()>,
) {
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            () = &mut shutdown => {
                info!("poller received shutdown signal");
                break;
            }
            received = queue.receive(RECEIVE_BATCH_SIZE, LONG_POLL_WAIT_SECONDS) => {
                match received {
                    Ok(messages) => {
                        for message in messages {
                            handle_one(&orchestrator, queue.as_ref(), metrics.as_ref(), &message.body, &message.receipt_handle).await;
                        }
                    }
                    Err(err) => warn!("queue receive failed: {err}"),
                }
            }
        }
    }
}

async fn handle_one(orchestrator: &Orchestrator, queue: &dyn QueueClient, metrics: &dyn MetricsSink, body: &str, receipt_handle: &str) {
    match orchestrator.process(body, receipt_handle).await {
        MessageOutcome::Delivered | MessageOutcome::Continued => {
            if let Err(err) = queue.delete(receipt_handle).await {
                warn!("failed to delete acknowledged message: {err}");
            }
        }
        MessageOutcome::NonRecoverable => {
            error!(receipt_handle, "non-recoverable failure; deleting and relying on dead-letter policy");
            let _ = metrics.emit_count("unknown", "orchestrator", "failed_delivery", 1).await;
            if let Err(err) = queue.delete(receipt_handle).await {
                warn!("failed to delete non-recoverably failed message: {err}");
            }
        }
        MessageOutcome::Recoverable => {
            warn!(receipt_handle, "recoverable failure; abandoning for redelivery");
        }
    }
}
