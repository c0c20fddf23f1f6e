// crates/logforward-broker/src/ingestion/handler.rs
// ============================================================================
// Module: Handler Front End
// Description: Accepts one batch of queue records per invocation.
// Purpose: Implement the partial-batch-failure contract: items omitted
//          from the response are treated as successfully processed and
//          deleted; items included are redelivered.
// Dependencies: logforward-core, tokio
// ============================================================================

use tracing::error;

use crate::orchestrator::MessageOutcome;
use crate::orchestrator::Orchestrator;

/// One record handed to the handler invocation: an opaque identifier (the
/// queue's receipt handle) plus the raw message body.
#[derive(Debug, Clone)]
pub struct BatchRecord {
    /// Identifier reported back in [`BatchItemFailure`] on recoverable
    /// failure.
    pub item_identifier: String,
    /// Raw notification or continuation envelope body.
    pub body: String,
}

/// One record to redeliver, per the partial-batch-failure contract.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchItemFailure {
    /// Echoes [`BatchRecord::item_identifier`].
    pub item_identifier: String,
}

/// Handler invocation's return value: the subset of the batch that must
/// be redelivered.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchResponse {
    /// Records omitted here are treated as done and deleted by the
    /// caller's own runtime; records listed here are redelivered.
    pub batch_item_failures: Vec<BatchItemFailure>,
}

/// Runs every record in `batch` through `orchestrator` and reports which
/// ones need redelivery.
///
/// Each record's own delivery fan-out already runs concurrently inside
/// the orchestrator; records within the batch are processed in order,
/// which keeps this front end free of any need to share the orchestrator
/// across spawned tasks.
///
/// Non-recoverable outcomes are never reported as failures: per the error
/// handling design, a non-recoverable failure deletes the message and
/// relies on the dead-letter policy rather than this batch's retry.
pub async fn handle_batch(orchestrator: &Orchestrator, batch: Vec<BatchRecord>) -> BatchResponse {
    let mut failures = Vec::new();

    for record in &batch {
        match orchestrator.process(&record.body, &record.item_identifier).await {
            MessageOutcome::Recoverable => {
                failures.push(BatchItemFailure { item_identifier: record.item_identifier.clone() });
            }
            MessageOutcome::NonRecoverable => {
                error!(item_identifier = %record.item_identifier, "non-recoverable failure; relying on dead-letter policy");
            }
            MessageOutcome::Delivered | MessageOutcome::Continued => {}
        }
    }

    BatchResponse { batch_item_failures: failures }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn batch_response_defaults_to_no_failures() {
        assert!(BatchResponse::default().batch_item_failures.is_empty());
    }
}
