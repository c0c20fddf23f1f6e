// crates/logforward-providers/src/sqs_queue_client.rs
// ============================================================================
// Module: SQS Queue Client
// Description: QueueClient implementation against the notification queue.
// Purpose: Back the Poller ingestion front end and the re-queue/offset
//          protocol's continuation enqueue.
// Dependencies: aws-sdk-sqs, logforward-core
// ============================================================================

use async_trait::async_trait;
use aws_sdk_sqs::Client as SqsClient;
use logforward_core::ProcessingError;
use logforward_core::QueueClient;
use logforward_core::QueueMessage;

/// [`QueueClient`] backed by the notification queue.
pub struct SqsQueueClient {
    client: SqsClient,
    queue_url: String,
}

impl SqsQueueClient {
    /// Builds a client bound to one queue URL.
    #[must_use]
    pub fn new(client: SqsClient, queue_url: impl Into<String>) -> Self {
        Self {
            client,
            queue_url: queue_url.into(),
        }
    }
}

#[async_trait]
impl QueueClient for SqsQueueClient {
    async fn receive(&self, max_messages: u32, wait_seconds: u32) -> Result<Vec<QueueMessage>, ProcessingError> {
        let capped_wait = wait_seconds.min(20);
        let output = self
            .client
            .receive_message()
            .queue_url(&self.queue_url)
            .max_number_of_messages(max_messages.min(10) as i32)
            .wait_time_seconds(capped_wait as i32)
            .send()
            .await
            .map_err(|err| ProcessingError::recoverable(format!("receive_message failed: {err}")))?;

        Ok(output
            .messages
            .unwrap_or_default()
            .into_iter()
            .filter_map(|message| {
                let receipt_handle = message.receipt_handle?;
                let body = message.body?;
                Some(QueueMessage { receipt_handle, body })
            })
            .collect())
    }

    async fn delete(&self, receipt_handle: &str) -> Result<(), ProcessingError> {
        self.client
            .delete_message()
            .queue_url(&self.queue_url)
            .receipt_handle(receipt_handle)
            .send()
            .await
            .map_err(|err| ProcessingError::recoverable(format!("delete_message failed: {err}")))?;
        Ok(())
    }

    async fn send(&self, body: &str, delay_seconds: u32) -> Result<(), ProcessingError> {
        self.client
            .send_message()
            .queue_url(&self.queue_url)
            .message_body(body)
            .delay_seconds(delay_seconds.min(900) as i32)
            .send()
            .await
            .map_err(|err| ProcessingError::recoverable(format!("send_message failed: {err}")))?;
        Ok(())
    }
}
