// crates/logforward-broker/src/envelope.rs
// ============================================================================
// Module: Notification Envelope Codec
// Description: Decodes the topic-wrapped object-store event and encodes
//              continuation envelopes.
// Purpose: Translate the wire shapes named in the external interfaces
//          section into logforward_core::NotificationEnvelope plus
//          ProcessingMetadata.
// Dependencies: logforward-core, serde, serde_json
// ============================================================================

//! ## Overview
//! The wire envelope is `{"Message": "<escaped JSON>"}` whose inner JSON
//! is `{"Records":[{"s3":{"bucket":{"name":...},"object":{"key":...}}}]}`.
//! A continuation envelope is the original body verbatim plus a
//! `processing_metadata` block. Extra fields at either level are ignored;
//! a missing required field is non-recoverable.

use logforward_core::NotificationEnvelope;
use logforward_core::ObjectReference;
use logforward_core::ProcessingError;
use logforward_core::ProcessingMetadata;
use serde::Deserialize;
use serde::Serialize;

#[derive(Debug, Deserialize)]
struct OuterEnvelope {
    #[serde(rename = "Message")]
    message: String,
    processing_metadata: Option<WireProcessingMetadata>,
}

#[derive(Debug, Deserialize)]
struct InnerEnvelope {
    #[serde(rename = "Records")]
    records: Vec<InnerRecord>,
}

#[derive(Debug, Deserialize)]
struct InnerRecord {
    s3: S3Locator,
}

#[derive(Debug, Deserialize)]
struct S3Locator {
    bucket: S3BucketName,
    object: S3ObjectKey,
}

#[derive(Debug, Deserialize)]
struct S3BucketName {
    name: String,
}

#[derive(Debug, Deserialize)]
struct S3ObjectKey {
    key: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct WireProcessingMetadata {
    offset: u64,
    retry_count: u32,
    original_receipt_handle: String,
    requeued_at: i64,
}

impl From<WireProcessingMetadata> for ProcessingMetadata {
    fn from(wire: WireProcessingMetadata) -> Self {
        Self {
            offset: wire.offset,
            retry_count: wire.retry_count,
            original_receipt_handle: wire.original_receipt_handle,
            requeued_at_ms: wire.requeued_at,
        }
    }
}

impl From<&ProcessingMetadata> for WireProcessingMetadata {
    fn from(metadata: &ProcessingMetadata) -> Self {
        Self {
            offset: metadata.offset,
            retry_count: metadata.retry_count,
            original_receipt_handle: metadata.original_receipt_handle.clone(),
            requeued_at: metadata.requeued_at_ms,
        }
    }
}

/// A decoded message body: the envelope plus any attached continuation
/// metadata.
pub struct DecodedMessage {
    /// The notification envelope.
    pub envelope: NotificationEnvelope,
    /// Present only on continuations.
    pub processing_metadata: Option<ProcessingMetadata>,
    /// The raw inner JSON, retained so a continuation can be built by
    /// re-wrapping it verbatim.
    inner_json: String,
}

/// Decodes a raw queue message body into an envelope plus optional
/// continuation metadata.
///
/// # Errors
/// Returns [`ProcessingError::non_recoverable`] when the outer or inner
/// JSON is malformed, or when the record list is empty or any record is
/// missing its bucket/key.
pub fn decode_message_body(body: &str) -> Result<DecodedMessage, ProcessingError> {
    let outer: OuterEnvelope = serde_json::from_str(body)
        .map_err(|err| ProcessingError::non_recoverable(format!("malformed notification envelope: {err}")))?;

    let inner: InnerEnvelope = serde_json::from_str(&outer.message)
        .map_err(|err| ProcessingError::non_recoverable(format!("malformed inner notification JSON: {err}")))?;

    let records: Vec<ObjectReference> = inner
        .records
        .into_iter()
        .map(|record| ObjectReference {
            bucket: record.s3.bucket.name,
            key: record.s3.object.key,
        })
        .collect();

    let envelope = NotificationEnvelope::new(records)?;

    Ok(DecodedMessage {
        envelope,
        processing_metadata: outer.processing_metadata.map(ProcessingMetadata::from),
        inner_json: outer.message,
    })
}

/// Builds a continuation envelope: the original inner JSON verbatim plus
/// updated `processing_metadata`.
#[must_use]
pub fn encode_continuation(decoded: &DecodedMessage, metadata: &ProcessingMetadata) -> String {
    #[derive(Serialize)]
    struct ContinuationEnvelope<'a> {
        #[serde(rename = "Message")]
        message: &'a str,
        processing_metadata: WireProcessingMetadata,
    }

    let envelope = ContinuationEnvelope {
        message: &decoded.inner_json,
        processing_metadata: WireProcessingMetadata::from(metadata),
    };
    serde_json::to_string(&envelope).unwrap_or_default()
}
