// crates/logforward-providers/src/object_decoder.rs
// ============================================================================
// Module: Object Decoder
// Description: S3-backed Fetcher plus the decompress/parse/normalize
//              pipeline that turns a raw object into LogRecords.
// Purpose: Implement logforward_core::Fetcher and the normalization rules
//          of the object decoding stage.
// Dependencies: aws-sdk-s3, flate2, logforward-core, serde_json
// ============================================================================

//! ## Overview
//! Decoding is a pure function of bytes once fetched: decompress if the
//! key looks gzipped, try a JSON array first, fall back to
//! newline-delimited JSON, then normalize each row's timestamp and
//! message independently. Timestamp extraction never fails outright — an
//! unparsable or missing timestamp falls back to the injected clock, per
//! the decoder's precedence rules.

use std::io::Read;

use async_trait::async_trait;
use aws_sdk_s3::Client as S3Client;
use logforward_core::Clock;
use logforward_core::Fetcher;
use logforward_core::LogRecord;
use logforward_core::Message;
use logforward_core::ObjectLister;
use logforward_core::ProcessingError;
use serde_json::Map;
use serde_json::Value;
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;
use tracing::warn;

const METADATA_FIELDS: &[&str] = &[
    "cluster_id",
    "namespace",
    "application",
    "pod_name",
    "ingest_timestamp",
    "timestamp",
    "kubernetes",
];

/// [`Fetcher`] backed by an S3-compatible object store client.
pub struct S3Fetcher {
    client: S3Client,
}

impl S3Fetcher {
    /// Wraps an already-configured S3 client.
    #[must_use]
    pub fn new(client: S3Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Fetcher for S3Fetcher {
    async fn fetch(&self, bucket: &str, key: &str) -> Result<Vec<u8>, ProcessingError> {
        let output = self
            .client
            .get_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(|err| ProcessingError::recoverable(format!("get_object({bucket}/{key}) failed: {err}")))?;

        let aggregated = output
            .body
            .collect()
            .await
            .map_err(|err| ProcessingError::recoverable(format!("reading object body {bucket}/{key}: {err}")))?;

        Ok(aggregated.into_bytes().to_vec())
    }
}

/// [`ObjectLister`] backed by an S3-compatible object store client;
/// paginates through every key, development-scan use only.
pub struct S3ObjectLister {
    client: S3Client,
}

impl S3ObjectLister {
    /// Wraps an already-configured S3 client.
    #[must_use]
    pub fn new(client: S3Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ObjectLister for S3ObjectLister {
    async fn list(&self, bucket: &str) -> Result<Vec<String>, ProcessingError> {
        let mut keys = Vec::new();
        let mut continuation_token = None;

        loop {
            let mut request = self.client.list_objects_v2().bucket(bucket);
            if let Some(token) = continuation_token.take() {
                request = request.continuation_token(token);
            }

            let output = request
                .send()
                .await
                .map_err(|err| ProcessingError::recoverable(format!("list_objects_v2({bucket}) failed: {err}")))?;

            keys.extend(output.contents().iter().filter_map(|object| object.key().map(ToOwned::to_owned)));

            if output.is_truncated() == Some(true) {
                continuation_token = output.next_continuation_token().map(ToOwned::to_owned);
            } else {
                break;
            }
        }

        Ok(keys)
    }
}

/// Fetches, decompresses, parses, and normalizes an object into an
/// ordered sequence of [`LogRecord`].
///
/// # Errors
/// Returns a recoverable [`ProcessingError`] when the fetch itself fails,
/// and a non-recoverable one when the object's contents cannot be parsed
/// as either a JSON array or newline-delimited JSON.
pub async fn decode_object(
    fetcher: &dyn Fetcher,
    clock: &dyn Clock,
    bucket: &str,
    key: &str,
    is_gzip: bool,
) -> Result<Vec<LogRecord>, ProcessingError> {
    let raw = fetcher.fetch(bucket, key).await?;
    let decompressed = if is_gzip { gunzip(&raw)? } else { raw };
    let rows = parse_rows(&decompressed)?;

    Ok(rows
        .into_iter()
        .map(|row| LogRecord {
            timestamp_ms: extract_timestamp_ms(&row, clock),
            message: extract_message(row),
        })
        .collect())
}

fn gunzip(bytes: &[u8]) -> Result<Vec<u8>, ProcessingError> {
    let mut decoder = flate2::read::GzDecoder::new(bytes);
    let mut out = Vec::new();
    decoder
        .read_to_end(&mut out)
        .map_err(|err| ProcessingError::recoverable(format!("gzip decompression failed: {err}")))?;
    Ok(out)
}

fn parse_rows(bytes: &[u8]) -> Result<Vec<Value>, ProcessingError> {
    if let Ok(array) = serde_json::from_slice::<Vec<Value>>(bytes) {
        return Ok(array);
    }

    let text = std::str::from_utf8(bytes)
        .map_err(|err| ProcessingError::non_recoverable(format!("object is not valid UTF-8: {err}")))?;

    text.lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| {
            serde_json::from_str(line)
                .map_err(|err| ProcessingError::non_recoverable(format!("malformed NDJSON row: {err}")))
        })
        .collect()
}

fn extract_timestamp_ms(row: &Value, clock: &dyn Clock) -> i64 {
    for field in ["timestamp", "ingest_timestamp"] {
        let Some(value) = row.get(field) else { continue };
        if let Some(text) = value.as_str() {
            if let Some(ms) = parse_rfc3339_ms(text) {
                if ms > 0 {
                    return ms;
                }
            }
        } else if let Some(number) = value.as_f64() {
            let ms = numeric_to_ms(number);
            if ms > 0 {
                return ms;
            }
        }
    }
    warn!("unparsable, missing, or non-positive timestamp, falling back to current time");
    clock.now_millis()
}

fn parse_rfc3339_ms(text: &str) -> Option<i64> {
    let normalized = if let Some(prefix) = text.strip_suffix('Z') {
        format!("{prefix}+00:00")
    } else {
        text.to_owned()
    };
    let parsed = OffsetDateTime::parse(&normalized, &Rfc3339).ok()?;
    let millis = parsed.unix_timestamp() as i128 * 1000 + i128::from(parsed.millisecond());
    Some(millis as i64)
}

fn numeric_to_ms(value: f64) -> i64 {
    if value.abs() > 1e12 {
        value as i64
    } else {
        (value * 1000.0).trunc() as i64
    }
}

fn extract_message(row: Value) -> Message {
    let Value::Object(mut object) = row else {
        return Message::Text(row.to_string());
    };

    if let Some(message) = object.remove("message") {
        return value_to_message(message);
    }

    let fallback: Map<String, Value> = object
        .into_iter()
        .filter(|(field, _)| !METADATA_FIELDS.contains(&field.as_str()))
        .collect();

    if fallback.is_empty() {
        Message::Text(Value::Object(fallback).to_string())
    } else {
        Message::Json(Value::Object(fallback))
    }
}

fn value_to_message(value: Value) -> Message {
    match value {
        Value::String(text) => Message::Text(text),
        other => Message::Json(other),
    }
}
