// crates/logforward-providers/src/object_store_deliverer.rs
// ============================================================================
// Module: Object-Store Deliverer
// Description: Copies the source object into a tenant-owned bucket under
//              single-hop credentials.
// Purpose: Implement logforward_core::Deliverer for the object-store
//          delivery kind.
// Dependencies: aws-sdk-s3, logforward-core
// ============================================================================

//! ## Overview
//! Unlike the managed-log-group path, this deliverer never inspects
//! individual records: it copies the source object whole, preserving
//! content type, encoding, and user metadata, and adds traceability
//! metadata entries. A copy has no mid-object partial progress, so it
//! either delivers everything or returns an error; there is no rejection
//! window on this path.

use std::sync::Arc;

use async_trait::async_trait;
use aws_sdk_s3::config::Credentials as S3Credentials;
use aws_sdk_s3::types::MetadataDirective;
use aws_sdk_s3::Client as S3Client;
use logforward_core::CredentialProvider;
use logforward_core::Deliverer;
use logforward_core::DeliveryOutcome;
use logforward_core::LogRecord;
use logforward_core::ProcessingError;
use logforward_core::RejectionSummary;
use tracing::info;

const METHOD: &str = "object-store";

/// [`Deliverer`] for the object-store delivery kind.
pub struct ObjectStoreDeliverer {
    credential_provider: Arc<dyn CredentialProvider>,
    central_account_id: String,
    tenant_role_arn: String,
    region: String,
    tenant_id: String,
    source_bucket: String,
    source_key: String,
    destination_bucket: String,
    destination_key: String,
}

impl ObjectStoreDeliverer {
    /// Builds a deliverer scoped to one source object and one tenant
    /// object-store configuration.
    #[must_use]
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        credential_provider: Arc<dyn CredentialProvider>,
        central_account_id: String,
        tenant_role_arn: String,
        region: String,
        tenant_id: String,
        source_bucket: String,
        source_key: String,
        destination_bucket: String,
        bucket_prefix: Option<&str>,
        key_from_basename: bool,
    ) -> Self {
        let prefix = sanitize_prefix(bucket_prefix.unwrap_or(""));
        let tail = if key_from_basename {
            basename(&source_key)
        } else {
            source_key.clone()
        };
        let destination_key = format!("{prefix}{tail}");
        Self {
            credential_provider,
            central_account_id,
            tenant_role_arn,
            region,
            tenant_id,
            source_bucket,
            source_key,
            destination_bucket,
            destination_key,
        }
    }

    /// The destination key this copy will land at; exposed for logging
    /// and tests.
    #[must_use]
    pub fn destination_key(&self) -> &str {
        &self.destination_key
    }

    async fn scoped_client(&self) -> Result<S3Client, ProcessingError> {
        let bundle = self
            .credential_provider
            .credentials_for(&self.tenant_role_arn, Some(&self.central_account_id), &self.region)
            .await?;

        let credentials = S3Credentials::new(
            bundle.access_key_id,
            bundle.secret_access_key,
            Some(bundle.session_token),
            None,
            "logforward-object-store",
        );
        let config = aws_sdk_s3::Config::builder()
            .credentials_provider(credentials)
            .region(aws_sdk_s3::config::Region::new(self.region.clone()))
            .behavior_version(aws_config::BehaviorVersion::latest())
            .build();
        Ok(S3Client::from_conf(config))
    }
}

#[async_trait]
impl Deliverer for ObjectStoreDeliverer {
    async fn deliver(&self, records: &[LogRecord], _offset: u64) -> Result<DeliveryOutcome, ProcessingError> {
        let client = self.scoped_client().await?;

        let source = client
            .head_object()
            .bucket(&self.source_bucket)
            .key(&self.source_key)
            .send()
            .await
            .map_err(|err| {
                ProcessingError::recoverable(format!(
                    "head_object({}/{}) failed: {err}",
                    self.source_bucket, self.source_key
                ))
            })?;

        let mut metadata = source.metadata().cloned().unwrap_or_default();
        metadata.insert("logforward-source-bucket".to_owned(), self.source_bucket.clone());
        metadata.insert("logforward-source-key".to_owned(), self.source_key.clone());

        let mut request = client
            .copy_object()
            .copy_source(format!("{}/{}", self.source_bucket, self.source_key))
            .bucket(&self.destination_bucket)
            .key(&self.destination_key)
            .metadata_directive(MetadataDirective::Replace)
            .set_metadata(Some(metadata));

        if let Some(content_type) = source.content_type() {
            request = request.content_type(content_type);
        }
        if let Some(content_encoding) = source.content_encoding() {
            request = request.content_encoding(content_encoding);
        }

        request.send().await.map_err(|err| {
            ProcessingError::recoverable(format!(
                "copy_object({} -> {}/{}) failed: {err}",
                self.source_key, self.destination_bucket, self.destination_key
            ))
        })?;

        info!(
            tenant_id = %self.tenant_id,
            method = METHOD,
            destination_bucket = %self.destination_bucket,
            destination_key = %self.destination_key,
            "object-store delivery complete"
        );

        let total = records.len() as u64;
        Ok(DeliveryOutcome {
            delivered: total,
            failed: 0,
            next_offset: total,
            rejections: RejectionSummary::default(),
        })
    }
}

/// Trims leading slashes and enforces exactly one trailing slash on a
/// non-empty prefix.
fn sanitize_prefix(prefix: &str) -> String {
    let trimmed = prefix.trim_start_matches('/').trim_end_matches('/');
    if trimmed.is_empty() {
        String::new()
    } else {
        format!("{trimmed}/")
    }
}

fn basename(key: &str) -> String {
    key.rsplit('/').next().unwrap_or(key).to_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use logforward_core::CredentialBundle;

    struct UnusedCredentialProvider;

    #[async_trait]
    impl CredentialProvider for UnusedCredentialProvider {
        async fn credentials_for(
            &self,
            _role_id: &str,
            _external_id: Option<&str>,
            _region: &str,
        ) -> Result<CredentialBundle, ProcessingError> {
            unreachable!("not exercised by construction-only tests")
        }

        async fn chained(
            &self,
            _role_a: &str,
            _external_id_a: Option<&str>,
            _role_b: &str,
            _region: &str,
        ) -> Result<CredentialBundle, ProcessingError> {
            unreachable!("not exercised by construction-only tests")
        }
    }

    #[test]
    fn sanitize_prefix_trims_and_normalizes_slashes() {
        assert_eq!(sanitize_prefix(""), "");
        assert_eq!(sanitize_prefix("raw"), "raw/");
        assert_eq!(sanitize_prefix("/raw/"), "raw/");
        assert_eq!(sanitize_prefix("//raw//"), "raw/");
    }

    #[test]
    fn destination_key_uses_prefix_plus_full_source_key() {
        let deliverer = ObjectStoreDeliverer::new(
            Arc::new(UnusedCredentialProvider),
            "111111111111".to_owned(),
            "arn:aws:iam::222222222222:role/acme-dist".to_owned(),
            "us-east-1".to_owned(),
            "acme".to_owned(),
            "source-bucket".to_owned(),
            "cluster1/acme/payment/pod1/a.json.gz".to_owned(),
            "acme-logs".to_owned(),
            Some("raw"),
            false,
        );
        assert_eq!(
            deliverer.destination_key(),
            "raw/cluster1/acme/payment/pod1/a.json.gz"
        );
    }

    #[test]
    fn destination_key_can_use_basename() {
        let deliverer = ObjectStoreDeliverer::new(
            Arc::new(UnusedCredentialProvider),
            "111111111111".to_owned(),
            "arn:aws:iam::222222222222:role/acme-dist".to_owned(),
            "us-east-1".to_owned(),
            "acme".to_owned(),
            "source-bucket".to_owned(),
            "cluster1/acme/payment/pod1/a.json.gz".to_owned(),
            "acme-logs".to_owned(),
            None,
            true,
        );
        assert_eq!(deliverer.destination_key(), "a.json.gz");
    }

    #[test]
    fn basename_takes_last_path_segment() {
        assert_eq!(basename("cluster1/acme/payment/pod1/a.json.gz"), "a.json.gz");
        assert_eq!(basename("a.json.gz"), "a.json.gz");
    }
}
