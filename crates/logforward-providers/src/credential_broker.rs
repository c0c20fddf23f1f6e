// crates/logforward-providers/src/credential_broker.rs
// ============================================================================
// Module: Credential Broker
// Description: STS-backed short-lived credential issuance with a
//              concurrent, monotonic-expiry cache.
// Purpose: Implement logforward_core::CredentialProvider for both direct
//          and chained (double-hop) role assumption.
// Dependencies: aws-sdk-sts, logforward-core, tokio
// ============================================================================

//! ## Overview
//! Caching is keyed by the full `(role_id, external_id, region)` triple
//! and expires one minute before the issuer's stated expiry, per the
//! credential broker's operation contract. Expiry is tracked on
//! `tokio::time::Instant`, a monotonic clock, so cache correctness does
//! not depend on wall-clock continuity across tasks (spec §5: "expiry
//! check must be monotonic and independent of wall-clock skew").

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use aws_sdk_sts::config::Credentials as StsCredentials;
use aws_sdk_sts::Client as StsClient;
use logforward_core::CredentialBundle;
use logforward_core::CredentialProvider;
use logforward_core::ProcessingError;
use tokio::sync::RwLock;
use tokio::time::Instant;
use tracing::debug;
use tracing::warn;

const EXPIRY_SAFETY_MARGIN: Duration = Duration::from_secs(60);
const CENTRAL_SESSION_NAME: &str = "logforward-central";
const TENANT_SESSION_NAME: &str = "logforward-tenant";

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CacheKey {
    role_id: String,
    external_id: Option<String>,
    region: String,
}

struct CachedCredential {
    bundle: CredentialBundle,
    valid_until: Instant,
}

/// [`CredentialProvider`] backed by AWS STS, with an in-process cache.
pub struct StsCredentialBroker {
    client: StsClient,
    cache: RwLock<HashMap<CacheKey, CachedCredential>>,
}

impl StsCredentialBroker {
    /// Builds a broker around an already-configured STS client, issuing
    /// credentials from the process's own identity.
    #[must_use]
    pub fn new(client: StsClient) -> Self {
        Self {
            client,
            cache: RwLock::new(HashMap::new()),
        }
    }

    async fn cached_or_assume(
        &self,
        key: CacheKey,
        region: &str,
        session_name: &str,
        base_credentials: Option<&CredentialBundle>,
    ) -> Result<CredentialBundle, ProcessingError> {
        if let Some(cached) = self.cache.read().await.get(&key) {
            if cached.valid_until > Instant::now() {
                debug!(role_id = %key.role_id, "credential cache hit");
                return Ok(cached.bundle.clone());
            }
        }

        let bundle = assume_role(
            &self.client,
            &key.role_id,
            key.external_id.as_deref(),
            region,
            session_name,
            base_credentials,
        )
        .await?;

        let valid_until = expiry_deadline(bundle.expires_at_ms);
        self.cache.write().await.insert(
            key,
            CachedCredential {
                bundle: bundle.clone(),
                valid_until,
            },
        );
        Ok(bundle)
    }
}

#[async_trait]
impl CredentialProvider for StsCredentialBroker {
    async fn credentials_for(
        &self,
        role_id: &str,
        external_id: Option<&str>,
        region: &str,
    ) -> Result<CredentialBundle, ProcessingError> {
        let key = CacheKey {
            role_id: role_id.to_owned(),
            external_id: external_id.map(str::to_owned),
            region: region.to_owned(),
        };
        self.cached_or_assume(key, region, TENANT_SESSION_NAME, None).await
    }

    async fn chained(
        &self,
        role_a: &str,
        external_id_a: Option<&str>,
        role_b: &str,
        region: &str,
    ) -> Result<CredentialBundle, ProcessingError> {
        let key_a = CacheKey {
            role_id: role_a.to_owned(),
            external_id: None,
            region: region.to_owned(),
        };
        let bundle_a = self.cached_or_assume(key_a, region, CENTRAL_SESSION_NAME, None).await?;

        let key_b = CacheKey {
            role_id: role_b.to_owned(),
            external_id: external_id_a.map(str::to_owned),
            region: region.to_owned(),
        };
        self.cached_or_assume(key_b, region, TENANT_SESSION_NAME, Some(&bundle_a)).await
    }
}

/// Converts a bundle's wall-clock expiry, minus the safety margin, into a
/// monotonic deadline relative to now.
fn expiry_deadline(expires_at_ms: i64) -> Instant {
    let now_wall_ms = time::OffsetDateTime::now_utc().unix_timestamp() * 1000;
    let remaining_ms = (expires_at_ms - now_wall_ms).max(0);
    let remaining = Duration::from_millis(remaining_ms as u64).saturating_sub(EXPIRY_SAFETY_MARGIN);
    Instant::now() + remaining
}

async fn assume_role(
    client: &StsClient,
    role_arn: &str,
    external_id: Option<&str>,
    region: &str,
    session_name: &str,
    base_credentials: Option<&CredentialBundle>,
) -> Result<CredentialBundle, ProcessingError> {
    let scoped_client = match base_credentials {
        None => client.clone(),
        Some(base) => {
            let credentials = StsCredentials::new(
                base.access_key_id.clone(),
                base.secret_access_key.clone(),
                Some(base.session_token.clone()),
                None,
                "logforward-chained-hop",
            );
            let config = aws_sdk_sts::Config::builder()
                .credentials_provider(credentials)
                .region(aws_sdk_sts::config::Region::new(region.to_owned()))
                .behavior_version(aws_config::BehaviorVersion::latest())
                .build();
            StsClient::from_conf(config)
        }
    };

    let mut request = scoped_client
        .assume_role()
        .role_arn(role_arn)
        .role_session_name(session_name);
    if let Some(external_id) = external_id {
        request = request.external_id(external_id);
    }

    let output = request
        .send()
        .await
        .map_err(|err| ProcessingError::recoverable(format!("assume_role({role_arn}) failed: {err}")))?;

    let credentials = output
        .credentials()
        .ok_or_else(|| ProcessingError::recoverable(format!("assume_role({role_arn}) returned no credentials")))?;

    let expires_at_ms = (credentials.expiration().as_secs_f64() * 1000.0) as i64;

    if expires_at_ms == 0 {
        warn!(role_arn, "assume_role returned an unparsable expiration");
    }

    Ok(CredentialBundle {
        access_key_id: credentials.access_key_id().to_owned(),
        secret_access_key: credentials.secret_access_key().to_owned(),
        session_token: credentials.session_token().to_owned(),
        expires_at_ms,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expiry_deadline_applies_safety_margin() {
        let now_wall_ms = time::OffsetDateTime::now_utc().unix_timestamp() * 1000;
        let far_future = now_wall_ms + Duration::from_secs(300).as_millis() as i64;
        let deadline = expiry_deadline(far_future);
        let remaining = deadline.saturating_duration_since(Instant::now());
        assert!(remaining <= Duration::from_secs(240));
        assert!(remaining > Duration::from_secs(200));
    }

    #[test]
    fn expiry_deadline_never_goes_negative() {
        let now_wall_ms = time::OffsetDateTime::now_utc().unix_timestamp() * 1000;
        let already_past = now_wall_ms - 10_000;
        let deadline = expiry_deadline(already_past);
        assert!(deadline <= Instant::now() + Duration::from_millis(10));
    }
}
