// crates/logforward-config/src/lib.rs
// ============================================================================
// Module: Processor Configuration
// Description: Layered configuration loading and validation.
// Purpose: Turn environment variables (and an optional config file) into a
//          validated ProcessorConfig the CLI can hand to every front end.
// Dependencies: config, logforward-core, serde, thiserror
// ============================================================================

//! ## Overview
//! Configuration is layered the same way as the rest of this workspace's
//! pack precedent: defaults, then an optional file, then environment
//! variables prefixed `LOGFORWARD_`, with environment variables taking
//! highest precedence. Validation happens once, at startup, producing a
//! `ConfigError` that the CLI turns into a non-zero exit code (spec: "exit
//! codes — non-zero on fatal configuration error").

use std::path::Path;

use config::Config;
use config::ConfigError as BackendConfigError;
use config::Environment;
use config::File;
use serde::Deserialize;
use thiserror::Error;

/// The processor's execution mode, selecting an ingestion front end.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionMode {
    /// Batch invocation front end.
    Handler,
    /// Long-poll front end.
    Poller,
    /// One-shot manual invocation, for operational runbooks.
    Manual,
    /// Development-only bucket scan front end.
    Scan,
}

/// Fully validated processor configuration.
///
/// # Invariants
/// - `max_batch_size` is in `1..=10_000`.
/// - `retry_attempts <= 3` (the re-queue protocol's hard cap).
/// - `scan_source_bucket` and `scan_interval_seconds` are present when
///   `mode == ExecutionMode::Scan`.
#[derive(Debug, Clone, Deserialize)]
pub struct ProcessorConfig {
    /// Name of the tenant-configuration table in the backing store.
    pub tenant_config_table: String,
    /// Upper bound on records per managed-log-group batch; default 1000,
    /// hard upper bound 10000.
    #[serde(default = "default_max_batch_size")]
    pub max_batch_size: u32,
    /// Number of retry attempts for transient destination failures;
    /// default 3.
    #[serde(default = "default_retry_attempts")]
    pub retry_attempts: u32,
    /// Identifier of the central distribution role assumed as the first
    /// hop of chained credentials.
    pub central_distribution_role_id: String,
    /// URL of the notification queue.
    pub queue_url: String,
    /// AWS region.
    pub region: String,
    /// Selected ingestion front end.
    pub mode: ExecutionMode,
    /// Scan mode: bucket to list.
    pub scan_source_bucket: Option<String>,
    /// Scan mode: poll interval in seconds.
    pub scan_interval_seconds: Option<u64>,
    /// Object-store endpoint override, for non-AWS-compatible stores.
    pub object_store_endpoint: Option<String>,
    /// Object-store path-style addressing flag.
    #[serde(default)]
    pub object_store_path_style: bool,
}

fn default_max_batch_size() -> u32 {
    1000
}

fn default_retry_attempts() -> u32 {
    3
}

/// Errors raised while loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The underlying `config` crate failed to assemble or deserialize
    /// the layered sources.
    #[error("configuration load failure: {0}")]
    Load(#[from] BackendConfigError),

    /// A loaded value failed a processor-specific invariant.
    #[error("configuration invalid: {0}")]
    Invalid(String),
}

impl ProcessorConfig {
    /// Loads configuration from an optional file plus `LOGFORWARD_`
    /// prefixed environment variables, then validates it.
    ///
    /// # Errors
    /// Returns [`ConfigError::Load`] when the sources cannot be
    /// assembled or deserialized, and [`ConfigError::Invalid`] when the
    /// assembled value fails validation.
    pub fn load(file_path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut builder = Config::builder();
        if let Some(path) = file_path {
            builder = builder.add_source(File::from(path).required(false));
        }
        builder = builder.add_source(
            Environment::with_prefix("LOGFORWARD")
                .separator("__")
                .try_parsing(true),
        );
        let assembled = builder.build()?;
        let config: Self = assembled.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Validates cross-field invariants not expressible through serde
    /// defaults alone.
    ///
    /// # Errors
    /// Returns [`ConfigError::Invalid`] on the first violated invariant.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_batch_size == 0 || self.max_batch_size > 10_000 {
            return Err(ConfigError::Invalid(format!(
                "max_batch_size must be in 1..=10000, got {}",
                self.max_batch_size
            )));
        }
        if self.retry_attempts > 3 {
            return Err(ConfigError::Invalid(format!(
                "retry_attempts must be <= 3, got {}",
                self.retry_attempts
            )));
        }
        if self.tenant_config_table.trim().is_empty() {
            return Err(ConfigError::Invalid("tenant_config_table must not be blank".to_owned()));
        }
        if self.queue_url.trim().is_empty() {
            return Err(ConfigError::Invalid("queue_url must not be blank".to_owned()));
        }
        if self.mode == ExecutionMode::Scan
            && (self.scan_source_bucket.is_none() || self.scan_interval_seconds.is_none())
        {
            return Err(ConfigError::Invalid(
                "scan mode requires scan_source_bucket and scan_interval_seconds".to_owned(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_config() -> ProcessorConfig {
        ProcessorConfig {
            tenant_config_table: "tenant-configs".to_owned(),
            max_batch_size: 1000,
            retry_attempts: 3,
            central_distribution_role_id: "arn:aws:iam::1:role/central".to_owned(),
            queue_url: "https://sqs.us-east-1.amazonaws.com/1/queue".to_owned(),
            region: "us-east-1".to_owned(),
            mode: ExecutionMode::Poller,
            scan_source_bucket: None,
            scan_interval_seconds: None,
            object_store_endpoint: None,
            object_store_path_style: false,
        }
    }

    #[test]
    fn validates_a_well_formed_poller_config() {
        assert!(valid_config().validate().is_ok());
    }

    #[test]
    fn rejects_batch_size_above_hard_cap() {
        let mut config = valid_config();
        config.max_batch_size = 20_000;
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_retry_attempts_above_cap() {
        let mut config = valid_config();
        config.retry_attempts = 4;
        assert!(config.validate().is_err());
    }

    #[test]
    fn scan_mode_requires_bucket_and_interval() {
        let mut config = valid_config();
        config.mode = ExecutionMode::Scan;
        assert!(config.validate().is_err());
        config.scan_source_bucket = Some("source-bucket".to_owned());
        config.scan_interval_seconds = Some(30);
        assert!(config.validate().is_ok());
    }
}
