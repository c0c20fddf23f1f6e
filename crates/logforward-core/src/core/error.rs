// crates/logforward-core/src/core/error.rs
// ============================================================================
// Module: Processing Error
// Description: The two-kind error taxonomy shared by every stage of the
//              pipeline.
// Purpose: Let the orchestrator decide, from the error alone, whether a
//          queue message should be retried or deleted.
// Dependencies: thiserror
// ============================================================================

//! ## Overview
//! Every fallible operation in this crate and its sibling crates returns
//! `Result<_, ProcessingError>`. The variant distinguishes messages that
//! should be deleted immediately (non-recoverable: malformed input, bad
//! configuration, exhausted retry budget) from messages that should be
//! left for redelivery (recoverable: transient I/O, throttling, credential
//! failures). Destination-side record rejection is neither — it is not
//! represented by this type at all, since a rejected record is still a
//! delivered batch; see [`crate::core::model::RejectionSummary`].

use std::fmt;

use thiserror::Error;

/// The processor's error taxonomy.
///
/// # Invariants
/// - Every public function in this crate that can fail returns this type
///   or a type that converts into it; no stage invents a third kind of
///   failure.
#[derive(Debug, Error)]
pub enum ProcessingError {
    /// Delete the message, emit a failure metric, do not retry: malformed
    /// envelope, invalid object-key path, empty tenant id, no enabled
    /// configurations, configuration validation failure, retry-count cap
    /// exceeded.
    #[error("non-recoverable: {0}")]
    NonRecoverable(String),

    /// Leave the message for redelivery: transient fetch/decompression
    /// errors, credential-broker failures, destination throttling after
    /// exhausted retries, re-queue enqueue failures, any unclassified
    /// exception.
    #[error("recoverable: {0}")]
    Recoverable(String),
}

impl ProcessingError {
    /// Builds a non-recoverable error.
    pub fn non_recoverable(message: impl Into<String>) -> Self {
        Self::NonRecoverable(message.into())
    }

    /// Builds a recoverable error.
    pub fn recoverable(message: impl Into<String>) -> Self {
        Self::Recoverable(message.into())
    }

    /// True when this error should cause the message to be deleted
    /// without retry.
    #[must_use]
    pub fn is_non_recoverable(&self) -> bool {
        matches!(self, Self::NonRecoverable(_))
    }

    /// True when this error should leave the message for redelivery.
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::Recoverable(_))
    }

    /// The error-class label attached to structured log lines and used
    /// for metric dimensions, per the error handling design's
    /// "error_class" field.
    #[must_use]
    pub fn error_class(&self) -> ErrorClass {
        match self {
            Self::NonRecoverable(_) => ErrorClass::NonRecoverable,
            Self::Recoverable(_) => ErrorClass::Recoverable,
        }
    }
}

/// Log/metric-friendly label for a [`ProcessingError`] variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Corresponds to [`ProcessingError::NonRecoverable`].
    NonRecoverable,
    /// Corresponds to [`ProcessingError::Recoverable`].
    Recoverable,
}

impl fmt::Display for ErrorClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::NonRecoverable => "non_recoverable",
            Self::Recoverable => "recoverable",
        };
        f.write_str(label)
    }
}

impl From<serde_json::Error> for ProcessingError {
    fn from(err: serde_json::Error) -> Self {
        Self::non_recoverable(format!("json decode failure: {err}"))
    }
}

impl From<std::io::Error> for ProcessingError {
    fn from(err: std::io::Error) -> Self {
        Self::recoverable(format!("io failure: {err}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classification_matches_constructor() {
        let recoverable = ProcessingError::recoverable("throttled");
        assert!(recoverable.is_recoverable());
        assert!(!recoverable.is_non_recoverable());
        assert_eq!(recoverable.error_class().to_string(), "recoverable");

        let non_recoverable = ProcessingError::non_recoverable("bad key");
        assert!(non_recoverable.is_non_recoverable());
        assert_eq!(non_recoverable.error_class().to_string(), "non_recoverable");
    }
}
