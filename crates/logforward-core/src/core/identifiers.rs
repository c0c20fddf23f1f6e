// crates/logforward-core/src/core/identifiers.rs
// ============================================================================
// Module: Log Forwarder Identifiers
// Description: Opaque identifiers for tenants and delivery configurations.
// Purpose: Give tenant/application/config identity a typed, serializable form.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! Tenant identity in this system is derived entirely from the object key
//! path (`cluster/namespace/application/pod/filename`); the `namespace`
//! segment doubles as the tenant identifier. These types keep that string
//! from being passed around as a bare `String` once it crosses a module
//! boundary.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use serde::Deserialize;
use serde::Serialize;

// ============================================================================
// SECTION: Identifier Types
// ============================================================================

/// Tenant identifier: the `namespace` segment of an object key.
///
/// # Invariants
/// - Opaque, non-empty UTF-8 string; emptiness is checked at construction
///   sites (`TenantKey::parse`), not by this type.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TenantId(String);

impl TenantId {
    /// Creates a new tenant identifier.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns true when the identifier carries no characters.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for TenantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<&str> for TenantId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for TenantId {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

/// Application name segment of an object key.
///
/// # Invariants
/// - Opaque UTF-8 string; matched case-sensitively against delivery config
///   allow-lists (spec: application matching is exact and case-sensitive).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ApplicationName(String);

impl ApplicationName {
    /// Creates a new application name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Returns the name as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ApplicationName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<&str> for ApplicationName {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for ApplicationName {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

/// Delivery configuration identifier, scoped to a tenant.
///
/// # Invariants
/// - Opaque UTF-8 string; no normalization is applied by this type.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConfigId(String);

impl ConfigId {
    /// Creates a new delivery configuration identifier.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ConfigId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<&str> for ConfigId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for ConfigId {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}
