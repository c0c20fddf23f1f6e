// crates/logforward-core/src/core/mod.rs
// ============================================================================
// Module: Core
// Description: Domain types, identifiers, clock, error taxonomy, and the
//              application filter policy.
// Purpose: Group the dependency-free building blocks every other module in
//          this workspace is expressed in terms of.
// Dependencies: none beyond serde/serde_json/thiserror/time
// ============================================================================

pub mod application_filter;
pub mod error;
pub mod identifiers;
pub mod model;
pub mod time;
