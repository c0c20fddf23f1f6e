// crates/logforward-core/src/core/time.rs
// ============================================================================
// Module: Clock Abstraction
// Description: Injectable wall-clock and monotonic-clock access.
// Purpose: Keep the processor's core free of direct calls to the system
//          clock so timestamp-dependent behavior is deterministic in tests.
// Dependencies: time
// ============================================================================

//! ## Overview
//! The core never reads wall-clock time directly. Every component that
//! needs "now" (the object decoder's fallback timestamp, the re-queue
//! protocol's `requeued_at`, the rejection window checks in the
//! managed-log-group deliverer) takes a `&dyn Clock` instead. Hosts supply
//! a real clock at the edges; tests supply a fixed one.

use time::OffsetDateTime;

/// Milliseconds since the Unix epoch, UTC.
pub type EpochMillis = i64;

/// Source of current time, injected rather than read from the OS directly.
///
/// # Invariants
/// - `now_millis` is monotonically non-decreasing across calls made by a
///   single process under `SystemClock`; fixed clocks used in tests need
///   not honor this.
pub trait Clock: Send + Sync {
    /// Returns the current time in milliseconds since the Unix epoch.
    fn now_millis(&self) -> EpochMillis;
}

/// Clock backed by the operating system's wall clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> EpochMillis {
        let now = OffsetDateTime::now_utc();
        let millis = now.unix_timestamp() as i128 * 1000 + i128::from(now.millisecond());
        millis as EpochMillis
    }
}

/// Clock that always returns a fixed instant; for tests.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub EpochMillis);

impl Clock for FixedClock {
    fn now_millis(&self) -> EpochMillis {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_clock_returns_constant_value() {
        let clock = FixedClock(1_700_000_000_000);
        assert_eq!(clock.now_millis(), 1_700_000_000_000);
        assert_eq!(clock.now_millis(), 1_700_000_000_000);
    }

    #[test]
    fn system_clock_returns_plausible_epoch_millis() {
        let clock = SystemClock;
        let value = clock.now_millis();
        assert!(value > 1_600_000_000_000, "expected a post-2020 timestamp");
    }
}
