// crates/lakegate-core/src/time.rs
// ============================================================================
// Module: Lakegate Time Model
// Description: Injected clock abstraction for rate limiting and tracking.
// Purpose: Keep the core testable by never reading wall-clock time directly.
// Dependencies: std
// ============================================================================

//! ## Overview
//! The gateway core never reads wall-clock time directly. Components that
//! need elapsed-time arithmetic (rate limiter refill, operation pacing and
//! retention) receive a [`Clock`] at construction. Production code uses
//! [`SystemClock`]; tests drive time explicitly with [`ManualClock`].

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;
use std::time::SystemTime;
use std::time::UNIX_EPOCH;

// ============================================================================
// SECTION: Clock
// ============================================================================

/// Monotone millisecond clock consumed by the gateway core.
pub trait Clock: Send + Sync {
    /// Returns the current time in milliseconds since the Unix epoch.
    fn now_millis(&self) -> u64;
}

/// Wall-clock backed [`Clock`] for production use.
///
/// # Invariants
/// - Values before the Unix epoch saturate to zero.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_or(0, |elapsed| u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX))
    }
}

/// Manually advanced [`Clock`] for deterministic tests.
///
/// # Invariants
/// - Time only moves forward via [`ManualClock::advance`].
#[derive(Debug, Default)]
pub struct ManualClock {
    /// Current time in milliseconds.
    now_ms: AtomicU64,
}

impl ManualClock {
    /// Creates a manual clock starting at the given millisecond value.
    #[must_use]
    pub fn starting_at(now_ms: u64) -> Self {
        Self {
            now_ms: AtomicU64::new(now_ms),
        }
    }

    /// Advances the clock by the given number of milliseconds.
    pub fn advance(&self, delta_ms: u64) {
        self.now_ms.fetch_add(delta_ms, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_millis(&self) -> u64 {
        self.now_ms.load(Ordering::SeqCst)
    }
}
