// crates/lakegate-core/tests/proptest_limiter.rs
// ============================================================================
// Module: Rate Limiter Property-Based Tests
// Description: Property tests for token bucket admission invariants.
// Purpose: Bound admissions under arbitrary clock and request schedules.
// ============================================================================

//! Property-based tests for rate limiter invariants.

#![allow(
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only assertions and helpers are permitted."
)]

use std::sync::Arc;

use lakegate_core::Clock;
use lakegate_core::ManualClock;
use lakegate_core::Principal;
use lakegate_core::RateLimiter;
use lakegate_core::RateLimiterConfig;
use proptest::prelude::*;

/// One scheduled step: advance the clock, then attempt some admissions.
#[derive(Debug, Clone)]
struct Step {
    advance_ms: u64,
    attempts: u32,
}

fn step_strategy() -> impl Strategy<Value = Step> {
    (0_u64 .. 5_000, 0_u32 .. 16).prop_map(|(advance_ms, attempts)| Step {
        advance_ms,
        attempts,
    })
}

proptest! {
    /// Total admissions never exceed the burst capacity plus the tokens
    /// refilled over the whole elapsed window.
    #[test]
    fn admissions_are_bounded_by_capacity_plus_refill(
        steps in prop::collection::vec(step_strategy(), 1 .. 32),
        capacity in 1_u32 .. 16,
        refill_tenths in 1_u64 .. 100,
    ) {
        let refill_per_second = refill_tenths as f64 / 10.0;
        let clock = Arc::new(ManualClock::starting_at(1_000));
        let limiter = RateLimiter::new(
            RateLimiterConfig {
                capacity,
                refill_per_second,
                // No eviction, so the bucket never resets mid-run.
                idle_eviction_ms: 0,
            },
            Arc::clone(&clock) as Arc<dyn Clock>,
        );
        let principal = Principal::new("prop");
        let mut admitted: u64 = 0;
        let mut elapsed_ms: u64 = 0;
        for step in &steps {
            clock.advance(step.advance_ms);
            elapsed_ms += step.advance_ms;
            for _ in 0 .. step.attempts {
                if limiter.try_admit(&principal).is_ok() {
                    admitted += 1;
                }
            }
        }
        let refilled = (elapsed_ms as f64 / 1_000.0) * refill_per_second;
        let bound = f64::from(capacity) + refilled;
        prop_assert!(
            (admitted as f64) <= bound + 1e-6,
            "admitted {admitted} exceeds bound {bound}"
        );
    }

    /// Draining one principal never affects another's burst budget.
    #[test]
    fn principals_never_share_budget(
        drain_attempts in 1_u32 .. 64,
        capacity in 1_u32 .. 8,
    ) {
        let clock = Arc::new(ManualClock::starting_at(1_000));
        let limiter = RateLimiter::new(
            RateLimiterConfig {
                capacity,
                refill_per_second: 0.1,
                idle_eviction_ms: 0,
            },
            clock,
        );
        let noisy = Principal::new("noisy");
        let quiet = Principal::new("quiet");
        for _ in 0 .. drain_attempts {
            let _ = limiter.try_admit(&noisy);
        }
        let mut quiet_admitted = 0_u32;
        for _ in 0 .. capacity {
            if limiter.try_admit(&quiet).is_ok() {
                quiet_admitted += 1;
            }
        }
        prop_assert_eq!(quiet_admitted, capacity);
    }
}
