// crates/lakegate-core/src/limiter.rs
// ============================================================================
// Module: Principal Rate Limiter
// Description: Per-principal token buckets with lazy refill and idle eviction.
// Purpose: Bound request admission before any capability work happens.
// Dependencies: lakegate-core time
// ============================================================================

//! ## Overview
//! Admission control runs before capability resolution, so rejected
//! requests consume no backend budget. Each principal owns an independent
//! token bucket refilled lazily from the injected [`Clock`]; buckets idle
//! past the eviction window are dropped on the next admission attempt, so
//! the map stays bounded by the set of recently active principals.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;

use crate::error::GatewayError;
use crate::identifiers::Principal;
use crate::time::Clock;

// ============================================================================
// SECTION: Configuration
// ============================================================================

/// Admission policy for one gateway instance.
///
/// # Invariants
/// - `capacity >= 1` and `refill_per_second > 0`; enforced by config loading.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RateLimiterConfig {
    /// Maximum burst size per principal.
    pub capacity: u32,
    /// Sustained tokens restored per second.
    pub refill_per_second: f64,
    /// Idle window after which a principal's bucket is evicted.
    pub idle_eviction_ms: u64,
}

impl Default for RateLimiterConfig {
    fn default() -> Self {
        Self {
            capacity: 20,
            refill_per_second: 5.0,
            idle_eviction_ms: 300_000,
        }
    }
}

// ============================================================================
// SECTION: Bucket State
// ============================================================================

/// Mutable token bucket state for one principal.
#[derive(Debug)]
struct Bucket {
    /// Currently available tokens.
    tokens: f64,
    /// Timestamp of the last refill computation.
    last_refill_ms: u64,
    /// Timestamp of the last admission attempt.
    last_seen_ms: u64,
}

impl Bucket {
    /// Refills lazily for elapsed time and attempts to consume one token.
    fn try_consume(&mut self, config: &RateLimiterConfig, now_ms: u64) -> bool {
        let elapsed_ms = now_ms.saturating_sub(self.last_refill_ms);
        if elapsed_ms > 0 {
            let refill = (elapsed_ms as f64 / 1_000.0) * config.refill_per_second;
            self.tokens = (self.tokens + refill).min(f64::from(config.capacity));
            self.last_refill_ms = now_ms;
        }
        self.last_seen_ms = now_ms;
        if self.tokens >= 1.0 {
            self.tokens -= 1.0;
            true
        } else {
            false
        }
    }
}

// ============================================================================
// SECTION: Rate Limiter
// ============================================================================

/// Per-principal token bucket admission controller.
///
/// # Invariants
/// - Available tokens never exceed `capacity`.
/// - Eviction only removes buckets idle for the full eviction window, so a
///   drained bucket cannot reset its debt by going briefly quiet.
pub struct RateLimiter {
    /// Admission policy.
    config: RateLimiterConfig,
    /// Buckets keyed by principal; each bucket carries its own lock so
    /// admission for one principal never blocks another.
    buckets: Mutex<BTreeMap<String, Arc<Mutex<Bucket>>>>,
    /// Time source.
    clock: Arc<dyn Clock>,
    /// Timestamp of the last idle sweep.
    last_sweep_ms: AtomicU64,
}

impl RateLimiter {
    /// Creates a limiter over the given clock.
    #[must_use]
    pub fn new(config: RateLimiterConfig, clock: Arc<dyn Clock>) -> Self {
        let now_ms = clock.now_millis();
        Self {
            config,
            buckets: Mutex::new(BTreeMap::new()),
            clock,
            last_sweep_ms: AtomicU64::new(now_ms),
        }
    }

    /// Attempts to admit one request for the principal.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::RateLimited`] when the principal's bucket is
    /// empty.
    pub fn try_admit(&self, principal: &Principal) -> Result<(), GatewayError> {
        let now_ms = self.clock.now_millis();
        self.sweep_idle(now_ms);
        let bucket = self.bucket_for(principal, now_ms);
        let admitted = bucket
            .lock()
            .map(|mut state| state.try_consume(&self.config, now_ms))
            .unwrap_or(false);
        if admitted {
            Ok(())
        } else {
            Err(GatewayError::RateLimited {
                principal: principal.as_str().to_string(),
            })
        }
    }

    /// Returns the number of tracked principal buckets.
    #[must_use]
    pub fn tracked_principals(&self) -> usize {
        self.buckets.lock().map_or(0, |buckets| buckets.len())
    }

    /// Fetches or creates the bucket for a principal.
    fn bucket_for(&self, principal: &Principal, now_ms: u64) -> Arc<Mutex<Bucket>> {
        let Ok(mut buckets) = self.buckets.lock() else {
            return Arc::new(Mutex::new(Bucket {
                tokens: 0.0,
                last_refill_ms: now_ms,
                last_seen_ms: now_ms,
            }));
        };
        Arc::clone(buckets.entry(principal.as_str().to_string()).or_insert_with(|| {
            Arc::new(Mutex::new(Bucket {
                tokens: f64::from(self.config.capacity),
                last_refill_ms: now_ms,
                last_seen_ms: now_ms,
            }))
        }))
    }

    /// Drops buckets idle past the eviction window, at most once per window.
    fn sweep_idle(&self, now_ms: u64) {
        let window = self.config.idle_eviction_ms;
        if window == 0 {
            return;
        }
        let last = self.last_sweep_ms.load(Ordering::Relaxed);
        if now_ms.saturating_sub(last) < window {
            return;
        }
        if self
            .last_sweep_ms
            .compare_exchange(last, now_ms, Ordering::Relaxed, Ordering::Relaxed)
            .is_err()
        {
            return;
        }
        if let Ok(mut buckets) = self.buckets.lock() {
            buckets.retain(|_, bucket| {
                bucket
                    .lock()
                    .map_or(false, |state| now_ms.saturating_sub(state.last_seen_ms) < window)
            });
        }
    }
}
