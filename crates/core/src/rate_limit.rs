//! Daily usage rate limiting for the feedback endpoint.
//!
//! Usage is counted per `(scope, scope_key, day_key)`: once under the
//! caller's verified identity and once under their network address. A new
//! UTC calendar day uses a new key, so counters never need resetting.
//!
//! The counting itself is delegated to a [`UsageCounterStore`], whose
//! `check_and_increment` must be atomic: concurrent calls on the same key
//! serialize, and a call that finds the counter at the ceiling changes
//! nothing.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::error::CoreError;
use crate::types::Timestamp;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Default number of feedback requests allowed per scope per day.
pub const DEFAULT_DAILY_LIMIT: i64 = 20;

/// Network-address key used when the client address cannot be determined.
pub const UNKNOWN_ADDRESS: &str = "unknown";

// ---------------------------------------------------------------------------
// Keys
// ---------------------------------------------------------------------------

/// Dimension under which usage is independently capped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RateLimitScope {
    /// The authenticated user id.
    Identity,
    /// The client network address.
    NetworkAddress,
}

impl RateLimitScope {
    /// Stable storage name of the scope.
    pub fn as_str(&self) -> &'static str {
        match self {
            RateLimitScope::Identity => "uid",
            RateLimitScope::NetworkAddress => "ip",
        }
    }
}

impl fmt::Display for RateLimitScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Storage key of one counter.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CounterKey {
    pub scope: RateLimitScope,
    pub scope_key: String,
    pub day_key: String,
}

impl CounterKey {
    pub fn new(scope: RateLimitScope, scope_key: &str, day_key: &str) -> Self {
        Self {
            scope,
            scope_key: scope_key.to_string(),
            day_key: day_key.to_string(),
        }
    }
}

/// The UTC calendar date of `now` as `YYYY-MM-DD`.
pub fn day_key(now: Timestamp) -> String {
    now.format("%Y-%m-%d").to_string()
}

// ---------------------------------------------------------------------------
// Store
// ---------------------------------------------------------------------------

/// Result of one check-and-increment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IncrementOutcome {
    /// The request was counted; `count` is the new value.
    Admitted { count: i64 },
    /// The counter was already at the ceiling and was left untouched.
    Exceeded { count: i64 },
}

/// Persistent per-(scope, day) counters.
#[async_trait]
pub trait UsageCounterStore: Send + Sync {
    /// Atomically read the counter for `key` and, if it is below `ceiling`,
    /// increment it and stamp the update time.
    async fn check_and_increment(
        &self,
        key: &CounterKey,
        ceiling: i64,
    ) -> Result<IncrementOutcome, CoreError>;

    /// Current value of the counter, `0` if it has never been incremented.
    async fn current_count(&self, key: &CounterKey) -> Result<i64, CoreError>;
}

/// A counter value with its last update time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UsageCounter {
    pub count: i64,
    pub last_updated_at: Timestamp,
}

/// In-process [`UsageCounterStore`].
///
/// Counters live for the life of the process and are not shared between
/// replicas. Suitable for tests and single-instance development servers.
#[derive(Debug, Default)]
pub struct MemoryUsageStore {
    counters: Mutex<HashMap<CounterKey, UsageCounter>>,
}

impl MemoryUsageStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of a counter, if it exists.
    pub async fn get(&self, key: &CounterKey) -> Option<UsageCounter> {
        self.counters.lock().await.get(key).copied()
    }
}

#[async_trait]
impl UsageCounterStore for MemoryUsageStore {
    async fn check_and_increment(
        &self,
        key: &CounterKey,
        ceiling: i64,
    ) -> Result<IncrementOutcome, CoreError> {
        let mut counters = self.counters.lock().await;

        let count = counters.get(key).map_or(0, |c| c.count);
        if count >= ceiling {
            return Ok(IncrementOutcome::Exceeded { count });
        }

        let counter = UsageCounter {
            count: count + 1,
            last_updated_at: chrono::Utc::now(),
        };
        counters.insert(key.clone(), counter);
        Ok(IncrementOutcome::Admitted {
            count: counter.count,
        })
    }

    async fn current_count(&self, key: &CounterKey) -> Result<i64, CoreError> {
        Ok(self.counters.lock().await.get(key).map_or(0, |c| c.count))
    }
}

// ---------------------------------------------------------------------------
// RateLimiter
// ---------------------------------------------------------------------------

/// Applies a fixed daily ceiling on top of a [`UsageCounterStore`].
#[derive(Clone)]
pub struct RateLimiter {
    store: Arc<dyn UsageCounterStore>,
    ceiling: i64,
}

impl fmt::Debug for RateLimiter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RateLimiter")
            .field("ceiling", &self.ceiling)
            .finish_non_exhaustive()
    }
}

impl RateLimiter {
    pub fn new(store: Arc<dyn UsageCounterStore>, ceiling: i64) -> Self {
        Self { store, ceiling }
    }

    pub fn ceiling(&self) -> i64 {
        self.ceiling
    }

    pub fn store(&self) -> &Arc<dyn UsageCounterStore> {
        &self.store
    }

    /// Count one request against `(scope, scope_key, day_key)`.
    ///
    /// Returns the new count, or [`CoreError::RateLimited`] if the counter
    /// was already at the ceiling.
    pub async fn check_and_increment(
        &self,
        scope: RateLimitScope,
        scope_key: &str,
        day_key: &str,
    ) -> Result<i64, CoreError> {
        let key = CounterKey::new(scope, scope_key, day_key);
        match self.store.check_and_increment(&key, self.ceiling).await? {
            IncrementOutcome::Admitted { count } => Ok(count),
            IncrementOutcome::Exceeded { .. } => Err(CoreError::RateLimited(format!(
                "daily limit of {} requests reached for {scope}",
                self.ceiling
            ))),
        }
    }

    /// Count one feedback request for a caller.
    ///
    /// The identity scope is checked first; if it is exhausted the network
    /// address counter is not touched.
    pub async fn admit(&self, uid: &str, address: &str, day_key: &str) -> Result<(), CoreError> {
        self.check_and_increment(RateLimitScope::Identity, uid, day_key)
            .await?;
        self.check_and_increment(RateLimitScope::NetworkAddress, address, day_key)
            .await?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
