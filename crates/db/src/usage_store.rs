//! PostgreSQL-backed [`UsageCounterStore`].

use async_trait::async_trait;
use iterra_core::error::CoreError;
use iterra_core::rate_limit::{CounterKey, IncrementOutcome, UsageCounterStore};

use crate::repositories::UsageCounterRepo;
use crate::DbPool;

/// Usage counters stored in the `usage_counters` table.
///
/// Shared by every API replica, so the daily ceiling holds across the
/// whole deployment.
#[derive(Debug, Clone)]
pub struct PgUsageStore {
    pool: DbPool,
}

impl PgUsageStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UsageCounterStore for PgUsageStore {
    async fn check_and_increment(
        &self,
        key: &CounterKey,
        ceiling: i64,
    ) -> Result<IncrementOutcome, CoreError> {
        UsageCounterRepo::check_and_increment(
            &self.pool,
            key.scope.as_str(),
            &key.scope_key,
            &key.day_key,
            ceiling,
        )
        .await
        .map_err(|e| {
            tracing::error!(error = %e, scope = %key.scope, "Usage counter transaction failed");
            CoreError::Internal(format!("usage counter update failed: {e}"))
        })
    }

    async fn current_count(&self, key: &CounterKey) -> Result<i64, CoreError> {
        let row = UsageCounterRepo::find(&self.pool, key.scope.as_str(), &key.scope_key, &key.day_key)
            .await
            .map_err(|e| CoreError::Internal(format!("usage counter lookup failed: {e}")))?;
        Ok(row.map_or(0, |r| r.count))
    }
}
