//! Repository for the `usage_counters` table.

use sqlx::PgPool;
use iterra_core::rate_limit::IncrementOutcome;

use crate::models::usage_counter::UsageCounterRow;

/// Column list for the `usage_counters` table.
const COLUMNS: &str = "id, scope, scope_key, day_key, count, last_updated_at, created_at";

/// Transactional access to per-scope daily counters.
pub struct UsageCounterRepo;

impl UsageCounterRepo {
    /// Atomically check a counter against `ceiling` and increment it.
    ///
    /// Runs in one transaction: the row is materialized if missing, locked
    /// with `SELECT ... FOR UPDATE`, compared, and either incremented and
    /// committed or rolled back untouched. Concurrent calls for the same key
    /// queue on the row lock, so the ceiling holds under contention.
    pub async fn check_and_increment(
        pool: &PgPool,
        scope: &str,
        scope_key: &str,
        day_key: &str,
        ceiling: i64,
    ) -> Result<IncrementOutcome, sqlx::Error> {
        let mut tx = pool.begin().await?;

        sqlx::query(
            "INSERT INTO usage_counters (scope, scope_key, day_key) \
             VALUES ($1, $2, $3) \
             ON CONFLICT (scope, scope_key, day_key) DO NOTHING",
        )
        .bind(scope)
        .bind(scope_key)
        .bind(day_key)
        .execute(&mut *tx)
        .await?;

        let (count,): (i64,) = sqlx::query_as(
            "SELECT count FROM usage_counters \
             WHERE scope = $1 AND scope_key = $2 AND day_key = $3 \
             FOR UPDATE",
        )
        .bind(scope)
        .bind(scope_key)
        .bind(day_key)
        .fetch_one(&mut *tx)
        .await?;

        if count >= ceiling {
            tx.rollback().await?;
            return Ok(IncrementOutcome::Exceeded { count });
        }

        let (count,): (i64,) = sqlx::query_as(
            "UPDATE usage_counters \
             SET count = count + 1, last_updated_at = NOW() \
             WHERE scope = $1 AND scope_key = $2 AND day_key = $3 \
             RETURNING count",
        )
        .bind(scope)
        .bind(scope_key)
        .bind(day_key)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(IncrementOutcome::Admitted { count })
    }

    /// Find a counter by its key.
    pub async fn find(
        pool: &PgPool,
        scope: &str,
        scope_key: &str,
        day_key: &str,
    ) -> Result<Option<UsageCounterRow>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM usage_counters \
             WHERE scope = $1 AND scope_key = $2 AND day_key = $3"
        );
        sqlx::query_as::<_, UsageCounterRow>(&query)
            .bind(scope)
            .bind(scope_key)
            .bind(day_key)
            .fetch_optional(pool)
            .await
    }
}
