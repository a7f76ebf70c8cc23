//! Usage counter rows backing the daily rate limiter.

use serde::Serialize;
use sqlx::FromRow;
use iterra_core::types::{DbId, Timestamp};

/// One `(scope, scope_key, day_key)` counter.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct UsageCounterRow {
    pub id: DbId,
    /// `uid` or `ip`.
    pub scope: String,
    pub scope_key: String,
    /// UTC calendar date, `YYYY-MM-DD`.
    pub day_key: String,
    pub count: i64,
    pub last_updated_at: Timestamp,
    pub created_at: Timestamp,
}
