use std::sync::Arc;

use iterra_core::rate_limit::RateLimiter;
use iterra_llm::TextCompletion;

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// Cheaply cloneable: every field is behind an `Arc` or is a pool handle.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: iterra_db::DbPool,
    pub config: Arc<ServerConfig>,
    /// Daily feedback-request limiter (identity and network address).
    pub rate_limiter: RateLimiter,
    /// Text-completion backend for coaching feedback.
    pub llm: Arc<dyn TextCompletion>,
}
