use axum::routing::post;
use axum::Router;

use crate::handlers::feedback;
use crate::state::AppState;

/// Feedback routes mounted at `/feedback`.
///
/// ```text
/// POST   /                  -> generate_feedback
/// ```
pub fn router() -> Router<AppState> {
    Router::new().route("/", post(feedback::generate_feedback))
}

/// The unversioned path existing web clients post to, mounted at the root.
pub fn legacy_router() -> Router<AppState> {
    Router::new().route("/api/generate-feedback", post(feedback::generate_feedback))
}
