pub mod feedback;
pub mod health;
pub mod uploads;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// ```text
/// /feedback              generate coaching feedback (POST)
///
/// /uploads               list, create
/// /uploads/{id}          get
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/feedback", feedback::router())
        .nest("/uploads", uploads::router())
}
