use crate::types::DbId;

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: &'static str, id: DbId },

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// A daily usage ceiling was reached for one of the rate-limit scopes.
    #[error("Rate limit exceeded: {0}")]
    RateLimited(String),

    #[error("Internal error: {0}")]
    Internal(String),
}
