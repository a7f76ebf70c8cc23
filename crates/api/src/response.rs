//! Shared response envelope types for API handlers.
//!
//! Resource endpoints answer with a `{ "data": ... }` envelope. The feedback
//! endpoint is the exception: its `{ tips, fullResponse }` body is a fixed
//! client contract.

use serde::Serialize;

/// Standard `{ "data": T }` response envelope.
#[derive(Debug, Serialize)]
pub struct DataResponse<T: Serialize> {
    pub data: T,
}
