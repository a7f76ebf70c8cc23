//! Handler for coaching feedback generation.
//!
//! Order of checks: authentication (extractor), body validation, daily
//! rate limit, then the model call. A request rejected at any step never
//! reaches the next one, so invalid bodies do not consume quota and
//! rate-limited callers never reach the model.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use iterra_core::feedback::{
    build_coaching_prompt, extract_tips, FeedbackRequest, FeedbackResponse, SYSTEM_PROMPT,
};
use iterra_core::rate_limit::day_key;
use iterra_llm::CompletionRequest;

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::middleware::client_ip::ClientIp;
use crate::state::AppState;

/// POST /api/v1/feedback (also POST /api/generate-feedback)
///
/// Turns a pose-metrics record into numbered coaching tips. Responds with
/// `{ "tips": [...], "fullResponse": "..." }`.
pub async fn generate_feedback(
    auth: AuthUser,
    ClientIp(ip): ClientIp,
    State(state): State<AppState>,
    body: Result<Json<FeedbackRequest>, JsonRejection>,
) -> AppResult<Json<FeedbackResponse>> {
    let Json(request) = body.map_err(|rejection| AppError::BadRequest(rejection.body_text()))?;
    let metrics = request.validate()?;

    let today = day_key(chrono::Utc::now());
    if let Err(err) = state.rate_limiter.admit(&auth.uid, &ip, &today).await {
        tracing::warn!(uid = %auth.uid, ip = %ip, day = %today, error = %err, "Feedback request rejected");
        return Err(err.into());
    }

    let prompt = build_coaching_prompt(&metrics);
    let completion = state
        .llm
        .complete(&CompletionRequest::new(SYSTEM_PROMPT, prompt))
        .await?;

    let tips = extract_tips(&completion);
    tracing::info!(
        uid = %auth.uid,
        mode = %metrics.mode,
        tips = tips.len(),
        "Feedback generated",
    );

    Ok(Json(FeedbackResponse {
        tips,
        full_response: completion,
    }))
}
