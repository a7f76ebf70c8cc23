//! Client for the feedback endpoint.

use iterra_core::feedback::FeedbackResponse;
use iterra_core::metrics::PoseMetrics;
use reqwest::StatusCode;

/// Failures a caller needs to tell apart.
#[derive(Debug, thiserror::Error)]
pub enum FeedbackClientError {
    #[error("not signed in or token expired")]
    Unauthorized,

    #[error("daily feedback limit reached, try again tomorrow")]
    RateLimited,

    #[error("feedback request failed ({status}): {message}")]
    Failed { status: u16, message: String },

    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),
}

/// Map a non-success response to its error.
fn classify(status: StatusCode, body: &str) -> FeedbackClientError {
    match status {
        StatusCode::UNAUTHORIZED => FeedbackClientError::Unauthorized,
        StatusCode::TOO_MANY_REQUESTS => FeedbackClientError::RateLimited,
        other => {
            let message = serde_json::from_str::<serde_json::Value>(body)
                .ok()
                .and_then(|v| v["error"].as_str().map(str::to_string))
                .unwrap_or_else(|| body.to_string());
            FeedbackClientError::Failed {
                status: other.as_u16(),
                message,
            }
        }
    }
}

pub struct FeedbackClient {
    client: reqwest::Client,
    url: String,
}

impl FeedbackClient {
    /// `url` is the full endpoint, e.g. `http://localhost:3000/api/v1/feedback`.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: url.into(),
        }
    }

    pub async fn request_feedback(
        &self,
        metrics: &PoseMetrics,
        token: &str,
    ) -> Result<FeedbackResponse, FeedbackClientError> {
        let response = self
            .client
            .post(&self.url)
            .bearer_auth(token)
            .json(metrics)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(classify(status, &body));
        }
        Ok(response.json().await?)
    }
}
