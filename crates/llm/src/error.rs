/// Errors from the completion client.
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    /// The HTTP request itself failed (network, DNS, TLS, decoding).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The provider returned a non-2xx status code.
    #[error("LLM API error ({status}): {body}")]
    ApiError { status: u16, body: String },

    /// The provider answered without any message content.
    #[error("LLM returned an empty response")]
    EmptyResponse,
}
