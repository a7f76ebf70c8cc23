use crate::video::VideoError;

/// Failures that abort an analysis run.
///
/// A frame in which no pose was found is not an error; it is skipped by
/// the aggregator.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("video metadata (duration) not loaded after {waited_ms} ms")]
    MediaNotReady { waited_ms: u64 },

    #[error("seek to {timestamp_secs:.3}s did not complete within {timeout_ms} ms")]
    SeekTimeout { timestamp_secs: f64, timeout_ms: u64 },

    #[error("pose detector failed to initialize: {0}")]
    ModelInit(String),

    #[error(transparent)]
    Video(#[from] VideoError),

    #[error("analysis cancelled")]
    Cancelled,
}

impl PipelineError {
    /// Stable machine-readable name of the failure kind.
    pub fn kind(&self) -> &'static str {
        match self {
            PipelineError::MediaNotReady { .. } => "media_not_ready",
            PipelineError::SeekTimeout { .. } => "seek_timeout",
            PipelineError::ModelInit(_) => "model_init",
            PipelineError::Video(_) => "video",
            PipelineError::Cancelled => "cancelled",
        }
    }
}
