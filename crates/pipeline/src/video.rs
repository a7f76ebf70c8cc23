//! The seekable video abstraction the sampler drives.

use std::time::Duration;

use async_trait::async_trait;

/// A captured frame: 8-bit RGB at the video's native resolution.
pub type Raster = image::RgbImage;

/// How often [`VideoSource::metadata_changed`] wakes by default.
pub const METADATA_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Errors from a video backend.
#[derive(Debug, thiserror::Error)]
pub enum VideoError {
    #[error("video file not found: {0}")]
    NotFound(String),

    #[error("video decoder failed: {0}")]
    Decode(String),

    /// The position lies past the last picture, e.g. in an audio tail.
    #[error("no frame decoded at {timestamp_secs:.3}s")]
    EmptyFrame { timestamp_secs: f64 },

    #[error("capture requested before any seek completed")]
    NoFrame,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// A video with a single shared play-head.
///
/// Methods take `&mut self` because seeking moves the play-head; callers
/// cannot issue overlapping seeks on one source.
#[async_trait]
pub trait VideoSource: Send {
    /// Total length in seconds, or `None` while metadata is still loading.
    fn duration(&self) -> Option<f64>;

    /// Native frame size as `(width, height)`.
    fn dimensions(&self) -> (u32, u32);

    /// Resolve when the source's metadata may have changed.
    ///
    /// Event-driven sources should override this to wake on their own
    /// notification. The default wakes every [`METADATA_POLL_INTERVAL`].
    async fn metadata_changed(&mut self) {
        tokio::time::sleep(METADATA_POLL_INTERVAL).await;
    }

    /// Move the play-head to `timestamp_secs`, resolving once the seek has
    /// completed and the frame at that position is ready.
    async fn seek(&mut self, timestamp_secs: f64) -> Result<(), VideoError>;

    /// The frame at the current play-head.
    async fn capture(&mut self) -> Result<Raster, VideoError>;
}

/// A duration is usable once it is known, finite, and positive.
pub fn usable_duration(duration: Option<f64>) -> Option<f64> {
    duration.filter(|d| d.is_finite() && *d > 0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unusable_durations_are_rejected() {
        assert_eq!(usable_duration(None), None);
        assert_eq!(usable_duration(Some(f64::NAN)), None);
        assert_eq!(usable_duration(Some(f64::INFINITY)), None);
        assert_eq!(usable_duration(Some(0.0)), None);
        assert_eq!(usable_duration(Some(-3.0)), None);
        assert_eq!(usable_duration(Some(12.5)), Some(12.5));
    }
}
