//! Evenly spaced frame sampling.

use std::time::Duration;

use crate::error::PipelineError;
use crate::video::{usable_duration, Raster, VideoSource};

/// Frames sampled per video unless configured otherwise.
pub const DEFAULT_FRAME_COUNT: u32 = 10;

/// How long to wait for a video to report its duration.
pub const DEFAULT_READINESS_TIMEOUT: Duration = Duration::from_millis(2000);

/// How long a single seek may take before the run fails.
pub const DEFAULT_SEEK_TIMEOUT: Duration = Duration::from_millis(5000);

/// Distance kept from the end of the video; seeking to exactly the
/// duration yields no frame on most decoders.
pub const END_EPSILON_SECS: f64 = 0.01;

/// Compute `frame_count` strictly increasing timestamps in `[0, duration)`.
///
/// Timestamp `i` is `i * duration / frame_count`, clamped to
/// `duration - epsilon`. The clamp never exceeds half a step, so neighbours
/// can never collapse onto the same value. A non-positive or non-finite
/// duration, or a zero frame count, yields no timestamps.
pub fn sample_timestamps(duration: f64, frame_count: u32, epsilon: f64) -> Vec<f64> {
    if !(duration.is_finite() && duration > 0.0) || frame_count == 0 {
        return Vec::new();
    }

    let step = duration / f64::from(frame_count);
    let ceiling = duration - epsilon.max(0.0).min(step / 2.0);
    (0..frame_count)
        .map(|i| (f64::from(i) * step).min(ceiling))
        .collect()
}

#[derive(Debug, Clone)]
pub struct SamplerConfig {
    pub frame_count: u32,
    pub readiness_timeout: Duration,
    pub seek_timeout: Duration,
    pub end_epsilon_secs: f64,
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self {
            frame_count: DEFAULT_FRAME_COUNT,
            readiness_timeout: DEFAULT_READINESS_TIMEOUT,
            seek_timeout: DEFAULT_SEEK_TIMEOUT,
            end_epsilon_secs: END_EPSILON_SECS,
        }
    }
}

/// One captured sample.
#[derive(Debug, Clone)]
pub struct SampledFrame {
    pub index: u32,
    pub timestamp_secs: f64,
    pub raster: Raster,
}

/// Drives a [`VideoSource`] through the sample timestamps.
#[derive(Debug, Clone, Default)]
pub struct FrameSampler {
    config: SamplerConfig,
}

impl FrameSampler {
    pub fn new(config: SamplerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SamplerConfig {
        &self.config
    }

    /// Wait until `source` reports a usable duration.
    ///
    /// Fails with [`PipelineError::MediaNotReady`] once the readiness
    /// timeout elapses.
    pub async fn wait_for_duration<S>(&self, source: &mut S) -> Result<f64, PipelineError>
    where
        S: VideoSource + ?Sized,
    {
        if let Some(duration) = usable_duration(source.duration()) {
            return Ok(duration);
        }

        let wait = async {
            loop {
                source.metadata_changed().await;
                if let Some(duration) = usable_duration(source.duration()) {
                    break duration;
                }
            }
        };

        tokio::time::timeout(self.config.readiness_timeout, wait)
            .await
            .map_err(|_| PipelineError::MediaNotReady {
                waited_ms: self.config.readiness_timeout.as_millis() as u64,
            })
    }

    /// The sample timestamps for a video of `duration` seconds.
    pub fn timestamps(&self, duration: f64) -> Vec<f64> {
        sample_timestamps(duration, self.config.frame_count, self.config.end_epsilon_secs)
    }

    /// Seek to `timestamp_secs` and capture the frame there.
    pub async fn capture_at<S>(
        &self,
        source: &mut S,
        index: u32,
        timestamp_secs: f64,
    ) -> Result<SampledFrame, PipelineError>
    where
        S: VideoSource + ?Sized,
    {
        match tokio::time::timeout(self.config.seek_timeout, source.seek(timestamp_secs)).await {
            Err(_) => {
                return Err(PipelineError::SeekTimeout {
                    timestamp_secs,
                    timeout_ms: self.config.seek_timeout.as_millis() as u64,
                })
            }
            Ok(result) => result?,
        }

        let raster = source.capture().await?;
        Ok(SampledFrame {
            index,
            timestamp_secs,
            raster,
        })
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use async_trait::async_trait;

    use super::*;
    use crate::video::VideoError;

    // -- sample_timestamps ----------------------------------------------------

    #[test]
    fn ten_second_video_gives_whole_seconds() {
        let ts = sample_timestamps(10.0, 10, END_EPSILON_SECS);
        assert_eq!(ts, vec![0.0, 1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0]);
    }

    #[test]
    fn timestamps_are_strictly_increasing_and_inside_video() {
        let cases = [(0.3, 10), (1.0, 1), (7.77, 13), (10.0, 2000), (0.004, 50), (3600.0, 10)];
        for (duration, n) in cases {
            let ts = sample_timestamps(duration, n, END_EPSILON_SECS);
            assert_eq!(ts.len(), n as usize, "duration {duration}, n {n}");
            assert!(ts.windows(2).all(|w| w[0] < w[1]), "duration {duration}, n {n}");
            assert!(ts.iter().all(|t| (0.0..duration).contains(t)), "duration {duration}, n {n}");
        }
    }

    #[test]
    fn unusable_inputs_give_nothing() {
        assert!(sample_timestamps(0.0, 10, END_EPSILON_SECS).is_empty());
        assert!(sample_timestamps(-1.0, 10, END_EPSILON_SECS).is_empty());
        assert!(sample_timestamps(f64::NAN, 10, END_EPSILON_SECS).is_empty());
        assert!(sample_timestamps(5.0, 0, END_EPSILON_SECS).is_empty());
    }

    // -- FrameSampler ---------------------------------------------------------

    /// Reports its duration after a number of metadata ticks; seeks either
    /// complete immediately or never.
    struct ScriptedSource {
        duration: Option<f64>,
        ready_after_ticks: Option<u32>,
        ticks: u32,
        hang_on_seek: bool,
        last_seek: Option<f64>,
    }

    impl ScriptedSource {
        fn new(ready_after_ticks: Option<u32>) -> Self {
            Self {
                duration: None,
                ready_after_ticks,
                ticks: 0,
                hang_on_seek: false,
                last_seek: None,
            }
        }
    }

    #[async_trait]
    impl VideoSource for ScriptedSource {
        fn duration(&self) -> Option<f64> {
            self.duration
        }

        fn dimensions(&self) -> (u32, u32) {
            (4, 4)
        }

        async fn metadata_changed(&mut self) {
            tokio::time::sleep(Duration::from_millis(5)).await;
            self.ticks += 1;
            if self.ready_after_ticks.is_some_and(|n| self.ticks >= n) {
                self.duration = Some(6.0);
            }
        }

        async fn seek(&mut self, timestamp_secs: f64) -> Result<(), VideoError> {
            if self.hang_on_seek {
                std::future::pending::<()>().await;
            }
            self.last_seek = Some(timestamp_secs);
            Ok(())
        }

        async fn capture(&mut self) -> Result<Raster, VideoError> {
            self.last_seek.ok_or(VideoError::NoFrame)?;
            Ok(Raster::new(4, 4))
        }
    }

    fn fast_sampler() -> FrameSampler {
        FrameSampler::new(SamplerConfig {
            readiness_timeout: Duration::from_millis(200),
            seek_timeout: Duration::from_millis(50),
            ..SamplerConfig::default()
        })
    }

    #[tokio::test]
    async fn waits_for_late_metadata() {
        let mut source = ScriptedSource::new(Some(3));
        let duration = fast_sampler().wait_for_duration(&mut source).await.unwrap();
        assert_eq!(duration, 6.0);
        assert_eq!(source.ticks, 3);
    }

    #[tokio::test]
    async fn never_ready_is_media_not_ready() {
        let mut source = ScriptedSource::new(None);
        let err = fast_sampler().wait_for_duration(&mut source).await.unwrap_err();
        assert_matches!(err, PipelineError::MediaNotReady { waited_ms: 200 });
    }

    #[tokio::test]
    async fn hanging_seek_times_out() {
        let mut source = ScriptedSource::new(Some(0));
        source.hang_on_seek = true;
        let err = fast_sampler().capture_at(&mut source, 2, 1.2).await.unwrap_err();
        assert_matches!(err, PipelineError::SeekTimeout { timeout_ms: 50, .. });
    }

    #[tokio::test]
    async fn capture_returns_frame_at_timestamp() {
        let mut source = ScriptedSource::new(Some(0));
        let frame = fast_sampler().capture_at(&mut source, 4, 2.4).await.unwrap();
        assert_eq!(frame.index, 4);
        assert_eq!(frame.timestamp_secs, 2.4);
        assert_eq!(frame.raster.dimensions(), (4, 4));
        assert_eq!(source.last_seek, Some(2.4));
    }
}
