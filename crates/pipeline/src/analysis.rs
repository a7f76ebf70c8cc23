//! One end-to-end pose analysis run.

use std::future::Future;

use iterra_core::metrics::{FeedbackMode, PoseMetrics};
use iterra_core::pose::PoseFrame;
use tokio_util::sync::CancellationToken;

use crate::aggregator::MetricAggregator;
use crate::detector::LandmarkDetector;
use crate::error::PipelineError;
use crate::sampler::{FrameSampler, SamplerConfig};
use crate::video::{VideoError, VideoSource};

#[derive(Debug, Clone, Default)]
pub struct AnalysisConfig {
    pub sampler: SamplerConfig,
    pub mode: FeedbackMode,
}

/// Runs the sampler, detector and aggregator over one video.
pub struct PoseAnalyzer<D> {
    detector: D,
    sampler: FrameSampler,
    mode: FeedbackMode,
}

impl<D: LandmarkDetector> PoseAnalyzer<D> {
    pub fn new(detector: D, config: AnalysisConfig) -> Self {
        Self {
            detector,
            sampler: FrameSampler::new(config.sampler),
            mode: config.mode,
        }
    }

    pub fn detector(&self) -> &D {
        &self.detector
    }

    /// Analyze `source` and return its metrics.
    ///
    /// The detector is loaded first and closed once sampling ends, whether
    /// or not sampling succeeded. Frames where detection misses or errors
    /// are counted but contribute no samples, as are timestamps where the
    /// source has no picture. Cancelling `cancel` aborts at the next
    /// suspension point.
    pub async fn run<S>(
        &mut self,
        source: &mut S,
        cancel: &CancellationToken,
    ) -> Result<PoseMetrics, PipelineError>
    where
        S: VideoSource + ?Sized,
    {
        cancellable(cancel, self.detector.load())
            .await?
            .map_err(|e| PipelineError::ModelInit(e.to_string()))?;

        let result = self.sample(source, cancel).await;
        self.detector.close().await;

        match &result {
            Ok(metrics) => tracing::info!(
                frames_sampled = metrics.frames_sampled,
                frames_with_pose = metrics.frames_with_pose,
                knee_angle = metrics.knee_angle,
                elbow_angle = metrics.elbow_angle,
                "Pose analysis complete",
            ),
            Err(e) => tracing::warn!(error = %e, kind = e.kind(), "Pose analysis failed"),
        }
        result
    }

    async fn sample<S>(
        &mut self,
        source: &mut S,
        cancel: &CancellationToken,
    ) -> Result<PoseMetrics, PipelineError>
    where
        S: VideoSource + ?Sized,
    {
        let duration = cancellable(cancel, self.sampler.wait_for_duration(source)).await??;
        let timestamps = self.sampler.timestamps(duration);
        tracing::debug!(duration, frames = timestamps.len(), "Sampling video");

        let mut aggregator = MetricAggregator::new();
        for (index, timestamp_secs) in (0u32..).zip(timestamps) {
            let captured =
                cancellable(cancel, self.sampler.capture_at(source, index, timestamp_secs)).await?;
            let frame = match captured {
                Ok(frame) => frame,
                Err(PipelineError::Video(VideoError::EmptyFrame { .. })) => {
                    tracing::debug!(index, timestamp_secs, "No picture at timestamp");
                    aggregator.push(&PoseFrame::missed(index, timestamp_secs));
                    continue;
                }
                Err(e) => return Err(e),
            };

            let timestamp_ms = (timestamp_secs * 1000.0).round() as u64;
            let detection = cancellable(cancel, self.detector.detect(&frame.raster, timestamp_ms)).await?;

            let pose = match detection {
                Ok(Some(landmarks)) if !landmarks.is_empty() => {
                    PoseFrame::detected(index, timestamp_secs, landmarks)
                }
                Ok(_) => {
                    tracing::debug!(index, timestamp_secs, "No pose in frame");
                    PoseFrame::missed(index, timestamp_secs)
                }
                Err(e) => {
                    tracing::warn!(index, timestamp_secs, error = %e, "Pose detection failed, skipping frame");
                    PoseFrame::missed(index, timestamp_secs)
                }
            };
            aggregator.push(&pose);
        }

        Ok(aggregator.finish(duration, self.mode))
    }
}

/// Race `fut` against cancellation.
async fn cancellable<F: Future>(
    cancel: &CancellationToken,
    fut: F,
) -> Result<F::Output, PipelineError> {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(PipelineError::Cancelled),
        out = fut => Ok(out),
    }
}
