//! Pose-metric extraction pipeline.
//!
//! A run loads the landmark detector, waits for the video's duration,
//! samples a fixed number of evenly spaced frames, detects the primary
//! subject's landmarks in each, and folds the results into a
//! [`PoseMetrics`](iterra_core::metrics::PoseMetrics) record.
//!
//! Seeks and detections for one video are strictly sequential: the video
//! source and detector are borrowed mutably for the whole run.

pub mod aggregator;
pub mod analysis;
pub mod detector;
pub mod error;
pub mod ffmpeg;
pub mod sampler;
pub mod video;

pub use analysis::{AnalysisConfig, PoseAnalyzer};
pub use error::PipelineError;
