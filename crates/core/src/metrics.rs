//! The pose-metrics record produced by one video analysis.
//!
//! [`PoseMetrics`] is serialized in camelCase because it is, field for
//! field, the request body of the feedback endpoint.

use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// FeedbackMode
// ---------------------------------------------------------------------------

/// Which kind of coaching the player asked for.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeedbackMode {
    #[default]
    Technical,
    Tactical,
}

impl FeedbackMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            FeedbackMode::Technical => "technical",
            FeedbackMode::Tactical => "tactical",
        }
    }
}

impl fmt::Display for FeedbackMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for FeedbackMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "technical" => Ok(FeedbackMode::Technical),
            "tactical" => Ok(FeedbackMode::Tactical),
            other => Err(format!("unknown feedback mode '{other}' (expected technical or tactical)")),
        }
    }
}

// ---------------------------------------------------------------------------
// Placeholder qualitative values
// ---------------------------------------------------------------------------

/// Qualitative fields that are not yet derived from pose data.
///
/// The analyzer reports these fixed values so downstream consumers always
/// receive a complete record. Replace them only with measurements that are
/// actually computed from landmarks.
pub mod placeholder {
    pub const SHOT_TYPE: &str = "forehand";
    pub const STANCE: &str = "open";
    pub const WRIST_LAG_TIMING_SECS: f64 = 0.2;
    pub const WEIGHT_TRANSFER_SCORE: f64 = 7.0;
    pub const FOOTWORK_SCORE: f64 = 8.0;
    pub const HEAD_STABILITY: &str = "stable";
    pub const DETECTED_ISSUES: &str = "early wrist release, shallow knee bend";
}

/// Upper bound of every 0-10 score field.
pub const MAX_SCORE: f64 = 10.0;

/// Upper bound of every arccos-derived angle field, in degrees.
pub const MAX_ANGLE_DEGREES: f64 = 180.0;

// ---------------------------------------------------------------------------
// PoseMetrics
// ---------------------------------------------------------------------------

/// Summary statistics for one analyzed video.
///
/// Angle fields are whole degrees in `[0, 180]`; a value of `0` with
/// `frames_with_pose == 0` (or a summary mentioning insufficient data) means
/// the metric could not be measured. Score fields are on a 0-10 scale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PoseMetrics {
    pub mode: FeedbackMode,
    pub shot_type: String,
    pub stance: String,
    /// Video length in seconds.
    pub video_duration: f64,
    pub knee_angle: f64,
    pub elbow_angle: f64,
    /// Shoulder-separation proxy, see [`crate::pose::torso_rotation_proxy`].
    pub torso_rotation: f64,
    pub wrist_lag_timing: f64,
    pub weight_transfer_score: f64,
    pub footwork_score: f64,
    pub head_stability: String,
    pub detected_issues: String,
    /// Human-readable description of the analysis.
    #[serde(default)]
    pub summary: String,
    /// Number of timestamps sampled from the video.
    #[serde(default)]
    pub frames_sampled: u32,
    /// Number of sampled frames in which a pose was detected.
    #[serde(default)]
    pub frames_with_pose: u32,
}
