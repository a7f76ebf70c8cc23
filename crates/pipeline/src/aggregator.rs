//! Folds per-frame landmarks into a [`PoseMetrics`] record.

use iterra_core::metrics::{placeholder, FeedbackMode, PoseMetrics};
use iterra_core::pose::{
    self, PoseFrame, LEFT_ELBOW, LEFT_KNEE, RIGHT_ELBOW, RIGHT_KNEE,
};

/// Mean knee visibility below which knees are reported as too straight.
pub const KNEE_BEND_VISIBILITY_THRESHOLD: f64 = 0.6;

/// Mean elbow visibility below which elbows are reported as stiff.
pub const ELBOW_FLUIDITY_VISIBILITY_THRESHOLD: f64 = 0.5;

pub const NO_POSE_SUMMARY: &str =
    "Could not detect any poses. Make sure your entire body is visible in the video.";

/// Mean of `samples` rounded to the nearest whole number, or `None` when
/// there are no samples.
pub fn rounded_mean(samples: &[f64]) -> Option<f64> {
    if samples.is_empty() {
        return None;
    }
    let mean = samples.iter().sum::<f64>() / samples.len() as f64;
    mean.is_finite().then(|| mean.round())
}

/// Running accumulator over the frames of one video.
#[derive(Debug, Default, Clone)]
pub struct MetricAggregator {
    knee: Vec<f64>,
    elbow: Vec<f64>,
    torso: Vec<f64>,
    frames_seen: u32,
    frames_with_pose: u32,
    knee_visibility: f64,
    elbow_visibility: f64,
}

impl MetricAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn frames_seen(&self) -> u32 {
        self.frames_seen
    }

    pub fn frames_with_pose(&self) -> u32 {
        self.frames_with_pose
    }

    /// Add one sampled frame. Frames without a pose only count as sampled.
    pub fn push(&mut self, frame: &PoseFrame) {
        self.frames_seen += 1;
        if !frame.has_pose() {
            return;
        }
        self.frames_with_pose += 1;

        if let Some(angle) = pose::knee_angle(frame) {
            self.knee.push(angle);
        }
        if let Some(angle) = pose::elbow_angle(frame) {
            self.elbow.push(angle);
        }
        if let Some(torso) = pose::torso_rotation_proxy(frame) {
            self.torso.push(torso);
        }

        // Absent joints contribute zero confidence.
        let visibility = |i: usize| frame.landmark(i).map_or(0.0, |l| l.visibility);
        self.knee_visibility += visibility(LEFT_KNEE) + visibility(RIGHT_KNEE);
        self.elbow_visibility += visibility(LEFT_ELBOW) + visibility(RIGHT_ELBOW);
    }

    /// Produce the final record for a video of `video_duration` seconds.
    pub fn finish(self, video_duration: f64, mode: FeedbackMode) -> PoseMetrics {
        let knee = rounded_mean(&self.knee);
        let elbow = rounded_mean(&self.elbow);
        let torso = rounded_mean(&self.torso);

        let summary = self.summary(&[
            ("knee angle", knee.is_none()),
            ("elbow angle", elbow.is_none()),
            ("torso rotation", torso.is_none()),
        ]);

        PoseMetrics {
            mode,
            shot_type: placeholder::SHOT_TYPE.to_string(),
            stance: placeholder::STANCE.to_string(),
            video_duration,
            knee_angle: knee.unwrap_or(0.0),
            elbow_angle: elbow.unwrap_or(0.0),
            torso_rotation: torso.unwrap_or(0.0),
            wrist_lag_timing: placeholder::WRIST_LAG_TIMING_SECS,
            weight_transfer_score: placeholder::WEIGHT_TRANSFER_SCORE,
            footwork_score: placeholder::FOOTWORK_SCORE,
            head_stability: placeholder::HEAD_STABILITY.to_string(),
            detected_issues: placeholder::DETECTED_ISSUES.to_string(),
            summary,
            frames_sampled: self.frames_seen,
            frames_with_pose: self.frames_with_pose,
        }
    }

    fn summary(&self, missing: &[(&str, bool)]) -> String {
        if self.frames_with_pose == 0 {
            return NO_POSE_SUMMARY.to_string();
        }

        let joints = f64::from(self.frames_with_pose) * 2.0;
        let knees = if self.knee_visibility / joints < KNEE_BEND_VISIBILITY_THRESHOLD {
            "too straight"
        } else {
            "properly bent"
        };
        let elbows = if self.elbow_visibility / joints < ELBOW_FLUIDITY_VISIBILITY_THRESHOLD {
            "stiff"
        } else {
            "fluid"
        };

        let mut summary = format!(
            "Player analysis: - Knees are {knees}. - Elbows are {elbows}. \
             Pose detected in {} of {} sampled frames.",
            self.frames_with_pose, self.frames_seen
        );
        for (metric, _) in missing.iter().filter(|(_, is_missing)| *is_missing) {
            summary.push_str(&format!(" Insufficient data for {metric}; reported as 0."));
        }
        summary
    }
}

#[cfg(test)]
mod tests {
    use iterra_core::pose::{Landmark, LANDMARK_COUNT, LEFT_ANKLE, LEFT_HIP};

    use super::*;

    /// A skeleton whose left knee bends by `degrees`, every point at
    /// `visibility`.
    fn knee_frame(index: u32, degrees: f64, visibility: f64) -> PoseFrame {
        let mut landmarks = vec![Landmark::new(0.5, 0.5, visibility); LANDMARK_COUNT];
        let rad = degrees.to_radians();
        landmarks[LEFT_HIP] = Landmark::new(0.5, 0.3, visibility);
        landmarks[LEFT_KNEE] = Landmark::new(0.5, 0.5, visibility);
        landmarks[LEFT_ANKLE] = Landmark::new(0.5 + 0.2 * rad.sin(), 0.5 - 0.2 * rad.cos(), visibility);
        PoseFrame::detected(index, f64::from(index), landmarks)
    }

    #[test]
    fn mean_of_knee_angles_over_detected_frames() {
        let angles = [90.0, 92.0, 88.0, 91.0, 89.0, 90.0, 93.0, 87.0];
        let mut agg = MetricAggregator::new();
        for (i, angle) in angles.iter().enumerate() {
            agg.push(&knee_frame(i as u32, *angle, 0.9));
        }
        agg.push(&PoseFrame::missed(8, 8.0));
        agg.push(&PoseFrame::missed(9, 9.0));

        let metrics = agg.finish(10.0, FeedbackMode::Technical);
        assert_eq!(metrics.knee_angle, 90.0);
        assert_eq!(metrics.frames_sampled, 10);
        assert_eq!(metrics.frames_with_pose, 8);
        assert_eq!(metrics.video_duration, 10.0);
        assert!(metrics.summary.contains("Pose detected in 8 of 10 sampled frames"));
    }

    #[test]
    fn no_poses_gives_zero_sentinels() {
        let mut agg = MetricAggregator::new();
        for i in 0..10 {
            agg.push(&PoseFrame::missed(i, f64::from(i)));
        }

        let metrics = agg.finish(10.0, FeedbackMode::Tactical);
        assert_eq!(metrics.knee_angle, 0.0);
        assert_eq!(metrics.elbow_angle, 0.0);
        assert_eq!(metrics.torso_rotation, 0.0);
        assert_eq!(metrics.summary, NO_POSE_SUMMARY);
        assert_eq!(metrics.mode, FeedbackMode::Tactical);
    }

    #[test]
    fn partial_skeleton_reports_missing_metrics() {
        // Only 12 landmarks: no shoulders-to-ankles geometry is available.
        let frame = PoseFrame::detected(0, 0.0, vec![Landmark::new(0.4, 0.4, 0.8); 12]);
        let mut agg = MetricAggregator::new();
        agg.push(&frame);

        let metrics = agg.finish(2.0, FeedbackMode::Technical);
        assert_eq!(metrics.knee_angle, 0.0);
        assert!(metrics.summary.contains("Insufficient data for knee angle"));
        assert!(metrics.summary.contains("Insufficient data for torso rotation"));
        assert!(!metrics.summary.contains("Could not detect"));
    }

    #[test]
    fn visibility_drives_joint_assessment() {
        let mut confident = MetricAggregator::new();
        confident.push(&knee_frame(0, 120.0, 0.9));
        let summary = confident.finish(1.0, FeedbackMode::Technical).summary;
        assert!(summary.contains("Knees are properly bent"));
        assert!(summary.contains("Elbows are fluid"));

        let mut faint = MetricAggregator::new();
        faint.push(&knee_frame(0, 120.0, 0.3));
        let summary = faint.finish(1.0, FeedbackMode::Technical).summary;
        assert!(summary.contains("Knees are too straight"));
        assert!(summary.contains("Elbows are stiff"));
    }

    #[test]
    fn placeholders_are_reported_verbatim() {
        let metrics = MetricAggregator::new().finish(3.0, FeedbackMode::Technical);
        assert_eq!(metrics.shot_type, "forehand");
        assert_eq!(metrics.stance, "open");
        assert_eq!(metrics.wrist_lag_timing, 0.2);
        assert_eq!(metrics.weight_transfer_score, 7.0);
        assert_eq!(metrics.footwork_score, 8.0);
        assert_eq!(metrics.head_stability, "stable");
        assert_eq!(metrics.detected_issues, "early wrist release, shallow knee bend");
    }

    #[test]
    fn rounded_mean_handles_empty_and_halves() {
        assert_eq!(rounded_mean(&[]), None);
        assert_eq!(rounded_mean(&[1.0, 2.0]), Some(2.0));
        assert_eq!(rounded_mean(&[44.2, 44.4]), Some(44.0));
    }
}
