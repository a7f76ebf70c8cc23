//! Pose landmarks and joint geometry.
//!
//! Landmark indices follow the 33-point BlazePose topology emitted by
//! MediaPipe-compatible detectors. Coordinates are normalized to the frame
//! (`x`, `y` in `[0, 1]`), so angles computed here are image-plane angles,
//! not true 3D joint angles.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Landmark indices (BlazePose, 33 points)
// ---------------------------------------------------------------------------

/// Number of landmarks in a full BlazePose skeleton.
pub const LANDMARK_COUNT: usize = 33;

pub const NOSE: usize = 0;
pub const LEFT_SHOULDER: usize = 11;
pub const RIGHT_SHOULDER: usize = 12;
pub const LEFT_ELBOW: usize = 13;
pub const RIGHT_ELBOW: usize = 14;
pub const LEFT_WRIST: usize = 15;
pub const RIGHT_WRIST: usize = 16;
pub const LEFT_HIP: usize = 23;
pub const RIGHT_HIP: usize = 24;
pub const LEFT_KNEE: usize = 25;
pub const RIGHT_KNEE: usize = 26;
pub const LEFT_ANKLE: usize = 27;
pub const RIGHT_ANKLE: usize = 28;

/// Segment lengths below this are treated as degenerate.
const MIN_SEGMENT_LENGTH: f64 = 1e-9;

// ---------------------------------------------------------------------------
// Landmark / PoseFrame
// ---------------------------------------------------------------------------

/// A single detected keypoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Landmark {
    /// Horizontal position, 0 = left edge, 1 = right edge.
    pub x: f64,
    /// Vertical position, 0 = top edge, 1 = bottom edge.
    pub y: f64,
    /// Relative depth. Zero when the detector only produces 2D points.
    #[serde(default)]
    pub z: f64,
    /// Detection confidence in `[0, 1]`.
    #[serde(default = "full_visibility", alias = "score")]
    pub visibility: f64,
    /// Keypoint label, when the detector sends one (e.g. `"left_knee"`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

fn full_visibility() -> f64 {
    1.0
}

impl Landmark {
    pub fn new(x: f64, y: f64, visibility: f64) -> Self {
        Self {
            x,
            y,
            z: 0.0,
            visibility,
            name: None,
        }
    }
}

/// The landmarks detected at one sampled timestamp.
///
/// `landmarks` is `None` when the detector found no subject in the frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PoseFrame {
    /// Zero-based position of the frame within the sample.
    pub index: u32,
    /// Media time of the frame in seconds.
    pub timestamp_secs: f64,
    pub landmarks: Option<Vec<Landmark>>,
}

impl PoseFrame {
    pub fn detected(index: u32, timestamp_secs: f64, landmarks: Vec<Landmark>) -> Self {
        Self {
            index,
            timestamp_secs,
            landmarks: Some(landmarks),
        }
    }

    pub fn missed(index: u32, timestamp_secs: f64) -> Self {
        Self {
            index,
            timestamp_secs,
            landmarks: None,
        }
    }

    /// Whether the detector produced at least one landmark for this frame.
    pub fn has_pose(&self) -> bool {
        self.landmarks.as_ref().is_some_and(|l| !l.is_empty())
    }

    /// Look up a landmark by BlazePose index.
    pub fn landmark(&self, index: usize) -> Option<&Landmark> {
        self.landmarks.as_ref()?.get(index)
    }
}

// ---------------------------------------------------------------------------
// Geometry
// ---------------------------------------------------------------------------

/// Angle at vertex `b` between the segments `b -> a` and `b -> c`, in degrees.
///
/// Computed as `acos((BA . BC) / (|BA| |BC|))` on the image plane. The cosine
/// is clamped to `[-1, 1]` so rounding never produces NaN, which keeps the
/// result in `[0, 180]`. Returns `None` when either segment has zero length.
pub fn joint_angle(a: &Landmark, b: &Landmark, c: &Landmark) -> Option<f64> {
    let ba = (a.x - b.x, a.y - b.y);
    let bc = (c.x - b.x, c.y - b.y);

    let mag_ba = (ba.0 * ba.0 + ba.1 * ba.1).sqrt();
    let mag_bc = (bc.0 * bc.0 + bc.1 * bc.1).sqrt();
    if !(mag_ba > MIN_SEGMENT_LENGTH && mag_bc > MIN_SEGMENT_LENGTH) {
        return None;
    }

    let dot = ba.0 * bc.0 + ba.1 * bc.1;
    let cos = (dot / (mag_ba * mag_bc)).clamp(-1.0, 1.0);
    Some(cos.acos().to_degrees())
}

/// Angle at the landmark `vertex` formed with `proximal` and `distal`.
fn angle_at(frame: &PoseFrame, proximal: usize, vertex: usize, distal: usize) -> Option<f64> {
    joint_angle(
        frame.landmark(proximal)?,
        frame.landmark(vertex)?,
        frame.landmark(distal)?,
    )
}

/// Left knee angle (hip - knee - ankle).
pub fn knee_angle(frame: &PoseFrame) -> Option<f64> {
    angle_at(frame, LEFT_HIP, LEFT_KNEE, LEFT_ANKLE)
}

/// Left elbow angle (shoulder - elbow - wrist).
pub fn elbow_angle(frame: &PoseFrame) -> Option<f64> {
    angle_at(frame, LEFT_SHOULDER, LEFT_ELBOW, LEFT_WRIST)
}

/// Shoulder-separation proxy for torso rotation.
///
/// Horizontal distance between the two shoulders scaled by 100. This is a
/// heuristic, not a rotation measurement: a player square to the camera
/// shows wide shoulders, a side-on player shows them overlapping.
pub fn torso_rotation_proxy(frame: &PoseFrame) -> Option<f64> {
    let left = frame.landmark(LEFT_SHOULDER)?;
    let right = frame.landmark(RIGHT_SHOULDER)?;
    Some((left.x - right.x).abs() * 100.0)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
