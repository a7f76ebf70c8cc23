//! Coaching-feedback request validation, prompt construction, and tip
//! extraction.
//!
//! The feedback endpoint accepts a loosely typed JSON body, validates it
//! into a [`PoseMetrics`] record before any rate-limit or model work
//! happens, renders the coaching prompt, and splits the model's free text
//! into numbered tips.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::metrics::{FeedbackMode, PoseMetrics, MAX_ANGLE_DEGREES, MAX_SCORE};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Value used for text fields the client did not send.
pub const UNKNOWN: &str = "unknown";

/// System message sent ahead of every coaching prompt.
pub const SYSTEM_PROMPT: &str =
    "You are a tennis coach giving elite-level, practical advice based on pose estimation data.";

/// Upper bound on the coaching response length requested from the model.
pub const MAX_RESPONSE_WORDS: u32 = 500;

/// A tip starts on a line beginning with an integer followed by a period.
static TIP_MARKER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*\d+\.").expect("valid regex"));

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

/// Raw body of a feedback request.
///
/// Every field is optional at the serde level so a missing field becomes a
/// validation error with a useful message rather than a parse failure. A
/// field with the wrong JSON type (e.g. a string `kneeAngle`) still fails
/// to parse and is rejected by the caller before validation.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackRequest {
    #[serde(default)]
    pub mode: FeedbackMode,
    pub shot_type: Option<String>,
    pub stance: Option<String>,
    pub video_duration: Option<f64>,
    pub knee_angle: Option<f64>,
    pub elbow_angle: Option<f64>,
    pub torso_rotation: Option<f64>,
    pub wrist_lag_timing: Option<f64>,
    pub weight_transfer_score: Option<f64>,
    pub footwork_score: Option<f64>,
    pub head_stability: Option<String>,
    pub detected_issues: Option<String>,
    pub summary: Option<String>,
}

/// Successful feedback payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackResponse {
    pub tips: Vec<String>,
    pub full_response: String,
}

impl FeedbackRequest {
    /// Validate the request into a complete [`PoseMetrics`] record.
    ///
    /// `shotType`, `kneeAngle`, and `elbowAngle` are required. Angles must be
    /// in `[0, 180]`, scores in `[0, 10]`, and every other number finite and
    /// non-negative. Missing text fields default to [`UNKNOWN`], missing
    /// numbers to `0`.
    pub fn validate(self) -> Result<PoseMetrics, CoreError> {
        let shot_type = self
            .shot_type
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .ok_or_else(|| CoreError::Validation("shotType is required".into()))?;

        let knee_angle = require(self.knee_angle, "kneeAngle")?;
        validate_range(knee_angle, 0.0, MAX_ANGLE_DEGREES, "kneeAngle")?;

        let elbow_angle = require(self.elbow_angle, "elbowAngle")?;
        validate_range(elbow_angle, 0.0, MAX_ANGLE_DEGREES, "elbowAngle")?;

        let torso_rotation = optional_non_negative(self.torso_rotation, "torsoRotation")?;
        let video_duration = optional_non_negative(self.video_duration, "videoDuration")?;
        let wrist_lag_timing = optional_non_negative(self.wrist_lag_timing, "wristLagTiming")?;

        let weight_transfer_score = self.weight_transfer_score.unwrap_or(0.0);
        validate_range(weight_transfer_score, 0.0, MAX_SCORE, "weightTransferScore")?;

        let footwork_score = self.footwork_score.unwrap_or(0.0);
        validate_range(footwork_score, 0.0, MAX_SCORE, "footworkScore")?;

        Ok(PoseMetrics {
            mode: self.mode,
            shot_type,
            stance: text_or_unknown(self.stance),
            video_duration,
            knee_angle,
            elbow_angle,
            torso_rotation,
            wrist_lag_timing,
            weight_transfer_score,
            footwork_score,
            head_stability: text_or_unknown(self.head_stability),
            detected_issues: self.detected_issues.unwrap_or_else(|| "none".to_string()),
            summary: self.summary.unwrap_or_default(),
            frames_sampled: 0,
            frames_with_pose: 0,
        })
    }
}

// ---------------------------------------------------------------------------
// Validation helpers
// ---------------------------------------------------------------------------

fn require(value: Option<f64>, name: &str) -> Result<f64, CoreError> {
    value.ok_or_else(|| CoreError::Validation(format!("{name} is required and must be a number")))
}

/// Validate that a value is finite and falls within `[min, max]`.
pub fn validate_range(value: f64, min: f64, max: f64, name: &str) -> Result<(), CoreError> {
    if !value.is_finite() || !(min..=max).contains(&value) {
        return Err(CoreError::Validation(format!(
            "{name} must be between {min} and {max}, got {value}"
        )));
    }
    Ok(())
}

fn optional_non_negative(value: Option<f64>, name: &str) -> Result<f64, CoreError> {
    let value = value.unwrap_or(0.0);
    if !value.is_finite() || value < 0.0 {
        return Err(CoreError::Validation(format!(
            "{name} must be a non-negative number, got {value}"
        )));
    }
    Ok(value)
}

fn text_or_unknown(value: Option<String>) -> String {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| UNKNOWN.to_string())
}

// ---------------------------------------------------------------------------
// Prompt
// ---------------------------------------------------------------------------

/// Render the coaching prompt for a validated metrics record.
pub fn build_coaching_prompt(m: &PoseMetrics) -> String {
    let focus = match m.mode {
        FeedbackMode::Technical => "technical (stroke mechanics and biomechanics)",
        FeedbackMode::Tactical => "tactical (shot selection, court positioning, and patterns of play)",
    };

    format!(
        "You are a world-class tennis coach and biomechanics analyst working with an elite ATP-level player.

---

## VIDEO-BASED DATA (INPUT):

- Shot Type: {shot_type}
- Player Stance: {stance}
- Video Duration: {duration}s
- Knee Bend Depth (avg): {knee}°
- Elbow Extension Angle (avg): {elbow}°
- Torso Rotation (shoulder separation): {torso}°
- Wrist Lag Timing: {wrist}s after load
- Weight Transfer Efficiency: {weight}/10
- Footwork Quality: {footwork}/10
- Head Stability: {head}
- Error Flags: {issues}
- Coaching Focus: {focus}

---

## INSTRUCTIONS:

Analyze the player's stroke using elite tennis coaching principles and biomechanics. Format your response like this:

1. **Form Summary**
2. **Why It Matters**
3. **Strategic Consideration**
4. **Actionable Drills**
5. **Quantitative Suggestions**

- Tone: high-performance, professional (ATP level)
- Use biomechanics terms (kinetic chain, rotational torque, etc.)
- Be direct, precise, no filler
- Limit response to {max_words} words max
",
        shot_type = m.shot_type,
        stance = m.stance,
        duration = m.video_duration,
        knee = m.knee_angle,
        elbow = m.elbow_angle,
        torso = m.torso_rotation,
        wrist = m.wrist_lag_timing,
        weight = m.weight_transfer_score,
        footwork = m.footwork_score,
        head = m.head_stability,
        issues = m.detected_issues,
        max_words = MAX_RESPONSE_WORDS,
    )
}

// ---------------------------------------------------------------------------
// Tip extraction
// ---------------------------------------------------------------------------

/// Split a model response into numbered tips.
///
/// A tip begins on a line whose first non-blank characters are an integer
/// followed by `.`, and runs until the next such line or the end of the
/// text. Text before the first marker is dropped. Each tip is trimmed.
pub fn extract_tips(text: &str) -> Vec<String> {
    let mut tips = Vec::new();
    let mut current: Option<String> = None;

    for line in text.lines() {
        if TIP_MARKER_RE.is_match(line) {
            if let Some(tip) = current.take() {
                push_trimmed(&mut tips, &tip);
            }
            current = Some(line.to_string());
        } else if let Some(tip) = current.as_mut() {
            tip.push('\n');
            tip.push_str(line);
        }
    }

    if let Some(tip) = current {
        push_trimmed(&mut tips, &tip);
    }

    tips
}

fn push_trimmed(tips: &mut Vec<String>, tip: &str) {
    let trimmed = tip.trim();
    if !trimmed.is_empty() {
        tips.push(trimmed.to_string());
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
