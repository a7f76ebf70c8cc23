//! Upload entity model and DTO.
//!
//! An upload is the durable record of one analysed video: where the video
//! lives, the pose summary it produced, and the coaching tips returned.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use iterra_core::types::{DbId, Timestamp};

/// A row from the `uploads` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Upload {
    pub id: DbId,
    /// Identity (token subject) of the player who uploaded the video.
    pub owner_uid: String,
    pub video_url: String,
    pub pose_summary: String,
    /// JSON array of tip strings.
    pub tips: serde_json::Value,
    pub created_at: Timestamp,
}

/// DTO for recording a new upload.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateUpload {
    #[serde(alias = "videoUrl")]
    pub video_url: String,
    #[serde(default, alias = "poseSummary")]
    pub pose_summary: Option<String>,
    #[serde(default)]
    pub tips: Vec<String>,
}
