//! Repository for the `uploads` table.

use sqlx::PgPool;
use iterra_core::types::DbId;

use crate::models::upload::{CreateUpload, Upload};

/// Column list for the `uploads` table.
const COLUMNS: &str = "id, owner_uid, video_url, pose_summary, tips, created_at";

/// Default page size when listing a user's uploads.
pub const DEFAULT_LIST_LIMIT: i64 = 50;

/// Provides create/read operations for uploads.
pub struct UploadRepo;

impl UploadRepo {
    /// Record a new upload for `owner_uid`.
    pub async fn create(
        pool: &PgPool,
        owner_uid: &str,
        input: &CreateUpload,
    ) -> Result<Upload, sqlx::Error> {
        let query = format!(
            "INSERT INTO uploads (owner_uid, video_url, pose_summary, tips) \
             VALUES ($1, $2, COALESCE($3, ''), $4) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Upload>(&query)
            .bind(owner_uid)
            .bind(&input.video_url)
            .bind(&input.pose_summary)
            .bind(serde_json::json!(input.tips))
            .fetch_one(pool)
            .await
    }

    /// Find an upload by id.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Upload>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM uploads WHERE id = $1");
        sqlx::query_as::<_, Upload>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List an owner's uploads, newest first.
    pub async fn list_by_owner(
        pool: &PgPool,
        owner_uid: &str,
        limit: i64,
    ) -> Result<Vec<Upload>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM uploads \
             WHERE owner_uid = $1 \
             ORDER BY created_at DESC, id DESC \
             LIMIT $2"
        );
        sqlx::query_as::<_, Upload>(&query)
            .bind(owner_uid)
            .bind(limit)
            .fetch_all(pool)
            .await
    }
}
