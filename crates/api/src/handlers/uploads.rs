//! Handlers for a player's upload history.
//!
//! Every endpoint is scoped to the authenticated caller; another player's
//! upload is reported as not found.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use iterra_core::error::CoreError;
use iterra_core::types::DbId;
use iterra_db::models::upload::CreateUpload;
use iterra_db::repositories::upload_repo::DEFAULT_LIST_LIMIT;
use iterra_db::repositories::UploadRepo;

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

/// POST /api/v1/uploads
pub async fn create_upload(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(input): Json<CreateUpload>,
) -> AppResult<impl IntoResponse> {
    if input.video_url.trim().is_empty() {
        return Err(AppError::Core(CoreError::Validation(
            "videoUrl is required".into(),
        )));
    }

    let upload = UploadRepo::create(&state.pool, &auth.uid, &input).await?;
    tracing::info!(upload_id = upload.id, uid = %auth.uid, "Upload recorded");

    Ok((StatusCode::CREATED, Json(DataResponse { data: upload })))
}

/// GET /api/v1/uploads
///
/// The caller's uploads, newest first.
pub async fn list_uploads(
    auth: AuthUser,
    State(state): State<AppState>,
) -> AppResult<impl IntoResponse> {
    let uploads = UploadRepo::list_by_owner(&state.pool, &auth.uid, DEFAULT_LIST_LIMIT).await?;

    Ok(Json(DataResponse { data: uploads }))
}

/// GET /api/v1/uploads/{id}
pub async fn get_upload(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(upload_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let upload = UploadRepo::find_by_id(&state.pool, upload_id)
        .await?
        .filter(|u| u.owner_uid == auth.uid)
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Upload",
            id: upload_id,
        }))?;

    Ok(Json(DataResponse { data: upload }))
}
