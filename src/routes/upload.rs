use axum::{
    extract::{DefaultBodyLimit, Multipart, State},
    routing::post,
    Json, Router,
};
use tracing::info;

use crate::models::{AppState, MessageResponse};
use crate::staging::{parse_staged, stage_upload};
use crate::types::{AppError, AppResult};

pub fn router(state: AppState) -> Router {
    let limit = state.config.server.max_upload_bytes;
    Router::new()
        .route("/upload", post(upload_file))
        .layer(DefaultBodyLimit::max(limit))
        .with_state(state)
}

/// POST /upload - stage, parse and register the multipart `file` field
async fn upload_file(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> AppResult<Json<MessageResponse>> {
    let mut upload = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.body_text()))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let Some(filename) = field.file_name().map(str::to_string) else {
            continue;
        };
        let data = field
            .bytes()
            .await
            .map_err(|e| AppError::BadRequest(e.body_text()))?;
        upload = Some((filename, data));
        break;
    }

    let (filename, data) =
        upload.ok_or_else(|| AppError::BadRequest("No file uploaded.".to_string()))?;
    info!(dataset = %filename, bytes = data.len(), "File upload request received");

    let path = stage_upload(&state.config.staging.upload_dir, &data).await?;
    let records = parse_staged(path).await?;
    let count = records.len();
    state.store.load(&filename, records).await;
    info!(dataset = %filename, records = count, "upload parsed");

    Ok(Json(MessageResponse::new(format!(
        "File {} uploaded and parsed successfully.",
        filename
    ))))
}
