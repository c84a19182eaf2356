// src/handlers/upload.rs

use axum::{Json, extract::Multipart, extract::State, response::IntoResponse};

use crate::{error::AppError, utils::upload::UploadClient};

/// Maximum accepted file size: 10 MiB.
const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Accepts a single multipart `file` part and forwards it to the external
/// blob store. Returns `{url, name, size, content_type}`. Authenticated.
pub async fn upload_file(
    State(uploader): State<UploadClient>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(format!("Malformed multipart body: {}", e)))?
    {
        if field.name() != Some("file") {
            continue;
        }

        let file_name = field
            .file_name()
            .map(str::to_owned)
            .unwrap_or_else(|| format!("upload-{}", uuid::Uuid::new_v4()));

        let content_type = field
            .content_type()
            .map(str::to_owned)
            .unwrap_or_else(|| "application/octet-stream".to_string());

        let bytes = field
            .bytes()
            .await
            .map_err(|e| AppError::BadRequest(format!("Failed to read file: {}", e)))?;

        if bytes.is_empty() {
            return Err(AppError::BadRequest("Uploaded file is empty".to_string()));
        }

        if bytes.len() > MAX_UPLOAD_BYTES {
            return Err(AppError::BadRequest(
                "File exceeds the 10 MiB upload limit".to_string(),
            ));
        }

        let stored = uploader
            .store(&file_name, &content_type, bytes.to_vec())
            .await?;

        return Ok(Json(stored));
    }

    Err(AppError::BadRequest(
        "Missing 'file' part in multipart body".to_string(),
    ))
}
