//! Document staging and upload-job enqueue.

use axum::Json;
use axum::extract::{Multipart, State};
use axum::http::StatusCode;
use bytes::Bytes;
use chrono::Utc;

use paperjet_core::error::AppError;

use crate::dto::response::{ApiResponse, DocumentAcceptedResponse};
use crate::error::ApiError;
use crate::state::AppState;

/// POST /api/documents/upload — multipart upload.
///
/// Stages the file under the staging root, creates the document record,
/// and enqueues the upload job. The object-store transfer happens in the
/// upload worker; this handler returns as soon as the job is durable.
pub async fn upload_document(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<ApiResponse<DocumentAcceptedResponse>>), ApiError> {
    let mut file_name: Option<String> = None;
    let mut data: Option<Bytes> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::validation(format!("Multipart error: {e}")))?
    {
        let name = field.name().unwrap_or("").to_string();
        if name == "file" {
            file_name = field.file_name().map(String::from);
            data = Some(
                field
                    .bytes()
                    .await
                    .map_err(|e| AppError::validation(format!("Read error: {e}")))?,
            );
        }
    }

    let file_name = file_name.ok_or_else(|| AppError::validation("file is required"))?;
    validate_file_name(&file_name)?;
    let data = data.ok_or_else(|| AppError::validation("file data is required"))?;
    if data.is_empty() {
        return Err(AppError::validation("file is empty").into());
    }

    // Millisecond prefix keeps concurrent uploads of the same file name
    // from clobbering each other in the staging directory.
    let staged_name = format!("{}-{}", Utc::now().timestamp_millis(), file_name);
    let staging_root = &state.config.storage.staging_root;

    tokio::fs::create_dir_all(staging_root)
        .await
        .map_err(AppError::from)?;
    tokio::fs::write(std::path::Path::new(staging_root).join(&staged_name), &data)
        .await
        .map_err(AppError::from)?;

    let document = state
        .document_repo
        .create(&file_name, &staged_name)
        .await?;

    let job = state
        .producer
        .document_upload(document.id, &staged_name)
        .await?;

    tracing::info!(
        "Staged document {} ('{}', {} bytes), upload job {}",
        document.id,
        file_name,
        data.len(),
        job.id
    );

    Ok((
        StatusCode::ACCEPTED,
        Json(ApiResponse::ok(DocumentAcceptedResponse {
            document_id: document.id,
            job_id: job.id,
        })),
    ))
}

/// Reject file names that do not name a single staging-directory entry.
///
/// Staged files are written as `{millis}-{name}` directly under the
/// staging root; separators and parent references have no legitimate use
/// in an uploaded name, so they fail fast as a validation error instead
/// of surfacing later as an I/O failure.
fn validate_file_name(name: &str) -> Result<(), AppError> {
    if name.trim().is_empty() {
        return Err(AppError::validation("file name is required"));
    }
    if name.contains(['/', '\\']) || name.contains("..") {
        return Err(AppError::validation(format!("Invalid file name: {name}")));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::validate_file_name;

    #[test]
    fn test_plain_names_accepted() {
        assert!(validate_file_name("report.pdf").is_ok());
        assert!(validate_file_name("My Report (final).PDF").is_ok());
    }

    #[test]
    fn test_separators_and_parent_refs_rejected() {
        assert!(validate_file_name("../../etc/passwd").is_err());
        assert!(validate_file_name("dir/report.pdf").is_err());
        assert!(validate_file_name("dir\\report.pdf").is_err());
        assert!(validate_file_name("..").is_err());
        assert!(validate_file_name("   ").is_err());
    }
}
