// handlers/protected/files.rs - zoning rule documents
//
// POST /upload (multipart field `file`), GET /files, GET /files/search,
// DELETE /files/:id. Stored files are served under the public uploads path.

use axum::{
    extract::{multipart::MultipartError, Multipart, Path, Query, State},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::app::AppState;
use crate::config::StorageConfig;
use crate::database::models::{NewUploadedFile, UploadedFile};
use crate::database::FileStore;
use crate::error::ApiError;
use crate::handlers::path_id;
use crate::middleware::{ApiResponse, ApiResult};
use crate::services::file_storage;

#[derive(Debug, Serialize)]
pub struct FileUploaded {
    pub message: &'static str,
    pub file: UploadedFile,
}

#[derive(Debug, Serialize)]
pub struct FileDeleted {
    pub message: &'static str,
    pub id: i64,
}

#[derive(Debug, Deserialize)]
pub struct FileSearchQuery {
    pub filename: Option<String>,
}

fn multipart_error(err: MultipartError) -> ApiError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ApiError::payload_too_large("Uploaded file is too large")
    } else {
        ApiError::bad_request(format!("Invalid multipart body: {}", err.body_text()))
    }
}

/// Writes the bytes, then records the row. When the row cannot be recorded
/// the file is removed again so no unreferenced upload stays on disk.
pub(crate) async fn store_upload<S: FileStore + ?Sized>(
    store: &S,
    storage: &StorageConfig,
    filename: String,
    bytes: &[u8],
) -> Result<UploadedFile, ApiError> {
    let stored = file_storage::save_upload(storage, &filename, bytes)
        .await
        .map_err(|e| {
            error!("Failed to write upload {}: {}", filename, e);
            ApiError::internal_server_error("Failed to store uploaded file")
        })?;

    let public_path = stored.public_path.clone();
    match store
        .record_file(NewUploadedFile {
            filename,
            file_path: stored.public_path,
        })
        .await
    {
        Ok(file) => Ok(file),
        Err(db_err) => {
            if let Err(e) = file_storage::remove_upload(storage, &public_path).await {
                error!("Failed to remove unrecorded upload {}: {}", public_path, e);
            }
            Err(db_err.into())
        }
    }
}

pub async fn upload_post(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> ApiResult<FileUploaded> {
    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name() != Some("file") {
            continue;
        }

        let filename = field
            .file_name()
            .map(str::to_string)
            .filter(|name| !name.trim().is_empty())
            .ok_or_else(|| ApiError::invalid_field("file", "File name is required"))?;
        let bytes = field.bytes().await.map_err(multipart_error)?;

        let file = store_upload(&*state.store, &state.config.storage, filename, &bytes).await?;

        info!("Stored upload {} as {}", file.id, file.file_path);
        return Ok(ApiResponse::created(FileUploaded {
            message: "File uploaded successfully",
            file,
        }));
    }

    Err(ApiError::bad_request("No file uploaded"))
}

/// Newest first
pub async fn files_get(State(state): State<AppState>) -> ApiResult<Vec<UploadedFile>> {
    Ok(ApiResponse::success(state.store.list_files().await?))
}

pub async fn files_search_get(
    State(state): State<AppState>,
    Query(query): Query<FileSearchQuery>,
) -> ApiResult<Vec<UploadedFile>> {
    let filename = query
        .filename
        .as_deref()
        .map(str::trim)
        .filter(|f| !f.is_empty())
        .ok_or_else(|| ApiError::bad_request("Missing filename query parameter"))?;

    Ok(ApiResponse::success(state.store.search_files(filename).await?))
}

/// Removes the row, then the file on disk. A disk failure is logged only;
/// the row is already gone.
pub async fn file_delete(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<FileDeleted> {
    let id = path_id(&id)?;
    let file = state.store.delete_file(id).await?;

    if let Err(e) = file_storage::remove_upload(&state.config.storage, &file.file_path).await {
        error!("Failed to remove {} from disk: {}", file.file_path, e);
    }

    Ok(ApiResponse::success(FileDeleted {
        message: "File deleted successfully",
        id,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::DatabaseError;
    use async_trait::async_trait;
    use uuid::Uuid;

    struct BrokenFileStore;

    #[async_trait]
    impl FileStore for BrokenFileStore {
        async fn record_file(&self, _file: NewUploadedFile) -> Result<UploadedFile, DatabaseError> {
            Err(DatabaseError::Sqlx(sqlx::Error::PoolTimedOut))
        }

        async fn list_files(&self) -> Result<Vec<UploadedFile>, DatabaseError> {
            Ok(Vec::new())
        }

        async fn search_files(&self, _filename: &str) -> Result<Vec<UploadedFile>, DatabaseError> {
            Ok(Vec::new())
        }

        async fn delete_file(&self, id: i64) -> Result<UploadedFile, DatabaseError> {
            Err(DatabaseError::NotFound(format!("File {} not found.", id)))
        }
    }

    #[tokio::test]
    async fn failed_record_removes_the_written_file() {
        let storage = StorageConfig {
            upload_dir: std::env::temp_dir().join(format!("zoning-uploads-{}", Uuid::new_v4().simple())),
            public_path: "/uploads".to_string(),
        };

        let err = store_upload(&BrokenFileStore, &storage, "rules.pdf".to_string(), b"%PDF")
            .await
            .unwrap_err();
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let mut entries = tokio::fs::read_dir(&storage.upload_dir).await.unwrap();
        assert!(entries.next_entry().await.unwrap().is_none());
        let _ = tokio::fs::remove_dir_all(&storage.upload_dir).await;
    }
}
