//! HTTP surface for the storage engine.
//!
//! Thin axum handlers over [`StorageService`]: every route parses its
//! inputs into typed values at the boundary, calls a single service
//! operation, and maps [`StorageError`] to a status code plus a
//! `{message, error?}` JSON body. No retries; every failure is terminal
//! for its request.

use std::sync::Arc;

use axum::body::Body;
use axum::extract::{DefaultBodyLimit, Multipart, Path, Query as QueryParams, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post, put};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tokio_util::io::ReaderStream;
use tower_http::cors::CorsLayer;

use crate::error::StorageError;
use crate::storage::{FileEntry, Query, StorageService};

/// Shared handler state.
pub type AppState = Arc<StorageService>;

/// Build the application router.
pub fn router(service: AppState, max_upload_size: usize) -> Router {
    Router::new()
        .route("/files", get(list_files))
        .route("/file/{filename}", get(get_file).delete(delete_file))
        .route("/download/{filename}", get(download_file))
        .route("/rename/{filename}", put(rename_file))
        .route("/upload", post(upload_files))
        .layer(DefaultBodyLimit::max(max_upload_size))
        .layer(CorsLayer::permissive())
        .with_state(service)
}

/// Raw listing parameters as they arrive on the wire. Parsed into a
/// typed [`Query`] before touching the storage engine; invalid values
/// fall back to defaults instead of failing the request.
#[derive(Debug, Deserialize)]
struct RawListParams {
    q: Option<String>,
    sort: Option<String>,
    order: Option<String>,
}

/// JSON body of every error response.
#[derive(Debug, Serialize)]
struct ErrorBody {
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

/// Wrapper turning a [`StorageError`] into an HTTP response.
struct ApiError(StorageError);

impl From<StorageError> for ApiError {
    fn from(err: StorageError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            StorageError::NotFound(_) => StatusCode::NOT_FOUND,
            StorageError::IsDirectory(_) | StorageError::InvalidName(_) => {
                StatusCode::BAD_REQUEST
            }
            StorageError::NameCollision(_) | StorageError::Io(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!("request failed: {}", self.0);
        }

        let body = ErrorBody {
            message: self.0.message().to_string(),
            error: Some(self.0.to_string()),
        };

        (status, Json(body)).into_response()
    }
}

/// Simple `{message}` success body used by the mutation endpoints.
#[derive(Debug, Serialize)]
struct MessageBody {
    message: &'static str,
}

/// GET /files?q=&sort=&order=
async fn list_files(
    State(service): State<AppState>,
    QueryParams(params): QueryParams<RawListParams>,
) -> Result<Response, ApiError> {
    let query = Query::from_raw(
        params.q.as_deref(),
        params.sort.as_deref(),
        params.order.as_deref(),
    );
    let listing = service.list(&query).await?;
    Ok(Json(listing).into_response())
}

/// Single-entry response including the file content as lossy UTF-8.
#[derive(Debug, Serialize)]
struct FileWithContent {
    #[serde(flatten)]
    entry: FileEntry,
    content: String,
}

/// GET /file/{filename}
async fn get_file(
    State(service): State<AppState>,
    Path(filename): Path<String>,
) -> Result<Response, ApiError> {
    let (entry, content) = service.read(&filename).await?;
    let body = FileWithContent {
        entry,
        content: String::from_utf8_lossy(&content).into_owned(),
    };
    Ok(Json(body).into_response())
}

/// DELETE /file/{filename}
async fn delete_file(
    State(service): State<AppState>,
    Path(filename): Path<String>,
) -> Result<Response, ApiError> {
    service.delete(&filename).await?;
    Ok(Json(MessageBody {
        message: "File deleted successfully",
    })
    .into_response())
}

/// GET /download/{filename}
///
/// Streams raw bytes with attachment headers. The content type is always
/// opaque binary regardless of the actual file type.
async fn download_file(
    State(service): State<AppState>,
    Path(filename): Path<String>,
) -> Result<Response, ApiError> {
    let (name, size, file) = service.download(&filename).await?;

    let stream = ReaderStream::new(file);
    let response = Response::builder()
        .header(header::CONTENT_TYPE, "application/octet-stream")
        .header(
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{name}\""),
        )
        .header(header::CONTENT_LENGTH, size)
        .body(Body::from_stream(stream))
        .map_err(|err| StorageError::Io(std::io::Error::other(err)))?;

    Ok(response)
}

/// Body of PUT /rename/{filename}.
#[derive(Debug, Deserialize)]
struct RenameRequest {
    #[serde(rename = "newFilename", default)]
    new_filename: String,
}

/// PUT /rename/{filename}
async fn rename_file(
    State(service): State<AppState>,
    Path(filename): Path<String>,
    Json(request): Json<RenameRequest>,
) -> Result<Response, ApiError> {
    service.rename(&filename, &request.new_filename).await?;
    Ok(Json(MessageBody {
        message: "File renamed successfully",
    })
    .into_response())
}

/// Success body of POST /upload.
#[derive(Debug, Serialize)]
struct UploadResponse {
    message: &'static str,
    /// Names the files were actually stored under, in batch order.
    files: Vec<String>,
}

/// POST /upload, multipart field "file" (repeatable).
///
/// Files are processed sequentially so each one observes the names
/// written by the previous ones. The first failure aborts the remainder
/// of the batch; files already written stay in place.
async fn upload_files(
    State(service): State<AppState>,
    mut multipart: Multipart,
) -> Result<Response, ApiError> {
    let mut stored = Vec::new();

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(err) => {
                return Err(StorageError::Io(std::io::Error::other(err)).into());
            }
        };

        if field.name() != Some("file") {
            continue;
        }
        let Some(original_name) = field.file_name().map(str::to_owned) else {
            continue;
        };

        let data = field
            .bytes()
            .await
            .map_err(|err| StorageError::Io(std::io::Error::other(err)))?;

        let name = service.upload(&original_name, &data).await?;
        stored.push(name);
    }

    Ok(Json(UploadResponse {
        message: "Files uploaded successfully",
        files: stored,
    })
    .into_response())
}
