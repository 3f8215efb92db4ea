use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Response,
};
use tokio_util::io::ReaderStream;
use std::path::Path as StdPath;

use crate::errors::{AppError, Result};
use crate::state::AppState;

/// Stream a stored receipt back to its owner or a reviewer.
pub async fn serve_receipt(
    State(state): State<AppState>,
    Path(file_name): Path<String>,
) -> Result<Response> {
    // Security: prevent path traversal
    if file_name.contains("..") || file_name.contains('/') || file_name.contains('\\') {
        return Err(AppError::ReceiptNotFound);
    }

    let file_path = format!("{}/{}", state.config.upload_dir, file_name);

    if !StdPath::new(&file_path).is_file() {
        return Err(AppError::ReceiptNotFound);
    }

    let file = tokio::fs::File::open(&file_path)
        .await
        .map_err(|_| AppError::ReceiptNotFound)?;

    let stream = ReaderStream::new(file);

    let content_type = if file_path.ends_with(".png") {
        "image/png"
    } else if file_path.ends_with(".jpg") || file_path.ends_with(".jpeg") {
        "image/jpeg"
    } else if file_path.ends_with(".gif") {
        "image/gif"
    } else if file_path.ends_with(".pdf") {
        "application/pdf"
    } else {
        "application/octet-stream"
    };

    let response = Response::builder()
        .status(StatusCode::OK)
        .header("content-type", content_type)
        .header("cache-control", "private, max-age=0")
        .body(axum::body::Body::from_stream(stream))
        .map_err(|e| AppError::invalid_data(e.to_string()))?;

    Ok(response)
}
