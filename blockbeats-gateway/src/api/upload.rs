//! Multipart upload proxy
//!
//! Validates the incoming file type, generates a timestamped document name,
//! and forwards the payload to the pinning capability. Upstream pinning
//! failures and internal errors both surface as a generic 500; the caller's
//! remedy is the same either way.

use axum::extract::{Multipart, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use serde_json::json;
use tracing::{error, info};

use crate::AppState;

/// Successful upload response, wire names fixed by the front-end
#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub status: String,
    #[serde(rename = "ipfsHash")]
    pub ipfs_hash: String,
    #[serde(rename = "fileName")]
    pub file_name: String,
    #[serde(rename = "documentId")]
    pub document_id: String,
    #[serde(rename = "fileType")]
    pub file_type: String,
}

/// Upload API errors
#[derive(Debug)]
pub enum UploadError {
    MissingFile,
    UnsupportedType,
    MalformedBody(String),
    Internal(String),
}

impl IntoResponse for UploadError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            UploadError::MissingFile => {
                (StatusCode::BAD_REQUEST, "No file provided".to_string())
            }
            UploadError::UnsupportedType => (
                StatusCode::BAD_REQUEST,
                "Only audio, image, or JSON files are allowed".to_string(),
            ),
            UploadError::MalformedBody(msg) => {
                (StatusCode::BAD_REQUEST, format!("Malformed upload: {}", msg))
            }
            UploadError::Internal(msg) => {
                error!("Upload failed: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error".to_string())
            }
        };

        let body = Json(json!({
            "error": message,
        }));

        (status, body).into_response()
    }
}

/// Accepted upload types: audio, image, JSON. Browsers send JSON files as
/// octet-stream often enough that the extension is a fallback signal.
fn is_allowed_type(file_type: &str, file_name: &str) -> bool {
    file_type.starts_with("audio/")
        || file_type.starts_with("image/")
        || file_type == "application/json"
        || (file_type == "application/octet-stream" && file_name.ends_with(".json"))
}

/// POST /api/upload
///
/// Multipart form with a required `file` field. Pins the payload under a
/// generated `<name>_<timestamp>` document id.
pub async fn handle_upload(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, UploadError> {
    let mut file: Option<(String, String, Vec<u8>)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| UploadError::MalformedBody(e.to_string()))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let file_name = field.file_name().unwrap_or("upload").to_string();
        let file_type = field
            .content_type()
            .unwrap_or("application/octet-stream")
            .to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|e| UploadError::MalformedBody(e.to_string()))?;
        file = Some((file_name, file_type, bytes.to_vec()));
        break;
    }

    let (file_name, file_type, bytes) = file.ok_or(UploadError::MissingFile)?;

    if !is_allowed_type(&file_type, &file_name) {
        return Err(UploadError::UnsupportedType);
    }

    let document_id = format!("{}_{}", file_name, chrono::Utc::now().timestamp_millis());

    let ipfs_hash = state
        .publisher
        .pin_file(bytes, &document_id)
        .await
        .map_err(|e| UploadError::Internal(e.to_string()))?;

    info!("Pinned {} ({}) as {}", document_id, file_type, ipfs_hash);

    Ok(Json(UploadResponse {
        status: "success".to_string(),
        ipfs_hash,
        file_name,
        document_id,
        file_type,
    }))
}
