//! Download Route
//!
//! POST /api/download takes the batch of edits the client accumulated
//! against an upload session, applies them to the stored original, and
//! streams back the edited PDF while recording a new version.

use axum::{
    body::Body,
    extract::State,
    http::{header, Response, StatusCode},
    routing::post,
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;

use crate::db::{ActivityRepository, DocumentRepository, NewVersion, VersionRepository};
use crate::edit::{self, SignaturePlacement, TextEdit};
use crate::error::{AppError, Result};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/download", post(download_pdf))
}

#[derive(Debug, Deserialize)]
struct DownloadRequest {
    session_id: String,
    #[serde(default)]
    edits: Vec<TextEdit>,
    #[serde(default)]
    signatures: Vec<SignaturePlacement>,
}

/// POST /api/download
async fn download_pdf(
    State(state): State<AppState>,
    Json(request): Json<DownloadRequest>,
) -> Result<Response<Body>> {
    if request.edits.is_empty() && request.signatures.is_empty() {
        return Err(AppError::BadRequest(
            "no edits or signatures provided".to_string(),
        ));
    }

    let document = DocumentRepository::new(state.db())
        .get_by_session(&request.session_id)
        .await?
        .ok_or_else(|| {
            AppError::NotFound(format!("no document for session {}", request.session_id))
        })?;

    let source = state
        .store()
        .read_upload(&document.stored_filename)
        .await
        .map_err(|_| AppError::NotFound("stored file is missing".to_string()))?;

    let edits = request.edits.clone();
    let signatures = request.signatures.clone();
    let edited =
        tokio::task::spawn_blocking(move || edit::apply_edits(&source, &edits, &signatures))
            .await
            .map_err(|e| AppError::Internal(format!("edit task failed: {e}")))??;

    let (output_name, output_path) = state
        .store()
        .save_output(&document.original_filename, &edited)
        .await?;

    let versions = VersionRepository::new(state.db());
    let version = versions
        .create(&NewVersion {
            document_id: document.id.clone(),
            stored_filename: output_name.clone(),
            file_path: output_path.to_string_lossy().to_string(),
            file_size: edited.len() as i64,
            total_edits: (request.edits.len() + request.signatures.len()) as i64,
            edit_summary: json!({
                "text_edits": request.edits.len(),
                "signatures": request.signatures.len(),
            })
            .to_string(),
        })
        .await?;
    versions.record_edits(&version.id, &request.edits).await?;

    ActivityRepository::new(state.db())
        .log(
            "download",
            json!({
                "filename": output_name,
                "version": version.version_number,
                "text_edits": request.edits.len(),
                "signatures": request.signatures.len(),
            }),
            Some(&document.id),
        )
        .await?;

    tracing::info!(
        pdf_id = %document.id,
        version = version.version_number,
        "produced {}", output_name
    );

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "application/pdf")
        .header(
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{output_name}\""),
        )
        .header("X-Version-Id", &version.id)
        .header("X-Version-Number", version.version_number.to_string())
        .body(Body::from(edited))
        .map_err(|e| AppError::Internal(e.to_string()))
}
