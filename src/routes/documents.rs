//! Document Routes
//!
//! Upload and metadata endpoints:
//! - POST   /api/upload            - Upload a PDF, extract pages and text
//! - GET    /api/pdfs              - List active documents (paginated)
//! - GET    /api/pdfs/:id          - Document metadata
//! - DELETE /api/pdfs/:id          - Soft-delete a document
//! - GET    /api/pdfs/:id/pages    - Cached page data with text blocks
//! - GET    /api/pdfs/:id/versions - Edit history

use axum::{
    extract::{Multipart, Path, Query, State},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::db::{
    ActivityRepository, Document, DocumentRepository, DocumentVersion, NewDocument,
    PageRepository, VersionRepository,
};
use crate::error::{AppError, Result};
use crate::pdf::{self, ProcessedPage, SafePdf, TextBlock};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/upload", post(upload_pdf))
        .route("/pdfs", get(list_pdfs))
        .route("/pdfs/:id", get(get_pdf).delete(delete_pdf))
        .route("/pdfs/:id/pages", get(list_pages))
        .route("/pdfs/:id/versions", get(list_versions))
}

#[derive(Serialize)]
struct UploadResponse {
    success: bool,
    session_id: String,
    pdf_id: String,
    filename: String,
    total_pages: usize,
    pages: Vec<ProcessedPage>,
}

/// POST /api/upload
///
/// Accepts a single multipart `file` field. Validates and stores the
/// PDF, renders every page plus its thumbnail, extracts text blocks,
/// and returns the whole bundle so the editor can open immediately.
async fn upload_pdf(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>> {
    let mut filename = None;
    let mut data = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(format!("invalid multipart body: {e}")))?
    {
        if field.name() == Some("file") {
            filename = field.file_name().map(str::to_string);
            data = Some(
                field
                    .bytes()
                    .await
                    .map_err(|e| AppError::BadRequest(format!("failed to read file: {e}")))?,
            );
        }
    }

    let data = data.ok_or_else(|| AppError::BadRequest("missing 'file' field".to_string()))?;
    let filename = filename.unwrap_or_else(|| "document.pdf".to_string());

    if !filename.to_lowercase().ends_with(".pdf") {
        return Err(AppError::BadRequest(
            "only PDF files are accepted".to_string(),
        ));
    }
    if data.len() as u64 > state.store().max_file_size() {
        return Err(AppError::BadRequest(format!(
            "file exceeds the {} byte limit",
            state.store().max_file_size()
        )));
    }

    let source = SafePdf::from_bytes(data.to_vec())?;
    let total_pages = source.page_count();

    let session_id = Uuid::new_v4().to_string();
    let file_hash = hex::encode(Sha256::digest(&data));

    let (stored_filename, file_path) = state.store().save_upload(&session_id, &filename, &data).await?;

    let documents = DocumentRepository::new(state.db());
    let document = documents
        .create(&NewDocument {
            original_filename: filename.clone(),
            stored_filename,
            file_path: file_path.to_string_lossy().to_string(),
            file_size: data.len() as i64,
            file_hash,
            total_pages: total_pages as i64,
            session_id: session_id.clone(),
            user_id: None,
        })
        .await?;

    let page_repo = PageRepository::new(state.db());
    let mut pages = Vec::with_capacity(total_pages);
    for page_num in 0..total_pages {
        let (image, thumbnail, text_blocks) = pdf::process_page(&source, page_num).await?;

        let thumbnail_path = state
            .store()
            .save_thumbnail(&session_id, page_num, &thumbnail.png)
            .await?;
        page_repo
            .create(
                &document.id,
                page_num as i64,
                image.width as i64,
                image.height as i64,
                Some(&thumbnail_path),
                &text_blocks,
            )
            .await?;

        pages.push(ProcessedPage {
            page_num,
            image: image.to_data_url(),
            thumbnail: thumbnail.to_data_url(),
            width: image.width,
            height: image.height,
            text_blocks,
        });
    }

    ActivityRepository::new(state.db())
        .log(
            "upload",
            json!({ "filename": filename, "pages": total_pages }),
            Some(&document.id),
        )
        .await?;

    tracing::info!(pdf_id = %document.id, pages = total_pages, "uploaded {}", filename);

    Ok(Json(UploadResponse {
        success: true,
        session_id,
        pdf_id: document.id,
        filename,
        total_pages,
        pages,
    }))
}

#[derive(Deserialize)]
struct ListParams {
    #[serde(default)]
    skip: i64,
    #[serde(default = "default_limit")]
    limit: i64,
}

fn default_limit() -> i64 {
    100
}

#[derive(Serialize)]
struct PdfListResponse {
    total: usize,
    pdfs: Vec<Document>,
}

/// GET /api/pdfs
async fn list_pdfs(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<Json<PdfListResponse>> {
    let pdfs = DocumentRepository::new(state.db())
        .list(params.skip.max(0), params.limit.clamp(1, 1000))
        .await?;

    Ok(Json(PdfListResponse {
        total: pdfs.len(),
        pdfs,
    }))
}

/// GET /api/pdfs/:id
async fn get_pdf(State(state): State<AppState>, Path(id): Path<String>) -> Result<Json<Document>> {
    let document = DocumentRepository::new(state.db())
        .get(&id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("PDF {id} not found")))?;

    Ok(Json(document))
}

/// DELETE /api/pdfs/:id
///
/// Soft delete: the record is hidden from listings and stats but the
/// stored files stay on disk.
async fn delete_pdf(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>> {
    let deleted = DocumentRepository::new(state.db()).soft_delete(&id).await?;
    if !deleted {
        return Err(AppError::NotFound(format!("PDF {id} not found")));
    }

    ActivityRepository::new(state.db())
        .log("delete", json!({ "pdf_id": id }), Some(&id))
        .await?;

    Ok(Json(json!({ "success": true, "message": "PDF deleted" })))
}

#[derive(Serialize)]
struct PageResponse {
    id: String,
    page_number: i64,
    width: i64,
    height: i64,
    thumbnail_path: Option<String>,
    text_blocks: Vec<TextBlock>,
}

/// GET /api/pdfs/:id/pages
async fn list_pages(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Vec<PageResponse>>> {
    let documents = DocumentRepository::new(state.db());
    if documents.get(&id).await?.is_none() {
        return Err(AppError::NotFound(format!("PDF {id} not found")));
    }

    let pages = PageRepository::new(state.db()).list_for_document(&id).await?;

    let mut out = Vec::with_capacity(pages.len());
    for page in pages {
        let text_blocks = page.decoded_text_blocks()?;
        out.push(PageResponse {
            id: page.id,
            page_number: page.page_number,
            width: page.width,
            height: page.height,
            thumbnail_path: page.thumbnail_path,
            text_blocks,
        });
    }

    Ok(Json(out))
}

#[derive(Serialize)]
struct VersionListResponse {
    pdf_id: String,
    original_filename: String,
    total_versions: usize,
    versions: Vec<DocumentVersion>,
}

/// GET /api/pdfs/:id/versions
async fn list_versions(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<VersionListResponse>> {
    let document = DocumentRepository::new(state.db())
        .get(&id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("PDF {id} not found")))?;

    let versions = VersionRepository::new(state.db())
        .list_for_document(&id)
        .await?;

    Ok(Json(VersionListResponse {
        pdf_id: document.id,
        original_filename: document.original_filename,
        total_versions: versions.len(),
        versions,
    }))
}
