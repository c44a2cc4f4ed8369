//! PDF inspection via MuPDF
//!
//! Parsing, per-page text-block extraction, and page/thumbnail rendering
//! for the upload pipeline. Mutation (applying edits) lives in `crate::edit`.

mod render;
mod safe;
mod text;
mod types;

pub use render::*;
pub use safe::SafePdf;
pub use text::extract_text_blocks;
pub use types::*;

use thiserror::Error;

/// Errors from PDF inspection
#[derive(Debug, Error)]
pub enum PdfError {
    #[error("not a PDF document")]
    NotAPdf,

    #[error("page {page} out of range (document has {pages} pages)")]
    PageOutOfRange { page: usize, pages: usize },

    #[error("MuPDF error: {0}")]
    Mupdf(#[from] mupdf::Error),

    #[error("image encoding error: {0}")]
    Image(String),

    #[error("render task failed: {0}")]
    Join(String),
}

pub type PdfResult<T> = std::result::Result<T, PdfError>;
