//! Edit application via lopdf
//!
//! Takes the stored original bytes plus a batch of text edits and
//! signature placements, and produces the bytes of a new PDF version.
//! Edits are appended to the page content streams; the original
//! document structure is otherwise untouched.

mod apply;
mod types;

pub use apply::apply_edits;
pub use types::{parse_hex_color, SignaturePlacement, TextEdit};

use thiserror::Error;

/// Errors from edit application
#[derive(Debug, Error)]
pub enum EditError {
    #[error("page {page} out of range (document has {pages} pages)")]
    PageOutOfRange { page: usize, pages: usize },

    #[error("malformed document: {0}")]
    Parse(String),

    #[error("signature image error: {0}")]
    BadImage(String),

    #[error("PDF rewrite error: {0}")]
    Rewrite(#[from] lopdf::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type EditResult<T> = std::result::Result<T, EditError>;
