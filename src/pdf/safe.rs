//! Thread-safe PDF wrapper for MuPDF
//!
//! MuPDF documents are not thread-safe and cannot be held across await
//! points. This wrapper keeps only the source bytes, opens a fresh
//! document for each operation, and serializes access through a mutex.
//! CPU-bound work is expected to run on `tokio::task::spawn_blocking`.

use std::sync::Arc;

use mupdf::Document;
use parking_lot::Mutex;

use super::{PdfError, PdfResult};

const PDF_MIME: &str = "application/pdf";

/// Serialized-access PDF handle. Cheap to clone.
#[derive(Clone)]
pub struct SafePdf {
    data: Arc<Vec<u8>>,
    page_count: usize,
    lock: Arc<Mutex<()>>,
}

impl SafePdf {
    /// Validate and wrap PDF bytes.
    ///
    /// Fails if the data does not carry a PDF header or MuPDF cannot
    /// open it.
    pub fn from_bytes(data: Vec<u8>) -> PdfResult<Self> {
        if !data.starts_with(b"%PDF-") {
            return Err(PdfError::NotAPdf);
        }

        let doc = Document::from_bytes(&data, PDF_MIME)?;
        let page_count = doc.page_count()? as usize;

        Ok(Self {
            data: Arc::new(data),
            page_count,
            lock: Arc::new(Mutex::new(())),
        })
    }

    pub fn page_count(&self) -> usize {
        self.page_count
    }

    /// Borrow the raw source bytes
    pub fn bytes(&self) -> &[u8] {
        &self.data
    }

    /// Run a closure against a freshly opened document.
    ///
    /// Access is serialized; no document reference escapes the closure.
    pub fn with_doc<F, R>(&self, f: F) -> PdfResult<R>
    where
        F: FnOnce(&Document) -> PdfResult<R>,
    {
        let _guard = self.lock.lock();
        let doc = Document::from_bytes(&self.data, PDF_MIME)?;
        f(&doc)
    }

    /// Bounds-check a 0-indexed page number
    pub fn check_page(&self, page: usize) -> PdfResult<()> {
        if page >= self.page_count {
            return Err(PdfError::PageOutOfRange {
                page,
                pages: self.page_count,
            });
        }
        Ok(())
    }
}
