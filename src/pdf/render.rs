//! Page rendering
//!
//! Renders pages to PNG via MuPDF pixmaps. Full-size renders use 2.0x
//! zoom (what the editing UI draws on); thumbnails use 0.3x.

use std::io::Cursor;

use image::DynamicImage;
use mupdf::{Colorspace, Document, Matrix};

use super::{extract_text_blocks, PageImage, PdfError, PdfResult, SafePdf, TextBlock};

/// Zoom factor for full-page renders
pub const PAGE_ZOOM: f32 = 2.0;
/// Zoom factor for thumbnails
pub const THUMBNAIL_ZOOM: f32 = 0.3;

/// Render one page to PNG at the given zoom (0-indexed page)
pub fn render_page_sync(doc: &Document, page_num: usize, zoom: f32) -> PdfResult<PageImage> {
    let page = doc.load_page(page_num as i32)?;

    let matrix = Matrix::new_scale(zoom, zoom);
    let colorspace = Colorspace::device_rgb();
    let pixmap = page.to_pixmap(&matrix, &colorspace, false, true)?;

    encode_pixmap(&pixmap)
}

/// Render a page off the async runtime
pub async fn render_page(pdf: &SafePdf, page_num: usize, zoom: f32) -> PdfResult<PageImage> {
    pdf.check_page(page_num)?;
    let pdf = pdf.clone();

    tokio::task::spawn_blocking(move || pdf.with_doc(|doc| render_page_sync(doc, page_num, zoom)))
        .await
        .map_err(|e| PdfError::Join(e.to_string()))?
}

/// Extract everything the upload pipeline needs for one page: the
/// full-size render, the thumbnail render, and the text blocks. The
/// document is opened once for all three.
pub async fn process_page(
    pdf: &SafePdf,
    page_num: usize,
) -> PdfResult<(PageImage, PageImage, Vec<TextBlock>)> {
    pdf.check_page(page_num)?;
    let pdf = pdf.clone();

    tokio::task::spawn_blocking(move || {
        pdf.with_doc(|doc| {
            let image = render_page_sync(doc, page_num, PAGE_ZOOM)?;
            let thumbnail = render_page_sync(doc, page_num, THUMBNAIL_ZOOM)?;
            let text_blocks = extract_text_blocks(doc, page_num)?;
            Ok((image, thumbnail, text_blocks))
        })
    })
    .await
    .map_err(|e| PdfError::Join(e.to_string()))?
}

/// Encode a MuPDF pixmap as PNG
fn encode_pixmap(pixmap: &mupdf::Pixmap) -> PdfResult<PageImage> {
    let width = pixmap.width() as u32;
    let height = pixmap.height() as u32;
    let samples = pixmap.samples();
    let n = pixmap.n() as usize;

    // Normalize whatever channel layout MuPDF produced to RGBA
    let mut rgba_buffer = Vec::with_capacity((width * height * 4) as usize);

    for y in 0..height as usize {
        for x in 0..width as usize {
            let offset = (y * width as usize + x) * n;
            let r = samples.get(offset).copied().unwrap_or(0);
            let g = samples.get(offset + 1).copied().unwrap_or(0);
            let b = samples.get(offset + 2).copied().unwrap_or(0);
            let a = if n >= 4 {
                samples.get(offset + 3).copied().unwrap_or(255)
            } else {
                255
            };
            rgba_buffer.extend_from_slice(&[r, g, b, a]);
        }
    }

    let img = image::RgbaImage::from_raw(width, height, rgba_buffer)
        .ok_or_else(|| PdfError::Image("failed to create image buffer".to_string()))?;

    let mut output = Vec::new();
    DynamicImage::ImageRgba8(img)
        .write_to(&mut Cursor::new(&mut output), image::ImageFormat::Png)
        .map_err(|e| PdfError::Image(e.to_string()))?;

    Ok(PageImage {
        png: output,
        width,
        height,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pdf::fixtures;

    #[tokio::test]
    async fn test_render_page_produces_png() {
        let pdf = SafePdf::from_bytes(fixtures::minimal_pdf()).unwrap();

        let image = render_page(&pdf, 0, PAGE_ZOOM).await.unwrap();

        assert!(image.png.starts_with(&[0x89, b'P', b'N', b'G']));
        // US Letter at 2.0x: 612x792 points -> 1224x1584 pixels
        assert_eq!(image.width, 1224);
        assert_eq!(image.height, 1584);
    }

    #[tokio::test]
    async fn test_thumbnail_is_smaller() {
        let pdf = SafePdf::from_bytes(fixtures::minimal_pdf()).unwrap();

        let full = render_page(&pdf, 0, PAGE_ZOOM).await.unwrap();
        let thumb = render_page(&pdf, 0, THUMBNAIL_ZOOM).await.unwrap();

        assert!(thumb.width < full.width);
        assert!(thumb.height < full.height);
    }

    #[tokio::test]
    async fn test_render_out_of_range_page() {
        let pdf = SafePdf::from_bytes(fixtures::minimal_pdf()).unwrap();

        let result = render_page(&pdf, 7, PAGE_ZOOM).await;
        assert!(matches!(
            result,
            Err(PdfError::PageOutOfRange { page: 7, pages: 1 })
        ));
    }

    #[tokio::test]
    async fn test_process_page_bundles_render_and_text() {
        let pdf = SafePdf::from_bytes(fixtures::pdf_with_text("Invoice 42")).unwrap();

        let (image, thumbnail, blocks) = process_page(&pdf, 0).await.unwrap();

        assert!(image.width > thumbnail.width);
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].text, "Invoice 42");
    }
}
