//! Text-block extraction
//!
//! Produces one `TextBlock` per text line with its bounding box and font
//! size, in MuPDF's top-left-origin point space. The mupdf 0.5 TextChar
//! API does not expose font names or style flags, so blocks carry only
//! the geometry and size.

use mupdf::{Document, TextPageOptions};

use super::{PdfResult, TextBlock};

/// Extract positioned text blocks from one page (0-indexed)
pub fn extract_text_blocks(doc: &Document, page_num: usize) -> PdfResult<Vec<TextBlock>> {
    let page = doc.load_page(page_num as i32)?;
    let text_page = page.to_text_page(TextPageOptions::empty())?;

    let mut blocks = Vec::new();

    for block in text_page.blocks() {
        for line in block.lines() {
            let bounds = line.bounds();

            let mut text = String::new();
            let mut font_size = 0.0f32;

            for ch in line.chars() {
                if let Some(c) = ch.char() {
                    if font_size == 0.0 {
                        font_size = ch.size();
                    }
                    text.push(c);
                }
            }

            if text.trim().is_empty() {
                continue;
            }

            blocks.push(TextBlock {
                text,
                bbox: [bounds.x0, bounds.y0, bounds.x1, bounds.y1],
                font_size,
            });
        }
    }

    Ok(blocks)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pdf::{fixtures, SafePdf};

    #[test]
    fn test_extracts_line_with_position() {
        let pdf = SafePdf::from_bytes(fixtures::pdf_with_text("Quarterly Report")).unwrap();

        let blocks = pdf
            .with_doc(|doc| extract_text_blocks(doc, 0))
            .unwrap();

        assert_eq!(blocks.len(), 1);
        let block = &blocks[0];
        assert_eq!(block.text, "Quarterly Report");
        assert!(block.font_size > 0.0);
        // The fixture places text at x=72; the bbox must sit near it
        // and be non-degenerate.
        assert!((block.bbox[0] - 72.0).abs() < 2.0);
        assert!(block.bbox[2] > block.bbox[0]);
        assert!(block.bbox[3] > block.bbox[1]);
    }

    #[test]
    fn test_blank_page_yields_no_blocks() {
        let pdf = SafePdf::from_bytes(fixtures::pdf_with_text(" ")).unwrap();

        let blocks = pdf
            .with_doc(|doc| extract_text_blocks(doc, 0))
            .unwrap();

        assert!(blocks.is_empty());
    }
}
