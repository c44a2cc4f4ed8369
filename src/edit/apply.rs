//! Applying edits to PDF bytes
//!
//! Text edits are rendered as content-stream appends: an opaque white
//! rectangle over the original bbox, then the replacement text drawn in
//! Helvetica. Signatures become image XObjects. Incoming coordinates use
//! the top-left origin the extraction reported; they are flipped to the
//! PDF's bottom-left origin against the page MediaBox here.

use std::collections::BTreeMap;
use std::io::Cursor;

use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Dictionary, Document, Object, ObjectId};

use super::{parse_hex_color, EditError, EditResult, SignaturePlacement, TextEdit};

/// Resource name for the Helvetica instance edits draw with
const EDIT_FONT: &str = "FEdit1";

/// Extra points of white around each covered bbox. Glyphs (descenders,
/// accents) routinely render outside the reported line bounds.
const COVER_PADDING: f32 = 2.0;

/// Apply a batch of text edits and signature placements to `pdf_bytes`,
/// returning the rewritten document.
///
/// All page numbers are validated up front. A signature whose image
/// fails to decode is skipped with a warning; it does not abort the
/// batch.
pub fn apply_edits(
    pdf_bytes: &[u8],
    edits: &[TextEdit],
    signatures: &[SignaturePlacement],
) -> EditResult<Vec<u8>> {
    let mut doc = Document::load_mem(pdf_bytes)?;
    // 1-indexed page number -> page object id
    let pages: BTreeMap<u32, ObjectId> = doc.get_pages();
    let page_count = pages.len();

    for page in edits
        .iter()
        .map(|e| e.page)
        .chain(signatures.iter().map(|s| s.page))
    {
        if page >= page_count {
            return Err(EditError::PageOutOfRange {
                page,
                pages: page_count,
            });
        }
    }

    apply_text_edits(&mut doc, &pages, edits)?;
    apply_signatures(&mut doc, &pages, signatures);

    let mut output = Vec::new();
    doc.save_to(&mut output)?;
    Ok(output)
}

fn apply_text_edits(
    doc: &mut Document,
    pages: &BTreeMap<u32, ObjectId>,
    edits: &[TextEdit],
) -> EditResult<()> {
    if edits.is_empty() {
        return Ok(());
    }

    let mut by_page: BTreeMap<usize, Vec<&TextEdit>> = BTreeMap::new();
    for edit in edits {
        by_page.entry(edit.page).or_default().push(edit);
    }

    for (page, page_edits) in by_page {
        let page_id = pages[&(page as u32 + 1)];
        ensure_edit_font(doc, page_id)?;
        let top = page_top(doc, page_id)?;

        let extra = Content {
            operations: text_edit_ops(&page_edits, top),
        }
        .encode()?;

        let mut content = doc.get_page_content(page_id)?;
        content.push(b'\n');
        content.extend_from_slice(&extra);
        doc.change_page_content(page_id, content)?;
    }

    Ok(())
}

/// Content-stream operations for one page's worth of edits, wrapped in
/// q/Q so the inherited graphics state stays untouched.
fn text_edit_ops(edits: &[&TextEdit], top: f32) -> Vec<Operation> {
    let mut ops = vec![Operation::new("q", vec![])];

    for edit in edits {
        let x0 = edit.bbox[0] as f32;
        let y0 = edit.bbox[1] as f32;
        let x1 = edit.bbox[2] as f32;
        let y1 = edit.bbox[3] as f32;
        let size = edit.font_size as f32;

        // White cover over the flipped bbox
        ops.push(Operation::new(
            "rg",
            vec![Object::Real(1.0), Object::Real(1.0), Object::Real(1.0)],
        ));
        ops.push(Operation::new(
            "re",
            vec![
                Object::Real(x0 - COVER_PADDING),
                Object::Real(top - y1 - COVER_PADDING),
                Object::Real((x1 - x0) + 2.0 * COVER_PADDING),
                Object::Real((y1 - y0) + 2.0 * COVER_PADDING),
            ],
        ));
        ops.push(Operation::new("f", vec![]));

        // Replacement text, baseline one font-size below the bbox top
        let (r, g, b) = parse_hex_color(&edit.color);
        ops.push(Operation::new(
            "rg",
            vec![Object::Real(r), Object::Real(g), Object::Real(b)],
        ));
        ops.push(Operation::new("BT", vec![]));
        ops.push(Operation::new(
            "Tf",
            vec![EDIT_FONT.into(), Object::Real(size)],
        ));
        ops.push(Operation::new(
            "Td",
            vec![Object::Real(x0), Object::Real(top - y0 - size)],
        ));
        ops.push(Operation::new(
            "Tj",
            vec![Object::string_literal(edit.new_text.as_str())],
        ));
        ops.push(Operation::new("ET", vec![]));
    }

    ops.push(Operation::new("Q", vec![]));
    ops
}

fn apply_signatures(
    doc: &mut Document,
    pages: &BTreeMap<u32, ObjectId>,
    signatures: &[SignaturePlacement],
) {
    for (idx, sig) in signatures.iter().enumerate() {
        if let Err(e) = apply_signature(doc, pages, sig) {
            tracing::warn!(signature = idx + 1, error = %e, "skipping signature");
        }
    }
}

fn apply_signature(
    doc: &mut Document,
    pages: &BTreeMap<u32, ObjectId>,
    sig: &SignaturePlacement,
) -> EditResult<()> {
    let page_id = pages[&(sig.page as u32 + 1)];
    let top = page_top(doc, page_id)?;

    let raw = decode_signature_image(&sig.image)?;
    let flattened = flatten_onto_white(&raw)?;
    let xobject =
        lopdf::xobject::image_from(flattened).map_err(|e| EditError::BadImage(e.to_string()))?;

    // Flip the placement rectangle; insert_image positions by the
    // bottom-left corner.
    let x = sig.x as f32;
    let y = top - (sig.y + sig.height) as f32;
    doc.insert_image(
        page_id,
        xobject,
        (x, y),
        (sig.width as f32, sig.height as f32),
    )?;

    Ok(())
}

/// Strip an optional `data:image/...;base64,` prefix and decode
fn decode_signature_image(data_url: &str) -> EditResult<Vec<u8>> {
    use base64::{engine::general_purpose::STANDARD as BASE64, Engine};

    let encoded = match data_url.split_once(',') {
        Some((_, rest)) => rest,
        None => data_url,
    };
    BASE64
        .decode(encoded.trim())
        .map_err(|e| EditError::BadImage(e.to_string()))
}

/// Composite any alpha channel onto a white background and re-encode as
/// PNG, so transparent signature strokes stay legible on the page.
fn flatten_onto_white(data: &[u8]) -> EditResult<Vec<u8>> {
    let img = image::load_from_memory(data).map_err(|e| EditError::BadImage(e.to_string()))?;
    let rgba = img.to_rgba8();
    let (width, height) = rgba.dimensions();

    let mut rgb = image::RgbImage::new(width, height);
    for (x, y, pixel) in rgba.enumerate_pixels() {
        let alpha = pixel[3] as u32;
        let out = rgb.get_pixel_mut(x, y);
        for c in 0..3 {
            out[c] = ((pixel[c] as u32 * alpha + 255 * (255 - alpha)) / 255) as u8;
        }
    }

    let mut buf = Vec::new();
    image::DynamicImage::ImageRgb8(rgb)
        .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .map_err(|e| EditError::BadImage(e.to_string()))?;
    Ok(buf)
}

/// Register a Helvetica font under [`EDIT_FONT`] in the page resources.
///
/// Resources and the Font table may each live inline on the page or
/// behind an indirect reference; all four combinations occur in the
/// wild.
fn ensure_edit_font(doc: &mut Document, page_id: ObjectId) -> EditResult<()> {
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    });

    let resources_id = {
        let page = doc.get_dictionary(page_id)?;
        match page.get(b"Resources") {
            Ok(Object::Reference(id)) => Some(*id),
            _ => None,
        }
    };

    if resources_id.is_none() {
        let page = doc
            .get_object_mut(page_id)
            .and_then(Object::as_dict_mut)?;
        if !matches!(page.get(b"Resources"), Ok(Object::Dictionary(_))) {
            page.set("Resources", Dictionary::new());
        }
    }

    // The Font table itself may be indirect.
    let fonts_id = {
        let resources = resolve_resources(doc, page_id, resources_id)?;
        match resources.get(b"Font") {
            Ok(Object::Reference(id)) => Some(*id),
            _ => None,
        }
    };

    if let Some(fonts_id) = fonts_id {
        let fonts = doc.get_object_mut(fonts_id).and_then(Object::as_dict_mut)?;
        fonts.set(EDIT_FONT, Object::Reference(font_id));
        return Ok(());
    }

    let resources = match resources_id {
        Some(id) => doc.get_object_mut(id).and_then(Object::as_dict_mut)?,
        None => {
            let page = doc
                .get_object_mut(page_id)
                .and_then(Object::as_dict_mut)?;
            page.get_mut(b"Resources").and_then(Object::as_dict_mut)?
        }
    };

    if !matches!(resources.get(b"Font"), Ok(Object::Dictionary(_))) {
        resources.set("Font", Dictionary::new());
    }
    if let Ok(Object::Dictionary(fonts)) = resources.get_mut(b"Font") {
        fonts.set(EDIT_FONT, Object::Reference(font_id));
    }

    Ok(())
}

fn resolve_resources<'a>(
    doc: &'a Document,
    page_id: ObjectId,
    resources_id: Option<ObjectId>,
) -> EditResult<&'a Dictionary> {
    match resources_id {
        Some(id) => Ok(doc.get_dictionary(id)?),
        None => match doc.get_dictionary(page_id)?.get(b"Resources")? {
            Object::Dictionary(dict) => Ok(dict),
            _ => Err(EditError::Parse(
                "page Resources is not a dictionary".to_string(),
            )),
        },
    }
}

/// Top edge (y1) of the page MediaBox, walking the Parent chain for
/// inherited boxes.
fn page_top(doc: &Document, page_id: ObjectId) -> EditResult<f32> {
    let mut current = page_id;
    loop {
        let dict = doc.get_dictionary(current)?;

        if let Ok(media_box) = dict.get(b"MediaBox") {
            let rect = match media_box {
                Object::Array(arr) => arr,
                Object::Reference(id) => doc.get_object(*id)?.as_array()?,
                _ => {
                    return Err(EditError::Parse(
                        "MediaBox is not an array".to_string(),
                    ))
                }
            };
            if rect.len() == 4 {
                return Ok(object_as_f32(&rect[3]));
            }
            return Err(EditError::Parse("MediaBox has wrong arity".to_string()));
        }

        match dict.get(b"Parent") {
            Ok(Object::Reference(id)) => current = *id,
            _ => return Err(EditError::Parse("page has no MediaBox".to_string())),
        }
    }
}

fn object_as_f32(obj: &Object) -> f32 {
    match obj {
        Object::Real(v) => *v,
        Object::Integer(v) => *v as f32,
        _ => 0.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pdf::fixtures;
    use crate::pdf::{extract_text_blocks, SafePdf};

    fn one_pixel_png_data_url() -> String {
        use base64::{engine::general_purpose::STANDARD as BASE64, Engine};

        let mut png = Vec::new();
        image::DynamicImage::ImageRgba8(image::RgbaImage::from_pixel(
            2,
            2,
            image::Rgba([0, 0, 0, 128]),
        ))
        .write_to(&mut Cursor::new(&mut png), image::ImageFormat::Png)
        .unwrap();

        format!("data:image/png;base64,{}", BASE64.encode(&png))
    }

    fn sample_edit() -> TextEdit {
        TextEdit {
            page: 0,
            bbox: [72.0, 70.0, 180.0, 84.0],
            old_text: "Hello World".to_string(),
            new_text: "Goodbye".to_string(),
            font_size: 12.0,
            color: "#000000".to_string(),
        }
    }

    #[test]
    fn test_no_edits_still_produces_valid_pdf() {
        let pdf = fixtures::minimal_pdf();
        let result = apply_edits(&pdf, &[], &[]).unwrap();
        assert!(result.starts_with(b"%PDF-"));
        assert_eq!(Document::load_mem(&result).unwrap().get_pages().len(), 1);
    }

    #[test]
    fn test_text_edit_appends_to_content_stream() {
        let pdf = fixtures::pdf_with_text("Hello World");
        let result = apply_edits(&pdf, &[sample_edit()], &[]).unwrap();

        let doc = Document::load_mem(&result).unwrap();
        let pages: BTreeMap<u32, ObjectId> = doc.get_pages();
        let content = doc.get_page_content(pages[&1]).unwrap();
        let text = String::from_utf8_lossy(&content);

        assert!(text.contains(EDIT_FONT));
        assert!(text.contains("Goodbye"));
        // Original stream is preserved ahead of the appended ops
        assert!(text.contains("Hello World"));
    }

    #[test]
    fn test_edited_text_is_extractable() {
        let pdf = fixtures::pdf_with_text("Hello World");
        let result = apply_edits(&pdf, &[sample_edit()], &[]).unwrap();

        let reopened = SafePdf::from_bytes(result).unwrap();
        let blocks = reopened
            .with_doc(|doc| extract_text_blocks(doc, 0))
            .unwrap();

        assert!(blocks.iter().any(|b| b.text.contains("Goodbye")));
    }

    #[test]
    fn test_page_out_of_range_is_rejected() {
        let pdf = fixtures::minimal_pdf();
        let mut edit = sample_edit();
        edit.page = 3;

        let result = apply_edits(&pdf, &[edit], &[]);
        assert!(matches!(
            result,
            Err(EditError::PageOutOfRange { page: 3, pages: 1 })
        ));
    }

    #[test]
    fn test_signature_is_embedded_as_image() {
        let pdf = fixtures::minimal_pdf();
        let sig = SignaturePlacement {
            page: 0,
            x: 100.0,
            y: 650.0,
            width: 120.0,
            height: 40.0,
            image: one_pixel_png_data_url(),
        };

        let result = apply_edits(&pdf, &[], &[sig]).unwrap();
        let doc = Document::load_mem(&result).unwrap();
        assert_eq!(doc.get_pages().len(), 1);

        // An image XObject must have been added somewhere
        let has_image = doc.objects.values().any(|obj| {
            obj.as_stream()
                .ok()
                .and_then(|s| s.dict.get(b"Subtype").ok())
                .map(|s| matches!(s, Object::Name(n) if n == b"Image"))
                .unwrap_or(false)
        });
        assert!(has_image);
    }

    #[test]
    fn test_undecodable_signature_is_skipped() {
        let pdf = fixtures::minimal_pdf();
        let sig = SignaturePlacement {
            page: 0,
            x: 100.0,
            y: 650.0,
            width: 120.0,
            height: 40.0,
            image: "data:image/png;base64,!!!not-base64!!!".to_string(),
        };

        // The batch still succeeds and yields a loadable document
        let result = apply_edits(&pdf, &[], &[sig]).unwrap();
        assert_eq!(Document::load_mem(&result).unwrap().get_pages().len(), 1);
    }

    #[test]
    fn test_flatten_composites_alpha_onto_white() {
        let mut png = Vec::new();
        image::DynamicImage::ImageRgba8(image::RgbaImage::from_pixel(
            1,
            1,
            image::Rgba([0, 0, 0, 0]),
        ))
        .write_to(&mut Cursor::new(&mut png), image::ImageFormat::Png)
        .unwrap();

        let flat = flatten_onto_white(&png).unwrap();
        let img = image::load_from_memory(&flat).unwrap().to_rgb8();
        // Fully transparent black becomes white
        assert_eq!(img.get_pixel(0, 0), &image::Rgb([255, 255, 255]));
    }
}
