//! Edit request payloads
//!
//! Field names match what the editing frontend sends. Coordinates are in
//! PDF points with a top-left origin, the same space the extraction
//! endpoint reports text blocks in. Pages are 0-indexed.

use serde::{Deserialize, Serialize};

/// One text-block replacement: cover the original bbox with white, then
/// draw the new text at the bbox origin.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextEdit {
    pub page: usize,
    /// `[x0, y0, x1, y1]` of the text being replaced
    pub bbox: [f64; 4],
    pub old_text: String,
    pub new_text: String,
    #[serde(rename = "fontSize")]
    pub font_size: f64,
    #[serde(default = "default_color")]
    pub color: String,
}

fn default_color() -> String {
    "#000000".to_string()
}

/// A signature image dropped onto a page
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignaturePlacement {
    pub page: usize,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    /// Base64 image, with or without a `data:image/...;base64,` prefix
    pub image: String,
}

/// Parse a hex color like "#FF0000" or "FF0000" into RGB floats (0-1).
/// Anything unparseable falls back to black.
pub fn parse_hex_color(color: &str) -> (f32, f32, f32) {
    let hex = color.trim_start_matches('#');
    // str::get refuses non-boundary slices, so multi-byte input cannot panic
    match (hex.get(0..2), hex.get(2..4), hex.get(4..6)) {
        (Some(r), Some(g), Some(b)) => (
            u8::from_str_radix(r, 16).unwrap_or(0) as f32 / 255.0,
            u8::from_str_radix(g, 16).unwrap_or(0) as f32 / 255.0,
            u8::from_str_radix(b, 16).unwrap_or(0) as f32 / 255.0,
        ),
        _ => (0.0, 0.0, 0.0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_hex_color() {
        assert_eq!(parse_hex_color("#FF0000"), (1.0, 0.0, 0.0));
        assert_eq!(parse_hex_color("00FF00"), (0.0, 1.0, 0.0));
        assert_eq!(parse_hex_color("#000000"), (0.0, 0.0, 0.0));
        // Garbage falls back to black
        assert_eq!(parse_hex_color("red"), (0.0, 0.0, 0.0));
        assert_eq!(parse_hex_color("#zzzzzz"), (0.0, 0.0, 0.0));
    }

    #[test]
    fn test_parse_hex_color_multibyte_input() {
        // Multi-byte characters land mid-slice; must fall back, not panic
        assert_eq!(parse_hex_color("€€"), (0.0, 0.0, 0.0));
        assert_eq!(parse_hex_color("#€€"), (0.0, 0.0, 0.0));
        assert_eq!(parse_hex_color("é0000é"), (0.0, 0.0, 0.0));
    }

    #[test]
    fn test_text_edit_accepts_camel_case_font_size() {
        let edit: TextEdit = serde_json::from_str(
            r#"{
                "page": 0,
                "bbox": [10.0, 20.0, 110.0, 35.0],
                "old_text": "Old",
                "new_text": "New",
                "fontSize": 14
            }"#,
        )
        .unwrap();

        assert_eq!(edit.page, 0);
        assert_eq!(edit.font_size, 14.0);
        assert_eq!(edit.color, "#000000");
    }

    #[test]
    fn test_signature_placement_json() {
        let sig: SignaturePlacement = serde_json::from_str(
            r#"{
                "page": 1,
                "x": 100.0,
                "y": 650.0,
                "width": 150.0,
                "height": 50.0,
                "image": "data:image/png;base64,aGVsbG8="
            }"#,
        )
        .unwrap();

        assert_eq!(sig.page, 1);
        assert_eq!(sig.width, 150.0);
        assert!(sig.image.starts_with("data:image/png"));
    }
}
