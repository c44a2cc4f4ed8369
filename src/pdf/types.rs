//! PDF inspection types

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use serde::{Deserialize, Serialize};

/// A positioned text run on a page.
///
/// One block per text line. `bbox` is `[x0, y0, x1, y1]` in PDF points
/// with MuPDF's top-left origin (y grows downward). The same coordinate
/// space is expected back from clients in edit requests.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextBlock {
    pub text: String,
    pub bbox: [f32; 4],
    pub font_size: f32,
}

/// An encoded page raster with pixel dimensions
#[derive(Debug, Clone)]
pub struct PageImage {
    pub png: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

impl PageImage {
    /// Encode as a `data:image/png;base64,...` URL for JSON transport
    pub fn to_data_url(&self) -> String {
        format!("data:image/png;base64,{}", BASE64.encode(&self.png))
    }
}

/// Everything extracted for one page during upload processing
#[derive(Debug, Clone, Serialize)]
pub struct ProcessedPage {
    pub page_num: usize,
    /// Full-resolution page render as a data URL
    pub image: String,
    /// Small render as a data URL
    pub thumbnail: String,
    pub width: u32,
    pub height: u32,
    pub text_blocks: Vec<TextBlock>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_image_data_url() {
        let image = PageImage {
            png: vec![0x89, 0x50, 0x4e, 0x47],
            width: 100,
            height: 200,
        };
        let url = image.to_data_url();
        assert!(url.starts_with("data:image/png;base64,"));
        assert_eq!(url, "data:image/png;base64,iVBORw==");
    }

    #[test]
    fn test_text_block_json_shape() {
        let block = TextBlock {
            text: "Hello".to_string(),
            bbox: [1.0, 2.0, 3.0, 4.0],
            font_size: 11.5,
        };
        let json = serde_json::to_value(&block).unwrap();
        assert_eq!(json["text"], "Hello");
        assert_eq!(json["bbox"][2], 3.0);

        let back: TextBlock = serde_json::from_value(json).unwrap();
        assert_eq!(back, block);
    }
}
