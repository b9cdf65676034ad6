//! Layout model: pages of positioned text blocks plus optional background imagery.
//!
//! Coordinates use a **top-left origin** with `y` growing downward, in the
//! document's own units (PDF points for PDF input, pixels for image input).
//! The renderer converts to PDF's bottom-left origin when it writes pages.
//!
//! A [`Document`] exclusively owns its [`Page`]s, and each page owns its
//! [`TextBlock`]s and [`BackgroundImage`]. The [`EditBuffer`] is the flat,
//! structure-free text the user edits; it holds no reference back to the
//! document until [`crate::pipeline::remap::remap`] re-attaches it.

use crate::error::ReflowError;
use crate::pipeline::encode;
use image::DynamicImage;
use serde::{Deserialize, Serialize};

/// Axis-aligned rectangle occupied by a block of text.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl BoundingBox {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    /// Intersect the box with the page rectangle.
    pub fn clamped_to(&self, page_width: f32, page_height: f32) -> Self {
        let page_width = page_width.max(0.0);
        let page_height = page_height.max(0.0);
        let left = self.x.clamp(0.0, page_width);
        let top = self.y.clamp(0.0, page_height);
        let right = self.right().clamp(left, page_width);
        let bottom = self.bottom().clamp(top, page_height);
        Self::new(left, top, right - left, bottom - top)
    }

    /// The page rectangle shrunk by the given margins on every side.
    ///
    /// Margins larger than half the page collapse the region to zero size
    /// rather than producing a negative box.
    pub fn printable(page_width: f32, page_height: f32, margin_x: f32, margin_y: f32) -> Self {
        let x = margin_x.min(page_width / 2.0).max(0.0);
        let y = margin_y.min(page_height / 2.0).max(0.0);
        Self::new(
            x,
            y,
            (page_width - 2.0 * x).max(0.0),
            (page_height - 2.0 * y).max(0.0),
        )
    }
}

/// One logical unit of text with its position and font.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextBlock {
    pub bbox: BoundingBox,
    /// Block text. May span several lines separated by `\n`.
    pub text: String,
    /// Best-effort font identifier; the configured fallback when unknown.
    pub font_hint: String,
    /// Font size of the first text run, when the source exposed one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_size: Option<f32>,
    /// Number of edit-buffer lines this block consumes on remap.
    pub source_line_count: usize,
}

impl TextBlock {
    /// Create a block; the line count is derived from the text (at least 1).
    pub fn new(bbox: BoundingBox, text: impl Into<String>, font_hint: impl Into<String>) -> Self {
        let text = text.into();
        let source_line_count = text.split('\n').count();
        Self {
            bbox,
            text,
            font_hint: font_hint.into(),
            font_size: None,
            source_line_count,
        }
    }

    pub fn with_font_size(mut self, size: f32) -> Self {
        self.font_size = Some(size);
        self
    }

    /// The block's lines as they appear in the edit buffer.
    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.text.split('\n')
    }

    /// True when the block holds at least one non-whitespace character.
    pub fn has_text(&self) -> bool {
        !self.text.trim().is_empty()
    }
}

/// Encoded raster drawn under a page's text.
///
/// `data` holds any format the `image` crate can decode (PNG for rasterised
/// PDF pages, the original bytes for photo input) and is base64 in JSON.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct BackgroundImage {
    #[serde(with = "base64_bytes")]
    pub data: Vec<u8>,
    pub width_px: u32,
    pub height_px: u32,
}

impl BackgroundImage {
    /// PNG-encode a raster.
    pub fn from_image(image: &DynamicImage) -> Result<Self, image::ImageError> {
        Ok(Self {
            data: encode::encode_png(image)?,
            width_px: image.width(),
            height_px: image.height(),
        })
    }

    /// Keep already-encoded bytes as they are.
    pub fn from_encoded(data: Vec<u8>, width_px: u32, height_px: u32) -> Self {
        Self {
            data,
            width_px,
            height_px,
        }
    }

    pub fn decode(&self) -> Result<DynamicImage, image::ImageError> {
        image::load_from_memory(&self.data)
    }
}

impl std::fmt::Debug for BackgroundImage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackgroundImage")
            .field("bytes", &self.data.len())
            .field("width_px", &self.width_px)
            .field("height_px", &self.height_px)
            .finish()
    }
}

/// A single page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page {
    pub width: f32,
    pub height: f32,
    /// Set exactly when the page came from the scanned path.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background: Option<BackgroundImage>,
    /// Blocks in reading order.
    pub blocks: Vec<TextBlock>,
}

impl Page {
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            width,
            height,
            background: None,
            blocks: Vec::new(),
        }
    }

    pub fn with_background(mut self, background: BackgroundImage) -> Self {
        self.background = Some(background);
        self
    }

    pub fn with_blocks(mut self, blocks: Vec<TextBlock>) -> Self {
        self.blocks = blocks;
        self
    }

    pub fn has_text(&self) -> bool {
        self.blocks.iter().any(TextBlock::has_text)
    }
}

/// Which extraction path produced a document, and so which remap mode applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SourceKind {
    /// At least one page carried an embedded text layer with real text.
    HasTextLayer,
    /// No usable text layer; content came from recognition.
    ScannedImage,
}

/// A document as an ordered list of pages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub source: SourceKind,
    pub pages: Vec<Page>,
}

impl Document {
    pub fn new(source: SourceKind, pages: Vec<Page>) -> Self {
        Self { source, pages }
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    pub fn block_count(&self) -> usize {
        self.pages.iter().map(|p| p.blocks.len()).sum()
    }

    /// All blocks across all pages, in page then reading order.
    pub fn blocks(&self) -> impl Iterator<Item = &TextBlock> {
        self.pages.iter().flat_map(|p| p.blocks.iter())
    }

    /// Flatten every block's text into the buffer shown to the user.
    pub fn edit_buffer(&self) -> EditBuffer {
        EditBuffer::from_lines(
            self.blocks()
                .flat_map(|b| b.lines())
                .map(str::to_string),
        )
    }

    pub fn to_json(&self) -> Result<String, ReflowError> {
        serde_json::to_string_pretty(self).map_err(|e| ReflowError::SerializationFailed {
            detail: format!("layout JSON: {e}"),
        })
    }

    pub fn from_json(json: &str) -> Result<Self, ReflowError> {
        serde_json::from_str(json).map_err(|e| ReflowError::InvalidLayout {
            detail: e.to_string(),
        })
    }
}

/// Flat, ordered list of edited lines with no structural metadata.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditBuffer {
    lines: Vec<String>,
}

impl EditBuffer {
    /// Split text on `\n`, `\r\n` or `\r`. A single trailing newline does
    /// not produce an extra empty line.
    pub fn from_text(text: &str) -> Self {
        let normalised = text.replace("\r\n", "\n").replace('\r', "\n");
        Self::from_lines(normalised.lines().map(str::to_string))
    }

    pub fn from_lines<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            lines: lines.into_iter().map(Into::into).collect(),
        }
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Lines joined with `\n`, as presented for editing.
    pub fn to_text(&self) -> String {
        self.lines.join("\n")
    }
}

mod base64_bytes {
    use base64::{engine::general_purpose::STANDARD, Engine as _};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        STANDARD.decode(encoded).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};

    fn block(text: &str) -> TextBlock {
        TextBlock::new(BoundingBox::new(10.0, 10.0, 100.0, 12.0), text, "Helvetica")
    }

    #[test]
    fn line_count_derived_from_text() {
        assert_eq!(block("one").source_line_count, 1);
        assert_eq!(block("one\ntwo\nthree").source_line_count, 3);
        assert_eq!(block("").source_line_count, 1);
        assert_eq!(block("a\n\nb").source_line_count, 3);
    }

    #[test]
    fn block_lines_match_line_count() {
        for text in ["", "a", "a\n", "a\n\nb"] {
            let b = block(text);
            assert_eq!(b.lines().count(), b.source_line_count, "text {text:?}");
        }
    }

    #[test]
    fn whitespace_block_has_no_text() {
        assert!(!block("  \t ").has_text());
        assert!(block(" x ").has_text());
    }

    #[test]
    fn clamp_pulls_box_inside_page() {
        let b = BoundingBox::new(-5.0, 90.0, 50.0, 20.0).clamped_to(40.0, 100.0);
        assert_eq!(b, BoundingBox::new(0.0, 90.0, 40.0, 10.0));
        assert_eq!((b.right(), b.bottom()), (40.0, 100.0));
    }

    #[test]
    fn printable_region_respects_margins() {
        let b = BoundingBox::printable(600.0, 800.0, 40.0, 40.0);
        assert_eq!(b, BoundingBox::new(40.0, 40.0, 520.0, 720.0));
        let tiny = BoundingBox::printable(30.0, 30.0, 40.0, 40.0);
        assert_eq!(tiny, BoundingBox::new(15.0, 15.0, 0.0, 0.0));
    }

    #[test]
    fn edit_buffer_flattens_block_lines_in_order() {
        let doc = Document::new(
            SourceKind::HasTextLayer,
            vec![
                Page::new(100.0, 100.0).with_blocks(vec![block("a"), block("b\nc")]),
                Page::new(100.0, 100.0).with_blocks(vec![block("d")]),
            ],
        );
        assert_eq!(doc.edit_buffer().lines(), ["a", "b", "c", "d"]);
        assert_eq!(doc.block_count(), 3);
    }

    #[test]
    fn edit_buffer_from_text_normalises_line_endings() {
        let buf = EditBuffer::from_text("x\r\ny\rz\n");
        assert_eq!(buf.lines(), ["x", "y", "z"]);
        assert_eq!(buf.to_text(), "x\ny\nz");
    }

    #[test]
    fn edit_buffer_keeps_interior_blank_lines() {
        let buf = EditBuffer::from_text("a\n\nb");
        assert_eq!(buf.len(), 3);
        assert_eq!(buf.lines()[1], "");
    }

    #[test]
    fn document_json_keeps_background_bytes() {
        let img = DynamicImage::ImageRgba8(RgbaImage::from_pixel(4, 3, Rgba([9, 9, 9, 255])));
        let bg = BackgroundImage::from_image(&img).unwrap();
        let doc = Document::new(
            SourceKind::ScannedImage,
            vec![Page::new(4.0, 3.0).with_background(bg.clone())],
        );
        let json = doc.to_json().unwrap();
        let back = Document::from_json(&json).unwrap();
        assert_eq!(back.pages[0].background.as_ref(), Some(&bg));
        let decoded = back.pages[0].background.as_ref().unwrap().decode().unwrap();
        assert_eq!((decoded.width(), decoded.height()), (4, 3));
    }

    #[test]
    fn invalid_json_is_invalid_layout() {
        let err = Document::from_json("{not json").unwrap_err();
        assert!(matches!(err, ReflowError::InvalidLayout { .. }));
    }
}
