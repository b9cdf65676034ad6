//! Text extraction: per-page blocks from an embedded text layer, or one
//! recognised block per page from a raster.
//!
//! Extraction never fails a page outright. A page that cannot be read keeps
//! its size, gets an empty block list and carries a [`PageError`]; the
//! remaining pages are still processed.
//!
//! Coordinates are converted here from PDF's bottom-left origin to the
//! top-left origin used by [`crate::model`].

use crate::config::ReflowConfig;
use crate::error::PageError;
use crate::model::{BackgroundImage, BoundingBox, TextBlock};
use crate::pipeline::fonts::normalize_font_name;
use crate::pipeline::{postprocess, rasterize};
use crate::pipeline::recognize::TextRecognizer;
use image::{DynamicImage, GenericImageView};
use pdfium_render::prelude::*;
use tracing::{debug, warn};

/// What extraction produced for one page.
#[derive(Debug, Clone)]
pub struct PageExtraction {
    /// 1-indexed.
    pub page_num: usize,
    pub width: f32,
    pub height: f32,
    pub blocks: Vec<TextBlock>,
    /// Raster of the page, set on the recognition path only.
    pub background: Option<BackgroundImage>,
    pub error: Option<PageError>,
}

impl PageExtraction {
    fn empty(page_num: usize, width: f32, height: f32) -> Self {
        Self {
            page_num,
            width,
            height,
            blocks: Vec::new(),
            background: None,
            error: None,
        }
    }

    fn failed(mut self, error: PageError) -> Self {
        warn!("{}", error);
        self.error = Some(error);
        self
    }
}

// ── Embedded text layer ──────────────────────────────────────────────────

/// Read every page's text segments in native order.
pub fn extract_embedded(document: &PdfDocument, config: &ReflowConfig) -> Vec<PageExtraction> {
    let pages = document.pages();
    let total = pages.len() as usize;
    let mut results = Vec::with_capacity(total);

    for (index, page) in pages.iter().enumerate() {
        let page_num = index + 1;
        notify_start(config, page_num, total);

        let width = page.width().value;
        let height = page.height().value;
        let result = match page_text_blocks(&page, config) {
            Ok(blocks) => PageExtraction {
                blocks,
                ..PageExtraction::empty(page_num, width, height)
            },
            Err(e) => PageExtraction::empty(page_num, width, height).failed(
                PageError::ExtractionFailed {
                    page: page_num,
                    detail: e.to_string(),
                },
            ),
        };

        notify_done(config, &result, total);
        results.push(result);
    }

    results
}

fn page_text_blocks(page: &PdfPage, config: &ReflowConfig) -> Result<Vec<TextBlock>, PdfiumError> {
    let page_width = page.width().value;
    let page_height = page.height().value;
    let text = page.text()?;
    let mut blocks = Vec::new();

    for segment in text.segments().iter() {
        let content = segment_text(&segment.text());
        if content.trim().is_empty() {
            continue;
        }

        let bounds = segment.bounds();
        let bbox = BoundingBox::new(
            bounds.left().value,
            page_height - bounds.top().value,
            bounds.right().value - bounds.left().value,
            bounds.top().value - bounds.bottom().value,
        )
        .clamped_to(page_width, page_height);

        let (font_hint, font_size) = probe_font(&segment, &config.fallback_font);
        let mut block = TextBlock::new(bbox, content, font_hint);
        if let Some(size) = font_size {
            block = block.with_font_size(size);
        }
        blocks.push(block);
    }

    debug!("Extracted {} text blocks", blocks.len());
    Ok(blocks)
}

/// Segment text with line endings normalised and trailing whitespace removed.
fn segment_text(raw: &str) -> String {
    raw.replace("\r\n", "\n")
        .replace('\r', "\n")
        .trim_end()
        .to_string()
}

/// Font of the first character in the segment that names one.
fn probe_font(segment: &PdfPageTextSegment, fallback: &str) -> (String, Option<f32>) {
    let chars = match segment.chars() {
        Ok(chars) => chars,
        Err(_) => return (fallback.to_string(), None),
    };

    for ch in chars.iter() {
        let name = normalize_font_name(&ch.font_name());
        if !name.is_empty() {
            let size = ch.scaled_font_size().value;
            return (name, (size > 0.0).then_some(size));
        }
    }
    (fallback.to_string(), None)
}

// ── Recognition path ─────────────────────────────────────────────────────

/// One block holding every recognised line, covering the printable region.
///
/// `None` when nothing was recognised.
pub fn ocr_block(
    lines: Vec<String>,
    page_width: f32,
    page_height: f32,
    config: &ReflowConfig,
) -> Option<TextBlock> {
    if lines.is_empty() {
        return None;
    }
    let bbox = BoundingBox::printable(
        page_width,
        page_height,
        config.left_margin,
        config.top_margin,
    );
    Some(TextBlock::new(bbox, lines.join("\n"), config.fallback_font.clone()))
}

/// Rasterise and recognise every page of a PDF without a usable text layer.
pub fn extract_scanned_pdf(
    document: &PdfDocument,
    recognizer: &dyn TextRecognizer,
    config: &ReflowConfig,
) -> Vec<PageExtraction> {
    let pages = document.pages();
    let total = pages.len() as usize;
    let mut results = Vec::with_capacity(total);

    for (index, page) in pages.iter().enumerate() {
        let page_num = index + 1;
        notify_start(config, page_num, total);

        let width = page.width().value;
        let height = page.height().value;
        let empty = PageExtraction::empty(page_num, width, height);

        let result = match rasterize::rasterize_page(&page, config) {
            Ok(raster) => match BackgroundImage::from_image(&raster) {
                Ok(background) => recognise_raster(empty, &raster, background, recognizer, config),
                Err(e) => empty.failed(PageError::RasterisationFailed {
                    page: page_num,
                    detail: format!("PNG encoding failed: {e}"),
                }),
            },
            Err(e) => empty.failed(PageError::RasterisationFailed {
                page: page_num,
                detail: e.to_string(),
            }),
        };

        notify_done(config, &result, total);
        results.push(result);
    }

    results
}

/// Treat a standalone image as a one-page scanned document.
///
/// The page is sized in pixels and the original encoded bytes become the
/// background, so the output keeps the source image untouched. Undecodable
/// bytes give a zero-sized page with no blocks.
pub fn extract_image(
    bytes: &[u8],
    recognizer: &dyn TextRecognizer,
    config: &ReflowConfig,
) -> Vec<PageExtraction> {
    notify_start(config, 1, 1);

    let result = match image::load_from_memory(bytes) {
        Ok(raster) => {
            let (w, h) = raster.dimensions();
            let background = BackgroundImage::from_encoded(bytes.to_vec(), w, h);
            let empty = PageExtraction::empty(1, w as f32, h as f32);
            recognise_raster(empty, &raster, background, recognizer, config)
        }
        Err(e) => PageExtraction::empty(1, 0.0, 0.0).failed(PageError::ExtractionFailed {
            page: 1,
            detail: format!("image decoding failed: {e}"),
        }),
    };

    notify_done(config, &result, 1);
    vec![result]
}

fn recognise_raster(
    mut page: PageExtraction,
    raster: &DynamicImage,
    background: BackgroundImage,
    recognizer: &dyn TextRecognizer,
    config: &ReflowConfig,
) -> PageExtraction {
    page.background = Some(background);
    match recognizer.recognize(raster) {
        Ok(fragments) => {
            let lines = postprocess::clean_fragments(fragments);
            debug!("Page {}: recognised {} lines", page.page_num, lines.len());
            page.blocks = ocr_block(lines, page.width, page.height, config)
                .into_iter()
                .collect();
            page
        }
        Err(e) => {
            let page_num = page.page_num;
            page.failed(PageError::RecognitionFailed {
                page: page_num,
                detail: e.to_string(),
            })
        }
    }
}

// ── Progress ─────────────────────────────────────────────────────────────

fn notify_start(config: &ReflowConfig, page_num: usize, total: usize) {
    if let Some(ref cb) = config.progress_callback {
        cb.on_page_start(page_num, total);
    }
}

fn notify_done(config: &ReflowConfig, result: &PageExtraction, total: usize) {
    if let Some(ref cb) = config.progress_callback {
        match &result.error {
            None => cb.on_page_complete(result.page_num, total, result.blocks.len()),
            Some(e) => cb.on_page_error(result.page_num, total, &e.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RecognitionError;
    use image::{Rgb, RgbImage};
    use std::io::Cursor;

    fn png(width: u32, height: u32) -> Vec<u8> {
        let img =
            DynamicImage::ImageRgb8(RgbImage::from_pixel(width, height, Rgb([250, 250, 250])));
        let mut buf = Vec::new();
        img.write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
            .unwrap();
        buf
    }

    fn lines(text: &[&str]) -> Vec<String> {
        text.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn segment_text_normalises_endings() {
        assert_eq!(segment_text("Hello\r\nWorld \r\n"), "Hello\nWorld");
    }

    #[test]
    fn ocr_block_covers_printable_region() {
        let config = ReflowConfig::default();
        let block = ocr_block(lines(&["Invoice", "Total: 42"]), 600.0, 800.0, &config).unwrap();
        assert_eq!(block.text, "Invoice\nTotal: 42");
        assert_eq!(block.source_line_count, 2);
        assert_eq!(block.font_hint, "Helvetica");
        assert_eq!(block.bbox, BoundingBox::new(40.0, 40.0, 520.0, 720.0));
    }

    #[test]
    fn ocr_block_is_none_without_lines() {
        assert!(ocr_block(Vec::new(), 600.0, 800.0, &ReflowConfig::default()).is_none());
    }

    #[test]
    fn image_becomes_one_scanned_page() {
        let bytes = png(320, 240);
        let recognizer = |_: &DynamicImage| -> Result<Vec<String>, RecognitionError> {
            Ok(lines(&["first", "second"]))
        };
        let pages = extract_image(&bytes, &recognizer, &ReflowConfig::default());

        assert_eq!(pages.len(), 1);
        let page = &pages[0];
        assert_eq!((page.width, page.height), (320.0, 240.0));
        assert_eq!(page.blocks.len(), 1);
        assert_eq!(page.blocks[0].text, "first\nsecond");
        let bg = page.background.as_ref().unwrap();
        assert_eq!(bg.data, bytes);
        assert_eq!((bg.width_px, bg.height_px), (320, 240));
    }

    #[test]
    fn recognition_failure_keeps_empty_page() {
        let recognizer = |_: &DynamicImage| -> Result<Vec<String>, RecognitionError> {
            Err(RecognitionError::Unavailable("no key".into()))
        };
        let pages = extract_image(&png(50, 50), &recognizer, &ReflowConfig::default());
        assert_eq!(pages.len(), 1);
        assert!(pages[0].blocks.is_empty());
        assert!(matches!(
            pages[0].error,
            Some(PageError::RecognitionFailed { page: 1, .. })
        ));
    }

    #[test]
    fn recognised_fragments_are_cleaned() {
        let recognizer = |_: &DynamicImage| -> Result<Vec<String>, RecognitionError> {
            Ok(lines(&["  Title ", "", "a\r\nb", "\u{200B}"]))
        };
        let pages = extract_image(&png(50, 50), &recognizer, &ReflowConfig::default());
        assert_eq!(pages[0].blocks[0].text, "Title\na\nb");
        assert_eq!(pages[0].blocks[0].source_line_count, 3);
    }

    #[test]
    fn undecodable_image_is_an_empty_failed_page() {
        let recognizer =
            |_: &DynamicImage| -> Result<Vec<String>, RecognitionError> { Ok(lines(&["x"])) };
        let garbage = b"\x89PNG\r\n\x1a\ngarbage";
        let pages = extract_image(garbage, &recognizer, &ReflowConfig::default());
        assert_eq!(pages.len(), 1);
        assert!(pages[0].blocks.is_empty());
        assert!(pages[0].background.is_none());
        assert!(matches!(
            pages[0].error,
            Some(PageError::ExtractionFailed { page: 1, .. })
        ));
    }
}
