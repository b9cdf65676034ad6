//! Entry points: extract a document into an editable layout, and render a
//! (possibly edited) layout back to PDF.
//!
//! The core functions are synchronous and free of ambient state:
//!
//! * [`extract`]       — bytes → [`Extraction`] (layout + edit buffer)
//! * [`render`]        — layout + edited buffer → PDF bytes
//! * [`render_layout`] — layout → PDF bytes, without remapping
//! * [`reflow`]        — bytes + optional edited text → PDF bytes
//!
//! [`extract_input`] and [`render_to_file`] are async wrappers for callers
//! running on Tokio. pdfium is not async-safe, so they move the work onto
//! `spawn_blocking` threads.

use crate::config::ReflowConfig;
use crate::error::ReflowError;
use crate::model::{Document, EditBuffer, SourceKind};
use crate::output::Extraction;
use crate::pipeline::extract::PageExtraction;
use crate::pipeline::input::{self, InputKind};
use crate::pipeline::recognize::{TextRecognizer, VisionRecognizer};
use crate::pipeline::{classify, engine, extract as extractor, layout, remap, render as writer};
use std::path::Path;
use std::time::Instant;
use tokio::runtime::Handle;
use tracing::info;

/// Extract a PDF or image into an editable layout.
///
/// PDFs are read through their text layer first; when no page carries real
/// text the whole document is rasterised and passed to `recognizer`.
/// Images always go through `recognizer` and do not need pdfium.
///
/// # Errors
/// Fatal errors only: an unreadable or encrypted PDF, a missing pdfium
/// library, [`ReflowError::EmptyDocument`] when nothing was found, or
/// [`ReflowError::AllPagesFailed`] when every page failed.
/// Pages that fail individually are listed in [`Extraction::page_errors`].
pub fn extract(
    bytes: &[u8],
    kind: InputKind,
    recognizer: &dyn TextRecognizer,
    config: &ReflowConfig,
) -> Result<Extraction, ReflowError> {
    let start = Instant::now();

    let (source, pages) = match kind {
        InputKind::Image => {
            notify_start(config, 1);
            let pages = extractor::extract_image(bytes, recognizer, config);
            (SourceKind::ScannedImage, pages)
        }
        InputKind::Pdf => {
            let pdfium = engine::bind_pdfium(config)?;
            let document = engine::open_pdf(&pdfium, bytes, config.password.as_deref())?;
            let total = document.pages().len() as usize;
            info!("PDF has {} pages", total);
            notify_start(config, total);

            let embedded = extractor::extract_embedded(&document, config);
            match classify::classify(&embedded) {
                SourceKind::HasTextLayer => (SourceKind::HasTextLayer, embedded),
                SourceKind::ScannedImage => {
                    info!("No usable text layer; recognising {} page(s)", total);
                    let scanned = extractor::extract_scanned_pdf(&document, recognizer, config);
                    (SourceKind::ScannedImage, scanned)
                }
            }
        }
    };

    notify_complete(config, &pages);
    let extraction = layout::build_document(source, pages)?;
    info!("Extraction complete in {}ms", start.elapsed().as_millis());
    Ok(extraction)
}

/// Remap `edited` onto `document` and render the result.
pub fn render(
    document: &Document,
    edited: &EditBuffer,
    config: &ReflowConfig,
) -> Result<Vec<u8>, ReflowError> {
    let remapped = remap::remap(document, edited, config);
    render_layout(&remapped, config)
}

/// Render a layout exactly as given.
pub fn render_layout(layout: &Document, config: &ReflowConfig) -> Result<Vec<u8>, ReflowError> {
    if layout.page_count() == 0 {
        return Err(ReflowError::EmptyDocument { pages: 0 });
    }
    let pdfium = engine::bind_pdfium(config)?;
    writer::render_document(&pdfium, layout, config)
}

/// Extract, apply `edited_text` (or the unedited text when `None`), render.
pub fn reflow(
    bytes: &[u8],
    kind: InputKind,
    edited_text: Option<&str>,
    recognizer: &dyn TextRecognizer,
    config: &ReflowConfig,
) -> Result<Vec<u8>, ReflowError> {
    let extraction = extract(bytes, kind, recognizer, config)?;
    let edited = match edited_text {
        Some(text) => EditBuffer::from_text(text),
        None => extraction.edit_buffer,
    };
    render(&extraction.document, &edited, config)
}

/// Resolve a path or URL and extract it, recognising with a vision model.
///
/// The provider is only resolved when a page actually needs recognition.
pub async fn extract_input(
    input_str: impl AsRef<str>,
    declared_kind: Option<InputKind>,
    config: &ReflowConfig,
) -> Result<Extraction, ReflowError> {
    let input_str = input_str.as_ref();
    info!("Starting extraction: {}", input_str);

    let doc = input::resolve_input(input_str, declared_kind, config.download_timeout_secs).await?;
    let config = config.clone();
    let handle = Handle::current();

    tokio::task::spawn_blocking(move || {
        let recognizer = VisionRecognizer::new(handle, config.clone());
        extract(&doc.bytes, doc.kind, &recognizer, &config)
    })
    .await
    .map_err(|e| ReflowError::Internal(format!("Extraction task panicked: {}", e)))?
}

/// Render `edited` onto `document` and write the PDF to `output_path`.
///
/// Uses atomic write (temp file + rename) to prevent partial files.
/// Returns the number of bytes written.
pub async fn render_to_file(
    document: &Document,
    edited: &EditBuffer,
    output_path: impl AsRef<Path>,
    config: &ReflowConfig,
) -> Result<usize, ReflowError> {
    let path = output_path.as_ref();
    let document = document.clone();
    let edited = edited.clone();
    let config = config.clone();

    let bytes = tokio::task::spawn_blocking(move || render(&document, &edited, &config))
        .await
        .map_err(|e| ReflowError::Internal(format!("Render task panicked: {}", e)))??;

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| ReflowError::OutputWriteFailed {
                    path: path.to_path_buf(),
                    source: e,
                })?;
        }
    }

    let tmp_path = path.with_extension("pdf.tmp");
    tokio::fs::write(&tmp_path, &bytes)
        .await
        .map_err(|e| ReflowError::OutputWriteFailed {
            path: path.to_path_buf(),
            source: e,
        })?;

    tokio::fs::rename(&tmp_path, path)
        .await
        .map_err(|e| ReflowError::OutputWriteFailed {
            path: path.to_path_buf(),
            source: e,
        })?;

    info!("Wrote {} bytes to {}", bytes.len(), path.display());
    Ok(bytes.len())
}

// ── Internal helpers ─────────────────────────────────────────────────────

fn notify_start(config: &ReflowConfig, total_pages: usize) {
    if let Some(ref cb) = config.progress_callback {
        cb.on_extraction_start(total_pages);
    }
}

fn notify_complete(config: &ReflowConfig, pages: &[PageExtraction]) {
    if let Some(ref cb) = config.progress_callback {
        let with_text = pages.iter().filter(|p| !p.blocks.is_empty()).count();
        cb.on_extraction_complete(pages.len(), with_text);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RecognitionError;
    use image::{DynamicImage, Rgb, RgbImage};
    use std::io::Cursor;

    fn jpeg(width: u32, height: u32) -> Vec<u8> {
        let img =
            DynamicImage::ImageRgb8(RgbImage::from_pixel(width, height, Rgb([200, 200, 200])));
        let mut buf = Vec::new();
        img.write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Jpeg)
            .unwrap();
        buf
    }

    #[test]
    fn image_extraction_needs_no_pdfium() {
        let recognizer = |_: &DynamicImage| -> Result<Vec<String>, RecognitionError> {
            Ok(vec!["Hello".to_string(), "World".to_string()])
        };
        let out = extract(&jpeg(64, 48), InputKind::Image, &recognizer, &ReflowConfig::default())
            .unwrap();
        assert_eq!(out.document.source, SourceKind::ScannedImage);
        assert_eq!(out.text(), "Hello\nWorld");
        assert!(out.page_errors.is_empty());
    }

    #[test]
    fn image_without_text_is_empty_document() {
        let recognizer =
            |_: &DynamicImage| -> Result<Vec<String>, RecognitionError> { Ok(Vec::new()) };
        let err = extract(&jpeg(16, 16), InputKind::Image, &recognizer, &ReflowConfig::default())
            .unwrap_err();
        assert!(matches!(err, ReflowError::EmptyDocument { pages: 1 }));
    }

    #[test]
    fn image_with_failing_recognizer_reports_cause() {
        let recognizer = |_: &DynamicImage| -> Result<Vec<String>, RecognitionError> {
            Err(RecognitionError::Unavailable("OPENAI_API_KEY not set".into()))
        };
        let err = extract(&jpeg(16, 16), InputKind::Image, &recognizer, &ReflowConfig::default())
            .unwrap_err();
        assert!(matches!(err, ReflowError::AllPagesFailed { total: 1, .. }));
        assert!(err.to_string().contains("OPENAI_API_KEY not set"), "got: {err}");
    }

    #[test]
    fn empty_layout_is_not_rendered() {
        let doc = Document::new(SourceKind::HasTextLayer, Vec::new());
        let err = render_layout(&doc, &ReflowConfig::default()).unwrap_err();
        assert!(matches!(err, ReflowError::EmptyDocument { pages: 0 }));
    }
}
