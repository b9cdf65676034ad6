//! PDF writing: lay a [`Document`] out as a new PDF via pdfium.
//!
//! Each page is created at the layout's size. A background, when present,
//! is drawn first and stretched over the whole page; text follows in block
//! order, one text object per line, black, never wrapped or clipped.
//!
//! Layout coordinates are top-left based. pdfium places text by its
//! baseline from the bottom-left, so a line drawn at box top `y` with size
//! `s` lands at `page_height - (y + s)`.
//!
//! A failure on any page aborts the whole render: either every page is
//! written and the bytes are returned, or nothing is.

use crate::config::ReflowConfig;
use crate::error::ReflowError;
use crate::model::{Document, Page, TextBlock};
use crate::pipeline::fonts::{resolve_font, StandardFont};
use pdfium_render::prelude::*;
use std::collections::HashMap;
use tracing::{debug, info};

/// Serialise `layout` to PDF bytes.
pub fn render_document(
    pdfium: &Pdfium,
    layout: &Document,
    config: &ReflowConfig,
) -> Result<Vec<u8>, ReflowError> {
    let mut document = pdfium
        .create_new_pdf()
        .map_err(|e| ReflowError::RenderFailed {
            page: 0,
            detail: format!("cannot create document: {e}"),
        })?;

    // Font tokens are registered once per document, before any page exists.
    let mut fonts: HashMap<StandardFont, PdfFontToken> = HashMap::new();
    for block in layout.blocks() {
        let font = resolve_font(&block.font_hint, &config.fallback_font);
        fonts
            .entry(font)
            .or_insert_with(|| document.fonts_mut().new_built_in(font.builtin()));
    }
    let fallback = resolve_font("", &config.fallback_font);
    fonts
        .entry(fallback)
        .or_insert_with(|| document.fonts_mut().new_built_in(fallback.builtin()));

    for (index, page) in layout.pages.iter().enumerate() {
        let page_num = index + 1;
        render_page(&mut document, page, &fonts, config).map_err(|e| {
            ReflowError::RenderFailed {
                page: page_num,
                detail: e.to_string(),
            }
        })?;
        debug!("Page {}: wrote {} blocks", page_num, page.blocks.len());
    }

    let bytes = document
        .save_to_bytes()
        .map_err(|e| ReflowError::RenderFailed {
            page: 0,
            detail: format!("cannot save document: {e}"),
        })?;

    info!(
        "Rendered {} pages → {} bytes",
        layout.page_count(),
        bytes.len()
    );
    if let Some(ref cb) = config.progress_callback {
        cb.on_render_complete(layout.page_count(), bytes.len());
    }
    Ok(bytes)
}

#[derive(Debug, thiserror::Error)]
enum PageFailure {
    #[error("{0}")]
    Pdfium(#[from] PdfiumError),
    #[error("background image: {0}")]
    Background(#[from] image::ImageError),
}

fn render_page(
    document: &mut PdfDocument,
    layout: &Page,
    fonts: &HashMap<StandardFont, PdfFontToken>,
    config: &ReflowConfig,
) -> Result<(), PageFailure> {
    let mut page = document.pages_mut().create_page_at_end(PdfPagePaperSize::new_custom(
        PdfPoints::new(layout.width),
        PdfPoints::new(layout.height),
    ))?;

    if let Some(ref background) = layout.background {
        let image = background.decode()?;
        page.objects_mut().create_image_object(
            PdfPoints::ZERO,
            PdfPoints::ZERO,
            &image,
            Some(PdfPoints::new(layout.width)),
            Some(PdfPoints::new(layout.height)),
        )?;
    }

    for block in &layout.blocks {
        let font = resolve_font(&block.font_hint, &config.fallback_font);
        let Some(&token) = fonts.get(&font) else {
            continue;
        };
        let size = font_size(block, config);

        for (i, line) in block.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            let baseline = baseline_y(layout.height, block.bbox.y, size, config.line_gap, i);
            let mut object = page.objects_mut().create_text_object(
                PdfPoints::new(block.bbox.x),
                PdfPoints::new(baseline),
                line,
                token,
                PdfPoints::new(size),
            )?;
            object.set_fill_color(PdfColor::BLACK)?;
        }
    }

    Ok(())
}

/// Block font size, never below the configured floor.
fn font_size(block: &TextBlock, config: &ReflowConfig) -> f32 {
    block
        .font_size
        .unwrap_or(config.min_font_size)
        .max(config.min_font_size)
}

/// Baseline (bottom-left origin) of line `line_index` of a block whose top
/// edge sits at `top` (top-left origin).
fn baseline_y(page_height: f32, top: f32, size: f32, line_gap: f32, line_index: usize) -> f32 {
    page_height - (top + size + line_index as f32 * (size + line_gap))
}
