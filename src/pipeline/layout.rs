//! Layout construction: per-page extraction results → [`Document`].

use crate::error::{PageError, ReflowError};
use crate::model::{Document, Page, SourceKind};
use crate::output::Extraction;
use crate::pipeline::extract::PageExtraction;
use tracing::info;

/// Assemble the document and its initial edit buffer.
///
/// Backgrounds are carried only for [`SourceKind::ScannedImage`]. A document
/// with no block at all is [`ReflowError::AllPagesFailed`] when every page
/// carries an error, and [`ReflowError::EmptyDocument`] otherwise.
pub fn build_document(
    source: SourceKind,
    extracted: Vec<PageExtraction>,
) -> Result<Extraction, ReflowError> {
    let mut pages = Vec::with_capacity(extracted.len());
    let mut page_errors: Vec<PageError> = Vec::new();

    for result in extracted {
        let mut page = Page::new(result.width, result.height).with_blocks(result.blocks);
        if source == SourceKind::ScannedImage {
            if let Some(background) = result.background {
                page = page.with_background(background);
            }
        }
        if let Some(error) = result.error {
            page_errors.push(error);
        }
        pages.push(page);
    }

    let document = Document::new(source, pages);
    if document.block_count() == 0 {
        if let Some(first) = page_errors.first() {
            if page_errors.len() == document.page_count() {
                return Err(ReflowError::AllPagesFailed {
                    total: document.page_count(),
                    first_error: first.to_string(),
                });
            }
        }
        return Err(ReflowError::EmptyDocument {
            pages: document.page_count(),
        });
    }

    let edit_buffer = document.edit_buffer();
    info!(
        "Layout built: {} pages, {} blocks, {} lines ({:?})",
        document.page_count(),
        document.block_count(),
        edit_buffer.len(),
        source
    );

    Ok(Extraction {
        document,
        edit_buffer,
        page_errors,
    })
}
