//! Source classification: does the document carry a usable text layer?
//!
//! The decision is global. One page with real text is enough to take the
//! positional path for the whole document; a document whose text layer holds
//! nothing but whitespace is treated as scanned and goes through recognition.

use crate::model::SourceKind;
use crate::pipeline::extract::PageExtraction;
use tracing::debug;

/// Classify a document from its embedded-layer extraction.
pub fn classify(pages: &[PageExtraction]) -> SourceKind {
    let with_text = pages
        .iter()
        .filter(|p| p.blocks.iter().any(|b| b.has_text()))
        .count();
    debug!("{}/{} pages carry embedded text", with_text, pages.len());

    if with_text > 0 {
        SourceKind::HasTextLayer
    } else {
        SourceKind::ScannedImage
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{BoundingBox, TextBlock};

    fn page(texts: &[&str]) -> PageExtraction {
        PageExtraction {
            page_num: 1,
            width: 612.0,
            height: 792.0,
            blocks: texts
                .iter()
                .map(|t| TextBlock::new(BoundingBox::new(0.0, 0.0, 10.0, 10.0), *t, "Helvetica"))
                .collect(),
            background: None,
            error: None,
        }
    }

    #[test]
    fn whitespace_only_layer_is_scanned() {
        let pages = vec![page(&["  ", "\t"]), page(&["\n"])];
        assert_eq!(classify(&pages), SourceKind::ScannedImage);
    }

    #[test]
    fn no_pages_is_scanned() {
        assert_eq!(classify(&[]), SourceKind::ScannedImage);
    }

    #[test]
    fn one_text_page_is_enough() {
        let pages = vec![page(&[]), page(&[" ", "Hello"])];
        assert_eq!(classify(&pages), SourceKind::HasTextLayer);
    }
}
