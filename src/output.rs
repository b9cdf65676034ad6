//! Output types returned by the extraction entry points.

use crate::error::PageError;
use crate::model::{Document, EditBuffer};
use serde::{Deserialize, Serialize};

/// Result of extracting a document: the layout, the text shown for editing,
/// and the pages that could not be read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Extraction {
    pub document: Document,
    /// Every block's text, flattened in page then block order.
    pub edit_buffer: EditBuffer,
    /// Non-fatal per-page failures, in page order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub page_errors: Vec<PageError>,
}

impl Extraction {
    /// The edit buffer as a single `\n`-joined string.
    pub fn text(&self) -> String {
        self.edit_buffer.to_text()
    }

    pub fn failed_pages(&self) -> usize {
        self.page_errors.len()
    }
}
