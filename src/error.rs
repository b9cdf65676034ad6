//! Error types for the edgequake-pdfedit library.
//!
//! Three error types reflect three distinct failure modes:
//!
//! * [`ReflowError`] — **Fatal**: the extraction or render call cannot
//!   produce a result at all (unreadable input, wrong password, nothing to
//!   edit, a PDF that could not be written). Returned as
//!   `Err(ReflowError)` from the entry points in [`crate::convert`].
//!
//! * [`PageError`] — **Non-fatal**: a single page could not be read, but the
//!   remaining pages are fine. The page is kept with an empty block list and
//!   the error is stored in [`crate::output::Extraction::page_errors`].
//!
//! * [`RecognitionError`] — returned by a [`crate::pipeline::recognize::TextRecognizer`]
//!   implementation. The extractor turns it into a [`PageError`].
//!
//! Font-resolution misses and block/line count mismatches are not errors:
//! they are absorbed by the fallback font and by the remapping policy.

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the edgequake-pdfedit library.
#[derive(Debug, Error)]
pub enum ReflowError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("Input file not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The input string is not a valid file path or URL.
    #[error("Invalid input '{input}': not a file path or a valid HTTP/HTTPS URL")]
    InvalidInput { input: String },

    /// HTTP URL was syntactically valid but download failed.
    #[error("Failed to download '{url}': {reason}\nCheck your internet connection.")]
    DownloadFailed { url: String, reason: String },

    /// Download exceeded the configured timeout.
    #[error("Download timed out after {secs}s for '{url}'\nIncrease --download-timeout.")]
    DownloadTimeout { url: String, secs: u64 },

    /// The bytes are neither a PDF nor an image format we can decode.
    #[error("Unsupported input '{name}': not a PDF or a PNG/JPEG image\nFirst bytes: {magic:?}")]
    UnsupportedInput { name: String, magic: Vec<u8> },

    // ── PDF errors ────────────────────────────────────────────────────────
    /// PDF header/trailer/xref is corrupt and cannot be parsed.
    #[error("PDF is corrupt: {detail}\nTry repairing with: qpdf --decrypt input.pdf output.pdf")]
    CorruptPdf { detail: String },

    /// PDF requires a password but none was provided.
    #[error("PDF is encrypted and requires a password.\nProvide it with --password <PASSWORD>.")]
    PasswordRequired,

    /// A password was provided but it is wrong.
    #[error("Wrong password for PDF")]
    WrongPassword,

    // ── Pipeline errors ───────────────────────────────────────────────────
    /// Extraction finished but produced no page or no text block at all.
    #[error("Nothing to edit: no text was found in {pages} page(s)")]
    EmptyDocument { pages: usize },

    /// Nothing to edit because every page failed to extract.
    #[error("Nothing to edit: all {total} page(s) failed.\nFirst error: {first_error}")]
    AllPagesFailed { total: usize, first_error: String },

    /// The output PDF could not be written.
    ///
    /// `page` is 1-indexed; 0 means the document itself could not be created
    /// or saved. Fatal for the whole render call: no partial output is
    /// returned.
    #[error("Rendering failed for {}: {detail}", render_target(.page))]
    RenderFailed { page: usize, detail: String },

    /// The layout could not be serialised to JSON.
    #[error("Failed to serialise layout: {detail}")]
    SerializationFailed { detail: String },

    /// A persisted layout could not be read back.
    #[error("Invalid layout file: {detail}")]
    InvalidLayout { detail: String },

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not create or write an output file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Binding errors ────────────────────────────────────────────────────
    /// Could not bind to a pdfium library.
    #[error(
        "Failed to bind to pdfium library: {0}\n\n\
PDFium is required to read and write PDF files. You can:\n\
  • Set PDFIUM_LIB_PATH=/path/to/libpdfium to use an existing copy.\n\
  • Place libpdfium next to the binary or in the working directory.\n\
  • Install pdfium system-wide (see bblanchon/pdfium-binaries).\n"
    )]
    PdfiumBindingFailed(String),

    /// The configured vision provider could not be created.
    #[error("Recognition provider '{provider}' is not configured.\n{hint}")]
    ProviderNotConfigured { provider: String, hint: String },

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

fn render_target(page: &usize) -> String {
    if *page == 0 {
        "the document".to_string()
    } else {
        format!("page {page}")
    }
}

/// A non-fatal error for a single page.
///
/// The page is kept in the document with no text blocks.
#[derive(Debug, Clone, PartialEq, Error, serde::Serialize, serde::Deserialize)]
pub enum PageError {
    /// The page (or its text layer) could not be read.
    #[error("Page {page}: extraction failed: {detail}")]
    ExtractionFailed { page: usize, detail: String },

    /// Page rasterisation for recognition failed.
    #[error("Page {page}: rasterisation failed: {detail}")]
    RasterisationFailed { page: usize, detail: String },

    /// The recognizer returned an error for this page.
    #[error("Page {page}: text recognition failed: {detail}")]
    RecognitionFailed { page: usize, detail: String },
}

impl PageError {
    /// 1-indexed page number the error refers to.
    pub fn page(&self) -> usize {
        match self {
            PageError::ExtractionFailed { page, .. }
            | PageError::RasterisationFailed { page, .. }
            | PageError::RecognitionFailed { page, .. } => *page,
        }
    }
}

/// Failure of the external text-recognition capability.
#[derive(Debug, Clone, Error)]
pub enum RecognitionError {
    /// No recognition backend could be created.
    #[error("recognizer unavailable: {0}")]
    Unavailable(String),

    /// The raster could not be encoded for the backend.
    #[error("image encoding failed: {0}")]
    Encoding(String),

    /// The backend failed on every attempt.
    #[error("recognition failed after {attempts} attempt(s): {detail}")]
    Failed { attempts: u32, detail: String },
}
