//! # edgequake-pdfedit
//!
//! Turn a PDF or a scanned image into editable text, then write the edited
//! text back into a new PDF that keeps the original layout.
//!
//! ## How layout survives editing
//!
//! Extraction records *where* every piece of text sat and *which font* it
//! used. The user only ever sees a flat list of lines. When the edited lines
//! come back they are re-attached to the recorded layout:
//!
//! * documents with a text layer are remapped **positionally**: block by
//!   block, each edited line taking the place and font of the original;
//! * scanned documents and photos are remapped in **flow** mode: lines are
//!   stacked over the original page image, split evenly across pages.
//!
//! ## Pipeline Overview
//!
//! ```text
//! PDF / image
//!  │
//!  ├─ 1. Input     resolve local file or download from URL
//!  ├─ 2. Extract   text layer via pdfium, or raster + vision-model OCR
//!  ├─ 3. Classify  text layer vs. scanned, once per document
//!  ├─ 4. Layout    pages of positioned blocks + the edit buffer
//!  ├─ 5. Remap     edited lines → positioned blocks
//!  └─ 6. Render    new PDF via pdfium (standard fonts, background images)
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use edgequake_pdfedit::{extract_input, render_to_file, EditBuffer, ReflowConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ReflowConfig::default();
//!     let extraction = extract_input("invoice.pdf", None, &config).await?;
//!
//!     let edited = extraction.text().replace("Total: 40", "Total: 42");
//!     let buffer = EditBuffer::from_text(&edited);
//!     render_to_file(&extraction.document, &buffer, "invoice-edited.pdf", &config).await?;
//!     Ok(())
//! }
//! ```
//!
//! Scanned pages are recognised with a vision model; the provider is
//! auto-detected from `OPENAI_API_KEY` / `ANTHROPIC_API_KEY` / … and only
//! resolved when a page actually needs it.
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `pdfedit` binary (clap + anyhow + tracing-subscriber) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! edgequake-pdfedit = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod convert;
pub mod error;
pub mod model;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod prompts;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{ReflowConfig, ReflowConfigBuilder};
pub use convert::{extract, extract_input, reflow, render, render_layout, render_to_file};
pub use error::{PageError, RecognitionError, ReflowError};
pub use model::{BackgroundImage, BoundingBox, Document, EditBuffer, Page, SourceKind, TextBlock};
pub use output::Extraction;
pub use pipeline::input::InputKind;
pub use pipeline::recognize::{TextRecognizer, VisionRecognizer};
pub use progress::{NoopProgressCallback, ProgressCallback, ReflowProgressCallback};
