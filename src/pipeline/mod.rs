//! Pipeline stages for extracting, remapping and re-rendering a document.
//!
//! Each submodule implements one step and is testable on its own.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ engine ──▶ extract ──▶ classify ──▶ layout ──▶ remap ──▶ render
//! (bytes)   (pdfium)   (text/OCR)  (global)    (Document) (edits)   (PDF)
//! ```
//!
//! 1. [`input`]    — read a path or download a URL; detect PDF vs. image
//! 2. [`engine`]   — bind pdfium and open the PDF
//! 3. [`extract`]  — text-layer blocks, or [`rasterize`] + [`recognize`] per page
//! 4. [`classify`] — pick the text-layer or scanned path for the whole document
//! 5. [`layout`]   — assemble the [`crate::model::Document`] and its edit buffer
//! 6. [`remap`]    — re-attach an edited buffer to the layout
//! 7. [`render`]   — write the layout as a new PDF, resolving [`fonts`]
//!
//! [`encode`] and [`postprocess`] support the recognition step.

pub mod classify;
pub mod encode;
pub mod engine;
pub mod extract;
pub mod fonts;
pub mod input;
pub mod layout;
pub mod postprocess;
pub mod rasterize;
pub mod recognize;
pub mod remap;
pub mod render;
