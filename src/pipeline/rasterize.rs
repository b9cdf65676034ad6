//! Page rasterisation: render a PDF page to a `DynamicImage` via pdfium.
//!
//! Rasters feed the recognizer and become the page background of scanned
//! documents, so the size is chosen from the configured DPI and then capped
//! by `max_rendered_pixels` on the longest edge. An A0 poster at 150 DPI
//! would otherwise allocate a 7000 × 10000 px bitmap.

use crate::config::ReflowConfig;
use image::DynamicImage;
use pdfium_render::prelude::*;
use tracing::debug;

/// Pixel dimensions for a page of `width_pt × height_pt` points.
pub fn target_size(width_pt: f32, height_pt: f32, dpi: u32, max_pixels: u32) -> (i32, i32) {
    let scale = dpi as f32 / 72.0;
    let mut w = (width_pt * scale).max(1.0);
    let mut h = (height_pt * scale).max(1.0);
    let longest = w.max(h);
    if longest > max_pixels as f32 {
        let shrink = max_pixels as f32 / longest;
        w *= shrink;
        h *= shrink;
    }
    (w.round().max(1.0) as i32, h.round().max(1.0) as i32)
}

/// Rasterise a single page.
pub fn rasterize_page(
    page: &PdfPage,
    config: &ReflowConfig,
) -> Result<DynamicImage, PdfiumError> {
    let (w, h) = target_size(
        page.width().value,
        page.height().value,
        config.dpi,
        config.max_rendered_pixels,
    );

    let render_config = PdfRenderConfig::new()
        .set_target_width(w)
        .set_maximum_height(h)
        .render_form_data(true)
        .render_annotations(true);

    let image = page.render_with_config(&render_config)?.as_image();
    debug!("Rasterised page → {}x{} px", image.width(), image.height());
    Ok(image)
}
