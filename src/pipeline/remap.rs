//! Edit remapping: re-attach a flat, edited text buffer to the layout it
//! was extracted from.
//!
//! The mode follows the document's [`SourceKind`]:
//!
//! * **Positional** (`HasTextLayer`): blocks and edited lines are walked in
//!   lockstep across all pages. Each block takes its `source_line_count`
//!   lines (at least one) and keeps its position and font. When the buffer
//!   runs out, the remaining blocks produce nothing; when blocks run out,
//!   the remaining lines are dropped. Pairing is by index, never by content.
//!
//! * **Flow** (`ScannedImage`): the buffer is split into one contiguous chunk
//!   per page (`total / pages` lines each, at least one, remainder on the
//!   last page) and each chunk is stacked from the top margin with a pitch
//!   derived from the page height. Backgrounds carry over.
//!
//! Both modes are pure functions of their inputs.

use crate::config::ReflowConfig;
use crate::model::{BoundingBox, Document, EditBuffer, Page, SourceKind, TextBlock};
use tracing::{debug, warn};

/// Build the layout for `edited` on top of `original`.
pub fn remap(original: &Document, edited: &EditBuffer, config: &ReflowConfig) -> Document {
    match original.source {
        SourceKind::HasTextLayer => remap_positional(original, edited),
        SourceKind::ScannedImage => remap_flow(original, edited, config),
    }
}

// ── Positional mode ──────────────────────────────────────────────────────

fn remap_positional(original: &Document, edited: &EditBuffer) -> Document {
    let lines = edited.lines();
    let mut cursor = 0;
    let mut placed = 0;

    let pages = original
        .pages
        .iter()
        .map(|page| {
            let mut blocks = Vec::new();
            for block in &page.blocks {
                if cursor >= lines.len() {
                    break;
                }
                let end = (cursor + block.source_line_count.max(1)).min(lines.len());
                blocks.push(TextBlock {
                    text: lines[cursor..end].join("\n"),
                    source_line_count: end - cursor,
                    ..block.clone()
                });
                cursor = end;
                placed += 1;
            }
            Page {
                width: page.width,
                height: page.height,
                background: page.background.clone(),
                blocks,
            }
        })
        .collect();

    let total_blocks = original.block_count();
    if placed < total_blocks {
        debug!(
            "Edited text ran out after {}/{} blocks; trailing blocks dropped",
            placed, total_blocks
        );
    }
    if cursor < lines.len() {
        warn!(
            "{} edited line(s) beyond the last block were dropped",
            lines.len() - cursor
        );
    }

    Document::new(original.source, pages)
}

// ── Flow mode ────────────────────────────────────────────────────────────

/// Lines per page when `total` lines are spread over `pages` pages.
pub fn chunk_sizes(total: usize, pages: usize) -> Vec<usize> {
    if pages == 0 {
        return Vec::new();
    }
    let per_page = (total / pages).max(1);
    (0..pages)
        .map(|i| {
            let start = (i * per_page).min(total);
            let end = if i + 1 == pages {
                total
            } else {
                ((i + 1) * per_page).min(total)
            };
            end - start
        })
        .collect()
}

fn remap_flow(original: &Document, edited: &EditBuffer, config: &ReflowConfig) -> Document {
    let lines = edited.lines();
    let sizes = chunk_sizes(lines.len(), original.page_count());
    let mut start = 0;

    let pages = original
        .pages
        .iter()
        .zip(sizes)
        .map(|(page, size)| {
            let chunk = &lines[start..start + size];
            start += size;
            Page {
                width: page.width,
                height: page.height,
                background: page.background.clone(),
                blocks: flow_blocks(chunk, page.width, page.height, config),
            }
        })
        .collect();

    Document::new(original.source, pages)
}

/// One single-line block per line. Baselines start at the top margin and
/// advance by the line pitch; each box top sits one font size above its
/// baseline.
///
/// Blank lines keep their slot. Lines past the page bottom keep their
/// computed position.
fn flow_blocks(
    lines: &[String],
    page_width: f32,
    page_height: f32,
    config: &ReflowConfig,
) -> Vec<TextBlock> {
    let font_size = config.flow_font_size(page_height);
    let pitch = config.line_pitch(page_height);
    let width = (page_width - config.left_margin).max(0.0);

    lines
        .iter()
        .enumerate()
        .map(|(j, line)| {
            let baseline = config.top_margin + j as f32 * pitch;
            let bbox = BoundingBox::new(config.left_margin, baseline - font_size, width, font_size);
            TextBlock::new(bbox, line.clone(), config.fallback_font.clone())
                .with_font_size(font_size)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::BackgroundImage;

    fn block(x: f32, text: &str, font: &str) -> TextBlock {
        TextBlock::new(BoundingBox::new(x, 20.0, 100.0, 12.0), text, font)
    }

    fn text_doc(pages: Vec<Vec<TextBlock>>) -> Document {
        Document::new(
            SourceKind::HasTextLayer,
            pages
                .into_iter()
                .map(|b| Page::new(612.0, 792.0).with_blocks(b))
                .collect(),
        )
    }

    fn scanned_doc(pages: usize, height: f32) -> Document {
        Document::new(
            SourceKind::ScannedImage,
            (0..pages)
                .map(|_| {
                    Page::new(600.0, height)
                        .with_background(BackgroundImage::from_encoded(vec![0], 600, height as u32))
                })
                .collect(),
        )
    }

    #[test]
    fn chunking_puts_remainder_on_last_page() {
        assert_eq!(chunk_sizes(10, 3), vec![3, 3, 4]);
        assert_eq!(chunk_sizes(9, 3), vec![3, 3, 3]);
        assert_eq!(chunk_sizes(2, 3), vec![1, 1, 0]);
        assert_eq!(chunk_sizes(0, 2), vec![0, 0]);
        assert!(chunk_sizes(5, 0).is_empty());
    }

    #[test]
    fn chunks_always_cover_every_line() {
        for total in 0..40 {
            for pages in 1..7 {
                assert_eq!(chunk_sizes(total, pages).iter().sum::<usize>(), total);
            }
        }
    }

    #[test]
    fn positional_blocks_inherit_position_and_font() {
        let doc = text_doc(vec![vec![block(1.0, "A", "Times-Bold"), block(2.0, "B", "Courier")]]);
        let out = remap(&doc, &EditBuffer::from_text("x\ny"), &ReflowConfig::default());
        let blocks = &out.pages[0].blocks;
        assert_eq!(blocks[0].text, "x");
        assert_eq!(blocks[0].bbox.x, 1.0);
        assert_eq!(blocks[0].font_hint, "Times-Bold");
        assert_eq!(blocks[1].text, "y");
        assert_eq!(blocks[1].font_hint, "Courier");
    }

    #[test]
    fn multi_line_block_consumes_its_lines() {
        let doc = text_doc(vec![vec![
            block(1.0, "a\nb", "Helvetica"),
            block(2.0, "c", "Helvetica"),
        ]]);
        let out = remap(&doc, &EditBuffer::from_text("1\n2\n3"), &ReflowConfig::default());
        let texts: Vec<_> = out.blocks().map(|b| b.text.as_str()).collect();
        assert_eq!(texts, vec!["1\n2", "3"]);
    }

    #[test]
    fn positional_mode_spans_pages() {
        let doc = text_doc(vec![
            vec![block(1.0, "A", "Helvetica")],
            vec![block(2.0, "B", "Helvetica")],
        ]);
        let out = remap(&doc, &EditBuffer::from_text("x\ny"), &ReflowConfig::default());
        assert_eq!(out.pages[1].blocks[0].text, "y");
        assert_eq!(out.pages[1].blocks[0].bbox.x, 2.0);
    }

    #[test]
    fn short_buffer_keeps_pages_but_drops_blocks() {
        let doc = text_doc(vec![
            vec![block(1.0, "A", "Helvetica")],
            vec![block(2.0, "B", "Helvetica")],
        ]);
        let out = remap(&doc, &EditBuffer::from_text("only"), &ReflowConfig::default());
        assert_eq!(out.page_count(), 2);
        assert_eq!(out.block_count(), 1);
        assert!(out.pages[1].blocks.is_empty());
    }

    #[test]
    fn flow_lines_use_pitch_from_page_height() {
        // 1200 px tall: font = max(12, 1200 / 60) = 20, pitch = 22
        let doc = scanned_doc(1, 1200.0);
        let out = remap(&doc, &EditBuffer::from_text("a\nb\nc"), &ReflowConfig::default());
        let baselines: Vec<f32> = out.blocks().map(|b| b.bbox.bottom()).collect();
        assert_eq!(baselines, vec![40.0, 62.0, 84.0]);
        assert_eq!(out.pages[0].blocks[0].bbox.y, 20.0);
        assert!(out.blocks().all(|b| b.font_size == Some(20.0)));
        assert!(out.blocks().all(|b| b.font_hint == "Helvetica"));
        assert!(out.blocks().all(|b| b.bbox.x == 40.0));
    }

    #[test]
    fn flow_font_has_a_floor() {
        let doc = scanned_doc(1, 300.0);
        let out = remap(&doc, &EditBuffer::from_text("a\nb"), &ReflowConfig::default());
        assert_eq!(out.pages[0].blocks[1].bbox.bottom(), 40.0 + 14.0);
        assert_eq!(out.pages[0].blocks[0].font_size, Some(12.0));
    }

    #[test]
    fn flow_mode_keeps_backgrounds_and_blank_slots() {
        let doc = scanned_doc(2, 600.0);
        let out = remap(&doc, &EditBuffer::from_text("a\n\nb\nc"), &ReflowConfig::default());
        assert!(out.pages.iter().all(|p| p.background.is_some()));
        assert_eq!(out.pages[0].blocks.len(), 2);
        assert_eq!(out.pages[0].blocks[1].text, "");
        assert_eq!(out.pages[1].blocks[0].text, "b");
        assert_eq!(out.pages[1].blocks[0].bbox.bottom(), 40.0);
    }

    #[test]
    fn remap_is_deterministic() {
        let doc = scanned_doc(3, 800.0);
        let buf = EditBuffer::from_text("1\n2\n3\n4\n5\n6\n7");
        let config = ReflowConfig::default();
        assert_eq!(remap(&doc, &buf, &config), remap(&doc, &buf, &config));
    }
}
