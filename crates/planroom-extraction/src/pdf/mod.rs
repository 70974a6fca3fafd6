//! PDF text extraction: full-document text plus title-block text taken from
//! the bottom-right of every page.

pub mod layout;
pub mod tables;

use std::panic::{self, AssertUnwindSafe};

use lopdf::Document;
use tracing::{debug, warn};

use self::layout::{read_page, PageLayout};

/// Narrow title-block crop, as fractions of page width / height from the top-left.
pub const NARROW_CROP: (f32, f32) = (0.5, 0.7);
/// Wide title-block crop.
pub const WIDE_CROP: (f32, f32) = (0.3, 0.7);

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractedText {
    pub full_text: String,
    pub title_block_text: String,
    pub pages: usize,
}

impl ExtractedText {
    fn push_page(&mut self, page: &PageLayout) {
        let n = page.number;

        let text = page.text();
        if !text.is_empty() {
            self.full_text.push_str(&format!("\n--- Page {n} ---\n{text}\n"));
        }

        let narrow = page.region_text(NARROW_CROP.0, NARROW_CROP.1);
        if !narrow.is_empty() {
            self.title_block_text
                .push_str(&format!("\n--- Page {n} Title Block ---\n{narrow}\n"));
        }

        // exact-substring check only; whitespace variants are appended again
        let wide = page.region_text(WIDE_CROP.0, WIDE_CROP.1);
        if !wide.is_empty() && !self.title_block_text.contains(&wide) {
            self.title_block_text
                .push_str(&format!("\n--- Page {n} Title Block (Wide) ---\n{wide}\n"));
        }

        for row in tables::table_rows(page) {
            self.full_text.push_str(&row);
            self.full_text.push('\n');
            self.title_block_text.push_str(&row);
            self.title_block_text.push('\n');
        }
    }
}

fn primary_pass(bytes: &[u8], out: &mut ExtractedText) {
    let doc = match Document::load_mem(bytes) {
        Ok(doc) => doc,
        Err(e) => {
            warn!(error = %e, "Primary PDF extraction failed");
            return;
        }
    };

    for (number, page_id) in doc.get_pages() {
        out.pages += 1;
        match read_page(&doc, number, page_id) {
            Ok(page) => {
                debug!(page = number, items = page.items.len(), rulings = page.rulings.len(), "Read page");
                out.push_page(&page);
            }
            Err(e) => warn!(page = number, error = %e, "Primary PDF extraction failed on page"),
        }
    }
}

fn secondary_pass(bytes: &[u8]) -> Option<String> {
    match panic::catch_unwind(AssertUnwindSafe(|| pdf_extract::extract_text_from_mem(bytes))) {
        Ok(Ok(text)) => Some(text),
        Ok(Err(e)) => {
            warn!(error = %e, "Secondary PDF extraction failed");
            None
        }
        Err(_) => {
            warn!("Secondary PDF extraction panicked");
            None
        }
    }
}

/// Extract full and title-block text from `bytes`.
///
/// Never fails: unreadable documents produce empty text, which callers treat
/// as insufficient. When the primary pass yields fewer than
/// `secondary_threshold` characters, a secondary whole-document pass is
/// appended to the full text.
pub fn extract_text(bytes: &[u8], secondary_threshold: usize) -> ExtractedText {
    let mut out = ExtractedText::default();
    primary_pass(bytes, &mut out);

    if out.full_text.trim().chars().count() < secondary_threshold {
        debug!(chars = out.full_text.len(), "Primary text below threshold, running secondary pass");
        if let Some(text) = secondary_pass(bytes) {
            if !text.trim().is_empty() {
                out.full_text.push_str(&text);
                out.full_text.push('\n');
            }
        }
    }

    debug!(
        pages = out.pages,
        full_chars = out.full_text.len(),
        title_block_chars = out.title_block_text.len(),
        "Extracted PDF text"
    );
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use super::layout::TextItem;

    fn item(text: &str, x: f32, y: f32) -> TextItem {
        TextItem { text: text.into(), x, y, font_size: 10.0 }
    }

    #[test]
    fn test_garbage_bytes_give_empty_text() {
        let out = extract_text(b"definitely not a pdf", 100);
        assert!(out.full_text.trim().is_empty());
        assert!(out.title_block_text.is_empty());
        assert_eq!(out.pages, 0);
    }

    #[test]
    fn test_wide_crop_skipped_when_contained() {
        let page = PageLayout {
            number: 1,
            width: 600.0,
            height: 800.0,
            items: vec![item("JOB NO: 2024-117", 400.0, 60.0)],
            rulings: Vec::new(),
        };
        let mut out = ExtractedText::default();
        out.push_page(&page);
        assert!(out.title_block_text.contains("--- Page 1 Title Block ---"));
        assert!(!out.title_block_text.contains("(Wide)"));
        assert_eq!(out.full_text, "\n--- Page 1 ---\nJOB NO: 2024-117\n");
    }

    #[test]
    fn test_wide_crop_appended_when_new() {
        let page = PageLayout {
            number: 2,
            width: 600.0,
            height: 800.0,
            items: vec![item("ARCHITECT: Studio North", 200.0, 100.0), item("JOB NO: 9", 400.0, 60.0)],
            rulings: Vec::new(),
        };
        let mut out = ExtractedText::default();
        out.push_page(&page);
        assert!(out
            .title_block_text
            .contains("\n--- Page 2 Title Block (Wide) ---\nARCHITECT: Studio North\nJOB NO: 9\n"));
    }
}
