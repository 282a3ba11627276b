//! Text shaping before layout.
//!
//! Label text is stored in logical order by the data source. The renderer
//! lays glyphs out left to right, so right-to-left runs are reordered into
//! visual order here using the Unicode Bidirectional Algorithm (UAX #9).

use unicode_bidi::BidiInfo;

/// Converts raw label text into the form handed to the renderer.
pub trait TextShaper: Send + Sync {
    fn shape(&self, text: &str) -> String;
}

/// Reorders each paragraph into visual order.
#[derive(Debug, Clone, Copy, Default)]
pub struct BidiShaper;

impl TextShaper for BidiShaper {
    fn shape(&self, text: &str) -> String {
        let info = BidiInfo::new(text, None);
        if !info.has_rtl() {
            return text.to_string();
        }

        let mut shaped = String::with_capacity(text.len());
        for paragraph in &info.paragraphs {
            let line = paragraph.range.clone();
            shaped.push_str(&info.reorder_line(paragraph, line));
        }
        shaped
    }
}

/// Leaves text untouched.
#[derive(Debug, Clone, Copy, Default)]
pub struct PassthroughShaper;

impl TextShaper for PassthroughShaper {
    fn shape(&self, text: &str) -> String {
        text.to_string()
    }
}
