//! Display rendering for stored version bytes.

use amp_types::MimeType;

/// Turns the bytes of a version into text for a terminal or UI.
pub trait ContentViewer: Send + Sync {
    fn render(&self, data: &[u8]) -> String;
}

/// Markdown and plain text, shown as-is.
///
/// Content that is not valid UTF-8 is summarized instead of decoded.
#[derive(Clone, Copy, Debug, Default)]
pub struct TextViewer;

impl ContentViewer for TextViewer {
    fn render(&self, data: &[u8]) -> String {
        match std::str::from_utf8(data) {
            Ok(text) => text.to_string(),
            Err(_) => binary_placeholder(data),
        }
    }
}

/// CSV text with a leading byte-order mark dropped and line endings
/// normalized to `\n`.
#[derive(Clone, Copy, Debug, Default)]
pub struct CsvViewer;

impl ContentViewer for CsvViewer {
    fn render(&self, data: &[u8]) -> String {
        let Ok(text) = std::str::from_utf8(data) else {
            return binary_placeholder(data);
        };
        text.strip_prefix('\u{feff}')
            .unwrap_or(text)
            .replace("\r\n", "\n")
    }
}

fn binary_placeholder(data: &[u8]) -> String {
    format!("<binary content, {} bytes>", data.len())
}

/// The viewer registered for a MIME type.
pub fn viewer_for(mime_type: MimeType) -> &'static dyn ContentViewer {
    match mime_type {
        MimeType::Csv => &CsvViewer,
        MimeType::Markdown | MimeType::PlainText => &TextViewer,
    }
}
