//! Text accumulation and outcome classification.
//!
//! Collects recognized text across pages (one newline separator between
//! pages) and classifies the end result. Only the zero-text case is
//! classified here; errors never pass through the accumulator. The
//! pipeline boundary maps them to `failed` outcomes itself.

use crate::types::RecognitionOutcome;

/// Running buffer of recognized text for one operation.
#[derive(Debug, Default)]
pub struct TextAccumulator {
    buffer: String,
}

impl TextAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one page's text followed by a newline separator (PDF mode).
    pub fn append(&mut self, page_text: &str) {
        self.buffer.push_str(page_text);
        self.buffer.push('\n');
    }

    /// Replace the buffer with `text` (image mode).
    pub fn set(&mut self, text: &str) {
        self.buffer.clear();
        self.buffer.push_str(text);
    }

    /// Trim and classify the accumulated text.
    ///
    /// Whitespace-only text is `Empty`: recognition succeeded but found
    /// nothing, which is a distinguishable non-error result. Anything else
    /// is `Success` with leading/trailing whitespace removed and internal
    /// whitespace preserved.
    pub fn finalize(self) -> RecognitionOutcome {
        let trimmed = self.buffer.trim();
        if trimmed.is_empty() {
            RecognitionOutcome::Empty
        } else {
            RecognitionOutcome::Success {
                text: trimmed.to_string(),
            }
        }
    }
}
