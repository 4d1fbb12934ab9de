//! Inline markdown rendering for chat messages.
//!
//! Only the handful of constructs the assistant commonly emits are handled:
//! bold, italic, inline code and line breaks.

use regex::Regex;

/// Renders message text to the small HTML subset used by the message list.
pub struct MessageFormatter {
    bold: Regex,
    italic: Regex,
    code: Regex,
    tag: Regex,
}

impl MessageFormatter {
    /// Compile the formatting patterns.
    ///
    /// # Errors
    /// Returns an error if a pattern is invalid.
    pub fn new() -> Result<Self, regex::Error> {
        Ok(Self {
            bold: Regex::new(r"\*\*(.*?)\*\*")?,
            italic: Regex::new(r"\*(.*?)\*")?,
            code: Regex::new(r"`(.*?)`")?,
            tag: Regex::new(r"<[^>]*>")?,
        })
    }

    /// Apply bold, italic, code and newline formatting, in that order.
    #[must_use]
    pub fn format(&self, text: &str) -> String {
        let out = self.bold.replace_all(text, "<strong>$1</strong>");
        let out = self.italic.replace_all(&out, "<em>$1</em>");
        let out = self.code.replace_all(&out, r#"<code class="inline-code">$1</code>"#);
        out.replace('\n', "<br>")
    }

    /// Strip the markup produced by [`Self::format`], turning breaks back into newlines.
    #[must_use]
    pub fn plain_text(&self, html: &str) -> String {
        let with_newlines = html.replace("<br>", "\n");
        self.tag.replace_all(&with_newlines, "").into_owned()
    }
}
