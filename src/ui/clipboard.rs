//! Clipboard access for the copy action.

use std::io::Write;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use parking_lot::Mutex;

use crate::api::error::ClientError;

/// Somewhere copied text can be placed.
pub trait Clipboard: Send + Sync {
    /// Replace the clipboard contents with `text`.
    ///
    /// # Errors
    /// Returns an error if the clipboard cannot be written.
    fn write_text(&self, text: &str) -> Result<(), ClientError>;
}

/// Terminal clipboard using the OSC 52 escape sequence.
pub struct Osc52Clipboard<W: Write + Send> {
    out: Mutex<W>,
}

impl<W: Write + Send> Osc52Clipboard<W> {
    /// Write escape sequences to `out`.
    pub const fn new(out: W) -> Self {
        Self {
            out: Mutex::new(out),
        }
    }

    /// Consume the clipboard and return the writer.
    pub fn into_inner(self) -> W {
        self.out.into_inner()
    }
}

impl<W: Write + Send> Clipboard for Osc52Clipboard<W> {
    fn write_text(&self, text: &str) -> Result<(), ClientError> {
        let encoded = STANDARD.encode(text.as_bytes());
        let mut out = self.out.lock();
        write!(out, "\x1b]52;c;{encoded}\x07")?;
        out.flush()?;
        Ok(())
    }
}
