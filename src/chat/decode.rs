//! Incremental UTF-8 decoding of a streamed response body.

/// Decodes byte chunks into text, holding back a multi-byte character split across chunks.
#[derive(Debug, Default)]
pub struct Utf8StreamDecoder {
    pending: Vec<u8>,
}

impl Utf8StreamDecoder {
    /// Create an empty decoder.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            pending: Vec::new(),
        }
    }

    /// Decode as much of `chunk` (plus any held-back bytes) as forms complete characters.
    ///
    /// Invalid sequences become U+FFFD; an incomplete trailing sequence is kept for the next call.
    pub fn push(&mut self, chunk: &[u8]) -> String {
        self.pending.extend_from_slice(chunk);
        let mut out = String::new();

        loop {
            match std::str::from_utf8(&self.pending) {
                Ok(text) => {
                    out.push_str(text);
                    self.pending.clear();
                    break;
                }
                Err(err) => {
                    let valid = err.valid_up_to();
                    out.push_str(&String::from_utf8_lossy(&self.pending[..valid]));
                    match err.error_len() {
                        Some(bad) => {
                            out.push(char::REPLACEMENT_CHARACTER);
                            self.pending.drain(..valid + bad);
                        }
                        None => {
                            self.pending.drain(..valid);
                            break;
                        }
                    }
                }
            }
        }

        out
    }

    /// Flush whatever is still held back once the stream has ended.
    pub fn finish(&mut self) -> String {
        if self.pending.is_empty() {
            return String::new();
        }
        let rest = String::from_utf8_lossy(&self.pending).into_owned();
        self.pending.clear();
        rest
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ascii_passthrough() {
        let mut decoder = Utf8StreamDecoder::new();
        assert_eq!(decoder.push(b"Hi"), "Hi");
        assert_eq!(decoder.push(b" there"), " there");
        assert_eq!(decoder.finish(), "");
    }

    #[test]
    fn test_split_multibyte_character() {
        // "উ" is three bytes in UTF-8.
        let bytes = "উত্তর".as_bytes();
        let mut decoder = Utf8StreamDecoder::new();
        let mut text = decoder.push(&bytes[..2]);
        assert_eq!(text, "");
        text.push_str(&decoder.push(&bytes[2..]));
        text.push_str(&decoder.finish());
        assert_eq!(text, "উত্তর");
    }

    #[test]
    fn test_invalid_bytes_are_replaced() {
        let mut decoder = Utf8StreamDecoder::new();
        assert_eq!(decoder.push(b"a\xffb"), "a\u{FFFD}b");
    }

    #[test]
    fn test_truncated_tail_flushed_on_finish() {
        let mut decoder = Utf8StreamDecoder::new();
        assert_eq!(decoder.push(&[b'x', 0xE0, 0xA6]), "x");
        assert_eq!(decoder.finish(), "\u{FFFD}");
    }
}
