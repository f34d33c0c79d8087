use std::mem;

/// Accumulates raw transport bytes and yields complete trimmed lines.
///
/// One framer exists per connection; a trailing partial line stays buffered
/// until the delimiter arrives on a later push. Inbound frames are split on
/// `\n` alone so the trim also absorbs the `\r` from CRLF peers. The buffer
/// holds raw bytes and is decoded per complete line, so a multibyte UTF-8
/// sequence split across pushes survives intact.
#[derive(Debug, Default)]
pub struct LineFramer {
    buffer: Vec<u8>,
}

impl LineFramer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends one chunk and returns every complete line it unlocked.
    ///
    /// Lines are trimmed of surrounding whitespace; lines that are empty
    /// after trimming are dropped rather than dispatched.
    pub fn push_bytes(&mut self, bytes: &[u8]) -> Vec<String> {
        self.buffer.extend_from_slice(bytes);

        let mut lines = Vec::new();
        while let Some(delimiter_index) = self.buffer.iter().position(|byte| *byte == b'\n') {
            let rest = self.buffer.split_off(delimiter_index + 1);
            let raw_line = mem::replace(&mut self.buffer, rest);
            let decoded = String::from_utf8_lossy(&raw_line);
            let trimmed = decoded.trim();
            if !trimmed.is_empty() {
                lines.push(trimmed.to_string());
            }
        }
        lines
    }

    /// Bytes currently buffered while waiting for a delimiter.
    pub fn pending_len(&self) -> usize {
        self.buffer.len()
    }
}
