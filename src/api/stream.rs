/// Incremental NDJSON framer.
///
/// Raw bytes are buffered until a `\n` arrives, so a UTF-8 sequence split
/// across two network chunks is only decoded once it is whole. `\n` never
/// occurs inside a multi-byte sequence, which makes the byte scan safe.
#[derive(Default)]
pub struct LineFramer {
    buffer: Vec<u8>,
}

impl LineFramer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `chunk` and return every complete, trimmed, non-empty line.
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<String> {
        self.buffer.extend_from_slice(chunk);
        let mut lines = Vec::new();
        let mut start = 0;

        while let Some(offset) = self.buffer[start..].iter().position(|b| *b == b'\n') {
            let end = start + offset;
            if let Some(line) = decode_line(&self.buffer[start..end]) {
                lines.push(line);
            }
            start = end + 1;
        }

        if start > 0 {
            self.buffer.drain(..start);
        }

        lines
    }

    /// Drain whatever is left once the stream has ended.
    pub fn finish(&mut self) -> Option<String> {
        let rest = std::mem::take(&mut self.buffer);
        decode_line(&rest)
    }

    pub fn pending_bytes(&self) -> usize {
        self.buffer.len()
    }
}

fn decode_line(raw: &[u8]) -> Option<String> {
    let text = String::from_utf8_lossy(raw);
    let trimmed = text.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
