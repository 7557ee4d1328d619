//! Bounded line framing over raw bytes.
//!
//! The framer never holds more than `max_len` bytes of a request. Longer
//! lines are counted and discarded up to the next newline, and lines that are
//! not UTF-8 are reported rather than ending the connection.

/// One request line as seen by the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    /// A complete line, without its terminator.
    Line(String),
    /// A line longer than the limit; carries its full length in bytes.
    Oversize(usize),
    /// A line that was not valid UTF-8.
    NotUtf8,
}

/// Incremental splitter fed from a buffered reader's chunks.
#[derive(Debug)]
pub struct LineFramer {
    buf: Vec<u8>,
    max_len: usize,
    /// Length of the current line once it has gone over the limit.
    overflow: Option<usize>,
}

impl LineFramer {
    /// Frame lines of at most `max_len` bytes, excluding the terminator.
    pub fn new(max_len: usize) -> Self {
        Self {
            buf: Vec::new(),
            max_len,
            overflow: None,
        }
    }

    /// Consume bytes from `chunk`, stopping after the first newline.
    ///
    /// Returns how many bytes were used and the frame that newline
    /// completed, if any.
    pub fn feed(&mut self, chunk: &[u8]) -> (usize, Option<Frame>) {
        match chunk.iter().position(|&byte| byte == b'\n') {
            Some(end) => {
                self.extend(&chunk[..end]);
                (end + 1, Some(self.take()))
            }
            None => {
                self.extend(chunk);
                (chunk.len(), None)
            }
        }
    }

    /// Flush a final line that had no terminator.
    pub fn finish(&mut self) -> Option<Frame> {
        if self.buf.is_empty() && self.overflow.is_none() {
            None
        } else {
            Some(self.take())
        }
    }

    fn extend(&mut self, bytes: &[u8]) {
        if let Some(seen) = self.overflow.as_mut() {
            *seen += bytes.len();
            return;
        }
        // One extra byte of room for a trailing `\r`.
        let len = self.buf.len() + bytes.len();
        if len > self.max_len + 1 {
            self.overflow = Some(len);
            self.buf = Vec::new();
        } else {
            self.buf.extend_from_slice(bytes);
        }
    }

    fn take(&mut self) -> Frame {
        let mut line = std::mem::take(&mut self.buf);
        if let Some(len) = self.overflow.take() {
            return Frame::Oversize(len);
        }
        if line.last() == Some(&b'\r') {
            line.pop();
        }
        if line.len() > self.max_len {
            return Frame::Oversize(line.len());
        }
        match String::from_utf8(line) {
            Ok(line) => Frame::Line(line),
            Err(_) => Frame::NotUtf8,
        }
    }

    #[cfg(test)]
    fn buffered(&self) -> usize {
        self.buf.len()
    }
}
