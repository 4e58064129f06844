//! Incremental decoding of `text/event-stream` response bodies.
//!
//! Network chunks arrive with no alignment guarantees: a frame delimiter or
//! even a single multi-byte character can be split across two chunks. The
//! decoder here is therefore stateful on both levels, holding an incomplete
//! UTF-8 suffix and an unterminated frame tail between calls.

pub(crate) const DATA_PREFIX: &str = "data:";
pub(crate) const DONE_SENTINEL: &str = "[DONE]";
pub(crate) const ERROR_SENTINEL: &str = "[ERROR]";

/// Streaming UTF-8 decoder.
///
/// An incomplete multi-byte sequence at the end of a chunk is held back and
/// completed by the next chunk. Invalid sequences become U+FFFD.
#[derive(Default)]
pub struct Utf8StreamDecoder {
    pending: Vec<u8>,
}

impl Utf8StreamDecoder {
    /// Decodes `chunk` together with any bytes held back from the previous
    /// call.
    pub fn decode(&mut self, chunk: &[u8]) -> String {
        let mut bytes = std::mem::take(&mut self.pending);
        bytes.extend_from_slice(chunk);

        let mut out = String::with_capacity(bytes.len());
        let mut rest = bytes.as_slice();
        loop {
            match std::str::from_utf8(rest) {
                Ok(text) => {
                    out.push_str(text);
                    break;
                }
                Err(err) => {
                    let valid = err.valid_up_to();
                    out.push_str(&String::from_utf8_lossy(&rest[..valid]));
                    match err.error_len() {
                        Some(bad) => {
                            out.push('\u{FFFD}');
                            rest = &rest[valid + bad..];
                        }
                        None => {
                            // Incomplete sequence at the end: wait for more bytes.
                            self.pending = rest[valid..].to_vec();
                            break;
                        }
                    }
                }
            }
        }
        out
    }

    /// Flushes a held-back partial sequence as replacement characters.
    ///
    /// Only meaningful at stream end, where no further bytes can complete it.
    pub fn finish(&mut self) -> String {
        let bytes = std::mem::take(&mut self.pending);
        String::from_utf8_lossy(&bytes).into_owned()
    }
}

/// Splits a decoded text stream into delimiter-bounded frames.
///
/// Frames end at the first blank line (`\n\n`, with `\r\n\r\n` tolerated).
/// Each extracted frame is removed from the accumulation buffer together
/// with its delimiter; frames are transient and not retained here.
#[derive(Default)]
pub struct FrameDecoder {
    utf8: Utf8StreamDecoder,
    buf: String,
}

impl FrameDecoder {
    /// Appends a raw network fragment and returns every frame now complete,
    /// in arrival order.
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<String> {
        self.buf.push_str(&self.utf8.decode(chunk));
        let mut frames = Vec::new();
        while let Some((idx, delim_len)) = find_frame_delimiter(&self.buf) {
            let frame = self.buf[..idx].to_string();
            self.buf.drain(..idx + delim_len);
            if !frame.trim().is_empty() {
                frames.push(frame);
            }
        }
        frames
    }

    /// Emits any remaining non-whitespace buffer content as a final frame.
    ///
    /// Call once, at stream end. Covers bodies whose last frame is closed by
    /// EOF instead of a trailing blank line.
    pub fn flush(&mut self) -> Option<String> {
        let tail = self.utf8.finish();
        self.buf.push_str(&tail);
        let rest = std::mem::take(&mut self.buf);
        if rest.trim().is_empty() {
            None
        } else {
            Some(rest)
        }
    }
}

fn find_frame_delimiter(buf: &str) -> Option<(usize, usize)> {
    let bytes = buf.as_bytes();
    let mut i = 0;
    while i + 1 < bytes.len() {
        if bytes[i] == b'\n' && bytes[i + 1] == b'\n' {
            return Some((i, 2));
        }
        if i + 3 < bytes.len()
            && bytes[i] == b'\r'
            && bytes[i + 1] == b'\n'
            && bytes[i + 2] == b'\r'
            && bytes[i + 3] == b'\n'
        {
            return Some((i, 4));
        }
        i += 1;
    }
    None
}

/// Classified content of one frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payload {
    /// Frame carried no `data:` content.
    Empty,
    /// Completion sentinel (`[DONE]`).
    Done,
    /// Stream-level error sentinel (`[ERROR]`).
    Error,
    /// Event payload; multi-line `data:` content rejoined with `\n`.
    Content(String),
}

/// Extracts and classifies the `data:` payload of one frame.
///
/// Sentinel comparison is exact-string: a payload that merely contains the
/// sentinel text is still `Content`.
pub fn classify_frame(frame: &str) -> Payload {
    let mut lines: Vec<&str> = Vec::new();
    for raw_line in frame.split('\n') {
        let line = raw_line.trim_end_matches('\r');
        if let Some(rest) = line.strip_prefix(DATA_PREFIX) {
            lines.push(rest.strip_prefix(' ').unwrap_or(rest));
        }
    }
    if lines.is_empty() {
        return Payload::Empty;
    }
    let payload = lines.join("\n");
    if payload.is_empty() {
        return Payload::Empty;
    }
    match payload.as_str() {
        DONE_SENTINEL => Payload::Done,
        ERROR_SENTINEL => Payload::Error,
        _ => Payload::Content(payload),
    }
}
