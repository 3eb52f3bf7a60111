//! Incremental Server-Sent Events decoding for streamed completions.

/// One decoded event payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SseEvent {
    /// A `data:` payload
    Data(String),
    /// The `[DONE]` terminator
    Done,
}

/// Line-buffered SSE decoder.
///
/// Network chunks may split an event, a line, or even a UTF-8 sequence, and
/// a single chunk may carry several events, so bytes are buffered until a
/// full line is available.
///
/// # Examples
///
/// ```
/// use scrivener_models::openai_compat::{SseDecoder, SseEvent};
///
/// let mut decoder = SseDecoder::default();
/// assert!(decoder.push(b"data: {\"a\"").is_empty());
/// assert_eq!(
///     decoder.push(b":1}\n\ndata: [DONE]\n\n"),
///     vec![SseEvent::Data("{\"a\":1}".to_string()), SseEvent::Done]
/// );
/// ```
#[derive(Debug, Default)]
pub struct SseDecoder {
    buffer: Vec<u8>,
    done: bool,
}

impl SseDecoder {
    /// Feeds bytes and returns every event completed by them.
    pub fn push(&mut self, bytes: &[u8]) -> Vec<SseEvent> {
        if self.done {
            return Vec::new();
        }
        self.buffer.extend_from_slice(bytes);

        let mut events = Vec::new();
        while let Some(newline) = self.buffer.iter().position(|b| *b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=newline).collect();
            let line = String::from_utf8_lossy(&line);
            let line = line.trim_end_matches(['\r', '\n']);

            if let Some(event) = Self::decode_line(line) {
                let is_done = event == SseEvent::Done;
                events.push(event);
                if is_done {
                    self.done = true;
                    self.buffer.clear();
                    break;
                }
            }
        }
        events
    }

    /// Flushes a trailing line left without a newline at end of stream.
    pub fn finish(&mut self) -> Vec<SseEvent> {
        if self.done || self.buffer.is_empty() {
            return Vec::new();
        }
        let rest = std::mem::take(&mut self.buffer);
        let line = String::from_utf8_lossy(&rest);
        Self::decode_line(line.trim_end_matches('\r'))
            .into_iter()
            .collect()
    }

    /// Whether `[DONE]` has been seen.
    pub fn is_done(&self) -> bool {
        self.done
    }

    fn decode_line(line: &str) -> Option<SseEvent> {
        // Comments, blank separators and non-data fields carry no content.
        let data = line.strip_prefix("data:")?.trim_start();
        if data.is_empty() {
            return None;
        }
        if data == "[DONE]" {
            Some(SseEvent::Done)
        } else {
            Some(SseEvent::Data(data.to_string()))
        }
    }
}
