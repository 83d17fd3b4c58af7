//! A minimal parser for `text/event-stream` bodies.
//!
//! Only the `event` and `data` fields are read. Comment lines (starting with `:`) are skipped, which is how the server
//! sends its heartbeats.

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SseEvent {
    /// The event name. `None` means the default `message` event.
    pub event: Option<String>,
    pub data: String,
}

/// Collects raw body chunks and hands back whole events as they complete. Chunks may split frames, lines and even
/// UTF-8 sequences at arbitrary points.
#[derive(Debug, Default)]
pub struct SseParser {
    buffer: Vec<u8>,
}

impl SseParser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, chunk: &[u8]) -> Vec<SseEvent> {
        self.buffer.extend(chunk.iter().filter(|b| **b != b'\r'));
        let mut events = Vec::new();
        while let Some(end) = self.buffer.windows(2).position(|w| w == b"\n\n") {
            let frame: Vec<u8> = self.buffer.drain(..end + 2).collect();
            if let Some(event) = parse_frame(&String::from_utf8_lossy(&frame[..end])) {
                events.push(event);
            }
        }
        events
    }

    /// Bytes received that do not yet form a complete frame.
    pub fn pending(&self) -> usize {
        self.buffer.len()
    }
}

fn parse_frame(frame: &str) -> Option<SseEvent> {
    let mut event = None;
    let mut data: Option<String> = None;
    for line in frame.lines() {
        if line.starts_with(':') {
            continue;
        }
        let (field, value) = match line.split_once(':') {
            Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
            None => (line, ""),
        };
        match field {
            "event" => event = Some(value.to_string()),
            "data" => match data.as_mut() {
                Some(d) => {
                    d.push('\n');
                    d.push_str(value);
                },
                None => data = Some(value.to_string()),
            },
            _ => {},
        }
    }
    data.map(|data| SseEvent { event, data })
}
