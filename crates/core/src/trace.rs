//! Per-request diagnostic trace.
//!
//! Each webhook invocation accumulates an ordered list of human-readable
//! lines and flushes them once into the HTTP response body, so the channel
//! caller can observe the whole decision chain without log access.

#[derive(Clone, Debug, Default)]
pub struct RequestTrace {
    lines: Vec<String>,
}

impl RequestTrace {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, line: impl Into<String>) {
        self.lines.push(line.into());
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// Consumes the trace at the request boundary.
    pub fn into_lines(self) -> Vec<String> {
        self.lines
    }
}
