//! Output sinks

use parking_lot::Mutex;
use std::io::{self, Write};
use std::str::FromStr;
use std::sync::Arc;

/// Destination for text the host shows the user
#[cfg_attr(test, mockall::automock)]
pub trait OutputSink: Send + Sync {
    /// Write text as-is
    fn write_text(&self, text: &str) -> io::Result<()>;

    /// Flush buffered text
    fn flush(&self) -> io::Result<()> {
        Ok(())
    }
}

/// Writes to standard output
#[derive(Debug, Clone, Copy, Default)]
pub struct StdoutSink;

impl OutputSink for StdoutSink {
    fn write_text(&self, text: &str) -> io::Result<()> {
        io::stdout().lock().write_all(text.as_bytes())
    }

    fn flush(&self) -> io::Result<()> {
        io::stdout().lock().flush()
    }
}

/// Writes to standard error
#[derive(Debug, Clone, Copy, Default)]
pub struct StderrSink;

impl OutputSink for StderrSink {
    fn write_text(&self, text: &str) -> io::Result<()> {
        io::stderr().lock().write_all(text.as_bytes())
    }

    fn flush(&self) -> io::Result<()> {
        io::stderr().lock().flush()
    }
}

/// Collects text in memory; clones share the buffer
#[derive(Debug, Clone, Default)]
pub struct BufferSink {
    buffer: Arc<Mutex<String>>,
}

impl BufferSink {
    /// Create an empty buffer
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything written so far
    pub fn contents(&self) -> String {
        self.buffer.lock().clone()
    }

    /// Everything written so far, clearing the buffer
    pub fn take(&self) -> String {
        std::mem::take(&mut *self.buffer.lock())
    }
}

impl OutputSink for BufferSink {
    fn write_text(&self, text: &str) -> io::Result<()> {
        self.buffer.lock().push_str(text);
        Ok(())
    }
}

/// Output target named in configuration
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputTarget {
    /// Standard output
    #[default]
    Stdout,
    /// Standard error
    Stderr,
}

impl OutputTarget {
    /// Sink writing to this target
    pub fn sink(self) -> Arc<dyn OutputSink> {
        match self {
            OutputTarget::Stdout => Arc::new(StdoutSink),
            OutputTarget::Stderr => Arc::new(StderrSink),
        }
    }
}

impl FromStr for OutputTarget {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "stdout" => Ok(OutputTarget::Stdout),
            "stderr" => Ok(OutputTarget::Stderr),
            other => Err(format!("unknown output target '{other}'")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_buffer_sink_shares_buffer() {
        let sink = BufferSink::new();
        let clone = sink.clone();

        clone.write_text("hello ").unwrap();
        sink.write_text("world").unwrap();

        assert_eq!(sink.contents(), "hello world");
        assert_eq!(clone.take(), "hello world");
        assert!(sink.contents().is_empty());
    }

    #[test]
    fn test_output_target_parse() {
        assert_eq!("STDERR".parse::<OutputTarget>().unwrap(), OutputTarget::Stderr);
        assert!("printer".parse::<OutputTarget>().is_err());
    }

    #[test]
    fn test_mock_sink() {
        let mut mock = MockOutputSink::new();
        mock.expect_write_text()
            .withf(|text| text == "> ")
            .times(1)
            .returning(|_| Ok(()));

        mock.write_text("> ").unwrap();
    }
}
