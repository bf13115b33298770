//! Sink over any `Write` implementation

use crate::core::{LogRecord, Result, Sink};
use parking_lot::Mutex;
use std::io::Write;

/// Writes one line per record to an arbitrary writer.
///
/// Useful for in-memory capture (`Vec<u8>`) or for wrapping an already
/// opened handle.
///
/// ```
/// use rust_async_logger::sinks::StreamSink;
/// use rust_async_logger::{LineFormatter, LogLevel, LogRecord, Sink};
///
/// let sink = StreamSink::new("memory", Vec::new());
/// let record = LogRecord::new(LogLevel::Info, "hello", &LineFormatter::default());
/// sink.write(&record).unwrap();
///
/// let text = sink.with_writer(|buf| String::from_utf8_lossy(buf).into_owned());
/// assert!(text.ends_with("hello\n"));
/// ```
pub struct StreamSink<W: Write + Send> {
    name: String,
    writer: Mutex<W>,
}

impl<W: Write + Send> StreamSink<W> {
    pub fn new(name: impl Into<String>, writer: W) -> Self {
        Self {
            name: name.into(),
            writer: Mutex::new(writer),
        }
    }

    /// Run `f` with exclusive access to the underlying writer
    pub fn with_writer<R>(&self, f: impl FnOnce(&mut W) -> R) -> R {
        f(&mut self.writer.lock())
    }

    pub fn into_inner(self) -> W {
        self.writer.into_inner()
    }
}

impl<W: Write + Send> Sink for StreamSink<W> {
    fn write(&self, record: &LogRecord) -> Result<()> {
        let mut writer = self.writer.lock();
        writer.write_all(record.line().as_bytes())?;
        writer.write_all(b"\n")?;
        Ok(())
    }

    fn flush(&self) -> Result<()> {
        self.writer.lock().flush()?;
        Ok(())
    }

    fn name(&self) -> &str {
        &self.name
    }
}
