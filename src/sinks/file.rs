//! File sink implementation

use crate::core::{LogRecord, LoggerError, Result, Sink};
use parking_lot::Mutex;
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// How an existing file is treated when the sink opens it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FileMode {
    #[default]
    Append,
    Truncate,
}

pub struct FileSink {
    name: String,
    path: PathBuf,
    writer: Mutex<BufWriter<File>>,
    auto_flush: bool,
}

impl FileSink {
    /// Open `path` in append mode, creating it if needed
    pub fn new(path: impl Into<PathBuf>) -> Result<Self> {
        Self::with_mode(path, FileMode::Append)
    }

    /// Open `path`, discarding any existing content
    pub fn truncate(path: impl Into<PathBuf>) -> Result<Self> {
        Self::with_mode(path, FileMode::Truncate)
    }

    /// Open `path` once, up front. A missing parent directory or a
    /// permission problem fails here rather than on the first write.
    pub fn with_mode(path: impl Into<PathBuf>, mode: FileMode) -> Result<Self> {
        let path = path.into();
        let mut options = OpenOptions::new();
        options.create(true);
        match mode {
            FileMode::Append => options.append(true),
            FileMode::Truncate => options.write(true).truncate(true),
        };

        let file = options
            .open(&path)
            .map_err(|e| LoggerError::sink_open(path.display().to_string(), e))?;

        Ok(Self {
            name: format!("file:{}", path.display()),
            path,
            writer: Mutex::new(BufWriter::new(file)),
            auto_flush: false,
        })
    }

    /// Flush after every record instead of relying on buffer pressure
    #[must_use]
    pub fn with_auto_flush(mut self, auto_flush: bool) -> Self {
        self.auto_flush = auto_flush;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Sink for FileSink {
    fn write(&self, record: &LogRecord) -> Result<()> {
        let mut output = String::with_capacity(record.line().len() + 1);
        output.push_str(record.line());
        output.push('\n');

        // The whole line goes out under one lock acquisition
        let mut writer = self.writer.lock();
        writer.write_all(output.as_bytes())?;
        if self.auto_flush {
            writer.flush()?;
        }
        Ok(())
    }

    fn flush(&self) -> Result<()> {
        self.writer.lock().flush()?;
        Ok(())
    }

    /// `file:<path>`, so one of several file sinks can be told apart
    fn name(&self) -> &str {
        &self.name
    }
}

impl Drop for FileSink {
    fn drop(&mut self) {
        // Ensure all buffered data is flushed to disk
        let _ = self.writer.get_mut().flush();
    }
}
