//! Sink implementations

pub mod console;
pub mod file;
pub mod stream;

pub use console::{ConsoleSink, ConsoleTarget};
pub use file::{FileMode, FileSink};
pub use stream::StreamSink;

pub use crate::core::{SharedSink, Sink};
