//! Record source abstraction for receiving diagnostic log messages.
//!
//! This module provides a trait-based abstraction for receiving raw records
//! from various transports (dump files, TCP streams, in-process channels).

mod channel;
mod file;
mod record;
mod stream;

pub use channel::ChannelSource;
pub use file::FileSource;
pub use record::LogRecord;
pub use stream::StreamSource;

use std::fmt::Debug;

/// Trait for receiving diagnostic records from various transports.
///
/// # Example
///
/// ```
/// use hzwatch::{FileSource, RecordSource};
///
/// let mut source = FileSource::new("statistics.log");
/// if let Some(record) = source.poll() {
///     println!("Got {} bytes", record.msg.len());
/// }
/// ```
pub trait RecordSource: Send + Debug {
    /// Poll for the next record.
    ///
    /// Returns `Some(record)` if one is waiting, `None` otherwise.
    /// Must not block.
    fn poll(&mut self) -> Option<LogRecord>;

    /// Returns a human-readable description of the source.
    ///
    /// Used for display in the TUI status bar.
    fn description(&self) -> &str;

    /// The last error the source ran into, if it has not recovered since.
    fn error(&self) -> Option<String>;
}
