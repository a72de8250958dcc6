//! Channel-based record source.
//!
//! Receives records pushed by another part of the same process, e.g. a
//! message bus subscriber embedding the validator.

use tokio::sync::mpsc;

use super::{LogRecord, RecordSource};

/// A record source fed through an in-process channel.
///
/// # Example
///
/// ```
/// use hzwatch::{ChannelSource, LogRecord, RecordSource};
///
/// let (tx, mut source) = ChannelSource::create("rosout");
/// tx.try_send(LogRecord::anonymous("hello")).unwrap();
/// assert!(source.poll().is_some());
/// ```
#[derive(Debug)]
pub struct ChannelSource {
    receiver: mpsc::Receiver<LogRecord>,
    description: String,
    closed: bool,
}

impl ChannelSource {
    /// Default capacity used by [`ChannelSource::create`].
    pub const CAPACITY: usize = 64;

    /// Wrap the receiving end of an existing channel.
    pub fn new(receiver: mpsc::Receiver<LogRecord>, source_description: &str) -> Self {
        Self {
            receiver,
            description: format!("channel: {}", source_description),
            closed: false,
        }
    }

    /// Create a channel pair for sending records to a ChannelSource.
    pub fn create(source_description: &str) -> (mpsc::Sender<LogRecord>, Self) {
        let (tx, rx) = mpsc::channel(Self::CAPACITY);
        (tx, Self::new(rx, source_description))
    }
}

impl RecordSource for ChannelSource {
    fn poll(&mut self) -> Option<LogRecord> {
        match self.receiver.try_recv() {
            Ok(record) => Some(record),
            Err(mpsc::error::TryRecvError::Empty) => None,
            Err(mpsc::error::TryRecvError::Disconnected) => {
                self.closed = true;
                None
            }
        }
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn error(&self) -> Option<String> {
        self.closed.then(|| "Channel closed".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_source_poll_in_order() {
        let (tx, mut source) = ChannelSource::create("test");
        assert_eq!(source.description(), "channel: test");

        assert!(source.poll().is_none());

        tx.try_send(LogRecord::anonymous("first")).unwrap();
        tx.try_send(LogRecord::anonymous("second")).unwrap();

        assert_eq!(source.poll().unwrap().msg, "first");
        assert_eq!(source.poll().unwrap().msg, "second");
        assert!(source.poll().is_none());
        assert!(source.error().is_none());
    }

    #[test]
    fn test_channel_source_reports_close() {
        let (tx, mut source) = ChannelSource::create("test");
        tx.try_send(LogRecord::anonymous("last")).unwrap();
        drop(tx);

        // Buffered records are still delivered before the close is seen
        assert!(source.poll().is_some());
        assert!(source.poll().is_none());
        assert_eq!(source.error().as_deref(), Some("Channel closed"));
    }
}
