//! Stream-based record source.
//!
//! Log records arrive as JSON objects, either newline-delimited on an async
//! byte stream (a TCP bridge forwarding `/rosout`) or one per message on a
//! bytes channel. Both transports feed the same decoder, which runs in a
//! background task and hands records to the polling side.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::sync::mpsc;
use tracing::debug;

use super::{LogRecord, RecordSource};

/// Records buffered between the decoder task and `poll()`.
const BUFFER_SIZE: usize = 256;

/// Most recent transport or decode error, shared between task and source.
#[derive(Debug, Clone, Default)]
struct ErrorSlot(Arc<Mutex<Option<String>>>);

impl ErrorSlot {
    fn lock(&self) -> MutexGuard<'_, Option<String>> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn set(&self, message: impl Into<String>) {
        *self.lock() = Some(message.into());
    }

    /// Record `message` unless a more specific error is already held.
    fn set_if_clear(&self, message: &str) {
        self.lock().get_or_insert_with(|| message.to_string());
    }

    fn clear(&self) {
        self.lock().take();
    }

    fn get(&self) -> Option<String> {
        self.lock().clone()
    }
}

/// Decoder half of a [`StreamSource`], moved into the background task.
struct Decoder {
    tx: mpsc::Sender<LogRecord>,
    errors: ErrorSlot,
    rejected: Arc<AtomicU64>,
}

impl Decoder {
    /// Decode one JSON record and forward it.
    ///
    /// Returns false once the source has been dropped.
    async fn deliver(&self, payload: &[u8]) -> bool {
        match serde_json::from_slice::<LogRecord>(payload) {
            Ok(record) => {
                self.errors.clear();
                self.tx.send(record).await.is_ok()
            }
            Err(e) => {
                self.rejected.fetch_add(1, Ordering::Relaxed);
                debug!("Skipping malformed log record: {}", e);
                self.errors.set(format!("Parse error: {}", e));
                true
            }
        }
    }
}

/// A record source that receives records from an async stream.
///
/// Payloads that are not valid records are counted and skipped; the stream
/// keeps going.
///
/// # Example with a byte stream
///
/// ```
/// use std::io::Cursor;
/// use hzwatch::StreamSource;
///
/// # tokio_test::block_on(async {
/// let data = b"{\"msg\": \"hello\"}\n";
/// let stream = Cursor::new(data.to_vec());
/// let source = StreamSource::spawn(stream, "example");
/// # });
/// ```
#[derive(Debug)]
pub struct StreamSource {
    receiver: mpsc::Receiver<LogRecord>,
    description: String,
    errors: ErrorSlot,
    rejected: Arc<AtomicU64>,
}

impl StreamSource {
    fn open(description: &str) -> (Decoder, Self) {
        let (tx, receiver) = mpsc::channel(BUFFER_SIZE);
        let errors = ErrorSlot::default();
        let rejected = Arc::new(AtomicU64::new(0));

        let decoder = Decoder {
            tx,
            errors: errors.clone(),
            rejected: rejected.clone(),
        };
        let source = Self {
            receiver,
            description: format!("stream: {}", description),
            errors,
            rejected,
        };
        (decoder, source)
    }

    /// Read newline-delimited records from `reader` in a background task.
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn<R>(reader: R, description: &str) -> Self
    where
        R: AsyncRead + Unpin + Send + 'static,
    {
        let (decoder, source) = Self::open(description);

        tokio::spawn(async move {
            let mut lines = BufReader::new(reader).split(b'\n');
            loop {
                match lines.next_segment().await {
                    Ok(Some(line)) => {
                        let payload = line.trim_ascii();
                        if !payload.is_empty() && !decoder.deliver(payload).await {
                            return;
                        }
                    }
                    Ok(None) => {
                        decoder.errors.set("Connection closed");
                        return;
                    }
                    Err(e) => {
                        decoder.errors.set(format!("Read error: {}", e));
                        return;
                    }
                }
            }
        });

        source
    }

    /// Decode records arriving whole on a bytes channel, one JSON object
    /// per message.
    pub fn from_bytes_channel(mut rx: mpsc::Receiver<Vec<u8>>, description: &str) -> Self {
        let (decoder, source) = Self::open(description);

        tokio::spawn(async move {
            while let Some(bytes) = rx.recv().await {
                if !decoder.deliver(&bytes).await {
                    return;
                }
            }
            decoder.errors.set("Channel closed");
        });

        source
    }

    /// Number of payloads that could not be decoded so far.
    pub fn rejected(&self) -> u64 {
        self.rejected.load(Ordering::Relaxed)
    }
}

impl RecordSource for StreamSource {
    fn poll(&mut self) -> Option<LogRecord> {
        match self.receiver.try_recv() {
            Ok(record) => Some(record),
            Err(mpsc::error::TryRecvError::Empty) => None,
            Err(mpsc::error::TryRecvError::Disconnected) => {
                self.errors.set_if_clear("Stream disconnected");
                None
            }
        }
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn error(&self) -> Option<String> {
        self.errors.get()
    }
}
