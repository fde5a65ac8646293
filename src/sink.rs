use crate::record::LogRecord;
use async_trait::async_trait;
use std::error::Error;
use std::sync::{Mutex, PoisonError};

/// Asynchronous destination for [`LogRecord`]s.
///
/// Implementations transport records to a concrete backend (console,
/// HTTP event collector, etc). The [`Dispatcher`] calls `send` from a
/// background task and never awaits it on the caller's thread.
///
/// [`Dispatcher`]: crate::dispatch::Dispatcher
#[async_trait]
pub trait LogSink: Send + Sync {
    /// Send a single log record to the underlying backend.
    ///
    /// **Returns**
    /// - `Ok(())` if the record was accepted by the backend.
    /// - `Err(..)` if the backend failed. The dispatcher treats this as a
    ///   transient failure and retries the batch with backoff.
    async fn send(&self, record: &LogRecord) -> Result<(), Box<dyn Error + Send + Sync>>;

    /// Flush any buffered records, if the backend implements buffering.
    ///
    /// Default implementation is a no-op.
    async fn flush(&self) -> Result<(), Box<dyn Error + Send + Sync>> {
        Ok(())
    }
}

/// Synchronous, fire-and-forget entry point used by event loggers.
///
/// `emit` must not block on I/O; buffering and backpressure belong to the
/// implementation.
pub trait EventSink: Send + Sync {
    fn emit(&self, record: LogRecord);
}

/// Keeps every emitted record in memory, in emission order.
#[derive(Debug, Default)]
pub struct MemorySink {
    records: Mutex<Vec<LogRecord>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of all records emitted so far.
    pub fn records(&self) -> Vec<LogRecord> {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Remove and return all records emitted so far.
    pub fn take(&self) -> Vec<LogRecord> {
        std::mem::take(&mut *self.records.lock().unwrap_or_else(PoisonError::into_inner))
    }
}

impl EventSink for MemorySink {
    fn emit(&self, record: LogRecord) {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(record);
    }
}
