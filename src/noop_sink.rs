use crate::record::LogRecord;
use crate::sink::{EventSink, LogSink};
use async_trait::async_trait;
use std::error::Error;

/// A sink that simply drops all records.
///
/// Useful for measuring the overhead of the loggers and the dispatcher
/// without any external I/O.
#[derive(Clone, Default)]
pub struct NoopSink;

#[async_trait]
impl LogSink for NoopSink {
    async fn send(&self, _record: &LogRecord) -> Result<(), Box<dyn Error + Send + Sync>> {
        Ok(())
    }
}

impl EventSink for NoopSink {
    fn emit(&self, _record: LogRecord) {}
}
