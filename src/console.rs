use crate::format::JsonEventFormatter;
use crate::record::LogRecord;
use crate::sink::LogSink;
use async_trait::async_trait;
use std::error::Error;
use std::io::{self, Write};
use std::sync::{Mutex, PoisonError};

/// Writes each record as one JSON line to stdout or any other writer.
pub struct ConsoleSink {
    formatter: JsonEventFormatter,
    writer: Mutex<Box<dyn Write + Send>>,
}

impl ConsoleSink {
    pub fn stdout(formatter: JsonEventFormatter) -> Self {
        Self::new(formatter, Box::new(io::stdout()))
    }

    pub fn new(formatter: JsonEventFormatter, writer: Box<dyn Write + Send>) -> Self {
        ConsoleSink {
            formatter,
            writer: Mutex::new(writer),
        }
    }
}

#[async_trait]
impl LogSink for ConsoleSink {
    async fn send(&self, record: &LogRecord) -> Result<(), Box<dyn Error + Send + Sync>> {
        let line = self.formatter.render(record);
        let mut writer = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        writer.write_all(line.as_bytes())?;
        Ok(())
    }

    async fn flush(&self) -> Result<(), Box<dyn Error + Send + Sync>> {
        self.writer
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .flush()?;
        Ok(())
    }
}
