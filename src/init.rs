use crate::config::LoggingConfiguration;
use crate::dispatch::Dispatcher;
use crate::error::InitError;
use crate::logger::EventLoggerFactory;
use crate::sink::LogSink;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio::time::Duration;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::Registry;

/// Configuration of the dispatch pipeline between loggers and a sink.
///
/// **Fields**
/// - `channel_buffer`: maximum number of queued records before new ones
///   are dropped.
/// - `batch_size`: number of records sent per batch.
/// - `flush_interval`: maximum delay before a partial batch is sent.
/// - `max_retries`: how many times a failing record is retried before it
///   is dropped.
/// - `enable_self_log`: if `true`, install a `tracing_subscriber` fmt
///   layer on stderr so the crate's own diagnostics are visible.
#[derive(Clone, Debug)]
pub struct DispatchConfig {
    pub channel_buffer: usize,
    pub batch_size: usize,
    pub flush_interval: Duration,
    pub max_retries: u32,
    pub enable_self_log: bool,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            channel_buffer: 1024,
            batch_size: 128,
            flush_interval: Duration::from_secs(1),
            max_retries: 3,
            enable_self_log: false,
        }
    }
}

/// Install a global `tracing` subscriber that prints the crate's own
/// warnings and errors (dropped records, failing sinks) to stderr.
pub fn init_self_log() -> Result<(), InitError> {
    let fmt_layer = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);
    let subscriber = Registry::default().with(fmt_layer);
    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}

/// Wire `sink` behind a [`Dispatcher`] and return a factory for loggers
/// that write to it.
///
/// **Parameters**
/// - `sink`: transport that receives merged [`LogRecord`]s.
/// - `logging`: application settings; its version and environment are
///   added to every event.
/// - `dispatch`: buffering and batching behavior.
///
/// **Returns**
/// - The logger factory and the handle of the background task. The task
///   finishes once every logger (and the factory) has been dropped and
///   the remaining records were delivered.
///
/// Must be called from within a tokio runtime.
///
/// [`LogRecord`]: crate::record::LogRecord
pub fn init_event_logging_with_config(
    sink: Arc<dyn LogSink>,
    logging: &LoggingConfiguration,
    dispatch: DispatchConfig,
) -> Result<(EventLoggerFactory, JoinHandle<()>), InitError> {
    if dispatch.enable_self_log {
        init_self_log()?;
    }

    let (dispatcher, handle) = Dispatcher::new(sink, &dispatch);
    let factory = EventLoggerFactory::with_configuration(Arc::new(dispatcher), logging);
    Ok((factory, handle))
}

/// Equivalent to [`init_event_logging_with_config`] with
/// [`DispatchConfig::default`].
pub fn init_event_logging(
    sink: Arc<dyn LogSink>,
    logging: &LoggingConfiguration,
) -> Result<(EventLoggerFactory, JoinHandle<()>), InitError> {
    init_event_logging_with_config(sink, logging, DispatchConfig::default())
}
