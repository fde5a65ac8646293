use crate::init::DispatchConfig;
use crate::record::LogRecord;
use crate::sink::{EventSink, LogSink};
use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc,
};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{interval, sleep, Duration, MissedTickBehavior};

/// [`EventSink`] that hands records to an asynchronous [`LogSink`] via a
/// bounded channel and a background task.
///
/// `emit` never blocks: when the channel is full the record is dropped and
/// counted. The background task sends records in batches, in the order
/// they were emitted, and drains what is left once every `Dispatcher`
/// handle has been dropped.
pub struct Dispatcher {
    sender: mpsc::Sender<LogRecord>,
    /// Total records handed to `emit`.
    pub total_records: Arc<AtomicU64>,
    /// Dropped because the channel was full or closed, or because the sink
    /// kept failing.
    pub dropped_records: Arc<AtomicU64>,
    /// Accepted by the sink.
    pub delivered_records: Arc<AtomicU64>,
}

impl Dispatcher {
    /// Create a dispatcher and spawn its background task on the current
    /// tokio runtime.
    ///
    /// Minimal thresholds are enforced for `channel_buffer`, `batch_size`
    /// and `flush_interval` to avoid degenerate configurations.
    pub fn new(sink: Arc<dyn LogSink>, config: &DispatchConfig) -> (Self, JoinHandle<()>) {
        let buffer = config.channel_buffer.max(16);
        let batch_size = config.batch_size.max(1);
        let flush_interval = config.flush_interval.max(Duration::from_millis(10));
        let max_retries = config.max_retries;

        let (tx, mut rx) = mpsc::channel::<LogRecord>(buffer);

        let total_records = Arc::new(AtomicU64::new(0));
        let dropped_records = Arc::new(AtomicU64::new(0));
        let delivered_records = Arc::new(AtomicU64::new(0));
        let counters = Counters {
            delivered: Arc::clone(&delivered_records),
            dropped: Arc::clone(&dropped_records),
        };

        let handle = tokio::spawn(async move {
            let mut batch = Vec::with_capacity(batch_size);
            let mut ticker = interval(flush_interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    maybe = rx.recv() => match maybe {
                        Some(record) => {
                            batch.push(record);
                            if batch.len() >= batch_size {
                                send_batch(&*sink, &mut batch, max_retries, &counters).await;
                            }
                        }
                        None => {
                            send_batch(&*sink, &mut batch, max_retries, &counters).await;
                            if let Err(e) = sink.flush().await {
                                tracing::warn!(error = %e, "log sink flush failed");
                            }
                            break;
                        }
                    },
                    _ = ticker.tick() => {
                        if !batch.is_empty() {
                            send_batch(&*sink, &mut batch, max_retries, &counters).await;
                        }
                    }
                }
            }
        });

        (
            Self {
                sender: tx,
                total_records,
                dropped_records,
                delivered_records,
            },
            handle,
        )
    }
}

struct Counters {
    delivered: Arc<AtomicU64>,
    dropped: Arc<AtomicU64>,
}

impl EventSink for Dispatcher {
    fn emit(&self, record: LogRecord) {
        self.total_records.fetch_add(1, Ordering::Relaxed);
        if let Err(e) = self.sender.try_send(record) {
            self.dropped_records.fetch_add(1, Ordering::Relaxed);
            tracing::warn!(error = %e, "log channel unavailable, dropping log record");
        }
    }
}

/// Send every record in `batch` in order. A failing record is retried with
/// capped exponential backoff up to `max_retries` times, then dropped.
async fn send_batch(
    sink: &dyn LogSink,
    batch: &mut Vec<LogRecord>,
    max_retries: u32,
    counters: &Counters,
) {
    let max_backoff = Duration::from_secs(10);

    for record in batch.drain(..) {
        let mut backoff = Duration::from_millis(100);
        let mut attempt = 0;
        loop {
            match sink.send(&record).await {
                Ok(()) => {
                    counters.delivered.fetch_add(1, Ordering::Relaxed);
                    break;
                }
                Err(e) if attempt < max_retries => {
                    attempt += 1;
                    tracing::warn!(error = %e, attempt, ?backoff, "log sink send failed, retrying");
                    sleep(backoff).await;
                    backoff = std::cmp::min(backoff * 2, max_backoff);
                }
                Err(e) => {
                    counters.dropped.fetch_add(1, Ordering::Relaxed);
                    tracing::error!(
                        error = %e,
                        event = record.event_name(),
                        "giving up on log record"
                    );
                    break;
                }
            }
        }
    }
}
