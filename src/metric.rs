use crate::data::EventData;
use crate::event::Event;
use crate::logger::EventTarget;
use chrono::{SecondsFormat, Utc};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use std::time::Instant;

/// Property carrying a gauge movement.
pub const DELTA: &str = "Delta";
/// Property carrying the timer start, as RFC 3339 text.
pub const START_TIME: &str = "StartTime";
/// Property carrying the elapsed time of a timer.
pub const ELAPSED_MILLISECONDS: &str = "ElapsedMilliseconds";

enum Pending {
    Reverse { event: Event, delta: i64 },
    Elapsed { event: Event, started: Instant },
}

/// A measurement in progress, returned by `move_gauge` and `start_timer`.
///
/// Properties added with [`add`](ScopedMetric::add) are merged over the
/// terminal event, which is emitted exactly once: on [`finish`] or when the
/// handle is dropped. Leaking the handle (e.g. `mem::forget`) means the
/// terminal event is never emitted.
///
/// [`finish`]: ScopedMetric::finish
#[must_use = "the terminal event is emitted when the metric is dropped"]
pub struct ScopedMetric {
    target: Arc<dyn EventTarget>,
    pending: Option<Pending>,
    data: EventData,
}

impl ScopedMetric {
    /// Re-emit `event` on release with its `Delta` negated.
    pub(crate) fn reverse(target: Arc<dyn EventTarget>, event: Event, delta: i64) -> Self {
        Self::with_pending(target, Some(Pending::Reverse { event, delta }))
    }

    /// Emit `event` on release with its start time and elapsed milliseconds.
    pub(crate) fn elapsed(target: Arc<dyn EventTarget>, event: Event) -> Self {
        let started = Instant::now();
        Self::with_pending(target, Some(Pending::Elapsed { event, started }))
    }

    /// A handle that emits nothing.
    pub(crate) fn inert(target: Arc<dyn EventTarget>) -> Self {
        Self::with_pending(target, None)
    }

    fn with_pending(target: Arc<dyn EventTarget>, pending: Option<Pending>) -> Self {
        ScopedMetric {
            target,
            pending,
            data: EventData::new(),
        }
    }

    /// Attach a property to the terminal event.
    pub fn add(&mut self, key: impl Into<String>, value: impl Into<Value>) -> &mut Self {
        self.data.insert(key, value);
        self
    }

    pub fn data(&self) -> &EventData {
        &self.data
    }

    /// Emit the terminal event now.
    pub fn finish(self) {}

    fn finalize(&mut self) {
        let Some(pending) = self.pending.take() else {
            return;
        };

        let event = match pending {
            Pending::Reverse { event, delta } => event
                .with_stamp(Utc::now())
                .with(DELTA, delta.saturating_neg()),
            Pending::Elapsed { event, started } => {
                let start_time = event.stamp().to_rfc3339_opts(SecondsFormat::Micros, true);
                let elapsed = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
                event
                    .with_stamp(Utc::now())
                    .with(START_TIME, start_time)
                    .with(ELAPSED_MILLISECONDS, elapsed)
            }
        };

        self.target
            .log(event.with_data(std::mem::take(&mut self.data)), None);
    }
}

impl Drop for ScopedMetric {
    fn drop(&mut self) {
        self.finalize();
    }
}

impl fmt::Debug for ScopedMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScopedMetric")
            .field("pending", &self.pending.is_some())
            .field("data", &self.data)
            .finish()
    }
}
