use crate::config::LoggingConfiguration;
use crate::data::EventData;
use crate::error::EventLoggerError;
use crate::event::{Event, Severity};
use crate::metric::{ScopedMetric, DELTA};
use crate::record::{LogRecord, EVENT_DATA_TEMPLATE, EVENT_NAME, SOURCE_CONTEXT};
use crate::scope::{self, ScopeGuard};
use crate::sink::EventSink;
use serde::Serialize;
use std::error::Error;
use std::fmt;
use std::sync::Arc;

/// Property carrying a counter increment.
pub const COUNT: &str = "Count";
/// Property carrying an absolute gauge value.
pub const VALUE: &str = "Value";

/// Receives finished events from a logger or a [`ScopedMetric`].
pub trait EventTarget: Send + Sync {
    /// `exception` is the full text of an attached error, if any.
    fn log(&self, event: Event, exception: Option<String>);
}

/// The event logging facade.
///
/// Implementors provide a name and a target; every operation is built on
/// top of those two. Data arguments are any `Serialize` value and are
/// flattened into dotted/indexed properties; pass `&()` for no data. Data
/// that cannot be serialized aborts that one call and is reported through
/// `tracing`.
pub trait EventLogging {
    /// Name of the logger, rendered as `LoggerName`.
    fn name(&self) -> &str;

    fn target(&self) -> &Arc<dyn EventTarget>;

    /// Log a named event with the given severity.
    fn log_event<D>(&self, name: &str, severity: Severity, data: &D)
    where
        D: Serialize + ?Sized,
    {
        if let Some(event) = build_event(name, data) {
            self.target().log(event.with_severity(severity), None);
        }
    }

    /// Log a named event whose properties were built up front. Entries are
    /// copied as they are, nested values included; passing an
    /// [`EventData`] through the `Serialize` parameters flattens it again.
    fn log_event_data(&self, name: &str, severity: Severity, data: EventData) {
        self.target()
            .log(Event::new(name, data).with_severity(severity), None);
    }

    /// Log a named event with an attached error. The error and its
    /// `source()` chain are rendered as text.
    fn log_error_event<D>(
        &self,
        name: &str,
        error: &(dyn Error + 'static),
        severity: Severity,
        data: &D,
    ) where
        D: Serialize + ?Sized,
    {
        if let Some(event) = build_event(name, data) {
            self.target()
                .log(event.with_severity(severity), Some(describe_error(error)));
        }
    }

    /// Begin a logical operation scope. Events logged while the returned
    /// guard is alive carry the flattened `state`.
    fn begin_scope<S>(&self, state: &S) -> Result<ScopeGuard, EventLoggerError>
    where
        S: Serialize + ?Sized,
    {
        let state = serde_json::to_value(state).map_err(crate::error::FlattenError::from)?;
        scope::push(self.name(), state)
    }

    /// A counter only ever goes up: requests served, tasks completed,
    /// errors seen.
    fn count<D>(&self, name: &str, count: i64, data: &D)
    where
        D: Serialize + ?Sized,
    {
        if let Some(event) = build_event(name, data) {
            self.target().log(event.with(COUNT, count), None);
        }
    }

    /// Record the current absolute value of a gauge.
    fn set_gauge<D>(&self, name: &str, value: i64, data: &D)
    where
        D: Serialize + ?Sized,
    {
        if let Some(event) = build_event(name, data) {
            self.target().log(event.with(VALUE, value), None);
        }
    }

    /// Move a gauge by `delta` now and back by `-delta` when the returned
    /// metric is released.
    fn move_gauge<D>(&self, name: &str, delta: i64, data: &D) -> ScopedMetric
    where
        D: Serialize + ?Sized,
    {
        let target = Arc::clone(self.target());
        match build_event(name, data) {
            Some(event) => {
                let event = event.with(DELTA, delta);
                target.log(event.clone(), None);
                ScopedMetric::reverse(target, event, delta)
            }
            None => ScopedMetric::inert(target),
        }
    }

    /// Start a stopwatch. Releasing the returned metric logs `StartTime`
    /// and `ElapsedMilliseconds`; nothing is logged at start.
    fn start_timer<D>(&self, name: &str, data: &D) -> ScopedMetric
    where
        D: Serialize + ?Sized,
    {
        let target = Arc::clone(self.target());
        match build_event(name, data) {
            Some(event) => ScopedMetric::elapsed(target, event),
            None => ScopedMetric::inert(target),
        }
    }

    fn debug_event<D: Serialize + ?Sized>(&self, name: &str, data: &D) {
        self.log_event(name, Severity::Debug, data);
    }

    fn info_event<D: Serialize + ?Sized>(&self, name: &str, data: &D) {
        self.log_event(name, Severity::Information, data);
    }

    fn warning_event<D: Serialize + ?Sized>(&self, name: &str, data: &D) {
        self.log_event(name, Severity::Warning, data);
    }

    fn warning_event_with_error<D: Serialize + ?Sized>(
        &self,
        name: &str,
        error: &(dyn Error + 'static),
        data: &D,
    ) {
        self.log_error_event(name, error, Severity::Warning, data);
    }

    fn error_event<D: Serialize + ?Sized>(&self, name: &str, data: &D) {
        self.log_event(name, Severity::Error, data);
    }

    fn error_event_with_error<D: Serialize + ?Sized>(
        &self,
        name: &str,
        error: &(dyn Error + 'static),
        data: &D,
    ) {
        self.log_error_event(name, error, Severity::Error, data);
    }

    fn alert_event<D: Serialize + ?Sized>(&self, name: &str, data: &D) {
        self.log_event(name, Severity::Alert, data);
    }

    fn alert_event_with_error<D: Serialize + ?Sized>(
        &self,
        name: &str,
        error: &(dyn Error + 'static),
        data: &D,
    ) {
        self.log_error_event(name, error, Severity::Alert, data);
    }
}

fn build_event<D>(name: &str, data: &D) -> Option<Event>
where
    D: Serialize + ?Sized,
{
    match Event::from_serialize(name, data) {
        Ok(event) => Some(event),
        Err(e) => {
            tracing::warn!(event = name, error = %e, "dropping event: data could not be flattened");
            None
        }
    }
}

/// Display text of `error` followed by one `Caused by:` line per source.
pub fn describe_error(error: &(dyn Error + 'static)) -> String {
    let mut text = error.to_string();
    let mut source = error.source();
    while let Some(cause) = source {
        text.push_str("\nCaused by: ");
        text.push_str(&cause.to_string());
        source = cause.source();
    }
    text
}

/// Merges events with the live scope chain and hands them to a sink.
struct SinkTarget {
    name: String,
    sink: Arc<dyn EventSink>,
    enrichers: EventData,
}

impl EventTarget for SinkTarget {
    fn log(&self, event: Event, exception: Option<String>) {
        let (event_name, mut properties, severity, stamp) = event.into_parts();

        properties.merge(scope::flatten_scope_chain(scope::current().as_deref()));
        properties.insert(EVENT_NAME, event_name);
        properties.insert(SOURCE_CONTEXT, self.name.clone());
        for (key, value) in self.enrichers.iter() {
            properties.insert_if_absent(key, value.clone());
        }

        self.sink.emit(LogRecord {
            timestamp: stamp,
            level: severity.into(),
            message_template: EVENT_DATA_TEMPLATE.to_string(),
            properties,
            exception,
        });
    }
}

/// Event logger that writes merged records to an [`EventSink`].
#[derive(Clone)]
pub struct EventLogger {
    name: String,
    target: Arc<dyn EventTarget>,
}

impl EventLogger {
    pub fn new(name: impl Into<String>, sink: Arc<dyn EventSink>) -> Self {
        Self::with_enrichers(name, sink, EventData::new())
    }

    /// Logger named after the type `T`.
    pub fn for_type<T: ?Sized>(sink: Arc<dyn EventSink>) -> Self {
        Self::new(Self::logger_name_for::<T>(), sink)
    }

    pub fn logger_name_for<T: ?Sized>() -> &'static str {
        std::any::type_name::<T>()
    }

    fn with_enrichers(name: impl Into<String>, sink: Arc<dyn EventSink>, enrichers: EventData) -> Self {
        let name = name.into();
        let target = Arc::new(SinkTarget {
            name: name.clone(),
            sink,
            enrichers,
        });
        EventLogger { name, target }
    }

    /// Log a pre-built event as is.
    pub fn log(&self, event: Event) {
        self.target.log(event, None);
    }
}

impl EventLogging for EventLogger {
    fn name(&self) -> &str {
        &self.name
    }

    fn target(&self) -> &Arc<dyn EventTarget> {
        &self.target
    }
}

impl fmt::Debug for EventLogger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventLogger").field("name", &self.name).finish()
    }
}

/// Creates named loggers that share one sink and the configuration
/// enrichers.
#[derive(Clone)]
pub struct EventLoggerFactory {
    sink: Arc<dyn EventSink>,
    enrichers: EventData,
}

impl EventLoggerFactory {
    pub fn new(sink: Arc<dyn EventSink>) -> Self {
        EventLoggerFactory {
            sink,
            enrichers: EventData::new(),
        }
    }

    /// Every logger adds `ApplicationVersion` and `Environment` from
    /// `config` unless the event already carries them.
    pub fn with_configuration(sink: Arc<dyn EventSink>, config: &LoggingConfiguration) -> Self {
        EventLoggerFactory {
            sink,
            enrichers: config.enrichers(),
        }
    }

    pub fn create(&self, name: impl Into<String>) -> EventLogger {
        EventLogger::with_enrichers(name, Arc::clone(&self.sink), self.enrichers.clone())
    }

    pub fn create_for<T: ?Sized>(&self) -> EventLogger {
        self.create(EventLogger::logger_name_for::<T>())
    }
}

impl fmt::Debug for EventLoggerFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventLoggerFactory")
            .field("enrichers", &self.enrichers)
            .finish()
    }
}
