use crate::event::Event;
use crate::logger::{EventLogging, EventTarget};
use std::sync::{Arc, Mutex, PoisonError};

#[derive(Default)]
struct Recorder {
    events: Mutex<Vec<Event>>,
}

impl EventTarget for Recorder {
    fn log(&self, event: Event, exception: Option<String>) {
        tracing::debug!(
            event = event.name(),
            severity = %event.severity(),
            data = ?event.data(),
            exception = exception.as_deref(),
            "event recorded"
        );
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event);
    }
}

/// Logger that writes nowhere and keeps every event it produces.
///
/// Meant for code under test: inject it where an [`EventLogging`]
/// implementation is expected and inspect [`logged_events`] afterwards.
/// Recorded events carry their own data only; scope data is not merged.
///
/// [`logged_events`]: NullEventLogger::logged_events
#[derive(Clone)]
pub struct NullEventLogger {
    name: String,
    recorder: Arc<Recorder>,
    target: Arc<dyn EventTarget>,
}

impl NullEventLogger {
    pub fn new(name: impl Into<String>) -> Self {
        let recorder = Arc::new(Recorder::default());
        NullEventLogger {
            name: name.into(),
            target: recorder.clone(),
            recorder,
        }
    }

    pub fn logged_events(&self) -> Vec<Event> {
        self.recorder
            .events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn clear(&self) {
        self.recorder
            .events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

impl Default for NullEventLogger {
    fn default() -> Self {
        Self::new("null")
    }
}

impl EventLogging for NullEventLogger {
    fn name(&self) -> &str {
        &self.name
    }

    fn target(&self) -> &Arc<dyn EventTarget> {
        &self.target
    }
}
