use crate::data::EventData;
use crate::event::Level;
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;

/// Message template used for every event record. It names no property, so
/// renderers can recognise event-shaped records by it.
pub const EVENT_DATA_TEMPLATE: &str = "{@EventData}";

/// Property holding the event name.
pub const EVENT_NAME: &str = "EventName";
/// Property holding the name of the logger that produced the record.
pub const SOURCE_CONTEXT: &str = "SourceContext";
pub const APPLICATION_VERSION: &str = "ApplicationVersion";
pub const ENVIRONMENT: &str = "Environment";

/// A fully merged record, ready for a sink.
#[derive(Debug, Clone, Serialize)]
pub struct LogRecord {
    pub timestamp: DateTime<Utc>,
    pub level: Level,
    pub message_template: String,
    pub properties: EventData,
    pub exception: Option<String>,
}

impl LogRecord {
    pub fn event_name(&self) -> Option<&str> {
        self.properties.get(EVENT_NAME).and_then(Value::as_str)
    }

    pub fn logger_name(&self) -> Option<&str> {
        self.properties.get(SOURCE_CONTEXT).and_then(Value::as_str)
    }

    /// Render the message template against the record properties.
    ///
    /// Holes such as `{Name}`, `{@Name}` or `{Name:format}` are replaced by
    /// the property value; holes naming a missing property stay as written.
    /// `{{` and `}}` produce literal braces.
    pub fn render_message(&self) -> String {
        let template = self.message_template.as_str();
        let mut out = String::with_capacity(template.len());
        let mut rest = template;

        while let Some(pos) = rest.find(['{', '}']) {
            out.push_str(&rest[..pos]);
            let tail = &rest[pos..];

            if tail.starts_with("{{") || tail.starts_with("}}") {
                out.push_str(&tail[..1]);
                rest = &tail[2..];
                continue;
            }
            if tail.starts_with('}') {
                out.push('}');
                rest = &tail[1..];
                continue;
            }

            match tail.find('}') {
                Some(end) => {
                    let hole = &tail[..=end];
                    match self.properties.get(property_name(&tail[1..end])) {
                        Some(value) => out.push_str(&render_value(value)),
                        None => out.push_str(hole),
                    }
                    rest = &tail[end + 1..];
                }
                None => {
                    out.push_str(tail);
                    rest = "";
                }
            }
        }

        out.push_str(rest);
        out
    }
}

fn property_name(hole: &str) -> &str {
    let name = hole.trim_start_matches(['@', '$']);
    let end = name.find([':', ',']).unwrap_or(name.len());
    name[..end].trim()
}

fn render_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
