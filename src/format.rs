use crate::config::EventSource;
use crate::data::{flatten_member, EventData};
use crate::record::{
    LogRecord, APPLICATION_VERSION, ENVIRONMENT, EVENT_DATA_TEMPLATE, EVENT_NAME, SOURCE_CONTEXT,
};
use chrono::{DateTime, Utc};
use serde_json::Value;
use std::io::{self, Write};

/// Properties written directly on the event object, in this order, rather
/// than under `Data`.
const EVENT_SOURCE_PROPERTIES: [&str; 4] = [EVENT_NAME, SOURCE_CONTEXT, APPLICATION_VERSION, ENVIRONMENT];

const LOGGER_NAME: &str = "LoggerName";
const SOURCE_TYPE: &str = "httpevent";

/// Renders records as single-line JSON payloads for an HTTP event
/// collector:
///
/// `{"time":"<epoch>","event":{"Severity":..,"EventName":..,"LoggerName":..,"Data":{..},"Exception":..,"Message":..},"source":..,"sourcetype":..,"host":..,"index":..}`
///
/// Everything after the event object is fixed per formatter and computed
/// once at construction.
#[derive(Clone, Debug)]
pub struct JsonEventFormatter {
    suffix: String,
}

impl Default for JsonEventFormatter {
    fn default() -> Self {
        Self::new(&EventSource::default(), None)
    }
}

fn quoted(s: &str) -> String {
    Value::String(s.to_owned()).to_string()
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

fn is_event_source_property(key: &str) -> bool {
    EVENT_SOURCE_PROPERTIES
        .iter()
        .any(|name| name.eq_ignore_ascii_case(key))
}

/// Seconds since the Unix epoch with millisecond precision, without
/// trailing zeros.
fn epoch_seconds(timestamp: &DateTime<Utc>) -> String {
    let millis = timestamp.timestamp_millis();
    let sign = if millis < 0 { "-" } else { "" };
    let millis = millis.unsigned_abs();
    let (seconds, fraction) = (millis / 1000, millis % 1000);
    if fraction == 0 {
        return format!("{sign}{seconds}");
    }
    format!("{sign}{seconds}.{fraction:03}")
        .trim_end_matches('0')
        .to_string()
}

impl JsonEventFormatter {
    /// Build a formatter. `source.application_name` adds `source` and
    /// `sourcetype`, `source.host` adds `host`, and `index` adds `index`;
    /// blank values are skipped.
    pub fn new(source: &EventSource, index: Option<&str>) -> Self {
        let mut suffix = String::from("}");

        if let Some(application) = non_blank(source.application_name.as_deref()) {
            suffix.push_str(",\"source\":");
            suffix.push_str(&quoted(application));
            suffix.push_str(",\"sourcetype\":");
            suffix.push_str(&quoted(SOURCE_TYPE));
        }
        if let Some(host) = non_blank(source.host.as_deref()) {
            suffix.push_str(",\"host\":");
            suffix.push_str(&quoted(host));
        }
        if let Some(index) = non_blank(index) {
            suffix.push_str(",\"index\":");
            suffix.push_str(&quoted(index));
        }

        suffix.push('}');
        JsonEventFormatter { suffix }
    }

    /// Text appended after the event object, closing braces included.
    pub fn suffix(&self) -> &str {
        &self.suffix
    }

    pub fn format<W: Write + ?Sized>(&self, record: &LogRecord, output: &mut W) -> io::Result<()> {
        output.write_all(self.render(record).as_bytes())
    }

    /// Render one record as a newline-terminated line.
    pub fn render(&self, record: &LogRecord) -> String {
        let mut out = String::with_capacity(256);
        out.push_str("{\"time\":\"");
        out.push_str(&epoch_seconds(&record.timestamp));
        out.push_str("\",\"event\":{\"Severity\":");
        out.push_str(&quoted(&record.level.to_string()));

        for name in EVENT_SOURCE_PROPERTIES {
            if let Some(value) = record.properties.get(name) {
                let label = if name == SOURCE_CONTEXT { LOGGER_NAME } else { name };
                out.push(',');
                out.push_str(&quoted(label));
                out.push(':');
                out.push_str(&value.to_string());
            }
        }

        let data = render_data(&record.properties);
        if !data.is_empty() {
            out.push_str(",\"Data\":{");
            for (i, (key, value)) in data.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                out.push_str(&quoted(key));
                out.push(':');
                out.push_str(&value.to_string());
            }
            out.push('}');
        }

        if let Some(exception) = &record.exception {
            out.push_str(",\"Exception\":");
            out.push_str(&quoted(exception));
        }

        let message = record.render_message();
        if !(message.trim().is_empty() || message == EVENT_DATA_TEMPLATE) {
            out.push_str(",\"Message\":");
            out.push_str(&quoted(&message));
        }

        out.push_str(&self.suffix);
        out.push('\n');
        out
    }
}

/// Properties that go under `Data`, with nested values flattened the same
/// way event data is.
fn render_data(properties: &EventData) -> EventData {
    let mut leaves = Vec::new();
    for (key, value) in properties.iter() {
        if !is_event_source_property(key) {
            flatten_member(key.to_string(), value, &mut leaves);
        }
    }
    leaves.into_iter().collect()
}
