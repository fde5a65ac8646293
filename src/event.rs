use crate::data::EventData;
use crate::error::{EventLoggerError, FlattenError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

/// Importance of an event, lowest first.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Severity {
    Debug,
    #[default]
    Information,
    Warning,
    Error,
    Alert,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Severity::Debug => "Debug",
            Severity::Information => "Information",
            Severity::Warning => "Warning",
            Severity::Error => "Error",
            Severity::Alert => "Alert",
        })
    }
}

impl FromStr for Severity {
    type Err = EventLoggerError;

    /// Parse a severity name, ignoring ASCII case.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "debug" => Ok(Severity::Debug),
            "information" | "info" => Ok(Severity::Information),
            "warning" | "warn" => Ok(Severity::Warning),
            "error" => Ok(Severity::Error),
            "alert" => Ok(Severity::Alert),
            _ => Err(EventLoggerError::UnknownSeverity(s.to_string())),
        }
    }
}

/// Level written on rendered records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum Level {
    Debug,
    Information,
    Warning,
    Error,
    Fatal,
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Level::Debug => "Debug",
            Level::Information => "Information",
            Level::Warning => "Warning",
            Level::Error => "Error",
            Level::Fatal => "Fatal",
        })
    }
}

impl From<Severity> for Level {
    fn from(severity: Severity) -> Self {
        match severity {
            Severity::Debug => Level::Debug,
            Severity::Information => Level::Information,
            Severity::Warning => Level::Warning,
            Severity::Error => Level::Error,
            Severity::Alert => Level::Fatal,
        }
    }
}

/// One structured occurrence: a name, flattened data, a severity and the
/// moment it was created.
///
/// `with` and `with_data` consume the event, so all additions happen before
/// it is handed to a logger.
#[derive(Debug, Clone)]
pub struct Event {
    name: String,
    data: EventData,
    severity: Severity,
    stamp: DateTime<Utc>,
}

impl Event {
    /// Create an `Information` event stamped with the current time.
    pub fn new(name: impl Into<String>, data: EventData) -> Self {
        Event {
            name: name.into(),
            data,
            severity: Severity::Information,
            stamp: Utc::now(),
        }
    }

    /// Create an event whose data is the flattened form of `data`.
    pub fn from_serialize<T>(name: impl Into<String>, data: &T) -> Result<Self, FlattenError>
    where
        T: Serialize + ?Sized,
    {
        Ok(Self::new(name, EventData::from_serialize(data)?))
    }

    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }

    pub fn with_stamp(mut self, stamp: DateTime<Utc>) -> Self {
        self.stamp = stamp;
        self
    }

    /// Set a single property, replacing any existing value.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.data.insert(key, value);
        self
    }

    /// Apply every entry of `additional` over the event data.
    pub fn with_data(mut self, additional: EventData) -> Self {
        self.data.merge(additional);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn data(&self) -> &EventData {
        &self.data
    }

    pub fn severity(&self) -> Severity {
        self.severity
    }

    pub fn stamp(&self) -> DateTime<Utc> {
        self.stamp
    }

    pub(crate) fn into_parts(self) -> (String, EventData, Severity, DateTime<Utc>) {
        (self.name, self.data, self.severity, self.stamp)
    }
}

impl PartialEq for Event {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.data == other.data && self.severity == other.severity
    }
}
