use crate::data::EventData;
use crate::env::{
    env_opt, env_or, EVENT_LOG_APPLICATION_NAME_ENV, EVENT_LOG_APPLICATION_VERSION_ENV,
    EVENT_LOG_ENVIRONMENT_ENV, EVENT_LOG_INDEX_ENV, EVENT_LOG_SERVER_NAME_ENV,
};
use crate::format::JsonEventFormatter;
use crate::record::{APPLICATION_VERSION, ENVIRONMENT};
use serde::Deserialize;

/// Describes where events come from. Used by the JSON formatter to build
/// its static suffix.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EventSource {
    pub environment: Option<String>,
    pub application_name: Option<String>,
    pub application_version: Option<String>,
    pub host: Option<String>,
}

/// Application-level logging settings.
///
/// **Fields**
/// - `environment`: deployment environment, added to every event.
/// - `application_name`: rendered as `source` (with `sourcetype`).
/// - `application_version`: added to every event.
/// - `server_name`: rendered as `host`.
/// - `index`: target index, rendered as `index`.
///
/// Blank values are treated as absent.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct LoggingConfiguration {
    pub environment: String,
    pub application_name: Option<String>,
    pub application_version: Option<String>,
    pub server_name: Option<String>,
    pub index: Option<String>,
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.trim().is_empty())
}

impl LoggingConfiguration {
    pub fn new(environment: impl Into<String>) -> Self {
        LoggingConfiguration {
            environment: environment.into(),
            ..Self::default()
        }
    }

    /// Build a configuration from the `EVENT_LOG_*` variables in [`crate::env`].
    pub fn from_env() -> Self {
        LoggingConfiguration {
            environment: env_or(EVENT_LOG_ENVIRONMENT_ENV, ""),
            application_name: env_opt(EVENT_LOG_APPLICATION_NAME_ENV),
            application_version: env_opt(EVENT_LOG_APPLICATION_VERSION_ENV),
            server_name: env_opt(EVENT_LOG_SERVER_NAME_ENV),
            index: env_opt(EVENT_LOG_INDEX_ENV),
        }
    }

    pub fn with_application_name(mut self, name: impl Into<String>) -> Self {
        self.application_name = Some(name.into());
        self
    }

    pub fn with_application_version(mut self, version: impl Into<String>) -> Self {
        self.application_version = Some(version.into());
        self
    }

    pub fn with_server_name(mut self, server: impl Into<String>) -> Self {
        self.server_name = Some(server.into());
        self
    }

    pub fn with_index(mut self, index: impl Into<String>) -> Self {
        self.index = Some(index.into());
        self
    }

    pub fn event_source(&self) -> EventSource {
        EventSource {
            environment: Some(self.environment.clone()).filter(|e| !e.trim().is_empty()),
            application_name: non_blank(&self.application_name).map(str::to_string),
            application_version: non_blank(&self.application_version).map(str::to_string),
            host: non_blank(&self.server_name).map(str::to_string),
        }
    }

    /// Properties every logger adds to its events when missing.
    pub fn enrichers(&self) -> EventData {
        let mut data = EventData::new();
        if let Some(version) = non_blank(&self.application_version) {
            data.insert(APPLICATION_VERSION, version);
        }
        if !self.environment.trim().is_empty() {
            data.insert(ENVIRONMENT, self.environment.as_str());
        }
        data
    }

    /// JSON formatter carrying this configuration's source metadata.
    pub fn json_formatter(&self) -> JsonEventFormatter {
        JsonEventFormatter::new(&self.event_source(), self.index.as_deref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn blank_values_are_dropped() {
        let config = LoggingConfiguration::new("  ")
            .with_application_name("")
            .with_application_version("1.2.3")
            .with_server_name("web-01");

        let source = config.event_source();
        assert_eq!(source.environment, None);
        assert_eq!(source.application_name, None);
        assert_eq!(source.host.as_deref(), Some("web-01"));

        let enrichers = config.enrichers();
        assert_eq!(enrichers.len(), 1);
        assert_eq!(enrichers.get("ApplicationVersion"), Some(&json!("1.2.3")));
    }

    #[test]
    fn deserializes_with_defaults() {
        let config: LoggingConfiguration =
            serde_json::from_value(json!({"environment": "staging", "index": "events"})).unwrap();
        assert_eq!(config, LoggingConfiguration::new("staging").with_index("events"));
    }

    #[test]
    fn reads_environment_variables() {
        std::env::set_var(EVENT_LOG_ENVIRONMENT_ENV, "qa");
        std::env::set_var(EVENT_LOG_APPLICATION_NAME_ENV, "billing");
        std::env::set_var(EVENT_LOG_INDEX_ENV, " ");

        let config = LoggingConfiguration::from_env();
        assert_eq!(config.environment, "qa");
        assert_eq!(config.application_name.as_deref(), Some("billing"));
        assert_eq!(config.index, None);

        std::env::remove_var(EVENT_LOG_ENVIRONMENT_ENV);
        std::env::remove_var(EVENT_LOG_APPLICATION_NAME_ENV);
        std::env::remove_var(EVENT_LOG_INDEX_ENV);
    }
}
