//! Environment variable names read by [`LoggingConfiguration::from_env`].
//!
//! These are purely helpers; the logger and sink types never read the
//! environment themselves.
//!
//! [`LoggingConfiguration::from_env`]: crate::config::LoggingConfiguration::from_env

/// Deployment environment, e.g. `production`.
pub const EVENT_LOG_ENVIRONMENT_ENV: &str = "EVENT_LOG_ENVIRONMENT";

/// Application name, rendered as `source`.
pub const EVENT_LOG_APPLICATION_NAME_ENV: &str = "EVENT_LOG_APPLICATION_NAME";

/// Application version, added to every event as `ApplicationVersion`.
pub const EVENT_LOG_APPLICATION_VERSION_ENV: &str = "EVENT_LOG_APPLICATION_VERSION";

/// Host or server name, rendered as `host`.
pub const EVENT_LOG_SERVER_NAME_ENV: &str = "EVENT_LOG_SERVER_NAME";

/// Target index name, rendered as `index`.
pub const EVENT_LOG_INDEX_ENV: &str = "EVENT_LOG_INDEX";

/// Read an environment variable or fall back to a provided default.
pub fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Read an environment variable, treating unset and blank values alike.
pub fn env_opt(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}
