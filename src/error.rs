/// Error returned when a value cannot be turned into [`EventData`].
///
/// [`EventData`]: crate::data::EventData
#[derive(thiserror::Error, Debug)]
pub enum FlattenError {
    #[error("value could not be serialized for flattening: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Usage errors reported at the facade boundary.
#[derive(thiserror::Error, Debug)]
pub enum EventLoggerError {
    /// `begin_scope` was given a state that serializes to `null`.
    #[error("scope state must not be null")]
    NullScopeState,

    /// A scope was opened by a tokio task that is not running inside
    /// `scope::flow`, so it has no chain of its own.
    #[error("scopes inside a tokio runtime must be opened within scope::flow")]
    NoScopeContext,

    #[error(transparent)]
    Flatten(#[from] FlattenError),

    /// A severity name read from configuration is not part of the taxonomy.
    #[error("unknown severity: {0:?}")]
    UnknownSeverity(String),
}

/// Error type returned by the `init` helpers.
#[derive(thiserror::Error, Debug)]
pub enum InitError {
    #[error("failed to install self-diagnostics subscriber: {0}")]
    Subscriber(#[from] tracing::subscriber::SetGlobalDefaultError),
}
