pub mod data;
pub mod error;
pub mod event;
pub mod scope;
pub mod metric;
pub mod record;
pub mod logger;
pub mod null_logger;
pub mod format;
pub mod sink;
pub mod dispatch;

#[cfg(feature = "hec")]
pub mod hec;

pub mod config;
pub mod console;
pub mod env;
pub mod init;
pub mod noop_sink;

pub use data::EventData;
pub use error::{EventLoggerError, FlattenError, InitError};
pub use event::{Event, Level, Severity};
pub use logger::{EventLogger, EventLoggerFactory, EventLogging};
pub use metric::ScopedMetric;
pub use null_logger::NullEventLogger;
pub use scope::ScopeGuard;
