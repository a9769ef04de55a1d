use thiserror::Error;
use tracing_subscriber::{filter::ParseError, util::TryInitError};

#[derive(Debug, Error)]
pub enum LoggerError {
    #[error("invalid log format: {0} (expected: text|json|journald)")]
    InvalidFormat(String),

    #[error("journald output needs linux and the `journald` feature")]
    JournaldNotSupported,

    #[error("invalid log filter {directive:?}: {source}")]
    InvalidFilter {
        directive: String,
        #[source]
        source: ParseError,
    },

    #[cfg(all(target_os = "linux", feature = "journald"))]
    #[error("journald socket unavailable: {0}")]
    Journald(#[source] std::io::Error),

    /// Another subscriber owns the global dispatcher.
    #[error("a global logger is already installed")]
    AlreadyInitialized,

    #[error("failed to install logger: {0}")]
    Install(#[from] TryInitError),
}
