use thiserror::Error;

#[derive(Debug, Error)]
pub enum LogError {
    #[error("unknown log format `{0}` (expected text or json)")]
    InvalidFormat(String),
    #[error("Invalid log level `{directive}`: {reason}")]
    InvalidFilter { directive: String, reason: String },
    #[error("diagnostic logging is already initialized")]
    AlreadyInitialized,
}
