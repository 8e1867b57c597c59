use thiserror::Error;

/// Failures crossing the store boundary.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Transport-level failure: unreachable store, dropped connection, timeout.
    #[error("store connection error: {0}")]
    Connection(String),

    /// The store rejected a command, e.g. creating a series that already exists.
    #[error("store command {command} failed: {message}")]
    Command {
        command: &'static str,
        message: String,
    },

    /// The store answered with data this client cannot represent.
    #[error("unexpected store reply: {0}")]
    Reply(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl StoreError {
    pub fn command(command: &'static str, message: impl Into<String>) -> Self {
        StoreError::Command {
            command,
            message: message.into(),
        }
    }

    pub fn is_connection(&self) -> bool {
        matches!(self, StoreError::Connection(_))
    }
}

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("invalid sample at timestamp {timestamp}: {reason}")]
    InvalidSample { timestamp: f64, reason: String },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
