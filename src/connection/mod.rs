pub mod hook;
pub mod mssql;

use std::future::Future;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ExecutionError {
    /// The server raised an error. Carries the server message as sent.
    #[error("{0}")]
    Server(String),
    #[error("transport error: {0}")]
    Transport(String),
    #[error("test timed out after {0:?}")]
    Timeout(Duration),
    #[error("connection closed")]
    Closed,
}

impl ExecutionError {
    /// Message without the transport prefix.
    pub fn message(&self) -> String {
        match self {
            ExecutionError::Server(message) | ExecutionError::Transport(message) => {
                message.clone()
            }
            other => other.to_string(),
        }
    }
}

/// Runs one test by display identity against a live session.
///
/// Diagnostic lines are not returned: the session emits them through its logging hook
/// while the call is in flight.
pub trait Execute: Send {
    fn execute(&mut self, identity: &str)
        -> impl Future<Output = Result<(), ExecutionError>> + Send;
}
