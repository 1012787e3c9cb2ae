//! Runtime error types.

use greeter_core::GreeterError;
use thiserror::Error;

/// Errors that can occur in the mock runtime.
#[derive(Debug, Error)]
pub enum MockError {
    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// I/O error (dataset directory, console)
    #[error("I/O error: {0}")]
    Io(String),

    /// Greeter rejected an operation
    #[error("{kind}: {0}", kind = .0.kind())]
    Greeter(#[from] GreeterError),
}

impl From<std::io::Error> for MockError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl From<serde_json::Error> for MockError {
    fn from(err: serde_json::Error) -> Self {
        Self::Config(err.to_string())
    }
}
