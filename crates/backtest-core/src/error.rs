//! Error types for the backtesting engine.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Invalid market data: {0}")]
    InvalidData(String),

    #[error("Unknown strategy: {0}")]
    UnknownStrategy(String),

    #[error("Strategy error: {message}")]
    Strategy { message: String },
}

impl Error {
    /// Shorthand for a configuration rejection.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
