//! Error types for the headless runner.

use thiserror::Error;

use swarm_core::error::GameError;

/// Errors raised while loading configs, running games or writing results.
#[derive(Debug, Error)]
pub enum HeadlessError {
    /// Reading or writing a file failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A RON config file could not be parsed.
    #[error("RON parse error: {0}")]
    Ron(#[from] ron::error::SpannedError),

    /// Results could not be encoded or decoded.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The simulation rejected its setup.
    #[error(transparent)]
    Game(#[from] GameError),
}

/// Result alias for headless operations.
pub type Result<T> = std::result::Result<T, HeadlessError>;
