use std::io;
use thiserror::Error;

/// Failure of the view task. Everything that goes wrong while running a test ends up on
/// the test itself instead.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("terminal error: {0}")]
    Terminal(#[from] io::Error),
}
