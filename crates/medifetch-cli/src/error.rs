//! CLI-specific error types and exit-code mapping.

use thiserror::Error;

/// CLI-specific error type. Domain errors ([`medifetch_core::AppError`])
/// are wrapped rather than converted lossily, so handlers can still
/// match on the underlying kind if they need to.
#[derive(Debug, Error)]
pub enum CliError {
    #[error("{0}")]
    Core(#[from] medifetch_core::AppError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

impl CliError {
    /// Map error to a Unix exit code.
    #[must_use]
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::Core(_) => 1,
            Self::Io(_) => 74,   // EX_IOERR
            Self::Other(_) => 1,
        }
    }
}
