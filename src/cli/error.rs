//! CLI-level errors (wraps library and settings errors)

use std::io::ErrorKind;

use thiserror::Error;

use crate::config::SettingsError;
use crate::errors::TreeError;

/// CLI errors are the top-level error type.
/// These are what get displayed to the user.
#[derive(Error, Debug)]
pub enum CliError {
    #[error("{0}")]
    Tree(#[from] TreeError),

    #[error("{0}")]
    Settings(#[from] SettingsError),

    #[error("{0}")]
    Usage(String),
}

/// Result type for CLI operations.
pub type CliResult<T> = Result<T, CliError>;

impl CliError {
    /// Get the appropriate exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Usage(_) => crate::exitcode::USAGE,
            CliError::Settings(_) => crate::exitcode::CONFIG,
            CliError::Tree(e) => match e {
                TreeError::CorruptData { .. } => crate::exitcode::DATAERR,
                TreeError::Io(io) if io.kind() == ErrorKind::NotFound => crate::exitcode::NOINPUT,
                TreeError::Io(_) => crate::exitcode::IOERR,
                TreeError::ImmutableRoot(_)
                | TreeError::SlotOccupied { .. }
                | TreeError::NoSuchChild { .. } => crate::exitcode::USAGE,
                _ => crate::exitcode::SOFTWARE,
            },
        }
    }
}
