//! Error types for taqvim-engine operations.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CalendarError {
    #[error("No calendar plugin registered for '{0}'")]
    PluginNotFound(String),

    #[error("Cannot parse expression: {0}")]
    Parse(String),

    #[error("Invalid timezone: {0}")]
    InvalidTimezone(String),
}

pub type Result<T> = std::result::Result<T, CalendarError>;
