//! Error type shared by the preference store, configuration loading and the
//! validating model constructors

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    /// SQLite failure inside the preference store
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Root folder creation or config file read
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Interest list or other JSON column could not be encoded or decoded
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Config file present but not valid TOML for [`crate::config::TomlConfig`]
    #[error("Configuration error: {0}")]
    Config(String),

    /// A row the store just wrote could not be read back
    #[error("Not found: {0}")]
    NotFound(String),

    /// Rejected mood axis, group size, budget range or onboarding step.
    /// The message is shown to the caller as is.
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}
