use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read analysis settings: {0}")]
    LoadError(#[from] config::ConfigError),

    #[error("Invalid analysis settings: {0}")]
    ValidationError(String),
}
