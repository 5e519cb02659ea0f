//! Core error types for EOClient

#[derive(thiserror::Error, Debug)]
pub enum EoError {
    #[error("Protocol error: {0}")]
    Protocol(String),

    #[error("Encoding error: {0}")]
    Encoding(String),

    #[error("Map format error: {0}")]
    MapFormat(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("Handler error: {0}")]
    Handler(String),
}

pub type Result<T> = std::result::Result<T, EoError>;
