use thiserror::Error;

#[derive(Error, Debug)]
pub enum NarrationError {
    #[error("Synthesis error: {0}")]
    SynthesisError(String),

    #[error("Audio decode error: {0}")]
    DecodeError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("HTTP request error: {0}")]
    HttpError(#[from] reqwest::Error),
}

pub type Result<T> = std::result::Result<T, NarrationError>;
