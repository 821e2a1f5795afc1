use thiserror::Error;

use crate::api::ApiError;
use crate::core::validation::ValidationError;

/// Centralized error types for the application
///
/// All errors in the application are converted to this enum for consistent
/// error handling. Uses `thiserror` for conversion and display formatting.
#[derive(Error, Debug)]
pub enum AppError {
    /// User-correctable input errors; always resolved by re-prompting
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Banking API errors (transport or non-2xx response)
    #[error("API error: {0}")]
    Api(#[from] ApiError),

    /// Telegram API errors
    #[error("Telegram error: {0}")]
    Telegram(#[from] teloxide::RequestError),

    /// Session store errors (backend unavailable, serialization)
    #[error("Session store error: {0}")]
    Session(String),

    /// Missing or invalid settings at startup; fatal
    #[error("Configuration error: {0}")]
    Config(String),

    /// URL parsing errors
    #[error("URL parsing error: {0}")]
    Url(#[from] url::ParseError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Type alias for Result with AppError
pub type AppResult<T> = Result<T, AppError>;
