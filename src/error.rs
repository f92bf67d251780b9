//! Application error type
//!
//! Every handler failure is an `AppError`. The router turns it into an HTTP
//! response through [`AppError::status`] and [`AppError::message`].

use hyper::StatusCode;
use thiserror::Error;

/// Message used when an error renders to an empty string
pub const FALLBACK_ERROR_MESSAGE: &str = "Error desconocido";

/// Body of the 400 returned when `/upload` carries no usable file part
pub const INVALID_UPLOAD_MESSAGE: &str = "No se recibió ningún archivo";

#[derive(Error, Debug)]
pub enum AppError {
    #[error("{0}")]
    Validation(String),

    #[error("{INVALID_UPLOAD_MESSAGE}")]
    InvalidUpload,

    #[error("{0}")]
    Json(#[from] serde_json::Error),

    #[error("failed to read request body: {0}")]
    Body(String),

    #[error("{0}")]
    Multipart(#[from] multer::Error),

    #[error("{0}")]
    Database(#[from] sqlx::Error),

    #[error("{0}")]
    Io(#[from] std::io::Error),

    #[error("invalid object metadata: {0}")]
    MetadataDecode(#[from] toml::de::Error),

    #[error("failed to encode object metadata: {0}")]
    MetadataEncode(#[from] toml::ser::Error),
}

impl AppError {
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) | Self::InvalidUpload => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Client-facing message, never empty
    pub fn message(&self) -> String {
        let message = self.to_string();
        if message.trim().is_empty() {
            FALLBACK_ERROR_MESSAGE.to_string()
        } else {
            message
        }
    }

    /// Plain-text errors skip the JSON `{"error": ...}` envelope
    pub const fn is_plain_text(&self) -> bool {
        matches!(self, Self::InvalidUpload)
    }
}

pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            AppError::Validation("title is required".into()).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(AppError::InvalidUpload.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            AppError::Body("reset".into()).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_empty_message_falls_back() {
        let err = AppError::Validation(String::new());
        assert_eq!(err.message(), FALLBACK_ERROR_MESSAGE);

        let err = AppError::Io(std::io::Error::other(""));
        assert_eq!(err.message(), FALLBACK_ERROR_MESSAGE);
    }

    #[test]
    fn test_json_error_keeps_serde_message() {
        let err: AppError = serde_json::from_str::<serde_json::Value>("{oops")
            .unwrap_err()
            .into();
        assert!(err.message().contains("key must be a string"));
        assert!(!err.is_plain_text());
    }
}
