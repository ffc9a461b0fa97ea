//! Error types for utapi-core

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for utapi-core
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for utapi-core
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Configuration file not found
    #[error("Configuration file not found: {0}")]
    ConfigNotFound(PathBuf),

    /// Invalid configuration format
    #[error("Invalid configuration format: {0}")]
    InvalidConfig(String),

    /// Required environment variable missing or empty
    #[error("{0} is not set")]
    MissingEnv(String),

    /// Non-2xx answer from the UploadThing API
    #[error("UploadThing: error {status}: {body}")]
    Api { status: u16, body: String },

    /// Non-2xx answer from a presigned upload URL
    #[error("File upload error: {status}: {body}")]
    Upload { status: u16, body: String },

    /// 2xx answer whose content is unusable
    #[error("Unexpected response: {0}")]
    UnexpectedResponse(String),

    /// Network error
    #[error("Network error: {0}")]
    Network(String),

    /// HTTP client error
    #[error("HTTP client error: {0}")]
    HttpClient(String),

    /// Timeout
    #[error("Operation timed out")]
    Timeout,

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] toml::ser::Error),

    /// Deserialization error
    #[error("Deserialization error: {0}")]
    Deserialization(#[from] toml::de::Error),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl Error {
    /// HTTP status carried by API and upload errors
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::Api { status, .. } | Error::Upload { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Error::Timeout
        } else if err.is_connect() {
            Error::Network(err.to_string())
        } else if err.is_request() || err.is_builder() {
            Error::HttpClient(err.to_string())
        } else {
            Error::Network(err.to_string())
        }
    }
}
