//! Error types for Quotecast

use thiserror::Error;

pub type Result<T> = std::result::Result<T, QuotecastError>;

#[derive(Error, Debug)]
pub enum QuotecastError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Database error: {0}")]
    Database(#[from] DbError),

    #[error("Platform error: {0}")]
    Platform(#[from] PlatformError),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl QuotecastError {
    /// Returns the appropriate exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            QuotecastError::InvalidInput(_) => 3,
            QuotecastError::Platform(PlatformError::Authentication(_)) => 2,
            QuotecastError::Config(_) => 2,
            QuotecastError::Platform(_) => 1,
            QuotecastError::Database(_) => 1,
        }
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Missing required field: {0}")]
    MissingField(String),
}

#[derive(Error, Debug)]
pub enum DbError {
    #[error("Database operation failed: {0}")]
    SqlxError(#[from] sqlx::Error),

    #[error("Migration failed: {0}")]
    MigrationError(#[from] sqlx::migrate::MigrateError),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Failures reported by an external collaborator (publish, generation,
/// upload, relay).
#[derive(Error, Debug, Clone)]
pub enum PlatformError {
    #[error("Authentication failed: {0}")]
    Authentication(String),

    #[error("Content validation failed: {0}")]
    Validation(String),

    #[error("Posting failed: {0}")]
    Posting(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Rate limit exceeded: {0}")]
    RateLimit(String),

    #[error("Image generation failed: {0}")]
    Generation(String),

    #[error("Image upload failed: {0}")]
    Upload(String),
}

impl PlatformError {
    /// Classify a transport-level reqwest failure.
    ///
    /// Timeouts and connection failures are network errors; anything else
    /// is reported under `fallback`. The request URL is dropped from the
    /// message since query strings can carry credentials.
    pub fn from_transport(error: reqwest::Error, fallback: fn(String) -> PlatformError) -> Self {
        let error = error.without_url();
        if error.is_timeout() {
            PlatformError::Network(format!("request timed out: {}", error))
        } else if error.is_connect() || error.is_request() {
            PlatformError::Network(error.to_string())
        } else {
            fallback(error.to_string())
        }
    }
}
